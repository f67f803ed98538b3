mod display;
mod repl;
mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;
use verdict_ai::{Analyzer, load_model};
use verdict_core::{Backend, Settings};
use verdict_sync::DeliveryPipeline;

use display::BatchSummary;
use session::Session;

/// Classify product reviews by sentiment and log each verdict to a spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "verdict", version)]
struct Cli {
    /// TOML config file (defaults to ./verdict.toml when present)
    #[arg(long, global = true, value_name = "PATH", env = "VERDICT_CONFIG")]
    config: Option<PathBuf>,

    /// Do not log verdicts to the sheet during this run
    #[arg(long, global = true)]
    no_log: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one review (`-` reads it from stdin)
    Analyze {
        #[arg(value_name = "TEXT", required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Analyse every review in a tab-separated file
    Batch {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Column holding the review text
        #[arg(long, value_name = "NAME")]
        column: Option<String>,
        /// Stop after this many reviews
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Interactive session, one review per line
    Repl,
    /// Print the resolved settings
    Config,
}

/// Per-run overrides, applied over the config file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Spreadsheet webhook address
    #[arg(long, global = true, value_name = "URL", env = "VERDICT_ENDPOINT")]
    endpoint: Option<String>,

    #[arg(long, global = true, value_name = "NAME", env = "VERDICT_SHEET")]
    sheet: Option<String>,

    /// Tag written to the source column
    #[arg(long, global = true, value_name = "TAG", env = "VERDICT_SOURCE")]
    source: Option<String>,

    #[arg(long, global = true, value_name = "NAME", env = "VERDICT_TEXT_COLUMN")]
    text_column: Option<String>,

    /// Inference backend: remote or onnx
    #[arg(long, global = true, value_name = "BACKEND", env = "VERDICT_BACKEND")]
    backend: Option<Backend>,

    /// Hosted model identifier
    #[arg(long, global = true, value_name = "ID", env = "VERDICT_MODEL")]
    model: Option<String>,

    /// Local ONNX model directory
    #[arg(long, global = true, value_name = "DIR", env = "VERDICT_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Inference API credential
    #[arg(long, global = true, value_name = "TOKEN", env = "HF_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl Overrides {
    fn apply(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(sheet) = &self.sheet {
            settings.sheet = sheet.clone();
        }
        if let Some(source) = &self.source {
            settings.source = source.clone();
        }
        if let Some(column) = &self.text_column {
            settings.text_column = column.clone();
        }
        if let Some(backend) = self.backend {
            settings.model.backend = backend;
        }
        if let Some(model) = &self.model {
            settings.model.model_id = model.clone();
        }
        if let Some(dir) = &self.model_dir {
            settings.model.model_dir = Some(dir.clone());
        }
        if let Some(token) = &self.token {
            settings.model.token = Some(token.clone());
        }
    }
}

fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;
    cli.overrides.apply(&mut settings);
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    if let Command::Config = cli.command {
        return print_config(&settings, cli.no_log);
    }

    info!("verdict v{}", env!("CARGO_PKG_VERSION"));
    let mut session = open_session(&settings, cli.no_log).await?;

    let outcome = match cli.command {
        Command::Analyze { text } => analyze(&mut session, &text).await,
        Command::Batch {
            file,
            column,
            limit,
        } => {
            let column = column.unwrap_or_else(|| settings.text_column.clone());
            batch(&mut session, &file, &column, limit).await
        }
        Command::Repl => repl::run(&mut session).await,
        Command::Config => Ok(()),
    };

    session.drain().await;
    outcome
}

async fn open_session(settings: &Settings, no_log: bool) -> anyhow::Result<Session> {
    let timeout = Duration::from_secs(settings.timeout_secs);
    let model = load_model(&settings.model, timeout)
        .await
        .context("loading sentiment model")?;
    info!(model = model.name(), "model ready");

    let delivery =
        DeliveryPipeline::from_settings(settings).context("building delivery pipeline")?;
    if no_log {
        delivery.set_enabled(false);
    }

    Ok(Session::new(Analyzer::new(model), delivery, &settings.source))
}

async fn analyze(session: &mut Session, text: &[String]) -> anyhow::Result<()> {
    let review = if text == ["-"] {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("reading review from stdin")?;
        buf
    } else {
        text.join(" ")
    };

    match session
        .submit(&review, |a| print!("{}", display::render_card(a)))
        .await
    {
        Ok(_) => Ok(()),
        Err(e) => bail!("{}", e.user_message()),
    }
}

async fn batch(
    session: &mut Session,
    path: &Path,
    column: &str,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let corpus = verdict_store::read_corpus(path, column)
        .await
        .with_context(|| {
            format!(
                "loading {}: expected a tab-separated file with a header row containing a `{column}` column",
                path.display()
            )
        })?;
    if corpus.is_empty() {
        println!("No reviews found in column `{column}`.");
        return Ok(());
    }

    let take = limit.unwrap_or(corpus.len()).min(corpus.len());
    info!(path = %path.display(), reviews = corpus.len(), analysing = take, "batch loaded");

    let mut summary = BatchSummary::default();
    for (i, review) in corpus.iter().take(take).enumerate() {
        match session
            .submit(review, |a| println!("{}", display::render_batch_line(i, a)))
            .await
        {
            Ok(analysis) => summary.record(analysis.verdict.category),
            Err(e) => {
                eprintln!("{:>4}  {}", i + 1, e.user_message());
                summary.record_failure();
            }
        }
    }

    println!();
    print!("{}", summary.render());
    Ok(())
}

fn print_config(settings: &Settings, no_log: bool) -> anyhow::Result<()> {
    let rendered =
        toml::to_string_pretty(&settings.redacted()).context("rendering settings as TOML")?;
    println!("{rendered}");
    let delivery = !no_log && settings.delivery_configured();
    println!(
        "# sheet logging: {}",
        if delivery { "enabled" } else { "disabled" }
    );
    Ok(())
}

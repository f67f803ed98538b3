//! Interactive review loop.

use std::io::Write;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::display;
use crate::session::Session;

const PROMPT: &str = "review> ";
const HELP: &str = "Type a review and press enter. Commands: :log :status :reset :help :quit";

#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Review(&'a str),
    ToggleLog,
    Status,
    Reset,
    Help,
    Quit,
    Unknown(&'a str),
    Blank,
}

pub fn parse_line(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    match trimmed.strip_prefix(':') {
        Some("log") => Line::ToggleLog,
        Some("status") => Line::Status,
        Some("reset") => Line::Reset,
        Some("help") => Line::Help,
        Some("quit" | "q" | "exit") => Line::Quit,
        Some(_) => Line::Unknown(trimmed),
        None => Line::Review(trimmed),
    }
}

pub async fn run(session: &mut Session) -> anyhow::Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{PROMPT}");
        std::io::stdout().flush().context("flushing prompt")?;

        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            println!();
            break;
        };

        match parse_line(&line) {
            Line::Blank => {}
            Line::Review(text) => {
                if let Err(e) = session
                    .submit(text, |a| println!("{}", display::render_card(a)))
                    .await
                {
                    eprintln!("{}", e.user_message());
                }
            }
            Line::ToggleLog => {
                let enabled = session.toggle_logging();
                println!(
                    "Sheet logging {}.",
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            Line::Status => print!("{}", display::render_status(&session.status())),
            Line::Reset => {
                session.reset();
                println!("Cleared.");
            }
            Line::Help => println!("{HELP}"),
            Line::Quit => break,
            Line::Unknown(cmd) => eprintln!("Unknown command {cmd}. {HELP}"),
        }
    }

    Ok(())
}

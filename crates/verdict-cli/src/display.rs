//! Terminal rendering for verdicts, batch runs, and session state.
//!
//! Everything here builds a `String`; callers decide where it goes.

use std::fmt::Write;

use verdict_ai::Analysis;
use verdict_core::SentimentCategory;

const MAX_REVIEW_PREVIEW: usize = 60;

/// Vertical card for one analysed review.
pub fn render_card(analysis: &Analysis) -> String {
    let p = &analysis.presentation;
    let mut out = String::new();

    let _ = writeln!(out, "=== {} {} ===", p.label, p.icon.glyph());
    let _ = writeln!(out, "{}", preview(&analysis.review));
    let _ = writeln!(out);
    let _ = writeln!(out, "Verdict");
    field(&mut out, "sentiment", p.category.as_str());
    field(&mut out, "label", &p.label);
    field(&mut out, "confidence", &format!("{}%", p.confidence_percent));
    field(&mut out, "score", &p.score_display);
    field(&mut out, "icon", p.icon.as_str());
    if analysis.record.label() != p.label {
        field(&mut out, "model label", analysis.record.label());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", p.explanation);
    out
}

/// One line of batch output.
pub fn render_batch_line(index: usize, analysis: &Analysis) -> String {
    let p = &analysis.presentation;
    format!(
        "{:>4}  {} {:<8} {:>6}%  {}",
        index + 1,
        p.icon.glyph(),
        p.category.as_str(),
        p.confidence_percent,
        preview(&analysis.review)
    )
}

/// Running tally of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    positive: usize,
    negative: usize,
    neutral: usize,
    failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, category: SentimentCategory) {
        match category {
            SentimentCategory::Positive => self.positive += 1,
            SentimentCategory::Negative => self.negative += 1,
            SentimentCategory::Neutral => self.neutral += 1,
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn analysed(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== summary ===");
        for category in SentimentCategory::ALL {
            let count = match category {
                SentimentCategory::Positive => self.positive,
                SentimentCategory::Negative => self.negative,
                SentimentCategory::Neutral => self.neutral,
            };
            let share = if self.analysed() == 0 {
                0.0
            } else {
                count as f64 / self.analysed() as f64 * 100.0
            };
            field(&mut out, category.as_str(), &format!("{count} ({share:.1}%)"));
        }
        if self.failed > 0 {
            field(&mut out, "failed", &self.failed.to_string());
        }
        out
    }
}

/// Snapshot of an interactive session for `:status`.
pub struct SessionStatus<'a> {
    pub model: &'a str,
    pub logging: bool,
    pub busy: bool,
    pub pending: usize,
    pub last: Option<&'a Analysis>,
}

pub fn render_status(status: &SessionStatus<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== session ===");
    field(&mut out, "model", status.model);
    field(
        &mut out,
        "sheet logging",
        if status.logging { "enabled" } else { "disabled" },
    );
    field(&mut out, "busy", if status.busy { "yes" } else { "no" });
    field(&mut out, "pending deliveries", &status.pending.to_string());
    match status.last {
        Some(last) => field(
            &mut out,
            "last result",
            &format!(
                "{} ({}%)",
                last.presentation.category, last.presentation.confidence_percent
            ),
        ),
        None => field(&mut out, "last result", "-"),
    }
    out
}

fn field(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "  {:<26} {}", name, value);
}

fn preview(review: &str) -> String {
    if review.chars().count() > MAX_REVIEW_PREVIEW {
        let short: String = review.chars().take(MAX_REVIEW_PREVIEW - 3).collect();
        format!("{short}...")
    } else {
        review.to_string()
    }
}

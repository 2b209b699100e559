//! Prompt rendering for log analysis.

use chrono::SecondsFormat;
use lens_core::types::LogEntry;

/// Renders the fixed-structure analysis prompt from a context window and the
/// operator's question.
///
/// Deterministic and total: identical inputs yield byte-identical output,
/// and an empty window yields a prompt with an empty log section.
#[must_use]
pub fn render_prompt(question: &str, window: &[LogEntry]) -> String {
    let log_text = window
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI Site Reliability Engineer. Analyze the following logs and answer the \
         user's question.\n\nRecent Logs:\n{log_text}\n\nUser Question: {question}\n\nAnswer \
         concisely and highlight any patterns or specific errors found in the logs."
    )
}

fn format_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {} ({}): {}",
        entry.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        entry.level,
        entry.service,
        entry.message
    )
}

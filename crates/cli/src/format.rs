//! Output formatting
//!
//! Human mode prints rows like `{balance: 900, id: 1}`; JSON mode emits one
//! JSON value per command, suitable for piping.

use tandem_concurrency::{OpResult, Statistics};
use tandem_core::Row;

/// How results are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Terminal-friendly text
    Human,
    /// One JSON value per command
    Json,
}

fn rows_to_json(rows: &[Row]) -> serde_json::Value {
    serde_json::Value::Array(rows.iter().map(Row::to_json).collect())
}

/// Render an operation result
pub fn format_result(result: &OpResult, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => match result {
            OpResult::Inserted(id) => serde_json::json!({ "inserted": id }).to_string(),
            OpResult::Row(Some(row)) => row.to_json().to_string(),
            OpResult::Row(None) => "null".to_string(),
            OpResult::Rows(rows) => rows_to_json(rows).to_string(),
            OpResult::Applied(matched) => serde_json::json!({ "applied": matched }).to_string(),
        },
        OutputMode::Human => match result {
            OpResult::Inserted(id) => format!("inserted key {}", id),
            OpResult::Row(Some(row)) => row.to_string(),
            OpResult::Row(None) => "(no row)".to_string(),
            OpResult::Rows(rows) if rows.is_empty() => "(empty)".to_string(),
            OpResult::Rows(rows) => rows
                .iter()
                .map(Row::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            OpResult::Applied(true) => "ok".to_string(),
            OpResult::Applied(false) => "(no row matched)".to_string(),
        },
    }
}

/// Render an error
pub fn format_error(error: &dyn std::fmt::Display, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::json!({ "error": error.to_string() }).to_string(),
        OutputMode::Human => format!("(error) {}", error),
    }
}

/// Render manager statistics
pub fn format_stats(stats: &Statistics, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string(stats).unwrap_or_else(|_| "{}".to_string()),
        OutputMode::Human => format!(
            "active: {}  total: {}  log entries: {}  versioned resources: {}",
            stats.active_transactions,
            stats.total_transactions,
            stats.log_entries,
            stats.versioned_resources
        ),
    }
}

/// Render a plain confirmation line
pub fn format_ok(message: &str, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::json!({ "ok": message }).to_string(),
        OutputMode::Human => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_row() {
        let row = Row::new().with("id", 1i64).with("balance", 900i64);
        assert_eq!(
            format_result(&OpResult::Row(Some(row)), OutputMode::Human),
            "{balance: 900, id: 1}"
        );
    }

    #[test]
    fn test_json_inserted() {
        assert_eq!(
            format_result(&OpResult::Inserted(7), OutputMode::Json),
            r#"{"inserted":7}"#
        );
    }

    #[test]
    fn test_human_empty_scan() {
        assert_eq!(
            format_result(&OpResult::Rows(vec![]), OutputMode::Human),
            "(empty)"
        );
    }

    #[test]
    fn test_error_modes() {
        let e = "boom";
        assert_eq!(format_error(&e, OutputMode::Human), "(error) boom");
        assert_eq!(format_error(&e, OutputMode::Json), r#"{"error":"boom"}"#);
    }
}

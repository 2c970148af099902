//! JSON output helpers.
//!
//! Success paths print the result object as-is; failures print an error object
//! with a stable `code`, and a launch that ran out of rescues adds its partial
//! result under `"result"`.

use anyhow::{Context, Result};
use serde::Serialize;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format a JSON error object carrying the partial result of the run.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error_with_result(
    message: &str,
    code: &str,
    result: &impl Serialize,
) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
        "result": serde_json::to_value(result).context("JSON serialization failed")?,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Print any serializable value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print(value: &impl Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

//! Command implementations

pub mod check;
pub mod launch;
pub mod status;
pub mod version;

use anyhow::Result;

use crate::domain::{JobError, LaunchError};
use crate::output::json;

/// Machine-readable code of a failure.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<LaunchError>() {
        return e.code();
    }
    if let Some(e) = err.downcast_ref::<JobError>() {
        return e.code();
    }
    "error"
}

/// JSON error document for a failed command, with whatever observed state
/// the error carries.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn error_json(err: &anyhow::Error) -> Result<String> {
    let message = format!("{err:#}");
    let code = error_code(err);
    match err.downcast_ref::<LaunchError>() {
        Some(LaunchError::RescueExhausted { result, .. }) => {
            json::format_error_with_result(&message, code, result)
        }
        Some(e) => match e.status() {
            Some(status) => json::format_error_with_result(
                &message,
                code,
                &serde_json::json!({ "status": status }),
            ),
            None => json::format_error(&message, code),
        },
        None => json::format_error(&message, code),
    }
}

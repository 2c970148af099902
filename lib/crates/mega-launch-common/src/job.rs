//! Persisted job record shared by the launch job and the status path.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One job file. Only `started`, `finished` and `recent` are interpreted;
/// everything else is an opaque result payload that must survive a
/// read-modify-write untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(
        default,
        deserialize_with = "flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub started: Option<bool>,
    #[serde(
        default,
        deserialize_with = "flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub finished: Option<bool>,
    /// Log watermark: unix seconds (fractional) up to which the status path
    /// has already reported journal lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobRecord {
    /// A record for a job that has started and not yet produced a result.
    #[must_use]
    pub fn running() -> Self {
        Self {
            started: Some(true),
            finished: Some(false),
            ..Self::default()
        }
    }

    /// Mark the job finished and merge `result` into the payload.
    ///
    /// Keys in `result` named like the interpreted fields are ignored.
    pub fn finish(&mut self, result: Map<String, Value>) {
        self.started = Some(true);
        self.finished = Some(true);
        for (key, value) in result {
            if matches!(key.as_str(), "started" | "finished" | "recent") {
                continue;
            }
            self.extra.insert(key, value);
        }
    }
}

/// Older writers stored the flags as `0`/`1`.
fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a boolean or 0/1 flag, found {other}"
        ))),
    }
}

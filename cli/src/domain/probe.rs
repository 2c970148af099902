//! Health-probe policy: port-set evaluation and anchored log matching.
//!
//! Pure functions only: the socket table and the journal are read by the
//! application layer and handed in here.

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use crate::domain::error::LaunchError;

/// Outcome of one port probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortCheck {
    /// 0 or 1.
    pub passed: u8,
    /// Listening ports seen, possibly narrowed to the expected ones.
    pub observed: BTreeSet<u16>,
}

/// Apply the port policy to a socket-table snapshot.
///
/// With a known main pid, `observed` holds that process's listeners and the
/// probe passes iff every expected port is among them.
///
/// Without a pid, `observed` holds every listener on the host. Any overlap
/// with `expected` narrows `observed` to the overlap and does *not* pass yet;
/// no overlap at all passes, since nothing ties the host's listeners to the
/// service. Whether that pass is intended is an open product question; keep
/// the behaviour until it is answered.
#[must_use]
pub fn evaluate_ports(
    pid: Option<u32>,
    expected: &BTreeSet<u16>,
    observed: BTreeSet<u16>,
) -> PortCheck {
    match pid.filter(|p| *p > 0) {
        Some(_) => PortCheck {
            passed: u8::from(expected.is_subset(&observed)),
            observed,
        },
        None => {
            let overlap: BTreeSet<u16> = expected.intersection(&observed).copied().collect();
            if overlap.is_empty() {
                PortCheck {
                    passed: 1,
                    observed,
                }
            } else {
                PortCheck {
                    passed: 0,
                    observed: overlap,
                }
            }
        }
    }
}

/// A log expression matched from the start of each line.
#[derive(Debug, Clone)]
pub struct LogPattern {
    source: String,
    regex: Regex,
}

impl LogPattern {
    /// Compile `pattern` anchored at line start.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::InvalidPattern` if the expression does not compile.
    pub fn new(pattern: &str) -> Result<Self, LaunchError> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
            LaunchError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The empty expression: matches any line.
    #[must_use]
    #[allow(clippy::expect_used)] // Compile-time constant
    pub fn any() -> Self {
        Self {
            source: String::new(),
            regex: Regex::new("^").expect("valid regex"),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// First matching line, in order.
    #[must_use]
    pub fn first_match<'a, I>(&self, lines: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines.into_iter().find(|l| self.is_match(l))
    }
}

impl Default for LogPattern {
    fn default() -> Self {
        Self::any()
    }
}

/// Outcome of one log probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogCheck {
    pub matched: bool,
    pub lines: Vec<String>,
}

impl LogCheck {
    #[must_use]
    pub fn passed(&self) -> u8 {
        u8::from(self.matched)
    }
}

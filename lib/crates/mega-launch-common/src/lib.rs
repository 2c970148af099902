pub mod job;
pub mod types;

pub use job::JobRecord;
pub use types::{Scope, UnknownScope, syslog_tag};

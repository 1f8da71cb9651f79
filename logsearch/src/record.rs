use std::fmt;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Debug,
    Warn,
    Error,
    Fatal,
}

pub const ALL_LEVELS: [Level; 5] = [
    Level::Info,
    Level::Debug,
    Level::Warn,
    Level::Error,
    Level::Fatal,
];

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Only ERROR and FATAL records may carry a stack trace.
    pub fn is_severe(&self) -> bool {
        matches!(self, Level::Error | Level::Fatal)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition metadata of a record: which source emitted it. Doubles as the
/// time-series metaField and as the default filter dimensions of the
/// search form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Meta {
    pub app: String,
    pub host: String,
    pub env: String,
}

/// A single synthetic application log line, the only entity in the store.
/// Records are written once by the generator and never mutated; the
/// collection's 30-day expiry is the only deletion path.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogRecord {
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    pub meta: Meta,
    pub level: Level,
    pub logger: String,
    pub thread: String,
    pub message: String,
    pub uri: String,
    pub method: String,
    pub status: i32,
    pub latency_ms: i64,
    #[serde(rename = "traceId")]
    pub trace_id: String,
    #[serde(rename = "spanId")]
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

use crate::payload::Payload;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One normalized log entry. Field values are already converted into
/// [`Payload`] trees, so sinks only need to serialize them.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub fields: BTreeMap<String, Payload>,
    pub message: Option<String>,
    pub service_name: Option<String>,
}

use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use std::error::Error;
use std::io::Write;

/// Writes every record to stdout as one JSON document per line.
#[derive(Clone, Default)]
pub struct ConsoleSink {
    /// Prefix each line with the record's service name when set.
    pub with_service_prefix: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self, record: &LogRecord) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(record)?;
        Ok(match (&record.service_name, self.with_service_prefix) {
            (Some(service), true) => format!("[{service}] {json}"),
            _ => json,
        })
    }
}

#[async_trait]
impl LogSink for ConsoleSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let line = self.render(record)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        std::io::stdout().flush()?;
        Ok(())
    }
}

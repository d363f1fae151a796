use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A sink that drops every record and only counts them.
///
/// Useful for measuring the cost of field conversion and batching without
/// any external I/O. Clones share the counter.
#[derive(Clone, Default)]
pub struct NoopSink {
    discarded: Arc<AtomicU64>,
}

impl NoopSink {
    /// Records received so far.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LogSink for NoopSink {
    async fn send(&self, _record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

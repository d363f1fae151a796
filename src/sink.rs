use crate::record::LogRecord;
use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for [`LogRecord`]s produced by the hook.
///
/// Implementations transport records to a concrete collector (Fluentd,
/// stdout, a database, ...). The hook calls `send` from a background task
/// and never awaits it on the application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send a single log record to the underlying backend.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was accepted by the backend.
    /// - `Err(..)` if the backend failed. The hook treats this as a
    ///   transient failure and retries the batch with backoff.
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered records, called after every delivered batch.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

use crate::config::ConversionConfig;
use crate::convert::convert;
use crate::init::HookConfig;
use crate::inspect::Inspect;
use crate::payload::Payload;
use crate::record::LogRecord;
use crate::sink::LogSink;
use chrono::Utc;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{atomic::{AtomicU64, Ordering}, Arc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::field::{Field, Visit};
use tracing::{debug, trace, warn, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Events emitted by this crate are never shipped, so sink failures cannot
/// feed back into the sink.
const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Logging hook that converts field values into [`Payload`] trees and
/// forwards the resulting [`LogRecord`]s to an asynchronous [`LogSink`]
/// through a bounded channel and background task.
///
/// It works both as a `tracing_subscriber` layer (primitive event fields)
/// and through [`FluentHook::entry`], which accepts any [`Inspect`] value,
/// structs included. Only events at `min_level` or more severe are kept.
/// Network I/O is fully decoupled from application threads.
///
/// The hook is cheap to clone; the background task stops once every clone
/// has been dropped and the last batch is delivered.
#[derive(Clone)]
pub struct FluentHook {
    sender: mpsc::Sender<LogRecord>,
    conversion: Arc<ConversionConfig>,
    min_level: Level,
    service_name: Option<Arc<str>>,
    /// Total events seen by the hook (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully handed to the background task.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
    /// Dropped after the sink kept failing for `max_send_attempts` tries.
    pub undelivered_events: Arc<AtomicU64>,
}

#[derive(Clone, Copy)]
struct BatchPolicy {
    batch_size: usize,
    flush_interval: Duration,
    max_attempts: usize,
}

impl FluentHook {
    /// Create a new hook and spawn a background task that pulls
    /// [`LogRecord`]s from a bounded channel and sends them to `sink`.
    ///
    /// Minimal thresholds are enforced for the channel buffer, batch size,
    /// flush interval and attempt count to avoid degenerate configurations.
    /// Must be called inside a Tokio runtime.
    pub fn new(sink: Arc<dyn LogSink>, config: &HookConfig) -> (Self, JoinHandle<()>) {
        let buffer = config.channel_buffer.max(16);
        let policy = BatchPolicy {
            batch_size: config.batch_size.max(1),
            flush_interval: config.flush_interval.max(Duration::from_millis(10)),
            max_attempts: config.max_send_attempts.max(1),
        };

        let (tx, rx) = mpsc::channel::<LogRecord>(buffer);

        let hook = Self {
            sender: tx,
            conversion: Arc::new(config.conversion.clone()),
            min_level: config.min_level,
            service_name: config.service_name.as_deref().map(Arc::from),
            total_events: Arc::new(AtomicU64::new(0)),
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
            undelivered_events: Arc::new(AtomicU64::new(0)),
        };

        let handle = tokio::spawn(run_batches(
            sink,
            rx,
            policy,
            Arc::clone(&hook.enqueued_events),
            Arc::clone(&hook.undelivered_events),
        ));

        (hook, handle)
    }

    /// Conversion settings applied to every field value.
    pub fn conversion(&self) -> &ConversionConfig {
        &self.conversion
    }

    /// Start a structured entry whose fields may be arbitrary values.
    ///
    /// ```ignore
    /// hook.entry(Level::ERROR, "auth")
    ///     .field("user", &user)
    ///     .message("login failed")
    ///     .fire();
    /// ```
    pub fn entry(&self, level: Level, target: impl Into<String>) -> Entry<'_> {
        Entry {
            hook: self,
            level,
            target: target.into(),
            message: None,
            fields: BTreeMap::new(),
        }
    }

    fn accepts(&self, level: &Level) -> bool {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        *level <= self.min_level
    }

    fn enqueue(&self, record: LogRecord) -> bool {
        match self.sender.try_send(record) {
            Ok(()) => true,
            Err(e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "log channel unavailable, dropping log record");
                false
            }
        }
    }
}

/// A log entry under construction. Each field is converted as soon as it
/// is added, so the entry never borrows the caller's values.
pub struct Entry<'h> {
    hook: &'h FluentHook,
    level: Level,
    target: String,
    message: Option<String>,
    fields: BTreeMap<String, Payload>,
}

impl Entry<'_> {
    pub fn field(mut self, key: impl Into<String>, value: &dyn Inspect) -> Self {
        let payload = convert(value, &self.hook.conversion);
        self.fields.insert(key.into(), payload);
        self
    }

    /// Convert `value` and merge its top-level keys into the entry.
    /// Values that do not convert to a map are ignored.
    pub fn fields_of(mut self, value: &dyn Inspect) -> Self {
        match convert(value, &self.hook.conversion) {
            Payload::Map(map) => self.fields.extend(map),
            other => trace!(payload = %other, "entry fields must convert to a map, ignored"),
        }
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Hand the entry to the background task. Returns `false` when it was
    /// filtered out by level or dropped because the channel was full.
    pub fn fire(self) -> bool {
        let hook = self.hook;
        if !hook.accepts(&self.level) {
            return false;
        }
        hook.enqueue(LogRecord {
            timestamp: Utc::now(),
            level: self.level.to_string(),
            target: self.target,
            module_path: None,
            file: None,
            line: None,
            fields: self.fields,
            message: self.message,
            service_name: hook.service_name.as_deref().map(str::to_string),
        })
    }
}

async fn run_batches(
    sink: Arc<dyn LogSink>,
    mut rx: mpsc::Receiver<LogRecord>,
    policy: BatchPolicy,
    enqueued_events: Arc<AtomicU64>,
    undelivered_events: Arc<AtomicU64>,
) {
    let mut batch = Vec::with_capacity(policy.batch_size);
    let mut ticker = interval(policy.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(record) => {
                    batch.push(record);
                    enqueued_events.fetch_add(1, Ordering::Relaxed);
                    if batch.len() >= policy.batch_size {
                        deliver(&*sink, &mut batch, &policy, &undelivered_events).await;
                    }
                }
                None => {
                    if !batch.is_empty() {
                        deliver(&*sink, &mut batch, &policy, &undelivered_events).await;
                    }
                    debug!("all hook handles dropped, batching task stopped");
                    break;
                }
            },
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    deliver(&*sink, &mut batch, &policy, &undelivered_events).await;
                }
            }
        }
    }
}

async fn deliver(
    sink: &dyn LogSink,
    batch: &mut Vec<LogRecord>,
    policy: &BatchPolicy,
    undelivered_events: &AtomicU64,
) {
    if let Err(e) = send_batch(sink, batch, policy.max_attempts).await {
        let lost = batch.len();
        undelivered_events.fetch_add(lost as u64, Ordering::Relaxed);
        batch.clear();
        warn!(error = %e, lost, "log sink kept failing, batch dropped");
        return;
    }
    if let Err(e) = sink.flush().await {
        warn!(error = %e, "log sink flush failed");
    }
}

/// Send every pending record, retrying from the first unsent one with
/// exponential backoff. Delivered records are removed from `batch`.
async fn send_batch(
    sink: &dyn LogSink,
    batch: &mut Vec<LogRecord>,
    max_attempts: usize,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 1;
    loop {
        let mut sent = 0;
        let mut failure = None;
        for record in batch.iter() {
            if let Err(e) = sink.send(record).await {
                failure = Some(e);
                break;
            }
            sent += 1;
        }
        batch.drain(..sent);

        let Some(e) = failure else {
            return Ok(());
        };
        if attempt >= max_attempts {
            return Err(e);
        }

        warn!(error = %e, attempt, retry_in = ?backoff, "log sink send failed, retrying");
        sleep(backoff).await;
        backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
        attempt += 1;
    }
}

impl<S> Layer<S> for FluentHook
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(CRATE_TARGET) {
            return;
        }
        if !self.accepts(meta.level()) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: Utc::now(),
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            module_path: meta.module_path().map(|s| s.to_string()),
            file: meta.file().map(|s| s.to_string()),
            line: meta.line(),
            fields,
            message,
            service_name: self.service_name.as_deref().map(str::to_string),
        };

        self.enqueue(record);
    }
}

/// Collects `tracing` event fields as payloads. The `message` field is
/// kept apart.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, Payload>,
    pub message: &'a mut Option<String>,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Payload::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Payload::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Payload::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Payload::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Payload::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        self.fields.insert(field.name().to_string(), Payload::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            *self.message = Some(rendered);
        } else {
            self.fields.insert(field.name().to_string(), Payload::String(rendered));
        }
    }
}

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use tracing_fluent_hook::error::MarshalError;
use tracing_fluent_hook::init::HookConfig;
use tracing_fluent_hook::record::LogRecord;
use tracing_fluent_hook::{inspect_struct, ConversionConfig, FluentHook, LogSink, Marshaler, Payload};

inspect_struct! {
    #[derive(Debug, Clone, Default)]
    pub struct User {
        pub id: u64 [r#"fluent:"id""#],
        pub email: String [r#"fluent:"email,omitempty""#],
        pub password: String [r#"fluent:"-""#],
    }
}

inspect_struct! {
    @marshaler
    #[derive(Debug, Clone)]
    pub struct TraceId {
        pub hex: String,
    }
}

impl Marshaler for TraceId {
    fn marshal_msg(&self, mut buf: Vec<u8>) -> Result<Vec<u8>, MarshalError> {
        buf.extend_from_slice(self.hex.as_bytes());
        Ok(buf)
    }
}

#[derive(Default)]
struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Fails the first `failures` sends, then stores records.
struct FlakySink {
    failures: usize,
    calls: AtomicUsize,
    inner: MemorySink,
}

#[async_trait]
impl LogSink for FlakySink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err("collector unavailable".into());
        }
        self.inner.send(record).await
    }
}

fn quiet_config() -> HookConfig {
    HookConfig {
        enable_stdout: false,
        flush_interval: Duration::from_millis(20),
        ..HookConfig::default()
    }
}

#[tokio::test]
async fn entry_fields_are_converted_before_shipping() {
    let sink = Arc::new(MemorySink::default());
    let config = HookConfig {
        service_name: Some("auth-svc".to_string()),
        ..quiet_config()
    };
    let (hook, handle) = FluentHook::new(sink.clone(), &config);

    let user = User { id: 7, email: String::new(), password: "hunter2".into() };
    let fired = hook
        .entry(Level::ERROR, "auth")
        .field("user", &user)
        .field("attempts", &3u32)
        .message("login failed")
        .fire();
    assert!(fired);

    drop(hook);
    handle.await.expect("batching task finishes");

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.level, "ERROR");
    assert_eq!(record.target, "auth");
    assert_eq!(record.message.as_deref(), Some("login failed"));
    assert_eq!(record.service_name.as_deref(), Some("auth-svc"));
    assert_eq!(record.fields["attempts"], Payload::U64(3));

    let user = &record.fields["user"];
    assert_eq!(user.get("id"), Some(&Payload::U64(7)));
    assert!(user.get("email").is_none());
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn struct_fields_can_be_merged_into_the_entry() {
    let sink = Arc::new(MemorySink::default());
    let (hook, handle) = FluentHook::new(sink.clone(), &quiet_config());

    let user = User { id: 1, email: "a@b.c".into(), password: String::new() };
    hook.entry(Level::ERROR, "auth").fields_of(&user).fields_of(&42u8).fire();

    drop(hook);
    handle.await.expect("batching task finishes");

    let fields = &sink.records()[0].fields;
    let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["email", "id"]);
}

#[tokio::test]
async fn escape_hatch_values_reach_the_sink_untouched() {
    let sink = Arc::new(MemorySink::default());
    let config = HookConfig {
        conversion: ConversionConfig::default().with_escape_hatch(true),
        ..quiet_config()
    };
    let (hook, handle) = FluentHook::new(sink.clone(), &config);

    let trace = TraceId { hex: "beef".into() };
    hook.entry(Level::ERROR, "rpc").field("trace", &trace).fire();

    drop(hook);
    handle.await.expect("batching task finishes");

    match &sink.records()[0].fields["trace"] {
        Payload::Marshaled(m) => assert_eq!(m.marshal_msg(Vec::new()).unwrap(), b"beef".to_vec()),
        other => panic!("expected passthrough, got {other:?}"),
    }
}

#[tokio::test]
async fn entries_below_min_level_are_filtered() {
    let sink = Arc::new(MemorySink::default());
    let (hook, handle) = FluentHook::new(sink.clone(), &quiet_config());

    assert!(!hook.entry(Level::INFO, "app").message("ignored").fire());
    assert!(hook.entry(Level::ERROR, "app").message("kept").fire());
    assert_eq!(hook.total_events.load(Ordering::Relaxed), 2);

    drop(hook);
    handle.await.expect("batching task finishes");
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message.as_deref(), Some("kept"));
}

#[tokio::test]
async fn tracing_events_are_recorded_through_the_layer() {
    let sink = Arc::new(MemorySink::default());
    let config = HookConfig { min_level: Level::WARN, ..quiet_config() };
    let (hook, handle) = FluentHook::new(sink.clone(), &config);

    let subscriber = Registry::default().with(hook.clone());
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!(user_id = 42u64, reason = "invalid password", ratio = 0.5, "authentication failed");
        tracing::warn!(retry = true, "slow collector");
        tracing::info!("not shipped");
        tracing::error!(target: "tracing_fluent_hook::hook", "internal diagnostics are ignored");
    });

    drop(hook);
    handle.await.expect("batching task finishes");

    let records = sink.records();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.message.as_deref(), Some("authentication failed"));
    assert_eq!(first.fields["user_id"], Payload::U64(42));
    assert_eq!(first.fields["reason"], Payload::String("invalid password".into()));
    assert_eq!(first.fields["ratio"], Payload::F64(0.5));
    assert!(first.line.is_some());

    assert_eq!(records[1].level, "WARN");
    assert_eq!(records[1].fields["retry"], Payload::Bool(true));
}

#[tokio::test]
async fn full_channel_drops_records() {
    let sink = Arc::new(MemorySink::default());
    let config = HookConfig { channel_buffer: 16, batch_size: 1000, ..quiet_config() };
    let (hook, handle) = FluentHook::new(sink.clone(), &config);

    // The background task cannot run until this test yields.
    for i in 0..100u32 {
        hook.entry(Level::ERROR, "load").field("i", &i).fire();
    }
    assert_eq!(hook.dropped_events.load(Ordering::Relaxed), 84);

    let enqueued = Arc::clone(&hook.enqueued_events);
    drop(hook);
    handle.await.expect("batching task finishes");
    assert_eq!(sink.records().len(), 16);
    assert_eq!(enqueued.load(Ordering::Relaxed), 16);
}

#[tokio::test]
async fn partial_batch_is_flushed_on_interval() {
    let sink = Arc::new(MemorySink::default());
    let config = HookConfig { batch_size: 100, ..quiet_config() };
    let (hook, handle) = FluentHook::new(sink.clone(), &config);

    hook.entry(Level::ERROR, "tick").fire();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.records().len(), 1);

    drop(hook);
    handle.await.expect("batching task finishes");
}

#[tokio::test]
async fn failed_sends_are_retried_without_duplicates() {
    let sink = Arc::new(FlakySink {
        failures: 2,
        calls: AtomicUsize::new(0),
        inner: MemorySink::default(),
    });
    let (hook, handle) = FluentHook::new(sink.clone(), &quiet_config());

    hook.entry(Level::ERROR, "a").fire();
    hook.entry(Level::ERROR, "b").fire();
    let undelivered = Arc::clone(&hook.undelivered_events);
    drop(hook);
    handle.await.expect("batching task finishes");

    let targets: Vec<String> = sink.inner.records().into_iter().map(|r| r.target).collect();
    assert_eq!(targets, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(undelivered.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn batch_is_dropped_after_max_attempts() {
    let sink = Arc::new(FlakySink {
        failures: usize::MAX,
        calls: AtomicUsize::new(0),
        inner: MemorySink::default(),
    });
    let config = HookConfig { max_send_attempts: 2, ..quiet_config() };
    let (hook, handle) = FluentHook::new(sink.clone(), &config);

    hook.entry(Level::ERROR, "lost").fire();
    let undelivered = Arc::clone(&hook.undelivered_events);
    drop(hook);
    handle.await.expect("batching task finishes");

    assert!(sink.inner.records().is_empty());
    assert_eq!(undelivered.load(Ordering::Relaxed), 1);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
}

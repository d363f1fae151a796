use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::Level;

use tracing_fluent_hook::init::{init_tracing_with_config, HookConfig};
use tracing_fluent_hook::inspect_struct;
use tracing_fluent_hook::noop_sink::NoopSink;

inspect_struct! {
    #[derive(Debug, Clone, Default)]
    pub struct Origin {
        pub host: String [r#"fluent:"host""#],
        pub pid: u32 [r#"fluent:"pid,omitempty""#],
    }
}

inspect_struct! {
    #[derive(Debug, Clone, Default)]
    pub struct Job {
        pub origin: Origin [embed],
        pub id: u64 [r#"fluent:"job_id""#],
        pub labels: HashMap<String, String> [r#"fluent:"labels,omitempty""#],
        pub steps: Vec<String> [r#"fluent:"steps""#],
        pub token: String [r#"fluent:"-""#],
    }
}

/// Measures the cost of converting a nested struct per event.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = Arc::new(NoopSink::default());

    let config = HookConfig {
        channel_buffer: 50_000,
        batch_size: 1_000,
        flush_interval: Duration::from_millis(200),
        enable_stdout: false,
        ..HookConfig::default()
    };

    let hook = init_tracing_with_config(sink.clone(), config)?;

    let job = Job {
        origin: Origin { host: "worker-1".into(), pid: 4242 },
        id: 0,
        labels: HashMap::from([("queue".to_string(), "default".to_string())]),
        steps: vec!["fetch".into(), "build".into(), "upload".into()],
        token: "secret".into(),
    };

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        hook.entry(Level::ERROR, "jobs")
            .field("job", &job)
            .field("iteration", &i)
            .message("custom load test error")
            .fire();
    }

    let elapsed = start.elapsed();
    println!("custom config: sent {} events in {:?} (~{:.0} ev/s), dropped {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        hook.dropped_events.load(std::sync::atomic::Ordering::Relaxed)
    );

    sleep(Duration::from_secs(2)).await;
    println!("sink received {} records", sink.discarded());
    Ok(())
}

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{error, info, Level};
use tracing_fluent_hook::{
    init::init_tracing,
    inspect_struct,
    record::LogRecord,
    sink::LogSink,
    Payload,
};

/// Example of integrating a completely custom backend by implementing
/// the `LogSink` trait directly. Imagine this forwards to a collector for
/// which this crate does not provide a built-in sink.
struct MyCollectorSink;

#[async_trait]
impl LogSink for MyCollectorSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // A real sink would hand `record.fields` to its encoder here.
        println!("[my-collector] {} {}", record.target, Payload::Map(record.fields.clone()));
        Ok(())
    }
}

inspect_struct! {
    #[derive(Debug)]
    pub struct Login {
        pub user: String [r#"fluent:"user""#],
        pub attempts: u32 [r#"fluent:"attempts,omitempty""#],
        pub password: String [r#"fluent:"-""#],
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn LogSink> = Arc::new(MyCollectorSink);

    let hook = init_tracing(sink)?;

    info!("custom backend example started");
    error!(db = "my-collector", "simulated error sent via custom backend");

    let login = Login { user: "ann".into(), attempts: 3, password: "hunter2".into() };
    hook.entry(Level::ERROR, "auth")
        .field("login", &login)
        .message("login rejected")
        .fire();

    sleep(Duration::from_secs(2)).await;
    Ok(())
}

use crate::config::ConversionConfig;
use crate::env::{env_opt, FLUENT_HOOK_SERVICE_NAME_ENV};
use crate::error::{ConfigError, InitError};
use crate::hook::FluentHook;
use crate::sink::LogSink;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging hook.
///
/// Controls the size of the internal buffer, the batch size used when
/// sending to the sink, how often partial batches are flushed, which levels
/// are shipped and how field values are converted.
///
/// **Fields**
/// - `channel_buffer`: maximum number of queued records before new ones
///   are dropped.
/// - `batch_size`: records per batch sent to the sink.
/// - `flush_interval`: maximum delay before a partial batch is flushed.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the hook and events are printed to the console.
/// - `min_level`: least severe level that is shipped.
/// - `max_send_attempts`: tries per batch before it is dropped.
/// - `service_name`: attached to every record when set.
/// - `conversion`: settings for converting field values.
#[derive(Clone, Debug)]
pub struct HookConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub enable_stdout: bool,
    pub min_level: Level,
    pub max_send_attempts: usize,
    pub service_name: Option<String>,
    pub conversion: ConversionConfig,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            enable_stdout: true,
            min_level: Level::ERROR,
            max_send_attempts: 5,
            service_name: None,
            conversion: ConversionConfig::default(),
        }
    }
}

impl HookConfig {
    /// Defaults overridden by `FLUENT_HOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            service_name: env_opt(FLUENT_HOOK_SERVICE_NAME_ENV),
            conversion: ConversionConfig::from_env()?,
            ..Self::default()
        })
    }
}

/// Install the hook as part of the global `tracing` subscriber.
///
/// **Parameters**
/// - `sink`: implementation of [`LogSink`] that receives the converted
///   [`LogRecord`](crate::record::LogRecord)s.
/// - `config`: [`HookConfig`] controlling buffering, batching and
///   conversion.
///
/// **Returns**
///
/// A handle to the installed hook, usable for structured entries via
/// [`FluentHook::entry`]. Fails when the conversion config is invalid or a
/// global subscriber is already set. Must be called inside a Tokio runtime.
pub fn init_tracing_with_config(sink: Arc<dyn LogSink>, config: HookConfig) -> Result<FluentHook, InitError> {
    config.conversion.validate()?;

    let (hook, _handle) = FluentHook::new(sink, &config);

    // The fmt layer changes the subscriber type, hence two branches.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(hook.clone()).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(hook.clone());
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(hook)
}

/// Install the hook with [`HookConfig::default`].
pub fn init_tracing(sink: Arc<dyn LogSink>) -> Result<FluentHook, InitError> {
    init_tracing_with_config(sink, HookConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop_sink::NoopSink;

    #[tokio::test]
    async fn invalid_conversion_config_is_rejected_before_install() {
        let config = HookConfig {
            conversion: ConversionConfig::new("bad tag"),
            ..HookConfig::default()
        };
        let Err(err) = init_tracing_with_config(Arc::new(NoopSink::default()), config) else {
            panic!("invalid tag name was accepted");
        };
        assert!(matches!(err, InitError::Config(ConfigError::InvalidTagName(_))));
    }

    #[test]
    fn defaults_ship_errors_only() {
        let config = HookConfig::default();
        assert_eq!(config.min_level, Level::ERROR);
        assert_eq!(config.conversion.tag_name, "fluent");
    }
}

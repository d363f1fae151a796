//! Logging hook that turns arbitrary field values into serializer-agnostic
//! [`Payload`] trees.
//!
//! The core is [`convert`]: it walks any [`Inspect`] value, flattens structs
//! according to their tags (`fluent:"name,omitempty"`), merges embedded
//! structs, stringifies map keys and keeps sequence order. Around it,
//! [`FluentHook`] ships converted records to a pluggable [`LogSink`].

pub mod config;
pub mod convert;
pub mod env;
pub mod error;
pub mod inspect;
pub mod marshal;
pub mod payload;
pub mod tag;

pub mod record;
pub mod sink;
pub mod hook;

#[cfg(feature = "console")]
pub mod console_sink;

pub mod init;
pub mod noop_sink;

pub use config::ConversionConfig;
pub use convert::convert;
pub use hook::FluentHook;
pub use inspect::{FieldDescriptor, Inspect, Kind, StructInspect};
pub use marshal::Marshaler;
pub use payload::Payload;
pub use sink::LogSink;

use crate::error::MarshalError;
use std::fmt;

/// Capability of a value that knows how to encode itself.
///
/// When [`ConversionConfig::use_escape_hatch`](crate::config::ConversionConfig)
/// is enabled, the converter does not descend into values exposing this
/// capability through [`Inspect::marshaler`](crate::inspect::Inspect::marshaler);
/// they are handed to the downstream encoder unchanged as
/// [`Payload::Marshaled`](crate::payload::Payload::Marshaled).
pub trait Marshaler: fmt::Debug + Send + Sync {
    /// Append this value's own encoding to `buf` and return the extended
    /// buffer.
    fn marshal_msg(&self, buf: Vec<u8>) -> Result<Vec<u8>, MarshalError>;
}

impl<T: Marshaler + ?Sized> Marshaler for Box<T> {
    fn marshal_msg(&self, buf: Vec<u8>) -> Result<Vec<u8>, MarshalError> {
        (**self).marshal_msg(buf)
    }
}

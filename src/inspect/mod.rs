//! Read-only view of a value's shape.
//!
//! Every value the converter accepts implements [`Inspect`]. Scalars, strings,
//! collections, smart pointers, channels and `chrono` timestamps are covered
//! here; structs get their field table from the [`inspect_struct!`] macro
//! (or a hand-written [`StructInspect`] impl).
//!
//! Pointer-like wrappers (`&T`, `Box<T>`, `Rc<T>`, `Arc<T>`, `Cow<T>`) are
//! transparent. `Option<T>` plays the role of a nullable pointer: `None` is
//! [`Kind::Invalid`] and `Some(v)` behaves like `v`.
//!
//! [`inspect_struct!`]: crate::inspect_struct

mod impls;
mod macros;


use crate::marshal::Marshaler;
use crate::payload::Payload;
use std::fmt;
use std::sync::Arc;

/// Runtime shape of a value.
pub enum Kind<'a> {
    Struct(&'a dyn StructInspect),
    /// Key/value pairs; keys are stringified with `Display`.
    Map(Box<dyn Iterator<Item = (&'a dyn fmt::Display, &'a dyn Inspect)> + 'a>),
    Seq(Box<dyn Iterator<Item = &'a dyn Inspect> + 'a>),
    /// Channel endpoints carry no loggable state.
    Channel,
    /// Null pointer or otherwise unreadable value.
    Invalid,
    /// Leaf value, returned by the converter as-is.
    Scalar(Payload),
}

impl Kind<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Struct(_) => "struct",
            Kind::Map(_) => "map",
            Kind::Seq(_) => "seq",
            Kind::Channel => "channel",
            Kind::Invalid => "invalid",
            Kind::Scalar(_) => "scalar",
        }
    }
}

impl fmt::Debug for Kind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Struct(s) => f.debug_tuple("Struct").field(&s.type_name()).finish(),
            Kind::Scalar(p) => f.debug_tuple("Scalar").field(p).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// A value the converter can look into.
pub trait Inspect {
    /// Shape of this value.
    fn kind(&self) -> Kind<'_>;

    /// Whether this value equals its type's zero/default value.
    ///
    /// Used by the `omitempty` tag option.
    fn is_zero(&self) -> bool;

    /// Escape hatch: a value that encodes itself returns its
    /// [`Marshaler`] here and is then passed through untouched when the
    /// escape hatch is enabled.
    fn marshaler(&self) -> Option<Arc<dyn Marshaler>> {
        None
    }
}

/// Static description of one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// `true` for `pub` fields.
    pub exported: bool,
    /// Embedded field whose own fields are promoted into the parent.
    pub anonymous: bool,
    pub type_name: &'static str,
    /// Raw struct tag, e.g. `fluent:"name,omitempty" json:"name"`.
    pub tag: &'static str,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            exported: true,
            anonymous: false,
            type_name,
            tag: "",
        }
    }

    pub const fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    pub const fn embedded(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub const fn tagged(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }
}

/// Field table and field access for a struct value.
///
/// `fields()` is a static table in declaration order; `field(i)` returns the
/// value of the `i`-th entry.
pub trait StructInspect {
    fn type_name(&self) -> &'static str;

    fn fields(&self) -> &'static [FieldDescriptor];

    fn field(&self, index: usize) -> Option<&dyn Inspect>;
}

/// Zero-value check usable on trait objects.
pub fn is_zero(value: &dyn Inspect) -> bool {
    value.is_zero()
}

/// Whether a stringified visibility (as produced by `stringify!($vis)`)
/// makes a field exported.
#[doc(hidden)]
pub const fn is_exported(vis: &str) -> bool {
    let b = vis.as_bytes();
    b.len() == 3 && b[0] == b'p' && b[1] == b'u' && b[2] == b'b'
}

use crate::inspect::{Inspect, Kind};
use crate::marshal::Marshaler;
use serde::ser::{Error as _, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Serializer-agnostic value tree produced by the converter.
///
/// Struct and map inputs become [`Payload::Map`], sequences become
/// [`Payload::Array`], scalars keep their value and channel-like or invalid
/// inputs become [`Payload::Null`].
#[derive(Debug, Clone)]
pub enum Payload {
    /// Absent value.
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    /// Single precision, not widened to `f64`.
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Payload>),
    Map(BTreeMap<String, Payload>),
    /// Original value passed through by the escape hatch.
    Marshaled(Arc<dyn Marshaler>),
}

impl Payload {
    pub fn marshaled(value: impl Marshaler + 'static) -> Self {
        Payload::Marshaled(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Payload>> {
        match self {
            Payload::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Payload]> {
        match self {
            Payload::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up `key` when this payload is a map.
    pub fn get(&self, key: &str) -> Option<&Payload> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Null, Payload::Null) => true,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::I64(a), Payload::I64(b)) => a == b,
            (Payload::U64(a), Payload::U64(b)) => a == b,
            (Payload::F32(a), Payload::F32(b)) => a == b,
            (Payload::F64(a), Payload::F64(b)) => a == b,
            (Payload::String(a), Payload::String(b)) => a == b,
            (Payload::Bytes(a), Payload::Bytes(b)) => a == b,
            (Payload::Array(a), Payload::Array(b)) => a == b,
            (Payload::Map(a), Payload::Map(b)) => a == b,
            // Marshaled values have no structural identity; compare by origin.
            (Payload::Marshaled(a), Payload::Marshaled(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Null => f.write_str("null"),
            Payload::Bool(v) => write!(f, "{v}"),
            Payload::I64(v) => write!(f, "{v}"),
            Payload::U64(v) => write!(f, "{v}"),
            Payload::F32(v) => write!(f, "{v}"),
            Payload::F64(v) => write!(f, "{v}"),
            Payload::String(v) => f.write_str(v),
            Payload::Bytes(v) => write!(f, "{v:?}"),
            Payload::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Payload::Map(map) => {
                f.write_str("map[")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("]")
            }
            Payload::Marshaled(m) => write!(f, "{m:?}"),
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Null => serializer.serialize_unit(),
            Payload::Bool(v) => serializer.serialize_bool(*v),
            Payload::I64(v) => serializer.serialize_i64(*v),
            Payload::U64(v) => serializer.serialize_u64(*v),
            Payload::F32(v) => serializer.serialize_f32(*v),
            Payload::F64(v) => serializer.serialize_f64(*v),
            Payload::String(v) => serializer.serialize_str(v),
            Payload::Bytes(v) => serializer.serialize_bytes(v),
            Payload::Array(items) => serializer.collect_seq(items),
            Payload::Map(map) => serializer.collect_map(map),
            Payload::Marshaled(m) => {
                let bytes = m.marshal_msg(Vec::new()).map_err(S::Error::custom)?;
                serializer.serialize_bytes(&bytes)
            }
        }
    }
}

macro_rules! payload_from {
    ($($t:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$t> for Payload {
                fn from(value: $t) -> Self {
                    Payload::$variant(<$target>::from(value))
                }
            }
        )*
    };
}

payload_from! {
    bool => Bool as bool,
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    f32 => F32 as f32,
    f64 => F64 as f64,
    String => String as String,
    &str => String as String,
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Payload::Array(items)
    }
}

impl From<BTreeMap<String, Payload>> for Payload {
    fn from(map: BTreeMap<String, Payload>) -> Self {
        Payload::Map(map)
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        value.map_or(Payload::Null, Into::into)
    }
}

// Already-converted data converts to itself.
impl Inspect for Payload {
    fn kind(&self) -> Kind<'_> {
        match self {
            Payload::Null => Kind::Invalid,
            Payload::Array(items) => Kind::Seq(Box::new(items.iter().map(|v| v as &dyn Inspect))),
            Payload::Map(map) => Kind::Map(Box::new(
                map.iter().map(|(k, v)| (k as &dyn fmt::Display, v as &dyn Inspect)),
            )),
            scalar => Kind::Scalar(scalar.clone()),
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Payload::Null => true,
            Payload::Bool(v) => !*v,
            Payload::I64(v) => *v == 0,
            Payload::U64(v) => *v == 0,
            Payload::F32(v) => *v == 0.0,
            Payload::F64(v) => *v == 0.0,
            Payload::String(v) => v.is_empty(),
            Payload::Bytes(v) => v.is_empty(),
            Payload::Array(v) => v.is_empty(),
            Payload::Map(v) => v.is_empty(),
            Payload::Marshaled(_) => false,
        }
    }

    fn marshaler(&self) -> Option<Arc<dyn Marshaler>> {
        match self {
            Payload::Marshaled(m) => Some(Arc::clone(m)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarshalError;

    #[derive(Debug)]
    struct Fixed(&'static [u8]);

    impl Marshaler for Fixed {
        fn marshal_msg(&self, mut buf: Vec<u8>) -> Result<Vec<u8>, MarshalError> {
            buf.extend_from_slice(self.0);
            Ok(buf)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Marshaler for Broken {
        fn marshal_msg(&self, _buf: Vec<u8>) -> Result<Vec<u8>, MarshalError> {
            Err(MarshalError::custom("boom"))
        }
    }

    #[test]
    fn serializes_nested_tree_as_plain_json() {
        let mut inner = BTreeMap::new();
        inner.insert("id".to_string(), Payload::from(7u32));
        let mut map = BTreeMap::new();
        map.insert("user".to_string(), Payload::Map(inner));
        map.insert("tags".to_string(), Payload::Array(vec!["a".into(), "b".into()]));
        map.insert("gone".to_string(), Payload::Null);

        let json = serde_json::to_value(Payload::Map(map)).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({ "gone": null, "tags": ["a", "b"], "user": { "id": 7 } })
        );
    }

    #[test]
    fn marshaled_payload_serializes_its_own_bytes() {
        let payload = Payload::marshaled(Fixed(&[1, 2, 3]));
        let json = serde_json::to_value(&payload).expect("serializes");
        assert_eq!(json, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn marshal_failure_surfaces_as_serializer_error() {
        let err = serde_json::to_string(&Payload::marshaled(Broken)).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn marshaled_equality_is_by_identity() {
        let a = Payload::marshaled(Fixed(b"x"));
        let b = Payload::marshaled(Fixed(b"x"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn f32_keeps_its_own_precision() {
        let payload = Payload::from(1.1f32);
        assert_eq!(payload, Payload::F32(1.1));
        assert_eq!(serde_json::to_string(&payload).expect("serializes"), "1.1");
        assert_eq!(payload.to_string(), "1.1");
    }

    #[test]
    fn displays_like_a_log_line() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Payload::from(1i64));
        map.insert("b".to_string(), Payload::Array(vec![true.into(), Payload::Null]));
        assert_eq!(Payload::Map(map).to_string(), "map[a:1 b:[true null]]");
    }
}

use super::{Inspect, Kind};
use crate::marshal::Marshaler;
use crate::payload::Payload;
use chrono::{DateTime, TimeZone};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::{mpsc as std_mpsc, Arc};
use tokio::sync::mpsc as tokio_mpsc;

macro_rules! inspect_scalar {
    ($($t:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl Inspect for $t {
                fn kind(&self) -> Kind<'_> {
                    Kind::Scalar(Payload::$variant(*self as $target))
                }

                fn is_zero(&self) -> bool {
                    *self == <$t>::default()
                }
            }
        )*
    };
}

inspect_scalar! {
    bool => Bool as bool,
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    isize => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    usize => U64 as u64,
    f32 => F32 as f32,
    f64 => F64 as f64,
}

impl Inspect for char {
    fn kind(&self) -> Kind<'_> {
        Kind::Scalar(Payload::String(self.to_string()))
    }

    fn is_zero(&self) -> bool {
        *self == '\0'
    }
}

impl Inspect for str {
    fn kind(&self) -> Kind<'_> {
        Kind::Scalar(Payload::String(self.to_owned()))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Inspect for String {
    fn kind(&self) -> Kind<'_> {
        self.as_str().kind()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<Tz: TimeZone> Inspect for DateTime<Tz>
where
    Tz::Offset: fmt::Display,
{
    fn kind(&self) -> Kind<'_> {
        Kind::Scalar(Payload::String(self.to_rfc3339()))
    }

    fn is_zero(&self) -> bool {
        self.timestamp() == 0 && self.timestamp_subsec_nanos() == 0
    }
}

// Pointers. A borrow is zero when its target is, so `&str` and `&[T]`
// agree with their `Default`. Owning pointers are never zero.

impl<T: Inspect + ?Sized> Inspect for &T {
    fn kind(&self) -> Kind<'_> {
        (**self).kind()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }

    fn marshaler(&self) -> Option<Arc<dyn Marshaler>> {
        (**self).marshaler()
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    fn kind(&self) -> Kind<'_> {
        (**self).kind()
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn marshaler(&self) -> Option<Arc<dyn Marshaler>> {
        (**self).marshaler()
    }
}

impl<T: Inspect + ?Sized> Inspect for Rc<T> {
    fn kind(&self) -> Kind<'_> {
        (**self).kind()
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn marshaler(&self) -> Option<Arc<dyn Marshaler>> {
        (**self).marshaler()
    }
}

impl<T: Inspect + ?Sized> Inspect for Arc<T> {
    fn kind(&self) -> Kind<'_> {
        (**self).kind()
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn marshaler(&self) -> Option<Arc<dyn Marshaler>> {
        (**self).marshaler()
    }
}

impl<T> Inspect for Cow<'_, T>
where
    T: Inspect + ToOwned + ?Sized,
{
    fn kind(&self) -> Kind<'_> {
        (**self).kind()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }

    fn marshaler(&self) -> Option<Arc<dyn Marshaler>> {
        (**self).marshaler()
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn kind(&self) -> Kind<'_> {
        match self {
            Some(v) => v.kind(),
            None => Kind::Invalid,
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn marshaler(&self) -> Option<Arc<dyn Marshaler>> {
        self.as_ref().and_then(Inspect::marshaler)
    }
}

// Sequences.

impl<T: Inspect> Inspect for [T] {
    fn kind(&self) -> Kind<'_> {
        Kind::Seq(Box::new(self.iter().map(|v| v as &dyn Inspect)))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn kind(&self) -> Kind<'_> {
        self.as_slice().kind()
    }

    // A fixed-size array is zero when every element is.
    fn is_zero(&self) -> bool {
        self.iter().all(Inspect::is_zero)
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn kind(&self) -> Kind<'_> {
        self.as_slice().kind()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn kind(&self) -> Kind<'_> {
        Kind::Seq(Box::new(self.iter().map(|v| v as &dyn Inspect)))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

// Mappings.

impl<K: fmt::Display, V: Inspect, S> Inspect for HashMap<K, V, S> {
    fn kind(&self) -> Kind<'_> {
        Kind::Map(Box::new(
            self.iter().map(|(k, v)| (k as &dyn fmt::Display, v as &dyn Inspect)),
        ))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K: fmt::Display, V: Inspect> Inspect for BTreeMap<K, V> {
    fn kind(&self) -> Kind<'_> {
        Kind::Map(Box::new(
            self.iter().map(|(k, v)| (k as &dyn fmt::Display, v as &dyn Inspect)),
        ))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

// Channels.

macro_rules! inspect_channel {
    ($($t:ty),* $(,)?) => {
        $(
            impl<T> Inspect for $t {
                fn kind(&self) -> Kind<'_> {
                    Kind::Channel
                }

                fn is_zero(&self) -> bool {
                    false
                }
            }
        )*
    };
}

inspect_channel! {
    std_mpsc::Sender<T>,
    std_mpsc::SyncSender<T>,
    std_mpsc::Receiver<T>,
    tokio_mpsc::Sender<T>,
    tokio_mpsc::Receiver<T>,
    tokio_mpsc::UnboundedSender<T>,
    tokio_mpsc::UnboundedReceiver<T>,
}

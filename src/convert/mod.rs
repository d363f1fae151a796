//! Conversion of inspected values into [`Payload`] trees.
//!
//! The entry point is [`convert`]. Structs are flattened into maps keyed by
//! their tag names, embedded structs are merged into the same map, maps are
//! keyed by the `Display` form of their keys and sequences keep their order.
//! Conversion never fails: anything unreadable becomes [`Payload::Null`].


use crate::config::ConversionConfig;
use crate::inspect::{Inspect, Kind, StructInspect};
use crate::payload::Payload;
use crate::tag::{self, OMIT_EMPTY};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

/// Convert `value` into a serializer-agnostic payload.
///
/// With `config.use_escape_hatch` set, a value exposing a
/// [`Marshaler`](crate::marshal::Marshaler) is returned as
/// [`Payload::Marshaled`] without looking inside it.
pub fn convert(value: &dyn Inspect, config: &ConversionConfig) -> Payload {
    Walker::new(config).value(value, 0)
}

/// Flatten a struct into a map of its exported fields.
pub fn flatten(value: &dyn StructInspect, config: &ConversionConfig) -> BTreeMap<String, Payload> {
    let mut out = BTreeMap::new();
    Walker::new(config).struct_into(&mut out, value, 0);
    out
}

/// Convert map entries, stringifying each key.
pub fn convert_map<'a, I>(entries: I, config: &ConversionConfig) -> BTreeMap<String, Payload>
where
    I: IntoIterator<Item = (&'a dyn fmt::Display, &'a dyn Inspect)>,
{
    Walker::new(config).map(entries, 0)
}

/// Convert sequence elements, preserving order.
pub fn convert_seq<'a, I>(items: I, config: &ConversionConfig) -> Vec<Payload>
where
    I: IntoIterator<Item = &'a dyn Inspect>,
{
    Walker::new(config).seq(items, 0)
}

struct Walker<'c> {
    config: &'c ConversionConfig,
}

impl<'c> Walker<'c> {
    fn new(config: &'c ConversionConfig) -> Self {
        Self { config }
    }

    fn value(&self, value: &dyn Inspect, depth: usize) -> Payload {
        if depth > self.config.max_depth {
            debug!(max_depth = self.config.max_depth, "conversion depth exceeded, value dropped");
            return Payload::Null;
        }

        if self.config.use_escape_hatch {
            if let Some(marshaler) = value.marshaler() {
                return Payload::Marshaled(marshaler);
            }
        }

        match value.kind() {
            Kind::Struct(s) => {
                let mut out = BTreeMap::new();
                self.struct_into(&mut out, s, depth);
                Payload::Map(out)
            }
            Kind::Map(entries) => Payload::Map(self.map(entries, depth)),
            Kind::Seq(items) => Payload::Array(self.seq(items, depth)),
            kind @ (Kind::Channel | Kind::Invalid) => {
                trace!(kind = kind.name(), "value has no loggable form");
                Payload::Null
            }
            Kind::Scalar(scalar) => scalar,
        }
    }

    fn struct_into(&self, out: &mut BTreeMap<String, Payload>, value: &dyn StructInspect, depth: usize) {
        if depth > self.config.max_depth {
            debug!(
                max_depth = self.config.max_depth,
                type_name = value.type_name(),
                "conversion depth exceeded, embedded fields dropped"
            );
            return;
        }

        for (index, field) in value.fields().iter().enumerate() {
            if !field.exported && !field.anonymous {
                continue;
            }
            let Some(field_value) = value.field(index) else {
                continue;
            };

            if field.anonymous {
                match field_value.kind() {
                    Kind::Struct(embedded) => self.struct_into(out, embedded, depth + 1),
                    other => trace!(
                        field = field.name,
                        kind = other.name(),
                        "embedded field is not a struct, skipped"
                    ),
                }
                continue;
            }

            let spec = tag::parse(field, &self.config.tag_name);
            if spec.is_skipped() {
                continue;
            }
            if spec.options.has(OMIT_EMPTY) && field_value.is_zero() {
                continue;
            }
            let converted = self.value(field_value, depth + 1);
            out.insert(spec.key(field).to_string(), converted);
        }
    }

    fn map<'a, I>(&self, entries: I, depth: usize) -> BTreeMap<String, Payload>
    where
        I: IntoIterator<Item = (&'a dyn fmt::Display, &'a dyn Inspect)>,
    {
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), self.value(value, depth + 1)))
            .collect()
    }

    fn seq<'a, I>(&self, items: I, depth: usize) -> Vec<Payload>
    where
        I: IntoIterator<Item = &'a dyn Inspect>,
    {
        items.into_iter().map(|item| self.value(item, depth + 1)).collect()
    }
}

/// Declare a struct together with its [`Inspect`](crate::inspect::Inspect)
/// and [`StructInspect`](crate::inspect::StructInspect) impls.
///
/// Each field may be followed by a bracketed annotation:
/// - `[r#"fluent:"name,omitempty""#]`: raw struct tag;
/// - `[embed]`: embedded field, flattened into the parent.
///
/// `pub` fields are exported; anything else is skipped by the converter
/// unless embedded. Prefix the body with `@marshaler` to route the type
/// through the escape hatch (requires `Clone + Marshaler + 'static`).
///
/// ```
/// use tracing_fluent_hook::{convert, inspect_struct, ConversionConfig};
///
/// inspect_struct! {
///     #[derive(Debug, Default)]
///     pub struct Person {
///         pub name: String [r#"fluent:"name""#],
///         pub age: u32 [r#"fluent:"age,omitempty""#],
///     }
/// }
///
/// let person = Person { name: "Ann".into(), age: 0 };
/// let payload = convert(&person, &ConversionConfig::default());
/// assert!(payload.get("name").is_some());
/// assert!(payload.get("age").is_none());
/// ```
#[macro_export]
macro_rules! inspect_struct {
    (@marshaler $($body:tt)*) => {
        $crate::inspect_struct!(@define [marshaler] $($body)*);
    };
    (
        @define [$($mode:ident)?]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $fname:ident : $fty:ty $([$($fattr:tt)*])?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $fname: $fty,
            )*
        }

        impl $crate::inspect::StructInspect for $name {
            fn type_name(&self) -> &'static str {
                stringify!($name)
            }

            fn fields(&self) -> &'static [$crate::inspect::FieldDescriptor] {
                const FIELDS: &[$crate::inspect::FieldDescriptor] = &[
                    $(
                        $crate::inspect::FieldDescriptor {
                            name: stringify!($fname),
                            exported: $crate::inspect::is_exported(stringify!($fvis)),
                            anonymous: $crate::__inspect_field_anonymous!($($($fattr)*)?),
                            type_name: stringify!($fty),
                            tag: $crate::__inspect_field_tag!($($($fattr)*)?),
                        },
                    )*
                ];
                FIELDS
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn field(&self, index: usize) -> Option<&dyn $crate::inspect::Inspect> {
                let mut remaining = index;
                $(
                    if remaining == 0 {
                        return Some(&self.$fname);
                    }
                    remaining -= 1;
                )*
                None
            }
        }

        impl $crate::inspect::Inspect for $name {
            fn kind(&self) -> $crate::inspect::Kind<'_> {
                $crate::inspect::Kind::Struct(self)
            }

            fn is_zero(&self) -> bool {
                true $(&& $crate::inspect::Inspect::is_zero(&self.$fname))*
            }

            $crate::__inspect_marshaler!($($mode)?);
        }
    };
    ($($body:tt)*) => {
        $crate::inspect_struct!(@define [] $($body)*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __inspect_field_anonymous {
    (embed) => {
        true
    };
    ($($other:tt)*) => {
        false
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __inspect_field_tag {
    ($tag:literal) => {
        $tag
    };
    ($($other:tt)*) => {
        ""
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __inspect_marshaler {
    (marshaler) => {
        fn marshaler(&self) -> Option<::std::sync::Arc<dyn $crate::marshal::Marshaler>> {
            Some(::std::sync::Arc::new(::std::clone::Clone::clone(self)))
        }
    };
    () => {};
}

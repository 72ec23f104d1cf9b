//! Macros for declaring validated classes
//!
//! A declared class is a zero-sized marker type whose `class()` returns the
//! registered [`ObjectClass`](crate::core::class::ObjectClass). Registration
//! runs exactly once, on first use, and completes before any instance of the
//! class can be constructed.

/// Declare a validated class with its accessors
///
/// Parents are listed after a colon and must themselves be declared with this
/// macro. Fields are declared in order; each value is an `Accessor` (or an
/// `Arc<Accessor>`).
///
/// # Example
///
/// ```rust
/// use accessor::prelude::*;
///
/// validated_class! {
///     /// A person with a non-negative age
///     pub struct Person {
///         name: Accessor::new(FieldType::String),
///         age: Accessor::new(FieldType::Integer)
///             .with_default(0)
///             .with_predicate(|_, v| v.as_integer().is_some_and(|a| a >= 0)),
///     }
/// }
///
/// validated_class! {
///     pub struct Employee: Person {
///         employer: Accessor::new(FieldType::String),
///     }
/// }
///
/// let bob = Employee::new([("name", "bob"), ("employer", "acme")]).unwrap();
/// assert_eq!(bob.get("age").unwrap(), FieldValue::Integer(0));
/// assert!(bob.set("age", -1).is_err());
/// ```
///
/// # Panics
///
/// `class()` panics on first use if the declaration itself is invalid (for
/// instance, a parent list with no consistent resolution order), the same way
/// a malformed class body fails when it is defined.
#[macro_export]
macro_rules! validated_class {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(: $($parent:ident),+ )? {
            $( $field:ident : $accessor:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $name;

        impl $name {
            /// Identity of the class, available before it is built
            pub fn class_id() -> $crate::core::class::ClassId {
                static ID: ::std::sync::OnceLock<$crate::core::class::ClassId> =
                    ::std::sync::OnceLock::new();
                *ID.get_or_init($crate::core::class::ClassId::next)
            }

            /// The registered class, built on first use
            pub fn class() -> &'static ::std::sync::Arc<$crate::core::class::ObjectClass> {
                static CLASS: ::std::sync::OnceLock<
                    ::std::sync::Arc<$crate::core::class::ObjectClass>,
                > = ::std::sync::OnceLock::new();
                CLASS.get_or_init(|| {
                    $crate::core::class::ObjectClass::builder(stringify!($name))
                        .with_id(Self::class_id())
                        $( $( .extends($parent::class()) )+ )?
                        $( .field(stringify!($field), $accessor) )*
                        .build()
                        .unwrap_or_else(|e| {
                            panic!("invalid declaration of class {}: {}", stringify!($name), e)
                        })
                })
            }

            /// Construct an instance from named field values
            #[allow(dead_code)]
            pub fn new<K, V>(
                fields: impl IntoIterator<Item = (K, V)>,
            ) -> ::std::result::Result<
                $crate::core::object::ValidatedObject,
                $crate::core::error::AttributeError,
            >
            where
                K: Into<String>,
                V: Into<$crate::core::field::FieldValue>,
            {
                $crate::core::object::ValidatedObject::new(Self::class(), fields)
            }

            /// Construct an instance using only defaults
            #[allow(dead_code)]
            pub fn from_defaults() -> ::std::result::Result<
                $crate::core::object::ValidatedObject,
                $crate::core::error::AttributeError,
            > {
                $crate::core::object::ValidatedObject::from_defaults(Self::class())
            }

            /// Field type accepting instances of this class and its subclasses
            ///
            /// Safe to use inside the class's own field declarations.
            #[allow(dead_code)]
            pub fn instance_type() -> $crate::core::field::FieldType {
                $crate::core::field::FieldType::Instance($crate::core::class::ClassRef::new(
                    Self::class_id(),
                    stringify!($name),
                ))
            }
        }
    };
}

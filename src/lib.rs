//! # Accessor
//!
//! Declarative, validated attribute sets for dynamic objects.
//!
//! A class declares a fixed set of named attributes, each managed by an
//! [`Accessor`](core::accessor::Accessor) holding a type, an optional default
//! and an optional validity predicate. Instances of the class can only ever
//! hold those attributes, and every assignment (construction included) is
//! checked against the type and the predicate.
//!
//! ## Features
//!
//! - **Closed world**: setting or reading an undeclared attribute fails
//! - **Owner-aware rules**: types, defaults and predicates can depend on the
//!   instance being mutated
//! - **Inheritance**: attribute sets are merged over the whole ancestor chain,
//!   multiple parents included
//! - **Configuration-Based**: classes can also be declared in YAML
//! - **Memoization helper**: an independent function-result cache
//!
//! ## Quick Start
//!
//! ```rust
//! use accessor::prelude::*;
//!
//! validated_class! {
//!     pub struct Person {
//!         name: Accessor::new(FieldType::String),
//!         age: Accessor::new(FieldType::Integer)
//!             .with_default(0)
//!             .with_predicate(|_, v| v.as_integer().is_some_and(|a| a >= 0)),
//!         spouse: Accessor::resolved(|_| Person::instance_type()).with_predicate(
//!             |owner, v| {
//!                 let adult = |o: &ValidatedObject| {
//!                     matches!(o.get("age"), Ok(FieldValue::Integer(a)) if a >= 18)
//!                 };
//!                 v.as_object()
//!                     .is_some_and(|other| !ValidatedObject::ptr_eq(owner, other) && adult(owner) && adult(other))
//!             },
//!         ),
//!     }
//! }
//!
//! let bob = Person::new([("name", "bob")]).unwrap();
//! bob.set("age", 26).unwrap();
//! let ann = Person::new(vec![("name", FieldValue::from("ann")), ("age", FieldValue::from(21))]).unwrap();
//! bob.set("spouse", &ann).unwrap();
//!
//! assert!(bob.set("name", 3).is_err());      // wrong type
//! assert!(bob.set("hair", "brown").is_err()); // no accessor
//! ```

pub mod classes;
pub mod config;
pub mod core;

#[cfg(feature = "cache")]
pub mod cache;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        accessor::{Accessor, DefaultSpec, Predicate, TypeSpec},
        class::{ClassId, ClassRef, ObjectClass, ObjectClassBuilder},
        field::{FieldFormat, FieldType, FieldValue},
        object::ValidatedObject,
        registry::ClassRegistry,
        validators,
    };

    // === Errors ===
    pub use crate::core::error::{AttributeError, ConfigError, Error, RegistrationError};

    // === Macros ===
    pub use crate::validated_class;

    // === Config ===
    pub use crate::config::{ClassConfig, FieldConfig, RulesConfig, SchemaConfig, TypeConfig};

    // === Cache ===
    #[cfg(feature = "cache")]
    pub use crate::cache::{Caching, Memoized, simple_caching};

    // === External dependencies ===
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}

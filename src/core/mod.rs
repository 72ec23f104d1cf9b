//! Core module containing accessors, classes and validated objects

pub mod accessor;
pub mod class;
pub mod error;
pub mod field;
pub mod object;
pub mod registry;
pub mod validators;

pub use accessor::{Accessor, DefaultSpec, Predicate, TypeSpec};
pub use class::{ClassId, ClassRef, ObjectClass, ObjectClassBuilder};
pub use error::{AttributeError, ConfigError, Error, RegistrationError};
pub use field::{FieldFormat, FieldType, FieldValue};
pub use object::ValidatedObject;
pub use registry::ClassRegistry;

//! Declarative class definitions
//!
//! The [`validated_class!`](crate::validated_class) macro declares a class once
//! per process, the way a class body is evaluated once.

pub mod macros;

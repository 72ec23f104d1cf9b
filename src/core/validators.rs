//! Reusable validity predicates
//!
//! Each factory returns a shared [`Predicate`] usable with
//! [`Accessor::with_validator`](crate::core::accessor::Accessor::with_validator).
//! A predicate only judges the value kinds it is about and lets the others
//! through; the accessor's type check owns those.

use crate::core::accessor::Predicate;
use crate::core::field::{FieldFormat, FieldValue};
use crate::core::object::ValidatedObject;
use regex::Regex;
use std::sync::Arc;

/// Validator: number must be strictly positive
pub fn positive() -> Predicate {
    Arc::new(|_: &ValidatedObject, value: &FieldValue| {
        value.as_number().is_none_or(|n| n > 0.0)
    })
}

/// Validator: number must be at least `min`
pub fn min_value(min: f64) -> Predicate {
    Arc::new(move |_: &ValidatedObject, value: &FieldValue| {
        value.as_number().is_none_or(|n| n >= min)
    })
}

/// Validator: number must not exceed `max`
pub fn max_value(max: f64) -> Predicate {
    Arc::new(move |_: &ValidatedObject, value: &FieldValue| {
        value.as_number().is_none_or(|n| n <= max)
    })
}

/// Validator: string length (in characters) must be within `min..=max`
pub fn string_length(min: usize, max: usize) -> Predicate {
    Arc::new(move |_: &ValidatedObject, value: &FieldValue| {
        value.as_string().is_none_or(|s| {
            let len = s.chars().count();
            len >= min && len <= max
        })
    })
}

/// Validator: string or list must not be empty
pub fn not_empty() -> Predicate {
    Arc::new(|_: &ValidatedObject, value: &FieldValue| match value {
        FieldValue::String(s) => !s.is_empty(),
        FieldValue::List(items) => !items.is_empty(),
        _ => true,
    })
}

/// Validator: string must be one of the allowed values
pub fn in_list(allowed: Vec<String>) -> Predicate {
    Arc::new(move |_: &ValidatedObject, value: &FieldValue| {
        value.as_string().is_none_or(|s| allowed.iter().any(|a| a == s))
    })
}

/// Validator: string must parse as a date in the given `chrono` format
pub fn date_format(format: impl Into<String>) -> Predicate {
    let format = format.into();
    Arc::new(move |_: &ValidatedObject, value: &FieldValue| {
        value
            .as_string()
            .is_none_or(|s| chrono::NaiveDate::parse_from_str(s, &format).is_ok())
    })
}

/// Validator: string must match a [`FieldFormat`]
pub fn format(format: FieldFormat) -> Predicate {
    Arc::new(move |_: &ValidatedObject, value: &FieldValue| {
        value.as_string().is_none() || format.validate(value)
    })
}

/// Validator: string must match a regular expression
pub fn pattern(regex: &str) -> Result<Predicate, regex::Error> {
    Ok(format(FieldFormat::Custom(Regex::new(regex)?)))
}

/// Validator: an object value must not be the owner itself
pub fn not_owner() -> Predicate {
    Arc::new(|owner: &ValidatedObject, value: &FieldValue| {
        value
            .as_object()
            .is_none_or(|o| !ValidatedObject::ptr_eq(owner, o))
    })
}

/// Validator: every predicate must accept the value
pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
    Arc::new(move |owner: &ValidatedObject, value: &FieldValue| {
        predicates.iter().all(|p| p(owner, value))
    })
}

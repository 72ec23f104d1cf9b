//! Field value types, declared field types and string formats

use crate::core::class::ClassRef;
use crate::core::object::{ObjectId, ValidatedObject};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
///
/// `Null` and `NoDefault` are the two placeholders an accessor stores without
/// validation. `NoDefault` is the sentinel meaning "intentionally never
/// initialized" and is distinct from `Null`.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Null,
    NoDefault,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    List(Vec<FieldValue>),
    Object(ValidatedObject),
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the value as a boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the value as a validated object handle if possible
    pub fn as_object(&self) -> Option<&ValidatedObject> {
        match self {
            FieldValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check if the value is the no-default sentinel
    pub fn is_no_default(&self) -> bool {
        matches!(self, FieldValue::NoDefault)
    }

    /// Values that bypass type and predicate checks on assignment
    pub fn is_placeholder(&self) -> bool {
        self.is_null() || self.is_no_default()
    }

    /// Short name of the runtime kind, used in type mismatch messages
    pub fn kind(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::NoDefault => "no-default".to_string(),
            FieldValue::String(_) => "string".to_string(),
            FieldValue::Integer(_) => "integer".to_string(),
            FieldValue::Float(_) => "float".to_string(),
            FieldValue::Boolean(_) => "boolean".to_string(),
            FieldValue::Uuid(_) => "uuid".to_string(),
            FieldValue::DateTime(_) => "datetime".to_string(),
            FieldValue::List(_) => "list".to_string(),
            FieldValue::Object(o) => o.class_name().to_string(),
        }
    }

    /// Convert a JSON value (as parsed from configuration) into a field value
    ///
    /// JSON objects have no field value counterpart and are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(FieldValue::Null),
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(FieldValue::Integer(i)),
                None => n
                    .as_f64()
                    .map(FieldValue::Float)
                    .ok_or_else(|| format!("number {} is out of range", n)),
            },
            Value::String(s) => Ok(FieldValue::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(FieldValue::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            Value::Object(_) => Err("maps cannot be used as field values".to_string()),
        }
    }

    pub(crate) fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, seen: &mut Vec<ObjectId>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::NoDefault => write!(f, "<no default>"),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Uuid(u) => write!(f, "{}", u),
            FieldValue::DateTime(d) => write!(f, "{}", d.to_rfc3339()),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f, seen)?;
                }
                write!(f, "]")
            }
            FieldValue::Object(o) => o.fmt_nested(f, seen),
        }
    }
}

/// Objects compare by identity; every other variant compares by value
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::NoDefault, FieldValue::NoDefault) => true,
            (FieldValue::String(a), FieldValue::String(b)) => a == b,
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a == b,
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a == b,
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a == b,
            (FieldValue::List(a), FieldValue::List(b)) => a == b,
            (FieldValue::Object(a), FieldValue::Object(b)) => ValidatedObject::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, &mut Vec::new())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

impl From<ValidatedObject> for FieldValue {
    fn from(value: ValidatedObject) -> Self {
        FieldValue::Object(value)
    }
}

impl From<&ValidatedObject> for FieldValue {
    fn from(value: &ValidatedObject) -> Self {
        FieldValue::Object(value.clone())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// The declared type of an accessor-managed attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Accepts every value
    Any,
    String,
    Integer,
    Float,
    /// Integer or float
    Number,
    Boolean,
    Uuid,
    DateTime,
    List,
    /// Objects whose class is the referenced class or one of its subclasses
    ///
    /// Classes match by identity; a different class with the same name is
    /// not an instance.
    Instance(ClassRef),
    /// Accepts a value matching any of the listed types
    OneOf(Vec<FieldType>),
}

impl FieldType {
    /// Check whether a value is an instance of this type
    pub fn matches(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldType::Any, _) => true,
            (FieldType::String, FieldValue::String(_)) => true,
            (FieldType::Integer, FieldValue::Integer(_)) => true,
            (FieldType::Float, FieldValue::Float(_)) => true,
            (FieldType::Number, FieldValue::Integer(_) | FieldValue::Float(_)) => true,
            (FieldType::Boolean, FieldValue::Boolean(_)) => true,
            (FieldType::Uuid, FieldValue::Uuid(_)) => true,
            (FieldType::DateTime, FieldValue::DateTime(_)) => true,
            (FieldType::List, FieldValue::List(_)) => true,
            (FieldType::Instance(class), FieldValue::Object(o)) => {
                o.class().is_subclass_of(class.id())
            }
            (FieldType::OneOf(types), v) => types.iter().any(|t| t.matches(v)),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Any => write!(f, "any"),
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Float => write!(f, "float"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Uuid => write!(f, "uuid"),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::List => write!(f, "list"),
            FieldType::Instance(class) => write!(f, "{}", class.name()),
            FieldType::OneOf(types) => {
                let names: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                write!(f, "one of ({})", names.join(", "))
            }
        }
    }
}

/// Field format validators for string attributes
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Uuid,
    Url,
    Phone,
    Custom(Regex),
}

impl FieldFormat {
    /// Validate a field value against this format
    pub fn validate(&self, value: &FieldValue) -> bool {
        let string_value = match value.as_string() {
            Some(s) => s,
            None => return false,
        };

        match self {
            FieldFormat::Email => Self::is_valid_email(string_value),
            FieldFormat::Uuid => Uuid::parse_str(string_value).is_ok(),
            FieldFormat::Url => Self::is_valid_url(string_value),
            FieldFormat::Phone => Self::is_valid_phone(string_value),
            FieldFormat::Custom(regex) => regex.is_match(string_value),
        }
    }

    fn is_valid_email(email: &str) -> bool {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .expect("email pattern is a valid regex")
        });
        regex.is_match(email)
    }

    fn is_valid_url(url: &str) -> bool {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = URL_REGEX.get_or_init(|| {
            Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url pattern is a valid regex")
        });
        regex.is_match(url)
    }

    fn is_valid_phone(phone: &str) -> bool {
        static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PHONE_REGEX.get_or_init(|| {
            // At least 8 digits, max 15 (E.164 standard)
            Regex::new(r"^\+?[1-9]\d{7,14}$").expect("phone pattern is a valid regex")
        });
        regex.is_match(phone)
    }
}

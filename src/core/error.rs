//! Typed error handling for validated objects
//!
//! Every failure is local and synchronous: the operation that raised it is
//! aborted and nothing is retried or recovered internally.
//!
//! # Error Categories
//!
//! - [`AttributeError`]: get/set/construct failures on a validated instance
//! - [`RegistrationError`]: failures while defining a class
//! - [`ConfigError`]: failures while loading class declarations from YAML
//!
//! # Example
//!
//! ```rust,ignore
//! use accessor::prelude::*;
//!
//! match person.set("age", -1) {
//!     Ok(()) => {}
//!     Err(AttributeError::Validation { attribute, class }) => {
//!         eprintln!("{class}.{attribute} rejected");
//!     }
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! ```

use thiserror::Error;

/// The main error type for the crate
///
/// Wraps each category so callers that accept input from several places
/// (configuration, construction) can use a single `Result` type.
#[derive(Debug, Error)]
pub enum Error {
    /// Attribute access or assignment errors
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Class definition errors
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Attribute(e) => e.error_code(),
            Error::Registration(e) => e.error_code(),
            Error::Config(e) => e.error_code(),
        }
    }
}

// =============================================================================
// Attribute Errors
// =============================================================================

/// Errors raised by accessors and validated instances
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// The value is not an instance of the (possibly resolved) declared type
    #[error("incorrect type for '{attribute}' in '{class}': expected {expected}, got {found}")]
    TypeMismatch {
        attribute: String,
        class: String,
        expected: String,
        found: String,
    },

    /// The value has the right type but the predicate rejected it
    #[error("invalid value for '{attribute}' in '{class}'")]
    Validation { attribute: String, class: String },

    /// The name is outside the class's registered name set
    #[error("attribute '{attribute}' in '{class}' cannot be set; it has no accessor")]
    UnknownAttribute { attribute: String, class: String },

    /// The attribute is registered but was never assigned and has no default
    #[error("'{class}' object has no attribute '{attribute}'")]
    UnsetAttribute { attribute: String, class: String },
}

impl AttributeError {
    /// Name of the attribute the error is about
    pub fn attribute(&self) -> &str {
        match self {
            AttributeError::TypeMismatch { attribute, .. }
            | AttributeError::Validation { attribute, .. }
            | AttributeError::UnknownAttribute { attribute, .. }
            | AttributeError::UnsetAttribute { attribute, .. } => attribute,
        }
    }

    /// Name of the owning class
    pub fn class(&self) -> &str {
        match self {
            AttributeError::TypeMismatch { class, .. }
            | AttributeError::Validation { class, .. }
            | AttributeError::UnknownAttribute { class, .. }
            | AttributeError::UnsetAttribute { class, .. } => class,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AttributeError::TypeMismatch { .. } => "TYPE_MISMATCH",
            AttributeError::Validation { .. } => "VALIDATION_ERROR",
            AttributeError::UnknownAttribute { .. } => "UNKNOWN_ATTRIBUTE",
            AttributeError::UnsetAttribute { .. } => "UNSET_ATTRIBUTE",
        }
    }

    pub(crate) fn unknown(attribute: &str, class: &str) -> Self {
        AttributeError::UnknownAttribute {
            attribute: attribute.to_string(),
            class: class.to_string(),
        }
    }

    pub(crate) fn unset(attribute: &str, class: &str) -> Self {
        AttributeError::UnsetAttribute {
            attribute: attribute.to_string(),
            class: class.to_string(),
        }
    }
}

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while a class is being defined
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The same field name appears twice in one class body
    #[error("field '{field}' is declared twice in '{class}'")]
    DuplicateField { class: String, field: String },

    /// An accessor instance was already bound under another name
    #[error("accessor bound as '{bound}' cannot also be declared as '{field}' in '{class}'")]
    AccessorAlreadyBound {
        class: String,
        field: String,
        bound: String,
    },

    /// The same parent is listed twice
    #[error("duplicate base class '{parent}' in '{class}'")]
    DuplicateParent { class: String, parent: String },

    /// Parents cannot be linearized into a consistent resolution order
    #[error("cannot create a consistent resolution order for '{class}' (bases: {bases})")]
    InconsistentHierarchy { class: String, bases: String },

    /// A class with this name is already in the registry
    #[error("class '{class}' is already registered")]
    DuplicateClass { class: String },

    /// A referenced class is not in the registry
    #[error("unknown class '{class}'")]
    UnknownClass { class: String },
}

impl RegistrationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistrationError::DuplicateField { .. } => "DUPLICATE_FIELD",
            RegistrationError::AccessorAlreadyBound { .. } => "ACCESSOR_ALREADY_BOUND",
            RegistrationError::DuplicateParent { .. } => "DUPLICATE_PARENT",
            RegistrationError::InconsistentHierarchy { .. } => "INCONSISTENT_HIERARCHY",
            RegistrationError::DuplicateClass { .. } => "DUPLICATE_CLASS",
            RegistrationError::UnknownClass { .. } => "UNKNOWN_CLASS",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration parsing
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML could not be parsed
    #[error("failed to parse class configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field default could not be represented as a field value
    #[error("unsupported default for '{class}.{field}': {message}")]
    InvalidDefault {
        class: String,
        field: String,
        message: String,
    },

    /// A rule could not be turned into a predicate
    #[error("invalid rule for '{class}.{field}': {message}")]
    InvalidRule {
        class: String,
        field: String,
        message: String,
    },

    /// Declaring the classes failed
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidDefault { .. } => "CONFIG_INVALID_DEFAULT",
            ConfigError::InvalidRule { .. } => "CONFIG_INVALID_RULE",
            ConfigError::Registration(e) => e.error_code(),
        }
    }
}

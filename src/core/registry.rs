//! Registry of named classes
//!
//! Used when classes are declared from configuration, where parents and
//! instance types refer to other classes by name.

use crate::core::class::ObjectClass;
use crate::core::error::{Error, RegistrationError};
use crate::core::field::FieldValue;
use crate::core::object::ValidatedObject;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry for all validated classes of an application
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, Arc<ObjectClass>>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            classes: IndexMap::new(),
        }
    }

    /// Register a class under its name
    ///
    /// Names are unique: a second class with the same name is rejected.
    pub fn register(&mut self, class: Arc<ObjectClass>) -> Result<(), RegistrationError> {
        if self.classes.contains_key(class.name()) {
            return Err(RegistrationError::DuplicateClass {
                class: class.name().to_string(),
            });
        }
        tracing::debug!(class = %class.name(), "class added to registry");
        self.classes.insert(class.name().to_string(), class);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ObjectClass>> {
        self.classes.get(name)
    }

    /// Look up a class, failing with [`RegistrationError::UnknownClass`]
    pub fn require(&self, name: &str) -> Result<&Arc<ObjectClass>, RegistrationError> {
        self.get(name).ok_or_else(|| RegistrationError::UnknownClass {
            class: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Get all registered class names, in registration order
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Construct an instance of a registered class
    pub fn construct<K, V>(
        &self,
        class_name: &str,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Result<ValidatedObject, Error>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let class = self.require(class_name)?;
        Ok(ValidatedObject::new(class, fields)?)
    }
}

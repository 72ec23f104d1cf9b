//! Per-attribute accessors
//!
//! An [`Accessor`] is declared once per attribute on a class and shared by every
//! instance of that class and its subclasses. It holds no per-instance state:
//! values live in each instance's private storage, and the accessor only
//! validates and routes them.
//!
//! ```rust,ignore
//! let age = Accessor::new(FieldType::Integer)
//!     .with_default(0)
//!     .with_predicate(|_, v| v.as_integer().is_some_and(|a| a >= 0));
//! ```

use crate::core::error::AttributeError;
use crate::core::field::{FieldType, FieldValue};
use crate::core::object::ValidatedObject;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Resolves the effective type of an attribute from the owning instance
pub type TypeResolver = Arc<dyn Fn(&ValidatedObject) -> FieldType + Send + Sync>;

/// Resolves the default value of an attribute from the owning instance
pub type DefaultResolver = Arc<dyn Fn(&ValidatedObject) -> FieldValue + Send + Sync>;

/// Validity predicate: receives the instance being mutated and the candidate value
pub type Predicate = Arc<dyn Fn(&ValidatedObject, &FieldValue) -> bool + Send + Sync>;

/// Declared type of an accessor: fixed, or resolved against the owner on every access
#[derive(Clone)]
pub enum TypeSpec {
    Fixed(FieldType),
    Resolver(TypeResolver),
}

impl TypeSpec {
    pub fn resolver(f: impl Fn(&ValidatedObject) -> FieldType + Send + Sync + 'static) -> Self {
        TypeSpec::Resolver(Arc::new(f))
    }

    /// Resolve the effective type; resolvers are called fresh every time
    pub fn resolve(&self, owner: &ValidatedObject) -> FieldType {
        match self {
            TypeSpec::Fixed(t) => t.clone(),
            TypeSpec::Resolver(f) => f(owner),
        }
    }
}

impl From<FieldType> for TypeSpec {
    fn from(value: FieldType) -> Self {
        TypeSpec::Fixed(value)
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Fixed(t) => f.debug_tuple("Fixed").field(t).finish(),
            TypeSpec::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Default value of an accessor
#[derive(Clone, Default)]
pub enum DefaultSpec {
    /// Leave the attribute unset when construction does not provide it
    #[default]
    NoDefault,
    Fixed(FieldValue),
    Resolver(DefaultResolver),
}

impl DefaultSpec {
    pub fn resolver(f: impl Fn(&ValidatedObject) -> FieldValue + Send + Sync + 'static) -> Self {
        DefaultSpec::Resolver(Arc::new(f))
    }
}

impl fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSpec::NoDefault => f.write_str("NoDefault"),
            DefaultSpec::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            DefaultSpec::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Descriptor validating the type and value of one attribute
///
/// The name is assigned exactly once, when the declaring class is built.
pub struct Accessor {
    type_spec: TypeSpec,
    default_spec: DefaultSpec,
    predicate: Option<Predicate>,
    name: OnceLock<String>,
}

impl Accessor {
    /// Create an accessor with a type and neither default nor predicate
    pub fn new(type_spec: impl Into<TypeSpec>) -> Self {
        Self {
            type_spec: type_spec.into(),
            default_spec: DefaultSpec::NoDefault,
            predicate: None,
            name: OnceLock::new(),
        }
    }

    /// Create an accessor whose type is resolved against the owner
    ///
    /// Useful for attributes typed as instances of a class that is still
    /// being defined.
    pub fn resolved(f: impl Fn(&ValidatedObject) -> FieldType + Send + Sync + 'static) -> Self {
        Self::new(TypeSpec::resolver(f))
    }

    /// Set a fixed default; the sentinel `FieldValue::NoDefault` means no default
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        self.default_spec = if value.is_no_default() {
            DefaultSpec::NoDefault
        } else {
            DefaultSpec::Fixed(value)
        };
        self
    }

    /// Set a default computed from the owner at construction time
    pub fn with_default_fn(
        mut self,
        f: impl Fn(&ValidatedObject) -> FieldValue + Send + Sync + 'static,
    ) -> Self {
        self.default_spec = DefaultSpec::resolver(f);
        self
    }

    pub fn with_default_spec(mut self, spec: DefaultSpec) -> Self {
        self.default_spec = spec;
        self
    }

    pub fn with_predicate(
        mut self,
        f: impl Fn(&ValidatedObject, &FieldValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(f));
        self
    }

    /// Use an already shared predicate, e.g. one from [`crate::core::validators`]
    pub fn with_validator(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Attribute name, empty until the declaring class is built
    pub fn name(&self) -> &str {
        self.bound_name().unwrap_or("")
    }

    pub(crate) fn bound_name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    pub fn is_bound(&self) -> bool {
        self.name.get().is_some()
    }

    pub fn type_spec(&self) -> &TypeSpec {
        &self.type_spec
    }

    pub fn default_spec(&self) -> &DefaultSpec {
        &self.default_spec
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default_spec, DefaultSpec::NoDefault)
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// Assign the attribute name, once
    ///
    /// Binding again under the same name is a no-op; under another name the
    /// existing name is returned as the error.
    pub(crate) fn bind(&self, name: &str) -> Result<(), String> {
        let bound = self.name.get_or_init(|| name.to_string());
        if bound == name {
            Ok(())
        } else {
            Err(bound.clone())
        }
    }

    /// Resolve the effective type for this owner
    pub fn resolve_type(&self, owner: &ValidatedObject) -> FieldType {
        self.type_spec.resolve(owner)
    }

    /// Resolve the default for this owner, `None` when there is no default
    pub fn resolve_default(&self, owner: &ValidatedObject) -> Option<FieldValue> {
        match &self.default_spec {
            DefaultSpec::NoDefault => None,
            DefaultSpec::Fixed(v) => Some(v.clone()),
            DefaultSpec::Resolver(f) => Some(f(owner)),
        }
    }

    /// Read the stored value from the owner's storage
    pub fn get(&self, owner: &ValidatedObject) -> Result<FieldValue, AttributeError> {
        self.ensure_registered(owner)?;
        owner
            .stored(self.name())
            .ok_or_else(|| AttributeError::unset(self.name(), owner.class_name()))
    }

    /// Validate a value and store it in the owner's storage
    ///
    /// On failure the previously stored value is left untouched.
    pub fn set(
        &self,
        owner: &ValidatedObject,
        value: impl Into<FieldValue>,
    ) -> Result<(), AttributeError> {
        self.ensure_registered(owner)?;
        let value = self.validate(owner, value.into())?;
        owner.store(self.name(), value);
        Ok(())
    }

    /// Check a candidate value without storing it
    ///
    /// `Null` and `NoDefault` are returned unchanged without any check.
    pub fn validate(
        &self,
        owner: &ValidatedObject,
        value: FieldValue,
    ) -> Result<FieldValue, AttributeError> {
        if value.is_placeholder() {
            return Ok(value);
        }

        let expected = self.resolve_type(owner);
        if !expected.matches(&value) {
            return Err(AttributeError::TypeMismatch {
                attribute: self.name().to_string(),
                class: owner.class_name().to_string(),
                expected: expected.to_string(),
                found: value.kind(),
            });
        }

        if let Some(predicate) = &self.predicate {
            if !predicate(owner, &value) {
                return Err(AttributeError::Validation {
                    attribute: self.name().to_string(),
                    class: owner.class_name().to_string(),
                });
            }
        }

        Ok(value)
    }

    /// Initialize the attribute from its default, if it has one
    ///
    /// Defaults go through the same validation as explicit assignments.
    pub fn apply_default(&self, owner: &ValidatedObject) -> Result<(), AttributeError> {
        match self.resolve_default(owner) {
            Some(value) => self.set(owner, value),
            None => Ok(()),
        }
    }

    /// The owner's class must resolve this name to this very accessor
    fn ensure_registered(&self, owner: &ValidatedObject) -> Result<(), AttributeError> {
        let resolved = owner.class().accessor(self.name());
        if resolved.is_some_and(|accessor| std::ptr::eq(accessor.as_ref(), self)) {
            Ok(())
        } else {
            Err(AttributeError::unknown(self.name(), owner.class_name()))
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name.get())
            .field("type_spec", &self.type_spec)
            .field("default_spec", &self.default_spec)
            .field("predicate", &self.predicate.as_ref().map(|_| ".."))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::class::ObjectClass;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn person_class() -> Arc<ObjectClass> {
        ObjectClass::builder("Person")
            .field("name", Accessor::new(FieldType::String))
            .field(
                "age",
                Accessor::new(FieldType::Integer)
                    .with_default(0)
                    .with_predicate(|_, v| v.as_integer().is_some_and(|a| a >= 0)),
            )
            .build()
            .expect("valid class")
    }

    #[test]
    fn test_bind_is_write_once() {
        let accessor = Accessor::new(FieldType::String);
        assert!(!accessor.is_bound());
        assert_eq!(accessor.name(), "");

        assert!(accessor.bind("name").is_ok());
        assert!(accessor.bind("name").is_ok());
        assert_eq!(accessor.bind("title"), Err("name".to_string()));
        assert_eq!(accessor.name(), "name");
    }

    #[test]
    fn test_validate_placeholders_bypass_checks() {
        let class = person_class();
        let person = ValidatedObject::new(&class, [("name", "bob")]).unwrap();
        let age = class.accessor("age").unwrap();

        assert_eq!(age.validate(&person, FieldValue::Null), Ok(FieldValue::Null));
        assert_eq!(
            age.validate(&person, FieldValue::NoDefault),
            Ok(FieldValue::NoDefault)
        );
    }

    #[test]
    fn test_validate_type_then_predicate() {
        let class = person_class();
        let person = ValidatedObject::new(&class, [("name", "bob")]).unwrap();
        let age = class.accessor("age").unwrap();

        let err = age.validate(&person, FieldValue::from("old")).unwrap_err();
        assert!(matches!(err, AttributeError::TypeMismatch { .. }));
        assert_eq!(err.attribute(), "age");
        assert_eq!(err.class(), "Person");

        let err = age.validate(&person, FieldValue::Integer(-3)).unwrap_err();
        assert!(matches!(err, AttributeError::Validation { .. }));

        assert_eq!(
            age.validate(&person, FieldValue::Integer(3)),
            Ok(FieldValue::Integer(3))
        );
    }

    #[test]
    fn test_get_unset_fails() {
        let class = person_class();
        let person = ValidatedObject::from_defaults(&class).unwrap();
        let name = class.accessor("name").unwrap();

        assert_eq!(
            name.get(&person),
            Err(AttributeError::unset("name", "Person"))
        );
    }

    #[test]
    fn test_resolvers_are_called_on_every_access() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let class = ObjectClass::builder("Counter")
            .field(
                "value",
                Accessor::resolved(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    FieldType::Integer
                }),
            )
            .build()
            .unwrap();

        let obj = ValidatedObject::new(&class, [("value", 1)]).unwrap();
        obj.set("value", 2).unwrap();
        obj.set("value", 3).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_default_resolver_sees_owner() {
        let class = ObjectClass::builder("Labelled")
            .field("name", Accessor::new(FieldType::String))
            .field(
                "label",
                Accessor::new(FieldType::String).with_default_fn(|owner| {
                    match owner.get("name") {
                        Ok(FieldValue::String(name)) => FieldValue::String(name.to_uppercase()),
                        _ => FieldValue::from("anonymous"),
                    }
                }),
            )
            .build()
            .unwrap();

        let obj = ValidatedObject::new(&class, [("name", "ann")]).unwrap();
        assert_eq!(obj.get("label").unwrap(), FieldValue::from("ANN"));
    }

    #[test]
    fn test_with_default_sentinel_means_no_default() {
        let accessor = Accessor::new(FieldType::Integer).with_default(FieldValue::NoDefault);
        assert!(!accessor.has_default());

        let accessor = Accessor::new(FieldType::Integer).with_default(FieldValue::Null);
        assert!(accessor.has_default());
    }

    #[test]
    fn test_accessor_rejects_foreign_owner() {
        let class = person_class();
        let other = ObjectClass::builder("Other").build().unwrap();
        let obj = ValidatedObject::from_defaults(&other).unwrap();

        let name = class.accessor("name").unwrap();
        assert!(matches!(
            name.set(&obj, "x"),
            Err(AttributeError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_accessor_rejects_owner_with_same_name_elsewhere() {
        let class = person_class();
        let lenient = ObjectClass::builder("Lenient")
            .field("age", Accessor::new(FieldType::Any))
            .build()
            .unwrap();
        let obj = ValidatedObject::from_defaults(&lenient).unwrap();

        let age = class.accessor("age").unwrap();
        assert_eq!(
            age.set(&obj, 3),
            Err(AttributeError::unknown("age", "Lenient"))
        );
        assert!(age.get(&obj).is_err());
        assert!(!obj.is_set("age"));

        obj.set("age", "any value").unwrap();
    }

    #[test]
    fn test_overridden_accessor_rejects_subclass_owner() {
        let base = person_class();
        let strict = ObjectClass::builder("Strict")
            .extends(&base)
            .field(
                "age",
                Accessor::new(FieldType::Integer)
                    .with_predicate(|_, v| v.as_integer().is_some_and(|a| a >= 18)),
            )
            .build()
            .unwrap();
        let obj = ValidatedObject::new(&strict, [("age", 20)]).unwrap();

        let base_age = base.accessor("age").unwrap();
        assert!(base_age.set(&obj, 5).is_err());
        assert_eq!(obj.get("age").unwrap(), FieldValue::Integer(20));
        assert!(base.accessor("name").unwrap().set(&obj, "ann").is_ok());
    }
}

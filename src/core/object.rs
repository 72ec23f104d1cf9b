//! Validated object instances
//!
//! A [`ValidatedObject`] only ever holds attributes from its class's
//! registered name set, and every stored value went through the attribute's
//! accessor. Handles are cheap to clone and share the same instance.
//!
//! Storage sits behind a lock so handles can be shared safely, but no lock is
//! held while resolvers or predicates run, and compound read-then-write
//! sequences are not atomic. Callers that mutate one instance from several
//! threads must synchronize externally.

use crate::core::class::ObjectClass;
use crate::core::error::AttributeError;
use crate::core::field::FieldValue;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Identity of an instance, used to detect cycles when formatting
pub(crate) type ObjectId = usize;

/// An instance of a registered [`ObjectClass`]
#[derive(Clone)]
pub struct ValidatedObject {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    class: Arc<ObjectClass>,
    storage: RwLock<HashMap<String, FieldValue>>,
}

impl ValidatedObject {
    /// Construct an instance from named field values
    ///
    /// Every registered name is initialized in registered-name order
    /// (declaration order, most-derived class first): from `fields` when
    /// provided, otherwise from the accessor's default. A predicate that reads
    /// a sibling attribute therefore sees it initialized only if that sibling
    /// comes earlier in this order.
    ///
    /// Any input that does not match a registered name fails the whole
    /// construction with [`AttributeError::UnknownAttribute`], naming the
    /// first such input in the order given.
    pub fn new<K, V>(
        class: &Arc<ObjectClass>,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, AttributeError>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut fields: IndexMap<String, FieldValue> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let object = Self {
            inner: Arc::new(ObjectInner {
                class: class.clone(),
                storage: RwLock::new(HashMap::with_capacity(class.attribute_count())),
            }),
        };

        for (name, accessor) in class.accessors() {
            match fields.shift_remove(name) {
                Some(value) => accessor.set(&object, value)?,
                None => accessor.apply_default(&object)?,
            }
        }

        if let Some(name) = fields.keys().next() {
            return Err(AttributeError::unknown(name, class.name()));
        }

        Ok(object)
    }

    /// Construct an instance without explicit inputs; only defaults apply
    pub fn from_defaults(class: &Arc<ObjectClass>) -> Result<Self, AttributeError> {
        Self::new(class, std::iter::empty::<(String, FieldValue)>())
    }

    pub fn class(&self) -> &Arc<ObjectClass> {
        &self.inner.class
    }

    pub fn class_name(&self) -> &str {
        self.inner.class.name()
    }

    /// Whether this instance's class is `class` or one of its subclasses
    pub fn is_instance_of(&self, class: &ObjectClass) -> bool {
        self.inner.class.is_subclass_of(class.id())
    }

    /// Read an attribute
    pub fn get(&self, name: &str) -> Result<FieldValue, AttributeError> {
        self.inner
            .class
            .accessor(name)
            .ok_or_else(|| AttributeError::unknown(name, self.class_name()))?
            .get(self)
    }

    /// Assign an attribute through its accessor
    ///
    /// Names outside the registered set are rejected; nothing is ever created.
    pub fn set(&self, name: &str, value: impl Into<FieldValue>) -> Result<(), AttributeError> {
        self.inner
            .class
            .accessor(name)
            .ok_or_else(|| AttributeError::unknown(name, self.class_name()))?
            .set(self, value)
    }

    /// Whether the attribute holds a value (placeholders included)
    pub fn is_set(&self, name: &str) -> bool {
        self.read_storage().contains_key(name)
    }

    /// Set attributes in registered-name order
    pub fn snapshot(&self) -> IndexMap<String, FieldValue> {
        let storage = self.read_storage();
        self.inner
            .class
            .names()
            .filter_map(|name| storage.get(name).map(|v| (name.to_string(), v.clone())))
            .collect()
    }

    /// Whether two handles refer to the same instance
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn stored(&self, name: &str) -> Option<FieldValue> {
        self.read_storage().get(name).cloned()
    }

    pub(crate) fn store(&self, name: &str, value: FieldValue) {
        self.write_storage().insert(name.to_string(), value);
    }

    pub(crate) fn id(&self) -> ObjectId {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub(crate) fn fmt_nested(
        &self,
        f: &mut fmt::Formatter<'_>,
        seen: &mut Vec<ObjectId>,
    ) -> fmt::Result {
        let id = self.id();
        if seen.contains(&id) {
            return write!(f, "{}(...)", self.class_name());
        }
        seen.push(id);

        write!(f, "{}(", self.class_name())?;
        for (i, name) in self.inner.class.names().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: ", name)?;
            match self.stored(name) {
                Some(value) => value.fmt_nested(f, seen)?,
                None => write!(f, "<unset>")?,
            }
        }
        write!(f, ")")?;

        seen.pop();
        Ok(())
    }

    fn read_storage(&self) -> RwLockReadGuard<'_, HashMap<String, FieldValue>> {
        self.inner
            .storage
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_storage(&self) -> RwLockWriteGuard<'_, HashMap<String, FieldValue>> {
        self.inner
            .storage
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for ValidatedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, &mut Vec::new())
    }
}

impl fmt::Debug for ValidatedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, &mut Vec::new())
    }
}

/// Value equality: same class and equal stored attributes
impl PartialEq for ValidatedObject {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        Arc::ptr_eq(&self.inner.class, &other.inner.class)
            && *self.read_storage() == *other.read_storage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::accessor::Accessor;
    use crate::core::field::FieldType;

    fn point_class() -> Arc<ObjectClass> {
        ObjectClass::builder("Point")
            .field("x", Accessor::new(FieldType::Integer).with_default(0))
            .field("y", Accessor::new(FieldType::Integer).with_default(0))
            .field("label", Accessor::new(FieldType::String))
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_applies_defaults_and_inputs() {
        let class = point_class();
        let p = ValidatedObject::new(&class, [("x", 3)]).unwrap();

        assert_eq!(p.get("x").unwrap(), FieldValue::Integer(3));
        assert_eq!(p.get("y").unwrap(), FieldValue::Integer(0));
        assert!(!p.is_set("label"));
        assert!(matches!(
            p.get("label"),
            Err(AttributeError::UnsetAttribute { .. })
        ));
    }

    #[test]
    fn test_new_rejects_first_unconsumed_input() {
        let class = point_class();
        let err = ValidatedObject::new(
            &class,
            vec![
                ("x", FieldValue::Integer(1)),
                ("z", FieldValue::Integer(2)),
                ("w", FieldValue::Integer(3)),
            ],
        )
        .unwrap_err();

        assert_eq!(err, AttributeError::unknown("z", "Point"));
    }

    #[test]
    fn test_get_unknown_name() {
        let class = point_class();
        let p = ValidatedObject::from_defaults(&class).unwrap();
        assert_eq!(p.get("z"), Err(AttributeError::unknown("z", "Point")));
    }

    #[test]
    fn test_failed_set_keeps_previous_value() {
        let class = point_class();
        let p = ValidatedObject::new(&class, [("x", 5)]).unwrap();

        assert!(p.set("x", "five").is_err());
        assert_eq!(p.get("x").unwrap(), FieldValue::Integer(5));
    }

    #[test]
    fn test_clone_shares_instance() {
        let class = point_class();
        let p = ValidatedObject::from_defaults(&class).unwrap();
        let q = p.clone();

        q.set("x", 9).unwrap();
        assert_eq!(p.get("x").unwrap(), FieldValue::Integer(9));
        assert!(ValidatedObject::ptr_eq(&p, &q));
    }

    #[test]
    fn test_value_equality_and_identity() {
        let class = point_class();
        let a = ValidatedObject::new(&class, [("x", 1)]).unwrap();
        let b = ValidatedObject::new(&class, [("x", 1)]).unwrap();

        assert_eq!(a, b);
        assert!(!ValidatedObject::ptr_eq(&a, &b));
        assert_ne!(FieldValue::from(&a), FieldValue::from(&b));

        b.set("y", 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_lists_all_names() {
        let class = point_class();
        let p = ValidatedObject::new(&class, [("x", 1)]).unwrap();
        assert_eq!(p.to_string(), "Point(x: 1, y: 0, label: <unset>)");
    }

    #[test]
    fn test_display_is_cycle_safe() {
        let builder = ObjectClass::builder("Node");
        let node_type = builder.instance_type();
        let class = builder
            .field("next", Accessor::new(node_type))
            .build()
            .unwrap();
        let a = ValidatedObject::from_defaults(&class).unwrap();
        let b = ValidatedObject::new(&class, [("next", &a)]).unwrap();
        a.set("next", &b).unwrap();

        assert_eq!(a.to_string(), "Node(next: Node(next: Node(...)))");
    }

    #[test]
    fn test_same_named_class_is_not_an_instance() {
        let builder = ObjectClass::builder("Node");
        let node_type = builder.instance_type();
        let node = builder
            .field("next", Accessor::new(node_type))
            .build()
            .unwrap();
        let lookalike = ObjectClass::builder("Node")
            .field("payload", Accessor::new(FieldType::Any))
            .build()
            .unwrap();

        let a = ValidatedObject::from_defaults(&node).unwrap();
        let b = ValidatedObject::from_defaults(&node).unwrap();
        let other = ValidatedObject::from_defaults(&lookalike).unwrap();

        let err = a.set("next", &other).unwrap_err();
        assert!(matches!(
            err,
            AttributeError::TypeMismatch { ref expected, ref found, .. }
                if expected == "Node" && found == "Node"
        ));
        assert!(!a.is_set("next"));
        assert!(!other.is_instance_of(&node));
        a.set("next", &b).unwrap();
    }

    #[test]
    fn test_snapshot_in_registered_order() {
        let class = point_class();
        let p = ValidatedObject::new(&class, [("label", "origin")]).unwrap();
        let snapshot = p.snapshot();

        assert_eq!(
            snapshot.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["x", "y", "label"]
        );
    }

    #[test]
    fn test_placeholders_stored_without_validation() {
        let class = point_class();
        let p = ValidatedObject::new(&class, [("x", FieldValue::Null)]).unwrap();
        assert_eq!(p.get("x").unwrap(), FieldValue::Null);

        p.set("label", FieldValue::NoDefault).unwrap();
        assert!(p.is_set("label"));
        assert_eq!(p.get("label").unwrap(), FieldValue::NoDefault);
    }
}

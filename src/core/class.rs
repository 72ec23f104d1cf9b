//! Class definitions and accessor registration
//!
//! A class is registered once, through [`ObjectClassBuilder::build`], before any
//! instance of it exists. Registration:
//!
//! 1. binds every accessor declared directly on the class to its field name,
//! 2. linearizes the parents into a method resolution order (C3, most-derived
//!    first, the class itself included),
//! 3. aggregates the registered name set over that order, resolving each name
//!    to the accessor of the nearest declaring class.
//!
//! The result is immutable.

use crate::core::accessor::Accessor;
use crate::core::error::{AttributeError, RegistrationError};
use crate::core::field::{FieldType, FieldValue};
use crate::core::object::ValidatedObject;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a class, unique within the process
///
/// Two classes sharing a name are still different classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u64);

impl ClassId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ClassId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A class referenced by identity, with its name kept for messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRef {
    id: ClassId,
    name: String,
}

impl ClassRef {
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A registered class of validated objects
pub struct ObjectClass {
    id: ClassId,
    name: String,
    parents: Vec<Arc<ObjectClass>>,
    own: IndexMap<String, Arc<Accessor>>,
    ancestors: Vec<Arc<ObjectClass>>,
    accessors: IndexMap<String, Arc<Accessor>>,
}

impl ObjectClass {
    /// Process-unique identity of this class
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Start declaring a class
    pub fn builder(name: impl Into<String>) -> ObjectClassBuilder {
        ObjectClassBuilder {
            id: ClassId::next(),
            name: name.into(),
            parents: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct parents, in declaration order
    pub fn parents(&self) -> &[Arc<ObjectClass>] {
        &self.parents
    }

    /// The registered name set, in resolution order
    ///
    /// Most-derived class first, each class contributing its own fields in
    /// declaration order. Names declared by several classes appear once.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.accessors.keys().map(String::as_str)
    }

    /// Names declared directly on this class
    pub fn own_names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.own.keys().map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    pub fn attribute_count(&self) -> usize {
        self.accessors.len()
    }

    /// The accessor instances use for `name`: the nearest declaration in the MRO
    pub fn accessor(&self, name: &str) -> Option<&Arc<Accessor>> {
        self.accessors.get(name)
    }

    pub(crate) fn accessors(&self) -> impl Iterator<Item = (&str, &Arc<Accessor>)> {
        self.accessors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Method resolution order, starting with this class
    pub fn mro(&self) -> Vec<&ObjectClass> {
        std::iter::once(self)
            .chain(self.ancestors.iter().map(|c| c.as_ref()))
            .collect()
    }

    pub fn mro_names(&self) -> Vec<&str> {
        self.mro().into_iter().map(|c| c.name()).collect()
    }

    /// Whether this class is the class `id` or derives from it
    pub fn is_subclass_of(&self, id: ClassId) -> bool {
        self.id == id || self.ancestors.iter().any(|c| c.id == id)
    }

    pub fn class_ref(&self) -> ClassRef {
        ClassRef::new(self.id, self.name.clone())
    }

    /// Field type accepting instances of this class and its subclasses
    pub fn instance_type(&self) -> FieldType {
        FieldType::Instance(self.class_ref())
    }

    /// Construct an instance of this class
    pub fn instantiate<K, V>(
        self: &Arc<Self>,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Result<ValidatedObject, AttributeError>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        ValidatedObject::new(self, fields)
    }

    /// Linearization of this class: itself followed by its ancestors
    fn linearization(self: &Arc<Self>) -> VecDeque<Arc<ObjectClass>> {
        std::iter::once(self.clone())
            .chain(self.ancestors.iter().cloned())
            .collect()
    }
}

impl fmt::Debug for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectClass")
            .field("name", &self.name)
            .field("mro", &self.mro_names())
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Declares a class: its parents and the accessors of its own body
pub struct ObjectClassBuilder {
    id: ClassId,
    name: String,
    parents: Vec<Arc<ObjectClass>>,
    fields: Vec<(String, Arc<Accessor>)>,
}

impl ObjectClassBuilder {
    /// Build under a pre-allocated identity
    ///
    /// Lets instance types of the class be named before it exists. The id
    /// must come from [`ClassId::next`] and serve a single class.
    pub fn with_id(mut self, id: ClassId) -> Self {
        self.id = id;
        self
    }

    /// Field type accepting instances of the class being declared
    pub fn instance_type(&self) -> FieldType {
        FieldType::Instance(ClassRef::new(self.id, self.name.clone()))
    }

    /// Add a parent class; parents are searched in the order they are added
    pub fn extends(mut self, parent: &Arc<ObjectClass>) -> Self {
        self.parents.push(parent.clone());
        self
    }

    /// Declare an accessor-managed field on this class
    pub fn field(mut self, name: impl Into<String>, accessor: impl Into<Arc<Accessor>>) -> Self {
        self.fields.push((name.into(), accessor.into()));
        self
    }

    /// Register the class
    pub fn build(self) -> Result<Arc<ObjectClass>, RegistrationError> {
        let ObjectClassBuilder {
            id,
            name,
            parents,
            fields,
        } = self;

        for (i, parent) in parents.iter().enumerate() {
            if parents[..i].iter().any(|p| Arc::ptr_eq(p, parent)) {
                return Err(RegistrationError::DuplicateParent {
                    class: name,
                    parent: parent.name.clone(),
                });
            }
        }

        let mut own: IndexMap<String, Arc<Accessor>> = IndexMap::with_capacity(fields.len());
        for (field, accessor) in fields {
            if own.contains_key(&field) {
                return Err(RegistrationError::DuplicateField { class: name, field });
            }
            own.insert(field, accessor);
        }

        let ancestors = c3_merge(&name, &parents)?;

        // Nothing is bound unless every accessor can take its field name
        for (i, (field, accessor)) in own.iter().enumerate() {
            let bound = accessor.bound_name().or_else(|| {
                own.iter()
                    .take(i)
                    .find(|(_, earlier)| Arc::ptr_eq(*earlier, accessor))
                    .map(|(earlier, _)| earlier.as_str())
            });
            if let Some(bound) = bound.filter(|b| *b != field.as_str()) {
                return Err(RegistrationError::AccessorAlreadyBound {
                    class: name,
                    field: field.clone(),
                    bound: bound.to_string(),
                });
            }
        }

        for (field, accessor) in &own {
            accessor
                .bind(field)
                .map_err(|bound| RegistrationError::AccessorAlreadyBound {
                    class: name.clone(),
                    field: field.clone(),
                    bound,
                })?;
        }

        let mut accessors = own.clone();
        for ancestor in &ancestors {
            for (field, accessor) in &ancestor.own {
                accessors
                    .entry(field.clone())
                    .or_insert_with(|| accessor.clone());
            }
        }

        let class = ObjectClass {
            id,
            name,
            parents,
            own,
            ancestors,
            accessors,
        };

        tracing::debug!(
            class = %class.name,
            fields = class.accessors.len(),
            mro = ?class.mro_names(),
            "registered validated class"
        );

        Ok(Arc::new(class))
    }
}

/// C3 merge of the parents' linearizations and the parent list itself
fn c3_merge(
    name: &str,
    parents: &[Arc<ObjectClass>],
) -> Result<Vec<Arc<ObjectClass>>, RegistrationError> {
    let mut sequences: Vec<VecDeque<Arc<ObjectClass>>> =
        parents.iter().map(|p| p.linearization()).collect();
    sequences.push(parents.iter().cloned().collect());

    let mut merged = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Ok(merged);
        }

        // A head is acceptable when it does not appear in the tail of any sequence
        let head = sequences
            .iter()
            .map(|s| &s[0])
            .find(|candidate| {
                !sequences
                    .iter()
                    .any(|s| s.iter().skip(1).any(|c| Arc::ptr_eq(c, candidate)))
            })
            .cloned();

        let Some(head) = head else {
            return Err(RegistrationError::InconsistentHierarchy {
                class: name.to_string(),
                bases: parents
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        };

        for sequence in &mut sequences {
            if Arc::ptr_eq(&sequence[0], &head) {
                sequence.pop_front();
            }
        }
        merged.push(head);
    }
}

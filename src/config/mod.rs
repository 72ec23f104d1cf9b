//! Configuration loading: declaring classes from YAML
//!
//! ```yaml
//! classes:
//!   - name: Person
//!     fields:
//!       - name: name
//!         type: string
//!       - name: age
//!         type: integer
//!         default: 0
//!         rules:
//!           min: 0
//!       - name: spouse
//!         type: { instance: Person }
//!         rules:
//!           not_owner: true
//! ```

use crate::core::accessor::{Accessor, Predicate};
use crate::core::class::ObjectClass;
use crate::core::error::{ConfigError, RegistrationError};
use crate::core::field::{FieldFormat, FieldType, FieldValue};
use crate::core::registry::ClassRegistry;
use crate::core::validators;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Complete configuration: a list of class declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Classes, in declaration order (parents before children)
    #[serde(default)]
    pub classes: Vec<ClassConfig>,
}

/// Declaration of one class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassConfig {
    pub name: String,

    /// Parent class names, searched in this order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,

    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// Declaration of one accessor-managed field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,

    #[serde(rename = "type", default)]
    pub field_type: TypeConfig,

    /// Absent means no default; an explicit `null` is a `null` default
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<serde_json::Value>,

    #[serde(default)]
    pub rules: RulesConfig,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Scalar field types, written as plain names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    #[default]
    Any,
    String,
    Integer,
    Float,
    Number,
    Boolean,
    Uuid,
    Datetime,
    List,
}

/// Declared field type
///
/// Either a scalar name (`string`), `{ instance: ClassName }` or
/// `{ one_of: [string, integer] }`. An instance type names the class being
/// declared or a class registered before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeConfig {
    Scalar(ScalarType),
    Instance { instance: String },
    OneOf { one_of: Vec<TypeConfig> },
}

impl Default for TypeConfig {
    fn default() -> Self {
        TypeConfig::Scalar(ScalarType::Any)
    }
}

impl TypeConfig {
    /// Build the field type, resolving class names through `lookup`
    pub fn to_field_type<F>(&self, lookup: &F) -> std::result::Result<FieldType, RegistrationError>
    where
        F: Fn(&str) -> Option<FieldType>,
    {
        Ok(match self {
            TypeConfig::Scalar(scalar) => match scalar {
                ScalarType::Any => FieldType::Any,
                ScalarType::String => FieldType::String,
                ScalarType::Integer => FieldType::Integer,
                ScalarType::Float => FieldType::Float,
                ScalarType::Number => FieldType::Number,
                ScalarType::Boolean => FieldType::Boolean,
                ScalarType::Uuid => FieldType::Uuid,
                ScalarType::Datetime => FieldType::DateTime,
                ScalarType::List => FieldType::List,
            },
            TypeConfig::Instance { instance } => {
                lookup(instance).ok_or_else(|| RegistrationError::UnknownClass {
                    class: instance.clone(),
                })?
            }
            TypeConfig::OneOf { one_of } => FieldType::OneOf(
                one_of
                    .iter()
                    .map(|t| t.to_field_type(lookup))
                    .collect::<std::result::Result<_, _>>()?,
            ),
        })
    }
}

/// Named string formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatName {
    Email,
    Uuid,
    Url,
    Phone,
}

impl From<FormatName> for FieldFormat {
    fn from(value: FormatName) -> Self {
        match value {
            FormatName::Email => FieldFormat::Email,
            FormatName::Uuid => FieldFormat::Uuid,
            FormatName::Url => FieldFormat::Url,
            FormatName::Phone => FieldFormat::Phone,
        }
    }
}

/// Inclusive string length bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LengthConfig {
    #[serde(default)]
    pub min: usize,
    #[serde(default = "unbounded")]
    pub max: usize,
}

fn unbounded() -> usize {
    usize::MAX
}

/// Value rules of a field; every rule given must hold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub positive: bool,
    #[serde(default)]
    pub not_empty: bool,
    /// An object value must not be the instance it is assigned on
    #[serde(default)]
    pub not_owner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl RulesConfig {
    /// Build the predicates for these rules, in a fixed order
    pub fn predicates(&self) -> std::result::Result<Vec<Predicate>, String> {
        let mut predicates = Vec::new();

        if let Some(min) = self.min {
            predicates.push(validators::min_value(min));
        }
        if let Some(max) = self.max {
            predicates.push(validators::max_value(max));
        }
        if self.positive {
            predicates.push(validators::positive());
        }
        if self.not_empty {
            predicates.push(validators::not_empty());
        }
        if self.not_owner {
            predicates.push(validators::not_owner());
        }
        if let Some(length) = &self.length {
            if length.min > length.max {
                return Err(format!(
                    "length min {} is greater than max {}",
                    length.min, length.max
                ));
            }
            predicates.push(validators::string_length(length.min, length.max));
        }
        if let Some(allowed) = &self.one_of {
            predicates.push(validators::in_list(allowed.clone()));
        }
        if let Some(format) = &self.date_format {
            predicates.push(validators::date_format(format.clone()));
        }
        if let Some(format) = self.format {
            predicates.push(validators::format(format.into()));
        }
        if let Some(pattern) = &self.pattern {
            predicates.push(validators::pattern(pattern).map_err(|e| e.to_string())?);
        }

        Ok(predicates)
    }
}

impl FieldConfig {
    /// Build the accessor declared by this field
    pub fn to_accessor<F>(&self, class: &str, lookup: &F) -> std::result::Result<Accessor, ConfigError>
    where
        F: Fn(&str) -> Option<FieldType>,
    {
        let mut accessor = Accessor::new(self.field_type.to_field_type(lookup)?);

        if let Some(default) = &self.default {
            let value = FieldValue::from_json(default).map_err(|message| {
                ConfigError::InvalidDefault {
                    class: class.to_string(),
                    field: self.name.clone(),
                    message,
                }
            })?;
            accessor = accessor.with_default(value);
        }

        let mut predicates = self
            .rules
            .predicates()
            .map_err(|message| ConfigError::InvalidRule {
                class: class.to_string(),
                field: self.name.clone(),
                message,
            })?;
        accessor = match predicates.len() {
            0 => accessor,
            1 => accessor.with_validator(predicates.remove(0)),
            _ => accessor.with_validator(validators::all_of(predicates)),
        };

        Ok(accessor)
    }
}

impl SchemaConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read class configuration {}", path.display()))?;
        let config = Self::from_yaml_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        tracing::debug!(classes = config.classes.len(), "loaded class configuration");
        Ok(config)
    }

    /// Merge several configurations
    ///
    /// Classes keep the position of their first appearance; when several
    /// documents declare the same class name, the last declaration wins.
    pub fn merge(configs: Vec<SchemaConfig>) -> Self {
        let mut classes: IndexMap<String, ClassConfig> = IndexMap::new();
        for config in configs {
            for class in config.classes {
                classes.insert(class.name.clone(), class);
            }
        }
        Self {
            classes: classes.into_values().collect(),
        }
    }

    /// Find a class declaration by name
    pub fn find_class(&self, name: &str) -> Option<&ClassConfig> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Register every declared class into an existing registry
    ///
    /// Classes are built in declaration order, so parents and instance types
    /// (registered here or earlier) must come before the classes using them.
    pub fn register_into(&self, registry: &mut ClassRegistry) -> std::result::Result<(), ConfigError> {
        for class_config in &self.classes {
            let mut builder = ObjectClass::builder(class_config.name.clone());
            let own_type = builder.instance_type();
            let lookup = |name: &str| {
                if name == class_config.name {
                    Some(own_type.clone())
                } else {
                    registry.get(name).map(|class| class.instance_type())
                }
            };

            for parent in &class_config.extends {
                builder = builder.extends(registry.require(parent)?);
            }
            for field in &class_config.fields {
                let accessor = field.to_accessor(&class_config.name, &lookup)?;
                builder = builder.field(field.name.clone(), accessor);
            }
            registry.register(builder.build()?)?;
        }
        Ok(())
    }

    /// Build a fresh registry holding every declared class
    pub fn build_registry(&self) -> std::result::Result<ClassRegistry, ConfigError> {
        let mut registry = ClassRegistry::new();
        self.register_into(&mut registry)?;
        Ok(registry)
    }
}

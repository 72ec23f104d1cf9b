//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Each failure surfaces with the right category and code
//! - Errors name the attribute and the class involved
//! - Error conversions work correctly
//! - Error matching allows callers to handle specific cases

use accessor::prelude::*;

fn point_class() -> std::sync::Arc<ObjectClass> {
    ObjectClass::builder("Point")
        .field("x", Accessor::new(FieldType::Integer).with_default(0))
        .field(
            "y",
            Accessor::new(FieldType::Integer).with_validator(validators::positive()),
        )
        .build()
        .unwrap()
}

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_attribute_error_codes() {
        let point = ValidatedObject::from_defaults(&point_class()).unwrap();

        assert_eq!(
            point.set("x", "one").unwrap_err().error_code(),
            "TYPE_MISMATCH"
        );
        assert_eq!(
            point.set("y", 0).unwrap_err().error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            point.set("z", 1).unwrap_err().error_code(),
            "UNKNOWN_ATTRIBUTE"
        );
        assert_eq!(point.get("y").unwrap_err().error_code(), "UNSET_ATTRIBUTE");
    }

    #[test]
    fn test_registration_error_codes() {
        let shared = std::sync::Arc::new(Accessor::new(FieldType::Any));
        let err = ObjectClass::builder("Twice")
            .field("a", shared.clone())
            .field("b", shared)
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "ACCESSOR_ALREADY_BOUND");

        let err = ObjectClass::builder("Dup")
            .field("a", Accessor::new(FieldType::Any))
            .field("a", Accessor::new(FieldType::Any))
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_FIELD");
    }

    #[test]
    fn test_wrapped_error_keeps_code() {
        let registry = ClassRegistry::new();
        let err = registry.construct("Ghost", [("x", 1)]).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CLASS");

        let mut registry = ClassRegistry::new();
        registry.register(point_class()).unwrap();
        let err = registry.construct("Point", [("y", -2)]).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}

// =============================================================================
// Error Message Tests
// =============================================================================

mod error_message_tests {
    use super::*;

    #[test]
    fn test_messages_name_attribute_and_class() {
        let point = ValidatedObject::from_defaults(&point_class()).unwrap();
        let err = point.set("y", -3).unwrap_err();

        assert_eq!(err.attribute(), "y");
        assert_eq!(err.class(), "Point");
        let message = err.to_string();
        assert!(message.contains("'y'"));
        assert!(message.contains("'Point'"));
    }

    #[test]
    fn test_type_mismatch_names_both_kinds() {
        let point = ValidatedObject::from_defaults(&point_class()).unwrap();
        match point.set("x", true).unwrap_err() {
            AttributeError::TypeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "integer");
                assert_eq!(found, "boolean");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

// =============================================================================
// Conversion Tests
// =============================================================================

mod conversion_tests {
    use super::*;

    fn construct(fields: Vec<(&str, FieldValue)>) -> Result<ValidatedObject, Error> {
        let class = point_class();
        let point = ValidatedObject::new(&class, fields)?;
        Ok(point)
    }

    #[test]
    fn test_attribute_error_converts() {
        let err = construct(vec![("y", FieldValue::from(0))]).unwrap_err();
        assert!(matches!(
            err,
            Error::Attribute(AttributeError::Validation { .. })
        ));
    }

    #[test]
    fn test_registration_error_converts() {
        let err: Error = RegistrationError::UnknownClass {
            class: "Ghost".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Registration(_)));
        assert_eq!(err.to_string(), "unknown class 'Ghost'");
    }

    #[test]
    fn test_config_error_converts() {
        let parse = SchemaConfig::from_yaml_str("classes: 3").unwrap_err();
        let err: Error = parse.into();
        assert_eq!(err.error_code(), "CONFIG_PARSE_ERROR");
    }
}

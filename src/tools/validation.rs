//! Validate tool call arguments against a parameter schema before execution.

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{ParameterKind, ParameterSchema};

/// First violation found while validating arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingRequired(String),

    #[error("Parameter \"{name}\" must be {}", article(.expected))]
    TypeMismatch {
        name: String,
        expected: ParameterKind,
    },
}

fn article(kind: &ParameterKind) -> String {
    match kind {
        ParameterKind::Array | ParameterKind::Object => format!("an {kind}"),
        _ => format!("a {kind}"),
    }
}

/// Validate arguments against a schema.
///
/// Checks the top level only: every required name is present, and every
/// argument that is also a declared property has the declared kind.
/// Undeclared arguments pass through.
pub fn validate_arguments(
    args: &Map<String, Value>,
    schema: &ParameterSchema,
) -> Result<(), ValidationError> {
    let ParameterSchema::Object {
        properties,
        required,
        ..
    } = schema
    else {
        return Ok(());
    };

    if let Some(missing) = required.iter().find(|name| !args.contains_key(name.as_str())) {
        return Err(ValidationError::MissingRequired(missing.clone()));
    }

    for (name, value) in args {
        if let Some(property) = properties.get(name) {
            let expected = property.kind();
            if !expected.matches(value) {
                return Err(ValidationError::TypeMismatch {
                    name: name.clone(),
                    expected,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    fn path_schema() -> ParameterSchema {
        ParameterSchema::object()
            .string("path", "File path", true)
            .build()
    }

    #[test]
    fn rejects_missing_required_field() {
        let result = validate_arguments(&args(json!({})), &path_schema());

        assert_eq!(
            result,
            Err(ValidationError::MissingRequired("path".into()))
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "Missing required parameter: path"
        );
    }

    #[test]
    fn rejects_when_any_required_field_is_absent() {
        let schema = ParameterSchema::object()
            .string("path", "File path", true)
            .string("content", "Body", true)
            .build();

        let result = validate_arguments(&args(json!({"path": "test.txt"})), &schema);

        assert_eq!(
            result,
            Err(ValidationError::MissingRequired("content".into()))
        );
    }

    #[test]
    fn rejects_number_where_string_expected() {
        let result = validate_arguments(&args(json!({"path": 42})), &path_schema());

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Parameter \"path\" must be a string");
    }

    #[test]
    fn object_rejects_arrays_and_null() {
        let schema = ParameterSchema::object()
            .property("opts", ParameterSchema::empty(), false)
            .build();

        for bad in [json!([]), Value::Null] {
            let err = validate_arguments(&args(json!({"opts": bad})), &schema).unwrap_err();
            assert_eq!(err.to_string(), "Parameter \"opts\" must be an object");
        }
        assert!(validate_arguments(&args(json!({"opts": {}})), &schema).is_ok());
    }

    #[test]
    fn array_kind_accepts_only_arrays() {
        let schema = ParameterSchema::object()
            .array("items", "List", ParameterSchema::number("n"), false)
            .build();

        assert!(validate_arguments(&args(json!({"items": [1, 2]})), &schema).is_ok());
        let err = validate_arguments(&args(json!({"items": {"0": 1}})), &schema).unwrap_err();
        assert_eq!(err.to_string(), "Parameter \"items\" must be an array");
    }

    #[test]
    fn accepts_extra_fields_not_in_schema_properties() {
        let result = validate_arguments(
            &args(json!({"path": "test.txt", "extra": true})),
            &path_schema(),
        );

        assert!(result.is_ok());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let schema = ParameterSchema::object()
            .boolean("verbose", "Chatty output", false)
            .build();

        assert!(validate_arguments(&args(json!({})), &schema).is_ok());
    }

    #[test]
    fn non_object_schema_accepts_anything() {
        let schema = ParameterSchema::string("raw");

        assert!(validate_arguments(&args(json!({"x": 1})), &schema).is_ok());
    }
}

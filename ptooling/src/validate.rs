//! Checking model-produced tool calls against the declarations the model was given.
//!
//! Declarations may use either JSON-schema type names (`"object"`) or the uppercase
//! OpenAPI names Gemini documents (`"OBJECT"`); both compile.
//!
//! ```rust
//! use ptooling::validate_arguments;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "OBJECT",
//!     "properties": {"city": {"type": "STRING"}},
//!     "required": ["city"]
//! });
//!
//! assert!(validate_arguments(r#"{"city":"Oslo"}"#, &schema).is_ok());
//! assert!(validate_arguments(r#"{"city":7}"#, &schema).is_err());
//! ```

use pprovider::{ToolCall, ToolDeclaration};
use serde_json::Value;

use crate::{ToolError, parse_arguments};

/// Resolves the declaration for `call` and validates its arguments.
///
/// Returns the parsed arguments, or an error tagged with the call.
pub fn check_call(
    call: &ToolCall,
    declaration: Option<&ToolDeclaration>,
) -> Result<Value, ToolError> {
    let declaration = declaration
        .filter(|declaration| declaration.name == call.name)
        .ok_or_else(|| ToolError::undeclared(&call.name).for_call(call))?;

    validate_arguments(&call.arguments, &declaration.parameters)
        .map_err(|error| error.for_call(call))
}

/// Parses `args_json` and checks it against `schema`, returning the parsed value.
///
/// A null or empty schema accepts any JSON document.
pub fn validate_arguments(args_json: &str, schema: &Value) -> Result<Value, ToolError> {
    let arguments = parse_arguments(args_json)?;
    if schema_is_unconstrained(schema) {
        return Ok(arguments);
    }

    let schema = with_json_schema_types(schema);
    let validator = jsonschema::validator_for(&schema)
        .map_err(|err| ToolError::invalid_schema(format!("tool parameter schema is invalid: {err}")))?;

    let problems = validator
        .iter_errors(&arguments)
        .map(|error| error.to_string())
        .collect::<Vec<_>>();

    if problems.is_empty() {
        Ok(arguments)
    } else {
        Err(ToolError::invalid_arguments(problems.join("; ")))
    }
}

fn schema_is_unconstrained(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(object) => object.is_empty(),
        _ => false,
    }
}

/// Lowercases every `type` keyword value so OpenAPI-style schemas compile.
///
/// Only string (or string array) values under a `type` key are touched; a property
/// that happens to be named `type` maps to a schema object and is walked, not rewritten.
fn with_json_schema_types(schema: &Value) -> Value {
    match schema {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("type", Value::String(name)) => Value::String(name.to_ascii_lowercase()),
                        ("type", Value::Array(names)) => Value::Array(
                            names
                                .iter()
                                .map(|name| match name {
                                    Value::String(name) => Value::String(name.to_ascii_lowercase()),
                                    other => other.clone(),
                                })
                                .collect(),
                        ),
                        _ => with_json_schema_types(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(with_json_schema_types).collect()),
        other => other.clone(),
    }
}

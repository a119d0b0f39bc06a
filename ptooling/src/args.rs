//! Reading fields out of validated call arguments.
//!
//! Handlers receive arguments already parsed and checked against the declared schema,
//! so these only cover the lookups a handler still has to do by hand.
//!
//! ```rust
//! use ptooling::{optional_str, required_str};
//! use serde_json::json;
//!
//! let args = json!({"city": "Oslo"});
//! assert_eq!(required_str(&args, "city").expect("city should be present"), "Oslo");
//! assert_eq!(optional_str(&args, "unit"), None);
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

/// Parses the model's argument text; blank text is an empty object.
pub fn parse_arguments(args_json: &str) -> Result<Value, ToolError> {
    if args_json.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_str(args_json)
        .map_err(|err| ToolError::invalid_arguments(format!("arguments are not valid JSON: {err}")))
}

pub fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    optional_str(arguments, key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing string argument '{key}'")))
}

pub fn optional_str<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(Value::as_str)
}

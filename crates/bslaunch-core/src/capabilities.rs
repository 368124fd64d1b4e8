//! Capability descriptor annotation.
//!
//! A capability input is either a single JSON object or an array of JSON
//! objects. Both shapes are normalised into a list of mutable descriptors
//! before anything is written, so a malformed input is rejected without
//! partially annotating it.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Capability property that tells the remote grid to route through the tunnel.
pub const LOCAL_CAPABILITY: &str = "browserstack.local";

/// Set [`LOCAL_CAPABILITY`] to `true` on every descriptor in `capabilities`.
///
/// Returns the number of descriptors annotated.
pub fn mark_local(capabilities: Option<&mut Value>) -> Result<usize> {
    let descriptors = descriptors_mut(capabilities)?;
    let count = descriptors.len();
    for descriptor in descriptors {
        descriptor.insert(LOCAL_CAPABILITY.to_string(), Value::Bool(true));
    }
    Ok(count)
}

fn descriptors_mut(capabilities: Option<&mut Value>) -> Result<Vec<&mut Map<String, Value>>> {
    match capabilities {
        Some(Value::Object(descriptor)) => Ok(vec![descriptor]),
        Some(Value::Array(items)) => items
            .iter_mut()
            .map(|item| match item {
                Value::Object(descriptor) => Ok(descriptor),
                other => Err(Error::CapabilityShape {
                    found: kind(other),
                }),
            })
            .collect(),
        Some(other) => Err(Error::CapabilityShape {
            found: kind(other),
        }),
        None => Err(Error::CapabilityShape { found: "nothing" }),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

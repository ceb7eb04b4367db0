//! JSON schemas for structured model output.
//!
//! An [`OutputSchema<T>`] pairs the JSON Schema derived from `T` (via
//! `schemars`) with a decoder that turns model text into `T`.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::error::DecodeError;

/// The target shape of a structured response.
#[derive(Debug, Clone)]
pub struct OutputSchema<T> {
    schema: serde_json::Value,
    _target: PhantomData<fn() -> T>,
}

impl<T> OutputSchema<T>
where
    T: DeserializeOwned + JsonSchema,
{
    /// Derive the schema from `T`.
    pub fn derive() -> Self {
        let schema = schemars::schema_for!(T);
        Self {
            schema: serde_json::to_value(&schema).unwrap_or(serde_json::Value::Null),
            _target: PhantomData,
        }
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.schema
    }

    /// Pretty-printed schema, as embedded in prompts.
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.schema).unwrap_or_default()
    }

    /// Decode `text` into `T`.
    ///
    /// Whitespace and a single surrounding Markdown code fence are ignored.
    pub fn decode(&self, text: &str) -> Result<T, DecodeError> {
        let body = strip_code_fence(text);
        if body.is_empty() {
            return Err(DecodeError::new("empty response: expected a JSON object"));
        }
        serde_json::from_str(body).map_err(|e| DecodeError::new(e.to_string()))
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize, JsonSchema)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn schema_lists_fields() {
        let schema = OutputSchema::<Person>::derive();
        let text = schema.to_pretty_string();
        assert!(text.contains("\"name\""));
        assert!(text.contains("\"age\""));
        assert!(schema.as_value()["required"].is_array());
    }

    #[test]
    fn decodes_plain_json() {
        let schema = OutputSchema::<Person>::derive();
        let p = schema.decode(r#" {"name": "Ada", "age": 36} "#).unwrap();
        assert_eq!(p, Person { name: "Ada".into(), age: 36 });
    }

    #[test]
    fn decodes_fenced_json() {
        let schema = OutputSchema::<Person>::derive();
        let p = schema
            .decode("```json\n{\"name\": \"Ada\", \"age\": 36}\n```")
            .unwrap();
        assert_eq!(p.age, 36);
    }

    #[test]
    fn decode_error_carries_serde_message() {
        let schema = OutputSchema::<Person>::derive();
        let err = schema.decode(r#"{"name": "Ada"}"#).unwrap_err();
        assert!(err.message.contains("age"), "{}", err.message);
    }

    #[test]
    fn empty_input_is_a_decode_error() {
        let schema = OutputSchema::<Person>::derive();
        assert!(schema.decode("   ").is_err());
    }
}

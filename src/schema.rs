//! Structural validation of JSON request bodies.
//!
//! A [`Schema`] is declared once per endpoint as a `static` and checked against
//! the parsed body before anything touches storage. Only the first violation
//! is reported.

use serde_json::Value;

/// Declarative description of an accepted JSON document.
#[derive(Debug)]
pub enum Schema {
    Object {
        properties: &'static [(&'static str, Schema)],
        required: &'static [&'static str],
    },
    Integer,
    Number,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl Schema {
    fn type_name(&self) -> &'static str {
        match self {
            Schema::Object { .. } => "object",
            Schema::Integer => "integer",
            Schema::Number => "number",
            Schema::String => "string",
        }
    }

    fn accepts_type(&self, value: &Value) -> bool {
        match self {
            Schema::Object { .. } => value.is_object(),
            Schema::Integer => value.is_i64() || value.is_u64(),
            Schema::Number => value.is_number(),
            Schema::String => value.is_string(),
        }
    }
}

/// Validate `document` against `schema`, returning the first violated constraint.
pub fn validate(document: &Value, schema: &Schema) -> Result<(), ValidationError> {
    if !schema.accepts_type(document) {
        return Err(ValidationError::new(format!(
            "{} is not of type '{}'",
            document,
            schema.type_name()
        )));
    }

    if let (Schema::Object { properties, required }, Value::Object(map)) = (schema, document) {
        for key in required.iter() {
            if !map.contains_key(*key) {
                return Err(ValidationError::new(format!(
                    "'{}' is a required property",
                    key
                )));
            }
        }

        for (key, nested) in properties.iter() {
            if let Some(value) = map.get(*key) {
                validate(value, nested)?;
            }
        }
    }

    Ok(())
}

/// Body of `POST /api/songs`: `{"file": {"id": <integer>}}`
pub static SONG_SCHEMA: Schema = Schema::Object {
    properties: &[(
        "file",
        Schema::Object {
            properties: &[("id", Schema::Integer)],
            required: &["id"],
        },
    )],
    required: &["file"],
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_valid_song() {
        assert!(validate(&json!({"file": {"id": 7}}), &SONG_SCHEMA).is_ok());
    }

    #[test]
    fn extra_keys_are_allowed() {
        let doc = json!({"file": {"id": 1, "name": "a.mp3"}, "title": "x"});
        assert!(validate(&doc, &SONG_SCHEMA).is_ok());
    }

    #[test]
    fn missing_file() {
        let err = validate(&json!({}), &SONG_SCHEMA).unwrap_err();
        assert_eq!(err.message, "'file' is a required property");
    }

    #[test]
    fn missing_nested_id() {
        let err = validate(&json!({"file": {}}), &SONG_SCHEMA).unwrap_err();
        assert_eq!(err.message, "'id' is a required property");
    }

    #[test]
    fn wrong_types() {
        let err = validate(&json!({"file": {"id": "abc"}}), &SONG_SCHEMA).unwrap_err();
        assert_eq!(err.message, "\"abc\" is not of type 'integer'");

        let err = validate(&json!({"file": 3}), &SONG_SCHEMA).unwrap_err();
        assert_eq!(err.message, "3 is not of type 'object'");

        let err = validate(&json!([1, 2]), &SONG_SCHEMA).unwrap_err();
        assert_eq!(err.message, "[1,2] is not of type 'object'");
    }

    #[test]
    fn float_is_not_an_integer_but_is_a_number() {
        assert!(validate(&json!(1.5), &Schema::Integer).is_err());
        assert!(validate(&json!(1.5), &Schema::Number).is_ok());
    }

    #[test]
    fn first_violation_wins() {
        static SCHEMA: Schema = Schema::Object {
            properties: &[("a", Schema::String), ("b", Schema::String)],
            required: &["a", "b"],
        };
        let err = validate(&json!({"a": 1, "b": 2}), &SCHEMA).unwrap_err();
        assert_eq!(err.message, "1 is not of type 'string'");

        let err = validate(&json!({"b": "x"}), &SCHEMA).unwrap_err();
        assert_eq!(err.message, "'a' is a required property");
    }
}

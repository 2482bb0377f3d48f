//! Field-level validation of untyped JSON payloads.
//!
//! Request bodies arrive as [`serde_json::Value`]. [`Fields`] reads the
//! expected keys out of the body, checks presence and primitive type, and
//! collects every problem into a [`ValidationErrors`] map keyed by field name:
//!
//! ```json
//! {"name": ["Missing data for required field."], "price": ["Not a valid number."]}
//! ```
//!
//! Validation is all-or-nothing: a field set is only produced when every
//! field passed, so callers never apply half of a payload. Keys that are not
//! asked for are ignored.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{Price, PriceError};

/// Maximum length, in characters, of every bounded text column.
pub const MAX_TEXT_LENGTH: usize = 100;

/// Key used for errors that concern the payload as a whole.
pub const SCHEMA_KEY: &str = "_schema";

pub(crate) const MISSING: &str = "Missing data for required field.";
pub(crate) const NULL: &str = "Field may not be null.";
pub(crate) const NOT_STRING: &str = "Not a valid string.";
pub(crate) const NOT_NUMBER: &str = "Not a valid number.";
pub(crate) const NOT_INTEGER: &str = "Not a valid integer.";
pub(crate) const NOT_DATETIME: &str = "Not a valid datetime.";
pub(crate) const NEGATIVE: &str = "Must be greater than or equal to 0.";
pub(crate) const INVALID_INPUT: &str = "Invalid input type.";

/// Parse an untyped payload into a validated field set.
pub trait FromPayload: Sized {
    /// Validate `payload` and build `Self` from it.
    ///
    /// # Errors
    ///
    /// Returns every field-level problem found in the payload.
    fn from_payload(payload: &Value) -> Result<Self, ValidationErrors>;
}

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if no message has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded against `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Iterate over `(field, messages)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Reader over the keys of a JSON object payload.
///
/// Each accessor returns `None` exactly when it recorded an error, so a
/// caller that got `Some` for every field knows the payload is valid.
#[derive(Debug)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Fields<'a> {
    /// Start reading `payload`.
    ///
    /// # Errors
    ///
    /// Returns a `_schema` error if the payload is not a JSON object.
    pub fn new(payload: &'a Value) -> Result<Self, ValidationErrors> {
        let Value::Object(map) = payload else {
            let mut errors = ValidationErrors::new();
            errors.add(SCHEMA_KEY, INVALID_INPUT);
            return Err(errors);
        };
        Ok(Self {
            map,
            errors: ValidationErrors::new(),
        })
    }

    /// Returns `true` if the payload has `field`, even if it is `null`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.map.contains_key(field)
    }

    /// A required string of 1 to `max` characters.
    pub fn required_text(&mut self, field: &str, max: usize) -> Option<String> {
        let value = self.required(field)?;
        let Some(text) = value.as_str() else {
            self.errors.add(field, NOT_STRING);
            return None;
        };

        let length = text.chars().count();
        if length == 0 {
            self.errors.add(field, "Shorter than minimum length 1.");
            return None;
        }
        if length > max {
            self.errors
                .add(field, format!("Longer than maximum length {max}."));
            return None;
        }
        Some(text.to_owned())
    }

    /// A required non-negative JSON number.
    pub fn required_price(&mut self, field: &str) -> Option<Price> {
        let value = self.required(field)?;
        let Value::Number(number) = value else {
            self.errors.add(field, NOT_NUMBER);
            return None;
        };

        match Price::parse(&number.to_string()) {
            Ok(price) => Some(price),
            Err(PriceError::Negative) => {
                self.errors.add(field, NEGATIVE);
                None
            }
            Err(PriceError::NotANumber(_)) => {
                self.errors.add(field, NOT_NUMBER);
                None
            }
        }
    }

    /// A required JSON integer that fits an `i32` identifier.
    pub fn required_id<T: From<i32>>(&mut self, field: &str) -> Option<T> {
        let value = self.required(field)?;
        match value.as_i64().and_then(|n| i32::try_from(n).ok()) {
            Some(id) => Some(T::from(id)),
            None => {
                self.errors.add(field, NOT_INTEGER);
                None
            }
        }
    }

    /// A required timestamp.
    pub fn required_timestamp(&mut self, field: &str) -> Option<DateTime<Utc>> {
        let value = self.required(field)?;
        self.timestamp(field, value)
    }

    /// An optional timestamp.
    ///
    /// Returns `Some(None)` when the field is absent and `None` when it was
    /// present but invalid.
    pub fn optional_timestamp(&mut self, field: &str) -> Option<Option<DateTime<Utc>>> {
        match self.map.get(field) {
            None => Some(None),
            Some(Value::Null) => {
                self.errors.add(field, NULL);
                None
            }
            Some(value) => self.timestamp(field, value).map(Some),
        }
    }

    /// Consume the reader and return the recorded errors.
    #[must_use]
    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        match self.map.get(field) {
            None => {
                self.errors.add(field, MISSING);
                None
            }
            Some(Value::Null) => {
                self.errors.add(field, NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn timestamp(&mut self, field: &str, value: &Value) -> Option<DateTime<Utc>> {
        let parsed = value.as_str().and_then(parse_timestamp);
        if parsed.is_none() {
            self.errors.add(field, NOT_DATETIME);
        }
        parsed
    }
}

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one read as UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;
    use crate::types::UserId;

    #[test]
    fn test_non_object_payload_is_schema_error() {
        let errors = Fields::new(&json!([1, 2])).unwrap_err();
        assert_eq!(errors.get(SCHEMA_KEY), Some(&[INVALID_INPUT.to_owned()][..]));
    }

    #[test]
    fn test_required_text_messages() {
        let payload = json!({"a": null, "b": 5, "c": "", "d": "x".repeat(101), "e": "ok"});
        let mut fields = Fields::new(&payload).unwrap();

        assert!(fields.required_text("a", MAX_TEXT_LENGTH).is_none());
        assert!(fields.required_text("b", MAX_TEXT_LENGTH).is_none());
        assert!(fields.required_text("c", MAX_TEXT_LENGTH).is_none());
        assert!(fields.required_text("d", MAX_TEXT_LENGTH).is_none());
        assert!(fields.required_text("missing", MAX_TEXT_LENGTH).is_none());
        assert_eq!(
            fields.required_text("e", MAX_TEXT_LENGTH).as_deref(),
            Some("ok")
        );

        let errors = fields.into_errors();
        assert_eq!(errors.get("a").unwrap()[0], NULL);
        assert_eq!(errors.get("b").unwrap()[0], NOT_STRING);
        assert_eq!(errors.get("c").unwrap()[0], "Shorter than minimum length 1.");
        assert_eq!(errors.get("d").unwrap()[0], "Longer than maximum length 100.");
        assert_eq!(errors.get("missing").unwrap()[0], MISSING);
        assert!(errors.get("e").is_none());
    }

    #[test]
    fn test_required_text_counts_characters_not_bytes() {
        let payload = json!({"name": "é".repeat(100)});
        let mut fields = Fields::new(&payload).unwrap();
        assert!(fields.required_text("name", MAX_TEXT_LENGTH).is_some());
    }

    #[test]
    fn test_required_price() {
        let payload = json!({"ok": 9.99, "int": 3, "neg": -0.01, "text": "9.99", "tiny": 1e-29});
        let mut fields = Fields::new(&payload).unwrap();

        assert_eq!(
            fields.required_price("ok").unwrap(),
            Price::parse("9.99").unwrap()
        );
        assert_eq!(fields.required_price("int").unwrap(), Price::parse("3").unwrap());
        assert!(fields.required_price("neg").is_none());
        assert!(fields.required_price("text").is_none());
        assert_eq!(fields.required_price("tiny").unwrap(), Price::parse("0").unwrap());

        let errors = fields.into_errors();
        assert!(errors.get("tiny").is_none());
        assert_eq!(errors.get("neg").unwrap()[0], NEGATIVE);
        assert_eq!(errors.get("text").unwrap()[0], NOT_NUMBER);
    }

    #[test]
    fn test_required_id() {
        let payload = json!({"ok": 4, "float": 1.5, "big": 9_999_999_999_i64, "text": "4"});
        let mut fields = Fields::new(&payload).unwrap();

        assert_eq!(fields.required_id::<UserId>("ok"), Some(UserId::new(4)));
        assert!(fields.required_id::<UserId>("float").is_none());
        assert!(fields.required_id::<UserId>("big").is_none());
        assert!(fields.required_id::<UserId>("text").is_none());
        assert_eq!(fields.into_errors().iter().count(), 3);
    }

    #[test]
    fn test_optional_timestamp() {
        let payload = json!({
            "rfc": "2024-05-01T10:30:00+02:00",
            "naive": "2024-05-01T10:30:00",
            "bad": "yesterday",
            "null": null,
        });
        let mut fields = Fields::new(&payload).unwrap();

        let rfc = fields.optional_timestamp("rfc").unwrap().unwrap();
        assert_eq!(rfc.hour(), 8);

        let naive = fields.optional_timestamp("naive").unwrap().unwrap();
        assert_eq!((naive.year(), naive.hour()), (2024, 10));

        assert_eq!(fields.optional_timestamp("absent"), Some(None));
        assert!(fields.optional_timestamp("bad").is_none());
        assert!(fields.optional_timestamp("null").is_none());

        let errors = fields.into_errors();
        assert_eq!(errors.get("bad").unwrap()[0], NOT_DATETIME);
        assert_eq!(errors.get("null").unwrap()[0], NULL);
    }

    #[test]
    fn test_errors_display_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("name", MISSING);
        errors.add("email", NOT_STRING);
        assert_eq!(
            errors.to_string(),
            "email: Not a valid string.; name: Missing data for required field."
        );
    }

    #[test]
    fn test_errors_serialize_as_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("price", NEGATIVE);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"price": ["Must be greater than or equal to 0."]})
        );
    }
}

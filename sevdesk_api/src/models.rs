//! Shared wire types and deserializers.
//!
//! SevDesk serializes most numbers as JSON strings (`"id": "4711"`,
//! `"amount": "100.00"`), so the field deserializers here accept both
//! forms.

use serde::{Deserialize, Deserializer, Serialize};

/// Reference to another SevDesk object, `{"id": …, "objectName": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    #[serde(rename = "objectName")]
    pub object_name: String,
}

impl ObjectRef {
    pub fn new(id: u64, object_name: &str) -> Self {
        Self {
            id,
            object_name: object_name.to_string(),
        }
    }
}

/// Quantity units SevDesk ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unity {
    Piece,
    Hour,
}

impl Unity {
    pub fn id(self) -> u64 {
        match self {
            Unity::Piece => 1,
            Unity::Hour => 2,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

pub(crate) fn u64_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::<u64>::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub(crate) fn opt_u64_from_any<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString<u64>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(value)) => Ok(Some(value)),
        Some(NumberOrString::Text(text)) => parse_opt(&text),
    }
}

pub(crate) fn f64_from_any<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::<f64>::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub(crate) fn opt_f64_from_any<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString<f64>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(value)) => Ok(Some(value)),
        Some(NumberOrString::Text(text)) => parse_opt(&text),
    }
}

pub(crate) fn opt_i64_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString<i64>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(value)) => Ok(Some(value)),
        Some(NumberOrString::Text(text)) => parse_opt(&text),
    }
}

pub(crate) fn string_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

/// Empty strings stand in for null on some endpoints.
fn parse_opt<T, E>(text: &str) -> Result<Option<T>, E>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    E: serde::de::Error,
{
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(serde::de::Error::custom)
}

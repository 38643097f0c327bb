//! Typed wire values for the document store.
//!
//! The REST API represents every field as a single-key object naming the
//! value's type, e.g. `{"stringValue": "ONIX 1.0"}` or
//! `{"timestampValue": "2024-03-01T12:00:00Z"}`. Serde's externally-tagged
//! enum representation matches that encoding exactly, so [`Value`]
//! round-trips through `serde_json` without custom (de)serializers, apart
//! from `integerValue`, which the wire format carries as a decimal string.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single document field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// `{"nullValue": null}`
    #[serde(rename = "nullValue")]
    Null(Option<()>),
    /// `{"booleanValue": true}`
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    /// `{"integerValue": "42"}` - the wire format is a decimal string
    #[serde(rename = "integerValue", with = "integer_string")]
    Integer(i64),
    /// `{"doubleValue": 1.5}`
    #[serde(rename = "doubleValue")]
    Double(f64),
    /// `{"timestampValue": "2024-03-01T12:00:00Z"}` (RFC 3339)
    #[serde(rename = "timestampValue")]
    Timestamp(DateTime<Utc>),
    /// `{"stringValue": "..."}`
    #[serde(rename = "stringValue")]
    String(String),
    /// `{"arrayValue": {"values": [...]}}`
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
    /// `{"mapValue": {"fields": {...}}}`
    #[serde(rename = "mapValue")]
    Map(MapValue),
}

/// Wrapper for `arrayValue`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Element values; the API omits the key entirely for an empty array.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

/// Wrapper for `mapValue`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    /// Named fields; the API omits the key entirely for an empty map.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    /// Build a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Build a timestamp value.
    #[must_use]
    pub const fn timestamp(at: DateTime<Utc>) -> Self {
        Self::Timestamp(at)
    }

    /// Build an array value.
    #[must_use]
    pub fn array(values: Vec<Self>) -> Self {
        Self::Array(ArrayValue { values })
    }

    /// Build a map value.
    #[must_use]
    pub fn map(fields: BTreeMap<String, Self>) -> Self {
        Self::Map(MapValue { fields })
    }

    /// The contained string, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The contained timestamp, if this is a timestamp value.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(at) => Some(at),
            _ => None,
        }
    }

    /// The contained elements, if this is an array value.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(arr) => Some(&arr.values),
            _ => None,
        }
    }

    /// The contained fields, if this is a map value.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(&map.fields),
            _ => None,
        }
    }
}

/// A document: a named, timestamped bag of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, e.g.
    /// `projects/p/databases/(default)/documents/cars/h2J9x`.
    /// Absent on the request side of a create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The document's fields.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Build a request-side document from fields alone.
    #[must_use]
    pub const fn from_fields(fields: BTreeMap<String, Value>) -> Self {
        Self {
            name: None,
            fields,
            create_time: None,
            update_time: None,
        }
    }

    /// The store-assigned document id: the last segment of the resource
    /// name.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }
}

/// `integerValue` is a JSON string on the wire.
mod integer_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_string_value_wire_shape() {
        let value = Value::string("ONIX 1.0");
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({"stringValue": "ONIX 1.0"}));
    }

    #[test]
    fn test_integer_value_is_a_string_on_the_wire() {
        let value = Value::Integer(42);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({"integerValue": "42"}));

        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_timestamp_value_rfc3339() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(Value::timestamp(at)).unwrap();
        let encoded = json
            .get("timestampValue")
            .and_then(serde_json::Value::as_str)
            .unwrap();
        assert!(encoded.starts_with("2024-03-01T12:00:00"));

        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back.as_timestamp(), Some(&at));
    }

    #[test]
    fn test_array_of_maps_round_trip() {
        let mut fields = BTreeMap::new();
        fields.insert("url".to_owned(), Value::string("https://cdn/x"));
        let value = Value::array(vec![Value::map(fields)]);

        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_empty_array_deserializes_without_values_key() {
        // The API omits "values" entirely for an empty array.
        let back: Value = serde_json::from_str(r#"{"arrayValue": {}}"#).unwrap();
        assert_eq!(back.as_array(), Some(&[][..]));
    }

    #[test]
    fn test_null_value() {
        let json = serde_json::to_value(Value::Null(None)).unwrap();
        assert_eq!(json, serde_json::json!({"nullValue": null}));
    }

    #[test]
    fn test_document_id_is_last_path_segment() {
        let doc = Document {
            name: Some("projects/p/databases/(default)/documents/cars/h2J9x".to_owned()),
            fields: BTreeMap::new(),
            create_time: None,
            update_time: None,
        };
        assert_eq!(doc.id(), Some("h2J9x"));

        let unnamed = Document::from_fields(BTreeMap::new());
        assert_eq!(unnamed.id(), None);
    }
}

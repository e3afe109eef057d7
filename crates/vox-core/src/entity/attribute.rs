use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{EntityError, EntityResult};

/// A typed slot value together with its position in the NLU parse.
///
/// `nested_in` and `overlaps_with` hold the identifiers of related attributes
/// of the same request. Both default to empty, never null: a null field on
/// the wire reads as absent.
///
/// On the wire the fields are camelCase (`nestedIn`, `overlapsWith`); the
/// snake_case spellings are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeV2<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    pub value: T,
    #[serde(default, alias = "nested_in", deserialize_with = "null_as_default")]
    pub nested_in: Vec<i64>,
    #[serde(default, alias = "overlaps_with", deserialize_with = "null_as_default")]
    pub overlaps_with: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<HashMap<String, String>>,
}

fn null_as_default<'de, D, U>(deserializer: D) -> Result<U, D::Error>
where
    D: Deserializer<'de>,
    U: Deserialize<'de> + Default,
{
    Ok(Option::<U>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T> AttributeV2<T> {
    pub fn new(id: i64, value: T) -> Self {
        Self {
            id,
            value,
            nested_in: Vec::new(),
            overlaps_with: Vec::new(),
            extras: None,
        }
    }

    /// Transforms the value, keeping the identifiers and extras.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AttributeV2<U> {
        AttributeV2 {
            id: self.id,
            value: f(self.value),
            nested_in: self.nested_in,
            overlaps_with: self.overlaps_with,
            extras: self.extras,
        }
    }

    /// Fallible version of [`map`](Self::map).
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<AttributeV2<U>, E> {
        Ok(AttributeV2 {
            id: self.id,
            value: f(self.value)?,
            nested_in: self.nested_in,
            overlaps_with: self.overlaps_with,
            extras: self.extras,
        })
    }

    /// Looks up a string in the extras mapping.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.as_ref()?.get(key).map(String::as_str)
    }
}

impl AttributeV2<Value> {
    /// Builds an attribute from a raw JSON value.
    ///
    /// An object with a `value` key is read as a full attribute mapping. Any
    /// other value is wrapped as a bare attribute with id `0`.
    pub fn from_value(value: Value) -> EntityResult<Self> {
        match value {
            Value::Object(map) if map.contains_key("value") => {
                serde_json::from_value(Value::Object(map))
                    .map_err(|e| EntityError::InvalidAttribute(e.to_string()))
            }
            other => Ok(Self::new(0, other)),
        }
    }

    /// Builds an attribute and converts its value with `mapping`.
    ///
    /// A failing mapping fails the whole construction; the raw value is
    /// never kept in place of a converted one.
    pub fn parse_with<U, E>(
        value: Value,
        mapping: impl FnOnce(Value) -> Result<U, E>,
    ) -> Result<AttributeV2<U>, E>
    where
        E: From<EntityError>,
    {
        Self::from_value(value)?.try_map(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::convert::require_str;
    use serde_json::json;

    fn to_int(value: Value) -> EntityResult<i64> {
        require_str(&value)?
            .parse()
            .map_err(|e: std::num::ParseIntError| EntityError::InvalidAttribute(e.to_string()))
    }

    #[test]
    fn test_parse_with_mapping() {
        let raw = json!({"id": 1, "value": "123456", "nestedIn": [], "overlapsWith": []});
        let first = AttributeV2::<Value>::parse_with(raw.clone(), to_int).unwrap();
        let second = AttributeV2::<Value>::parse_with(raw, to_int).unwrap();

        assert_eq!(first.value, 123456);
        assert_eq!(first.id, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mapping_failure_is_surfaced() {
        let raw = json!({"id": 1, "value": "not a number"});
        let result = AttributeV2::<Value>::parse_with(raw, to_int);
        assert!(matches!(result, Err(EntityError::InvalidAttribute(_))));
    }

    #[test]
    fn test_scalar_is_wrapped() {
        let attr = AttributeV2::<Value>::from_value(json!("sunny")).unwrap();
        assert_eq!(attr, AttributeV2::new(0, json!("sunny")));
        assert!(attr.nested_in.is_empty());
        assert!(attr.overlaps_with.is_empty());
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let raw = json!({
            "id": 7,
            "value": "x",
            "nestedIn": null,
            "overlapsWith": null,
            "extras": null
        });
        let attr = AttributeV2::<Value>::from_value(raw).unwrap();
        assert_eq!(attr.id, 7);
        assert_eq!(attr.nested_in, Vec::<i64>::new());
        assert_eq!(attr.overlaps_with, Vec::<i64>::new());
        assert_eq!(attr.extras, None);
    }

    #[test]
    fn test_null_fields_on_typed_attribute() {
        let raw = json!({"id": null, "value": 12, "nested_in": null, "overlapsWith": null});
        let attr = AttributeV2::<i64>::deserialize(raw).unwrap();
        assert_eq!(attr, AttributeV2::new(0, 12));
    }

    #[test]
    fn test_snake_case_aliases_and_extras() {
        let raw = json!({
            "id": 3,
            "value": "Paris",
            "nested_in": [1],
            "overlaps_with": [2, 4],
            "extras": {"kind": "city"}
        });
        let attr = AttributeV2::<Value>::from_value(raw).unwrap();
        assert_eq!(attr.nested_in, vec![1]);
        assert_eq!(attr.overlaps_with, vec![2, 4]);
        assert_eq!(attr.extra("kind"), Some("city"));
        assert_eq!(attr.extra("missing"), None);
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let result = AttributeV2::<i64>::deserialize(json!({"id": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut attr = AttributeV2::new(2, "x".to_string());
        attr.nested_in = vec![1];
        let json = serde_json::to_value(&attr).unwrap();
        assert_eq!(
            json,
            json!({"id": 2, "value": "x", "nestedIn": [1], "overlapsWith": []})
        );
    }

    #[test]
    fn test_map_keeps_relations() {
        let mut attr = AttributeV2::new(5, "42");
        attr.overlaps_with = vec![9];
        let mapped = attr.map(str::len);
        assert_eq!(mapped.value, 2);
        assert_eq!(mapped.id, 5);
        assert_eq!(mapped.overlaps_with, vec![9]);
    }
}

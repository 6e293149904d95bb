// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Helpers shared by the entity record readers.

use honeybee_geometry::{Face3D, Face3DRecord, Mesh3D, Mesh3DRecord};
use serde_json::{Map, Value};

use crate::element::{record_full_id, ElementType, IdentityRecord};
use crate::error::{Error, Result};
use crate::properties::Properties;

pub(crate) type Record = Map<String, Value>;

/// The record as an object whose `type` is `expected`.
pub(crate) fn typed_object<'a>(record: &'a Value, expected: &str) -> Result<&'a Record> {
    let map = record
        .as_object()
        .ok_or_else(|| Error::Serialization(format!("{} record must be an object", expected)))?;
    match map.get("type").and_then(Value::as_str) {
        Some(kind) if kind == expected => Ok(map),
        Some(kind) => Err(Error::Serialization(format!(
            "expected a {} record, got {}",
            expected, kind
        ))),
        None => Err(Error::Serialization(format!(
            "{} record has no type key",
            expected
        ))),
    }
}

pub(crate) fn required<'a>(map: &'a Record, key: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| Error::Serialization(format!("missing required key \"{}\"", key)))
}

pub(crate) fn identity(map: &Record) -> Result<IdentityRecord> {
    Ok(IdentityRecord {
        identifier: required(map, "identifier")?
            .as_str()
            .ok_or_else(|| Error::Serialization("identifier must be a string".into()))?
            .to_string(),
        display_name: map
            .get("display_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        user_data: map.get("user_data").and_then(Value::as_object).cloned(),
    })
}

/// Writes the identity keys shared by every entity record.
pub(crate) fn write_identity(map: &mut Record, identity: &IdentityRecord) {
    map.insert("identifier".into(), Value::String(identity.identifier.clone()));
    if let Some(name) = &identity.display_name {
        map.insert("display_name".into(), Value::String(name.clone()));
    }
    if let Some(data) = &identity.user_data {
        map.insert("user_data".into(), Value::Object(data.clone()));
    }
}

pub(crate) fn properties(map: &Record, element_type: ElementType, abridged: bool) -> Result<Properties> {
    match map.get("properties") {
        Some(value) => Properties::from_record(value, element_type, abridged),
        None => Ok(Properties::new()),
    }
}

pub(crate) fn face3d(map: &Record) -> Result<Face3D> {
    let record: Face3DRecord = serde_json::from_value(required(map, "geometry")?.clone())?;
    Ok(Face3D::from_record(&record)?)
}

pub(crate) fn mesh3d(map: &Record) -> Result<Mesh3D> {
    let record: Mesh3DRecord = serde_json::from_value(required(map, "geometry")?.clone())?;
    Ok(Mesh3D::from_record(&record)?)
}

/// Serializes a geometry record.
pub(crate) fn to_value<T: serde::Serialize>(record: &T) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

pub(crate) fn bool_or(map: &Record, key: &str, default: bool) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Parses each element of an optional array field, wrapping failures with
/// the offending child's `display_name[identifier]`.
pub(crate) fn children<T>(
    map: &Record,
    key: &str,
    element_type: ElementType,
    parse: impl Fn(&Value) -> Result<T>,
) -> Result<Vec<T>> {
    let Some(value) = map.get(key) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| Error::Serialization(format!("\"{}\" must be an array", key)))?;
    items
        .iter()
        .map(|item| with_context(item, element_type, &parse))
        .collect()
}

pub(crate) fn with_context<T>(
    record: &Value,
    element_type: ElementType,
    parse: impl Fn(&Value) -> Result<T>,
) -> Result<T> {
    parse(record).map_err(|source| Error::InvalidRecord {
        element_type,
        full_id: record_full_id(record),
        source: Box::new(source),
    })
}

/// Inserts a non-empty array of child records.
pub(crate) fn write_children(map: &mut Record, key: &str, records: Vec<Value>) {
    if !records.is_empty() {
        map.insert(key.into(), Value::Array(records));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn serialization_failures_propagate() {
        let mut keyed_by_pairs = BTreeMap::new();
        keyed_by_pairs.insert((1, 2), 3.0);
        assert!(matches!(to_value(&keyed_by_pairs), Err(Error::Serialization(_))));
    }

    #[test]
    fn wrong_type_tag_is_rejected() {
        assert!(typed_object(&json!({"type": "Door"}), "Door").is_ok());
        assert!(typed_object(&json!({"type": "Shade"}), "Door").is_err());
        assert!(typed_object(&json!([1, 2]), "Door").is_err());
    }
}

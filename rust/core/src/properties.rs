// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extension property slots.
//!
//! Each entity owns a [`Properties`] value holding zero or more
//! [`PropertyExtension`]s keyed by name (for example `energy` or
//! `radiance`). Extensions are duplicated, transformed and serialized
//! together with their host. Hosts register constructors for their
//! extensions at startup with [`register_property_extension`]; records of
//! unregistered extensions are carried through untouched.

use std::fmt;

use honeybee_geometry::{Point3, Transform, Vector3};
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::element::ElementType;
use crate::error::{Error, Result};

/// Extension data attached to an entity.
///
/// The transform hooks receive the same operation applied to the host
/// geometry; angles are in radians. All hooks default to no-ops.
pub trait PropertyExtension: fmt::Debug + Send + Sync {
    /// Key of this extension in the properties record.
    fn name(&self) -> &str;

    /// Serializes the extension. In abridged form, related objects are
    /// referenced by identifier instead of being embedded.
    fn to_record(&self, abridged: bool) -> Value;

    /// Deep copy for a duplicated host.
    fn duplicate(&self) -> Box<dyn PropertyExtension>;

    fn translate(&mut self, _vector: &Vector3<f64>) {}

    fn rotate(&mut self, _axis: &Vector3<f64>, _angle: f64, _origin: &Point3<f64>) {}

    fn rotate_xy(&mut self, _angle: f64, _origin: &Point3<f64>) {}

    fn reflect(&mut self, _normal: &Vector3<f64>, _origin: &Point3<f64>) {}

    fn scale(&mut self, _factor: f64, _origin: &Point3<f64>) {}
}

/// Builds an extension from its record; the flag tells whether the record
/// was written in abridged form.
pub type ExtensionConstructor = fn(&Value, bool) -> Result<Box<dyn PropertyExtension>>;

static PROPERTY_EXTENSIONS: RwLock<Vec<(String, ExtensionConstructor)>> =
    parking_lot::const_rwlock(Vec::new());

/// Registers (or replaces) the constructor used to deserialize an
/// extension's records.
pub fn register_property_extension(name: &str, constructor: ExtensionConstructor) {
    let mut registry = PROPERTY_EXTENSIONS.write();
    if let Some(entry) = registry.iter_mut().find(|(n, _)| n == name) {
        entry.1 = constructor;
    } else {
        registry.push((name.to_string(), constructor));
    }
}

/// Names of the registered property extensions, in registration order.
pub fn registered_property_extensions() -> Vec<String> {
    PROPERTY_EXTENSIONS
        .read()
        .iter()
        .map(|(n, _)| n.clone())
        .collect()
}

fn property_constructor(name: &str) -> Option<ExtensionConstructor> {
    PROPERTY_EXTENSIONS
        .read()
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, c)| *c)
}

/// Record of an extension nobody registered, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct PassthroughExtension {
    name: String,
    record: Value,
}

impl PassthroughExtension {
    pub fn new(name: &str, record: Value) -> Self {
        Self {
            name: name.to_string(),
            record,
        }
    }

    pub fn record(&self) -> &Value {
        &self.record
    }
}

impl PropertyExtension for PassthroughExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_record(&self, _abridged: bool) -> Value {
        self.record.clone()
    }

    fn duplicate(&self) -> Box<dyn PropertyExtension> {
        Box::new(self.clone())
    }
}

/// The extension slot of one entity.
#[derive(Debug, Default)]
pub struct Properties {
    extensions: Vec<Box<dyn PropertyExtension>>,
}

impl Clone for Properties {
    fn clone(&self) -> Self {
        Self {
            extensions: self.extensions.iter().map(|e| e.duplicate()).collect(),
        }
    }
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(|e| e.name())
    }

    pub fn get(&self, name: &str) -> Option<&dyn PropertyExtension> {
        self.extensions
            .iter()
            .find(|e| e.name() == name)
            .map(|e| &**e)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn PropertyExtension>> {
        self.extensions.iter_mut().find(|e| e.name() == name)
    }

    /// Adds an extension, replacing any other one with the same name.
    pub fn insert(&mut self, extension: Box<dyn PropertyExtension>) {
        match self
            .extensions
            .iter()
            .position(|e| e.name() == extension.name())
        {
            Some(i) => self.extensions[i] = extension,
            None => self.extensions.push(extension),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn PropertyExtension>> {
        let i = self.extensions.iter().position(|e| e.name() == name)?;
        Some(self.extensions.remove(i))
    }

    /// Forwards a host transform to every extension hook.
    pub fn transform(&mut self, t: &Transform) {
        for ext in self.extensions.iter_mut() {
            match t {
                Transform::Translate(v) => ext.translate(v),
                Transform::Rotate {
                    axis,
                    angle,
                    origin,
                } if axis.into_inner() == Vector3::z() => ext.rotate_xy(*angle, origin),
                Transform::Rotate {
                    axis,
                    angle,
                    origin,
                } => ext.rotate(&axis.into_inner(), *angle, origin),
                Transform::Reflect { normal, origin } => ext.reflect(&normal.into_inner(), origin),
                Transform::Scale { factor, origin } => ext.scale(*factor, origin),
            }
        }
    }

    /// `{"type": "<Element>Properties", "<extension>": {...}, ...}`
    pub fn to_record(&self, element_type: ElementType, abridged: bool) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(element_type.properties_type()));
        for ext in &self.extensions {
            map.insert(ext.name().to_string(), ext.to_record(abridged));
        }
        Value::Object(map)
    }

    /// Rebuilds the extensions of a properties record through the registry.
    pub fn from_record(record: &Value, element_type: ElementType, abridged: bool) -> Result<Self> {
        let map = record.as_object().ok_or_else(|| {
            Error::Serialization(format!("{} must be an object", element_type.properties_type()))
        })?;
        let mut properties = Properties::new();
        for (name, value) in map {
            if name == "type" {
                continue;
            }
            let extension: Box<dyn PropertyExtension> = match property_constructor(name) {
                Some(constructor) => constructor(value, abridged)?,
                None => Box::new(PassthroughExtension::new(name, value.clone())),
            };
            properties.insert(extension);
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone)]
    struct Tagged {
        shift: f64,
    }

    impl PropertyExtension for Tagged {
        fn name(&self) -> &str {
            "tagged"
        }
        fn to_record(&self, abridged: bool) -> Value {
            json!({"shift": self.shift, "abridged": abridged})
        }
        fn duplicate(&self) -> Box<dyn PropertyExtension> {
            Box::new(self.clone())
        }
        fn translate(&mut self, vector: &Vector3<f64>) {
            self.shift += vector.x;
        }
    }

    fn tagged_from_record(value: &Value, _abridged: bool) -> Result<Box<dyn PropertyExtension>> {
        let shift = value["shift"].as_f64().unwrap_or(0.0);
        Ok(Box::new(Tagged { shift }))
    }

    #[test]
    fn unregistered_extensions_pass_through() {
        let record = json!({"type": "FaceProperties", "energy": {"construction": "Generic Wall"}});
        let props = Properties::from_record(&record, ElementType::Face, true).unwrap();
        assert_eq!(props.names().collect::<Vec<_>>(), vec!["energy"]);
        assert_eq!(props.to_record(ElementType::Face, true), record);
    }

    #[test]
    fn registered_extensions_are_constructed() {
        register_property_extension("tagged", tagged_from_record);
        assert!(registered_property_extensions().contains(&"tagged".to_string()));
        let record = json!({"type": "ShadeProperties", "tagged": {"shift": 1.5}});
        let mut props = Properties::from_record(&record, ElementType::Shade, false).unwrap();
        props.transform(&Transform::translate(Vector3::new(2.0, 0.0, 0.0)));
        let out = props.to_record(ElementType::Shade, false);
        assert_eq!(out["tagged"]["shift"], 3.5);
        assert_eq!(out["tagged"]["abridged"], false);
    }

    #[test]
    fn clone_duplicates_extensions() {
        let mut props = Properties::new();
        props.insert(Box::new(Tagged { shift: 0.0 }));
        let mut copy = props.clone();
        copy.transform(&Transform::translate(Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(props.to_record(ElementType::Room, true)["tagged"]["shift"], 0.0);
        assert_eq!(copy.to_record(ElementType::Room, true)["tagged"]["shift"], 1.0);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity identity shared by every element of the model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::properties::Properties;
use crate::typing::valid_identifier;

/// Discriminant for the kinds of entity in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Model,
    Room,
    Face,
    Aperture,
    Door,
    Shade,
    ShadeMesh,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Model => "Model",
            ElementType::Room => "Room",
            ElementType::Face => "Face",
            ElementType::Aperture => "Aperture",
            ElementType::Door => "Door",
            ElementType::Shade => "Shade",
            ElementType::ShadeMesh => "ShadeMesh",
        }
    }

    /// Record `type` key of the entity's properties sub-record.
    pub fn properties_type(&self) -> String {
        format!("{}Properties", self.as_str())
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier, display name and user data of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    identifier: String,
    display_name: Option<String>,
    user_data: Option<Map<String, Value>>,
}

impl Identity {
    pub fn new(identifier: &str) -> Result<Self> {
        valid_identifier(identifier)?;
        Ok(Self {
            identifier: identifier.to_string(),
            display_name: None,
            user_data: None,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn set_identifier(&mut self, identifier: &str) -> Result<()> {
        valid_identifier(identifier)?;
        self.identifier = identifier.to_string();
        Ok(())
    }
}

/// Capabilities common to all model entities.
pub trait Entity {
    const ELEMENT_TYPE: ElementType;

    fn identity(&self) -> &Identity;
    fn identity_mut(&mut self) -> &mut Identity;
    fn properties(&self) -> &Properties;
    fn properties_mut(&mut self) -> &mut Properties;

    fn element_type(&self) -> ElementType {
        Self::ELEMENT_TYPE
    }

    fn identifier(&self) -> &str {
        &self.identity().identifier
    }

    /// Free-form name, falling back to the identifier.
    fn display_name(&self) -> &str {
        let identity = self.identity();
        identity
            .display_name
            .as_deref()
            .unwrap_or(&identity.identifier)
    }

    fn set_display_name(&mut self, name: &str) {
        self.identity_mut().display_name = Some(name.to_string());
    }

    /// `display_name[identifier]`, used in error messages.
    fn full_id(&self) -> String {
        format!("{}[{}]", self.display_name(), self.identifier())
    }

    fn user_data(&self) -> Option<&Map<String, Value>> {
        self.identity().user_data.as_ref()
    }

    fn set_user_data(&mut self, data: Option<Map<String, Value>>) {
        self.identity_mut().user_data = data;
    }
}

/// Identity fields of every serialized entity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct IdentityRecord {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Map<String, Value>>,
}

impl IdentityRecord {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            identifier: identity.identifier.clone(),
            display_name: Some(
                identity
                    .display_name
                    .clone()
                    .unwrap_or_else(|| identity.identifier.clone()),
            ),
            user_data: identity.user_data.clone(),
        }
    }

    pub fn to_identity(&self) -> Result<Identity> {
        let mut identity = Identity::new(&self.identifier)?;
        identity.display_name = self
            .display_name
            .clone()
            .filter(|name| name != &self.identifier);
        identity.user_data = self.user_data.clone();
        Ok(identity)
    }
}

/// `display_name[identifier]` read from a raw record, for error messages
/// about records that failed to parse.
pub(crate) fn record_full_id(record: &Value) -> String {
    let identifier = record
        .get("identifier")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let display_name = record
        .get("display_name")
        .and_then(Value::as_str)
        .unwrap_or(identifier);
    format!("{}[{}]", display_name, identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_defaults() {
        let identity = Identity::new("Room_1").unwrap();
        let record = IdentityRecord::from_identity(&identity);
        assert_eq!(record.display_name.as_deref(), Some("Room_1"));
        assert_eq!(record.to_identity().unwrap(), identity);
    }

    #[test]
    fn full_id_from_record() {
        let record = serde_json::json!({"identifier": "F1", "display_name": "North Wall"});
        assert_eq!(record_full_id(&record), "North Wall[F1]");
        assert_eq!(record_full_id(&serde_json::json!({})), "unknown[unknown]");
    }

    #[test]
    fn element_type_names() {
        assert_eq!(ElementType::ShadeMesh.to_string(), "ShadeMesh");
        assert_eq!(ElementType::Face.properties_type(), "FaceProperties");
    }
}

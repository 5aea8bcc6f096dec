//! Stored workflow definition format.
//!
//! This is the JSON the visual editor saves: `{ nodes, edges }` with node
//! `data: { label, config }`. Fields the engine does not read (positions,
//! styling, selection state) are kept in `extra` maps so a definition
//! serializes back to what was stored. Known optional fields remember
//! whether they were absent or stored as `null`.

use crate::error::DefinitionError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Free-form JSON object.
pub type JsonObject = Map<String, JsonValue>;

/// A stored workflow definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Nodes in authoring order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<NodeSpec>,
    /// Edges in authoring order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<EdgeSpec>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// A node as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    /// `trigger`, `condition`, `action`, `agent`, or an editor-specific type.
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub data: NodeData,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// The `data` payload of a stored node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// `None` when absent, `Some(None)` when stored as `null`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub label: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub config: Option<Option<JsonObject>>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// An edge as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Option<String>>,
    pub source: String,
    pub target: String,
    /// The editor writes `null` for a node's default handle.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl NodeData {
    /// The label, if set to a string.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_ref().and_then(Option::as_deref)
    }

    /// The config object, if set.
    #[must_use]
    pub fn config(&self) -> Option<&JsonObject> {
        self.config.as_ref().and_then(Option::as_ref)
    }
}

impl EdgeSpec {
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_ref().and_then(Option::as_deref)
    }

    #[must_use]
    pub fn source_handle(&self) -> Option<&str> {
        self.source_handle.as_ref().and_then(Option::as_deref)
    }
}

impl WorkflowDefinition {
    /// Parses a stored definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Empty`] if there is no definition (or it is
    /// blank) and [`DefinitionError::InvalidJson`] if it does not parse or
    /// is `null`.
    ///
    /// Valid JSON that is not an object (`[]`, `42`, `"x"`) has no nodes or
    /// edges and parses as an empty definition.
    pub fn parse(raw: Option<&str>) -> Result<Self, DefinitionError> {
        let raw = raw.filter(|r| !r.is_empty()).ok_or(DefinitionError::Empty)?;
        let invalid = |e: serde_json::Error| DefinitionError::InvalidJson {
            reason: e.to_string(),
        };

        match serde_json::from_str::<JsonValue>(raw).map_err(invalid)? {
            value @ JsonValue::Object(_) => serde_json::from_value(value).map_err(invalid),
            JsonValue::Null => Err(DefinitionError::InvalidJson {
                reason: "definition is null".to_string(),
            }),
            _ => Ok(Self::default()),
        }
    }

    /// Serializes the definition back to its stored form.
    ///
    /// # Errors
    ///
    /// Returns an error if a preserved extra field cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Marks a field as present, keeping an explicit `null` as `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

//! Canvas content: positioned components and the connections between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MIN_COMPONENT_SIZE: f64 = 10.0;
pub const DUPLICATE_OFFSET: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Both sides clamped to the minimum
    pub fn clamped(width: f64, height: f64) -> Self {
        Self {
            width: width.max(MIN_COMPONENT_SIZE),
            height: height.max(MIN_COMPONENT_SIZE),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasComponent {
    pub id: String,
    /// Component kind, e.g. `text`, `image`, `table`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl CanvasComponent {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position: Position::default(),
            size: Size::default(),
            z_index: 0,
            properties: Map::new(),
            locked: false,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }
}

/// Partial component update; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentPatch {
    pub kind: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub z_index: Option<i32>,
    pub properties: Option<Map<String, Value>>,
    pub locked: Option<bool>,
}

impl ComponentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, component: &mut CanvasComponent) {
        if let Some(kind) = self.kind {
            component.kind = kind;
        }
        if let Some(position) = self.position {
            component.position = position;
        }
        if let Some(size) = self.size {
            component.size = size;
        }
        if let Some(z_index) = self.z_index {
            component.z_index = z_index;
        }
        if let Some(properties) = self.properties {
            component.properties = properties;
        }
        if let Some(locked) = self.locked {
            component.locked = locked;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStyle {
    #[default]
    Straight,
    Curved,
    Step,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type", default)]
    pub style: ConnectionStyle,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl Connection {
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            style: ConnectionStyle::default(),
            data: Map::new(),
        }
    }

    pub fn touches(&self, component_id: &str) -> bool {
        self.source_id == component_id || self.target_id == component_id
    }
}

/// What one history snapshot holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasContent {
    pub components: Vec<CanvasComponent>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 20.0,
            left: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: String,
}

/// A saved canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    pub components: Vec<CanvasComponent>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    pub page_size: String,
    pub orientation: Orientation,
    pub margins: Margins,
    pub metadata: TemplateMetadata,
}

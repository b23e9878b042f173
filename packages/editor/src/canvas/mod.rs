//! # Canvas Editor
//!
//! A flat list of positioned components with snapshot-based undo. It shares
//! nothing with the block document model beyond the storage substrate.
//!
//! ## Invariants
//!
//! - Component ids are unique
//! - Every connection joins two existing components
//! - The selection, if any, names an existing component

mod component;
mod history;

pub use component::*;
pub use history::{SnapshotHistory, DEFAULT_MAX_SNAPSHOTS};

use crate::errors::{CanvasError, CanvasResult};
use chrono::Utc;
use playbook_common::{read_json, write_json, KeyValueStore};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
pub const DEFAULT_GRID_SIZE: u32 = 20;
pub const DEFAULT_TEMPLATE_NAME: &str = "Novo Template";
pub const TEMPLATE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone)]
pub struct CanvasOptions {
    pub history_limit: usize,
    pub grid_size: u32,
    /// Id used by `save_template`; generated when absent
    pub template_id: Option<String>,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_MAX_SNAPSHOTS,
            grid_size: DEFAULT_GRID_SIZE,
            template_id: None,
        }
    }
}

/// Storage key of a saved canvas
pub fn template_key(id: &str) -> String {
    format!("template-{}", id)
}

pub struct CanvasEditor {
    content: CanvasContent,
    history: SnapshotHistory<CanvasContent>,
    selected: Option<String>,
    zoom: f64,
    show_grid: bool,
    show_rulers: bool,
    snap_to_grid: bool,
    grid_size: u32,
    template_id: Option<String>,
    last_error: Option<String>,
    next_id: u64,
    storage: Box<dyn KeyValueStore>,
}

impl CanvasEditor {
    pub fn new(options: CanvasOptions, storage: impl KeyValueStore + 'static) -> Self {
        Self {
            content: CanvasContent::default(),
            history: SnapshotHistory::new(CanvasContent::default(), options.history_limit),
            selected: None,
            zoom: 1.0,
            show_grid: true,
            show_rulers: true,
            snap_to_grid: true,
            grid_size: options.grid_size,
            template_id: options.template_id,
            last_error: None,
            next_id: 0,
            storage: Box::new(storage),
        }
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Append and select the component
    pub fn add_component(&mut self, component: CanvasComponent) -> CanvasResult<()> {
        if self.component(&component.id).is_some() {
            return Err(CanvasError::DuplicateComponent(component.id));
        }
        self.selected = Some(component.id.clone());
        self.content.components.push(component);
        self.snapshot();
        Ok(())
    }

    pub fn update_component(&mut self, id: &str, patch: ComponentPatch) -> CanvasResult<()> {
        if patch.is_empty() {
            self.require(id)?;
            return Ok(());
        }
        patch.apply(self.require_mut(id)?);
        self.snapshot();
        Ok(())
    }

    /// Merge `properties` into the component's existing properties
    pub fn update_component_properties(
        &mut self,
        id: &str,
        properties: Map<String, Value>,
    ) -> CanvasResult<()> {
        let mut merged = self.require(id)?.properties.clone();
        merged.extend(properties);
        self.update_component(
            id,
            ComponentPatch {
                properties: Some(merged),
                ..ComponentPatch::default()
            },
        )
    }

    /// Remove the component and every connection touching it
    pub fn delete_component(&mut self, id: &str) -> CanvasResult<()> {
        let index = self.index_of(id)?;
        self.content.components.remove(index);
        self.content.connections.retain(|c| !c.touches(id));
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.snapshot();
        Ok(())
    }

    /// Copy offset by 20/20 and stacked above everything else. Returns the
    /// new id.
    pub fn duplicate_component(&mut self, id: &str) -> CanvasResult<String> {
        let mut copy = self.require(id)?.clone();
        copy.id = self.fresh_id();
        copy.position.x += DUPLICATE_OFFSET;
        copy.position.y += DUPLICATE_OFFSET;
        copy.z_index = self.max_z_index().saturating_add(1);

        let new_id = copy.id.clone();
        self.add_component(copy)?;
        Ok(new_id)
    }

    pub fn select_component(&mut self, id: Option<&str>) -> CanvasResult<()> {
        if let Some(id) = id {
            self.require(id)?;
        }
        self.selected = id.map(str::to_string);
        Ok(())
    }

    /// Shift by a delta; coordinates never go below 0
    pub fn move_component(&mut self, id: &str, dx: f64, dy: f64) -> CanvasResult<()> {
        let position = self.require(id)?.position;
        self.update_component(
            id,
            ComponentPatch {
                position: Some(Position {
                    x: (position.x + dx).max(0.0),
                    y: (position.y + dy).max(0.0),
                }),
                ..ComponentPatch::default()
            },
        )
    }

    pub fn resize_component(&mut self, id: &str, width: f64, height: f64) -> CanvasResult<()> {
        self.update_component(
            id,
            ComponentPatch {
                size: Some(Size::clamped(width, height)),
                ..ComponentPatch::default()
            },
        )
    }

    pub fn bring_to_front(&mut self, id: &str) -> CanvasResult<()> {
        let z_index = self.max_z_index().saturating_add(1);
        self.set_z_index(id, z_index)
    }

    pub fn send_to_back(&mut self, id: &str) -> CanvasResult<()> {
        let z_index = self.min_z_index().saturating_sub(1);
        self.set_z_index(id, z_index)
    }

    pub fn component(&self, id: &str) -> Option<&CanvasComponent> {
        self.content.components.iter().find(|c| c.id == id)
    }

    pub fn components(&self) -> &[CanvasComponent] {
        &self.content.components
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_component(&self) -> Option<&CanvasComponent> {
        self.selected.as_deref().and_then(|id| self.component(id))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Returns false when nothing was selected
    pub fn delete_selected(&mut self) -> CanvasResult<bool> {
        match self.selected.clone() {
            Some(id) => {
                self.delete_component(&id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Rejected connections leave the canvas untouched and are recorded in
    /// [`CanvasEditor::error`]
    pub fn add_connection(&mut self, connection: Connection) -> CanvasResult<()> {
        if let Err(e) = self.check_connection(&connection) {
            warn!(connection_id = %connection.id, error = %e, "Rejected connection");
            self.last_error = Some(e.to_string());
            return Err(e);
        }
        self.last_error = None;
        self.content.connections.push(connection);
        self.snapshot();
        Ok(())
    }

    pub fn remove_connection(&mut self, id: &str) -> bool {
        let before = self.content.connections.len();
        self.content.connections.retain(|c| c.id != id);
        if self.content.connections.len() == before {
            return false;
        }
        self.snapshot();
        true
    }

    pub fn connections(&self) -> &[Connection] {
        &self.content.connections
    }

    /// Last rejected operation, if the most recent connection attempt failed
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn check_connection(&self, connection: &Connection) -> CanvasResult<()> {
        let invalid = |reason: String| CanvasError::InvalidConnection {
            id: connection.id.clone(),
            reason,
        };
        if self.content.connections.iter().any(|c| c.id == connection.id) {
            return Err(invalid("duplicate connection id".to_string()));
        }
        for endpoint in [&connection.source_id, &connection.target_id] {
            if self.component(endpoint).is_none() {
                return Err(invalid(format!("unknown component {}", endpoint)));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.content = snapshot.clone();
        self.selected = None;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.content = snapshot.clone();
        self.selected = None;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }

    pub fn toggle_rulers(&mut self) {
        self.show_rulers = !self.show_rulers;
    }

    pub fn toggle_snap_to_grid(&mut self) {
        self.snap_to_grid = !self.snap_to_grid;
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn show_rulers(&self) -> bool {
        self.show_rulers
    }

    pub fn snap_to_grid(&self) -> bool {
        self.snap_to_grid
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Build the template record and store it under `template-{id}`
    pub fn save_template(&mut self) -> CanvasResult<CanvasTemplate> {
        let template = self.to_template();
        write_json(self.storage.as_ref(), &template_key(&template.id), &template)?;
        self.template_id = Some(template.id.clone());
        debug!(template_id = %template.id, components = template.components.len(), "Saved canvas template");
        Ok(template)
    }

    /// Replace the canvas with a saved template; history restarts from it.
    /// Failures are logged and leave the canvas untouched.
    pub fn load_template(&mut self, id: &str) -> bool {
        match self.try_load_template(id) {
            Ok(()) => true,
            Err(e) => {
                warn!(template_id = id, error = %e, "Failed to load canvas template");
                false
            }
        }
    }

    pub fn try_load_template(&mut self, id: &str) -> CanvasResult<()> {
        let template: CanvasTemplate = read_json(self.storage.as_ref(), &template_key(id))?
            .ok_or_else(|| CanvasError::TemplateNotFound(id.to_string()))?;

        let content = CanvasContent {
            components: template.components,
            connections: template.connections,
        };
        if let Err(e) = check_content(&content) {
            self.last_error = Some(e.to_string());
            return Err(e);
        }

        self.content = content;
        self.last_error = None;
        self.history.reset(self.content.clone());
        self.selected = None;
        self.template_id = Some(template.id);
        Ok(())
    }

    pub fn export_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_template())?)
    }

    fn to_template(&self) -> CanvasTemplate {
        let now = Utc::now();
        CanvasTemplate {
            id: self
                .template_id
                .clone()
                .unwrap_or_else(|| format!("template-{}", now.timestamp_millis())),
            name: DEFAULT_TEMPLATE_NAME.to_string(),
            category: "custom".to_string(),
            components: self.content.components.clone(),
            connections: self.content.connections.clone(),
            page_size: "A4".to_string(),
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            metadata: TemplateMetadata {
                created_at: now,
                updated_at: now,
                version: TEMPLATE_VERSION.to_string(),
            },
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn snapshot(&mut self) {
        self.history.push(self.content.clone());
    }

    fn index_of(&self, id: &str) -> CanvasResult<usize> {
        self.content
            .components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CanvasError::ComponentNotFound(id.to_string()))
    }

    fn require(&self, id: &str) -> CanvasResult<&CanvasComponent> {
        self.component(id)
            .ok_or_else(|| CanvasError::ComponentNotFound(id.to_string()))
    }

    fn require_mut(&mut self, id: &str) -> CanvasResult<&mut CanvasComponent> {
        self.content
            .components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CanvasError::ComponentNotFound(id.to_string()))
    }

    fn set_z_index(&mut self, id: &str, z_index: i32) -> CanvasResult<()> {
        self.update_component(
            id,
            ComponentPatch {
                z_index: Some(z_index),
                ..ComponentPatch::default()
            },
        )
    }

    fn max_z_index(&self) -> i32 {
        self.content
            .components
            .iter()
            .map(|c| c.z_index)
            .max()
            .unwrap_or(0)
    }

    fn min_z_index(&self) -> i32 {
        self.content
            .components
            .iter()
            .map(|c| c.z_index)
            .min()
            .unwrap_or(0)
    }

    fn fresh_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("component-{}", self.next_id);
            if self.component(&id).is_none() {
                return id;
            }
        }
    }
}

/// Unique component ids, and every connection joins two of them
fn check_content(content: &CanvasContent) -> CanvasResult<()> {
    let mut ids = HashSet::new();
    for component in &content.components {
        if !ids.insert(component.id.as_str()) {
            return Err(CanvasError::DuplicateComponent(component.id.clone()));
        }
    }

    let mut connection_ids = HashSet::new();
    for connection in &content.connections {
        let invalid = |reason: String| CanvasError::InvalidConnection {
            id: connection.id.clone(),
            reason,
        };
        if !connection_ids.insert(connection.id.as_str()) {
            return Err(invalid("duplicate connection id".to_string()));
        }
        for endpoint in [&connection.source_id, &connection.target_id] {
            if !ids.contains(endpoint.as_str()) {
                return Err(invalid(format!("unknown component {}", endpoint)));
            }
        }
    }
    Ok(())
}

impl std::fmt::Debug for CanvasEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasEditor")
            .field("components", &self.content.components.len())
            .field("connections", &self.content.connections.len())
            .field("selected", &self.selected)
            .field("zoom", &self.zoom)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_common::MemoryStore;

    fn canvas() -> CanvasEditor {
        CanvasEditor::new(CanvasOptions::default(), MemoryStore::new())
    }

    #[test]
    fn test_add_selects_and_snapshots() {
        let mut canvas = canvas();
        canvas.add_component(CanvasComponent::new("a", "text")).unwrap();

        assert_eq!(canvas.selected_id(), Some("a"));
        assert!(canvas.can_undo());
        assert!(matches!(
            canvas.add_component(CanvasComponent::new("a", "text")),
            Err(CanvasError::DuplicateComponent(_))
        ));
    }

    #[test]
    fn test_undo_clears_selection_and_restores() {
        let mut canvas = canvas();
        canvas.add_component(CanvasComponent::new("a", "text")).unwrap();
        canvas.move_component("a", 15.0, 5.0).unwrap();

        assert!(canvas.undo());
        assert_eq!(canvas.component("a").unwrap().position, Position::default());
        assert_eq!(canvas.selected_id(), None);

        assert!(canvas.undo());
        assert!(canvas.components().is_empty());
        assert!(!canvas.undo());

        assert!(canvas.redo());
        assert_eq!(canvas.components().len(), 1);
    }

    #[test]
    fn test_move_and_resize_clamp() {
        let mut canvas = canvas();
        canvas
            .add_component(CanvasComponent::new("a", "box").at(5.0, 5.0))
            .unwrap();
        canvas.move_component("a", -50.0, 10.0).unwrap();
        canvas.resize_component("a", 2.0, 300.0).unwrap();

        let a = canvas.component("a").unwrap();
        assert_eq!(a.position, Position { x: 0.0, y: 15.0 });
        assert_eq!(a.size, Size { width: 10.0, height: 300.0 });
    }

    #[test]
    fn test_duplicate_offsets_and_stacks() {
        let mut canvas = canvas();
        let mut a = CanvasComponent::new("a", "box").at(10.0, 10.0);
        a.z_index = 3;
        canvas.add_component(a).unwrap();

        let copy_id = canvas.duplicate_component("a").unwrap();
        let copy = canvas.component(&copy_id).unwrap();

        assert_ne!(copy_id, "a");
        assert_eq!(copy.position, Position { x: 30.0, y: 30.0 });
        assert_eq!(copy.z_index, 4);
        assert_eq!(canvas.selected_id(), Some(copy_id.as_str()));
    }

    #[test]
    fn test_z_order() {
        let mut canvas = canvas();
        canvas.add_component(CanvasComponent::new("a", "box")).unwrap();
        canvas.add_component(CanvasComponent::new("b", "box")).unwrap();

        canvas.bring_to_front("a").unwrap();
        canvas.send_to_back("b").unwrap();

        assert_eq!(canvas.component("a").unwrap().z_index, 1);
        assert_eq!(canvas.component("b").unwrap().z_index, -1);
    }

    #[test]
    fn test_properties_merge() {
        let mut canvas = canvas();
        let mut a = CanvasComponent::new("a", "text");
        a.properties.insert("color".into(), "red".into());
        canvas.add_component(a).unwrap();

        let mut update = Map::new();
        update.insert("fontSize".into(), 12.into());
        canvas.update_component_properties("a", update).unwrap();

        let properties = &canvas.component("a").unwrap().properties;
        assert_eq!(properties["color"], "red");
        assert_eq!(properties["fontSize"], 12);
    }

    #[test]
    fn test_invalid_connection_is_recorded() {
        let mut canvas = canvas();
        canvas.add_component(CanvasComponent::new("a", "box")).unwrap();
        let snapshots = canvas.history.len();

        let result = canvas.add_connection(Connection::new("c1", "a", "ghost"));
        assert!(matches!(result, Err(CanvasError::InvalidConnection { .. })));
        assert!(canvas.connections().is_empty());
        assert!(canvas.error().is_some());
        assert_eq!(canvas.history.len(), snapshots);

        canvas.add_component(CanvasComponent::new("b", "box")).unwrap();
        canvas.add_connection(Connection::new("c1", "a", "b")).unwrap();
        assert!(canvas.error().is_none());
    }

    #[test]
    fn test_delete_drops_touching_connections() {
        let mut canvas = canvas();
        canvas.add_component(CanvasComponent::new("a", "box")).unwrap();
        canvas.add_component(CanvasComponent::new("b", "box")).unwrap();
        canvas.add_connection(Connection::new("c1", "a", "b")).unwrap();

        assert!(canvas.delete_selected().unwrap());
        assert!(canvas.connections().is_empty());
        assert!(!canvas.delete_selected().unwrap());
    }

    #[test]
    fn test_zoom_clamp() {
        let mut canvas = canvas();
        canvas.set_zoom(10.0);
        assert_eq!(canvas.zoom(), 5.0);
        canvas.set_zoom(0.0);
        assert_eq!(canvas.zoom(), 0.1);
    }

    #[test]
    fn test_save_and_load_template() {
        let store = MemoryStore::new();
        let mut canvas = CanvasEditor::new(
            CanvasOptions {
                template_id: Some("invoice".into()),
                ..CanvasOptions::default()
            },
            store.clone(),
        );
        canvas.add_component(CanvasComponent::new("a", "text")).unwrap();
        let saved = canvas.save_template().unwrap();
        assert_eq!(saved.id, "invoice");
        assert!(store.get("template-invoice").unwrap().is_some());

        let mut other = CanvasEditor::new(CanvasOptions::default(), store);
        assert!(other.load_template("invoice"));
        assert_eq!(other.components().len(), 1);
        assert!(!other.can_undo());
        assert!(!other.load_template("missing"));
    }

    #[test]
    fn test_tampered_template_is_rejected() {
        let store = MemoryStore::new();
        let mut canvas = CanvasEditor::new(
            CanvasOptions {
                template_id: Some("t".into()),
                ..CanvasOptions::default()
            },
            store.clone(),
        );
        canvas.add_component(CanvasComponent::new("a", "text")).unwrap();
        let mut template = canvas.save_template().unwrap();

        let mut other = CanvasEditor::new(CanvasOptions::default(), store.clone());
        other.add_component(CanvasComponent::new("keep", "box")).unwrap();

        template.connections.push(Connection::new("c1", "a", "ghost"));
        write_json(&store, &template_key("t"), &template).unwrap();
        assert!(matches!(
            other.try_load_template("t"),
            Err(CanvasError::InvalidConnection { .. })
        ));
        assert!(other.error().is_some());

        template.connections.clear();
        template.components.push(CanvasComponent::new("a", "image"));
        write_json(&store, &template_key("t"), &template).unwrap();
        assert!(!other.load_template("t"));

        assert_eq!(other.components().len(), 1);
        assert!(other.component("keep").is_some());
        assert!(other.can_undo());
    }

    #[test]
    fn test_z_order_saturates() {
        let mut canvas = canvas();
        let mut top = CanvasComponent::new("top", "box");
        top.z_index = i32::MAX;
        let mut bottom = CanvasComponent::new("bottom", "box");
        bottom.z_index = i32::MIN;
        canvas.add_component(top).unwrap();
        canvas.add_component(bottom).unwrap();

        canvas.bring_to_front("bottom").unwrap();
        assert_eq!(canvas.component("bottom").unwrap().z_index, i32::MAX);
        canvas.send_to_back("top").unwrap();
        assert_eq!(canvas.component("top").unwrap().z_index, i32::MIN);
    }
}

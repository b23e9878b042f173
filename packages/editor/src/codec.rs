//! # JSON Envelope
//!
//! `{ blocks, settings, exportedAt, version }`. Imports are all-or-nothing:
//! the whole envelope is decoded and the tree checked before anything is
//! handed back to the editor.

use crate::errors::{EditorError, EditorResult};
use crate::settings::EditorSettings;
use chrono::{DateTime, Utc};
use playbook_model::{validate_tree, Block, BlockId, BlockMap};
use serde::Serialize;
use serde_json::Value;

pub const FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    blocks: &'a BlockMap,
    settings: &'a EditorSettings,
    exported_at: DateTime<Utc>,
    version: &'static str,
}

/// A decoded, validated document ready to replace the current one
#[derive(Debug, Clone)]
pub struct ImportedDocument {
    pub blocks: BlockMap,
    pub settings: EditorSettings,
}

pub fn export_json(
    blocks: &BlockMap,
    settings: &EditorSettings,
    exported_at: DateTime<Utc>,
) -> EditorResult<String> {
    let envelope = Envelope {
        blocks,
        settings,
        exported_at,
        version: FORMAT_VERSION,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Decode an envelope. Settings in the payload are merged over `current`.
pub fn import_json(json: &str, current: &EditorSettings) -> EditorResult<ImportedDocument> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| EditorError::InvalidFormat(format!("not valid JSON: {}", e)))?;
    let Value::Object(mut envelope) = value else {
        return Err(EditorError::InvalidFormat(
            "expected a JSON object".to_string(),
        ));
    };

    let blocks = match envelope.remove("blocks") {
        Some(blocks) => decode_blocks(blocks)?,
        None => return Err(EditorError::InvalidFormat("missing blocks".to_string())),
    };
    let settings = match envelope.get("settings") {
        Some(Value::Null) | None => current.clone(),
        Some(partial) => current.overlay(partial)?,
    };

    Ok(ImportedDocument { blocks, settings })
}

/// Decode an id → block object and check the tree
pub fn decode_blocks(value: Value) -> EditorResult<BlockMap> {
    let Value::Object(entries) = value else {
        return Err(EditorError::InvalidFormat(
            "blocks must be an object keyed by id".to_string(),
        ));
    };

    let mut blocks = BlockMap::with_capacity(entries.len());
    for (key, raw) in entries {
        let block: Block = serde_json::from_value(raw)
            .map_err(|e| EditorError::InvalidFormat(format!("block {}: {}", key, e)))?;
        blocks.insert(BlockId::new(key), block);
    }

    validate_tree(&blocks).map_err(|e| EditorError::InvalidFormat(e.to_string()))?;
    Ok(blocks)
}

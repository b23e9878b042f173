//! # Block Patches
//!
//! A [`BlockPatch`] is a partial block: camelCase field names mapped to JSON
//! values, applied as a shallow merge over the serialized block. A `null`
//! value removes the field. The tree links (`id`, `parentId`, `children`) are
//! protected; they only change through structural operations.
//!
//! Patches also describe history: [`BlockPatch::diff`] yields the pair of
//! partial states that turn one version of a block into the other.

use crate::block::Block;
use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROTECTED_FIELDS: [&str; 3] = ["id", "parentId", "children"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockPatch(Map<String, Value>);

impl BlockPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(ModelError::InvalidPatch(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    /// Builder: set `key` to the serialized `value`
    pub fn set(mut self, key: impl Into<String>, value: impl Serialize) -> ModelResult<Self> {
        let value =
            serde_json::to_value(value).map_err(|e| ModelError::InvalidPatch(e.to_string()))?;
        self.0.insert(key.into(), value);
        Ok(self)
    }

    /// Builder: remove `key` when applied
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), Value::Null);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Later keys win
    pub fn extend(&mut self, other: BlockPatch) {
        self.0.extend(other.0);
    }

    pub fn validate(&self) -> ModelResult<()> {
        match PROTECTED_FIELDS.iter().find(|key| self.0.contains_key(**key)) {
            Some(key) => Err(ModelError::ProtectedField(key.to_string())),
            None => Ok(()),
        }
    }

    /// Shallow-merge onto a copy of `block`. The original is untouched on
    /// error.
    pub fn apply(&self, block: &Block) -> ModelResult<Block> {
        self.validate()?;

        let mut fields = to_fields(block)?;
        for (key, value) in &self.0 {
            if value.is_null() {
                fields.remove(key);
            } else {
                fields.insert(key.clone(), value.clone());
            }
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| ModelError::InvalidPatch(e.to_string()))
    }

    /// Current values of `keys` in `block`; absent fields map to `null`
    pub fn capture<'a>(
        block: &Block,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> ModelResult<Self> {
        let fields = to_fields(block)?;
        Ok(Self(
            keys.into_iter()
                .map(|key| {
                    let value = fields.get(key).cloned().unwrap_or(Value::Null);
                    (key.to_string(), value)
                })
                .collect(),
        ))
    }

    /// `(before, after)` over every field that differs between the two
    /// versions, so `before.apply(new) == old` and `after.apply(old) == new`
    pub fn diff(old: &Block, new: &Block) -> ModelResult<(Self, Self)> {
        let old_fields = to_fields(old)?;
        let new_fields = to_fields(new)?;

        let mut before = Map::new();
        let mut after = Map::new();
        let keys = old_fields
            .keys()
            .chain(new_fields.keys().filter(|k| !old_fields.contains_key(*k)));
        for key in keys {
            let old_value = old_fields.get(key);
            let new_value = new_fields.get(key);
            if old_value != new_value {
                before.insert(key.clone(), old_value.cloned().unwrap_or(Value::Null));
                after.insert(key.clone(), new_value.cloned().unwrap_or(Value::Null));
            }
        }

        Ok((Self(before), Self(after)))
    }
}

impl From<Map<String, Value>> for BlockPatch {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn to_fields(block: &Block) -> ModelResult<Map<String, Value>> {
    match serde_json::to_value(block) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ModelError::InvalidPatch(
            "block did not serialize to an object".to_string(),
        )),
        Err(e) => Err(ModelError::InvalidPatch(e.to_string())),
    }
}

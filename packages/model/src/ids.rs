//! Block identifiers.
//!
//! Ids are opaque strings on the wire. Inside an editing session they are
//! minted by [`IdGenerator`]: a random per-session seed plus a sequential
//! counter, so ids stay short and ordered while never colliding across
//! sessions that later merge documents.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Opaque, immutable block identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for BlockId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Sequential ID generator for one editing session
#[derive(Clone, Debug)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::from_seed(session_seed())
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn new_block_id(&mut self) -> BlockId {
        BlockId(self.new_id())
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn session_seed() -> String {
    let mut seed = Uuid::new_v4().simple().to_string();
    seed.truncate(12);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::from_seed("abc");

        let id1 = gen.new_id();
        let id2 = gen.new_id();
        let id3 = gen.new_block_id();

        assert_eq!(id1, "abc-1");
        assert_eq!(id2, "abc-2");
        assert_eq!(id3.as_str(), "abc-3");
    }

    #[test]
    fn test_session_seeds_differ() {
        let a = IdGenerator::new();
        let b = IdGenerator::new();

        assert_eq!(a.seed().len(), 12);
        assert_ne!(a.seed(), b.seed());
    }

    #[test]
    fn test_block_id_is_transparent_on_the_wire() {
        let id = BlockId::new("block-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"block-7\"");
    }
}

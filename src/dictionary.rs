//! Block-ID dictionary: bare block names to dense numeric ids.
//!
//! Keys are block ids without the `minecraft:` namespace (`"stone"`,
//! `"oak_log"`). The dictionary is supplied by the caller and only read
//! during decoding.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::grid::{BlockId, NO_DATA};

/// Namespace prefix stripped from palette names before lookup.
pub const DEFAULT_NAMESPACE: &str = "minecraft:";

/// Strip the `minecraft:` namespace, leaving other names untouched.
pub fn bare_name(name: &str) -> &str {
    name.strip_prefix(DEFAULT_NAMESPACE).unwrap_or(name)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockDictionary {
    ids: HashMap<String, BlockId>,
}

impl BlockDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object mapping names to ids, e.g. `{"stone": 1}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let ids: HashMap<String, BlockId> = serde_json::from_str(json)?;
        Self::validated(ids)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validated(ids: HashMap<String, BlockId>) -> Result<Self> {
        if let Some((name, _)) = ids.iter().find(|(_, id)| **id == NO_DATA) {
            return Err(Error::Corrupt(format!(
                "block '{}' uses the reserved id {:#06x}",
                name, NO_DATA
            )));
        }
        Ok(Self { ids })
    }

    /// Add a mapping. Names may be given with or without the namespace.
    pub fn insert(&mut self, name: &str, id: BlockId) {
        self.ids.insert(bare_name(name).to_string(), id);
    }

    /// Look up a bare block name.
    pub fn get(&self, name: &str) -> Option<BlockId> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Reverse lookup, mostly for reporting.
    pub fn name_of(&self, id: BlockId) -> Option<&str> {
        self.ids
            .iter()
            .find(|(_, value)| **value == id)
            .map(|(name, _)| name.as_str())
    }
}

impl<S: AsRef<str>> FromIterator<(S, BlockId)> for BlockDictionary {
    fn from_iter<I: IntoIterator<Item = (S, BlockId)>>(iter: I) -> Self {
        let mut dictionary = Self::new();
        for (name, id) in iter {
            dictionary.insert(name.as_ref(), id);
        }
        dictionary
    }
}

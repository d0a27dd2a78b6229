//! Tag inventory with stable indices.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaggerError};

/// Maps tag strings to class indices in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagMap {
    tags: Vec<String>,
    index: HashMap<String, usize>,
}

impl TagMap {
    /// Create an empty tag map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag map from every tag in the given sequences.
    pub fn from_sequences<'a, I, S>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'a [S]>,
        S: AsRef<str> + 'a,
    {
        let mut map = Self::new();
        for tags in sequences {
            for tag in tags {
                map.insert(tag.as_ref());
            }
        }
        map
    }

    /// Insert a tag, returning its index.
    pub fn insert(&mut self, tag: &str) -> usize {
        if let Some(&idx) = self.index.get(tag) {
            return idx;
        }
        let idx = self.tags.len();
        self.tags.push(tag.to_string());
        self.index.insert(tag.to_string(), idx);
        idx
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the map holds no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Index of a tag.
    pub fn get(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    /// Tag at an index.
    pub fn tag(&self, idx: usize) -> Option<&str> {
        self.tags.get(idx).map(String::as_str)
    }

    /// All tags in index order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Encode a tag sequence, failing on tags outside the inventory.
    pub fn encode<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<usize>> {
        tags.iter()
            .map(|t| {
                self.get(t.as_ref())
                    .ok_or_else(|| TaggerError::UnknownTag(t.as_ref().to_string()))
            })
            .collect()
    }

    /// Write the inventory as a JSON array.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Read an inventory written by [`TagMap::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl From<Vec<String>> for TagMap {
    fn from(tags: Vec<String>) -> Self {
        let mut map = Self::new();
        for tag in &tags {
            map.insert(tag);
        }
        map
    }
}

impl From<TagMap> for Vec<String> {
    fn from(map: TagMap) -> Self {
        map.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let a = vec!["DET", "NOUN"];
        let b = vec!["VERB", "DET"];
        let map = TagMap::from_sequences([a.as_slice(), b.as_slice()]);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get("DET"), Some(0));
        assert_eq!(map.get("NOUN"), Some(1));
        assert_eq!(map.get("VERB"), Some(2));
        assert_eq!(map.tag(2), Some("VERB"));
    }

    #[test]
    fn test_encode_unknown_tag() {
        let mut map = TagMap::new();
        map.insert("NOUN");

        assert_eq!(map.encode(&["NOUN", "NOUN"]).unwrap(), vec![0, 0]);
        assert!(matches!(
            map.encode(&["ADJ"]),
            Err(TaggerError::UnknownTag(t)) if t == "ADJ"
        ));
    }

    #[test]
    fn test_json_is_plain_array() {
        let map = TagMap::from(vec!["ADP".to_string(), "PRON".to_string()]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"["ADP","PRON"]"#);

        let back: TagMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("PRON"), Some(1));
    }
}

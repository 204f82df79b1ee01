//! Durable key/value boundary for cached node positions.
//!
//! Layouts are stored as a JSON object mapping `stateKey` to `{x, y}` under a
//! key namespaced by definition id. Anything that does not decode is treated
//! as no layout at all.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::StorageError;
use crate::geometry::Point;

pub type PositionMap = BTreeMap<String, Point>;

static UNSAFE_FILE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// Raw string storage, modelled on browser-style local storage.
pub trait LayoutStorage {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: LayoutStorage + ?Sized> LayoutStorage for Box<T> {
    fn read(&self, key: &str) -> Option<String> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LayoutStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let stem = UNSAFE_FILE_CHARS.replace_all(key, "_");
        self.dir.join(format!("{stem}.json"))
    }
}

impl LayoutStorage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "no stored layout");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let io = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io)?;
        std::fs::write(self.path_for(key), value).map_err(io)
    }
}

pub fn storage_key(namespace: &str, definition_id: &str) -> String {
    format!("{namespace}{definition_id}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoredLayout {
    Positions(PositionMap),
    Empty,
}

impl StoredLayout {
    pub fn into_positions(self) -> PositionMap {
        match self {
            StoredLayout::Positions(map) => map,
            StoredLayout::Empty => PositionMap::new(),
        }
    }
}

/// Decodes a stored layout blob. Missing, non-JSON, or non-object blobs are
/// `Empty`; individual entries without finite numeric `x`/`y` are dropped.
pub fn decode_layout(raw: Option<&str>) -> StoredLayout {
    let Some(raw) = raw else {
        return StoredLayout::Empty;
    };
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "stored layout is not JSON, ignoring");
            return StoredLayout::Empty;
        }
    };
    let Value::Object(entries) = value else {
        return StoredLayout::Empty;
    };

    let mut positions = PositionMap::new();
    for (state_key, entry) in entries {
        let x = entry.get("x").and_then(Value::as_f64);
        let y = entry.get("y").and_then(Value::as_f64);
        if let (Some(x), Some(y)) = (x, y) {
            let point = Point::new(x as f32, y as f32);
            if point.is_finite() {
                positions.insert(state_key, point);
            }
        }
    }
    StoredLayout::Positions(positions)
}

pub fn encode_layout(positions: &PositionMap) -> String {
    // f32 pairs cannot fail to serialize; non-finite values become null.
    serde_json::to_string(positions).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_layout() {
        let layout = decode_layout(Some(r#"{"NEW":{"x":150,"y":300}}"#));
        let positions = layout.into_positions();
        assert_eq!(positions.get("NEW"), Some(&Point::new(150.0, 300.0)));
    }

    #[test]
    fn corrupt_blobs_are_empty() {
        assert_eq!(decode_layout(None), StoredLayout::Empty);
        assert_eq!(decode_layout(Some("not json at all")), StoredLayout::Empty);
        assert_eq!(decode_layout(Some("[1,2,3]")), StoredLayout::Empty);
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let positions =
            decode_layout(Some(r#"{"A":{"x":"left","y":1},"B":{"x":1},"C":{"x":5,"y":6}}"#))
                .into_positions();
        assert_eq!(positions.len(), 1);
        assert!(positions.contains_key("C"));
    }

    #[test]
    fn encoded_layout_decodes_back() {
        let mut positions = PositionMap::new();
        positions.insert("ASSIGNED".to_string(), Point::new(12.5, 40.0));
        let raw = encode_layout(&positions);
        assert_eq!(decode_layout(Some(&raw)).into_positions(), positions);
    }

    #[test]
    fn file_storage_sanitizes_keys() {
        let storage = FileStorage::new("/tmp/layouts");
        let path = storage.path_for("workflow-designer:layout:42/../x");
        assert_eq!(
            path,
            PathBuf::from("/tmp/layouts/workflow-designer_layout_42_.._x.json")
        );
    }

    #[test]
    fn file_storage_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));
        assert!(storage.read("k").is_none());
        storage.write("k", "{}").unwrap();
        assert_eq!(storage.read("k").as_deref(), Some("{}"));
    }
}

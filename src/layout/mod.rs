//! Per-definition node positions: cached in memory, persisted through a
//! [`LayoutStorage`], seeded from a deterministic grid for unseen nodes.

mod grid;
mod storage;

use std::collections::HashMap;

use crate::config::GridConfig;
use crate::error::{DesignerError, Result};
use crate::geometry::Point;

pub use grid::grid_position;
pub use storage::{
    FileStorage, LayoutStorage, MemoryStorage, PositionMap, StoredLayout, decode_layout,
    encode_layout, storage_key,
};

pub struct LayoutStore<S> {
    storage: S,
    namespace: String,
    grid: GridConfig,
    layouts: HashMap<String, PositionMap>,
    /// Positions moved this session, kept apart from seeded defaults so a
    /// reload still honours them when storage writes fail.
    placed: HashMap<String, PositionMap>,
}

impl<S: LayoutStorage> LayoutStore<S> {
    pub fn new(storage: S, namespace: &str, grid: GridConfig) -> Self {
        Self {
            storage,
            namespace: namespace.to_string(),
            grid,
            layouts: HashMap::new(),
            placed: HashMap::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn key_for(&self, definition_id: &str) -> String {
        storage_key(&self.namespace, definition_id)
    }

    /// Cached position of a node. Never touches storage.
    pub fn position_of(&self, definition_id: &str, state_key: &str) -> Option<Point> {
        self.layouts
            .get(definition_id)
            .and_then(|positions| positions.get(state_key))
            .copied()
    }

    pub fn positions(&self, definition_id: &str) -> Option<&PositionMap> {
        self.layouts.get(definition_id)
    }

    /// Re-reads the stored layout for `definition_id`, lays this session's
    /// moves over it and fills every node of `ordered_state_keys` that has no
    /// usable position with its grid slot.
    /// Seeded defaults stay in memory until the next position write.
    pub fn seed_defaults(&mut self, definition_id: &str, ordered_state_keys: &[&str]) -> &PositionMap {
        let mut positions = self.read_stored(definition_id);
        if let Some(placed) = self.placed.get(definition_id) {
            positions.extend(placed.iter().map(|(key, point)| (key.clone(), *point)));
        }
        let mut seeded = 0usize;
        for (index, state_key) in ordered_state_keys.iter().enumerate() {
            let usable = positions
                .get(*state_key)
                .is_some_and(|point| point.is_finite());
            if !usable {
                positions.insert(state_key.to_string(), grid_position(index, &self.grid));
                seeded += 1;
            }
        }
        tracing::debug!(
            definition_id,
            nodes = ordered_state_keys.len(),
            seeded,
            "layout seeded"
        );
        self.layouts.insert(definition_id.to_string(), positions);
        &self.layouts[definition_id]
    }

    /// Moves a node and writes the definition's whole position map back to
    /// storage. Storage write failures are logged, not returned.
    pub fn set_position(&mut self, definition_id: &str, state_key: &str, x: f32, y: f32) -> Result<()> {
        let point = Point::new(x, y);
        if !point.is_finite() {
            return Err(DesignerError::InvalidPosition {
                state_key: state_key.to_string(),
                x,
                y,
            });
        }
        if !self.layouts.contains_key(definition_id) {
            let stored = self.read_stored(definition_id);
            self.layouts.insert(definition_id.to_string(), stored);
        }
        let Some(positions) = self.layouts.get_mut(definition_id) else {
            return Ok(());
        };
        positions.insert(state_key.to_string(), point);
        self.placed
            .entry(definition_id.to_string())
            .or_default()
            .insert(state_key.to_string(), point);
        let encoded = encode_layout(positions);
        let key = storage_key(&self.namespace, definition_id);
        if let Err(err) = self.storage.write(&key, &encoded) {
            tracing::warn!(definition_id, error = %err, "failed to persist layout");
        }
        Ok(())
    }

    /// Drops the in-memory layout and session moves of a definition; the next
    /// seed re-reads storage only.
    pub fn forget(&mut self, definition_id: &str) {
        self.layouts.remove(definition_id);
        self.placed.remove(definition_id);
    }

    fn read_stored(&self, definition_id: &str) -> PositionMap {
        let raw = self.storage.read(&self.key_for(definition_id));
        decode_layout(raw.as_deref()).into_positions()
    }
}

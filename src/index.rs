use std::collections::HashMap;

use crate::detection::{CameraId, LocalId};
use crate::identity::GlobalId;

/// `camera_id -> (local_id -> global_id)`, a relation rather than an
/// ownership table: entries may transiently outlive the corresponding
/// track and are reaped by GC (spec.md §3).
#[derive(Debug, Default)]
pub struct CameraIndex {
    table: HashMap<CameraId, HashMap<LocalId, GlobalId>>,
}

impl CameraIndex {
    pub fn set(&mut self, camera_id: CameraId, local_id: LocalId, global_id: GlobalId) {
        self.table
            .entry(camera_id)
            .or_default()
            .insert(local_id, global_id);
    }

    pub fn camera_tracks(&self, camera_id: CameraId) -> HashMap<LocalId, GlobalId> {
        self.table.get(&camera_id).cloned().unwrap_or_default()
    }

    pub fn tracked_camera_count(&self) -> usize {
        self.table.len()
    }

    /// Drops every `local_id -> global_id` mapping whose target is not
    /// in `live`. Called by GC right after stale tracks are removed
    /// from the track table, under the same write lock, so the window
    /// in which the index can point at a dead track is never visible
    /// to another thread (spec.md §3 invariant 1).
    pub fn retain_live(&mut self, live: &std::collections::HashSet<GlobalId>) {
        for locals in self.table.values_mut() {
            locals.retain(|_, gid| live.contains(gid));
        }
    }
}

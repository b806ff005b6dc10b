use std::collections::{HashMap, HashSet, VecDeque};

use crate::detection::{BoundingBox, CameraId, Detection, LocalId};
use crate::identity::GlobalId;

/// One trajectory sample recorded for a track under a given camera.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub timestamp: f64,
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub local_id: LocalId,
}

/// A global track's appearance memory and bookkeeping, owned exclusively
/// by the track table inside [`crate::GlobalTrackManager`].
///
/// `embedding_memory` is a ring buffer capped at construction time to
/// `max_history` (spec.md §3 invariant 3) — modeled on the teacher's
/// `VecDeque`-based bounded history in
/// `trackers/visual_sort/track_attributes.rs::update_history`, but
/// generalized here to plain FIFO-on-overflow since the GTM has no
/// quality-based eviction policy to apply.
#[derive(Debug, Clone)]
pub struct GlobalTrack {
    global_id: GlobalId,
    cameras_seen: HashSet<CameraId>,
    last_seen: f64,
    creation_time: f64,
    total_detections: u64,
    embedding_memory: VecDeque<Vec<f32>>,
    max_history: usize,
    confidence_history: Vec<f32>,
    trajectory_per_camera: HashMap<CameraId, Vec<TrajectoryPoint>>,
}

impl GlobalTrack {
    /// Creates a new track from the detection that spawned it.
    pub fn spawn(global_id: GlobalId, detection: &Detection, max_history: usize) -> Self {
        let mut track = Self {
            global_id,
            cameras_seen: HashSet::new(),
            last_seen: detection.timestamp,
            creation_time: detection.timestamp,
            total_detections: 0,
            embedding_memory: VecDeque::with_capacity(max_history.min(64)),
            max_history,
            confidence_history: Vec::new(),
            trajectory_per_camera: HashMap::new(),
        };
        track.apply(detection);
        track
    }

    /// Folds a detection into this track: extends the trajectory under
    /// `detection.camera_id`, appends the embedding (if any) to the
    /// ring, marks the camera as seen, bumps counters, and advances
    /// `last_seen`. Used for both the initial spawn and subsequent
    /// matched updates.
    pub fn apply(&mut self, detection: &Detection) {
        self.cameras_seen.insert(detection.camera_id);
        self.last_seen = detection.timestamp;
        self.total_detections += 1;
        self.confidence_history.push(detection.confidence);

        if let Some(embedding) = &detection.embedding {
            if self.max_history > 0 && self.embedding_memory.len() >= self.max_history {
                self.embedding_memory.pop_front();
            }
            self.embedding_memory.push_back(embedding.clone());
        }

        self.trajectory_per_camera
            .entry(detection.camera_id)
            .or_default()
            .push(TrajectoryPoint {
                timestamp: detection.timestamp,
                bbox: detection.bbox,
                confidence: detection.confidence,
                local_id: detection.local_id,
            });
    }

    pub fn global_id(&self) -> &GlobalId {
        &self.global_id
    }

    pub fn cameras_seen(&self) -> &HashSet<CameraId> {
        &self.cameras_seen
    }

    pub fn last_seen(&self) -> f64 {
        self.last_seen
    }

    pub fn creation_time(&self) -> f64 {
        self.creation_time
    }

    pub fn total_detections(&self) -> u64 {
        self.total_detections
    }

    pub fn confidence_history(&self) -> &[f32] {
        &self.confidence_history
    }

    pub fn trajectory_per_camera(&self) -> &HashMap<CameraId, Vec<TrajectoryPoint>> {
        &self.trajectory_per_camera
    }

    /// The last `k` embeddings in the ring (fewer if shorter), most
    /// recent last — exactly the window the matcher scores against.
    pub fn recent_embeddings(&self, k: usize) -> impl Iterator<Item = &Vec<f32>> {
        let len = self.embedding_memory.len();
        let start = len.saturating_sub(k);
        self.embedding_memory.iter().skip(start)
    }

    pub fn is_cross_camera(&self) -> bool {
        self.cameras_seen.len() > 1
    }

    pub fn avg_confidence(&self) -> f32 {
        if self.confidence_history.is_empty() {
            0.0
        } else {
            self.confidence_history.iter().sum::<f32>() / self.confidence_history.len() as f32
        }
    }

    pub fn trajectory_point_count(&self) -> usize {
        self.trajectory_per_camera.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectionBuilder;

    fn det(camera_id: u64, ts: f64, embedding: Option<Vec<f32>>) -> Detection {
        let mut b = DetectionBuilder::new(camera_id, 1)
            .confidence(0.9)
            .timestamp(ts);
        if let Some(e) = embedding {
            b = b.embedding(e);
        }
        b.build()
    }

    #[test]
    fn ring_buffer_evicts_oldest_first() {
        let id = crate::identity::GlobalIdAllocator::new().next();
        let mut track = GlobalTrack::spawn(id, &det(0, 0.0, Some(vec![1.0])), 2);
        track.apply(&det(0, 1.0, Some(vec![2.0])));
        track.apply(&det(0, 2.0, Some(vec![3.0])));

        let remembered: Vec<_> = track.recent_embeddings(10).cloned().collect();
        assert_eq!(remembered, vec![vec![2.0], vec![3.0]]);
    }

    #[test]
    fn cross_camera_flag_tracks_distinct_cameras() {
        let id = crate::identity::GlobalIdAllocator::new().next();
        let mut track = GlobalTrack::spawn(id, &det(0, 0.0, None), 10);
        assert!(!track.is_cross_camera());
        track.apply(&det(1, 1.0, None));
        assert!(track.is_cross_camera());
    }

    #[test]
    fn cameras_seen_is_subset_of_trajectory_keys() {
        let id = crate::identity::GlobalIdAllocator::new().next();
        let mut track = GlobalTrack::spawn(id, &det(0, 0.0, None), 10);
        track.apply(&det(1, 1.0, None));
        for cam in track.cameras_seen() {
            assert!(track.trajectory_per_camera().contains_key(cam));
        }
    }

    #[test]
    fn last_seen_never_decreases_under_sequential_apply() {
        let id = crate::identity::GlobalIdAllocator::new().next();
        let mut track = GlobalTrack::spawn(id, &det(0, 5.0, None), 10);
        track.apply(&det(0, 6.0, None));
        assert!(track.last_seen() >= track.creation_time());
    }
}

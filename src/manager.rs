use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};
use std::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::config::GtmOptions;
use crate::detection::{CameraId, Detection, LocalId};
use crate::errors::GtmError;
use crate::identity::{GlobalId, GlobalIdAllocator};
use crate::index::CameraIndex;
use crate::matcher;
use crate::metrics::{Counters, LatencyRing, Statistics};
use crate::track::GlobalTrack;

/// A `timestamp` + per-track summary snapshot suitable for external
/// validation, per spec.md §4.5 `export_snapshot`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    pub global_id: GlobalId,
    pub cameras_seen: HashSet<CameraId>,
    pub total_detections: u64,
    pub creation_time: f64,
    pub last_seen: f64,
    pub trajectory_point_count: usize,
    pub avg_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub timestamp: f64,
    pub tracks: Vec<TrackSnapshot>,
    pub statistics: Statistics,
}

/// The live track table and the camera→local→global index, behind one
/// lock. Kept as a single struct (rather than two separately-locked
/// fields) so GC's eviction of a track and its index entries commit
/// atomically — spec.md §3 invariant 1 requires the index never point
/// at a dead track for longer than "the brief interval inside GC", and
/// the only way to make that interval zero from every other thread's
/// perspective is for both structures to share one writer lock.
#[derive(Debug, Default)]
struct TrackTable {
    tracks: HashMap<GlobalId, GlobalTrack>,
    index: CameraIndex,
}

/// Online multi-camera appearance re-identification engine (spec.md
/// §4.5). Cheap to share: every public method takes `&self` and
/// synchronizes internally, so a single instance is meant to be handed
/// to `N` concurrent camera-pipeline producers behind an `Arc`.
pub struct GlobalTrackManager<C: Clock = SystemClock> {
    opts: GtmOptions,
    table: RwLock<TrackTable>,
    allocator: GlobalIdAllocator,
    counters: Counters,
    latency: Mutex<LatencyRing>,
    clock: C,
}

impl GlobalTrackManager<SystemClock> {
    pub fn new(opts: GtmOptions) -> Self {
        Self::with_clock(opts, SystemClock)
    }
}

impl<C: Clock> GlobalTrackManager<C> {
    pub fn with_clock(opts: GtmOptions, clock: C) -> Self {
        log::info!(
            "GlobalTrackManager initialized with reid_threshold={}, track_timeout={}s",
            opts.reid_threshold_value(),
            opts.track_timeout_value()
        );
        Self {
            opts,
            table: RwLock::new(TrackTable::default()),
            allocator: GlobalIdAllocator::new(),
            counters: Counters::default(),
            latency: Mutex::new(LatencyRing::default()),
            clock,
        }
    }

    /// Associates `detection` with an existing global track or spawns a
    /// new one, returning the resulting [`GlobalId`]. Total: every
    /// well-formed detection receives an identifier, and no internal
    /// fault is ever surfaced to the caller (spec.md §7).
    pub fn associate(&self, detection: Detection) -> GlobalId {
        let start = Instant::now();
        let now = self.clock.now();

        self.counters.incr_total_detections();
        self.warn_on_dimension_mismatch(&detection);

        let global_id = match self.associate_locked(&detection, now) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("association fallback for camera={} local={}: {e}", detection.camera_id, detection.local_id);
                self.counters.incr_errors();
                self.force_create(&detection)
            }
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.latency.lock().unwrap().record(elapsed_ms);

        global_id
    }

    /// Same contract as [`Self::associate`], but surfaces the rejection
    /// path as a typed error instead of silently recovering from it.
    /// Exists for tests that verify `InvalidInput` is actually detected
    /// (spec.md §7); production callers should use `associate`.
    pub fn try_associate(&self, detection: Detection) -> Result<GlobalId, GtmError> {
        if !(0.0..=1.0).contains(&detection.confidence) {
            return Err(GtmError::InvalidInput("confidence must be in [0, 1]"));
        }
        let now = self.clock.now();
        self.associate_locked(&detection, now)
    }

    fn warn_on_dimension_mismatch(&self, detection: &Detection) {
        if let Some(embedding) = &detection.embedding {
            let expected = self.opts.feature_dim_value();
            if embedding.len() != expected {
                log::warn!(
                    "{}",
                    GtmError::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    }
                );
            }
        }
    }

    fn force_create(&self, detection: &Detection) -> GlobalId {
        let mut table = self.table.write().unwrap();
        let global_id = self.spawn_locked(&mut table, detection);
        global_id
    }

    fn spawn_locked(&self, table: &mut TrackTable, detection: &Detection) -> GlobalId {
        let global_id = self.allocator.next();
        let track = GlobalTrack::spawn(global_id.clone(), detection, self.opts.max_history_value());
        table.tracks.insert(global_id.clone(), track);
        table
            .index
            .set(detection.camera_id, detection.local_id, global_id.clone());
        self.counters.incr_new_tracks_created();
        log::debug!("created track {global_id}");
        global_id
    }

    fn associate_locked(&self, detection: &Detection, now: f64) -> Result<GlobalId, GtmError> {
        let mut table = self.table.write().unwrap();

        self.gc_locked(&mut table, now);

        let bypass =
            detection.confidence < self.opts.min_confidence_value() || detection.embedding.is_none();

        if !bypass {
            let winner = {
                let candidates: Vec<&GlobalTrack> = table
                    .tracks
                    .values()
                    .filter(|t| matcher::is_candidate(t, detection, now, self.opts.track_timeout_value()))
                    .collect();
                let (best, _score) = matcher::find_best_match(detection, &candidates, &self.opts);
                best.cloned()
            };

            if let Some(global_id) = winner {
                let track = table.tracks.get_mut(&global_id).ok_or_else(|| {
                    GtmError::InternalFault(format!("matched track {global_id} vanished before commit"))
                })?;
                track.apply(detection);
                table
                    .index
                    .set(detection.camera_id, detection.local_id, global_id.clone());
                self.counters.incr_cross_camera_associations();
                log::debug!("associated detection with existing track {global_id}");
                return Ok(global_id);
            }
        }

        Ok(self.spawn_locked(&mut table, detection))
    }

    fn gc_locked(&self, table: &mut TrackTable, now: f64) {
        let timeout = self.opts.track_timeout_value();
        let before = table.tracks.len();

        table.tracks.retain(|global_id, track| {
            let alive = now - track.last_seen() <= timeout;
            if !alive {
                log::debug!("evicting stale track {global_id}");
            }
            alive
        });

        let evicted = before - table.tracks.len();
        for _ in 0..evicted {
            self.counters.incr_tracks_timeout();
        }

        if evicted > 0 {
            let live: HashSet<GlobalId> = table.tracks.keys().cloned().collect();
            table.index.retain_live(&live);
        }
    }

    /// Runs a GC pass outside of `associate`, useful for tests and for
    /// callers that want to bound index growth during a quiet period.
    pub fn collect_garbage(&self) {
        let now = self.clock.now();
        let mut table = self.table.write().unwrap();
        self.gc_locked(&mut table, now);
    }

    pub fn get_global_track(&self, global_id: &GlobalId) -> Option<TrackSnapshot> {
        let table = self.table.read().unwrap();
        table.tracks.get(global_id).map(Self::to_snapshot)
    }

    pub fn get_camera_tracks(&self, camera_id: CameraId) -> HashMap<LocalId, GlobalId> {
        let table = self.table.read().unwrap();
        table.index.camera_tracks(camera_id)
    }

    pub fn statistics(&self) -> Statistics {
        let table = self.table.read().unwrap();
        let now = self.clock.now();
        let timeout = self.opts.track_timeout_value();

        let active_tracks = table
            .tracks
            .values()
            .filter(|t| now - t.last_seen() <= timeout)
            .count();
        let cross_camera_tracks = table.tracks.values().filter(|t| t.is_cross_camera()).count();

        Statistics {
            counters: self.counters.snapshot(),
            total_global_tracks: table.tracks.len(),
            active_tracks,
            cross_camera_tracks,
            tracked_camera_count: table.index.tracked_camera_count(),
            avg_latency_ms: self.latency.lock().unwrap().average(),
        }
    }

    pub fn export_snapshot(&self) -> Snapshot {
        let table = self.table.read().unwrap();
        let tracks = table.tracks.values().map(Self::to_snapshot).collect();
        drop(table);

        Snapshot {
            timestamp: self.clock.now(),
            tracks,
            statistics: self.statistics(),
        }
    }

    fn to_snapshot(track: &GlobalTrack) -> TrackSnapshot {
        TrackSnapshot {
            global_id: track.global_id().clone(),
            cameras_seen: track.cameras_seen().clone(),
            total_detections: track.total_detections(),
            creation_time: track.creation_time(),
            last_seen: track.last_seen(),
            trajectory_point_count: track.trajectory_point_count(),
            avg_confidence: track.avg_confidence(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::detection::DetectionBuilder;

    fn unit_embedding(dim: usize, lead: f32) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[0] = lead;
        v[1] = (1.0 - lead * lead).max(0.0).sqrt();
        v
    }

    fn manager() -> GlobalTrackManager<ManualClock> {
        GlobalTrackManager::with_clock(GtmOptions::default(), ManualClock::new(1000.0))
    }

    #[test]
    fn scenario_a_single_camera_new_track() {
        crate::test_support::init_logging();
        let gtm = manager();
        let d = DetectionBuilder::new(0, 1)
            .confidence(0.9)
            .embedding(unit_embedding(256, 1.0))
            .timestamp(1000.0)
            .build();

        let id = gtm.associate(d);
        assert_eq!(id.as_str(), "GT_000001");

        let stats = gtm.statistics();
        assert_eq!(stats.total_global_tracks, 1);
        assert_eq!(stats.cross_camera_tracks, 0);
    }

    #[test]
    fn scenario_b_cross_camera_association() {
        let gtm = manager();
        let e1 = unit_embedding(256, 1.0);
        let d1 = DetectionBuilder::new(0, 1)
            .confidence(0.9)
            .embedding(e1.clone())
            .timestamp(1000.0)
            .build();
        let id1 = gtm.associate(d1);

        let mut e2 = e1;
        e2[1] += 0.05;
        let d2 = DetectionBuilder::new(1, 1)
            .confidence(0.8)
            .embedding(e2)
            .timestamp(1000.1)
            .build();
        let id2 = gtm.associate(d2);

        assert_eq!(id1, id2);
        let track = gtm.get_global_track(&id1).unwrap();
        assert_eq!(track.cameras_seen, [0, 1].into_iter().collect());
        assert_eq!(gtm.statistics().counters.cross_camera_associations, 1);
    }

    #[test]
    fn scenario_c_low_confidence_bypass() {
        let gtm = manager();
        let e1 = unit_embedding(256, 1.0);
        let d1 = DetectionBuilder::new(0, 1)
            .confidence(0.9)
            .embedding(e1.clone())
            .timestamp(1000.0)
            .build();
        gtm.associate(d1);

        let d2 = DetectionBuilder::new(1, 1)
            .confidence(0.4)
            .embedding(e1)
            .timestamp(1000.1)
            .build();
        let id2 = gtm.associate(d2);

        assert_eq!(id2.as_str(), "GT_000002");
        assert_eq!(gtm.statistics().counters.new_tracks_created, 2);
    }

    #[test]
    fn scenario_d_missing_embedding_bypass() {
        let gtm = manager();
        let d = DetectionBuilder::new(0, 1).confidence(0.9).timestamp(1000.0).build();
        let id = gtm.associate(d);
        assert_eq!(id.as_str(), "GT_000001");
        assert_eq!(gtm.statistics().counters.cross_camera_associations, 0);
    }

    #[test]
    fn scenario_e_staleness_gc() {
        use std::sync::Arc;

        let clock = Arc::new(ManualClock::new(0.0));
        let gtm = GlobalTrackManager::with_clock(
            GtmOptions::default().track_timeout(30.0),
            Arc::clone(&clock),
        );

        let d1 = DetectionBuilder::new(0, 1)
            .confidence(0.9)
            .embedding(unit_embedding(256, 1.0))
            .timestamp(0.0)
            .build();
        let old_id = gtm.associate(d1);
        assert_eq!(gtm.statistics().total_global_tracks, 1);

        clock.advance(31.0);
        gtm.collect_garbage();

        let stats = gtm.statistics();
        assert_eq!(stats.total_global_tracks, 0);
        assert_eq!(stats.counters.tracks_timeout, 1);
        assert!(gtm.get_global_track(&old_id).is_none());
    }

    #[test]
    fn scenario_f_same_camera_non_match() {
        let gtm = manager();
        let e1 = unit_embedding(256, 1.0);
        let d1 = DetectionBuilder::new(0, 1)
            .confidence(0.9)
            .embedding(e1.clone())
            .timestamp(1000.0)
            .build();
        let id1 = gtm.associate(d1);

        let d2 = DetectionBuilder::new(0, 2)
            .confidence(0.9)
            .embedding(e1)
            .timestamp(1000.1)
            .build();
        let id2 = gtm.associate(d2);

        assert_ne!(id1, id2);
    }

    #[test]
    fn invalid_confidence_is_rejected_by_try_associate() {
        let gtm = manager();
        let d = DetectionBuilder::new(0, 1).confidence(1.5).timestamp(1000.0).build();
        assert!(gtm.try_associate(d).is_err());
    }

    #[test]
    fn ids_are_never_reused_across_gc() {
        let gtm = manager();
        let d = DetectionBuilder::new(0, 1)
            .confidence(0.9)
            .embedding(unit_embedding(256, 1.0))
            .timestamp(1000.0)
            .build();
        let id1 = gtm.associate(d);
        gtm.collect_garbage();
        let d2 = DetectionBuilder::new(0, 1)
            .confidence(0.9)
            .embedding(unit_embedding(256, 1.0))
            .timestamp(1000.0)
            .build();
        let id2 = gtm.associate(d2);
        assert_ne!(id1, id2);
    }
}

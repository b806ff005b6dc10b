use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bounded ring of the last `CAPACITY` per-call latencies, in
/// milliseconds. Mutated only under the manager's write lock, so it
/// needs no internal synchronization of its own.
const LATENCY_CAPACITY: usize = 1000;

#[derive(Debug, Default)]
pub struct LatencyRing {
    samples: VecDeque<f64>,
}

impl LatencyRing {
    pub fn record(&mut self, millis: f64) {
        if self.samples.len() >= LATENCY_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(millis);
    }

    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f64>() / self.samples.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Process-lifetime, non-decreasing counters (spec.md §4.6).
///
/// Plain atomics rather than a `Mutex`-guarded struct: every counter is
/// independent and only ever incremented, so there is nothing to keep
/// consistent across fields — unlike the track table, which needs all
/// its pieces updated under one lock.
#[derive(Debug, Default)]
pub struct Counters {
    pub total_detections: AtomicU64,
    pub cross_camera_associations: AtomicU64,
    pub new_tracks_created: AtomicU64,
    pub tracks_timeout: AtomicU64,
    pub errors: AtomicU64,
}

impl Counters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_detections: self.total_detections.load(Ordering::Relaxed),
            cross_camera_associations: self.cross_camera_associations.load(Ordering::Relaxed),
            new_tracks_created: self.new_tracks_created.load(Ordering::Relaxed),
            tracks_timeout: self.tracks_timeout.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn incr_total_detections(&self) {
        self.total_detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_cross_camera_associations(&self) {
        self.cross_camera_associations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_new_tracks_created(&self) {
        self.new_tracks_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_tracks_timeout(&self) {
        self.tracks_timeout.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub total_detections: u64,
    pub cross_camera_associations: u64,
    pub new_tracks_created: u64,
    pub tracks_timeout: u64,
    pub errors: u64,
}

/// Counters plus derived aggregates, returned by
/// [`crate::GlobalTrackManager::statistics`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    pub counters: CounterSnapshot,
    pub total_global_tracks: usize,
    pub active_tracks: usize,
    pub cross_camera_tracks: usize,
    pub tracked_camera_count: usize,
    pub avg_latency_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_ring_evicts_oldest_beyond_capacity() {
        let mut ring = LatencyRing::default();
        for i in 0..(LATENCY_CAPACITY + 10) {
            ring.record(i as f64);
        }
        assert_eq!(ring.len(), LATENCY_CAPACITY);
    }

    #[test]
    fn counters_are_monotonic() {
        let counters = Counters::default();
        counters.incr_total_detections();
        counters.incr_total_detections();
        assert_eq!(counters.snapshot().total_detections, 2);
    }
}

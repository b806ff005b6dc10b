//! `gtm_reid` — an online global track manager for multi-camera
//! appearance re-identification.
//!
//! Per-camera trackers already solve within-camera association (SORT,
//! IoU, whatever upstream pipeline produces a `(camera_id, local_id)`
//! pair per frame). This crate solves the next problem: given a stream
//! of per-camera detections carrying an appearance embedding, decide
//! which ones are the same physical subject seen from a different
//! camera, and hand back a single stable [`identity::GlobalId`] per
//! subject.
//!
//! The entry point is [`manager::GlobalTrackManager`]; everything else
//! is a supporting concern it composes: [`distance`] for the
//! similarity kernel, [`matcher`] for candidate scoring, [`track`] for
//! per-identity memory, [`index`] for the camera-local lookup table,
//! and [`metrics`] for the counters and latency surfaced by
//! `statistics()`.

pub mod clock;
pub mod config;
pub mod detection;
pub mod distance;
pub mod errors;
pub mod identity;
pub mod index;
pub mod manager;
pub mod matcher;
pub mod metrics;
pub mod track;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GtmOptions;
pub use detection::{BoundingBox, CameraId, Detection, DetectionBuilder, LocalId};
pub use errors::GtmError;
pub use identity::{GlobalId, GlobalIdAllocator};
pub use manager::{GlobalTrackManager, Snapshot, TrackSnapshot};
pub use metrics::{CounterSnapshot, Statistics};
pub use track::{GlobalTrack, TrajectoryPoint};

/// Test-only logging bootstrap, shared by every module's `#[cfg(test)]`
/// block so `log` output from `GlobalTrackManager` is visible under
/// `cargo test -- --nocapture` without each test file rolling its own
/// `env_logger::try_init()` (which panics on double-init across test
/// binaries run in the same process).
#[cfg(test)]
pub(crate) mod test_support {
    use once_cell::sync::Lazy;

    static INIT: Lazy<()> = Lazy::new(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });

    pub fn init_logging() {
        Lazy::force(&INIT);
    }
}

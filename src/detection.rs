use std::time::{SystemTime, UNIX_EPOCH};

/// Per-camera stream identifier.
pub type CameraId = u64;

/// Identifier assigned by the per-camera tracker; unique only within
/// `(camera_id, lifetime-of-that-local-track)`.
pub type LocalId = u64;

/// Axis-aligned bounding box in `(x, y, w, h)` format.
///
/// Deliberately just the four scalars the trajectory log needs to
/// reproduce — no IoU, clipping, or Kalman machinery, since the GTM is
/// appearance-only (spec.md Non-goals: "geometric/homography-based
/// association").
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// An incoming per-camera detection, immutable once submitted.
#[derive(Debug, Clone)]
pub struct Detection {
    pub camera_id: CameraId,
    pub local_id: LocalId,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub class_id: u64,
    pub timestamp: f64,
    pub embedding: Option<Vec<f32>>,
}

/// Builder for [`Detection`], mirroring the teacher's chained-setter
/// option builders (`VisualSortOptions`) rather than a struct literal
/// with a dozen fields, since `embedding` and `timestamp` are both
/// commonly defaulted.
pub struct DetectionBuilder {
    camera_id: CameraId,
    local_id: LocalId,
    confidence: f32,
    bbox: BoundingBox,
    class_id: u64,
    timestamp: Option<f64>,
    embedding: Option<Vec<f32>>,
}

impl DetectionBuilder {
    pub fn new(camera_id: CameraId, local_id: LocalId) -> Self {
        Self {
            camera_id,
            local_id,
            confidence: 0.0,
            bbox: BoundingBox::default(),
            class_id: 0,
            timestamp: None,
            embedding: None,
        }
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn class_id(mut self, class_id: u64) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn build(self) -> Detection {
        let timestamp = self.timestamp.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("system clock predates the unix epoch")
                .as_secs_f64()
        });

        Detection {
            camera_id: self.camera_id,
            local_id: self.local_id,
            confidence: self.confidence,
            bbox: self.bbox,
            class_id: self.class_id,
            timestamp,
            embedding: self.embedding,
        }
    }
}

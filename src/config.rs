/// Configuration for a [`crate::GlobalTrackManager`], built with chained
/// setters over sane defaults — the same shape as the teacher's
/// `VisualSortOptions` builder (`trackers/visual_sort/options.rs`).
#[derive(Debug, Clone)]
pub struct GtmOptions {
    reid_threshold: f32,
    max_history: usize,
    track_timeout: f64,
    min_confidence: f32,
    recent_k: usize,
    score_weights: (f32, f32),
    feature_dim: usize,
}

impl GtmOptions {
    /// Decision threshold for the combined similarity score. A
    /// candidate whose score exceeds this is accepted as a match.
    pub fn reid_threshold(mut self, v: f32) -> Self {
        self.reid_threshold = v;
        self
    }

    /// `H`: per-track embedding memory depth.
    pub fn max_history(mut self, v: usize) -> Self {
        assert!(v > 0, "max_history must be positive");
        self.max_history = v;
        self
    }

    /// Staleness horizon in seconds, measured against wall-clock `now`
    /// (spec.md §9 Open Question, resolved in SPEC_FULL.md §9.1).
    pub fn track_timeout(mut self, v: f64) -> Self {
        self.track_timeout = v;
        self
    }

    /// Bypass threshold below which a detection cannot match and always
    /// spawns a new track.
    pub fn min_confidence(mut self, v: f32) -> Self {
        self.min_confidence = v;
        self
    }

    /// `K`: matcher window size over a candidate's recent embeddings.
    pub fn recent_k(mut self, v: usize) -> Self {
        assert!(v > 0, "recent_k must be positive");
        self.recent_k = v;
        self
    }

    /// `(w_max, w_avg)`. Not required to sum to 1 by the type system,
    /// but scores are only meaningfully compared against
    /// `reid_threshold` when they do — callers deviating from that
    /// take responsibility for re-tuning the threshold too.
    pub fn score_weights(mut self, w_max: f32, w_avg: f32) -> Self {
        self.score_weights = (w_max, w_avg);
        self
    }

    /// `D`: expected embedding dimension.
    pub fn feature_dim(mut self, v: usize) -> Self {
        assert!(v > 0, "feature_dim must be positive");
        self.feature_dim = v;
        self
    }

    pub(crate) fn reid_threshold_value(&self) -> f32 {
        self.reid_threshold
    }

    pub(crate) fn max_history_value(&self) -> usize {
        self.max_history
    }

    pub(crate) fn track_timeout_value(&self) -> f64 {
        self.track_timeout
    }

    pub(crate) fn min_confidence_value(&self) -> f32 {
        self.min_confidence
    }

    pub(crate) fn recent_k_value(&self) -> usize {
        self.recent_k
    }

    pub(crate) fn score_weights_value(&self) -> (f32, f32) {
        self.score_weights
    }

    pub(crate) fn feature_dim_value(&self) -> usize {
        self.feature_dim
    }
}

impl Default for GtmOptions {
    fn default() -> Self {
        Self {
            reid_threshold: 0.75,
            max_history: 100,
            track_timeout: 30.0,
            min_confidence: 0.5,
            recent_k: 10,
            score_weights: (0.7, 0.3),
            feature_dim: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let o = GtmOptions::default();
        assert_eq!(o.reid_threshold_value(), 0.75);
        assert_eq!(o.max_history_value(), 100);
        assert_eq!(o.track_timeout_value(), 30.0);
        assert_eq!(o.min_confidence_value(), 0.5);
        assert_eq!(o.recent_k_value(), 10);
        assert_eq!(o.score_weights_value(), (0.7, 0.3));
        assert_eq!(o.feature_dim_value(), 256);
    }

    #[test]
    fn builder_chains_overrides() {
        let o = GtmOptions::default()
            .reid_threshold(0.8)
            .max_history(50)
            .track_timeout(10.0)
            .min_confidence(0.3)
            .recent_k(5)
            .score_weights(0.6, 0.4)
            .feature_dim(128);
        assert_eq!(o.reid_threshold_value(), 0.8);
        assert_eq!(o.max_history_value(), 50);
        assert_eq!(o.track_timeout_value(), 10.0);
        assert_eq!(o.min_confidence_value(), 0.3);
        assert_eq!(o.recent_k_value(), 5);
        assert_eq!(o.score_weights_value(), (0.6, 0.4));
        assert_eq!(o.feature_dim_value(), 128);
    }

    #[test]
    #[should_panic(expected = "max_history must be positive")]
    fn rejects_zero_history() {
        GtmOptions::default().max_history(0);
    }
}

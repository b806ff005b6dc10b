use itertools::{Itertools, MinMaxResult};
use rayon::prelude::*;

use crate::config::GtmOptions;
use crate::detection::Detection;
use crate::distance::sim;
use crate::identity::GlobalId;
use crate::track::GlobalTrack;

/// A single scored candidate, kept around only long enough to pick a
/// winner under the spec's tie-break rule (spec.md §4.3).
struct Scored<'a> {
    global_id: &'a GlobalId,
    last_seen: f64,
    score: f32,
}

fn better(a: &Scored, b: &Scored) -> bool {
    if a.score != b.score {
        return a.score > b.score;
    }
    if a.last_seen != b.last_seen {
        return a.last_seen > b.last_seen;
    }
    a.global_id < b.global_id
}

/// A track is eligible to be matched against `detection` when it hasn't
/// seen `detection.camera_id` before and isn't already stale as of
/// `now` (spec.md §4.3). The GTM only bridges identities across
/// cameras — within-camera association is the upstream tracker's job.
pub fn is_candidate(track: &GlobalTrack, detection: &Detection, now: f64, track_timeout: f64) -> bool {
    !track.cameras_seen().contains(&detection.camera_id) && now - track.last_seen() <= track_timeout
}

/// Scores one candidate track against `detection.embedding` using the
/// last `recent_k` embeddings: `0.7 * max + 0.3 * avg` with the weights
/// taken from `opts`. A track with no collected embeddings scores 0 and
/// is effectively excluded.
fn score(track: &GlobalTrack, embedding: &[f32], opts: &GtmOptions) -> f32 {
    let sims: Vec<f32> = track
        .recent_embeddings(opts.recent_k_value())
        .map(|e| sim(embedding, e))
        .collect();

    if sims.is_empty() {
        return 0.0;
    }

    let max = match sims.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => return 0.0,
        MinMaxResult::OneElement(x) => x,
        MinMaxResult::MinMax(_, hi) => hi,
    };
    let avg = sims.iter().sum::<f32>() / sims.len() as f32;
    let (w_max, w_avg) = opts.score_weights_value();

    w_max * max + w_avg * avg
}

/// Finds the best matching track for `detection` among `candidates`
/// (already filtered by [`is_candidate`]) and decides whether it clears
/// `reid_threshold`.
///
/// Returns `(Some(global_id), score)` on a match, `(None, score)`
/// otherwise (`score` is `0.0` when `candidates` is empty). Never
/// mutates a track, per spec.md §4.3's edge-case note.
pub fn find_best_match<'a>(
    detection: &Detection,
    candidates: &[&'a GlobalTrack],
    opts: &GtmOptions,
) -> (Option<&'a GlobalId>, f32) {
    let embedding = match &detection.embedding {
        Some(e) => e,
        None => return (None, 0.0),
    };

    let best = candidates
        .par_iter()
        .map(|track| Scored {
            global_id: track.global_id(),
            last_seen: track.last_seen(),
            score: score(track, embedding, opts),
        })
        .reduce_with(|a, b| if better(&a, &b) { a } else { b });

    match best {
        None => (None, 0.0),
        Some(best) if best.score > opts.reid_threshold_value() => {
            (Some(best.global_id), best.score)
        }
        Some(best) => (None, best.score),
    }
}

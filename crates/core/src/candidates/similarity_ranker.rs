use crate::candidates::candidate_set::CandidateSet;
use crate::candidates::ranked_queue::{RankedEntry, RankedQueue};
use crate::detection::domain::face_comparator::FaceComparator;
use crate::shared::frame::Frame;

/// Scores candidates against the opt-out reference face.
///
/// Only candidates the comparator reports as a match are ranked; their
/// score is `1 - distance`. Everything else is left out of the queue rather
/// than scored zero.
pub struct SimilarityRanker {
    min_similarity: Option<f64>,
}

impl SimilarityRanker {
    /// `min_similarity`, when set, additionally drops matches scoring below it.
    pub fn new(min_similarity: Option<f64>) -> Self {
        Self { min_similarity }
    }

    pub fn rank(
        &self,
        candidates: &mut CandidateSet,
        source: &Frame,
        reference: &Frame,
        comparator: &mut dyn FaceComparator,
    ) -> Result<RankedQueue, Box<dyn std::error::Error>> {
        let mut scored = Vec::with_capacity(candidates.len());

        for candidate in candidates.iter_mut() {
            let rect = candidate.rect();
            let crop = match candidate.ensure_crop(source) {
                Ok(crop) => crop,
                Err(e) => {
                    log::warn!("Skipping candidate {rect}: {e}");
                    continue;
                }
            };
            let comparison = comparator.compare(crop, reference)?;

            if !comparison.is_match {
                log::debug!("Candidate {rect} does not match the reference");
                continue;
            }

            let score = 1.0 - comparison.distance;
            if self.min_similarity.is_some_and(|min| score < min) {
                log::debug!("Candidate {rect} scored {score:.3}, below threshold");
                continue;
            }

            log::debug!("Candidate {rect} scored {score:.3}");
            scored.push(RankedEntry { rect, score });
        }

        // Scores are written back only once every comparison has succeeded.
        for candidate in candidates.iter_mut() {
            let score = scored
                .iter()
                .find(|e| e.rect == candidate.rect())
                .map(|e| e.score);
            candidate.set_score(score);
        }

        log::info!(
            "Ranked {} of {} candidates against the reference face",
            scored.len(),
            candidates.len()
        );
        Ok(RankedQueue::new(scored))
    }
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self::new(None)
    }
}

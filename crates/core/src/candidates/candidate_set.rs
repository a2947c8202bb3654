use std::collections::HashMap;

use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// A detected body region under evaluation as the redaction target.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyCandidate {
    rect: Rect,
    crop: Option<Frame>,
    score: Option<f64>,
    matched: Option<bool>,
}

impl BodyCandidate {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            crop: None,
            score: None,
            matched: None,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn crop(&self) -> Option<&Frame> {
        self.crop.as_ref()
    }

    /// Similarity to the reference face; `None` until ranked, and for
    /// candidates the ranker excluded.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// `Some(true)` once confirmed, `Some(false)` once rejected.
    pub fn matched(&self) -> Option<bool> {
        self.matched
    }

    /// Returns the cached crop, deriving it from `source` on first use.
    pub fn ensure_crop(&mut self, source: &Frame) -> Result<&Frame, RedactionError> {
        let crop = match self.crop.take() {
            Some(crop) => crop,
            None => {
                let clipped = self.rect.clip_to_bounds(source.width(), source.height())?;
                source.crop(&clipped)
            }
        };
        Ok(self.crop.insert(crop))
    }

    pub(crate) fn set_score(&mut self, score: Option<f64>) {
        self.score = score;
    }

    pub(crate) fn clear_matched(&mut self) {
        self.matched = None;
    }

    pub(crate) fn set_matched(&mut self, matched: bool) {
        self.matched = Some(matched);
    }
}

/// Body candidates keyed by rectangle, iterated in detection order.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<BodyCandidate>,
    index: HashMap<Rect, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from matched body rects, caching each crop from `source`.
    ///
    /// Rects that do not overlap the image are skipped with a warning.
    pub fn from_bodies(bodies: &[Rect], source: &Frame) -> Self {
        let mut set = Self::new();
        for rect in bodies {
            if !set.insert(*rect) {
                continue;
            }
            let cropped = set
                .get_mut(rect)
                .map(|candidate| candidate.ensure_crop(source).map(|_| ()));
            if let Some(Err(e)) = cropped {
                log::warn!("Dropping candidate {rect}: {e}");
                set.remove(rect);
            }
        }
        set
    }

    /// Inserts a new candidate; returns `false` if the rect is already present.
    pub fn insert(&mut self, rect: Rect) -> bool {
        if self.index.contains_key(&rect) {
            return false;
        }
        self.index.insert(rect, self.candidates.len());
        self.candidates.push(BodyCandidate::new(rect));
        true
    }

    fn remove(&mut self, rect: &Rect) {
        if let Some(pos) = self.index.remove(rect) {
            self.candidates.remove(pos);
            for idx in self.index.values_mut() {
                if *idx > pos {
                    *idx -= 1;
                }
            }
        }
    }

    pub fn get(&self, rect: &Rect) -> Option<&BodyCandidate> {
        self.index.get(rect).map(|&i| &self.candidates[i])
    }

    pub fn get_mut(&mut self, rect: &Rect) -> Option<&mut BodyCandidate> {
        self.index.get(rect).map(|&i| &mut self.candidates[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &BodyCandidate> {
        self.candidates.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BodyCandidate> {
        self.candidates.iter_mut()
    }

    pub fn rects(&self) -> Vec<Rect> {
        self.candidates.iter().map(|c| c.rect).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(top: u32, right: u32, bottom: u32, left: u32) -> Rect {
        Rect::new(top, right, bottom, left)
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut set = CandidateSet::new();
        set.insert(rect(0, 50, 50, 0));
        set.insert(rect(0, 150, 50, 100));
        set.insert(rect(100, 50, 150, 0));
        assert_eq!(
            set.rects(),
            vec![rect(0, 50, 50, 0), rect(0, 150, 50, 100), rect(100, 50, 150, 0)]
        );
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut set = CandidateSet::new();
        assert!(set.insert(rect(0, 50, 50, 0)));
        assert!(!set.insert(rect(0, 50, 50, 0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_new_candidate_has_no_score_or_match() {
        let mut set = CandidateSet::new();
        set.insert(rect(0, 50, 50, 0));
        let candidate = set.get(&rect(0, 50, 50, 0)).unwrap();
        assert!(candidate.score().is_none());
        assert!(candidate.matched().is_none());
        assert!(candidate.crop().is_none());
    }

    #[test]
    fn test_ensure_crop_is_derived_once() {
        let source = Frame::filled(100, 100, 3, 10);
        let mut candidate = BodyCandidate::new(rect(10, 60, 40, 20));
        assert_eq!(candidate.ensure_crop(&source).unwrap().width(), 40);

        // A second call with a different source keeps the cached pixels.
        let other = Frame::filled(100, 100, 3, 250);
        assert_eq!(candidate.ensure_crop(&other).unwrap().pixel(0, 0), &[10, 10, 10]);
    }

    #[test]
    fn test_from_bodies_caches_crops_and_skips_outside_rects() {
        let source = Frame::filled(100, 100, 3, 0);
        let set = CandidateSet::from_bodies(
            &[rect(0, 50, 80, 0), rect(200, 300, 300, 200), rect(10, 90, 90, 60)],
            &source,
        );

        assert_eq!(set.rects(), vec![rect(0, 50, 80, 0), rect(10, 90, 90, 60)]);
        assert!(set.iter().all(|c| c.crop().is_some()));
        assert_eq!(set.get(&rect(10, 90, 90, 60)).unwrap().crop().unwrap().width(), 30);
    }

    #[test]
    fn test_crop_is_clipped_to_source() {
        let source = Frame::filled(100, 100, 3, 0);
        let set = CandidateSet::from_bodies(&[rect(50, 150, 150, 50)], &source);
        let crop = set.get(&rect(50, 150, 150, 50)).unwrap().crop().unwrap();
        assert_eq!((crop.width(), crop.height()), (50, 50));
    }
}

use crate::shared::rect::Rect;

/// A candidate key with its similarity score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankedEntry {
    pub rect: Rect,
    pub score: f64,
}

/// Candidates ordered ascending by score and consumed from the tail.
///
/// The sort is stable, so among equal scores the later-inserted entry sits
/// nearer the tail and is popped first. Popped entries are gone for good;
/// there is no way to push back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RankedQueue {
    entries: Vec<RankedEntry>,
}

impl RankedQueue {
    pub fn new(mut entries: Vec<RankedEntry>) -> Self {
        entries.sort_by(|a, b| a.score.total_cmp(&b.score));
        Self { entries }
    }

    /// Removes and returns the highest-scored remaining entry.
    pub fn pop(&mut self) -> Option<RankedEntry> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&RankedEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remaining entries, lowest score first.
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }
}

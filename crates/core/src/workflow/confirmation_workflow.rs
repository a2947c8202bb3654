use crate::candidates::ranked_queue::{RankedEntry, RankedQueue};
use crate::shared::error::RedactionError;
use crate::shared::rect::Rect;

/// Where a confirmation session currently stands.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowState {
    /// Nothing ranked yet.
    Idle,
    /// Queue populated, nothing shown.
    Ranked,
    /// `current` was popped and is awaiting a decision.
    Presenting(RankedEntry),
    /// Every candidate was shown and none confirmed.
    Exhausted,
    /// Terminal: the user confirmed this rect as the redaction target.
    Confirmed(Rect),
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "idle"),
            WorkflowState::Ranked => write!(f, "ranked"),
            WorkflowState::Presenting(entry) => write!(f, "presenting {}", entry.rect),
            WorkflowState::Exhausted => write!(f, "exhausted"),
            WorkflowState::Confirmed(rect) => write!(f, "confirmed {rect}"),
        }
    }
}

/// Walks a [`RankedQueue`] one candidate at a time, best score first.
///
/// A single user's linear sequence of decisions: every popped candidate is
/// either confirmed (ending the walk) or rejected for good. Misuse is
/// reported as [`RedactionError::InvalidStateTransition`].
#[derive(Clone, Debug)]
pub struct ConfirmationWorkflow {
    state: WorkflowState,
    queue: RankedQueue,
}

impl ConfirmationWorkflow {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            queue: RankedQueue::default(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Entries not yet presented, lowest score first.
    pub fn queue(&self) -> &RankedQueue {
        &self.queue
    }

    pub fn current(&self) -> Option<&RankedEntry> {
        match &self.state {
            WorkflowState::Presenting(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<Rect> {
        match self.state {
            WorkflowState::Confirmed(rect) => Some(rect),
            _ => None,
        }
    }

    /// Fails unless the workflow is `Idle`, naming `operation` in the error.
    pub fn require_idle(&self, operation: &'static str) -> Result<(), RedactionError> {
        if self.state != WorkflowState::Idle {
            return Err(self.invalid(operation));
        }
        Ok(())
    }

    /// Loads a freshly ranked queue. Valid only from `Idle`.
    pub fn start(&mut self, queue: RankedQueue) -> Result<(), RedactionError> {
        self.require_idle("start")?;
        log::debug!("Workflow ranked with {} candidates", queue.len());
        self.queue = queue;
        self.state = WorkflowState::Ranked;
        Ok(())
    }

    /// Presents the next-best candidate, or `None` once the queue runs dry.
    pub fn advance(&mut self) -> Result<Option<RankedEntry>, RedactionError> {
        match self.state {
            WorkflowState::Ranked | WorkflowState::Presenting(_) => {}
            _ => return Err(self.invalid("advance")),
        }

        match self.queue.pop() {
            Some(entry) => {
                log::debug!("Presenting {} (score {:.3})", entry.rect, entry.score);
                self.state = WorkflowState::Presenting(entry);
                Ok(Some(entry))
            }
            None => {
                log::debug!("No candidates left");
                self.state = WorkflowState::Exhausted;
                Ok(None)
            }
        }
    }

    /// Accepts the presented candidate as the redaction target.
    pub fn confirm(&mut self) -> Result<Rect, RedactionError> {
        let WorkflowState::Presenting(entry) = self.state else {
            return Err(self.invalid("confirm"));
        };
        log::info!("Confirmed {} as the redaction target", entry.rect);
        self.state = WorkflowState::Confirmed(entry.rect);
        Ok(entry.rect)
    }

    /// Discards the presented candidate and presents the next one.
    ///
    /// Returns the rejected entry alongside the next presentation.
    pub fn reject(&mut self) -> Result<(RankedEntry, Option<RankedEntry>), RedactionError> {
        let WorkflowState::Presenting(rejected) = self.state else {
            return Err(self.invalid("reject"));
        };
        log::debug!("Rejected {}", rejected.rect);
        let next = self.advance()?;
        Ok((rejected, next))
    }

    /// Drops the queue and returns to `Idle`, e.g. after new detections.
    pub fn reset(&mut self) {
        self.state = WorkflowState::Idle;
        self.queue = RankedQueue::default();
    }

    fn invalid(&self, operation: &'static str) -> RedactionError {
        log::error!("Invalid workflow transition: {operation} while {}", self.state);
        RedactionError::InvalidStateTransition {
            operation,
            state: self.state.to_string(),
        }
    }
}

impl Default for ConfirmationWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

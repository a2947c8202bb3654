use crate::candidates::candidate_set::CandidateSet;
use crate::candidates::similarity_ranker::SimilarityRanker;
use crate::detection::domain::candidate_matcher::match_bodies;
use crate::detection::domain::face_comparator::FaceComparator;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::redaction::domain::square_crop::{extract_bounded_square, SquareCrop};
use crate::redaction::domain::transparency_mask::transparency_mask;
use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::workflow::confirmation_workflow::{ConfirmationWorkflow, WorkflowState};

/// A candidate shown to the user for a decision.
#[derive(Clone, Debug, PartialEq)]
pub struct Presented {
    pub rect: Rect,
    pub score: f64,
    pub crop: Frame,
}

/// Everything one opt-out request works on, owned by the caller.
///
/// Holds the main image, the opt-out reference face, the detected
/// candidates, the confirmation workflow and the most recent redaction.
pub struct OptOutSession {
    main: Frame,
    reference: Option<Frame>,
    candidates: CandidateSet,
    workflow: ConfirmationWorkflow,
    output: Option<Frame>,
}

impl OptOutSession {
    pub fn new(main: Frame) -> Self {
        Self {
            main,
            reference: None,
            candidates: CandidateSet::new(),
            workflow: ConfirmationWorkflow::new(),
            output: None,
        }
    }

    pub fn main(&self) -> &Frame {
        &self.main
    }

    pub fn reference(&self) -> Option<&Frame> {
        self.reference.as_ref()
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn workflow(&self) -> &ConfirmationWorkflow {
        &self.workflow
    }

    pub fn state(&self) -> &WorkflowState {
        self.workflow.state()
    }

    /// The last redacted image, if [`redact`](Self::redact) has run.
    pub fn output(&self) -> Option<&Frame> {
        self.output.as_ref()
    }

    /// Sets the opt-out face. Any earlier ranking is discarded.
    pub fn set_reference(&mut self, reference: Frame) {
        self.reference = Some(reference);
        self.restart();
    }

    /// Detects faces and bodies in the main image and keeps the bodies that
    /// contain a face. Returns the number of candidates.
    pub fn find_candidates(
        &mut self,
        face_detector: &mut dyn FaceDetector,
        object_detector: &mut dyn ObjectDetector,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let faces = face_detector.detect(&self.main)?;
        let objects = object_detector.detect(&self.main)?;
        let bodies = match_bodies(&faces, &objects);

        self.candidates = CandidateSet::from_bodies(&bodies, &self.main);
        self.restart();
        log::info!(
            "Found {} candidates ({} faces, {} detections)",
            self.candidates.len(),
            faces.len(),
            objects.len()
        );
        Ok(self.candidates.len())
    }

    /// Scores every candidate against the reference and moves to `Ranked`.
    ///
    /// Returns the number of ranked candidates.
    pub fn rank(
        &mut self,
        comparator: &mut dyn FaceComparator,
        min_similarity: Option<f64>,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let reference = self.reference.as_ref().ok_or(RedactionError::MissingReference)?;
        self.workflow.require_idle("rank")?;

        let queue = SimilarityRanker::new(min_similarity).rank(
            &mut self.candidates,
            &self.main,
            reference,
            comparator,
        )?;
        let ranked = queue.len();
        self.workflow.start(queue)?;
        Ok(ranked)
    }

    /// Presents the next-best candidate; `None` once none are left.
    pub fn advance(&mut self) -> Result<Option<Presented>, RedactionError> {
        let entry = self.workflow.advance()?;
        entry.map(|e| self.present(e.rect, e.score)).transpose()
    }

    /// Confirms the presented candidate as the redaction target.
    pub fn confirm(&mut self) -> Result<Rect, RedactionError> {
        let rect = self.workflow.confirm()?;
        if let Some(candidate) = self.candidates.get_mut(&rect) {
            candidate.set_matched(true);
        }
        Ok(rect)
    }

    /// Rejects the presented candidate for good and presents the next one.
    pub fn reject(&mut self) -> Result<Option<Presented>, RedactionError> {
        let (rejected, next) = self.workflow.reject()?;
        if let Some(candidate) = self.candidates.get_mut(&rejected.rect) {
            candidate.set_matched(false);
        }
        next.map(|e| self.present(e.rect, e.score)).transpose()
    }

    /// The confirmed redaction target.
    pub fn target(&self) -> Option<Rect> {
        self.workflow.target()
    }

    /// Redacts the confirmed target in a copy of the main image.
    ///
    /// The result replaces any earlier output and is returned.
    pub fn redact(&mut self, redactor: &dyn RegionRedactor) -> Result<&Frame, RedactionError> {
        let target = self.target().ok_or(RedactionError::NoTarget)?;
        let mut output = self.main.clone();
        let region = redactor.redact(&mut output, &target)?;
        log::info!("Redacted {target} (composited {region})");
        Ok(self.output.insert(output))
    }

    /// RGBA mask of the main image's size, transparent over the target.
    pub fn transparency_mask(&self) -> Result<Frame, RedactionError> {
        let target = self.target().ok_or(RedactionError::NoTarget)?;
        transparency_mask(self.main.width(), self.main.height(), &target)
    }

    /// Square window of the main image around the target.
    pub fn target_square(&self, allowed_sizes: &[u32]) -> Result<SquareCrop, RedactionError> {
        let target = self.target().ok_or(RedactionError::NoTarget)?;
        extract_bounded_square(&self.main, &target, allowed_sizes)
    }

    fn present(&mut self, rect: Rect, score: f64) -> Result<Presented, RedactionError> {
        let crop = match self.candidates.get_mut(&rect) {
            Some(candidate) => candidate.ensure_crop(&self.main)?.clone(),
            None => self
                .main
                .crop(&rect.clip_to_bounds(self.main.width(), self.main.height())?),
        };
        Ok(Presented { rect, score, crop })
    }

    fn restart(&mut self) {
        self.workflow.reset();
        self.output = None;
        for candidate in self.candidates.iter_mut() {
            candidate.set_score(None);
            candidate.clear_matched();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_comparator::FaceComparison;
    use crate::detection::domain::object_detector::Detection;
    use crate::shared::constants::PERSON_LABEL;
    use approx::assert_relative_eq;

    // --- Stubs ---

    struct StubFaceDetector {
        faces: Vec<Rect>,
    }

    impl FaceDetector for StubFaceDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Rect>, Box<dyn std::error::Error>> {
            Ok(self.faces.clone())
        }
    }

    struct StubObjectDetector {
        objects: Vec<Detection>,
    }

    impl ObjectDetector for StubObjectDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            Ok(self.objects.clone())
        }
    }

    /// Matches by the crop's top-left marker byte.
    struct MarkerComparator {
        distances: Vec<(u8, f64)>,
    }

    impl FaceComparator for MarkerComparator {
        fn compare(
            &mut self,
            candidate: &Frame,
            _reference: &Frame,
        ) -> Result<FaceComparison, Box<dyn std::error::Error>> {
            let marker = candidate.data()[0];
            Ok(self
                .distances
                .iter()
                .find(|(m, _)| *m == marker)
                .map(|&(_, distance)| FaceComparison {
                    is_match: true,
                    distance,
                })
                .unwrap_or(FaceComparison::NO_FACE))
        }
    }

    struct FillRedactor;

    impl RegionRedactor for FillRedactor {
        fn redact(&self, frame: &mut Frame, target: &Rect) -> Result<Rect, RedactionError> {
            frame.paste(
                target,
                &Frame::filled(target.width(), target.height(), frame.channels(), 0),
            );
            Ok(*target)
        }
    }

    // --- Helpers ---

    /// Two people side by side: markers 1 (left) and 2 (right).
    fn two_people_session() -> OptOutSession {
        let mut main = Frame::filled(400, 200, 3, 200);
        main.paste(&Rect::new(0, 200, 200, 0), &Frame::filled(200, 200, 3, 1));
        main.paste(&Rect::new(0, 400, 200, 200), &Frame::filled(200, 200, 3, 2));

        let mut session = OptOutSession::new(main);
        let mut faces = StubFaceDetector {
            faces: vec![Rect::new(20, 120, 80, 60), Rect::new(20, 320, 80, 260)],
        };
        let mut objects = StubObjectDetector {
            objects: vec![
                Detection::new(Rect::new(0, 200, 200, 0), PERSON_LABEL, 0.9),
                Detection::new(Rect::new(0, 400, 200, 200), PERSON_LABEL, 0.9),
            ],
        };
        session.find_candidates(&mut faces, &mut objects).unwrap();
        session
    }

    fn comparator() -> MarkerComparator {
        MarkerComparator {
            distances: vec![(1, 0.4), (2, 0.1)],
        }
    }

    fn reference() -> Frame {
        Frame::filled(20, 20, 3, 9)
    }

    // --- Tests ---

    #[test]
    fn test_find_candidates_keeps_bodies_with_faces() {
        let session = two_people_session();
        assert_eq!(session.candidates().len(), 2);
        assert_eq!(session.state(), &WorkflowState::Idle);
    }

    #[test]
    fn test_rank_without_reference_is_missing_reference() {
        let mut session = two_people_session();
        let err = session.rank(&mut comparator(), None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RedactionError>(),
            Some(&RedactionError::MissingReference)
        );
    }

    #[test]
    fn test_rank_then_advance_presents_best_first() {
        let mut session = two_people_session();
        session.set_reference(reference());

        assert_eq!(session.rank(&mut comparator(), None).unwrap(), 2);
        assert_eq!(session.state(), &WorkflowState::Ranked);

        let first = session.advance().unwrap().unwrap();
        assert_eq!(first.rect, Rect::new(0, 400, 200, 200));
        assert_relative_eq!(first.score, 0.9);
        assert_eq!(first.crop.data()[0], 2);
    }

    #[test]
    fn test_rank_twice_is_invalid_transition() {
        let mut session = two_people_session();
        session.set_reference(reference());
        session.rank(&mut comparator(), None).unwrap();

        let err = session.rank(&mut comparator(), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RedactionError>(),
            Some(RedactionError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_reject_marks_candidate_and_presents_next() {
        let mut session = two_people_session();
        session.set_reference(reference());
        session.rank(&mut comparator(), None).unwrap();
        let first = session.advance().unwrap().unwrap();

        let next = session.reject().unwrap().unwrap();

        assert_eq!(next.rect, Rect::new(0, 200, 200, 0));
        assert_eq!(
            session.candidates().get(&first.rect).unwrap().matched(),
            Some(false)
        );
    }

    #[test]
    fn test_confirm_then_redact_only_changes_target() {
        let mut session = two_people_session();
        session.set_reference(reference());
        session.rank(&mut comparator(), None).unwrap();
        session.advance().unwrap();
        let target = session.confirm().unwrap();

        let output = session.redact(&FillRedactor).unwrap().clone();

        assert_eq!(session.candidates().get(&target).unwrap().matched(), Some(true));
        assert_eq!(output.pixel(300, 100), &[0, 0, 0]);
        assert_eq!(output.pixel(100, 100), &[1, 1, 1]);
        assert_eq!(session.main().pixel(300, 100), &[2, 2, 2]);
        assert_eq!(session.output(), Some(&output));
    }

    #[test]
    fn test_redact_before_confirmation_is_no_target() {
        let mut session = two_people_session();
        assert_eq!(
            session.redact(&FillRedactor).unwrap_err(),
            RedactionError::NoTarget
        );
        assert_eq!(session.transparency_mask().unwrap_err(), RedactionError::NoTarget);
    }

    #[test]
    fn test_transparency_mask_and_square_follow_target() {
        let mut session = two_people_session();
        session.set_reference(reference());
        session.rank(&mut comparator(), None).unwrap();
        session.advance().unwrap();
        session.confirm().unwrap();

        let mask = session.transparency_mask().unwrap();
        assert_eq!(mask.pixel(300, 100), &[255, 255, 255, 0]);
        assert_eq!(mask.pixel(100, 100), &[255, 255, 255, 255]);

        // A 200px body needs the 256 square, which does not fit a 200px tall image.
        let err = session.target_square(&[256, 512]).unwrap_err();
        assert!(matches!(err, RedactionError::CannotPosition { .. }));
        let square = session.target_square(&[200, 512]).unwrap();
        assert_eq!(square.rect, Rect::new(0, 400, 200, 200));
    }

    #[test]
    fn test_single_person_flow_ends_confirmed() {
        let mut session = OptOutSession::new(Frame::filled(300, 300, 3, 1));
        session.set_reference(reference());
        let mut faces = StubFaceDetector {
            faces: vec![Rect::new(50, 150, 150, 50)],
        };
        let mut objects = StubObjectDetector {
            objects: vec![Detection::new(Rect::new(0, 200, 200, 0), PERSON_LABEL, 0.8)],
        };
        let mut comparator = MarkerComparator {
            distances: vec![(1, 0.2)],
        };

        assert_eq!(session.find_candidates(&mut faces, &mut objects).unwrap(), 1);
        assert_eq!(session.rank(&mut comparator, None).unwrap(), 1);
        let presented = session.advance().unwrap().unwrap();
        assert_eq!(presented.rect, Rect::new(0, 200, 200, 0));
        assert_relative_eq!(presented.score, 0.8);

        assert_eq!(session.confirm().unwrap(), Rect::new(0, 200, 200, 0));
        assert_eq!(
            session.state(),
            &WorkflowState::Confirmed(Rect::new(0, 200, 200, 0))
        );
        assert!(matches!(
            session.advance().unwrap_err(),
            RedactionError::InvalidStateTransition { .. }
        ));
        assert!(matches!(
            session.confirm().unwrap_err(),
            RedactionError::InvalidStateTransition { .. }
        ));
    }

    #[test]
    fn test_min_similarity_narrows_queue() {
        let mut session = two_people_session();
        session.set_reference(reference());
        assert_eq!(session.rank(&mut comparator(), Some(0.8)).unwrap(), 1);
    }

    #[test]
    fn test_new_reference_discards_ranking() {
        let mut session = two_people_session();
        session.set_reference(reference());
        session.rank(&mut comparator(), None).unwrap();

        session.set_reference(reference());

        assert_eq!(session.state(), &WorkflowState::Idle);
        assert!(session.candidates().iter().all(|c| c.score().is_none()));
    }

    #[test]
    fn test_new_reference_forgets_confirmation() {
        let mut session = two_people_session();
        session.set_reference(reference());
        session.rank(&mut comparator(), None).unwrap();
        session.advance().unwrap();
        let confirmed = session.confirm().unwrap();

        session.set_reference(reference());

        assert_eq!(session.state(), &WorkflowState::Idle);
        assert_eq!(session.target(), None);
        assert_eq!(session.candidates().get(&confirmed).unwrap().matched(), None);
    }
}

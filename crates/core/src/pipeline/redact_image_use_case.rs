use std::path::{Path, PathBuf};

use crate::detection::domain::face_comparator::FaceComparator;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::media::domain::image_reader::ImageReader;
use crate::media::domain::image_writer::{thumbnail_size, ImageWriter};
use crate::pipeline::opt_out_session::{OptOutSession, Presented};
use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::annotation::draw_outline;
use crate::shared::constants::{CANDIDATE_THUMBNAIL_SIZE, DEFAULT_SQUARE_SIZES};
use crate::shared::rect::Rect;

const OUTLINE_COLOR: [u8; 3] = [0, 255, 0];
const OUTLINE_THICKNESS: u32 = 3;

/// The caller's answer for one presented candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Reject,
    /// Stop reviewing; nothing gets redacted.
    Stop,
}

/// What the caller sees when asked to decide.
pub struct Presentation<'a> {
    pub candidate: &'a Presented,
    /// 1-based position in presentation order.
    pub position: usize,
    pub total: usize,
    /// Saved thumbnail of the candidate crop, when a candidates dir is set.
    pub thumbnail: Option<&'a Path>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Redacted(Rect),
    /// No candidate was confirmed; the output is a copy of the input.
    NoMatch,
}

/// Optional side outputs of a run.
#[derive(Clone, Debug)]
pub struct ExtraOutputs {
    /// RGBA transparency mask over the redacted target.
    pub mask_path: Option<PathBuf>,
    /// Directory for candidate thumbnails and an annotated overview.
    pub candidates_dir: Option<PathBuf>,
    /// Smallest allowed square of the input image around the target.
    pub square_path: Option<PathBuf>,
    /// Square edge lengths to choose from, ascending.
    pub square_sizes: Vec<u32>,
}

impl Default for ExtraOutputs {
    fn default() -> Self {
        Self {
            mask_path: None,
            candidates_dir: None,
            square_path: None,
            square_sizes: DEFAULT_SQUARE_SIZES.to_vec(),
        }
    }
}

pub type DecisionFn = Box<dyn FnMut(&Presentation) -> Decision + Send>;

/// Single-image opt-out pipeline:
/// read → detect → match → rank → confirm → redact → write.
pub struct RedactImageUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    face_detector: Box<dyn FaceDetector>,
    object_detector: Box<dyn ObjectDetector>,
    comparator: Box<dyn FaceComparator>,
    redactor: Box<dyn RegionRedactor>,
    min_similarity: Option<f64>,
    decide: DecisionFn,
}

impl RedactImageUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        face_detector: Box<dyn FaceDetector>,
        object_detector: Box<dyn ObjectDetector>,
        comparator: Box<dyn FaceComparator>,
        redactor: Box<dyn RegionRedactor>,
        min_similarity: Option<f64>,
        decide: DecisionFn,
    ) -> Self {
        Self {
            reader,
            writer,
            face_detector,
            object_detector,
            comparator,
            redactor,
            min_similarity,
            decide,
        }
    }

    /// Redacts the person matching `reference_path` in `image_path`.
    ///
    /// The output image is always written: redacted when a candidate was
    /// confirmed, otherwise an unmodified copy of the input.
    pub fn execute(
        &mut self,
        image_path: &Path,
        reference_path: &Path,
        output_path: &Path,
        extras: &ExtraOutputs,
    ) -> Result<Outcome, Box<dyn std::error::Error>> {
        let main = self.reader.read(image_path)?;
        let reference = self.reader.read(reference_path)?;

        let mut session = OptOutSession::new(main);
        session.set_reference(reference);
        session.find_candidates(&mut *self.face_detector, &mut *self.object_detector)?;
        let total = session.rank(&mut *self.comparator, self.min_similarity)?;

        if let Some(dir) = &extras.candidates_dir {
            self.write_overview(&session, dir)?;
        }

        let mut next = session.advance()?;
        let mut position = 0;
        while let Some(candidate) = next {
            position += 1;
            let thumbnail = match &extras.candidates_dir {
                Some(dir) => Some(self.write_thumbnail(&candidate, position, dir)?),
                None => None,
            };
            let decision = (self.decide)(&Presentation {
                candidate: &candidate,
                position,
                total,
                thumbnail: thumbnail.as_deref(),
            });
            log::debug!("Decision for {}: {decision:?}", candidate.rect);

            next = match decision {
                Decision::Confirm => {
                    session.confirm()?;
                    None
                }
                Decision::Reject => session.reject()?,
                Decision::Stop => None,
            };
        }

        let Some(target) = session.target() else {
            log::info!("No candidate confirmed, writing the input unchanged");
            self.writer.write(output_path, session.main(), None)?;
            return Ok(Outcome::NoMatch);
        };

        // Fails before anything is written when the square cannot be placed.
        let square = match &extras.square_path {
            Some(path) => Some((path, session.target_square(&extras.square_sizes)?)),
            None => None,
        };

        let output = session.redact(&*self.redactor)?;
        self.writer.write(output_path, output, None)?;

        if let Some(mask_path) = &extras.mask_path {
            self.writer
                .write(mask_path, &session.transparency_mask()?, None)?;
        }
        if let Some((path, crop)) = square {
            log::info!("Square crop {} around {target}", crop.rect);
            self.writer.write(path, &crop.frame, None)?;
        }
        Ok(Outcome::Redacted(target))
    }

    fn write_thumbnail(
        &self,
        candidate: &Presented,
        position: usize,
        dir: &Path,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = dir.join(format!("candidate_{position}.jpg"));
        let size = thumbnail_size(
            candidate.crop.width(),
            candidate.crop.height(),
            CANDIDATE_THUMBNAIL_SIZE,
        );
        self.writer.write(&path, &candidate.crop, Some(size))?;
        Ok(path)
    }

    /// Main image with every candidate body outlined.
    fn write_overview(
        &self,
        session: &OptOutSession,
        dir: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut overview = session.main().clone();
        for rect in session.candidates().rects() {
            draw_outline(&mut overview, &rect, OUTLINE_COLOR, OUTLINE_THICKNESS);
        }
        self.writer.write(&dir.join("overview.jpg"), &overview, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_comparator::FaceComparison;
    use crate::detection::domain::object_detector::Detection;
    use crate::shared::constants::PERSON_LABEL;
    use crate::shared::error::RedactionError;
    use crate::shared::frame::Frame;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Serves the main image for `main.png` and the reference otherwise.
    struct StubReader {
        main: Frame,
    }

    impl ImageReader for StubReader {
        fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            if path == Path::new("main.png") {
                Ok(self.main.clone())
            } else {
                Ok(Frame::filled(10, 10, 3, 9))
            }
        }
    }

    type Written = Arc<Mutex<Vec<(PathBuf, Frame, Option<(u32, u32)>)>>>;

    struct RecordingWriter {
        written: Written,
    }

    impl ImageWriter for RecordingWriter {
        fn write(
            &self,
            path: &Path,
            frame: &Frame,
            size: Option<(u32, u32)>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.clone(), size));
            Ok(())
        }
    }

    struct StubFaceDetector;

    impl FaceDetector for StubFaceDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Rect>, Box<dyn std::error::Error>> {
            Ok(vec![Rect::new(10, 40, 40, 10), Rect::new(10, 140, 40, 110)])
        }
    }

    struct StubObjectDetector;

    impl ObjectDetector for StubObjectDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            Ok(vec![
                Detection::new(body(0), PERSON_LABEL, 0.9),
                Detection::new(body(100), PERSON_LABEL, 0.9),
                Detection::new(Rect::new(0, 300, 100, 200), "car", 0.9),
            ])
        }
    }

    /// Left body (marker 1) scores 0.6, right body (marker 2) scores 0.9.
    struct StubComparator;

    impl FaceComparator for StubComparator {
        fn compare(
            &mut self,
            candidate: &Frame,
            _reference: &Frame,
        ) -> Result<FaceComparison, Box<dyn std::error::Error>> {
            Ok(match candidate.data()[0] {
                1 => FaceComparison {
                    is_match: true,
                    distance: 0.4,
                },
                2 => FaceComparison {
                    is_match: true,
                    distance: 0.1,
                },
                _ => FaceComparison::NO_FACE,
            })
        }
    }

    struct ZeroRedactor;

    impl RegionRedactor for ZeroRedactor {
        fn redact(&self, frame: &mut Frame, target: &Rect) -> Result<Rect, RedactionError> {
            frame.paste(
                target,
                &Frame::filled(target.width(), target.height(), frame.channels(), 0),
            );
            Ok(*target)
        }
    }

    // --- Helpers ---

    fn body(left: u32) -> Rect {
        Rect::new(0, left + 100, 100, left)
    }

    fn main_image() -> Frame {
        let mut frame = Frame::filled(300, 100, 3, 200);
        frame.paste(&body(0), &Frame::filled(100, 100, 3, 1));
        frame.paste(&body(100), &Frame::filled(100, 100, 3, 2));
        frame
    }

    /// Answers from a script and records what was presented.
    fn scripted(
        decisions: &[Decision],
    ) -> (DecisionFn, Arc<Mutex<Vec<(Rect, usize, usize, Option<PathBuf>)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let mut script: VecDeque<Decision> = decisions.iter().copied().collect();
        let decide: DecisionFn = Box::new(move |p: &Presentation| {
            recorder.lock().unwrap().push((
                p.candidate.rect,
                p.position,
                p.total,
                p.thumbnail.map(Path::to_path_buf),
            ));
            script.pop_front().unwrap_or(Decision::Stop)
        });
        (decide, seen)
    }

    fn use_case(decide: DecisionFn) -> (RedactImageUseCase, Written) {
        let written: Written = Arc::new(Mutex::new(Vec::new()));
        let uc = RedactImageUseCase::new(
            Box::new(StubReader { main: main_image() }),
            Box::new(RecordingWriter {
                written: written.clone(),
            }),
            Box::new(StubFaceDetector),
            Box::new(StubObjectDetector),
            Box::new(StubComparator),
            Box::new(ZeroRedactor),
            None,
            decide,
        );
        (uc, written)
    }

    fn run(uc: &mut RedactImageUseCase, extras: &ExtraOutputs) -> Outcome {
        uc.execute(
            Path::new("main.png"),
            Path::new("ref.png"),
            Path::new("out.png"),
            extras,
        )
        .unwrap()
    }

    // --- Tests ---

    #[test]
    fn test_confirming_first_candidate_redacts_best_match() {
        let (decide, seen) = scripted(&[Decision::Confirm]);
        let (mut uc, written) = use_case(decide);

        let outcome = run(&mut uc, &ExtraOutputs::default());

        assert_eq!(outcome, Outcome::Redacted(body(100)));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!((seen[0].0, seen[0].1, seen[0].2), (body(100), 1, 2));

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        let (path, frame, _) = &written[0];
        assert_eq!(path, Path::new("out.png"));
        assert_eq!(frame.pixel(150, 50), &[0, 0, 0]);
        assert_eq!(frame.pixel(50, 50), &[1, 1, 1]);
    }

    #[test]
    fn test_reject_then_confirm_redacts_second_candidate() {
        let (decide, seen) = scripted(&[Decision::Reject, Decision::Confirm]);
        let (mut uc, written) = use_case(decide);

        let outcome = run(&mut uc, &ExtraOutputs::default());

        assert_eq!(outcome, Outcome::Redacted(body(0)));
        assert_eq!(seen.lock().unwrap()[1].1, 2);
        let written = written.lock().unwrap();
        assert_eq!(written[0].1.pixel(50, 50), &[0, 0, 0]);
        assert_eq!(written[0].1.pixel(150, 50), &[2, 2, 2]);
    }

    #[test]
    fn test_rejecting_everything_writes_input_unchanged() {
        let (decide, seen) = scripted(&[Decision::Reject, Decision::Reject]);
        let (mut uc, written) = use_case(decide);

        let outcome = run(&mut uc, &ExtraOutputs::default());

        assert_eq!(outcome, Outcome::NoMatch);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(written.lock().unwrap()[0].1, main_image());
    }

    #[test]
    fn test_stop_ends_review_without_redaction() {
        let (decide, seen) = scripted(&[Decision::Stop]);
        let (mut uc, written) = use_case(decide);

        assert_eq!(run(&mut uc, &ExtraOutputs::default()), Outcome::NoMatch);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(written.lock().unwrap()[0].1, main_image());
    }

    #[test]
    fn test_extras_write_mask_thumbnails_and_overview() {
        let (decide, seen) = scripted(&[Decision::Reject, Decision::Confirm]);
        let (mut uc, written) = use_case(decide);
        let extras = ExtraOutputs {
            mask_path: Some(PathBuf::from("mask.png")),
            candidates_dir: Some(PathBuf::from("cands")),
            ..ExtraOutputs::default()
        };

        run(&mut uc, &extras);

        let written = written.lock().unwrap();
        let paths: Vec<&Path> = written.iter().map(|(p, _, _)| p.as_path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("cands/overview.jpg"),
                Path::new("cands/candidate_1.jpg"),
                Path::new("cands/candidate_2.jpg"),
                Path::new("out.png"),
                Path::new("mask.png"),
            ]
        );

        let overview = &written[0].1;
        assert_eq!(overview.pixel(0, 50), &OUTLINE_COLOR);
        assert_eq!(overview.pixel(250, 50), &[200, 200, 200]);

        let (_, thumb, size) = &written[1];
        assert_eq!(thumb.data()[0], 2);
        assert_eq!(*size, Some((100, 100)));

        let mask = &written[4].1;
        assert_eq!(mask.channels(), 4);
        assert_eq!(mask.pixel(50, 50), &[255, 255, 255, 0]);
        assert_eq!(mask.pixel(150, 50), &[255, 255, 255, 255]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].3.as_deref(), Some(Path::new("cands/candidate_1.jpg")));
    }

    #[test]
    fn test_square_crop_of_input_is_written_after_output() {
        let (decide, _) = scripted(&[Decision::Reject, Decision::Confirm]);
        let (mut uc, written) = use_case(decide);
        let extras = ExtraOutputs {
            square_path: Some(PathBuf::from("square.png")),
            square_sizes: vec![100, 256],
            ..ExtraOutputs::default()
        };

        run(&mut uc, &extras);

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 2);
        let (path, square, _) = &written[1];
        assert_eq!(path, Path::new("square.png"));
        assert_eq!((square.width(), square.height()), (100, 100));
        // Taken from the input, so the confirmed body is still visible.
        assert_eq!(square.pixel(50, 50), &[1, 1, 1]);
    }

    #[test]
    fn test_unplaceable_square_fails_before_writing() {
        let (decide, _) = scripted(&[Decision::Confirm]);
        let (mut uc, written) = use_case(decide);
        let extras = ExtraOutputs {
            square_path: Some(PathBuf::from("square.png")),
            square_sizes: vec![256],
            ..ExtraOutputs::default()
        };

        let err = uc
            .execute(
                Path::new("main.png"),
                Path::new("ref.png"),
                Path::new("out.png"),
                &extras,
            )
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RedactionError>(),
            Some(RedactionError::CannotPosition { .. })
        ));
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_candidates_never_asks() {
        struct NoFaces;
        impl FaceDetector for NoFaces {
            fn detect(
                &mut self,
                _frame: &Frame,
            ) -> Result<Vec<Rect>, Box<dyn std::error::Error>> {
                Ok(Vec::new())
            }
        }

        let (decide, seen) = scripted(&[Decision::Confirm]);
        let (mut uc, _) = use_case(decide);
        uc.face_detector = Box::new(NoFaces);

        assert_eq!(run(&mut uc, &ExtraOutputs::default()), Outcome::NoMatch);
        assert!(seen.lock().unwrap().is_empty());
    }
}

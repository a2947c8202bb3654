use crate::detection::domain::object_detector::Detection;
use crate::shared::constants::PERSON_LABEL;
use crate::shared::rect::Rect;

/// Keeps the person detections that fully contain at least one face.
///
/// A bare person box carries no identity; intersecting with face boxes
/// narrows the set to bodies with a visible face. Detector order is
/// preserved and each body appears at most once, however many faces it
/// contains.
pub fn match_bodies(faces: &[Rect], objects: &[Detection]) -> Vec<Rect> {
    let bodies: Vec<Rect> = objects
        .iter()
        .filter(|d| d.label == PERSON_LABEL)
        .filter(|d| faces.iter().any(|face| d.rect.contains(face)))
        .map(|d| d.rect)
        .collect();

    log::debug!(
        "Matched {} of {} detections against {} faces",
        bodies.len(),
        objects.len(),
        faces.len()
    );
    bodies
}

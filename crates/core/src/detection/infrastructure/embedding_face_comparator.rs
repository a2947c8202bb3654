/// ArcFace embedding comparator using ONNX Runtime.
///
/// Finds the first face in each image with an injected detector, embeds
/// both crops and compares them by cosine similarity.
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::detection::domain::face_comparator::{FaceComparator, FaceComparison};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

use super::onnx_session::load_session;

pub const DEFAULT_THRESHOLD: f64 = 0.4;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct EmbeddingFaceComparator {
    session: ort::session::Session,
    detector: Box<dyn FaceDetector>,
    threshold: f64,
    /// The reference is the same for every candidate; keep its embedding.
    reference_cache: Option<(u64, Option<Vec<f32>>)>,
}

impl EmbeddingFaceComparator {
    pub fn new(
        model_path: &Path,
        detector: Box<dyn FaceDetector>,
        threshold: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
            detector,
            threshold,
            reference_cache: None,
        })
    }

    fn embed(&mut self, crop: &Frame) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    /// Embedding of the first detected face, or `None` when there is none.
    fn embed_first_face(
        &mut self,
        image: &Frame,
    ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
        let faces = self.detector.detect(image)?;
        let Some(face) = faces
            .first()
            .and_then(|f| f.clip_to_bounds(image.width(), image.height()).ok())
        else {
            return Ok(None);
        };
        let crop = image.crop(&face);
        self.embed(&crop).map(Some)
    }

    fn reference_embedding(
        &mut self,
        reference: &Frame,
    ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
        let key = fingerprint(reference);
        if let Some((cached_key, embedding)) = &self.reference_cache {
            if *cached_key == key {
                return Ok(embedding.clone());
            }
        }
        let embedding = self.embed_first_face(reference)?;
        if embedding.is_none() {
            log::warn!("No face found in the reference image");
        }
        self.reference_cache = Some((key, embedding.clone()));
        Ok(embedding)
    }
}

impl FaceComparator for EmbeddingFaceComparator {
    fn compare(
        &mut self,
        candidate: &Frame,
        reference: &Frame,
    ) -> Result<FaceComparison, Box<dyn std::error::Error>> {
        let Some(reference_embedding) = self.reference_embedding(reference)? else {
            return Ok(FaceComparison::NO_FACE);
        };
        let Some(candidate_embedding) = self.embed_first_face(candidate)? else {
            log::debug!("No face found in candidate crop");
            return Ok(FaceComparison::NO_FACE);
        };
        let similarity = cosine_similarity(&candidate_embedding, &reference_embedding);
        Ok(comparison_from_similarity(similarity, self.threshold))
    }
}

/// `distance = max(0, 1 - similarity)`; a match needs `similarity >= threshold`.
fn comparison_from_similarity(similarity: f64, threshold: f64) -> FaceComparison {
    FaceComparison {
        is_match: similarity >= threshold,
        distance: (1.0 - similarity).max(0.0),
    }
}

fn fingerprint(frame: &Frame) -> u64 {
    let mut hasher = DefaultHasher::new();
    (frame.width(), frame.height(), frame.channels()).hash(&mut hasher);
    frame.data().hash(&mut hasher);
    hasher.finish()
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;
    let channels = crop.channels() as usize;
    let data = crop.data();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    if src_w == 0 || src_h == 0 || channels < 3 {
        return tensor;
    }

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * channels;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product of L2-normalized vectors equals cosine similarity.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum()
}

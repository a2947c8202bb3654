pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// COCO person detector; users supply this file themselves.
pub const PERSON_MODEL_NAME: &str = "yolov8n.onnx";

/// Directory name used under the platform config and cache roots.
pub const APP_DIR_NAME: &str = "OptOut";

/// Object-detector label that marks a body candidate.
pub const PERSON_LABEL: &str = "person";

/// Square crop sizes offered to downstream consumers, ascending.
pub const DEFAULT_SQUARE_SIZES: &[u32] = &[256, 512, 1024];

/// Thumbnail edge length for saved candidate crops.
pub const CANDIDATE_THUMBNAIL_SIZE: u32 = 256;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

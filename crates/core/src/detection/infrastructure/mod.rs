pub mod embedding_face_comparator;
pub mod math;
pub mod onnx_person_detector;
pub mod onnx_session;
pub mod onnx_yolo_detector;
pub mod yolo;

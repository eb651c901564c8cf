mod nms;
pub mod onnx_person_detector;

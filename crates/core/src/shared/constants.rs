pub const PERSON_MODEL_NAME: &str = "yolov8n.onnx";
pub const POSE_MODEL_NAME: &str = "pose_landmark_full.onnx";

/// Pixels added on every side of a detected box before cropping for pose.
pub const DEFAULT_CROP_MARGIN: u32 = 10;

/// Identity given to every person result; no cross-frame tracking is done.
pub const PLACEHOLDER_PERSON_ID: u32 = 0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

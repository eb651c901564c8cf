pub mod landmark;
pub mod landmark_estimator;
pub mod remap;

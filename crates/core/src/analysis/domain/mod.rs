pub mod biomechanics_analyzer;
pub mod geometry;
pub mod spine_metrics;

pub mod analysis_config;
pub mod analyze_frame_use_case;
pub mod frame_result;
pub mod infrastructure;
pub mod pipeline_logger;

mod canvas;
pub mod skeleton_renderer;
mod stress_map;

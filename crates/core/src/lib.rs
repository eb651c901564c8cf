pub mod analysis;
pub mod detection;
pub mod imaging;
pub mod narrative;
pub mod pipeline;
pub mod pose;
pub mod records;
pub mod rendering;
pub mod shared;

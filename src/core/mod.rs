pub mod benchmark_store;
pub mod engine;
pub mod parser;
pub mod probe;
pub mod ratio;

pub use crate::domain::model::{
    BenchmarkDataset, BenchmarkEntry, DetectedDevice, Platform, RatioReport, RatioResult,
};
pub use crate::domain::ports::{ConfigProvider, GpuProbe};
pub use crate::utils::error::Result;

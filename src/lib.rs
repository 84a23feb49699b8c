pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::toml_config::TomlConfig;

pub use crate::core::{
    benchmark_store::BenchmarkStore,
    engine::RelPerfEngine,
    probe::{PlatformProbe, UnixProbe, UnsupportedProbe, WindowsProbe},
};
pub use crate::domain::model::{
    BenchmarkDataset, BenchmarkEntry, DetectedDevice, RatioReport, RatioResult,
};
pub use crate::utils::error::{RelPerfError, Result};

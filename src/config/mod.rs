pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::benchmark_store::{default_cache_path, DEFAULT_ENDPOINT};
#[cfg(feature = "cli")]
use crate::core::probe::default_windows_dirs;
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::time::Duration;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "gpurelperf")]
#[command(about = "Relative performance of the NVIDIA GPUs in this machine")]
pub struct CliConfig {
    /// Benchmark database URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Cached benchmark file (default: cur_bench.json next to the executable)
    #[arg(long)]
    pub cache_path: Option<PathBuf>,

    /// Refetch the benchmark file once it is older than this
    #[arg(long, default_value = "720")]
    pub max_age_hours: u64,

    #[arg(long, default_value = "60")]
    pub fetch_timeout_secs: u64,

    /// Deadline for `nvidia-smi --list-gpus`
    #[arg(long, default_value = "30")]
    pub tool_timeout_secs: u64,

    /// Read settings from a TOML file instead of the flags above
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }

    fn max_age_hours(&self) -> u64 {
        self.max_age_hours
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    fn windows_search_dirs(&self) -> Vec<PathBuf> {
        default_windows_dirs()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_endpoint("endpoint", &self.endpoint)?;
        if let Some(path) = &self.cache_path {
            validation::validate_cache_path("cache_path", path)?;
        }
        validation::validate_at_least("max_age_hours", self.max_age_hours, 1)?;
        validation::validate_at_least("fetch_timeout_secs", self.fetch_timeout_secs, 1)?;
        validation::validate_at_least("tool_timeout_secs", self.tool_timeout_secs, 1)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_uses_defaults() {
        let config = CliConfig::parse_from(["gpurelperf"]);
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.max_age_hours(), 720);
        assert_eq!(config.tool_timeout(), Duration::from_secs(30));
        assert!(config.cache_path().ends_with("cur_bench.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_age() {
        let config = CliConfig::parse_from(["gpurelperf", "--max-age-hours", "0"]);
        assert!(config.validate().is_err());
    }
}

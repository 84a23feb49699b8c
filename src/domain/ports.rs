use crate::domain::model::Platform;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Platform specific access to the NVIDIA system management tool.
#[async_trait]
pub trait GpuProbe: Send + Sync {
    fn platform(&self) -> Platform;

    fn locate_tool(&self) -> Result<PathBuf>;

    /// Runs `<tool> --list-gpus` and returns its standard output.
    async fn list_devices(&self, tool: &Path) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn endpoint(&self) -> &str;
    fn cache_path(&self) -> PathBuf;
    fn max_age_hours(&self) -> u64;
    fn fetch_timeout(&self) -> Duration;
    fn tool_timeout(&self) -> Duration;
    fn windows_search_dirs(&self) -> Vec<PathBuf>;
}

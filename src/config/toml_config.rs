use crate::core::benchmark_store::{default_cache_path, DEFAULT_ENDPOINT, DEFAULT_MAX_AGE_HOURS};
use crate::core::probe::{default_windows_dirs, DEFAULT_TOOL_TIMEOUT};
use crate::core::ConfigProvider;
use crate::utils::error::{RelPerfError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 60;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub benchmark: BenchmarkSection,
    #[serde(default)]
    pub probe: ProbeSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkSection {
    pub endpoint: Option<String>,
    pub cache_path: Option<PathBuf>,
    pub max_age_hours: Option<u64>,
    pub fetch_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeSection {
    pub tool_timeout_seconds: Option<u64>,
    pub windows_search_dirs: Option<Vec<PathBuf>>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RelPerfError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| RelPerfError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BENCH_CACHE}); unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl ConfigProvider for TomlConfig {
    fn endpoint(&self) -> &str {
        self.benchmark.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn cache_path(&self) -> PathBuf {
        self.benchmark
            .cache_path
            .clone()
            .unwrap_or_else(default_cache_path)
    }

    fn max_age_hours(&self) -> u64 {
        self.benchmark.max_age_hours.unwrap_or(DEFAULT_MAX_AGE_HOURS)
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(
            self.benchmark
                .fetch_timeout_seconds
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECONDS),
        )
    }

    fn tool_timeout(&self) -> Duration {
        self.probe
            .tool_timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOOL_TIMEOUT)
    }

    fn windows_search_dirs(&self) -> Vec<PathBuf> {
        self.probe
            .windows_search_dirs
            .clone()
            .unwrap_or_else(default_windows_dirs)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_endpoint("benchmark.endpoint", self.endpoint())?;
        if let Some(path) = &self.benchmark.cache_path {
            validation::validate_cache_path("benchmark.cache_path", path)?;
        }
        if let Some(hours) = self.benchmark.max_age_hours {
            validation::validate_at_least("benchmark.max_age_hours", hours, 1)?;
        }
        if let Some(secs) = self.benchmark.fetch_timeout_seconds {
            validation::validate_at_least("benchmark.fetch_timeout_seconds", secs, 1)?;
        }
        if let Some(secs) = self.probe.tool_timeout_seconds {
            validation::validate_at_least("probe.tool_timeout_seconds", secs, 1)?;
        }
        if let Some(dirs) = &self.probe.windows_search_dirs {
            if dirs.is_empty() {
                return Err(RelPerfError::InvalidConfigValueError {
                    field: "probe.windows_search_dirs".to_string(),
                    value: "[]".to_string(),
                    reason: "At least one directory is required".to_string(),
                });
            }
        }
        Ok(())
    }
}

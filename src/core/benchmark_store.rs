use crate::domain::model::{BenchmarkDataset, BenchmarkEntry};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{RelPerfError, Result};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;

pub const DEFAULT_ENDPOINT: &str = "https://browser.geekbench.com/cuda-benchmarks.json";
pub const CACHE_FILENAME: &str = "cur_bench.json";
/// 30 days.
pub const DEFAULT_MAX_AGE_HOURS: u64 = 24 * 30;

#[derive(Debug, Deserialize)]
struct RawDocument {
    devices: Vec<RawDevice>,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    name: String,
    score: serde_json::Number,
}

#[derive(Debug, Serialize)]
struct CacheDocument<'a> {
    devices: &'a [BenchmarkEntry],
}

/// Owns the cached copy of the benchmark database.
///
/// The age of the cache is the age of the file itself (its mtime), so
/// touching the file resets the clock.
pub struct BenchmarkStore {
    client: Client,
    endpoint: String,
    cache_path: PathBuf,
    max_age_hours: u64,
}

impl BenchmarkStore {
    pub fn new(
        endpoint: impl Into<String>,
        cache_path: impl Into<PathBuf>,
        max_age_hours: u64,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            cache_path: cache_path.into(),
            max_age_hours,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.endpoint(),
            config.cache_path(),
            config.max_age_hours(),
            config.fetch_timeout(),
        )
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Refreshes the cache if it is missing or older than `max_age_hours`,
    /// then loads it.
    pub async fn ensure_fresh(&self) -> Result<BenchmarkDataset> {
        tracing::info!("Fetching benchmarks...");

        match self.cache_age_hours()? {
            None => {
                tracing::info!("\tNo cached benchmarks at {}", self.cache_path.display());
                self.fetch().await?;
            }
            Some(age) => {
                tracing::info!("\tFile exists and was last modified {} hours ago", age);
                if age > self.max_age_hours {
                    tracing::warn!("\tNeed to fetch benchmarks again, as they are old.");
                    self.fetch().await?;
                } else {
                    tracing::info!("\tFile age is within bounds, not fetching again.");
                }
            }
        }

        self.load_cache().await
    }

    /// Whole hours since the cache was last written, rounded to nearest.
    /// `None` when there is no cache file.
    pub fn cache_age_hours(&self) -> Result<Option<u64>> {
        let metadata = match std::fs::metadata(&self.cache_path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let modified = metadata.modified()?;
        // A timestamp in the future counts as brand new.
        let elapsed = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        Ok(Some((elapsed.as_secs_f64() / 3600.0).round() as u64))
    }

    /// Streams the remote document into the cache file. The body is written
    /// next to the cache first and renamed over it once complete.
    pub async fn fetch(&self) -> Result<()> {
        tracing::info!("Fetching benchmark data from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!("Benchmark response status: {}", response.status());

        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let partial = self.partial_path();
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut written = 0usize;

        let mut stream = response.bytes_stream();
        let streamed = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len();
            }
            file.flush().await?;
            Ok::<(), RelPerfError>(())
        }
        .await;

        drop(file);
        if let Err(e) = streamed {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        tokio::fs::rename(&partial, &self.cache_path).await?;
        tracing::info!(
            "Saved {} bytes of benchmark data to {}",
            written,
            self.cache_path.display()
        );
        Ok(())
    }

    /// Reads the cache file; `fetched_at` is its mtime.
    pub async fn load_cache(&self) -> Result<BenchmarkDataset> {
        tracing::info!("Parsing benchmarks");

        let bytes = tokio::fs::read(&self.cache_path).await?;
        let modified = tokio::fs::metadata(&self.cache_path).await?.modified()?;
        let dataset = Self::load(&bytes, DateTime::<Utc>::from(modified))?;

        match (dataset.best(), dataset.worst()) {
            (Some(best), Some(worst)) => {
                tracing::info!(
                    "Current Best/Worst among {} cards (as of {}):",
                    dataset.len(),
                    dataset.fetched_at().format("%Y-%m-%d %H:%M UTC")
                );
                tracing::info!("\tBest card: {}: {}", best.name, best.score);
                tracing::info!("\tWorst card: {}: {}", worst.name, worst.score);
            }
            _ => tracing::warn!("Benchmark dataset contains no devices"),
        }

        Ok(dataset)
    }

    /// Writes a dataset in the same shape as the remote document.
    pub async fn persist(&self, dataset: &BenchmarkDataset) -> Result<()> {
        let entries = dataset.entries();
        let body = serde_json::to_vec_pretty(&CacheDocument { devices: &entries }).map_err(
            |e| RelPerfError::ParseError {
                message: format!("could not serialize dataset: {}", e),
            },
        )?;
        tokio::fs::write(&self.cache_path, body).await?;
        Ok(())
    }

    /// Parses `{"devices": [{"name": ..., "score": ...}, ...]}`.
    pub fn load(bytes: &[u8], fetched_at: DateTime<Utc>) -> Result<BenchmarkDataset> {
        let document: RawDocument =
            serde_json::from_slice(bytes).map_err(|e| RelPerfError::ParseError {
                message: e.to_string(),
            })?;

        let entries = document
            .devices
            .into_iter()
            .map(|device| -> Result<BenchmarkEntry> {
                let score = integer_score(&device)?;
                Ok(BenchmarkEntry {
                    name: device.name,
                    score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BenchmarkDataset::from_entries(entries, fetched_at))
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self
            .cache_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| CACHE_FILENAME.into());
        name.push(".part");
        self.cache_path.with_file_name(name)
    }
}

/// Non-negative integer scores as-is, non-negative fractional ones truncated.
fn integer_score(device: &RawDevice) -> Result<u64> {
    if let Some(score) = device.score.as_u64() {
        return Ok(score);
    }

    match device.score.as_f64() {
        Some(score) if score.is_finite() && score >= 0.0 => Ok(score.trunc() as u64),
        _ => Err(RelPerfError::ParseError {
            message: format!("invalid score {} for device {:?}", device.score, device.name),
        }),
    }
}

/// `cur_bench.json` next to the running executable, falling back to the
/// working directory.
pub fn default_cache_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_FILENAME)
}

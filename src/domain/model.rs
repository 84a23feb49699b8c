use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the benchmark database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub name: String,
    pub score: u64,
}

/// Name to score mapping loaded from a single snapshot of the benchmark
/// database. Immutable once built.
#[derive(Debug, Clone)]
pub struct BenchmarkDataset {
    scores: HashMap<String, u64>,
    fetched_at: DateTime<Utc>,
}

impl BenchmarkDataset {
    /// Later entries with the same name replace earlier ones.
    pub fn from_entries<I>(entries: I, fetched_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = BenchmarkEntry>,
    {
        let scores = entries
            .into_iter()
            .map(|entry| (entry.name, entry.score))
            .collect();
        Self { scores, fetched_at }
    }

    pub fn score(&self, name: &str) -> Option<u64> {
        self.scores.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Entries sorted by name, so serializing the same dataset twice gives the same bytes.
    pub fn entries(&self) -> Vec<BenchmarkEntry> {
        let mut entries: Vec<BenchmarkEntry> = self
            .scores
            .iter()
            .map(|(name, score)| BenchmarkEntry {
                name: name.clone(),
                score: *score,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Highest scoring card. Ties go to the lexically smallest name.
    pub fn best(&self) -> Option<BenchmarkEntry> {
        self.entries()
            .into_iter()
            .min_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)))
    }

    /// Lowest scoring card. Ties go to the lexically smallest name.
    pub fn worst(&self) -> Option<BenchmarkEntry> {
        self.entries()
            .into_iter()
            .min_by(|a, b| a.score.cmp(&b.score).then_with(|| a.name.cmp(&b.name)))
    }
}

/// A single line of `nvidia-smi --list-gpus` output and the name found on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedDevice {
    pub raw_line: String,
    pub extracted_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioResult {
    pub name: String,
    pub score: u64,
    pub ratio: f64,
}

/// Results of one run, in detection order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioReport {
    pub results: Vec<RatioResult>,
}

impl RatioReport {
    pub fn new(results: Vec<RatioResult>) -> Self {
        Self { results }
    }

    pub fn ratios(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.ratio).collect()
    }

    pub fn min_score(&self) -> Option<u64> {
        self.results.iter().map(|r| r.score).min()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
    MacOs,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            _ => Platform::Unix,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Unix => write!(f, "Unix-like"),
            Platform::Windows => write!(f, "Windows"),
            Platform::MacOs => write!(f, "macOS"),
        }
    }
}

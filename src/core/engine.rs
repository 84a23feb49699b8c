use crate::core::benchmark_store::BenchmarkStore;
use crate::core::parser;
use crate::core::ratio;
use crate::domain::model::RatioReport;
use crate::domain::ports::GpuProbe;
use crate::utils::error::Result;

/// Runs refresh, probe, parse and ratio computation in that order. The first
/// failing stage ends the run.
pub struct RelPerfEngine<P: GpuProbe> {
    store: BenchmarkStore,
    probe: P,
}

impl<P: GpuProbe> RelPerfEngine<P> {
    pub fn new(store: BenchmarkStore, probe: P) -> Self {
        Self { store, probe }
    }

    pub async fn run(&self) -> Result<RatioReport> {
        tracing::info!("Starting relative performance run");

        let dataset = self.store.ensure_fresh().await?;
        tracing::info!("Loaded {} benchmark entries", dataset.len());

        let tool = self.probe.locate_tool()?;
        tracing::debug!("Using {}", tool.display());

        let raw = self.probe.list_devices(&tool).await?;
        let names = parser::extract_names(&raw)?;
        tracing::info!("Detected {} devices", names.len());
        if names.is_empty() {
            tracing::warn!("nvidia-smi reported no devices");
        }

        let results = ratio::compute_ratios(&names, &dataset)?;
        Ok(RatioReport::new(results))
    }
}

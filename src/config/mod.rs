use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Known engine names accepted by `[bench].engine`.
pub const ENGINE_NAMES: &[&str] = &["duckdb", "datafusion", "polars", "ballista"];

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub datagen: DatagenConfig,
    #[serde(default)]
    pub bench: BenchConfig,
    #[serde(default)]
    pub engines: EnginesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatagenConfig {
    /// TPC-H scale factor (roughly the dataset size in GB).
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Directory containing the compiled `dbgen` binary and its `dists.dss`.
    #[serde(default = "default_dbgen_dir")]
    pub dbgen_dir: String,
    /// Output directory for the Parquet dataset.
    #[serde(default = "default_output_dir")]
    pub output: String,
    /// Base piece count; per-table counts are derived from this
    /// (lineitem 10x, supplier 1/100th, nation/region always 1).
    #[serde(default = "default_piece_base")]
    pub piece_base: usize,
    /// Maximum concurrent dbgen/convert workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Check piece counts after generation.
    #[serde(default = "default_true")]
    pub validate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BenchConfig {
    /// Path to the generated Parquet dataset.
    #[serde(default = "default_output_dir")]
    pub data_path: String,
    /// Engine to benchmark.
    #[serde(default = "default_engine")]
    pub engine: String,
    /// CSV file timing rows are appended to.
    #[serde(default = "default_timings_file")]
    pub timings_file: String,
    /// Directory of dbgen reference answers (`q<n>.out`). When set, query
    /// output is compared against them. Only meaningful at scale factor 1.
    pub answers_dir: Option<String>,
    /// Run each query once untimed before the timed run.
    #[serde(default = "default_true")]
    pub io_warmup: bool,
    /// Timed runs per query; each is logged separately.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EnginesConfig {
    /// Ballista scheduler URL, e.g. "df://localhost:50050".
    pub ballista_scheduler: Option<String>,
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_dbgen_dir() -> String {
    "tpch-dbgen".to_string()
}

fn default_output_dir() -> String {
    "tables_scale_1".to_string()
}

fn default_piece_base() -> usize {
    8
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| (n.get() / 2).max(1))
        .unwrap_or(1)
}

fn default_true() -> bool {
    true
}

fn default_engine() -> String {
    "duckdb".to_string()
}

fn default_timings_file() -> String {
    "time.csv".to_string()
}

fn default_iterations() -> usize {
    1
}

impl Default for DatagenConfig {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            dbgen_dir: default_dbgen_dir(),
            output: default_output_dir(),
            piece_base: default_piece_base(),
            workers: default_workers(),
            validate: true,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_path: default_output_dir(),
            engine: default_engine(),
            timings_file: default_timings_file(),
            answers_dir: None,
            io_warmup: true,
            iterations: default_iterations(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional file plus environment variables.
    ///
    /// Environment variables use the `TPCHBENCH_` prefix with `_`-separated
    /// paths, e.g. `TPCHBENCH_BENCH_ENGINE=polars`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TPCHBENCH")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.datagen.scale_factor <= 0.0 {
            anyhow::bail!(
                "Scale factor must be positive, got {}",
                self.datagen.scale_factor
            );
        }
        if self.datagen.piece_base == 0 {
            anyhow::bail!("Piece base must be at least 1");
        }
        if self.datagen.workers == 0 {
            anyhow::bail!("Worker count must be at least 1");
        }
        if !ENGINE_NAMES.contains(&self.bench.engine.as_str()) {
            anyhow::bail!(
                "Unknown engine '{}', expected one of: {}",
                self.bench.engine,
                ENGINE_NAMES.join(", ")
            );
        }
        if self.bench.iterations == 0 {
            anyhow::bail!("Iterations must be at least 1");
        }
        Ok(())
    }
}

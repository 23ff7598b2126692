use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tpchbench::config::AppConfig;
use tpchbench::queries::parse_query_list;
use tpchbench::timings::TimingsLog;
use tpchbench::{engines, BenchRunner, Dataset, RunnerOptions};

#[derive(Parser)]
#[command(name = "tpch-bench", about = "Run the TPC-H query sweep against an engine")]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<String>,

    /// Path to the generated Parquet dataset
    #[arg(long, short = 'p')]
    path: Option<String>,

    /// Engine to benchmark (duckdb, datafusion, polars, ballista)
    #[arg(long, short = 'e')]
    engine: Option<String>,

    /// Comma-separated query numbers, e.g. "1,6,22" (default: all 22)
    #[arg(long, short = 'q')]
    queries: Option<String>,

    /// Timed runs per query
    #[arg(long)]
    iterations: Option<usize>,

    /// Skip the untimed warm-up run
    #[arg(long)]
    no_io_warmup: bool,

    /// CSV file timing rows are appended to
    #[arg(long)]
    timings_file: Option<String>,

    /// Directory of dbgen reference answers to verify against (SF 1 only)
    #[arg(long)]
    answers_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tpchbench::telemetry::init_tracing();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.path {
        config.bench.data_path = path;
    }
    if let Some(engine) = cli.engine {
        config.bench.engine = engine;
    }
    if let Some(iterations) = cli.iterations {
        config.bench.iterations = iterations;
    }
    if cli.no_io_warmup {
        config.bench.io_warmup = false;
    }
    if let Some(timings) = cli.timings_file {
        config.bench.timings_file = timings;
    }
    if let Some(answers) = cli.answers_dir {
        config.bench.answers_dir = Some(answers);
    }
    config.validate()?;

    let query_numbers = parse_query_list(cli.queries.as_deref())?;

    let dataset = Dataset::new(&config.bench.data_path);
    if !dataset.root().is_dir() {
        anyhow::bail!(
            "Dataset directory {} not found; run tpch-datagen first",
            dataset.root().display()
        );
    }

    let engine = engines::create(&config.bench.engine, &config.engines)?;
    let timings = TimingsLog::new(&config.bench.timings_file);
    let options = RunnerOptions {
        io_warmup: config.bench.io_warmup,
        iterations: config.bench.iterations,
        answers_dir: config.bench.answers_dir.as_ref().map(PathBuf::from),
    };

    let runner = BenchRunner::new(engine, dataset, timings, options);
    let reports = runner.run(&query_numbers).await?;

    let failed = reports.iter().filter(|r| !r.success).count();
    let mismatched = reports
        .iter()
        .filter(|r| r.verified == Some(false))
        .count();
    if failed > 0 || mismatched > 0 {
        tracing::warn!("{} queries failed, {} mismatched", failed, mismatched);
        std::process::exit(1);
    }

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use tpchbench::config::AppConfig;
use tpchbench::datagen::{Datagen, DatagenOptions};

#[derive(Parser)]
#[command(name = "tpch-datagen", about = "Generate the TPC-H Parquet dataset")]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<String>,

    /// Scale factor (roughly the dataset size in GB)
    #[arg(long, short = 's')]
    scale_factor: Option<f64>,

    /// Output directory for the dataset
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Directory containing the compiled dbgen binary
    #[arg(long)]
    dbgen_dir: Option<String>,

    /// Base piece count for the Parquet layout
    #[arg(long)]
    pieces: Option<usize>,

    /// Maximum concurrent generator workers
    #[arg(long)]
    workers: Option<usize>,

    /// Skip post-generation piece-count validation
    #[arg(long)]
    no_validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tpchbench::telemetry::init_tracing();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(sf) = cli.scale_factor {
        config.datagen.scale_factor = sf;
    }
    if let Some(output) = cli.output {
        config.datagen.output = output;
    }
    if let Some(dir) = cli.dbgen_dir {
        config.datagen.dbgen_dir = dir;
    }
    if let Some(pieces) = cli.pieces {
        config.datagen.piece_base = pieces;
    }
    if let Some(workers) = cli.workers {
        config.datagen.workers = workers;
    }
    if cli.no_validate {
        config.datagen.validate = false;
    }
    config.validate()?;

    tracing::info!(
        "Generating TPC-H dataset at scale factor {} into {}",
        config.datagen.scale_factor,
        config.datagen.output
    );

    let datagen = Datagen::new(DatagenOptions::from_config(&config.datagen));
    let summary = datagen.generate().await?;

    tracing::info!(
        "Generated {} tables ({} pieces, {} rows) in {:.2?}",
        summary.tables,
        summary.pieces,
        summary.rows,
        summary.duration
    );

    Ok(())
}

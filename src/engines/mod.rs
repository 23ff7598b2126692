//! The wrapped query engines.
//!
//! Every engine loads the tables a query needs straight from the Parquet
//! dataset and executes the query wholly inside the wrapped library; this
//! crate only dispatches, times, and converts results. Engines convert
//! their output into [`AnswerTable`](crate::answers::AnswerTable) with
//! their own Arrow (or AnyValue) accessors; duckdb and datafusion bundle
//! different arrow-rs majors, so their batch types do not unify.

mod datafusion;
mod duckdb;
mod polars;

#[cfg(feature = "ballista")]
mod ballista;

pub use self::datafusion::DataFusionEngine;
pub use self::duckdb::DuckDbEngine;
pub use self::polars::PolarsEngine;

#[cfg(feature = "ballista")]
pub use self::ballista::BallistaEngine;

use crate::answers::AnswerTable;
use crate::config::EnginesConfig;
use crate::queries::TpchQuery;
use crate::schema::Dataset;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a wrapped engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to open or reach the engine
    #[error("connection failed: {0}")]
    Connection(String),

    /// Query execution failed inside the engine
    #[error("query failed: {0}")]
    Execution(String),

    /// Engine output could not be converted to the neutral result form
    #[error("result conversion failed: {0}")]
    Conversion(String),

    /// The engine has no implementation for this query
    #[error("query {0} is not supported by this engine")]
    Unsupported(u8),
}

/// A third-party engine the harness can benchmark.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Short engine name, used as the `solution` column of the timings log.
    fn name(&self) -> &'static str;

    /// Version of the wrapped library.
    fn version(&self) -> String;

    /// Execute one catalog query against the dataset and materialize the
    /// result. Loading the query's tables is part of the run, mirroring a
    /// cold analytical round trip.
    async fn run(&self, query: &TpchQuery, dataset: &Dataset) -> Result<AnswerTable, EngineError>;
}

/// Construct an engine by name.
pub fn create(name: &str, config: &EnginesConfig) -> Result<Box<dyn QueryEngine>> {
    match name {
        "duckdb" => Ok(Box::new(DuckDbEngine::new())),
        "datafusion" => Ok(Box::new(DataFusionEngine::new())),
        "polars" => Ok(Box::new(PolarsEngine::new())),
        #[cfg(feature = "ballista")]
        "ballista" => {
            let scheduler = config.ballista_scheduler.as_deref().ok_or_else(|| {
                anyhow::anyhow!("ballista engine requires [engines].ballista_scheduler")
            })?;
            Ok(Box::new(BallistaEngine::new(scheduler)))
        }
        #[cfg(not(feature = "ballista"))]
        "ballista" => {
            let _ = config;
            anyhow::bail!("this build does not include the 'ballista' feature")
        }
        other => anyhow::bail!("unknown engine '{}'", other),
    }
}

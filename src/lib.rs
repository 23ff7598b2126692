pub mod answers;
pub mod config;
pub mod datagen;
pub mod engines;
pub mod queries;
pub mod runner;
pub mod schema;
pub mod telemetry;
pub mod timings;

pub use runner::{BenchRunner, QueryReport, RunnerOptions};
pub use schema::{Dataset, TpchTable};

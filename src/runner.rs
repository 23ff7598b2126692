//! Benchmark sweep: dispatch queries to an engine, time them, log timings,
//! and optionally verify output against reference answers.

use crate::answers::{self, AnswerTable};
use crate::engines::{EngineError, QueryEngine};
use crate::queries::{self, TpchQuery};
use crate::schema::Dataset;
use crate::timings::TimingsLog;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Options controlling a sweep.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Run each query once untimed first, so the timed run measures the
    /// engine rather than cold page cache.
    pub io_warmup: bool,
    /// Timed runs per query; every run is logged.
    pub iterations: usize,
    /// Reference answers to verify against (scale factor 1 only).
    pub answers_dir: Option<PathBuf>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            io_warmup: true,
            iterations: 1,
            answers_dir: None,
        }
    }
}

/// Outcome of one query in the sweep (the last timed run when iterating).
#[derive(Debug)]
pub struct QueryReport {
    pub query_no: u8,
    pub duration: Duration,
    pub rows: usize,
    pub success: bool,
    /// Set when reference verification ran.
    pub verified: Option<bool>,
    pub detail: Option<String>,
}

/// Drives one engine through a list of catalog queries.
pub struct BenchRunner {
    engine: Box<dyn QueryEngine>,
    dataset: Dataset,
    timings: TimingsLog,
    options: RunnerOptions,
}

impl BenchRunner {
    pub fn new(
        engine: Box<dyn QueryEngine>,
        dataset: Dataset,
        timings: TimingsLog,
        options: RunnerOptions,
    ) -> Self {
        Self {
            engine,
            dataset,
            timings,
            options,
        }
    }

    /// Run the sweep. A failing query is logged with duration 0 and
    /// `success=false` and the sweep continues.
    pub async fn run(&self, query_numbers: &[u8]) -> Result<Vec<QueryReport>> {
        let solution = self.engine.name();
        let version = self.engine.version();
        info!(
            "Benchmarking {} {} against {}",
            solution,
            version,
            self.dataset.root().display()
        );

        let sweep_start = Instant::now();
        let mut reports = Vec::with_capacity(query_numbers.len());

        println!();
        println!(
            "{:<8} {:>12} {:>10}   {}",
            "Query", "Time (ms)", "Rows", "Status"
        );
        println!("{}", "-".repeat(50));

        for &number in query_numbers {
            let query = queries::query(number)
                .with_context(|| format!("No such query q{}", number))?;

            if self.options.io_warmup {
                if let Err(e) = self.engine.run(query, &self.dataset).await {
                    warn!("q{} warm-up failed: {}", number, e);
                }
            }

            let mut report = QueryReport {
                query_no: number,
                duration: Duration::ZERO,
                rows: 0,
                success: false,
                verified: None,
                detail: None,
            };

            for _ in 0..self.options.iterations.max(1) {
                report = self.run_once(query).await;
                self.timings.append(
                    solution,
                    &version,
                    number,
                    report.duration.as_secs_f64(),
                    report.success,
                )?;
            }

            let status = match (&report.success, &report.verified) {
                (true, Some(true)) => "OK (verified)".to_string(),
                (true, Some(false)) => {
                    format!("MISMATCH: {}", report.detail.as_deref().unwrap_or(""))
                }
                (true, None) => "OK".to_string(),
                (false, _) => format!("FAIL: {}", report.detail.as_deref().unwrap_or("unknown")),
            };

            println!(
                "{:<8} {:>12.2} {:>10}   {}",
                format!("q{}", number),
                report.duration.as_secs_f64() * 1000.0,
                report.rows,
                status
            );

            reports.push(report);
        }

        let total: Duration = reports.iter().map(|r| r.duration).sum();
        let succeeded = reports.iter().filter(|r| r.success).count();
        println!("{}", "-".repeat(50));
        println!(
            "Total query time: {:.3}s ({}/{} queries succeeded) in {:.3}s wall clock",
            total.as_secs_f64(),
            succeeded,
            reports.len(),
            sweep_start.elapsed().as_secs_f64()
        );
        println!();

        Ok(reports)
    }

    async fn run_once(&self, query: &TpchQuery) -> QueryReport {
        let start = Instant::now();
        match self.engine.run(query, &self.dataset).await {
            Ok(table) => {
                let duration = start.elapsed();
                let (verified, detail) = self.verify(query, &table);
                QueryReport {
                    query_no: query.number,
                    duration,
                    rows: table.num_rows(),
                    success: true,
                    verified,
                    detail,
                }
            }
            Err(e) => {
                // unsupported and failed queries log a zero duration so the
                // timings file distinguishes them from fast successes
                if !matches!(e, EngineError::Unsupported(_)) {
                    warn!("q{} failed: {}", query.number, e);
                }
                QueryReport {
                    query_no: query.number,
                    duration: Duration::ZERO,
                    rows: 0,
                    success: false,
                    verified: None,
                    detail: Some(e.to_string()),
                }
            }
        }
    }

    /// Compare against the reference answer when configured. Verification
    /// failures do not flip the timing row's success flag; the timing is
    /// still a valid measurement.
    fn verify(&self, query: &TpchQuery, table: &AnswerTable) -> (Option<bool>, Option<String>) {
        let Some(dir) = &self.options.answers_dir else {
            return (None, None);
        };

        let expected = match answers::load_reference(dir, query.number) {
            Ok(expected) => expected,
            Err(e) => {
                warn!("q{}: no usable reference answer: {}", query.number, e);
                return (None, Some(e.to_string()));
            }
        };

        match answers::compare(table, &expected) {
            Ok(()) => (Some(true), None),
            Err(mismatch) => {
                warn!("q{} output mismatch: {}", query.number, mismatch);
                (Some(false), Some(mismatch.to_string()))
            }
        }
    }
}

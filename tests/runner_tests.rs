//! Sweep-level tests: timing log shape, failure continuation, and
//! reference verification wiring.

mod common;

use std::path::PathBuf;
use tpchbench::config::EnginesConfig;
use tpchbench::engines;
use tpchbench::timings::TimingsLog;
use tpchbench::{BenchRunner, RunnerOptions};

#[tokio::test]
async fn test_sweep_logs_timings() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());
    let timings_path = dir.path().join("time.csv");

    let engine = engines::create("duckdb", &EnginesConfig::default()).unwrap();
    let runner = BenchRunner::new(
        engine,
        dataset,
        TimingsLog::new(&timings_path),
        RunnerOptions {
            io_warmup: false,
            ..Default::default()
        },
    );

    let reports = runner.run(&[1, 6]).await.unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.success));
    assert_eq!(reports[0].rows, 3);
    assert_eq!(reports[1].rows, 1);

    let content = std::fs::read_to_string(&timings_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "solution,version,query_no,duration[s],success");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("duckdb,"));
    assert!(lines[1].ends_with(",true"));
}

#[tokio::test]
async fn test_sweep_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());
    let timings_path = dir.path().join("time.csv");

    // polars has no q8 implementation
    let engine = engines::create("polars", &EnginesConfig::default()).unwrap();
    let runner = BenchRunner::new(
        engine,
        dataset,
        TimingsLog::new(&timings_path),
        RunnerOptions {
            io_warmup: false,
            ..Default::default()
        },
    );

    let reports = runner.run(&[8, 1]).await.unwrap();
    assert_eq!(reports.len(), 2);

    assert!(!reports[0].success);
    assert_eq!(reports[0].duration.as_secs_f64(), 0.0);
    assert!(reports[0].detail.as_deref().unwrap().contains("not supported"));

    assert!(reports[1].success);
    assert_eq!(reports[1].rows, 3);

    let content = std::fs::read_to_string(&timings_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains(",8,0,false"));
    assert!(lines[2].ends_with(",true"));
}

#[tokio::test]
async fn test_sweep_verifies_against_reference_answers() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());

    let answers_dir = dir.path().join("answers");
    std::fs::create_dir(&answers_dir).unwrap();
    std::fs::write(answers_dir.join("q6.out"), "revenue\n60.00\n").unwrap();
    // deliberately wrong row count
    std::fs::write(answers_dir.join("q5.out"), "n_name|revenue\nFRANCE|1.0\n").unwrap();

    let engine = engines::create("duckdb", &EnginesConfig::default()).unwrap();
    let runner = BenchRunner::new(
        engine,
        dataset,
        TimingsLog::new(dir.path().join("time.csv")),
        RunnerOptions {
            io_warmup: false,
            iterations: 1,
            answers_dir: Some(PathBuf::from(&answers_dir)),
        },
    );

    let reports = runner.run(&[6, 5]).await.unwrap();

    assert_eq!(reports[0].verified, Some(true));

    // execution succeeded, verification did not
    assert!(reports[1].success);
    assert_eq!(reports[1].verified, Some(false));
    assert!(reports[1].detail.as_deref().unwrap().contains("row count"));
}

#[tokio::test]
async fn test_iterations_log_every_run() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());
    let timings_path = dir.path().join("time.csv");

    let engine = engines::create("datafusion", &EnginesConfig::default()).unwrap();
    let runner = BenchRunner::new(
        engine,
        dataset,
        TimingsLog::new(&timings_path),
        RunnerOptions {
            io_warmup: false,
            iterations: 3,
            answers_dir: None,
        },
    );

    runner.run(&[6]).await.unwrap();

    let content = std::fs::read_to_string(&timings_path).unwrap();
    // header plus one row per iteration
    assert_eq!(content.lines().count(), 4);
}

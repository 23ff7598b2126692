//! Cross-engine tests over the miniature dataset.
//!
//! The same catalog query must produce the same table from every engine,
//! and the hand-checkable queries must produce the hand-computed answers.

mod common;

use tpchbench::answers::{compare, AnswerTable, Cell};
use tpchbench::config::EnginesConfig;
use tpchbench::engines::{self, EngineError, QueryEngine};
use tpchbench::queries;
use tpchbench::Dataset;

fn all_engines() -> Vec<Box<dyn QueryEngine>> {
    let config = EnginesConfig::default();
    ["duckdb", "datafusion", "polars"]
        .iter()
        .map(|name| engines::create(name, &config).unwrap())
        .collect()
}

async fn run_query(engine: &dyn QueryEngine, number: u8, dataset: &Dataset) -> AnswerTable {
    let query = queries::query(number).unwrap();
    engine
        .run(query, dataset)
        .await
        .unwrap_or_else(|e| panic!("{} q{} failed: {}", engine.name(), number, e))
}

fn number(n: f64) -> Cell {
    Cell::Number(n)
}

fn text(t: &str) -> Cell {
    Cell::Text(t.to_string())
}

#[tokio::test]
async fn test_q6_hand_computed_answer() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());

    let expected = AnswerTable {
        columns: vec!["revenue".into()],
        rows: vec![vec![number(60.0)]],
    };

    for engine in all_engines() {
        let table = run_query(engine.as_ref(), 6, &dataset).await;
        compare(&table, &expected)
            .unwrap_or_else(|m| panic!("{} q6 mismatch: {}", engine.name(), m));
    }
}

#[tokio::test]
async fn test_q3_hand_computed_answer() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());

    let expected = AnswerTable {
        columns: vec![
            "l_orderkey".into(),
            "revenue".into(),
            "o_orderdate".into(),
            "o_shippriority".into(),
        ],
        rows: vec![vec![number(1.0), number(100.0), text("1995-03-01"), number(0.0)]],
    };

    for engine in all_engines() {
        let table = run_query(engine.as_ref(), 3, &dataset).await;
        compare(&table, &expected)
            .unwrap_or_else(|m| panic!("{} q3 mismatch: {}", engine.name(), m));
    }
}

#[tokio::test]
async fn test_q1_hand_computed_answer() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());

    let expected = AnswerTable {
        columns: vec![
            "l_returnflag".into(),
            "l_linestatus".into(),
            "sum_qty".into(),
            "sum_base_price".into(),
            "sum_disc_price".into(),
            "sum_charge".into(),
            "avg_qty".into(),
            "avg_price".into(),
            "avg_disc".into(),
            "count_order".into(),
        ],
        rows: vec![
            vec![
                text("A"),
                text("F"),
                number(5.0),
                number(200.0),
                number(190.0),
                number(199.5),
                number(5.0),
                number(200.0),
                number(0.05),
                number(1.0),
            ],
            vec![
                text("N"),
                text("O"),
                number(44.0),
                number(1600.0),
                number(1510.0),
                number(1557.0),
                number(44.0 / 3.0),
                number(1600.0 / 3.0),
                number(0.04),
                number(3.0),
            ],
            vec![
                text("R"),
                text("F"),
                number(20.0),
                number(800.0),
                number(720.0),
                number(734.4),
                number(20.0),
                number(800.0),
                number(0.1),
                number(1.0),
            ],
        ],
    };

    for engine in all_engines() {
        let table = run_query(engine.as_ref(), 1, &dataset).await;
        compare(&table, &expected)
            .unwrap_or_else(|m| panic!("{} q1 mismatch: {}", engine.name(), m));
    }
}

#[tokio::test]
async fn test_engines_agree_on_polars_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());

    let config = EnginesConfig::default();
    let duckdb = engines::create("duckdb", &config).unwrap();
    let datafusion = engines::create("datafusion", &config).unwrap();
    let polars = engines::create("polars", &config).unwrap();

    for number in 1..=7u8 {
        let reference = run_query(duckdb.as_ref(), number, &dataset).await;
        for other in [datafusion.as_ref(), polars.as_ref()] {
            let table = run_query(other, number, &dataset).await;
            compare(&table, &reference).unwrap_or_else(|m| {
                panic!("{} disagrees with duckdb on q{}: {}", other.name(), number, m)
            });
        }
    }
}

#[tokio::test]
async fn test_sql_engines_run_full_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());

    let config = EnginesConfig::default();
    for name in ["duckdb", "datafusion"] {
        let engine = engines::create(name, &config).unwrap();
        for query in &queries::QUERIES {
            let result = engine.run(query, &dataset).await;
            assert!(
                result.is_ok(),
                "{} q{} failed: {}",
                name,
                query.number,
                result.err().unwrap()
            );
        }
    }
}

#[tokio::test]
async fn test_polars_reports_unsupported_queries() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = common::build_dataset(dir.path());

    let config = EnginesConfig::default();
    let polars = engines::create("polars", &config).unwrap();

    for number in 8..=22u8 {
        let query = queries::query(number).unwrap();
        match polars.run(query, &dataset).await {
            Err(EngineError::Unsupported(n)) => assert_eq!(n, number),
            other => panic!("expected unsupported for q{}, got {:?}", number, other.map(|t| t.num_rows())),
        }
    }
}

#[tokio::test]
async fn test_engine_versions_are_reported() {
    for engine in all_engines() {
        let version = engine.version();
        assert!(!version.is_empty());
        assert_ne!(version, "unknown", "{} version lookup failed", engine.name());
    }
}

//! DuckDB engine: SQL over Parquet views on an in-memory database.

use crate::answers::{date32_to_iso, AnswerTable, Cell};
use crate::engines::{EngineError, QueryEngine};
use crate::queries::TpchQuery;
use crate::schema::Dataset;
use async_trait::async_trait;
use duckdb::arrow::array::{
    Array, BooleanArray, Date32Array, Decimal128Array, Float32Array, Float64Array, Int32Array,
    Int64Array, LargeStringArray, StringArray,
};
use duckdb::arrow::datatypes::DataType;
use duckdb::arrow::record_batch::RecordBatch;
use duckdb::Connection;

pub struct DuckDbEngine;

impl DuckDbEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DuckDbEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryEngine for DuckDbEngine {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn version(&self) -> String {
        Connection::open_in_memory()
            .and_then(|conn| conn.query_row("SELECT version()", [], |row| row.get(0)))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    async fn run(&self, query: &TpchQuery, dataset: &Dataset) -> Result<AnswerTable, EngineError> {
        let sql = query.sql.to_string();
        let views: Vec<String> = query
            .tables
            .iter()
            .map(|&table| view_sql(table.name(), &dataset.scan_pattern(table)))
            .collect();

        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_in_memory()
                .map_err(|e| EngineError::Connection(e.to_string()))?;

            for view in &views {
                conn.execute_batch(view)
                    .map_err(|e| EngineError::Connection(e.to_string()))?;
            }

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| EngineError::Execution(e.to_string()))?;
            let arrow = stmt
                .query_arrow([])
                .map_err(|e| EngineError::Execution(e.to_string()))?;

            let schema = arrow.get_schema();
            let columns: Vec<String> = schema
                .fields()
                .iter()
                .map(|f| f.name().to_string())
                .collect();

            let mut table = AnswerTable {
                columns,
                rows: Vec::new(),
            };
            for batch in arrow {
                append_batch(&mut table, &batch)?;
            }
            Ok(table)
        })
        .await
        .map_err(|e| EngineError::Execution(format!("worker failed: {}", e)))?
    }
}

fn view_sql(name: &str, scan_pattern: &str) -> String {
    format!(
        "CREATE VIEW {} AS SELECT * FROM read_parquet('{}')",
        name,
        scan_pattern.replace('\'', "''")
    )
}

fn append_batch(table: &mut AnswerTable, batch: &RecordBatch) -> Result<(), EngineError> {
    let start = table.rows.len();
    table
        .rows
        .extend(std::iter::repeat_with(Vec::new).take(batch.num_rows()));

    for column in batch.columns() {
        let cells = column_cells(column.as_ref())?;
        for (i, cell) in cells.into_iter().enumerate() {
            table.rows[start + i].push(cell);
        }
    }
    Ok(())
}

/// Convert one result column into cells. DuckDB surfaces integer sums as
/// HUGEINT, which arrives here as a decimal.
fn column_cells(array: &dyn Array) -> Result<Vec<Cell>, EngineError> {
    let n = array.len();
    let mut cells = Vec::with_capacity(n);

    macro_rules! numeric {
        ($arr:ty) => {{
            let typed = array.as_any().downcast_ref::<$arr>().unwrap();
            for i in 0..n {
                cells.push(if typed.is_null(i) {
                    Cell::Null
                } else {
                    Cell::Number(typed.value(i) as f64)
                });
            }
        }};
    }

    match array.data_type() {
        DataType::Int32 => numeric!(Int32Array),
        DataType::Int64 => numeric!(Int64Array),
        DataType::Float32 => numeric!(Float32Array),
        DataType::Float64 => numeric!(Float64Array),
        DataType::Decimal128(_, scale) => {
            let typed = array.as_any().downcast_ref::<Decimal128Array>().unwrap();
            let divisor = 10f64.powi(*scale as i32);
            for i in 0..n {
                cells.push(if typed.is_null(i) {
                    Cell::Null
                } else {
                    Cell::Number(typed.value(i) as f64 / divisor)
                });
            }
        }
        DataType::Utf8 => {
            let typed = array.as_any().downcast_ref::<StringArray>().unwrap();
            for i in 0..n {
                cells.push(if typed.is_null(i) {
                    Cell::Null
                } else {
                    Cell::Text(typed.value(i).to_string())
                });
            }
        }
        DataType::LargeUtf8 => {
            let typed = array.as_any().downcast_ref::<LargeStringArray>().unwrap();
            for i in 0..n {
                cells.push(if typed.is_null(i) {
                    Cell::Null
                } else {
                    Cell::Text(typed.value(i).to_string())
                });
            }
        }
        DataType::Date32 => {
            let typed = array.as_any().downcast_ref::<Date32Array>().unwrap();
            for i in 0..n {
                cells.push(if typed.is_null(i) {
                    Cell::Null
                } else {
                    Cell::Text(date32_to_iso(typed.value(i)))
                });
            }
        }
        DataType::Boolean => {
            let typed = array.as_any().downcast_ref::<BooleanArray>().unwrap();
            for i in 0..n {
                cells.push(if typed.is_null(i) {
                    Cell::Null
                } else {
                    Cell::Text(typed.value(i).to_string())
                });
            }
        }
        other => {
            return Err(EngineError::Conversion(format!(
                "unhandled duckdb result type {:?}",
                other
            )))
        }
    }
    Ok(cells)
}

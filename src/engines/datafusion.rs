//! DataFusion engine: SQL on a fresh `SessionContext` per run.

use crate::answers::{AnswerTable, Cell};
use crate::engines::{EngineError, QueryEngine};
use crate::queries::TpchQuery;
use crate::schema::Dataset;
use async_trait::async_trait;
use datafusion::arrow::array::{Array, Float64Array, StringArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::prelude::*;

pub struct DataFusionEngine;

impl DataFusionEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DataFusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryEngine for DataFusionEngine {
    fn name(&self) -> &'static str {
        "datafusion"
    }

    fn version(&self) -> String {
        datafusion::DATAFUSION_VERSION.to_string()
    }

    async fn run(&self, query: &TpchQuery, dataset: &Dataset) -> Result<AnswerTable, EngineError> {
        let ctx = SessionContext::new();

        for &table in query.tables {
            let path = dataset.table_path(table);
            // listing directories need the trailing separator
            let location = if path.is_dir() {
                format!("{}/", path.display())
            } else {
                path.display().to_string()
            };
            ctx.register_parquet(table.name(), &location, ParquetReadOptions::default())
                .await
                .map_err(|e| EngineError::Connection(e.to_string()))?;
        }

        let df = ctx
            .sql(query.sql)
            .await
            .map_err(|e| EngineError::Execution(e.to_string()))?;

        let columns: Vec<String> = df
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();

        let batches = df
            .collect()
            .await
            .map_err(|e| EngineError::Execution(e.to_string()))?;

        batches_to_table(columns, &batches)
    }
}

pub(crate) fn batches_to_table(
    columns: Vec<String>,
    batches: &[RecordBatch],
) -> Result<AnswerTable, EngineError> {
    let mut table = AnswerTable {
        columns,
        rows: Vec::new(),
    };

    for batch in batches {
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
    }
    Ok(table)
}

/// Convert one result column into cells by casting: numerics to `Float64`,
/// everything else to `Utf8` (dates render as ISO text, which is the
/// neutral form).
fn column_cells(array: &dyn Array) -> Result<Vec<Cell>, EngineError> {
    let n = array.len();
    let mut cells = Vec::with_capacity(n);

    if is_numeric(array.data_type()) {
        let casted = cast(array, &DataType::Float64)
            .map_err(|e| EngineError::Conversion(e.to_string()))?;
        let typed = casted.as_any().downcast_ref::<Float64Array>().unwrap();
        for i in 0..n {
            cells.push(if typed.is_null(i) {
                Cell::Null
            } else {
                Cell::Number(typed.value(i))
            });
        }
    } else {
        let casted = cast(array, &DataType::Utf8)
            .map_err(|e| EngineError::Conversion(e.to_string()))?;
        let typed = casted.as_any().downcast_ref::<StringArray>().unwrap();
        for i in 0..n {
            cells.push(if typed.is_null(i) {
                Cell::Null
            } else {
                Cell::Text(typed.value(i).to_string())
            });
        }
    }
    Ok(cells)
}

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::{Date32Array, Int64Array};
    use datafusion::arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_batches_to_table_mixed_types() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("k", DataType::Int64, false),
            Field::new("d", DataType::Date32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![7])),
                Arc::new(Date32Array::from(vec![9568])),
            ],
        )
        .unwrap();

        let table = batches_to_table(vec!["k".into(), "d".into()], &[batch]).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Cell::Number(7.0));
        assert_eq!(table.rows[0][1], Cell::Text("1996-03-13".to_string()));
    }

    #[test]
    fn test_empty_result_keeps_columns() {
        let table = batches_to_table(vec!["a".into()], &[]).unwrap();
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 1);
    }
}

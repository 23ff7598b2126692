//! Ballista engine: the SQL catalog executed on a remote scheduler.
//!
//! Ballista extends the DataFusion `SessionContext`, so registration and
//! result handling are shared with the in-process DataFusion engine. The
//! dataset path must be visible to the executors.

use crate::answers::AnswerTable;
use crate::engines::{EngineError, QueryEngine};
use crate::queries::TpchQuery;
use crate::schema::Dataset;
use async_trait::async_trait;
use ballista::prelude::*;
use datafusion::prelude::{ParquetReadOptions, SessionContext};

pub struct BallistaEngine {
    scheduler_url: String,
}

impl BallistaEngine {
    pub fn new(scheduler_url: impl Into<String>) -> Self {
        Self {
            scheduler_url: scheduler_url.into(),
        }
    }
}

#[async_trait]
impl QueryEngine for BallistaEngine {
    fn name(&self) -> &'static str {
        "ballista"
    }

    fn version(&self) -> String {
        datafusion::DATAFUSION_VERSION.to_string()
    }

    async fn run(&self, query: &TpchQuery, dataset: &Dataset) -> Result<AnswerTable, EngineError> {
        let ctx = SessionContext::remote(&self.scheduler_url)
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;

        for &table in query.tables {
            let path = dataset.table_path(table);
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

        super::datafusion::batches_to_table(columns, &batches)
    }
}

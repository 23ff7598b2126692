//! Streaming Parquet writer for generated table pieces

use datafusion::arrow::datatypes::Schema;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::parquet::arrow::ArrowWriter;
use datafusion::parquet::basic::Compression;
use datafusion::parquet::file::properties::{WriterProperties, WriterVersion};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::datagen::DatagenError;

/// Configuration for parquet file writing.
#[derive(Debug, Clone)]
pub struct ParquetConfig {
    pub max_row_group_size: usize,
}

impl Default for ParquetConfig {
    fn default() -> Self {
        Self {
            max_row_group_size: 100_000,
        }
    }
}

fn writer_properties(config: &ParquetConfig) -> WriterProperties {
    WriterProperties::builder()
        .set_writer_version(WriterVersion::PARQUET_2_0)
        .set_compression(Compression::LZ4)
        .set_max_row_group_size(config.max_row_group_size)
        .build()
}

/// Streaming Parquet writer that writes batches incrementally to disk.
///
/// Lifecycle: new(path) -> init(schema) -> write_batch()* -> close()
pub struct StreamingParquetWriter {
    path: PathBuf,
    config: ParquetConfig,
    writer: Option<ArrowWriter<File>>,
    row_count: usize,
}

impl StreamingParquetWriter {
    /// Create a new writer that will write to the given path.
    /// Call `init()` before writing batches.
    pub fn new(path: PathBuf) -> Self {
        Self::with_config(path, ParquetConfig::default())
    }

    pub fn with_config(path: PathBuf, config: ParquetConfig) -> Self {
        Self {
            path,
            config,
            writer: None,
            row_count: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn init(&mut self, schema: &Schema) -> Result<(), DatagenError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatagenError::Storage(format!("Failed to create directory: {}", e))
            })?;
        }

        let file = File::create(&self.path)
            .map_err(|e| DatagenError::Storage(format!("Failed to create file: {}", e)))?;

        let props = writer_properties(&self.config);
        let writer = ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props))
            .map_err(|e| DatagenError::Storage(e.to_string()))?;

        self.writer = Some(writer);
        Ok(())
    }

    pub fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), DatagenError> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            DatagenError::Storage("Writer not initialized - call init() first".into())
        })?;

        self.row_count += batch.num_rows();

        writer
            .write(batch)
            .map_err(|e| DatagenError::Storage(e.to_string()))
    }

    /// Finish the file and return the number of rows written.
    pub fn close(mut self) -> Result<usize, DatagenError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| DatagenError::Storage("Writer not initialized".into()))?;

        writer
            .close()
            .map_err(|e| DatagenError::Storage(e.to_string()))?;

        Ok(self.row_count)
    }
}

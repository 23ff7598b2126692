//! Dataset generation: drive `dbgen` and convert its output to Parquet.
//!
//! Each table is generated piece by piece; pieces of one table run
//! concurrently on blocking workers, tables run one after another. A piece
//! worker spawns dbgen, decodes the `.tbl` file, streams it to Parquet and
//! removes the intermediate file.

mod dbgen;
mod error;
mod parquet_writer;
mod tbl;

pub use dbgen::Dbgen;
pub use error::DatagenError;
pub use parquet_writer::{ParquetConfig, StreamingParquetWriter};
pub use tbl::TblDecoder;

use crate::schema::TpchTable;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// Options controlling a generation run.
#[derive(Debug, Clone)]
pub struct DatagenOptions {
    pub scale_factor: f64,
    pub dbgen_dir: PathBuf,
    pub output: PathBuf,
    pub piece_base: usize,
    pub workers: usize,
    pub validate: bool,
    pub parquet: ParquetConfig,
}

impl DatagenOptions {
    pub fn from_config(config: &crate::config::DatagenConfig) -> Self {
        Self {
            scale_factor: config.scale_factor,
            dbgen_dir: PathBuf::from(&config.dbgen_dir),
            output: PathBuf::from(&config.output),
            piece_base: config.piece_base,
            workers: config.workers,
            validate: config.validate,
            parquet: ParquetConfig::default(),
        }
    }
}

/// Totals for a completed generation run.
#[derive(Debug)]
pub struct GenerateSummary {
    pub tables: usize,
    pub pieces: usize,
    pub rows: u64,
    pub duration: Duration,
}

/// Orchestrates a full dataset generation run.
pub struct Datagen {
    options: DatagenOptions,
}

impl Datagen {
    pub fn new(options: DatagenOptions) -> Self {
        Self { options }
    }

    /// Generate the complete dataset under the configured output directory.
    ///
    /// Any existing dataset at the output path is replaced.
    pub async fn generate(&self) -> Result<GenerateSummary, DatagenError> {
        let start = Instant::now();

        let dbgen = Dbgen::new(&self.options.dbgen_dir, self.options.scale_factor);
        dbgen.check_binary()?;

        recreate_dir(&self.options.output)?;

        let mut summary = GenerateSummary {
            tables: 0,
            pieces: 0,
            rows: 0,
            duration: Duration::ZERO,
        };

        for table in TpchTable::all() {
            let table_start = Instant::now();
            let num_pieces = table.num_pieces(self.options.piece_base);
            let rows = if num_pieces == 1 {
                self.generate_single(&dbgen, table).await?
            } else {
                self.generate_pieces(&dbgen, table, num_pieces).await?
            };

            info!(
                "Generated {} ({} rows, {} pieces) in {:.2?}",
                table,
                rows,
                num_pieces,
                table_start.elapsed()
            );

            summary.tables += 1;
            summary.pieces += num_pieces;
            summary.rows += rows;
        }

        if self.options.validate {
            self.validate_dataset()?;
        }

        summary.duration = start.elapsed();
        Ok(summary)
    }

    /// Whole-table generation for tables dbgen emits as one file.
    async fn generate_single(
        &self,
        dbgen: &Dbgen,
        table: TpchTable,
    ) -> Result<u64, DatagenError> {
        let dbgen = dbgen.clone();
        let out = self.options.output.join(format!("{}.parquet", table.name()));
        let parquet = self.options.parquet.clone();

        tokio::task::spawn_blocking(move || {
            let tbl_path = dbgen.generate_table(table)?;
            let rows = convert_tbl(&tbl_path, table, &out, &parquet)?;
            dbgen::remove_if_exists(&tbl_path)?;
            Ok::<u64, DatagenError>(rows)
        })
        .await
        .map_err(|e| DatagenError::Spawn(format!("generator worker failed: {}", e)))?
    }

    /// Piece-parallel generation bounded by the worker count.
    async fn generate_pieces(
        &self,
        dbgen: &Dbgen,
        table: TpchTable,
        num_pieces: usize,
    ) -> Result<u64, DatagenError> {
        let table_dir = self.options.output.join(format!("{}.parquet", table.name()));
        std::fs::create_dir_all(&table_dir)?;

        let semaphore = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mut handles = Vec::with_capacity(num_pieces);
        let width = num_pieces.to_string().len();

        for piece in 0..num_pieces {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| DatagenError::Spawn(e.to_string()))?;
            let dbgen = dbgen.clone();
            let out = table_dir.join(format!("part-{:0width$}.parquet", piece, width = width));
            let parquet = self.options.parquet.clone();

            let handle = tokio::task::spawn_blocking(move || {
                // dbgen numbers pieces from 1
                let tbl_path = dbgen.generate_piece(table, piece + 1, num_pieces)?;
                let rows = convert_tbl(&tbl_path, table, &out, &parquet)?;
                dbgen::remove_if_exists(&tbl_path)?;
                drop(permit);
                Ok::<u64, DatagenError>(rows)
            });
            handles.push(handle);
        }

        let mut rows = 0u64;
        for handle in handles {
            rows += handle
                .await
                .map_err(|e| DatagenError::Spawn(format!("generator worker failed: {}", e)))??;
        }
        Ok(rows)
    }

    /// Check that every table's on-disk layout matches the piece plan.
    fn validate_dataset(&self) -> Result<(), DatagenError> {
        for table in TpchTable::all() {
            let expected = table.num_pieces(self.options.piece_base);
            let path = self.options.output.join(format!("{}.parquet", table.name()));
            let found = count_pieces(&path)?;
            if found != expected {
                return Err(DatagenError::Validation(format!(
                    "{}: expected {} pieces, found {}",
                    table, expected, found
                )));
            }
        }
        Ok(())
    }
}

/// Decode one `.tbl` file and stream it to a Parquet file.
///
/// An empty input still produces a valid Parquet file carrying the schema.
pub fn convert_tbl(
    tbl_path: &Path,
    table: TpchTable,
    out_path: &Path,
    parquet: &ParquetConfig,
) -> Result<u64, DatagenError> {
    let mut writer = StreamingParquetWriter::with_config(out_path.to_path_buf(), parquet.clone());
    writer.init(&table.arrow_schema())?;

    for batch in TblDecoder::open(tbl_path, table)? {
        writer.write_batch(&batch?)?;
    }

    Ok(writer.close()? as u64)
}

fn recreate_dir(path: &Path) -> Result<(), DatagenError> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

fn count_pieces(path: &Path) -> Result<usize, DatagenError> {
    if path.is_file() {
        return Ok(1);
    }
    if !path.is_dir() {
        return Err(DatagenError::Validation(format!(
            "missing table data at {}",
            path.display()
        )));
    }
    let mut count = 0;
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if entry.path().extension().map_or(false, |ext| ext == "parquet") {
            count += 1;
        }
    }
    Ok(count)
}

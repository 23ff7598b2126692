//! Decoder for dbgen's pipe-delimited `.tbl` output.
//!
//! dbgen terminates every record with a trailing field delimiter, so a
//! straight read against the table schema would see one extra column. The
//! decoder reads with a schema that carries an extra nullable text column
//! and projects it away, which keeps the Arrow CSV reader's typed parsing
//! (including `Date32`) on the real columns.

use crate::datagen::DatagenError;
use crate::schema::TpchTable;
use datafusion::arrow::csv::ReaderBuilder;
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Rows per decoded batch.
const BATCH_SIZE: usize = 8192;

/// Name of the synthetic column absorbing the trailing delimiter. dbgen
/// columns all carry a table prefix, so this cannot collide.
const TRAILER_COLUMN: &str = "trailer";

/// Streaming decoder yielding record batches with the table's real schema.
pub struct TblDecoder {
    reader: datafusion::arrow::csv::Reader<File>,
}

impl TblDecoder {
    /// Open a `.tbl` file for the given table.
    pub fn open(path: &Path, table: TpchTable) -> Result<Self, DatagenError> {
        let file = File::open(path).map_err(|e| {
            DatagenError::Decode(format!("cannot open {}: {}", path.display(), e))
        })?;

        let decode_schema = schema_with_trailer(&table.arrow_schema());
        let projection: Vec<usize> = (0..decode_schema.fields().len() - 1).collect();

        let reader = ReaderBuilder::new(decode_schema)
            .with_header(false)
            .with_delimiter(b'|')
            .with_batch_size(BATCH_SIZE)
            .with_projection(projection)
            .build(file)
            .map_err(|e| DatagenError::Decode(e.to_string()))?;

        Ok(Self { reader })
    }
}

impl Iterator for TblDecoder {
    type Item = Result<RecordBatch, DatagenError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader
            .next()
            .map(|r| r.map_err(|e| DatagenError::Decode(e.to_string())))
    }
}

fn schema_with_trailer(schema: &SchemaRef) -> SchemaRef {
    let mut fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields.push(Field::new(TRAILER_COLUMN, DataType::Utf8, true));
    Arc::new(Schema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};

    fn write_tbl(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.tbl");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_decode_trailing_delimiter() {
        let (_dir, path) = write_tbl("0|AFRICA|watery region|\n1|AMERICA|even, final deposits|\n");
        let batches: Vec<RecordBatch> = TblDecoder::open(&path, TpchTable::Region)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.num_columns(), 3);
        assert_eq!(batch.num_rows(), 2);

        let keys = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(keys.value(1), 1);

        let names = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(names.value(0), "AFRICA");
    }

    #[test]
    fn test_decode_dates_and_floats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineitem.tbl");
        std::fs::write(
            &path,
            "1|155|4|1|17|21168.23|0.04|0.02|N|O|1996-03-13|1996-02-12|1996-03-22|DELIVER IN PERSON|TRUCK|egular courts|\n",
        )
        .unwrap();

        let batches: Vec<RecordBatch> = TblDecoder::open(&path, TpchTable::Lineitem)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let batch = &batches[0];
        assert_eq!(batch.num_columns(), 16);

        let price = batch
            .column(5)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!((price.value(0) - 21168.23).abs() < 1e-9);

        let shipdate = batch
            .column(10)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        // 1996-03-13 is 9568 days after the epoch
        assert_eq!(shipdate.value(0), 9568);
    }

    #[test]
    fn test_decode_empty_file() {
        let (_dir, path) = write_tbl("");
        let batches: Vec<RecordBatch> = TblDecoder::open(&path, TpchTable::Region)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(batches.is_empty());
    }

    #[test]
    fn test_decode_malformed_row() {
        let (_dir, path) = write_tbl("0|AFRICA\n");
        let result: Result<Vec<RecordBatch>, _> =
            TblDecoder::open(&path, TpchTable::Region).unwrap().collect();
        assert!(result.is_err());
    }
}

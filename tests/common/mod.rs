//! Shared fixtures: a hand-built miniature dataset written through the
//! crate's own Parquet writer, small enough to verify query results by
//! hand.

use chrono::NaiveDate;
use datafusion::arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use datafusion::arrow::record_batch::RecordBatch;
use std::path::Path;
use std::sync::Arc;
use tpchbench::datagen::StreamingParquetWriter;
use tpchbench::{Dataset, TpchTable};

/// Days since the Unix epoch, the `Date32` representation.
pub fn days(y: i32, m: u32, d: u32) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
    date.signed_duration_since(epoch).num_days() as i32
}

fn int64(values: &[i64]) -> ArrayRef {
    Arc::new(Int64Array::from(values.to_vec()))
}

fn float64(values: &[f64]) -> ArrayRef {
    Arc::new(Float64Array::from(values.to_vec()))
}

fn utf8(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

fn date32(values: &[i32]) -> ArrayRef {
    Arc::new(Date32Array::from(values.to_vec()))
}

fn write_table(root: &Path, table: TpchTable, columns: Vec<ArrayRef>) {
    let schema = table.arrow_schema();
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let path = root.join(format!("{}.parquet", table.name()));
    let mut writer = StreamingParquetWriter::new(path);
    writer.init(&schema).unwrap();
    writer.write_batch(&batch).unwrap();
    writer.close().unwrap();
}

/// Build the miniature dataset. Tables are written as single Parquet files.
///
/// The data is shaped so q1, q3 and q6 have hand-checkable answers:
/// - q6 (1994 shipments, discount 0.05..0.07, qty < 24) matches only
///   lineitem #1: revenue 1000 * 0.06 = 60.
/// - q3 (BUILDING customers, orders before 1995-03-15, shipped after)
///   matches only order 1 via lineitem #3: revenue 100.
/// - q1 groups to (A,F), (N,O), (R,F).
pub fn build_dataset(root: &Path) -> Dataset {
    write_table(
        root,
        TpchTable::Customer,
        vec![
            int64(&[1, 2]),
            utf8(&["Customer#000000001", "Customer#000000002"]),
            utf8(&["IVhzIApeRb", "XSTf4,NCwDVaW"]),
            int64(&[0, 1]),
            utf8(&["13-702-000-0001", "31-593-000-0002"]),
            float64(&[100.0, 200.0]),
            utf8(&["BUILDING", "AUTOMOBILE"]),
            utf8(&["regular deposits", "even requests"]),
        ],
    );

    write_table(
        root,
        TpchTable::Orders,
        vec![
            int64(&[1, 2, 3]),
            int64(&[1, 1, 2]),
            utf8(&["O", "O", "F"]),
            float64(&[1600.0, 200.0, 800.0]),
            date32(&[days(1995, 3, 1), days(1995, 4, 1), days(1993, 8, 1)]),
            utf8(&["5-LOW", "3-MEDIUM", "1-URGENT"]),
            utf8(&["Clerk#000000001", "Clerk#000000002", "Clerk#000000003"]),
            int64(&[0, 0, 0]),
            utf8(&["carefully final", "quickly regular", "pending accounts"]),
        ],
    );

    write_table(
        root,
        TpchTable::Lineitem,
        vec![
            int64(&[1, 1, 1, 2, 3]),
            int64(&[155, 155, 155, 155, 155]),
            int64(&[4, 4, 4, 4, 4]),
            int64(&[1, 2, 3, 1, 1]),
            float64(&[10.0, 30.0, 4.0, 5.0, 20.0]),
            float64(&[1000.0, 500.0, 100.0, 200.0, 800.0]),
            float64(&[0.06, 0.06, 0.00, 0.05, 0.10]),
            float64(&[0.00, 0.10, 0.00, 0.05, 0.02]),
            utf8(&["N", "N", "N", "A", "R"]),
            utf8(&["O", "O", "O", "F", "F"]),
            date32(&[
                days(1994, 2, 1),
                days(1994, 3, 1),
                days(1995, 4, 1),
                days(1995, 6, 1),
                days(1994, 5, 10),
            ]),
            date32(&[
                days(1994, 3, 1),
                days(1994, 4, 1),
                days(1995, 4, 20),
                days(1995, 6, 10),
                days(1994, 6, 1),
            ]),
            date32(&[
                days(1994, 3, 10),
                days(1994, 4, 11),
                days(1995, 4, 30),
                days(1995, 6, 5),
                days(1994, 6, 15),
            ]),
            utf8(&[
                "DELIVER IN PERSON",
                "NONE",
                "NONE",
                "NONE",
                "TAKE BACK RETURN",
            ]),
            utf8(&["TRUCK", "MAIL", "AIR", "SHIP", "RAIL"]),
            utf8(&[
                "egular courts",
                "ly final dependencies",
                "riously special",
                "unusual accounts",
                "furiously bold",
            ]),
        ],
    );

    write_table(
        root,
        TpchTable::Nation,
        vec![
            int64(&[0, 1]),
            utf8(&["FRANCE", "GERMANY"]),
            int64(&[0, 0]),
            utf8(&["refully final requests", "l platelets"]),
        ],
    );

    write_table(
        root,
        TpchTable::Region,
        vec![
            int64(&[0, 1]),
            utf8(&["EUROPE", "ASIA"]),
            utf8(&["uickly special", "ges about the"]),
        ],
    );

    write_table(
        root,
        TpchTable::Supplier,
        vec![
            int64(&[4]),
            utf8(&["Supplier#000000004"]),
            utf8(&["Bk7ah4CGUj"]),
            int64(&[0]),
            utf8(&["17-000-000-0004"]),
            float64(&[500.0]),
            utf8(&["riously even requests"]),
        ],
    );

    write_table(
        root,
        TpchTable::Part,
        vec![
            int64(&[155]),
            utf8(&["forest green antique part"]),
            utf8(&["Manufacturer#1"]),
            utf8(&["Brand#13"]),
            utf8(&["ECONOMY BRASS"]),
            int64(&[15]),
            utf8(&["MED BOX"]),
            float64(&[42.0]),
            utf8(&["final deposits"]),
        ],
    );

    write_table(
        root,
        TpchTable::Partsupp,
        vec![
            int64(&[155]),
            int64(&[4]),
            int64(&[100]),
            float64(&[10.0]),
            utf8(&["blithely ironic"]),
        ],
    );

    Dataset::new(root)
}

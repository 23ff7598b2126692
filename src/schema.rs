//! Static description of the eight TPC-H tables.
//!
//! Column names are kept lowercase so the same identifiers resolve in every
//! wrapped engine (DataFusion folds unquoted identifiers to lowercase).
//! Keys and counts are `Int64`, monetary and quantity columns `Float64`,
//! dates `Date32`, everything else `Utf8`.

use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One of the eight TPC-H base tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TpchTable {
    Customer,
    Lineitem,
    Nation,
    Orders,
    Part,
    Partsupp,
    Region,
    Supplier,
}

impl TpchTable {
    /// All tables, in the order the generator processes them.
    pub fn all() -> [TpchTable; 8] {
        [
            TpchTable::Customer,
            TpchTable::Lineitem,
            TpchTable::Nation,
            TpchTable::Orders,
            TpchTable::Part,
            TpchTable::Partsupp,
            TpchTable::Region,
            TpchTable::Supplier,
        ]
    }

    /// Canonical table name, as used in queries and dataset paths.
    pub fn name(&self) -> &'static str {
        match self {
            TpchTable::Customer => "customer",
            TpchTable::Lineitem => "lineitem",
            TpchTable::Nation => "nation",
            TpchTable::Orders => "orders",
            TpchTable::Part => "part",
            TpchTable::Partsupp => "partsupp",
            TpchTable::Region => "region",
            TpchTable::Supplier => "supplier",
        }
    }

    /// The single-character table selector understood by `dbgen -T`.
    pub fn dbgen_selector(&self) -> char {
        match self {
            TpchTable::Customer => 'c',
            TpchTable::Lineitem => 'L',
            TpchTable::Nation => 'n',
            TpchTable::Orders => 'O',
            TpchTable::Part => 'P',
            TpchTable::Partsupp => 'S',
            TpchTable::Region => 'r',
            TpchTable::Supplier => 's',
        }
    }

    /// Number of Parquet pieces the table is split into for a given base
    /// piece count. Lineitem dominates the dataset and gets 10x the base;
    /// supplier is two orders of magnitude smaller than the base tables;
    /// dbgen emits exactly one file for nation and region at any scale.
    pub fn num_pieces(&self, base: usize) -> usize {
        let base = base.max(1);
        match self {
            TpchTable::Lineitem => base * 10,
            TpchTable::Nation | TpchTable::Region => 1,
            TpchTable::Supplier => (base / 100).max(1),
            _ => base,
        }
    }

    /// Arrow schema used for `.tbl` decoding and Parquet writing.
    pub fn arrow_schema(&self) -> SchemaRef {
        let fields = match self {
            TpchTable::Customer => vec![
                Field::new("c_custkey", DataType::Int64, false),
                Field::new("c_name", DataType::Utf8, false),
                Field::new("c_address", DataType::Utf8, false),
                Field::new("c_nationkey", DataType::Int64, false),
                Field::new("c_phone", DataType::Utf8, false),
                Field::new("c_acctbal", DataType::Float64, false),
                Field::new("c_mktsegment", DataType::Utf8, false),
                Field::new("c_comment", DataType::Utf8, false),
            ],
            TpchTable::Lineitem => vec![
                Field::new("l_orderkey", DataType::Int64, false),
                Field::new("l_partkey", DataType::Int64, false),
                Field::new("l_suppkey", DataType::Int64, false),
                Field::new("l_linenumber", DataType::Int64, false),
                Field::new("l_quantity", DataType::Float64, false),
                Field::new("l_extendedprice", DataType::Float64, false),
                Field::new("l_discount", DataType::Float64, false),
                Field::new("l_tax", DataType::Float64, false),
                Field::new("l_returnflag", DataType::Utf8, false),
                Field::new("l_linestatus", DataType::Utf8, false),
                Field::new("l_shipdate", DataType::Date32, false),
                Field::new("l_commitdate", DataType::Date32, false),
                Field::new("l_receiptdate", DataType::Date32, false),
                Field::new("l_shipinstruct", DataType::Utf8, false),
                Field::new("l_shipmode", DataType::Utf8, false),
                Field::new("l_comment", DataType::Utf8, false),
            ],
            TpchTable::Nation => vec![
                Field::new("n_nationkey", DataType::Int64, false),
                Field::new("n_name", DataType::Utf8, false),
                Field::new("n_regionkey", DataType::Int64, false),
                Field::new("n_comment", DataType::Utf8, false),
            ],
            TpchTable::Orders => vec![
                Field::new("o_orderkey", DataType::Int64, false),
                Field::new("o_custkey", DataType::Int64, false),
                Field::new("o_orderstatus", DataType::Utf8, false),
                Field::new("o_totalprice", DataType::Float64, false),
                Field::new("o_orderdate", DataType::Date32, false),
                Field::new("o_orderpriority", DataType::Utf8, false),
                Field::new("o_clerk", DataType::Utf8, false),
                Field::new("o_shippriority", DataType::Int64, false),
                Field::new("o_comment", DataType::Utf8, false),
            ],
            TpchTable::Part => vec![
                Field::new("p_partkey", DataType::Int64, false),
                Field::new("p_name", DataType::Utf8, false),
                Field::new("p_mfgr", DataType::Utf8, false),
                Field::new("p_brand", DataType::Utf8, false),
                Field::new("p_type", DataType::Utf8, false),
                Field::new("p_size", DataType::Int64, false),
                Field::new("p_container", DataType::Utf8, false),
                Field::new("p_retailprice", DataType::Float64, false),
                Field::new("p_comment", DataType::Utf8, false),
            ],
            TpchTable::Partsupp => vec![
                Field::new("ps_partkey", DataType::Int64, false),
                Field::new("ps_suppkey", DataType::Int64, false),
                Field::new("ps_availqty", DataType::Int64, false),
                Field::new("ps_supplycost", DataType::Float64, false),
                Field::new("ps_comment", DataType::Utf8, false),
            ],
            TpchTable::Region => vec![
                Field::new("r_regionkey", DataType::Int64, false),
                Field::new("r_name", DataType::Utf8, false),
                Field::new("r_comment", DataType::Utf8, false),
            ],
            TpchTable::Supplier => vec![
                Field::new("s_suppkey", DataType::Int64, false),
                Field::new("s_name", DataType::Utf8, false),
                Field::new("s_address", DataType::Utf8, false),
                Field::new("s_nationkey", DataType::Int64, false),
                Field::new("s_phone", DataType::Utf8, false),
                Field::new("s_acctbal", DataType::Float64, false),
                Field::new("s_comment", DataType::Utf8, false),
            ],
        };
        Arc::new(Schema::new(fields))
    }
}

impl fmt::Display for TpchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A generated TPC-H dataset rooted at a directory.
///
/// Each table lives at `<root>/<table>.parquet`: a plain file for
/// single-piece tables, a directory of `part-NNN.parquet` pieces otherwise.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
}

impl Dataset {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path of a table's Parquet data (file or piece directory).
    pub fn table_path(&self, table: TpchTable) -> PathBuf {
        self.root.join(format!("{}.parquet", table.name()))
    }

    /// Scan pattern for engines that take glob paths (duckdb, polars):
    /// `<path>/*.parquet` for piece directories, the file path otherwise.
    pub fn scan_pattern(&self, table: TpchTable) -> String {
        let path = self.table_path(table);
        if path.is_dir() {
            format!("{}/*.parquet", path.display())
        } else {
            path.display().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_layout() {
        assert_eq!(TpchTable::Lineitem.num_pieces(8), 80);
        assert_eq!(TpchTable::Customer.num_pieces(8), 8);
        assert_eq!(TpchTable::Supplier.num_pieces(8), 1);
        assert_eq!(TpchTable::Supplier.num_pieces(200), 2);
        assert_eq!(TpchTable::Nation.num_pieces(8), 1);
        assert_eq!(TpchTable::Region.num_pieces(1000), 1);
    }

    #[test]
    fn test_schemas_cover_all_tables() {
        for table in TpchTable::all() {
            let schema = table.arrow_schema();
            assert!(!schema.fields().is_empty(), "{} has no columns", table);
            // every column carries the table prefix
            let prefix = match table {
                TpchTable::Partsupp => "ps_".to_string(),
                other => format!("{}_", &other.name()[..1]),
            };
            for field in schema.fields() {
                assert!(
                    field.name().starts_with(&prefix),
                    "{} column {} missing prefix {}",
                    table,
                    field.name(),
                    prefix
                );
            }
        }
    }

    #[test]
    fn test_dataset_paths() {
        let ds = Dataset::new("/data/sf1");
        assert_eq!(
            ds.table_path(TpchTable::Lineitem),
            PathBuf::from("/data/sf1/lineitem.parquet")
        );
        // a non-existent path is treated as a single file
        assert_eq!(
            ds.scan_pattern(TpchTable::Nation),
            "/data/sf1/nation.parquet"
        );
    }
}

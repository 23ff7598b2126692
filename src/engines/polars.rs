//! Polars engine: queries expressed as LazyFrame operator chains.
//!
//! Covers queries 1 through 7; the remaining catalog entries report
//! [`EngineError::Unsupported`] and the runner records them as failed runs.
//! Date predicates use midnight datetimes, which polars coerces against
//! `Date` columns without loss.

use crate::answers::{date32_to_iso, AnswerTable, Cell};
use crate::engines::{EngineError, QueryEngine};
use crate::queries::TpchQuery;
use crate::schema::{Dataset, TpchTable};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

pub struct PolarsEngine;

impl PolarsEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PolarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryEngine for PolarsEngine {
    fn name(&self) -> &'static str {
        "polars"
    }

    fn version(&self) -> String {
        polars::VERSION.to_string()
    }

    async fn run(&self, query: &TpchQuery, dataset: &Dataset) -> Result<AnswerTable, EngineError> {
        let number = query.number;
        if !(1..=7).contains(&number) {
            return Err(EngineError::Unsupported(number));
        }

        let dataset = dataset.clone();
        tokio::task::spawn_blocking(move || {
            let lf = match number {
                1 => q1(&dataset),
                2 => q2(&dataset),
                3 => q3(&dataset),
                4 => q4(&dataset),
                5 => q5(&dataset),
                6 => q6(&dataset),
                7 => q7(&dataset),
                n => return Err(EngineError::Unsupported(n)),
            }
            .map_err(|e| EngineError::Connection(e.to_string()))?;

            let df = lf
                .collect()
                .map_err(|e| EngineError::Execution(e.to_string()))?;
            dataframe_to_table(&df)
        })
        .await
        .map_err(|e| EngineError::Execution(format!("worker failed: {}", e)))?
    }
}

fn scan(dataset: &Dataset, table: TpchTable) -> PolarsResult<LazyFrame> {
    LazyFrame::scan_parquet(dataset.scan_pattern(table), ScanArgsParquet::default())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn q1(ds: &Dataset) -> PolarsResult<LazyFrame> {
    let lineitem = scan(ds, TpchTable::Lineitem)?;

    // DATE '1998-12-01' - 90 days
    let cutoff = lit(date(1998, 9, 2));

    Ok(lineitem
        .filter(col("l_shipdate").lt_eq(cutoff))
        .group_by([col("l_returnflag"), col("l_linestatus")])
        .agg([
            sum("l_quantity").alias("sum_qty"),
            sum("l_extendedprice").alias("sum_base_price"),
            (col("l_extendedprice") * (lit(1) - col("l_discount")))
                .sum()
                .alias("sum_disc_price"),
            (col("l_extendedprice") * (lit(1) - col("l_discount")) * (lit(1) + col("l_tax")))
                .sum()
                .alias("sum_charge"),
            mean("l_quantity").alias("avg_qty"),
            mean("l_extendedprice").alias("avg_price"),
            mean("l_discount").alias("avg_disc"),
            len().alias("count_order"),
        ])
        .sort(["l_returnflag", "l_linestatus"], Default::default()))
}

fn q2(ds: &Dataset) -> PolarsResult<LazyFrame> {
    let part = scan(ds, TpchTable::Part)?;
    let supplier = scan(ds, TpchTable::Supplier)?;
    let partsupp = scan(ds, TpchTable::Partsupp)?;
    let nation = scan(ds, TpchTable::Nation)?;
    let region = scan(ds, TpchTable::Region)?;

    let europe = part
        .join(
            partsupp,
            [col("p_partkey")],
            [col("ps_partkey")],
            JoinArgs::default(),
        )
        .join(
            supplier,
            [col("ps_suppkey")],
            [col("s_suppkey")],
            JoinArgs::default(),
        )
        .join(
            nation,
            [col("s_nationkey")],
            [col("n_nationkey")],
            JoinArgs::default(),
        )
        .join(
            region,
            [col("n_regionkey")],
            [col("r_regionkey")],
            JoinArgs::default(),
        )
        .filter(col("p_size").eq(lit(15)))
        .filter(col("p_type").str().ends_with(lit("BRASS")))
        .filter(col("r_name").eq(lit("EUROPE")));

    Ok(europe
        .clone()
        .group_by([col("p_partkey")])
        .agg([min("ps_supplycost").alias("min_supplycost")])
        .join(
            europe,
            [col("p_partkey"), col("min_supplycost")],
            [col("p_partkey"), col("ps_supplycost")],
            JoinArgs::default(),
        )
        .select([
            col("s_acctbal"),
            col("s_name"),
            col("n_name"),
            col("p_partkey"),
            col("p_mfgr"),
            col("s_address"),
            col("s_phone"),
            col("s_comment"),
        ])
        .sort_by_exprs(
            [
                col("s_acctbal"),
                col("n_name"),
                col("s_name"),
                col("p_partkey"),
            ],
            SortMultipleOptions::new().with_order_descending_multi([true, false, false, false]),
        )
        .limit(100))
}

fn q3(ds: &Dataset) -> PolarsResult<LazyFrame> {
    let customer = scan(ds, TpchTable::Customer)?;
    let orders = scan(ds, TpchTable::Orders)?;
    let lineitem = scan(ds, TpchTable::Lineitem)?;

    let cutoff = lit(date(1995, 3, 15));

    Ok(customer
        .filter(col("c_mktsegment").eq(lit("BUILDING")))
        .join(
            orders,
            [col("c_custkey")],
            [col("o_custkey")],
            JoinArgs::default(),
        )
        .join(
            lineitem,
            [col("o_orderkey")],
            [col("l_orderkey")],
            JoinArgs::default(),
        )
        .filter(col("o_orderdate").lt(cutoff.clone()))
        .filter(col("l_shipdate").gt(cutoff))
        .group_by([col("o_orderkey"), col("o_orderdate"), col("o_shippriority")])
        .agg([(col("l_extendedprice") * (lit(1) - col("l_discount")))
            .sum()
            .alias("revenue")])
        .select([
            col("o_orderkey").alias("l_orderkey"),
            col("revenue"),
            col("o_orderdate"),
            col("o_shippriority"),
        ])
        .sort_by_exprs(
            [col("revenue"), col("o_orderdate")],
            SortMultipleOptions::new().with_order_descending_multi([true, false]),
        )
        .limit(10))
}

fn q4(ds: &Dataset) -> PolarsResult<LazyFrame> {
    let orders = scan(ds, TpchTable::Orders)?;
    let lineitem = scan(ds, TpchTable::Lineitem)?;

    Ok(orders
        .filter(col("o_orderdate").gt_eq(lit(date(1993, 7, 1))))
        .filter(col("o_orderdate").lt(lit(date(1993, 10, 1))))
        .join(
            lineitem.filter(col("l_commitdate").lt(col("l_receiptdate"))),
            [col("o_orderkey")],
            [col("l_orderkey")],
            // EXISTS
            JoinArgs::new(JoinType::Semi),
        )
        .group_by([col("o_orderpriority")])
        .agg([len().alias("order_count")])
        .sort(["o_orderpriority"], Default::default()))
}

fn q5(ds: &Dataset) -> PolarsResult<LazyFrame> {
    let customer = scan(ds, TpchTable::Customer)?;
    let orders = scan(ds, TpchTable::Orders)?;
    let lineitem = scan(ds, TpchTable::Lineitem)?;
    let supplier = scan(ds, TpchTable::Supplier)?;
    let nation = scan(ds, TpchTable::Nation)?;
    let region = scan(ds, TpchTable::Region)?;

    Ok(region
        .filter(col("r_name").eq(lit("ASIA")))
        .join(
            nation,
            [col("r_regionkey")],
            [col("n_regionkey")],
            JoinArgs::default(),
        )
        .join(
            customer,
            [col("n_nationkey")],
            [col("c_nationkey")],
            JoinArgs::default(),
        )
        .join(
            orders,
            [col("c_custkey")],
            [col("o_custkey")],
            JoinArgs::default(),
        )
        .join(
            lineitem,
            [col("o_orderkey")],
            [col("l_orderkey")],
            JoinArgs::default(),
        )
        .join(
            supplier,
            [col("l_suppkey"), col("n_nationkey")],
            [col("s_suppkey"), col("s_nationkey")],
            JoinArgs::default(),
        )
        .filter(col("o_orderdate").gt_eq(lit(date(1994, 1, 1))))
        .filter(col("o_orderdate").lt(lit(date(1995, 1, 1))))
        .group_by([col("n_name")])
        .agg([(col("l_extendedprice") * (lit(1) - col("l_discount")))
            .sum()
            .alias("revenue")])
        .sort(
            ["revenue"],
            SortMultipleOptions::new().with_order_descending(true),
        ))
}

fn q6(ds: &Dataset) -> PolarsResult<LazyFrame> {
    let lineitem = scan(ds, TpchTable::Lineitem)?;

    Ok(lineitem
        .filter(col("l_shipdate").gt_eq(lit(date(1994, 1, 1))))
        .filter(col("l_shipdate").lt(lit(date(1995, 1, 1))))
        .filter(col("l_discount").gt_eq(lit(0.05)))
        .filter(col("l_discount").lt_eq(lit(0.07)))
        .filter(col("l_quantity").lt(lit(24)))
        .with_columns([(col("l_extendedprice") * col("l_discount")).alias("revenue")])
        .select([sum("revenue")]))
}

fn q7(ds: &Dataset) -> PolarsResult<LazyFrame> {
    let nation = scan(ds, TpchTable::Nation)?;
    let france = nation.clone().filter(col("n_name").eq(lit("FRANCE")));
    let germany = nation.filter(col("n_name").eq(lit("GERMANY")));

    let shipping = |cust_nation: LazyFrame, supp_nation: LazyFrame| -> PolarsResult<LazyFrame> {
        let customer = scan(ds, TpchTable::Customer)?;
        let orders = scan(ds, TpchTable::Orders)?;
        let lineitem = scan(ds, TpchTable::Lineitem)?;
        let supplier = scan(ds, TpchTable::Supplier)?;

        Ok(customer
            .join(
                cust_nation.select([col("n_nationkey"), col("n_name").alias("cust_nation")]),
                [col("c_nationkey")],
                [col("n_nationkey")],
                JoinArgs::default(),
            )
            .join(
                orders,
                [col("c_custkey")],
                [col("o_custkey")],
                JoinArgs::default(),
            )
            .join(
                lineitem,
                [col("o_orderkey")],
                [col("l_orderkey")],
                JoinArgs::default(),
            )
            .join(
                supplier,
                [col("l_suppkey")],
                [col("s_suppkey")],
                JoinArgs::default(),
            )
            .join(
                supp_nation.select([col("n_nationkey"), col("n_name").alias("supp_nation")]),
                [col("s_nationkey")],
                [col("n_nationkey")],
                JoinArgs::default(),
            ))
    };

    let franco_german = shipping(germany.clone(), france.clone())?;
    let german_french = shipping(france, germany)?;

    Ok(concat([franco_german, german_french], UnionArgs::default())?
        .filter(col("l_shipdate").gt_eq(lit(date(1995, 1, 1))))
        .filter(col("l_shipdate").lt_eq(lit(date(1996, 12, 31))))
        .with_columns([
            (col("l_extendedprice") * (lit(1) - col("l_discount"))).alias("volume"),
            col("l_shipdate").dt().year().alias("l_year"),
        ])
        .group_by([col("supp_nation"), col("cust_nation"), col("l_year")])
        .agg([sum("volume").alias("revenue")])
        .sort(["supp_nation", "cust_nation", "l_year"], Default::default()))
}

fn dataframe_to_table(df: &DataFrame) -> Result<AnswerTable, EngineError> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let height = df.height();
    let mut rows: Vec<Vec<Cell>> = (0..height)
        .map(|_| Vec::with_capacity(df.width()))
        .collect();

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        for (i, row) in rows.iter_mut().enumerate() {
            let value = series
                .get(i)
                .map_err(|e| EngineError::Conversion(e.to_string()))?;
            row.push(anyvalue_to_cell(value)?);
        }
    }

    Ok(AnswerTable { columns, rows })
}

fn anyvalue_to_cell(value: AnyValue<'_>) -> Result<Cell, EngineError> {
    Ok(match value {
        AnyValue::Null => Cell::Null,
        AnyValue::Int8(v) => Cell::Number(v as f64),
        AnyValue::Int16(v) => Cell::Number(v as f64),
        AnyValue::Int32(v) => Cell::Number(v as f64),
        AnyValue::Int64(v) => Cell::Number(v as f64),
        AnyValue::UInt8(v) => Cell::Number(v as f64),
        AnyValue::UInt16(v) => Cell::Number(v as f64),
        AnyValue::UInt32(v) => Cell::Number(v as f64),
        AnyValue::UInt64(v) => Cell::Number(v as f64),
        AnyValue::Float32(v) => Cell::Number(v as f64),
        AnyValue::Float64(v) => Cell::Number(v),
        AnyValue::Boolean(v) => Cell::Text(v.to_string()),
        AnyValue::String(v) => Cell::Text(v.to_string()),
        AnyValue::StringOwned(v) => Cell::Text(v.to_string()),
        AnyValue::Date(days) => Cell::Text(date32_to_iso(days)),
        other => {
            return Err(EngineError::Conversion(format!(
                "unhandled polars value {:?}",
                other
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyvalue_conversion() {
        assert_eq!(
            anyvalue_to_cell(AnyValue::Int64(7)).unwrap(),
            Cell::Number(7.0)
        );
        assert_eq!(
            anyvalue_to_cell(AnyValue::Date(9568)).unwrap(),
            Cell::Text("1996-03-13".to_string())
        );
        assert_eq!(anyvalue_to_cell(AnyValue::Null).unwrap(), Cell::Null);
    }
}

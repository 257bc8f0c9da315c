// crates/lakeport-core/src/stages/temperature.rs
//
// Temperature dimension: per-calendar-month average temperature and
// uncertainty for US cities since 2010, keyed by city code and partitioned
// by month.

use chrono::NaiveDate;
use polars::prelude::*;

use super::decimal16_4;
use crate::config::LakeConfig;
use crate::error::Result;
use crate::session::LakeSession;
use crate::tables::TEMPERATURE_TABLE;

pub fn run(session: &LakeSession, config: &LakeConfig) -> Result<usize> {
    let raw = session.read_csv(&config.sources.global_temperatures, b',')?;
    let lookup = session.read_csv(&config.sources.city_state_codes, b',')?;
    let shaped = shape(raw, lookup)?;
    session.write_partitioned(&shaped, TEMPERATURE_TABLE, &["month"])
}

/// Observations from 2010-01-01 onward (inclusive, no upper bound), US only.
/// The month grouping collapses years: one row per (month, city code), with
/// unmatched lookup cities keeping a null code.
fn shape(raw: DataFrame, lookup: DataFrame) -> Result<DataFrame> {
    let cutoff = NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid cutoff date");

    let lookup_keys = lookup.lazy().select([
        col("city_name").str().to_lowercase().alias("city_key"),
        col("city_code"),
    ]);

    let df = raw
        .lazy()
        .with_column(col("dt").cast(DataType::Date))
        .filter(
            col("Country")
                .eq(lit("United States"))
                .and(col("dt").gt_eq(lit(cutoff))),
        )
        .with_column(col("City").str().to_lowercase().alias("city_key"))
        .join(
            lookup_keys,
            [col("city_key")],
            [col("city_key")],
            JoinArgs::new(JoinType::Left),
        )
        .group_by([
            col("dt").dt().month().cast(DataType::Int32).alias("month"),
            col("city_code"),
        ])
        .agg([
            decimal16_4(col("AverageTemperature").cast(DataType::Float64).mean())
                .alias("avg_temperature"),
            decimal16_4(col("AverageTemperatureUncertainty").cast(DataType::Float64).mean())
                .alias("avg_temperature_uncertainty"),
        ])
        .sort(["month"], SortMultipleOptions::default())
        .collect()?;
    Ok(df)
}

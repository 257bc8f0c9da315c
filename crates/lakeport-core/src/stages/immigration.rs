// crates/lakeport-core/src/stages/immigration.rs
//
// Immigration fact table: cast identifier and numeric fields to integer,
// derive arrival/departure calendar dates from SAS epoch day offsets, and
// write partitioned by (i94yr, i94mon).

use chrono::{NaiveDate, TimeDelta};
use polars::prelude::*;

use crate::config::LakeConfig;
use crate::error::Result;
use crate::session::LakeSession;
use crate::tables::IMMIGRATION_TABLE;

/// Days from 1960-01-01 (the SAS epoch) to 1970-01-01 (the Date epoch).
const SAS_TO_UNIX_EPOCH_DAYS: i64 = 3653;

pub fn run(session: &LakeSession, config: &LakeConfig) -> Result<usize> {
    let raw = session.scan_source_parquet(&config.sources.immigration)?;
    let shaped = shape(raw)?;
    session.write_partitioned(&shaped, IMMIGRATION_TABLE, &["i94yr", "i94mon"])
}

fn shape(raw: LazyFrame) -> Result<DataFrame> {
    let df = raw
        .select([
            int_field("cicid"),
            int_field("i94yr"),
            int_field("i94mon"),
            int_field("i94cit"),
            int_field("i94res"),
            col("i94port"),
            sas_date("arrdate").alias("arrival_date"),
            int_field("i94mode"),
            col("i94addr"),
            sas_date("depdate").alias("departure_date"),
            int_field("i94bir"),
            int_field("i94visa"),
            col("visapost"),
            int_field("biryear"),
            col("gender"),
            col("airline"),
            col("visatype"),
        ])
        .collect()?;
    Ok(df)
}

fn int_field(name: &str) -> Expr {
    col(name).cast(DataType::Int32)
}

/// Columnar form of [`sas_epoch_date`]: a day offset from 1960-01-01 becomes
/// a calendar date. Every cast is non-strict, so unparseable or out-of-range
/// offsets flow through as null instead of failing the row.
fn sas_date(name: &str) -> Expr {
    (col(name).cast(DataType::Int64) - lit(SAS_TO_UNIX_EPOCH_DAYS))
        .cast(DataType::Int32)
        .cast(DataType::Date)
}

/// Scalar contract for the date mapping: 1960-01-01 plus `offset` days, or
/// None when the addition leaves the representable range.
pub fn sas_epoch_date(offset: i64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1960, 1, 1)?;
    epoch.checked_add_signed(TimeDelta::try_days(offset)?)
}

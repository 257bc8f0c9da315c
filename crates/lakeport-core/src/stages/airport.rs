// crates/lakeport-core/src/stages/airport.rs
//
// Airport dimension: split the combined "coordinates" field into
// longitude/latitude, derive the state code from the ISO region, keep only
// open US airports, and sort by state code.

use polars::prelude::*;

use super::decimal16_4;
use crate::config::LakeConfig;
use crate::error::Result;
use crate::session::LakeSession;
use crate::tables::AIRPORT_TABLE;

pub fn run(session: &LakeSession, config: &LakeConfig) -> Result<usize> {
    let raw = session.read_csv(&config.sources.airport_codes, b',')?;
    let shaped = shape(raw)?;
    session.write_table(&shaped, AIRPORT_TABLE)
}

/// The declarative transformation. A coordinates value with no comma yields a
/// null latitude rather than an error; the elevation, continent, region, gps
/// and local-code fields are dropped.
fn shape(raw: DataFrame) -> Result<DataFrame> {
    let df = raw
        .lazy()
        .with_columns([
            coordinate_part("coordinates", 0).alias("longitude"),
            coordinate_part("coordinates", 1).alias("latitude"),
            col("iso_region")
                .str()
                .split(lit("-"))
                .list()
                .get(lit(1), true)
                .alias("state_code"),
        ])
        .filter(
            col("type")
                .neq(lit("closed"))
                .and(col("iso_country").eq(lit("US"))),
        )
        .select([
            col("ident"),
            col("type"),
            col("name"),
            col("iso_country"),
            col("municipality"),
            col("iata_code"),
            decimal16_4(col("longitude").str().strip_chars(lit(NULL))).alias("longitude"),
            decimal16_4(col("latitude").str().strip_chars(lit(NULL))).alias("latitude"),
            col("state_code"),
        ])
        .sort(["state_code"], SortMultipleOptions::default())
        .collect()?;
    Ok(df)
}

/// Positional split of the "longitude, latitude" text field. Out-of-bounds
/// indices become null.
fn coordinate_part(column: &str, index: i64) -> Expr {
    col(column).str().split(lit(",")).list().get(lit(index), true)
}

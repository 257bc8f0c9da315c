// crates/lakeport-core/src/stages/city.rs
//
// City dimension: normalize the demographics column names, pivot the
// per-race rows into one wide row per city, aggregate the remaining
// demographic measures, and join in the external city-code lookup.
//
// The race pivot is a two-pass discover-then-pivot: the category set is
// read from the data at runtime, so adding a new race value to the input
// changes the output schema.

use std::collections::BTreeSet;

use polars::prelude::*;

use super::underscore_columns;
use crate::config::LakeConfig;
use crate::error::Result;
use crate::session::LakeSession;
use crate::tables::CITY_TABLE;

pub fn run(session: &LakeSession, config: &LakeConfig) -> Result<usize> {
    let demographics = underscore_columns(session.read_csv(&config.sources.city_demographics, b';')?)?;
    let lookup = session.read_csv(&config.sources.city_state_codes, b',')?;
    let shaped = shape(demographics, lookup)?;
    session.write_table(&shaped, CITY_TABLE)
}

/// Demographics input is one row per (city, race); output is one row per
/// (city, state). Cities missing from the lookup keep a null `city_code`.
fn shape(demographics: DataFrame, lookup: DataFrame) -> Result<DataFrame> {
    let demographics = demographics.lazy().with_column(
        concat_str([col("City"), col("State_Code")], "_", false).alias("city_state_code"),
    );

    let race = pivot_race(demographics.clone())?;

    let aggregated = demographics.group_by([
        col("city_state_code"),
        col("City"),
        col("State"),
        col("State_Code"),
    ]);
    let aggregated = aggregated.agg([
        col("Median_Age").cast(DataType::Float64).mean().alias("Median_Age"),
        col("Male_Population").cast(DataType::Int64).sum().alias("Male_Population"),
        col("Female_Population").cast(DataType::Int64).sum().alias("Female_Population"),
        col("Total_Population").cast(DataType::Int64).sum().alias("Total_Population"),
        col("Number_of_Veterans").cast(DataType::Int64).sum().alias("Number_of_Veterans"),
        col("Foreign_born").cast(DataType::Int64).sum().alias("Foreign_born"),
        col("Average_Household_Size")
            .cast(DataType::Float64)
            .mean()
            .alias("Average_Household_Size"),
    ]);

    let lookup_keys = lookup.lazy().select([
        concat_str([col("city_name"), col("state_code")], "_", false)
            .str()
            .to_lowercase()
            .alias("lookup_key"),
        col("city_code"),
    ]);

    let df = aggregated
        // inner: a city with no race rows at all is dropped
        .join(
            race.lazy(),
            [col("city_state_code")],
            [col("city_state_code")],
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(col("city_state_code").str().to_lowercase().alias("lookup_key"))
        .join(
            lookup_keys,
            [col("lookup_key")],
            [col("lookup_key")],
            JoinArgs::new(JoinType::Left),
        )
        .drop(["lookup_key"])
        .collect()?;
    Ok(df)
}

/// One integer column per distinct `Race` value, summing `Count` per city.
/// A city with no rows for a category gets null, not zero. Post-pivot column
/// names get the same space/hyphen scrub as the raw columns.
fn pivot_race(demographics: LazyFrame) -> Result<DataFrame> {
    let observed = demographics.clone().select([col("Race")]).collect()?;
    let mut categories = BTreeSet::new();
    for race in observed.column("Race")?.str()?.into_iter().flatten() {
        categories.insert(race.to_string());
    }

    let mut aggs = Vec::with_capacity(categories.len());
    for race in &categories {
        let matched = col("Race").eq(lit(race.as_str()));
        let column = race.replace(' ', "_").replace('-', "_");
        aggs.push(
            when(matched.clone().any(true))
                .then(col("Count").cast(DataType::Int64).filter(matched).sum())
                .otherwise(lit(NULL))
                .alias(column),
        );
    }

    let df = demographics
        .group_by([col("city_state_code")])
        .agg(aggs)
        .collect()?;
    Ok(df)
}

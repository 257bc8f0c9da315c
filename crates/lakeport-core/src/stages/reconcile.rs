// crates/lakeport-core/src/stages/reconcile.rs
//
// Post-load reconciliation: re-read every source and destination table,
// compare record counts per logical table, and count duplicate keys in the
// city and airport dimensions. A missing table on either side aborts the
// whole check with no partial report.

use polars::df;
use polars::prelude::*;
use serde::Serialize;

use super::underscore_columns;
use crate::config::LakeConfig;
use crate::error::Result;
use crate::session::LakeSession;
use crate::tables::{
    AIRPORT_TABLE, CITY_TABLE, COUNTRY_TABLE, DUPLICATE_ROW_CHECK_TABLE, IMMIGRATION_TABLE,
    ROW_COUNT_CHECK_TABLE, TRANSPORT_TABLE, VISA_TABLE,
};

#[derive(Debug, Clone, Serialize)]
pub struct CountRow {
    pub table_name: String,
    pub source_count: i64,
    pub destination_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateRow {
    pub table_name: String,
    pub number_of_duplicates: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub counts: Vec<CountRow>,
    pub duplicates: Vec<DuplicateRow>,
}

impl ReconciliationReport {
    /// True when every logical table has matching counts and no duplicate
    /// keys were found.
    pub fn is_clean(&self) -> bool {
        self.counts
            .iter()
            .all(|row| row.source_count == row.destination_count)
            && self.duplicates.iter().all(|row| row.number_of_duplicates == 0)
    }

    pub fn counts_frame(&self) -> Result<DataFrame> {
        let df = df!(
            "table_name" => self.counts.iter().map(|r| r.table_name.as_str()).collect::<Vec<_>>(),
            "source_count" => self.counts.iter().map(|r| r.source_count).collect::<Vec<_>>(),
            "destination_count" => self.counts.iter().map(|r| r.destination_count).collect::<Vec<_>>(),
        )?;
        Ok(df)
    }

    pub fn duplicates_frame(&self) -> Result<DataFrame> {
        let df = df!(
            "table_name" => self.duplicates.iter().map(|r| r.table_name.as_str()).collect::<Vec<_>>(),
            "number_of_duplicates" => self.duplicates.iter().map(|r| r.number_of_duplicates).collect::<Vec<_>>(),
        )?;
        Ok(df)
    }
}

/// Run the full check and persist both report tables to the lake.
pub fn run(session: &LakeSession, config: &LakeConfig) -> Result<ReconciliationReport> {
    let report = build_report(session, config)?;
    session.write_table(&report.counts_frame()?, ROW_COUNT_CHECK_TABLE)?;
    session.write_table(&report.duplicates_frame()?, DUPLICATE_ROW_CHECK_TABLE)?;
    Ok(report)
}

fn build_report(session: &LakeSession, config: &LakeConfig) -> Result<ReconciliationReport> {
    let sources = &config.sources;

    // city: one source row per (city, race), one destination row per city,
    // so both sides count distinct city names
    let city_source =
        underscore_columns(session.read_csv(&sources.city_demographics, b';')?)?;
    let city = CountRow {
        table_name: "city_table".to_string(),
        source_count: distinct_count(city_source.lazy(), "City")?,
        destination_count: distinct_count(session.scan_table(CITY_TABLE)?, "City")?,
    };

    let visa = CountRow {
        table_name: "visa_table".to_string(),
        source_count: non_null_count(session.read_csv(&sources.visa_types, b',')?.lazy(), "visa_type_id")?,
        destination_count: non_null_count(session.scan_table(VISA_TABLE)?, "visa_type_id")?,
    };

    // the source side re-applies the transformer's filter so the comparison
    // is apples-to-apples
    let airport_source = session
        .read_csv(&sources.airport_codes, b',')?
        .lazy()
        .filter(
            col("type")
                .neq(lit("closed"))
                .and(col("iso_country").eq(lit("US"))),
        );
    let airport = CountRow {
        table_name: "airport_table".to_string(),
        source_count: non_null_count(airport_source, "iata_code")?,
        destination_count: non_null_count(session.scan_table(AIRPORT_TABLE)?, "iata_code")?,
    };

    let country = CountRow {
        table_name: "country_table".to_string(),
        source_count: non_null_count(session.read_csv(&sources.country_codes, b',')?.lazy(), "country_code")?,
        destination_count: non_null_count(session.scan_table(COUNTRY_TABLE)?, "country_code")?,
    };

    let transport = CountRow {
        table_name: "transport_table".to_string(),
        source_count: non_null_count(session.read_csv(&sources.transport_modes, b',')?.lazy(), "trans_mode_id")?,
        destination_count: non_null_count(session.scan_table(TRANSPORT_TABLE)?, "trans_mode_id")?,
    };

    let immigration = CountRow {
        table_name: "immigration_table".to_string(),
        source_count: non_null_count(session.scan_source_parquet(&sources.immigration)?, "cicid")?,
        destination_count: non_null_count(session.scan_table(IMMIGRATION_TABLE)?, "cicid")?,
    };

    let duplicates = vec![
        DuplicateRow {
            table_name: "city_table".to_string(),
            number_of_duplicates: duplicate_key_count(session.scan_table(CITY_TABLE)?, "City")?,
        },
        DuplicateRow {
            table_name: "airport_table".to_string(),
            number_of_duplicates: duplicate_key_count(session.scan_table(AIRPORT_TABLE)?, "iata_code")?,
        },
    ];

    Ok(ReconciliationReport {
        counts: vec![city, visa, airport, country, transport, immigration],
        duplicates,
    })
}

/// Count of non-null values in `column`.
fn non_null_count(lf: LazyFrame, column: &str) -> Result<i64> {
    let df = lf.select([col(column).count().alias("n")]).collect()?;
    Ok(df.column("n")?.u32()?.get(0).unwrap_or(0) as i64)
}

/// Count of distinct non-null values in `column`.
fn distinct_count(lf: LazyFrame, column: &str) -> Result<i64> {
    let df = lf
        .select([col(column).drop_nulls().n_unique().alias("n")])
        .collect()?;
    Ok(df.column("n")?.u32()?.get(0).unwrap_or(0) as i64)
}

/// How many non-null values of `key` occur more than once.
fn duplicate_key_count(lf: LazyFrame, key: &str) -> Result<i64> {
    let df = lf
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([len().alias("occurrences")])
        .filter(col("occurrences").gt(lit(1)))
        .collect()?;
    Ok(df.height() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn duplicate_key_count_flags_repeated_keys() {
        let df = df!(
            "City" => ["Quincy", "Quincy", "Aurora", "quincy"],
        )
        .unwrap();
        // "Quincy" twice; "quincy" is a distinct key (case-duplicates are
        // exactly what this check is meant to surface downstream)
        assert_eq!(duplicate_key_count(df.lazy(), "City").unwrap(), 1);
    }

    #[test]
    fn counts_ignore_nulls() {
        let df = df!(
            "iata_code" => [Some("TST"), None, Some("PDO"), Some("TST")],
        )
        .unwrap();
        assert_eq!(non_null_count(df.clone().lazy(), "iata_code").unwrap(), 3);
        assert_eq!(distinct_count(df.lazy(), "iata_code").unwrap(), 2);
    }

    #[test]
    fn clean_report_detection() {
        let report = ReconciliationReport {
            counts: vec![CountRow {
                table_name: "visa_table".to_string(),
                source_count: 3,
                destination_count: 3,
            }],
            duplicates: vec![DuplicateRow {
                table_name: "city_table".to_string(),
                number_of_duplicates: 0,
            }],
        };
        assert!(report.is_clean());

        let mut dirty = report.clone();
        dirty.counts[0].destination_count = 2;
        assert!(!dirty.is_clean());
    }
}

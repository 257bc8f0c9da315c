// crates/lakeport-core/src/session.rs

use std::fs;
use std::path::{Path, PathBuf};

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::io::HiveOptions;
use polars::prelude::*;
use tracing::debug;

use crate::config::LakeConfig;
use crate::error::{PipelineError, Result};

/// Explicitly scoped handle on the source directory and the lake root.
///
/// Every stage takes a `&LakeSession`; it is the only component that touches
/// storage, and it is dropped deterministically at the end of the run. All
/// writes are whole-directory overwrites, which is the pipeline's only
/// idempotence mechanism: re-running a stage replaces its destination
/// wholesale.
pub struct LakeSession {
    source_root: PathBuf,
    dest_root: PathBuf,
}

impl LakeSession {
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Result<Self> {
        let dest_root = dest_root.into();
        fs::create_dir_all(&dest_root)?;
        Ok(Self {
            source_root: source_root.into(),
            dest_root,
        })
    }

    pub fn from_config(config: &LakeConfig) -> Result<Self> {
        Self::new(&config.paths.source_root, &config.paths.dest_root)
    }

    pub fn source_path(&self, file: &str) -> PathBuf {
        self.source_root.join(file)
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dest_root.join(table)
    }

    /// Eagerly read a delimited source file. Header row required.
    pub fn read_csv(&self, file: &str, separator: u8) -> Result<DataFrame> {
        let path = self.source_path(file);
        if !path.is_file() {
            return Err(PipelineError::MissingTable {
                table: file.to_string(),
                path,
            });
        }

        let parse_options = CsvParseOptions::default().with_separator(separator);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .with_parse_options(parse_options)
            .try_into_reader_with_file_path(Some(path))?
            .finish()?;
        Ok(df)
    }

    /// Lazily scan a parquet directory under the source root, recursing into
    /// partition subdirectories.
    pub fn scan_source_parquet(&self, dir: &str) -> Result<LazyFrame> {
        let path = self.source_path(dir);
        scan_parquet_dir(&path, dir)
    }

    /// Lazily scan a destination table previously written by a stage.
    pub fn scan_table(&self, table: &str) -> Result<LazyFrame> {
        let path = self.table_path(table);
        scan_parquet_dir(&path, table)
    }

    /// Overwrite `table` with a single parquet file. Returns the row count.
    pub fn write_table(&self, df: &DataFrame, table: &str) -> Result<usize> {
        let dir = self.replace_table_dir(table)?;
        write_parquet_file(df, &dir.join("data.parquet"))?;
        debug!(table, rows = df.height(), "table written");
        Ok(df.height())
    }

    /// Overwrite `table` with one parquet file per distinct key combination,
    /// laid out as `key=value` subdirectories so readers can prune partitions
    /// by predicate. Key columns are kept in the files as well.
    pub fn write_partitioned(&self, df: &DataFrame, table: &str, keys: &[&str]) -> Result<usize> {
        let dir = self.replace_table_dir(table)?;

        let partitions = df.partition_by(keys.to_vec(), true)?;
        for partition in &partitions {
            let mut part_dir = dir.clone();
            for key in keys {
                let value = partition.column(key)?.get(0)?;
                part_dir = part_dir.join(format!("{}={}", key, partition_value(&value)));
            }
            fs::create_dir_all(&part_dir)?;
            write_parquet_file(partition, &part_dir.join("data.parquet"))?;
        }
        debug!(
            table,
            rows = df.height(),
            partitions = partitions.len(),
            "partitioned table written"
        );
        Ok(df.height())
    }

    fn replace_table_dir(&self, table: &str) -> Result<PathBuf> {
        let dir = self.table_path(table);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

fn scan_parquet_dir(path: &Path, table: &str) -> Result<LazyFrame> {
    if !path.is_dir() {
        return Err(PipelineError::MissingTable {
            table: table.to_string(),
            path: path.to_path_buf(),
        });
    }
    let pattern = path.join("**").join("*.parquet");
    // partition key columns are kept inside the files, so the path must not
    // contribute hive-derived duplicates
    let args = ScanArgsParquet {
        hive_options: HiveOptions {
            enabled: Some(false),
            ..Default::default()
        },
        ..Default::default()
    };
    let lf = LazyFrame::scan_parquet(&pattern, args)?;
    Ok(lf)
}

fn write_parquet_file(df: &DataFrame, path: &Path) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut clone = df.clone();
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(&mut clone)?;
    Ok(())
}

fn partition_value(value: &AnyValue) -> String {
    match value {
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn scratch_session() -> (tempfile::TempDir, LakeSession) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = tmp.path().join("source");
        fs::create_dir_all(&source).expect("source dir");
        let session =
            LakeSession::new(source, tmp.path().join("lake")).expect("session should build");
        (tmp, session)
    }

    #[test]
    fn write_table_then_scan_round_trips() {
        let (_tmp, session) = scratch_session();
        let df = df!(
            "code" => ["B1", "B2", "F1"],
            "description" => ["business", "tourist", "student"],
        )
        .unwrap();

        let rows = session.write_table(&df, "visa_dimension_data").unwrap();
        assert_eq!(rows, 3);

        let back = session
            .scan_table("visa_dimension_data")
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(back.height(), 3);
        assert_eq!(back.get_column_names(), df.get_column_names());
    }

    #[test]
    fn write_table_overwrites_wholesale() {
        let (_tmp, session) = scratch_session();
        let first = df!("code" => ["A", "B", "C"]).unwrap();
        let second = df!("code" => ["Z"]).unwrap();

        session.write_table(&first, "t").unwrap();
        session.write_table(&second, "t").unwrap();

        let back = session.scan_table("t").unwrap().collect().unwrap();
        assert_eq!(back.height(), 1);
    }

    #[test]
    fn partitioned_write_creates_key_value_directories() {
        let (_tmp, session) = scratch_session();
        let df = df!(
            "i94yr" => [2016i32, 2016, 2016],
            "i94mon" => [4i32, 4, 5],
            "cicid" => [1i32, 2, 3],
        )
        .unwrap();

        session
            .write_partitioned(&df, "immigration_facts_data", &["i94yr", "i94mon"])
            .unwrap();

        let april = session
            .table_path("immigration_facts_data")
            .join("i94yr=2016")
            .join("i94mon=4")
            .join("data.parquet");
        assert!(april.is_file());

        let back = session
            .scan_table("immigration_facts_data")
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(back.height(), 3);
    }

    #[test]
    fn missing_table_fails_fast() {
        let (_tmp, session) = scratch_session();
        let err = session.scan_table("never_written").map(|_| ()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingTable { .. }));

        let err = session.read_csv("no_such_file.csv", b',').unwrap_err();
        assert!(matches!(err, PipelineError::MissingTable { .. }));
    }
}

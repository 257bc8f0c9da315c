// crates/lakeport-core/src/stages/reference.rs
//
// Pass-through loaders for the small reference tables: read one delimited
// file, write it unchanged to the lake. No validation, no transformation,
// fail-fast on any read or write error.

use crate::config::LakeConfig;
use crate::error::Result;
use crate::session::LakeSession;
use crate::tables::{COUNTRY_TABLE, TRANSPORT_TABLE, VISA_TABLE};

pub fn run_visa(session: &LakeSession, config: &LakeConfig) -> Result<usize> {
    passthrough(session, &config.sources.visa_types, VISA_TABLE)
}

pub fn run_transport(session: &LakeSession, config: &LakeConfig) -> Result<usize> {
    passthrough(session, &config.sources.transport_modes, TRANSPORT_TABLE)
}

pub fn run_country(session: &LakeSession, config: &LakeConfig) -> Result<usize> {
    passthrough(session, &config.sources.country_codes, COUNTRY_TABLE)
}

fn passthrough(session: &LakeSession, file: &str, table: &str) -> Result<usize> {
    let df = session.read_csv(file, b',')?;
    session.write_table(&df, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn visa_passthrough_preserves_rows_and_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("source");
        fs::create_dir_all(&source).unwrap();
        fs::write(
            source.join("visa_type.csv"),
            "visa_type_id,visa_category\n1,Business\n2,Pleasure\n3,Student\n",
        )
        .unwrap();

        let session = LakeSession::new(&source, tmp.path().join("lake")).unwrap();
        let config: LakeConfig = toml::from_str(
            r#"
            [paths]
            source_root = "unused"
            dest_root = "unused"
            "#,
        )
        .unwrap();

        let rows = run_visa(&session, &config).unwrap();
        assert_eq!(rows, 3);

        let back = session.scan_table(VISA_TABLE).unwrap().collect().unwrap();
        let names: Vec<&str> = back.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, ["visa_type_id", "visa_category"]);
        assert_eq!(back.height(), 3);
    }
}

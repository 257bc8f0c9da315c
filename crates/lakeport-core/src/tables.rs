// crates/lakeport-core/src/tables.rs
//
// Destination directory names under the lake root. The reconciliation stage
// reads these back, so both sides go through the same constants.

pub const VISA_TABLE: &str = "visa_dimension_data";
pub const TRANSPORT_TABLE: &str = "us_transport_mode_dimension_data";
pub const COUNTRY_TABLE: &str = "country_dimension_data";
pub const AIRPORT_TABLE: &str = "airport_dimension_data";
pub const CITY_TABLE: &str = "city_dimension_data";
pub const TEMPERATURE_TABLE: &str = "us_temperature_dimension_data";
pub const IMMIGRATION_TABLE: &str = "immigration_facts_data";
pub const ROW_COUNT_CHECK_TABLE: &str = "row_count_check";
pub const DUPLICATE_ROW_CHECK_TABLE: &str = "duplicate_row_check";

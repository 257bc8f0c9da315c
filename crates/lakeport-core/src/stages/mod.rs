// crates/lakeport-core/src/stages/mod.rs

use polars::prelude::*;

use crate::error::Result;

pub mod airport;
pub mod city;
pub mod immigration;
pub mod reconcile;
pub mod reference;
pub mod temperature;

/// Fixed-precision decimal(16, 4), the precision the lake schema uses for
/// coordinates and temperature measures.
pub(crate) fn decimal16_4(expr: Expr) -> Expr {
    expr.cast(DataType::Float64)
        .cast(DataType::Decimal(Some(16), Some(4)))
}

/// Replace spaces, then hyphens, with underscores in every column name.
pub(crate) fn underscore_columns(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str().replace(' ', "_").replace('-', "_"))
        .collect();
    df.set_column_names(names.iter().map(|name| name.as_str()))?;
    Ok(df)
}

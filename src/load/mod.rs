// src/load/mod.rs
pub mod cache;

pub use cache::{LoadCache, LoadOutcome};

use crate::derive::{derive_revenue, DerivedTable};
use crate::error::LoadError;
use crate::table::{convert::convert_to_final_types, validate_columns, SalesTable};
use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{fs, io::Cursor, path::Path, sync::Arc, time::Instant};
use tracing::{debug, info};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Read the whole CSV at `path` into a validated [`SalesTable`].
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_sales_csv<P: AsRef<Path>>(path: P) -> Result<SalesTable, LoadError> {
    let path = path.as_ref();
    let start = Instant::now();

    let bytes = fs::read(path).map_err(|e| LoadError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(bytes = bytes.len(), "read source");

    let table = parse_sales_csv(&bytes)?;
    info!(rows = table.num_rows(), elapsed = ?start.elapsed(), "loaded sales table");
    Ok(table)
}

/// Load and derive in one step; this is what the session cache memoises.
///
/// A product that overflows `f64` is rejected here so every later stage sees
/// finite revenue.
pub fn load_and_derive(path: &Path) -> Result<DerivedTable, LoadError> {
    let derived = derive_revenue(load_sales_csv(path)?);
    match derived.first_non_finite() {
        Some(row) => Err(LoadError::RevenueOverflow { row }),
        None => Ok(derived),
    }
}

/// Parse CSV bytes (header row required) into a validated [`SalesTable`].
///
/// Every column is first read as `Utf8` so that no type inference can drift
/// between files; the required numeric columns are then converted.
pub fn parse_sales_csv(bytes: &[u8]) -> Result<SalesTable, LoadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    // 1) header only, then fail fast on a missing column
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(bytes), Some(0))?;
    let headers: Vec<String> = inferred.fields().iter().map(|f| f.name().clone()).collect();
    validate_columns(&headers)?;

    // 2) read every row as text
    let schema = Arc::new(Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(Cursor::new(bytes))?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    let raw = concat_batches(&schema, &batches)?;

    // 3) typed columns
    let typed = convert_to_final_types(&raw)?;
    SalesTable::try_from_batch(typed)
}

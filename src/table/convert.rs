use crate::error::LoadError;
use crate::table::{numeric_column, utils, PERIOD_COLUMNS};
use arrow::{
    array::{Array, ArrayRef, Float64Builder, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Convert the all-`Utf8` batch the CSV reader produced into final types:
/// quantity and unit price become `Float64`, every other column is text with
/// nulls replaced by `""`. Text cells are kept as written, so `" A"` and `"A"`
/// are different products. Month and year columns whose cells are all
/// integers are rewritten in canonical integer form.
///
/// A numeric cell that is empty or unparsable fails the whole conversion.
pub fn convert_to_final_types(batch: &RecordBatch) -> Result<RecordBatch, LoadError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut out = Vec::with_capacity(batch.num_columns());

    for (arr, fld) in batch.columns().iter().zip(schema.fields()) {
        match (
            arr.as_any().downcast_ref::<StringArray>(),
            numeric_column(fld.name()),
        ) {
            // Quantity / price → f64
            (Some(sarr), Some(column)) => {
                let mut b = Float64Builder::with_capacity(sarr.len());
                for (idx, opt) in sarr.iter().enumerate() {
                    let raw = opt.unwrap_or("");
                    let v = utils::parse_number(raw).ok_or_else(|| LoadError::InvalidValue {
                        column,
                        row: idx + 1,
                        value: raw.to_string(),
                    })?;
                    b.append_value(v);
                }
                fields.push(Field::new(fld.name(), DataType::Float64, false));
                out.push(Arc::new(b.finish()) as ArrayRef);
            }

            // Text → non-null
            (Some(sarr), None) => {
                let cells = || sarr.iter().map(|opt| opt.unwrap_or(""));
                let text: StringArray = if PERIOD_COLUMNS.contains(&fld.name().as_str()) {
                    match utils::canonical_integers(cells()) {
                        Some(ints) => ints.into_iter().map(Some).collect(),
                        None => cells().map(Some).collect(),
                    }
                } else {
                    cells().map(Some).collect()
                };
                fields.push(Field::new(fld.name(), DataType::Utf8, false));
                out.push(Arc::new(text) as ArrayRef);
            }

            // Everything else
            _ => {
                fields.push(fld.as_ref().clone());
                out.push(arr.clone());
            }
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), out).map_err(Into::into)
}

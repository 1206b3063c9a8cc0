// src/table/mod.rs
pub mod convert;
pub mod utils;

use crate::error::LoadError;
use arrow::{
    array::{Array, Float64Array, StringArray},
    error::ArrowError,
    record_batch::RecordBatch,
    util::display::array_value_to_string,
};

pub const CANTIDAD: &str = "cantidad";
pub const PRECIO_UNITARIO: &str = "precio_unitario";
pub const MES: &str = "mes";
pub const ANIO: &str = "año";
pub const PRODUCTO: &str = "Producto";
pub const CATEGORIA: &str = "Categoria";
pub const TOTAL_VENTA: &str = "Total_Venta";

/// Columns every sales file must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 6] = [CANTIDAD, PRECIO_UNITARIO, MES, ANIO, PRODUCTO, CATEGORIA];

/// Columns parsed as `Float64`; everything else stays text.
pub const NUMERIC_COLUMNS: [&str; 2] = [CANTIDAD, PRECIO_UNITARIO];

/// Month and year columns: integer-valued periods are stored in canonical form.
pub const PERIOD_COLUMNS: [&str; 2] = [MES, ANIO];

/// Map a header to its `'static` numeric column name, if it is one.
pub fn numeric_column(name: &str) -> Option<&'static str> {
    NUMERIC_COLUMNS.iter().copied().find(|c| *c == name)
}

/// First required column missing from `headers`.
pub fn validate_columns<S: AsRef<str>>(headers: &[S]) -> Result<(), LoadError> {
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.as_ref() == required) {
            return Err(LoadError::MissingColumn(required));
        }
    }
    Ok(())
}

/// A validated, typed sales table.
///
/// The full batch is kept (extra columns included) for the raw view; the
/// required columns are held as typed arrays so downstream code never has to
/// downcast or handle a missing column again.
#[derive(Debug, Clone)]
pub struct SalesTable {
    batch: RecordBatch,
    producto: StringArray,
    categoria: StringArray,
    mes: StringArray,
    anio: StringArray,
    cantidad: Float64Array,
    precio_unitario: Float64Array,
}

impl SalesTable {
    pub fn try_from_batch(batch: RecordBatch) -> Result<Self, LoadError> {
        validate_columns(
            &batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect::<Vec<_>>(),
        )?;

        Ok(Self {
            producto: text(&batch, PRODUCTO)?,
            categoria: text(&batch, CATEGORIA)?,
            mes: text(&batch, MES)?,
            anio: text(&batch, ANIO)?,
            cantidad: numeric(&batch, CANTIDAD)?,
            precio_unitario: numeric(&batch, PRECIO_UNITARIO)?,
            batch,
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn producto(&self) -> &StringArray {
        &self.producto
    }

    pub fn categoria(&self) -> &StringArray {
        &self.categoria
    }

    pub fn mes(&self) -> &StringArray {
        &self.mes
    }

    pub fn anio(&self) -> &StringArray {
        &self.anio
    }

    pub fn cantidad(&self) -> &Float64Array {
        &self.cantidad
    }

    pub fn precio_unitario(&self) -> &Float64Array {
        &self.precio_unitario
    }

    /// Display text for one cell of the raw view.
    pub fn cell_text(&self, row: usize, col: usize) -> String {
        let arr = self.batch.column(col);
        if let Some(s) = arr.as_any().downcast_ref::<StringArray>() {
            return s.value(row).to_string();
        }
        if let Some(f) = arr.as_any().downcast_ref::<Float64Array>() {
            return format_cell(f.value(row));
        }
        array_value_to_string(arr, row).unwrap_or_default()
    }
}

/// Numbers as pandas would show them in a table: integral values without
/// a fractional part.
pub fn format_cell(v: f64) -> String {
    format!("{}", v)
}

fn text(batch: &RecordBatch, name: &'static str) -> Result<StringArray, LoadError> {
    let col = batch
        .column_by_name(name)
        .ok_or(LoadError::MissingColumn(name))?;
    col.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| wrong_type(name, col.data_type()))
}

fn numeric(batch: &RecordBatch, name: &'static str) -> Result<Float64Array, LoadError> {
    let col = batch
        .column_by_name(name)
        .ok_or(LoadError::MissingColumn(name))?;
    col.as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| wrong_type(name, col.data_type()))
}

fn wrong_type(name: &str, got: &arrow::datatypes::DataType) -> LoadError {
    LoadError::Arrow(ArrowError::SchemaError(format!(
        "column {} has unexpected type {}",
        name, got
    )))
}

// src/error.rs

use arrow::error::ArrowError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between opening the CSV and handing back a
/// validated table. None of these escape the load boundary: the pipeline turns
/// them into the error banner.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no se pudo leer {path:?}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Falta la columna requerida: {0}")]
    MissingColumn(&'static str),

    #[error("valor no numérico en la columna {column}, fila {row}: {value:?}")]
    InvalidValue {
        column: &'static str,
        /// 1-based data row (header excluded).
        row: usize,
        value: String,
    },

    #[error("Total_Venta fuera de rango en la fila {row}")]
    RevenueOverflow {
        /// 1-based data row (header excluded).
        row: usize,
    },

    #[error("error de arrow: {0}")]
    Arrow(#[from] ArrowError),
}

impl LoadError {
    /// The text shown in the inline banner.
    pub fn banner(&self) -> String {
        format!("Error al cargar los datos: {}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_banner_names_the_column() {
        let err = LoadError::MissingColumn("Categoria");
        assert_eq!(
            err.banner(),
            "Error al cargar los datos: Falta la columna requerida: Categoria"
        );
    }

    #[test]
    fn invalid_value_mentions_row_and_column() {
        let err = LoadError::InvalidValue {
            column: "cantidad",
            row: 3,
            value: "dos".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cantidad"));
        assert!(msg.contains("fila 3"));
        assert!(msg.contains("\"dos\""));
    }
}

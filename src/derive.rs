// src/derive.rs

use crate::table::{SalesTable, TOTAL_VENTA};
use arrow::array::Float64Array;

/// A sales table with `Total_Venta` computed for every row.
#[derive(Debug, Clone)]
pub struct DerivedTable {
    table: SalesTable,
    total_venta: Float64Array,
}

impl DerivedTable {
    pub fn table(&self) -> &SalesTable {
        &self.table
    }

    pub fn total_venta(&self) -> &Float64Array {
        &self.total_venta
    }

    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    /// 1-based row of the first revenue that overflowed `f64`, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.total_venta
            .values()
            .iter()
            .position(|v| !v.is_finite())
            .map(|idx| idx + 1)
    }

    /// Raw-view header: every source column followed by `Total_Venta`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.table.column_names();
        names.push(TOTAL_VENTA.to_string());
        names
    }
}

/// `Total_Venta = cantidad * precio_unitario`, row by row.
///
/// Both inputs are non-null `Float64` after loading, so this cannot fail.
pub fn derive_revenue(table: SalesTable) -> DerivedTable {
    let total_venta = Float64Array::from_iter_values(
        table
            .cantidad()
            .values()
            .iter()
            .zip(table.precio_unitario().values().iter())
            .map(|(qty, price)| qty * price),
    );
    DerivedTable { table, total_venta }
}

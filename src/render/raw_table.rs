use crate::derive::DerivedTable;
use crate::table::format_cell;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTable {
    /// Column names as they appear in the file, then `Total_Venta`.
    pub headers: Vec<String>,
    /// Each row as display strings (one per header).
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_derived(derived: &DerivedTable) -> Self {
        let table = derived.table();
        let source_cols = table.batch().num_columns();
        let revenue = derived.total_venta().values();

        let rows = (0..derived.num_rows())
            .map(|row| {
                let mut cells: Vec<String> =
                    (0..source_cols).map(|col| table.cell_text(row, col)).collect();
                cells.push(format_cell(revenue[row]));
                cells
            })
            .collect();

        Self {
            headers: derived.column_names(),
            rows,
        }
    }
}

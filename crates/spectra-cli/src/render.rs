// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Terminal tables for materialized data.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use spectra_codec::Value;
use spectra_store::{ColumnData, ColumnTable, RowTable};

/// Longest text shown in a cell before it is cut.
const MAX_CELL_CHARS: usize = 32;

/// Display form of one cell; arrays render as `dtype[shape]`.
pub fn cell(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= MAX_CELL_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(MAX_CELL_CHARS - 1).collect();
    cut.push('…');
    cut
}

fn table_with_header<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// First `limit` rows of a row table.
pub fn rows(data: &RowTable, limit: usize) -> Table {
    let mut table = table_with_header(data.columns.iter().map(|c| c.name.as_str()));
    for row in data.rows.iter().take(limit) {
        table.add_row(row.iter().map(cell));
    }
    table
}

/// First `limit` rows of a column table, read back cell by cell.
pub fn columns(data: &ColumnTable, limit: usize) -> Table {
    let mut table = table_with_header(data.columns.iter().map(|c| c.header.name.as_str()));
    for r in 0..data.num_rows.min(limit) {
        table.add_row(
            (0..data.columns.len()).map(|c| data.value(r, c).as_ref().map_or_else(String::new, cell)),
        );
    }
    table
}

/// One line per column: name, declared type, and in-memory representation.
pub fn column_layout(data: &ColumnTable) -> Table {
    let mut table = table_with_header(["column", "declared", "storage"]);
    for col in &data.columns {
        let storage = match &col.data {
            ColumnData::Uniform(array) => format!("uniform {}", array.data_type()),
            ColumnData::Boxed(_) => "boxed".to_owned(),
        };
        table.add_row([
            col.header.name.clone(),
            col.header.decl_type.clone().unwrap_or_default(),
            storage,
        ]);
    }
    table
}

/// `"N rows × M columns"` summary line.
pub fn summary(num_rows: usize, num_columns: usize, shown: usize) -> String {
    if shown < num_rows {
        format!("{num_rows} rows × {num_columns} columns (showing {shown})")
    } else {
        format!("{num_rows} rows × {num_columns} columns")
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Conversions between storage-class cells and rusqlite values.

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, Statement};
use spectra_codec::{CodecError, StoredValue, TypeRegistry, Value};

use crate::table::TableName;

/// Bindable form of an encoded cell.
pub(crate) fn to_sql(stored: StoredValue) -> SqlValue {
    match stored {
        StoredValue::Null => SqlValue::Null,
        StoredValue::Integer(v) => SqlValue::Integer(v),
        StoredValue::Real(v) => SqlValue::Real(v),
        StoredValue::Text(s) => SqlValue::Text(s),
        StoredValue::Blob(b) => SqlValue::Blob(b),
    }
}

/// Owned storage-class cell read from a row.
pub(crate) fn from_sql(cell: ValueRef<'_>) -> rusqlite::Result<StoredValue> {
    Ok(match cell {
        ValueRef::Null => StoredValue::Null,
        ValueRef::Integer(v) => StoredValue::Integer(v),
        ValueRef::Real(v) => StoredValue::Real(v),
        ValueRef::Text(t) => StoredValue::Text(
            std::str::from_utf8(t)
                .map_err(rusqlite::Error::Utf8Error)?
                .to_owned(),
        ),
        ValueRef::Blob(b) => StoredValue::Blob(b.to_vec()),
    })
}

/// Decodes cell `index` of `row` through the codec for `decl_type`.
///
/// Codec failures are wrapped as conversion failures so they can cross a
/// rusqlite row mapper; `StoreError::from` unwraps them again.
pub(crate) fn decode_cell(
    registry: &TypeRegistry,
    row: &Row<'_>,
    index: usize,
    decl_type: Option<&str>,
) -> rusqlite::Result<Value> {
    let cell = row.get_ref(index)?;
    let ty = cell.data_type();
    registry
        .decode_for(decl_type, &from_sql(cell)?)
        .map_err(|e: CodecError| rusqlite::Error::FromSqlConversionFailure(index, ty, Box::new(e)))
}

/// Name and declared type of a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    /// Column name.
    pub name: String,
    /// Declared type as written in the DDL, if any.
    pub decl_type: Option<String>,
}

pub(crate) fn headers(stmt: &Statement<'_>) -> Vec<ColumnHeader> {
    stmt.columns()
        .iter()
        .map(|c| ColumnHeader {
            name: c.name().to_owned(),
            decl_type: c.decl_type().map(str::to_owned),
        })
        .collect()
}

/// `true` if the connected store already has a table named `table`.
///
/// Matches case-insensitively, as the store resolves table names.
pub(crate) fn table_exists(conn: &Connection, table: &TableName) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        [table.as_str()],
        |_| Ok(()),
    )
    .optional()
    .map(|hit| hit.is_some())
}

pub(crate) fn select_all(table: &TableName) -> String {
    format!("SELECT * FROM {}", table.quoted())
}


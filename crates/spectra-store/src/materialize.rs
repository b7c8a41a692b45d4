// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read-back of persisted tables into row- or column-oriented form.
//!
//! Both materializers scan the whole table with `SELECT *` and decode each
//! cell through the [`TypeRegistry`] codec named by the column's declared
//! type. They differ in shape of the result and in where decoding happens:
//! [`RowMaterializer`] decodes inside the row mapper, while
//! [`ColumnMaterializer`] walks a cursor, gathers raw cells per column, and
//! only then decodes and picks a representation per column.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, BinaryArray, BooleanArray, Float64Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use rusqlite::{Connection, OpenFlags};
use spectra_codec::{TypeRegistry, Value, ValueKind};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::sql::{self, ColumnHeader};
use crate::table::TableName;

fn open_read_only(path: &Path) -> Result<Connection, StoreError> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

/// Row-oriented table: decoded cells, one `Vec` per row, in storage order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTable {
    /// Result columns, in table order.
    pub columns: Vec<ColumnHeader>,
    /// Decoded rows.
    pub rows: Vec<Vec<Value>>,
}

impl RowTable {
    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell at `row`, `column`.
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)
    }
}

/// Loads a whole table as rows.
#[derive(Debug, Clone, Copy)]
pub struct RowMaterializer<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> RowMaterializer<'r> {
    /// Materializer decoding through `registry`.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Opens the store at `path` read-only and loads `table`.
    pub fn load_path(&self, path: impl AsRef<Path>, table: &str) -> Result<RowTable, StoreError> {
        let table = TableName::parse(table)?;
        let conn = open_read_only(path.as_ref())?;
        self.load(&conn, &table)
    }

    /// Loads `table` from an open connection.
    pub fn load(&self, conn: &Connection, table: &TableName) -> Result<RowTable, StoreError> {
        let mut stmt = conn.prepare(&sql::select_all(table))?;
        let columns = sql::headers(&stmt);
        let registry = self.registry;
        let rows = stmt
            .query_map([], |row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| sql::decode_cell(registry, row, i, c.decl_type.as_deref()))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        info!(%table, rows = rows.len(), columns = columns.len(), "row table loaded");
        Ok(RowTable { columns, rows })
    }
}

/// Physical representation of one materialized column.
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// Every cell is a null or a scalar of one compatible kind.
    Uniform(ArrayRef),
    /// Cells kept individually; used when any cell is an array or the scalar
    /// kinds cannot share one vector type.
    Boxed(Vec<Value>),
}

impl ColumnData {
    /// Builds the column representation for decoded `cells`.
    ///
    /// Cells of one scalar kind (nulls aside) share a vector. Any array cell,
    /// or any mix of kinds, yields [`ColumnData::Boxed`]; that includes
    /// integers next to reals, which keep their own kind per cell.
    pub fn from_values(cells: Vec<Value>) -> Self {
        let kinds: BTreeSet<ValueKind> = cells
            .iter()
            .map(Value::kind)
            .filter(|k| *k != ValueKind::Null)
            .collect();
        let kinds: Vec<ValueKind> = kinds.into_iter().collect();
        let array: ArrayRef = match kinds.as_slice() {
            [] => new_null_array(&DataType::Null, cells.len()),
            [ValueKind::Integer] => Arc::new(Int64Array::from(
                cells.iter().map(Value::as_i64).collect::<Vec<_>>(),
            )),
            [ValueKind::Real] => Arc::new(
                Float64Array::from(cells.iter().map(Value::as_f64).collect::<Vec<_>>()),
            ),
            [ValueKind::Boolean] => Arc::new(BooleanArray::from(
                cells.iter().map(Value::as_bool).collect::<Vec<_>>(),
            )),
            [ValueKind::Text] => Arc::new(StringArray::from(
                cells.iter().map(Value::as_str).collect::<Vec<_>>(),
            )),
            [ValueKind::Bytes] => Arc::new(BinaryArray::from_opt_vec(
                cells
                    .iter()
                    .map(|v| match v {
                        Value::Bytes(b) => Some(b.as_slice()),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => return Self::Boxed(cells),
        };
        Self::Uniform(array)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Self::Uniform(array) => array.len(),
            Self::Boxed(cells) => cells.len(),
        }
    }

    /// `true` when the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` for the per-cell representation.
    pub fn is_boxed(&self) -> bool {
        matches!(self, Self::Boxed(_))
    }

    /// Cell `row` as a [`Value`].
    pub fn value(&self, row: usize) -> Option<Value> {
        match self {
            Self::Boxed(cells) => cells.get(row).cloned(),
            Self::Uniform(array) => uniform_value(array, row),
        }
    }
}

fn uniform_value(array: &ArrayRef, row: usize) -> Option<Value> {
    if row >= array.len() {
        return None;
    }
    if array.is_null(row) {
        return Some(Value::Null);
    }
    let any = array.as_any();
    let value = match array.data_type() {
        DataType::Int64 => Value::Integer(any.downcast_ref::<Int64Array>()?.value(row)),
        DataType::Float64 => Value::Real(any.downcast_ref::<Float64Array>()?.value(row)),
        DataType::Boolean => Value::Boolean(any.downcast_ref::<BooleanArray>()?.value(row)),
        DataType::Utf8 => Value::Text(any.downcast_ref::<StringArray>()?.value(row).to_owned()),
        DataType::Binary => Value::Bytes(any.downcast_ref::<BinaryArray>()?.value(row).to_vec()),
        _ => Value::Null,
    };
    Some(value)
}

/// One named column of a [`ColumnTable`].
#[derive(Debug, Clone)]
pub struct MaterializedColumn {
    /// Name and declared type.
    pub header: ColumnHeader,
    /// Cells.
    pub data: ColumnData,
}

/// Column-oriented table.
#[derive(Debug, Clone)]
pub struct ColumnTable {
    /// Columns, in table order.
    pub columns: Vec<MaterializedColumn>,
    /// Number of rows.
    pub num_rows: usize,
}

impl ColumnTable {
    /// Column called `name`.
    pub fn column(&self, name: &str) -> Option<&MaterializedColumn> {
        self.columns.iter().find(|c| c.header.name == name)
    }

    /// Cell at `row`, `column`.
    pub fn value(&self, row: usize, column: usize) -> Option<Value> {
        self.columns.get(column)?.data.value(row)
    }
}

/// Loads a whole table as columns.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMaterializer<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> ColumnMaterializer<'r> {
    /// Materializer decoding through `registry`.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Opens the store at `path` read-only and loads `table`.
    pub fn load_path(&self, path: impl AsRef<Path>, table: &str) -> Result<ColumnTable, StoreError> {
        let table = TableName::parse(table)?;
        let conn = open_read_only(path.as_ref())?;
        self.load(&conn, &table)
    }

    /// Loads `table` from an open connection.
    pub fn load(&self, conn: &Connection, table: &TableName) -> Result<ColumnTable, StoreError> {
        let mut stmt = conn.prepare(&sql::select_all(table))?;
        let headers = sql::headers(&stmt);
        let mut raw: Vec<Vec<_>> = vec![Vec::new(); headers.len()];
        let mut num_rows = 0;
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            for (i, cells) in raw.iter_mut().enumerate() {
                cells.push(sql::from_sql(row.get_ref(i)?)?);
            }
            num_rows += 1;
        }

        let mut columns = Vec::with_capacity(headers.len());
        for (header, cells) in headers.into_iter().zip(raw) {
            let decoded = cells
                .iter()
                .map(|cell| self.registry.decode_for(header.decl_type.as_deref(), cell))
                .collect::<Result<Vec<_>, _>>()?;
            let data = ColumnData::from_values(decoded);
            debug!(%table, column = %header.name, boxed = data.is_boxed(), "column materialized");
            columns.push(MaterializedColumn { header, data });
        }
        info!(%table, rows = num_rows, columns = columns.len(), "column table loaded");
        Ok(ColumnTable { columns, num_rows })
    }
}

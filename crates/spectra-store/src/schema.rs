// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ordered column catalog for graph-record tables.
//!
//! The catalog order is the single source of column order: the emitted DDL,
//! the positional `INSERT` placeholders, and [`SchemaCatalog::project`] all
//! walk [`SchemaCatalog::columns`] front to back.

use std::fmt;

use spectra_codec::{Value, ARRAY, BOOLEAN};

use crate::error::StoreError;
use crate::table::TableName;

/// Declared type of a catalog column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Small integer (`TINYINT`).
    TinyInt,
    /// Integer (`SMALLINT`).
    SmallInt,
    /// Bounded text (`VARCHAR(n)`).
    Varchar(u16),
    /// Floating point (`REAL`).
    Real,
    /// N-d numeric array, stored through the `ARRAY` codec.
    Array,
    /// Boolean flag, stored through the `BOOLEAN` codec.
    Boolean,
}

impl ColumnType {
    /// Codec name for logical types the store has no native class for.
    pub const fn logical_name(self) -> Option<&'static str> {
        match self {
            Self::Array => Some(ARRAY),
            Self::Boolean => Some(BOOLEAN),
            Self::TinyInt | Self::SmallInt | Self::Varchar(_) | Self::Real => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TinyInt => f.write_str("TINYINT"),
            Self::SmallInt => f.write_str("SMALLINT"),
            Self::Varchar(len) => write!(f, "VARCHAR({len})"),
            Self::Real => f.write_str("REAL"),
            Self::Array => f.write_str(ARRAY),
            Self::Boolean => f.write_str(BOOLEAN),
        }
    }
}

/// One named, typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub ty: ColumnType,
}

impl ColumnDef {
    /// Builds a column definition.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Anything that can hand out its fields by column name.
pub trait Record {
    /// The value for column `name`, or `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

/// Ordered mapping from column name to declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCatalog {
    columns: Vec<ColumnDef>,
}

/// Column order of the graph-record table.
const GRAPH_RECORD_COLUMNS: [(&str, ColumnType); 16] = [
    ("num_vertices", ColumnType::TinyInt),
    ("graph6", ColumnType::Varchar(83)),
    ("band_01neg", ColumnType::TinyInt),
    ("band_1neg", ColumnType::Real),
    ("eigvals", ColumnType::Array),
    ("eigbasis_01neg", ColumnType::Array),
    ("eigbasis_1neg", ColumnType::Array),
    ("num_edges", ColumnType::SmallInt),
    ("density", ColumnType::Real),
    ("avg_degree", ColumnType::Real),
    ("is_connected", ColumnType::Boolean),
    ("is_regular", ColumnType::Boolean),
    ("is_bipartite", ColumnType::Boolean),
    ("is_cograph", ColumnType::Boolean),
    ("prime_factors", ColumnType::Array),
    ("compl_prime_factors", ColumnType::Array),
];

impl SchemaCatalog {
    /// Catalog over `columns`, in the given order.
    pub fn from_columns(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// The 16-column graph-record catalog.
    pub fn graph_records() -> Self {
        Self::from_columns(
            GRAPH_RECORD_COLUMNS
                .iter()
                .map(|&(name, ty)| ColumnDef::new(name, ty))
                .collect(),
        )
    }

    /// Columns in declared order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// `true` when the catalog has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in declared order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// `CREATE TABLE` statement for `table`.
    pub fn ddl_for(&self, table: &TableName) -> String {
        let cols = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({cols})", table.quoted())
    }

    /// Positional `INSERT` statement for `table`, one placeholder per column.
    pub fn insert_sql_for(&self, table: &TableName) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!("INSERT INTO {} VALUES ({placeholders})", table.quoted())
    }

    /// Extracts `record`'s fields in catalog order.
    ///
    /// Values are not type-checked here; encoding does that.
    pub fn project<R>(&self, record: &R) -> Result<Vec<Value>, StoreError>
    where
        R: Record + ?Sized,
    {
        self.columns
            .iter()
            .map(|c| {
                record
                    .field(&c.name)
                    .ok_or_else(|| StoreError::MissingField(c.name.clone()))
            })
            .collect()
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::graph_records()
    }
}

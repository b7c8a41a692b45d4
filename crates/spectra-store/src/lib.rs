// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! SQLite persistence for precomputed graph records.
//!
//! - [`SchemaCatalog`]: the ordered column list; drives DDL, `INSERT`
//!   placeholders, and record projection.
//! - [`Ingestor`]: validates a request, creates the table exactly once, and
//!   loads every record in one transaction.
//! - [`RowMaterializer`] / [`ColumnMaterializer`]: full-table read-back into
//!   rows of [`Value`](spectra_codec::Value)s or into Arrow-backed columns.
//!
//! Booleans and arrays have no native storage class; they go through the
//! codecs of a caller-owned [`TypeRegistry`](spectra_codec::TypeRegistry).
#![forbid(unsafe_code)]

mod error;
mod ingest;
mod materialize;
mod record;
mod schema;
mod sql;
mod table;

pub use error::{ErrorKind, StoreError};
pub use ingest::{IngestOptions, IngestReport, IngestRequest, IngestStage, Ingestor};
pub use materialize::{
    ColumnData, ColumnMaterializer, ColumnTable, MaterializedColumn, RowMaterializer, RowTable,
};
pub use record::{parse_records, GraphRecord};
pub use schema::{ColumnDef, ColumnType, Record, SchemaCatalog};
pub use sql::ColumnHeader;
pub use table::TableName;

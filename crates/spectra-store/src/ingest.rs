// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One-shot ingestion of graph records into a fresh table.
//!
//! An ingestion runs through [`IngestStage`]s in order and never revisits one:
//! validate the request, check the table is absent, create it, encode and
//! insert every record, commit. Any failure ends the run and drops the
//! connection.
//!
//! Rows are all-or-nothing. By default the `CREATE TABLE` runs outside the row
//! transaction, so a batch that fails after creation leaves an empty table
//! behind and the destination must be cleaned up before retrying. Set
//! [`IngestOptions::atomic_create`] to create the table inside the row
//! transaction instead.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use spectra_codec::{TypeRegistry, Value};
use spectra_config::{ArrayLayout, StoreConfig};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::record::parse_records;
use crate::schema::{ColumnType, Record, SchemaCatalog};
use crate::sql;
use crate::table::TableName;

/// Stages of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IngestStage {
    /// Argument and path checks.
    Validate,
    /// Refuse to touch an existing table.
    CheckTableAbsent,
    /// Issue the DDL.
    CreateTable,
    /// Encode and insert every record.
    EncodeAndInsertAll,
    /// Commit the rows.
    Commit,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validate => "validate",
            Self::CheckTableAbsent => "check_table_absent",
            Self::CreateTable => "create_table",
            Self::EncodeAndInsertAll => "encode_and_insert_all",
            Self::Commit => "commit",
        })
    }
}

/// Knobs for validation and loading, usually taken from a [`StoreConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Required destination suffix.
    pub destination_extension: String,
    /// Create the destination's parent directory when missing.
    pub create_parent_dirs: bool,
    /// Create the table inside the row transaction.
    pub atomic_create: bool,
    /// Axis order of nested JSON lists.
    pub array_layout: ArrayLayout,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&StoreConfig::default())
    }
}

impl From<&StoreConfig> for IngestOptions {
    fn from(cfg: &StoreConfig) -> Self {
        Self {
            destination_extension: cfg.destination_extension.clone(),
            create_parent_dirs: cfg.create_parent_dirs,
            atomic_create: cfg.atomic_create,
            array_layout: cfg.array_layout,
        }
    }
}

/// A validated source → destination/table request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    source: PathBuf,
    destination: PathBuf,
    table: TableName,
}

impl IngestRequest {
    /// Validates the three positional CLI arguments: source, destination, table.
    ///
    /// Checks run in order (argument count, source existence, destination
    /// suffix, table identifier) and the first failure is returned. Only when
    /// all pass is the destination's parent directory created.
    pub fn from_positional(args: &[String], options: &IngestOptions) -> Result<Self, StoreError> {
        match args {
            [source, destination, table] => Self::new(source, destination, table, options),
            _ => Err(StoreError::ArgumentCount {
                received: args.to_vec(),
            }),
        }
    }

    /// Validates an already split request. See [`from_positional`](Self::from_positional).
    pub fn new(
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        table: &str,
        options: &IngestOptions,
    ) -> Result<Self, StoreError> {
        let source = source.as_ref();
        let destination = destination.as_ref();
        if !source.is_file() {
            return Err(StoreError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }
        if !destination
            .to_string_lossy()
            .ends_with(options.destination_extension.as_str())
        {
            return Err(StoreError::InvalidDestinationExtension {
                path: destination.to_path_buf(),
                expected: options.destination_extension.clone(),
            });
        }
        let table = TableName::parse(table)?;
        if options.create_parent_dirs {
            if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }
        debug!(stage = %IngestStage::Validate, source = %source.display(), destination = %destination.display(), %table, "request validated");
        Ok(Self {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            table,
        })
    }

    /// Source JSON path.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination store path.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Target table.
    pub fn table(&self) -> &TableName {
        &self.table
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Table that was created.
    pub table: TableName,
    /// Store that holds it.
    pub destination: PathBuf,
    /// Rows committed.
    pub rows_inserted: usize,
}

/// Creates a table once and bulk-loads records into it.
#[derive(Debug)]
pub struct Ingestor<'r> {
    registry: &'r TypeRegistry,
    catalog: SchemaCatalog,
    options: IngestOptions,
}

impl<'r> Ingestor<'r> {
    /// Ingestor for the graph-record catalog.
    pub fn new(registry: &'r TypeRegistry, options: IngestOptions) -> Self {
        Self {
            registry,
            catalog: SchemaCatalog::graph_records(),
            options,
        }
    }

    /// Replaces the column catalog.
    pub fn with_catalog(mut self, catalog: SchemaCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Column catalog in use.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Options in use.
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Runs a validated request end to end: open the destination, read the
    /// source, load it.
    pub fn run(&self, request: &IngestRequest) -> Result<IngestReport, StoreError> {
        let mut conn = Connection::open(request.destination())?;
        let json =
            fs::read(request.source()).map_err(|e| StoreError::io(request.source(), e))?;
        let rows_inserted = self
            .ingest_json(&mut conn, request.table(), &json)
            .map_err(|err| match err {
                StoreError::TableExists { table, .. } => StoreError::TableExists {
                    table,
                    destination: request.destination().to_path_buf(),
                },
                other => other,
            })?;
        info!(table = %request.table(), destination = %request.destination().display(), rows = rows_inserted, "ingestion complete");
        Ok(IngestReport {
            table: request.table().clone(),
            destination: request.destination().to_path_buf(),
            rows_inserted,
        })
    }

    /// Loads a JSON array of graph records into a new table on `conn`.
    ///
    /// Every record is parsed and converted before the table is created.
    pub fn ingest_json(
        &self,
        conn: &mut Connection,
        table: &TableName,
        json: &[u8],
    ) -> Result<usize, StoreError> {
        ensure_absent(conn, table)?;
        let records = parse_records(json, self.options.array_layout)?;
        debug!(%table, records = records.len(), "records parsed");
        self.create_and_load(conn, table, &records)
    }

    /// Loads already-built records into a new table on `conn`.
    pub fn ingest_records<R: Record>(
        &self,
        conn: &mut Connection,
        table: &TableName,
        records: &[R],
    ) -> Result<usize, StoreError> {
        ensure_absent(conn, table)?;
        self.create_and_load(conn, table, records)
    }

    fn create_and_load<R: Record>(
        &self,
        conn: &mut Connection,
        table: &TableName,
        records: &[R],
    ) -> Result<usize, StoreError> {
        let ddl = self.catalog.ddl_for(table);
        if self.options.atomic_create {
            let tx = conn.transaction()?;
            info!(stage = %IngestStage::CreateTable, %table, atomic = true);
            tx.execute_batch(&ddl)?;
            let rows = self.insert_all(&tx, table, records)?;
            info!(stage = %IngestStage::Commit, %table, rows);
            tx.commit()?;
            return Ok(rows);
        }

        info!(stage = %IngestStage::CreateTable, %table, atomic = false);
        conn.execute_batch(&ddl)?;
        let tx = conn.transaction()?;
        match self.insert_all(&tx, table, records) {
            Ok(rows) => {
                info!(stage = %IngestStage::Commit, %table, rows);
                tx.commit()?;
                Ok(rows)
            }
            Err(err) => {
                drop(tx);
                warn!(%table, error = %err, "batch rolled back; the created table remains and is empty");
                Err(err)
            }
        }
    }

    fn insert_all<R: Record>(
        &self,
        conn: &Connection,
        table: &TableName,
        records: &[R],
    ) -> Result<usize, StoreError> {
        info!(stage = %IngestStage::EncodeAndInsertAll, %table, records = records.len());
        let mut stmt = conn.prepare_cached(&self.catalog.insert_sql_for(table))?;
        for (index, record) in records.iter().enumerate() {
            let cells = self
                .catalog
                .columns()
                .iter()
                .zip(self.catalog.project(record)?)
                .map(|(column, value)| self.encode_cell(column.ty, &value))
                .collect::<Result<Vec<_>, _>>()?;
            stmt.execute(params_from_iter(cells))?;
            debug!(%table, index, "record inserted");
        }
        Ok(records.len())
    }

    /// Codec-backed columns encode through their declared logical type;
    /// native columns take the value as it is.
    fn encode_cell(&self, ty: ColumnType, value: &Value) -> Result<SqlValue, StoreError> {
        let stored = match ty.logical_name() {
            Some(name) => self.registry.encode_as(name, value)?,
            None => self.registry.encode_for(value)?.stored,
        };
        Ok(sql::to_sql(stored))
    }
}

fn ensure_absent(conn: &Connection, table: &TableName) -> Result<(), StoreError> {
    info!(stage = %IngestStage::CheckTableAbsent, %table);
    if sql::table_exists(conn, table)? {
        return Err(StoreError::TableExists {
            table: table.to_string(),
            destination: conn.path().map(PathBuf::from).unwrap_or_default(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::ColumnDef;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn wrong_argument_count_names_arguments() {
        let err = IngestRequest::from_positional(&args(&["a", "b"]), &IngestOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentCount);
        assert!(err.to_string().contains("'a', 'b'"));
        let err = IngestRequest::from_positional(&args(&["a", "b", "c", "d"]), &IngestOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentCount);
    }

    #[test]
    fn checks_run_in_order_without_side_effects() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("in.json");
        let nested = tmp.path().join("out").join("deep");
        let dest = nested.join("graphs.db");
        let dest_str = dest.to_string_lossy().into_owned();
        let opts = IngestOptions::default();

        // Missing source wins over a bad table name.
        let err = IngestRequest::new(&source, &dest, "bad name", &opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);

        fs::write(&source, "[]").unwrap();
        let err = IngestRequest::new(&source, tmp.path().join("out.sqlite"), "bad name", &opts)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDestinationExtension);

        let err = IngestRequest::new(&source, &dest, "bad name", &opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
        assert!(!nested.exists());

        let req = IngestRequest::from_positional(
            &[source.to_string_lossy().into_owned(), dest_str, "graphs".into()],
            &opts,
        )
        .unwrap();
        assert!(nested.is_dir());
        assert_eq!(req.table().as_str(), "graphs");
        assert!(!dest.exists());
    }

    #[test]
    fn parent_creation_can_be_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("in.json");
        fs::write(&source, "[]").unwrap();
        let opts = IngestOptions {
            create_parent_dirs: false,
            ..IngestOptions::default()
        };
        let dest = tmp.path().join("missing").join("x.db");
        IngestRequest::new(&source, &dest, "t", &opts).unwrap();
        assert!(!tmp.path().join("missing").exists());
    }

    #[test]
    fn custom_extension_from_config() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("in.json");
        fs::write(&source, "[]").unwrap();
        let cfg = StoreConfig {
            destination_extension: ".sqlite".into(),
            ..StoreConfig::default()
        };
        let opts = IngestOptions::from(&cfg);
        assert!(IngestRequest::new(&source, tmp.path().join("x.sqlite"), "t", &opts).is_ok());
        assert!(IngestRequest::new(&source, tmp.path().join("x.db"), "t", &opts).is_err());
    }

    #[test]
    fn stages_display_snake_case() {
        assert_eq!(IngestStage::CheckTableAbsent.to_string(), "check_table_absent");
        assert!(IngestStage::Validate < IngestStage::Commit);
    }

    #[test]
    fn empty_input_still_creates_the_table() {
        let registry = TypeRegistry::with_builtin_codecs();
        let ingestor = Ingestor::new(&registry, IngestOptions::default());
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::parse("empty").unwrap();
        assert_eq!(ingestor.ingest_json(&mut conn, &table, b"[]").unwrap(), 0);
        assert!(sql::table_exists(&conn, &table).unwrap());
    }

    #[test]
    fn existing_table_is_found_regardless_of_case() {
        let registry = TypeRegistry::with_builtin_codecs();
        let ingestor = Ingestor::new(&registry, IngestOptions::default());
        let mut conn = Connection::open_in_memory().unwrap();
        let upper = TableName::parse("Graphs").unwrap();
        ingestor.ingest_json(&mut conn, &upper, b"[]").unwrap();

        let lower = TableName::parse("graphs").unwrap();
        let err = ingestor.ingest_json(&mut conn, &lower, b"[]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TableExists);
    }

    #[test]
    fn keyword_table_names_work() {
        let registry = TypeRegistry::with_builtin_codecs();
        let ingestor = Ingestor::new(&registry, IngestOptions::default());
        let mut conn = Connection::open_in_memory().unwrap();
        for name in ["order", "select"] {
            let table = TableName::parse(name).unwrap();
            assert_eq!(ingestor.ingest_json(&mut conn, &table, b"[]").unwrap(), 0);
            assert!(sql::table_exists(&conn, &table).unwrap());
        }
    }

    /// A single `flag` field.
    struct Flag(Value);

    impl Record for Flag {
        fn field(&self, name: &str) -> Option<Value> {
            (name == "flag").then(|| self.0.clone())
        }
    }

    fn flag_ingestor(registry: &TypeRegistry) -> Ingestor<'_> {
        Ingestor::new(registry, IngestOptions::default()).with_catalog(
            SchemaCatalog::from_columns(vec![ColumnDef::new("flag", ColumnType::Boolean)]),
        )
    }

    #[test]
    fn declared_type_picks_the_codec() {
        let registry = TypeRegistry::with_builtin_codecs();
        let ingestor = flag_ingestor(&registry);
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::parse("flags").unwrap();

        let err = ingestor
            .ingest_records(&mut conn, &table, &[Flag(Value::Boolean(true)), Flag(Value::Integer(1))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBooleanEncoding);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM flags", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn null_passes_through_codec_columns() {
        let registry = TypeRegistry::with_builtin_codecs();
        let ingestor = flag_ingestor(&registry);
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::parse("flags").unwrap();
        ingestor
            .ingest_records(&mut conn, &table, &[Flag(Value::Null), Flag(Value::Boolean(false))])
            .unwrap();
        let stored: Vec<Option<String>> = conn
            .prepare("SELECT flag FROM flags")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(stored, vec![None, Some("false".to_owned())]);
    }

    #[test]
    fn invalid_json_leaves_no_table() {
        let registry = TypeRegistry::with_builtin_codecs();
        let ingestor = Ingestor::new(&registry, IngestOptions::default());
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::parse("t").unwrap();
        let err = ingestor.ingest_json(&mut conn, &table, b"{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert!(!sql::table_exists(&conn, &table).unwrap());
    }
}

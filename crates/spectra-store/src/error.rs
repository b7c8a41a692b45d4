// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for ingestion and read-back.

use std::fmt;
use std::path::PathBuf;

use spectra_codec::CodecError;
use thiserror::Error;

/// Coarse classification of a [`StoreError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong number of positional arguments.
    ArgumentCount,
    /// Source JSON file does not exist.
    SourceNotFound,
    /// Destination path lacks the required suffix.
    InvalidDestinationExtension,
    /// Table name is not a plain identifier.
    InvalidIdentifier,
    /// Destination already holds a table of that name.
    TableExists,
    /// Boolean cell is not one of the two literals.
    InvalidBooleanEncoding,
    /// Array blob could not be built or parsed.
    ArrayCodec,
    /// Any other codec failure (unknown logical type, kind mismatch).
    Codec,
    /// Storage engine failure, surfaced verbatim.
    Connection,
    /// Filesystem failure outside the storage engine.
    Io,
    /// Input JSON is not an array of graph records.
    InvalidRecord,
}

impl ErrorKind {
    /// Machine-readable code, matching the bracketed prefix of the message.
    pub const fn code(self) -> &'static str {
        match self {
            Self::ArgumentCount => "ARGUMENT_COUNT",
            Self::SourceNotFound => "SOURCE_NOT_FOUND",
            Self::InvalidDestinationExtension => "INVALID_DESTINATION_EXTENSION",
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::TableExists => "TABLE_EXISTS",
            Self::InvalidBooleanEncoding => "INVALID_BOOLEAN",
            Self::ArrayCodec => "ARRAY_CODEC",
            Self::Codec => "CODEC",
            Self::Connection => "CONNECTION",
            Self::Io => "IO",
            Self::InvalidRecord => "INVALID_RECORD",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors raised by validation, ingestion, and materialization.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The CLI contract takes exactly three positional arguments.
    #[error(
        "[ARGUMENT_COUNT] expected 3 arguments, got {}: {}",
        .received.len(),
        quote_all(.received)
    )]
    ArgumentCount {
        /// Arguments as received, in order.
        received: Vec<String>,
    },
    /// Source path is not an existing file.
    #[error("[SOURCE_NOT_FOUND] source file does not exist: '{}'", .path.display())]
    SourceNotFound {
        /// Offending source path.
        path: PathBuf,
    },
    /// Destination path does not end with the required extension.
    #[error(
        "[INVALID_DESTINATION_EXTENSION] destination must have a '{expected}' extension: '{}'",
        .path.display()
    )]
    InvalidDestinationExtension {
        /// Offending destination path.
        path: PathBuf,
        /// Required suffix.
        expected: String,
    },
    /// Table name does not match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("[INVALID_IDENTIFIER] invalid table name: '{0}'")]
    InvalidIdentifier(String),
    /// Destination already holds the table.
    #[error("[TABLE_EXISTS] table '{table}' already exists in '{}'", .destination.display())]
    TableExists {
        /// Table name.
        table: String,
        /// Destination store.
        destination: PathBuf,
    },
    /// A record lacks a field the schema catalog requires.
    #[error("[INVALID_RECORD] record has no field for column '{0}'")]
    MissingField(String),
    /// A JSON record could not be turned into a graph record.
    #[error("[INVALID_RECORD] record {index}: {reason}")]
    InvalidRecord {
        /// Zero-based position in the input array.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// Input is not valid JSON, or not a top-level array.
    #[error("[INVALID_RECORD] source is not a JSON array of records: {0}")]
    Json(#[from] serde_json::Error),
    /// Encoding or decoding a cell failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Storage engine failure.
    #[error("[CONNECTION] {0}")]
    Connection(rusqlite::Error),
    /// Filesystem failure.
    #[error("[IO] {}: {source}", .path.display())]
    Io {
        /// Path being read or created.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ArgumentCount { .. } => ErrorKind::ArgumentCount,
            Self::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            Self::InvalidDestinationExtension { .. } => ErrorKind::InvalidDestinationExtension,
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::TableExists { .. } => ErrorKind::TableExists,
            Self::MissingField(_) | Self::InvalidRecord { .. } | Self::Json(_) => {
                ErrorKind::InvalidRecord
            }
            Self::Codec(CodecError::InvalidBoolean(_)) => ErrorKind::InvalidBooleanEncoding,
            Self::Codec(CodecError::Array(_)) => ErrorKind::ArrayCodec,
            Self::Codec(_) => ErrorKind::Codec,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Codec failures raised inside a row mapper travel through rusqlite as
/// conversion failures; unwrap them so they keep their own kind.
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(index, ty, inner) => {
                match inner.downcast::<CodecError>() {
                    Ok(codec) => Self::Codec(*codec),
                    Err(inner) => Self::Connection(rusqlite::Error::FromSqlConversionFailure(
                        index, ty, inner,
                    )),
                }
            }
            other => Self::Connection(other),
        }
    }
}

fn quote_all(args: &[String]) -> String {
    args.iter()
        .map(|arg| format!("'{arg}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_count_names_every_argument() {
        let err = StoreError::ArgumentCount {
            received: vec!["a.json".into(), "b.db".into()],
        };
        assert_eq!(
            err.to_string(),
            "[ARGUMENT_COUNT] expected 3 arguments, got 2: 'a.json', 'b.db'"
        );
        assert_eq!(err.kind(), ErrorKind::ArgumentCount);
    }

    #[test]
    fn codec_errors_keep_their_kind() {
        let err = StoreError::from(CodecError::InvalidBoolean("1".into()));
        assert_eq!(err.kind(), ErrorKind::InvalidBooleanEncoding);
        let err = StoreError::from(CodecError::UnknownLogicalType("MATRIX".into()));
        assert_eq!(err.kind(), ErrorKind::Codec);
    }

    #[test]
    fn codec_errors_survive_a_row_mapper() {
        let wrapped = rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(CodecError::InvalidBoolean("yes".into())),
        );
        let err = StoreError::from(wrapped);
        assert_eq!(err.kind(), ErrorKind::InvalidBooleanEncoding);
        assert!(err.to_string().contains("yes"));
    }

    #[test]
    fn every_kind_has_a_distinct_code() {
        let kinds = [
            ErrorKind::ArgumentCount,
            ErrorKind::SourceNotFound,
            ErrorKind::InvalidDestinationExtension,
            ErrorKind::InvalidIdentifier,
            ErrorKind::TableExists,
            ErrorKind::InvalidBooleanEncoding,
            ErrorKind::ArrayCodec,
            ErrorKind::Codec,
            ErrorKind::Connection,
            ErrorKind::Io,
            ErrorKind::InvalidRecord,
        ];
        let codes: std::collections::BTreeSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
        assert_eq!(ErrorKind::TableExists.to_string(), "TABLE_EXISTS");
    }

    #[test]
    fn plain_sqlite_errors_are_connection_errors() {
        let err = StoreError::from(rusqlite::Error::InvalidQuery);
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().starts_with("[CONNECTION]"));
    }
}

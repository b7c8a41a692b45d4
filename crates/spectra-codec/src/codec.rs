// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Logical-type codecs.
//!
//! A [`Codec`] maps one logical column type onto a storage class of the
//! relational store and back. Contract:
//! - `encode` accepts exactly the values of [`Codec::value_kind`] and produces
//!   a canonical stored form.
//! - `decode` either reproduces the original value or fails with a
//!   [`CodecError`]; it never consults ambient state.

use thiserror::Error;

use crate::array::ArrayCodecError;
use crate::npy::{decode_npy, encode_npy};
use crate::value::{StoredValue, Value, ValueKind};

/// Logical type name for N-dimensional numeric arrays.
pub const ARRAY: &str = "ARRAY";
/// Logical type name for booleans.
pub const BOOLEAN: &str = "BOOLEAN";

/// Errors raised by codecs and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Array blob could not be produced or parsed.
    #[error("[ARRAY_CODEC] {0}")]
    Array(#[from] ArrayCodecError),
    /// Input is not one of the two boolean literals.
    #[error("[INVALID_BOOLEAN] invalid boolean encoding: {0}")]
    InvalidBoolean(String),
    /// No codec is registered under the logical type name.
    #[error("[UNKNOWN_LOGICAL_TYPE] no codec registered for logical type '{0}'")]
    UnknownLogicalType(String),
    /// No codec is registered for values of this kind.
    #[error("[NO_CODEC] no codec registered for {0} values")]
    NoCodecForKind(ValueKind),
    /// Codec was handed a value of the wrong kind.
    #[error("[VALUE_MISMATCH] codec '{logical}' cannot encode a {found} value")]
    ValueMismatch {
        /// Logical type of the codec.
        logical: &'static str,
        /// Kind of the rejected value.
        found: ValueKind,
    },
    /// Codec was handed a stored cell of the wrong storage class.
    #[error("[STORED_MISMATCH] codec '{logical}' cannot decode a stored {found} cell")]
    StoredMismatch {
        /// Logical type of the codec.
        logical: &'static str,
        /// Storage class of the rejected cell.
        found: &'static str,
    },
}

/// Bidirectional mapping between one logical type and its stored form.
pub trait Codec: Send + Sync {
    /// Logical type name (upper case, e.g. `ARRAY`).
    fn logical_name(&self) -> &'static str;

    /// Kind of in-memory value this codec applies to.
    fn value_kind(&self) -> ValueKind;

    /// Encodes `value` into its stored form.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when `value` is not representable by this
    /// logical type.
    fn encode(&self, value: &Value) -> Result<StoredValue, CodecError>;

    /// Decodes a stored cell back into a value.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when `stored` is not a valid encoding.
    fn decode(&self, stored: &StoredValue) -> Result<Value, CodecError>;
}

/// `ARRAY`: N-dimensional arrays stored as NPY blobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayCodec;

impl Codec for ArrayCodec {
    fn logical_name(&self) -> &'static str {
        ARRAY
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Array
    }

    fn encode(&self, value: &Value) -> Result<StoredValue, CodecError> {
        match value {
            Value::Array(array) => Ok(StoredValue::Blob(encode_npy(array))),
            other => Err(CodecError::ValueMismatch {
                logical: ARRAY,
                found: other.kind(),
            }),
        }
    }

    fn decode(&self, stored: &StoredValue) -> Result<Value, CodecError> {
        match stored {
            StoredValue::Blob(blob) => Ok(Value::Array(decode_npy(blob)?)),
            other => Err(CodecError::StoredMismatch {
                logical: ARRAY,
                found: other.storage_class(),
            }),
        }
    }
}

/// `BOOLEAN`: the case-sensitive text literals `"true"` and `"false"`.
///
/// Text rather than `0`/`1` keeps stored cells self-describing when the
/// database is inspected by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl BooleanCodec {
    fn parse(text: &str) -> Option<bool> {
        match text {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl Codec for BooleanCodec {
    fn logical_name(&self) -> &'static str {
        BOOLEAN
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Boolean
    }

    fn encode(&self, value: &Value) -> Result<StoredValue, CodecError> {
        match value {
            Value::Boolean(true) => Ok(StoredValue::Text("true".to_owned())),
            Value::Boolean(false) => Ok(StoredValue::Text("false".to_owned())),
            other => Err(CodecError::InvalidBoolean(other.to_string())),
        }
    }

    fn decode(&self, stored: &StoredValue) -> Result<Value, CodecError> {
        let parsed = match stored {
            StoredValue::Text(text) => Self::parse(text),
            StoredValue::Blob(bytes) if bytes.is_ascii() => {
                std::str::from_utf8(bytes).ok().and_then(Self::parse)
            }
            _ => None,
        };
        parsed
            .map(Value::Boolean)
            .ok_or_else(|| CodecError::InvalidBoolean(stored.to_string()))
    }
}

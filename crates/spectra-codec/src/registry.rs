// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Codec registry keyed by logical type name and by value kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::codec::{ArrayCodec, BooleanCodec, Codec, CodecError};
use crate::value::{StoredValue, Value, ValueKind};

/// Normalises a declared column type the way the store reports it.
///
/// Keeps the first word before any `(` or whitespace, upper-cased:
/// `VARCHAR(83)` → `VARCHAR`, `array` → `ARRAY`.
pub fn normalize_decl_type(decl: &str) -> String {
    decl.trim()
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

/// Result of [`TypeRegistry::encode_for`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedValue<'r> {
    /// Logical type that encoded the value; `None` for native kinds.
    pub logical_name: Option<&'r str>,
    /// Stored form ready for binding.
    pub stored: StoredValue,
}

/// Registry of [`Codec`]s.
///
/// Build it once and pass it by reference to every component that encodes or
/// decodes cells. `register` replaces any previous codec with the same logical
/// name, so re-running registration is harmless.
#[derive(Default, Clone)]
pub struct TypeRegistry {
    by_name: BTreeMap<String, Arc<dyn Codec>>,
    by_kind: BTreeMap<ValueKind, String>,
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("logical_types", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the `ARRAY` and `BOOLEAN` codecs.
    pub fn with_builtin_codecs() -> Self {
        let mut registry = Self::new();
        registry.register(ArrayCodec);
        registry.register(BooleanCodec);
        registry
    }

    /// Registers `codec`, returning the codec it replaced (if any).
    pub fn register<C>(&mut self, codec: C) -> Option<Arc<dyn Codec>>
    where
        C: Codec + 'static,
    {
        let name = normalize_decl_type(codec.logical_name());
        let kind = codec.value_kind();
        let previous = self.by_name.insert(name.clone(), Arc::new(codec));
        if let Some(old) = &previous {
            if self.by_kind.get(&old.value_kind()) == Some(&name) {
                self.by_kind.remove(&old.value_kind());
            }
        }
        self.by_kind.insert(kind, name);
        previous
    }

    /// Number of registered logical types.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` when no codec is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Registered logical type names, sorted.
    pub fn logical_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Codec for a logical type (declared types are normalised first).
    pub fn codec(&self, logical_name: &str) -> Option<&dyn Codec> {
        self.by_name
            .get(&normalize_decl_type(logical_name))
            .map(AsRef::as_ref)
    }

    /// Like [`codec`](Self::codec) but fails for unknown names.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownLogicalType`] when nothing is registered
    /// under `logical_name`.
    pub fn require(&self, logical_name: &str) -> Result<&dyn Codec, CodecError> {
        self.codec(logical_name)
            .ok_or_else(|| CodecError::UnknownLogicalType(logical_name.to_owned()))
    }

    /// Codec that handles values of `kind`.
    pub fn codec_for_kind(&self, kind: ValueKind) -> Option<&dyn Codec> {
        self.by_kind.get(&kind).and_then(|name| {
            self.by_name.get(name).map(AsRef::as_ref)
        })
    }

    /// Encodes `value`, picking the codec by the value's kind.
    ///
    /// Kinds without a codec (`Null`, `Integer`, `Real`, `Text`, `Bytes`) are
    /// stored natively.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NoCodecForKind`] for a boolean or array value when
    /// no codec handles that kind, or the codec's own error.
    pub fn encode_for(&self, value: &Value) -> Result<EncodedValue<'_>, CodecError> {
        if let Some(codec) = self.codec_for_kind(value.kind()) {
            return Ok(EncodedValue {
                logical_name: Some(codec.logical_name()),
                stored: codec.encode(value)?,
            });
        }
        value
            .to_native_stored()
            .map(|stored| EncodedValue {
                logical_name: None,
                stored,
            })
            .ok_or(CodecError::NoCodecForKind(value.kind()))
    }

    /// Encodes `value` for a column declared as `logical_name`.
    ///
    /// The named codec decides, whatever the value's kind, so a mismatched
    /// value is rejected here rather than stored natively. `NULL` stays `NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownLogicalType`] for an unregistered name, or
    /// the codec's error when it refuses `value`.
    pub fn encode_as(&self, logical_name: &str, value: &Value) -> Result<StoredValue, CodecError> {
        if matches!(value, Value::Null) {
            return Ok(StoredValue::Null);
        }
        self.require(logical_name)?.encode(value)
    }

    /// Decodes a stored cell of a column declared as `decl_type`.
    ///
    /// `NULL` cells, undeclared columns, and declared types without a codec
    /// pass through natively (`BLOB` becomes [`Value::Bytes`]).
    ///
    /// # Errors
    ///
    /// Returns the codec's error when the cell is not a valid encoding.
    pub fn decode_for(
        &self,
        decl_type: Option<&str>,
        stored: &StoredValue,
    ) -> Result<Value, CodecError> {
        if matches!(stored, StoredValue::Null) {
            return Ok(Value::Null);
        }
        match decl_type.and_then(|decl| self.codec(decl)) {
            Some(codec) => codec.decode(stored),
            None => Ok(Value::from(stored.clone())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::array::NdArray;
    use crate::codec::{ARRAY, BOOLEAN};

    /// Stores booleans as 0/1 integers; used to exercise replacement.
    struct IntBool;

    impl Codec for IntBool {
        fn logical_name(&self) -> &'static str {
            "BOOLEAN"
        }

        fn value_kind(&self) -> ValueKind {
            ValueKind::Boolean
        }

        fn encode(&self, value: &Value) -> Result<StoredValue, CodecError> {
            value
                .as_bool()
                .map(|b| StoredValue::Integer(i64::from(b)))
                .ok_or_else(|| CodecError::InvalidBoolean(value.to_string()))
        }

        fn decode(&self, stored: &StoredValue) -> Result<Value, CodecError> {
            match stored {
                StoredValue::Integer(0) => Ok(Value::Boolean(false)),
                StoredValue::Integer(1) => Ok(Value::Boolean(true)),
                other => Err(CodecError::InvalidBoolean(other.to_string())),
            }
        }
    }

    #[test]
    fn decl_types_normalise_to_first_word() {
        assert_eq!(normalize_decl_type("VARCHAR(83)"), "VARCHAR");
        assert_eq!(normalize_decl_type("array"), "ARRAY");
        assert_eq!(normalize_decl_type(" boolean not null"), "BOOLEAN");
        assert_eq!(normalize_decl_type(""), "");
    }

    #[test]
    fn builtin_registry_knows_array_and_boolean() {
        let registry = TypeRegistry::with_builtin_codecs();
        assert_eq!(registry.logical_names().collect::<Vec<_>>(), vec![ARRAY, BOOLEAN]);
        assert!(registry.codec("Array").is_some());
        assert!(matches!(
            registry.require("MATRIX"),
            Err(CodecError::UnknownLogicalType(name)) if name == "MATRIX"
        ));
    }

    #[test]
    fn encode_for_dispatches_on_value_kind() {
        let registry = TypeRegistry::with_builtin_codecs();
        let encoded = registry.encode_for(&Value::Boolean(true)).unwrap();
        assert_eq!(encoded.logical_name, Some(BOOLEAN));
        assert_eq!(encoded.stored, StoredValue::Text("true".into()));

        let encoded = registry.encode_for(&Value::Integer(7)).unwrap();
        assert_eq!(encoded.logical_name, None);
        assert_eq!(encoded.stored, StoredValue::Integer(7));

        let array = NdArray::from_slice(&[2i64, 3]);
        let encoded = registry.encode_for(&Value::Array(array)).unwrap();
        assert_eq!(encoded.logical_name, Some(ARRAY));
    }

    #[test]
    fn encode_as_follows_the_declared_type() {
        let registry = TypeRegistry::with_builtin_codecs();
        assert_eq!(
            registry.encode_as("BOOLEAN", &Value::Boolean(false)).unwrap(),
            StoredValue::Text("false".into())
        );
        assert_eq!(
            registry.encode_as("BOOLEAN", &Value::Integer(1)),
            Err(CodecError::InvalidBoolean("1".into()))
        );
        assert!(matches!(
            registry.encode_as("ARRAY", &Value::Real(1.0)),
            Err(CodecError::ValueMismatch { found: ValueKind::Real, .. })
        ));
        assert_eq!(registry.encode_as("ARRAY", &Value::Null).unwrap(), StoredValue::Null);
        assert!(matches!(
            registry.encode_as("MATRIX", &Value::Integer(1)),
            Err(CodecError::UnknownLogicalType(_))
        ));
    }

    #[test]
    fn empty_registry_refuses_booleans_and_arrays() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.encode_for(&Value::Boolean(false)),
            Err(CodecError::NoCodecForKind(ValueKind::Boolean))
        );
    }

    #[test]
    fn decode_for_passes_through_undeclared_and_null() {
        let registry = TypeRegistry::with_builtin_codecs();
        assert_eq!(
            registry
                .decode_for(Some("TINYINT"), &StoredValue::Integer(4))
                .unwrap(),
            Value::Integer(4)
        );
        assert_eq!(
            registry.decode_for(Some("ARRAY"), &StoredValue::Null).unwrap(),
            Value::Null
        );
        assert_eq!(
            registry
                .decode_for(None, &StoredValue::Blob(vec![9]))
                .unwrap(),
            Value::Bytes(vec![9])
        );
    }

    #[test]
    fn reregistration_is_idempotent_and_replaces() {
        let mut registry = TypeRegistry::with_builtin_codecs();
        let previous = registry.register(BooleanCodec);
        assert!(previous.is_some());
        assert_eq!(registry.len(), 2);

        registry.register(IntBool);
        assert_eq!(registry.len(), 2);
        let encoded = registry.encode_for(&Value::Boolean(true)).unwrap();
        assert_eq!(encoded.stored, StoredValue::Integer(1));
        assert_eq!(
            registry
                .decode_for(Some("BOOLEAN"), &StoredValue::Integer(0))
                .unwrap(),
            Value::Boolean(false)
        );
    }
}

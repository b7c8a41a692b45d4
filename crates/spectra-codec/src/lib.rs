// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed codecs between in-memory values and relational storage classes.
//!
//! The relational store only knows five storage classes (`NULL`, `INTEGER`,
//! `REAL`, `TEXT`, `BLOB`). Graph records also carry booleans and
//! N-dimensional numeric arrays, which are mapped onto those classes by
//! [`Codec`] implementations registered in a [`TypeRegistry`] under a logical
//! type name (`ARRAY`, `BOOLEAN`).
//!
//! # Round-trip invariant
//!
//! For every value a codec claims, `decode(encode(v)) == v`. Arrays compare
//! bit-for-bit (dtype, shape, and raw element bytes), so NaN payloads and
//! signed zeros survive.
//!
//! # Registry ownership
//!
//! There is no process-wide registry. Callers build one [`TypeRegistry`]
//! (usually [`TypeRegistry::with_builtin_codecs`]) and lend it to every
//! ingestion or read-back operation. Re-registering a logical name replaces the
//! previous entry, so registration can be repeated safely.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod array;
mod codec;
mod npy;
mod registry;
mod value;

pub use array::{ArrayCodecError, DType, Element, NdArray};
pub use codec::{ArrayCodec, BooleanCodec, Codec, CodecError, ARRAY, BOOLEAN};
pub use npy::{decode_npy, encode_npy};
pub use registry::{normalize_decl_type, EncodedValue, TypeRegistry};
pub use value::{StoredValue, Value, ValueKind};

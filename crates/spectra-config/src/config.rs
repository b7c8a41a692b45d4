// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed settings documents over a key/blob store.
//!
//! Each settings type names the key it lives under ([`ConfigDocument::KEY`]).
//! A [`ConfigStore`] maps keys to raw JSON bytes, and [`ConfigService`] turns
//! those bytes into documents. An absent or blank document reads as the
//! type's defaults, so a fresh machine needs no config at all.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// A settings type with its own key and a complete set of defaults.
pub trait ConfigDocument: Serialize + DeserializeOwned + Default {
    /// Key the document is stored under (`store` is kept in `store.json`).
    const KEY: &'static str;
}

/// Raw JSON documents addressed by key.
pub trait ConfigStore {
    /// Bytes stored under `key`; [`ConfigError::NotFound`] if there are none.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures while locating, reading, or parsing settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("no config document '{0}'")]
    NotFound(String),
    /// Filesystem failure.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid JSON for its settings type.
    #[error("config document '{key}' is invalid: {source}")]
    Invalid {
        /// Key or file the document came from.
        key: String,
        /// Parser error, with line and column.
        #[source]
        source: serde_json::Error,
    },
    /// The platform has no config directory.
    #[error("no config directory available for this platform")]
    NoConfigDir,
}

/// Parses `bytes` as a `T`, naming `key` on failure.
pub(crate) fn parse<T>(key: &str, bytes: &[u8]) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(bytes).map_err(|source| ConfigError::Invalid {
        key: key.to_owned(),
        source,
    })
}

/// Reads and writes [`ConfigDocument`]s through a [`ConfigStore`].
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Service over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Gives the backing store back.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Reads `D`, or `D::default()` when its document is absent or blank.
    ///
    /// Fields missing from a present document take their defaults too.
    pub fn read<D>(&self) -> Result<D, ConfigError>
    where
        D: ConfigDocument,
    {
        let bytes = match self.store.load_raw(D::KEY) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound(_)) => return Ok(D::default()),
            Err(err) => return Err(err),
        };
        if bytes.trim_ascii().is_empty() {
            return Ok(D::default());
        }
        parse(D::KEY, &bytes)
    }

    /// Writes `doc` under `D::KEY` as pretty JSON.
    pub fn write<D>(&self, doc: &D) -> Result<(), ConfigError>
    where
        D: ConfigDocument,
    {
        let mut data = serde_json::to_vec_pretty(doc).map_err(|source| ConfigError::Invalid {
            key: D::KEY.to_owned(),
            source,
        })?;
        data.push(b'\n');
        self.store.save_raw(D::KEY, &data)
    }
}

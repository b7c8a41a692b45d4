// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Where the binaries get their [`StoreConfig`] from.

use std::path::Path;

use anyhow::{Context, Result};
use spectra_config::{
    read_json_file, ConfigDocument, ConfigError, ConfigService, FsConfigStore, StoreConfig,
};

/// Resolves the effective config.
///
/// An explicit `--config` file must exist and parse. Otherwise the `store` key
/// of the platform config directory is used when present, and defaults when
/// it is not (or when the platform has no config directory).
pub fn load(explicit: Option<&Path>) -> Result<StoreConfig> {
    if let Some(path) = explicit {
        return read_json_file(path)
            .with_context(|| format!("reading config file '{}'", path.display()));
    }
    match FsConfigStore::new() {
        Ok(store) => load_from(store),
        Err(ConfigError::NoConfigDir) => Ok(StoreConfig::default()),
        Err(err) => Err(err.into()),
    }
}

/// Reads the `store` key from `store`, falling back to defaults when absent.
pub fn load_from(store: FsConfigStore) -> Result<StoreConfig> {
    let path = store.path_for(StoreConfig::KEY);
    ConfigService::new(store)
        .read::<StoreConfig>()
        .with_context(|| format!("reading config file '{}'", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use spectra_config::ArrayLayout;

    use super::*;

    #[test]
    fn explicit_file_overrides_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg.json");
        std::fs::write(&path, r#"{"array_layout": "row_major"}"#).unwrap();
        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.array_layout, ArrayLayout::RowMajor);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load(Some(&tmp.path().join("nope.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }

    #[test]
    fn empty_store_dir_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = load_from(FsConfigStore::at(tmp.path())).unwrap();
        assert_eq!(cfg, StoreConfig::default());
    }

    #[test]
    fn broken_store_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("store.json"), "{").unwrap();
        let err = load_from(FsConfigStore::at(tmp.path())).unwrap_err();
        assert!(format!("{err:#}").contains("store.json"));
    }
}

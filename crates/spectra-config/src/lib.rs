// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Configuration services for Spectra tools.
//! Keeps binaries thin: they pick a [`ConfigStore`], hand it to a
//! [`ConfigService`], and read a [`StoreConfig`] back.

pub mod config;
pub mod fs;
pub mod settings;

pub use config::{ConfigDocument, ConfigError, ConfigService, ConfigStore};
pub use fs::{read_json_file, FsConfigStore};
pub use settings::{ArrayLayout, LogLevel, StoreConfig};

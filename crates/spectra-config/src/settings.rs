// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings shared by the ingestion and read-back tools.

use serde::{Deserialize, Serialize};

use crate::config::ConfigDocument;

/// How nested JSON lists map onto array axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLayout {
    /// The outermost list enumerates the last axis (columns of a matrix).
    #[default]
    ColMajor,
    /// The outermost list enumerates the first axis (rows of a matrix).
    RowMajor,
}

/// Log verbosity for the binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warn,
    /// Stage transitions and summaries.
    #[default]
    Info,
    /// Per-record detail.
    Debug,
    /// Everything.
    Trace,
}

/// Ingestion and read-back settings.
///
/// Every field has a default, so a partial JSON document (or none at all) is
/// a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Suffix every destination path must end with.
    pub destination_extension: String,
    /// Create missing parent directories of the destination.
    pub create_parent_dirs: bool,
    /// Create the table inside the row transaction, so a failed load leaves
    /// no table behind.
    pub atomic_create: bool,
    /// Axis order of nested JSON lists in array fields.
    pub array_layout: ArrayLayout,
    /// Default log verbosity.
    pub log_level: LogLevel,
}

impl ConfigDocument for StoreConfig {
    const KEY: &'static str = "store";
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            destination_extension: ".db".to_owned(),
            create_parent_dirs: true,
            atomic_create: false,
            array_layout: ArrayLayout::ColMajor,
            log_level: LogLevel::Info,
        }
    }
}

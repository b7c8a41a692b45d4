// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared plumbing for the `spectra-ingest` and `spectra-inspect` binaries.

pub mod logging;
pub mod render;
pub mod settings;

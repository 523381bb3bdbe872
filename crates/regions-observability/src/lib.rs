// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # regions-observability
//!
//! Logging infrastructure shared by the region digraph crates and tools, with
//! per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: per-crate JSON log files with run folder retention

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Log targets that accept debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "regions-digraph",
    "regions-config",
    "regions-observability",
    "region-inspect",
];

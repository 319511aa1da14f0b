// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Writer thresholds.
//!
//! [`RecordConfig`] carries the chunk and segment split thresholds that end
//! up in every written [`Header`](crate::io::formats::record::Header). It can
//! be built in code or loaded from TOML:
//!
//! ```toml
//! chunk_interval_ns = 20_000_000_000
//! segment_interval_ns = 0          # disable time-based segment splits
//! chunk_raw_size = 209_715_200
//! segment_raw_size = 1_073_741_824
//! ```
//!
//! Any threshold set to `0` disables that trigger. Missing keys fall back to
//! the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{RecordError, Result};

/// Default chunk interval (20s).
pub const DEFAULT_CHUNK_INTERVAL_NS: u64 = 20 * 1_000_000_000;
/// Default segment interval (60s).
pub const DEFAULT_SEGMENT_INTERVAL_NS: u64 = 60 * 1_000_000_000;
/// Default chunk raw size limit (200MiB).
pub const DEFAULT_CHUNK_RAW_SIZE: u64 = 200 * 1024 * 1024;
/// Default segment raw size limit (2GiB).
pub const DEFAULT_SEGMENT_RAW_SIZE: u64 = 2048 * 1024 * 1024;

/// Chunk and segment split thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Maximum time span of one chunk in nanoseconds (0 = unlimited)
    pub chunk_interval_ns: u64,
    /// Maximum time span of one segment in nanoseconds (0 = unlimited)
    pub segment_interval_ns: u64,
    /// Maximum raw payload bytes per chunk (0 = unlimited)
    pub chunk_raw_size: u64,
    /// Maximum raw payload bytes per segment (0 = unlimited)
    pub segment_raw_size: u64,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            chunk_interval_ns: DEFAULT_CHUNK_INTERVAL_NS,
            segment_interval_ns: DEFAULT_SEGMENT_INTERVAL_NS,
            chunk_raw_size: DEFAULT_CHUNK_RAW_SIZE,
            segment_raw_size: DEFAULT_SEGMENT_RAW_SIZE,
        }
    }
}

impl RecordConfig {
    /// Config with every chunk and segment trigger disabled.
    ///
    /// Produces a single file holding a single chunk.
    pub fn unbounded() -> Self {
        Self {
            chunk_interval_ns: 0,
            segment_interval_ns: 0,
            chunk_raw_size: 0,
            segment_raw_size: 0,
        }
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RecordError::config(e.to_string()))
    }

    /// Load a config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RecordError::open(path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Set the chunk interval.
    pub fn with_chunk_interval(mut self, ns: u64) -> Self {
        self.chunk_interval_ns = ns;
        self
    }

    /// Set the segment interval.
    pub fn with_segment_interval(mut self, ns: u64) -> Self {
        self.segment_interval_ns = ns;
        self
    }

    /// Set the chunk raw size limit.
    pub fn with_chunk_raw_size(mut self, bytes: u64) -> Self {
        self.chunk_raw_size = bytes;
        self
    }

    /// Set the segment raw size limit.
    pub fn with_segment_raw_size(mut self, bytes: u64) -> Self {
        self.segment_raw_size = bytes;
        self
    }

    /// Whether either segment trigger is enabled.
    pub fn is_segmented(&self) -> bool {
        self.segment_interval_ns > 0 || self.segment_raw_size > 0
    }
}

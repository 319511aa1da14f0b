// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Default container header.

use super::constants::{MAJOR_VERSION, MINOR_VERSION};
use super::proto::{CompressType, Header};
use crate::core::RecordConfig;

/// Builder for the container [`Header`].
///
/// [`HeaderBuilder::default_header`] gives the stock thresholds (20s chunks,
/// 60s segments, 200MiB chunks, 2GiB segments); the setters override them.
/// Counters always start at zero and `is_complete` at `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderBuilder {
    config: RecordConfig,
}

impl HeaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from a config.
    pub fn from_config(config: &RecordConfig) -> Self {
        Self { config: *config }
    }

    /// Header with the default thresholds.
    pub fn default_header() -> Header {
        Self::new().build()
    }

    /// Fresh header with the version and thresholds of `template`.
    ///
    /// Counters, times, size and index position are zeroed, `is_complete`
    /// is cleared and compression is NONE, whatever `template` carries.
    pub fn from_template(template: &Header) -> Header {
        Header {
            major_version: template.major_version,
            minor_version: template.minor_version,
            ..Self::new()
                .chunk_interval(template.chunk_interval)
                .segment_interval(template.segment_interval)
                .chunk_raw_size(template.chunk_raw_size)
                .segment_raw_size(template.segment_raw_size)
                .build()
        }
    }

    pub fn chunk_interval(mut self, ns: u64) -> Self {
        self.config.chunk_interval_ns = ns;
        self
    }

    pub fn segment_interval(mut self, ns: u64) -> Self {
        self.config.segment_interval_ns = ns;
        self
    }

    pub fn chunk_raw_size(mut self, bytes: u64) -> Self {
        self.config.chunk_raw_size = bytes;
        self
    }

    pub fn segment_raw_size(mut self, bytes: u64) -> Self {
        self.config.segment_raw_size = bytes;
        self
    }

    pub fn build(&self) -> Header {
        Header {
            major_version: MAJOR_VERSION,
            minor_version: MINOR_VERSION,
            compress: CompressType::CompressNone as i32,
            chunk_interval: self.config.chunk_interval_ns,
            segment_interval: self.config.segment_interval_ns,
            index_position: 0,
            chunk_number: 0,
            channel_number: 0,
            begin_time: 0,
            end_time: 0,
            message_number: 0,
            size: 0,
            is_complete: false,
            chunk_raw_size: self.config.chunk_raw_size,
            segment_raw_size: self.config.segment_raw_size,
        }
    }
}

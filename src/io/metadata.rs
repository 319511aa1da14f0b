// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Summary types for record files.
//!
//! These are built from the header and index alone, without reading any
//! chunk body.

use serde::Serialize;

use super::formats::record::proto::{ChannelCache, ChunkHeaderCache, Header};

/// Information about a channel in a record file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    /// Channel name (e.g., "/apollo/localization/pose")
    pub name: String,
    /// Message type name (e.g., "apollo.localization.LocalizationEstimate")
    pub message_type: String,
    /// Number of messages on this channel (0 if unknown)
    pub message_count: u64,
    /// Schema descriptor bytes, if the writer recorded any
    #[serde(skip)]
    pub proto_desc: Option<Vec<u8>>,
}

impl ChannelInfo {
    /// Create a new ChannelInfo.
    pub fn new(name: impl Into<String>, message_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_type: message_type.into(),
            message_count: 0,
            proto_desc: None,
        }
    }

    /// Set the message count.
    pub fn with_message_count(mut self, count: u64) -> Self {
        self.message_count = count;
        self
    }
}

impl From<&ChannelCache> for ChannelInfo {
    fn from(cache: &ChannelCache) -> Self {
        Self {
            name: cache.name.clone(),
            message_type: cache.message_type.clone(),
            message_count: cache.message_number,
            proto_desc: (!cache.proto_desc.is_empty()).then(|| cache.proto_desc.clone()),
        }
    }
}

/// Summary of one chunk, taken from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkInfo {
    /// Offset of the chunk header section
    pub position: u64,
    /// Earliest message time in the chunk
    pub begin_time: u64,
    /// Latest message time in the chunk
    pub end_time: u64,
    /// Number of messages in the chunk
    pub message_count: u64,
    /// Sum of message payload sizes
    pub raw_size: u64,
}

impl ChunkInfo {
    pub fn from_cache(position: u64, cache: &ChunkHeaderCache) -> Self {
        Self {
            position,
            begin_time: cache.begin_time,
            end_time: cache.end_time,
            message_count: cache.message_number,
            raw_size: cache.raw_size,
        }
    }

    /// Whether `time` lies within this chunk's range.
    pub fn contains(&self, time: u64) -> bool {
        self.begin_time <= time && time <= self.end_time
    }
}

/// Information about one physical record file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordInfo {
    /// File path
    pub path: String,
    /// Format version as "major.minor"
    pub version: String,
    /// File size on disk in bytes
    pub file_size: u64,
    /// Whether the writer finished the file
    pub is_complete: bool,
    /// Total message count
    pub message_count: u64,
    /// Number of chunks
    pub chunk_count: u64,
    /// Start timestamp (nanoseconds, 0 if empty)
    pub begin_time: u64,
    /// End timestamp (nanoseconds, 0 if empty)
    pub end_time: u64,
    /// Chunk interval threshold the file was written with
    pub chunk_interval: u64,
    /// Segment interval threshold the file was written with
    pub segment_interval: u64,
    /// Declared channels in file order
    pub channels: Vec<ChannelInfo>,
    /// Chunks in file order
    pub chunks: Vec<ChunkInfo>,
}

impl RecordInfo {
    /// Summary from a header, before any index is read.
    pub fn from_header(path: impl Into<String>, header: &Header, file_size: u64) -> Self {
        Self {
            path: path.into(),
            version: format!("{}.{}", header.major_version, header.minor_version),
            file_size,
            is_complete: header.is_complete,
            message_count: header.message_number,
            chunk_count: header.chunk_number,
            begin_time: header.begin_time,
            end_time: header.end_time,
            chunk_interval: header.chunk_interval,
            segment_interval: header.segment_interval,
            channels: Vec::new(),
            chunks: Vec::new(),
        }
    }

    /// Duration in nanoseconds.
    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.begin_time)
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelInfo> {
        self.channels.iter().find(|c| c.name == name)
    }
}

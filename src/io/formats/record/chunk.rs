// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory chunk under construction.

use super::proto::{ChunkBody, ChunkHeader, SingleMessage};

/// Active chunk: buffered messages plus their running summary.
///
/// Messages keep insertion order. Begin/end times are tracked as min/max so
/// unsorted input still yields a correct time range.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    header: ChunkHeader,
    body: ChunkBody,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and update the summary.
    pub fn add(&mut self, message: SingleMessage) {
        if self.is_empty() {
            self.header.begin_time = message.time;
            self.header.end_time = message.time;
        } else {
            self.header.begin_time = self.header.begin_time.min(message.time);
            self.header.end_time = self.header.end_time.max(message.time);
        }
        self.header.message_number += 1;
        self.header.raw_size += message.content.len() as u64;
        self.body.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.header.message_number == 0
    }

    /// Reset to a fresh empty chunk.
    pub fn clear(&mut self) {
        self.header = ChunkHeader::default();
        self.body.messages.clear();
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn body(&self) -> &ChunkBody {
        &self.body
    }

    pub fn begin_time(&self) -> u64 {
        self.header.begin_time
    }

    pub fn raw_size(&self) -> u64 {
        self.header.raw_size
    }

    /// Whether `time` lies further than `interval` past the chunk start.
    ///
    /// A zero interval never triggers.
    pub fn exceeds_interval(&self, time: u64, interval: u64) -> bool {
        interval > 0 && time.saturating_sub(self.header.begin_time) > interval
    }

    /// Whether the buffered payload exceeds `limit` bytes.
    ///
    /// A zero limit never triggers.
    pub fn exceeds_raw_size(&self, limit: u64) -> bool {
        limit > 0 && self.header.raw_size > limit
    }
}

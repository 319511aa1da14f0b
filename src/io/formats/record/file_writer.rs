// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Single-file record writer.
//!
//! Writes one physical record file front to back:
//!
//! 1. Header region (fixed [`HEADER_REGION_END`] bytes at offset 0)
//! 2. Channel sections, one per declared channel
//! 3. Chunk header + chunk body section pairs as chunks fill up
//! 4. Index section
//!
//! Everything is appended except the header, which is written once at open
//! and overwritten in place at [`close`](RecordFileWriter::close) with the
//! final counters, index position and `is_complete = true`.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cyberrec::io::formats::record::{
//!     Channel, HeaderBuilder, RecordFileWriter, SingleMessage,
//! };
//!
//! let mut writer = RecordFileWriter::open("out.record")?;
//! writer.write_header(HeaderBuilder::default_header())?;
//! writer.write_channel(Channel {
//!     name: "/chatter".to_string(),
//!     message_type: "demo.String".to_string(),
//!     proto_desc: Vec::new(),
//! })?;
//! writer.write_message(SingleMessage::new("/chatter", 1_000, b"hi".to_vec()))?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use prost::Message;
use tracing::{debug, warn};

use super::chunk::Chunk;
use super::constants::HEADER_REGION_END;
use super::header::HeaderBuilder;
use super::proto::{
    single_index, Channel, ChannelCache, ChunkBody, ChunkBodyCache, ChunkHeader,
    ChunkHeaderCache, Header, Index, SectionType, SingleIndex, SingleMessage,
};
use super::section::{encode_section, Section};
use crate::core::{RecordError, Result};

/// Writer for one physical record file.
///
/// # Important
///
/// Call [`close()`](RecordFileWriter::close) to finalize the file. Dropping
/// an open writer leaves a file whose header still says
/// `is_complete = false`; parsers can scan it but cannot use its index.
pub struct RecordFileWriter {
    /// Output path
    path: String,
    /// File handle, `None` once closed
    writer: Option<BufWriter<File>>,
    /// Container header, finalized at close
    header: Header,
    /// Index under construction
    index: Index,
    /// Append cursor
    position: u64,
    /// Active chunk
    chunk: Chunk,
    /// Messages written per channel, patched into the index at close
    channel_message_counts: HashMap<String, u64>,
}

impl RecordFileWriter {
    /// Create or truncate `path` for writing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let file = File::create(&path)
            .map_err(|e| RecordError::open(&path_str, format!("Failed to create file: {e}")))?;

        debug!(path = %path_str, "opened record file for writing");

        Ok(Self {
            path: path_str,
            writer: Some(BufWriter::new(file)),
            header: HeaderBuilder::default_header(),
            index: Index::default(),
            position: 0,
            chunk: Chunk::new(),
            channel_message_counts: HashMap::new(),
        })
    }

    /// Write the initial header at offset 0.
    ///
    /// Must be the first write. Only the version and thresholds of `header`
    /// are kept; counters start at zero and are finalized at close. The
    /// thresholds drive chunk flushing.
    pub fn write_header(&mut self, header: Header) -> Result<()> {
        if self.position != 0 {
            return Err(RecordError::framing(
                "write_header",
                format!(
                    "header must be written first (cursor at {})",
                    self.position
                ),
            ));
        }
        self.header = HeaderBuilder::from_template(&header);
        self.write_header_region()
    }

    /// Append a channel section and index it.
    pub fn write_channel(&mut self, channel: Channel) -> Result<()> {
        let cache = ChannelCache {
            message_number: 0,
            name: channel.name.clone(),
            message_type: channel.message_type.clone(),
            proto_desc: channel.proto_desc.clone(),
        };
        let position = self.write_section(&Section::Channel(channel))?;
        self.header.channel_number += 1;
        self.index.indexes.push(SingleIndex::channel(position, cache));
        Ok(())
    }

    /// Buffer a message, flushing the active chunk when a threshold is crossed.
    pub fn write_message(&mut self, message: SingleMessage) -> Result<()> {
        self.writer_mut("write_message")?;

        *self
            .channel_message_counts
            .entry(message.channel_name.clone())
            .or_default() += 1;

        let time = message.time;
        self.chunk.add(message);

        let need_flush = self.chunk.exceeds_interval(time, self.header.chunk_interval)
            || self.chunk.exceeds_raw_size(self.header.chunk_raw_size);
        if need_flush {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the active chunk (if any) and start a new one.
    pub fn flush(&mut self) -> Result<()> {
        if self.chunk.is_empty() {
            return Ok(());
        }
        let mut chunk = std::mem::take(&mut self.chunk);
        let result = self.write_chunk(chunk.header(), chunk.body());
        chunk.clear();
        self.chunk = chunk;
        result
    }

    /// Append a chunk header/body pair and index both.
    pub fn write_chunk(&mut self, header: &ChunkHeader, body: &ChunkBody) -> Result<()> {
        let header_position =
            self.write_payload(SectionType::SectionChunkHeader, &header.encode_to_vec())?;
        let body_position =
            self.write_payload(SectionType::SectionChunkBody, &body.encode_to_vec())?;

        if self.header.chunk_number == 0 {
            self.header.begin_time = header.begin_time;
            self.header.end_time = header.end_time;
        } else {
            self.header.begin_time = self.header.begin_time.min(header.begin_time);
            self.header.end_time = self.header.end_time.max(header.end_time);
        }
        self.header.chunk_number += 1;
        self.header.message_number += header.message_number;

        self.index.indexes.push(SingleIndex::chunk_header(
            header_position,
            ChunkHeaderCache {
                message_number: header.message_number,
                begin_time: header.begin_time,
                end_time: header.end_time,
                raw_size: header.raw_size,
            },
        ));
        self.index.indexes.push(SingleIndex::chunk_body(
            body_position,
            ChunkBodyCache {
                message_number: body.messages.len() as u64,
            },
        ));

        debug!(
            path = %self.path,
            position = header_position,
            messages = header.message_number,
            raw_size = header.raw_size,
            "chunk written"
        );
        Ok(())
    }

    /// Patch per-channel counts into the index and append it.
    pub fn write_index(&mut self) -> Result<()> {
        for entry in &mut self.index.indexes {
            if let Some(single_index::Cache::ChannelCache(cache)) = &mut entry.cache {
                if let Some(&count) = self.channel_message_counts.get(&cache.name) {
                    cache.message_number = count;
                }
            }
        }

        self.header.index_position = self.position;
        let payload = self.index.encode_to_vec();
        self.write_payload(SectionType::SectionIndex, &payload)?;
        Ok(())
    }

    /// Flush, write the index, rewrite the header and close the file.
    ///
    /// Does nothing if already closed. A failed chunk flush does not stop
    /// the index and header from being written, but its error is returned.
    /// `is_complete` is set only once the index has reached the file.
    pub fn close(&mut self) -> Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }

        let flush_result = self.flush();
        if let Err(e) = &flush_result {
            warn!(path = %self.path, error = %e, "failed to flush final chunk");
        }

        let index_result = self.write_index().and_then(|()| {
            self.writer_mut("write_index")?
                .flush()
                .map_err(|e| RecordError::io("write_index", e))
        });
        self.header.is_complete = index_result.is_ok();

        let header_result = self.write_header_region().and_then(|()| {
            self.writer_mut("close")?
                .flush()
                .map_err(|e| RecordError::io("close", e))
        });

        self.writer = None;

        debug!(
            path = %self.path,
            size = self.header.size,
            chunks = self.header.chunk_number,
            messages = self.header.message_number,
            complete = self.header.is_complete,
            "record file closed"
        );

        flush_result.and(index_result).and(header_result)
    }

    /// Output path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current append cursor.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Header as it stands (final after close).
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Index entries recorded so far.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Messages accepted so far, including the unflushed chunk.
    pub fn message_count(&self) -> u64 {
        self.channel_message_counts.values().sum()
    }

    pub fn channel_count(&self) -> u64 {
        self.header.channel_number
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Write the header into the fixed region at offset 0.
    ///
    /// On first write this is a plain append; afterwards it seeks back to 0,
    /// overwrites the region and leaves the cursor where it was.
    fn write_header_region(&mut self) -> Result<()> {
        let end = self.position;
        self.header.size = end;
        let bytes = encode_section(SectionType::SectionHeader, &self.header.encode_to_vec())?;

        let writer = self.writer_mut("write_header")?;
        if end > 0 {
            writer
                .seek(SeekFrom::Start(0))
                .map_err(|e| RecordError::io("write_header", e))?;
        }
        writer
            .write_all(&bytes)
            .map_err(|e| RecordError::io("write_header", e))?;

        if end == 0 {
            self.position = HEADER_REGION_END;
            self.header.size = self.position;
        } else {
            writer
                .seek(SeekFrom::Start(end))
                .map_err(|e| RecordError::io("write_header", e))?;
        }
        Ok(())
    }

    /// Append a section, returning its start offset.
    fn write_section(&mut self, section: &Section) -> Result<u64> {
        self.write_payload(section.section_type(), &section.encode_payload())
    }

    fn write_payload(&mut self, section_type: SectionType, payload: &[u8]) -> Result<u64> {
        if section_type == SectionType::SectionHeader {
            return Err(RecordError::framing(
                "write_section",
                "header sections go through write_header",
            ));
        }
        if self.position < HEADER_REGION_END {
            return Err(RecordError::framing(
                "write_section",
                format!("{} written before header", section_type.name()),
            ));
        }

        let bytes = encode_section(section_type, payload)?;
        let start = self.position;
        self.writer_mut("write_section")?
            .write_all(&bytes)
            .map_err(|e| RecordError::io(format!("write {}", section_type.name()), e))?;

        self.position += bytes.len() as u64;
        self.header.size = self.position;
        Ok(start)
    }

    fn writer_mut(&mut self, context: &str) -> Result<&mut BufWriter<File>> {
        let path = &self.path;
        self.writer
            .as_mut()
            .ok_or_else(|| RecordError::framing(context, format!("writer for '{path}' is closed")))
    }
}

impl Drop for RecordFileWriter {
    fn drop(&mut self) {
        if self.writer.is_some() {
            warn!(path = %self.path, "RecordFileWriter dropped without calling close()");
        }
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record file parser.
//!
//! Reads one physical record file as a forward stream:
//!
//! 1. [`read_header`](RecordParser::read_header) decodes the fixed header
//!    region at offset 0.
//! 2. [`read_index`](RecordParser::read_index) jumps to the index (complete
//!    files only) and comes back.
//! 3. [`read_messages`](RecordParser::read_messages) scans sections up to
//!    the index, decoding messages for the requested channels into sinks.
//!
//! The handle only moves forward. Going back to an earlier offset reopens
//! the file and skips ahead again.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cyberrec::encoding::{CodecTable, RawCodec};
//! use cyberrec::io::formats::record::RecordParser;
//! use cyberrec::io::sink::{MessageSink, SinkMap};
//!
//! let codecs = CodecTable::new().with("/camera", RawCodec::new("sensor.Image"));
//! let mut sinks: SinkMap<Vec<u8>> = SinkMap::new();
//! sinks.insert("/camera".to_string(), MessageSink::ordered());
//!
//! let mut parser = RecordParser::new();
//! let count = parser.parse("drive.record.00000", &mut sinks, &codecs)?;
//! println!("read {count} messages");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bytes::Bytes;
use prost::Message;
use tracing::{debug, warn};

use super::constants::{HEADER_LENGTH, HEADER_REGION_END, SECTION_LENGTH};
use super::proto::{
    Channel, ChannelCache, ChunkBody, ChunkHeader, Header, Index, SectionType,
};
use super::section::{read_frame, read_payload, Section, SectionFrame};
use crate::core::{RecordError, Result};
use crate::encoding::CodecTable;
use crate::io::metadata::{ChannelInfo, ChunkInfo, RecordInfo};
use crate::io::sink::SinkMap;

/// Sequential reader for one record file.
#[derive(Default)]
pub struct RecordParser {
    /// Path of the open file
    path: String,
    /// File handle, `None` when closed
    reader: Option<BufReader<File>>,
    /// Read cursor
    position: u64,
    /// Header, once read
    header: Option<Header>,
    /// Index, once read
    index: Option<Index>,
    /// Channel caches from the index, by name
    channel_info: HashMap<String, ChannelCache>,
}

impl RecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` for reading, discarding any previous state.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let file = File::open(&path)
            .map_err(|e| RecordError::open(&path_str, format!("Failed to open file: {e}")))?;

        debug!(path = %path_str, "opened record file for reading");

        *self = Self {
            path: path_str,
            reader: Some(BufReader::new(file)),
            ..Self::default()
        };
        Ok(())
    }

    /// Release the file handle. Decoded header and index stay available.
    pub fn close(&mut self) {
        self.reader = None;
    }

    /// Decode the header region and leave the cursor just past it.
    pub fn read_header(&mut self) -> Result<&Header> {
        self.set_position(0)?;
        let frame = self
            .next_frame()?
            .ok_or_else(|| RecordError::framing("read_header", "file is empty"))?;
        if frame.section_type != SectionType::SectionHeader {
            return Err(RecordError::framing(
                "read_header",
                format!("expected HEADER section, found {}", frame.section_type.name()),
            ));
        }
        if frame.length > HEADER_LENGTH {
            return Err(RecordError::framing(
                "read_header",
                format!("header payload of {} bytes exceeds fixed width", frame.length),
            ));
        }

        let payload = self.next_payload(&frame)?;
        let header = Header::decode(payload.as_slice())?;
        self.set_position(HEADER_REGION_END)?;

        debug!(
            path = %self.path,
            complete = header.is_complete,
            chunks = header.chunk_number,
            messages = header.message_number,
            "header read"
        );
        Ok(&*self.header.insert(header))
    }

    /// Read the index and return the cursor to the end of the header.
    ///
    /// Fails with [`RecordError::IncompleteFile`] before touching the file if
    /// the header does not mark the file complete.
    pub fn read_index(&mut self) -> Result<&Index> {
        let header = self.require_header("read_index")?;
        if !header.is_complete {
            return Err(RecordError::incomplete(&self.path));
        }
        let index_position = header.index_position;

        self.set_position(index_position)?;
        let payload = self.expect_section("read_index", SectionType::SectionIndex)?;
        let index = Index::decode(payload.as_slice())?;

        self.channel_info = index
            .entries_of(SectionType::SectionChannel)
            .filter_map(|entry| entry.channel_cache())
            .map(|cache| (cache.name.clone(), cache.clone()))
            .collect();
        self.set_position(HEADER_REGION_END)?;

        debug!(
            path = %self.path,
            entries = index.indexes.len(),
            channels = self.channel_info.len(),
            "index read"
        );
        Ok(&*self.index.insert(index))
    }

    /// Scan message data, storing requested channels into `sinks`.
    ///
    /// Starts at the cursor (normally just past the header) and stops after
    /// the INDEX section or at end of file. Message payloads are slices of
    /// the chunk body buffer, so unrequested channels are never copied. Only channels with both a sink and a
    /// codec are decoded. Returns the number of messages stored; keyed sinks
    /// drop repeated timestamps and those are not counted.
    ///
    /// On a file whose header is not complete, a truncated trailing section
    /// ends the scan with a warning instead of an error.
    pub fn read_messages<M>(
        &mut self,
        sinks: &mut SinkMap<M>,
        codecs: &CodecTable<M>,
    ) -> Result<usize> {
        let tolerant = !self.require_header("read_messages")?.is_complete;
        if self.position < HEADER_REGION_END {
            self.set_position(HEADER_REGION_END)?;
        }

        let mut stored = 0;
        loop {
            match self.read_section(sinks, codecs) {
                Ok(Some(count)) => stored += count,
                Ok(None) => break,
                Err(e) if tolerant && e.is_framing() => {
                    warn!(
                        path = %self.path,
                        position = self.position,
                        error = %e,
                        "stopping at truncated section in incomplete file"
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        debug!(path = %self.path, stored, "messages read");
        Ok(stored)
    }

    /// Move the cursor to `position`.
    ///
    /// Forward moves skip bytes on the open handle. Backward moves reopen
    /// the file first.
    pub fn set_position(&mut self, position: u64) -> Result<()> {
        if position < self.position {
            let file = File::open(&self.path)
                .map_err(|e| RecordError::open(&self.path, format!("Failed to reopen file: {e}")))?;
            self.reader = Some(BufReader::new(file));
            self.position = 0;
            debug!(path = %self.path, target = position, "reopened for backward seek");
        }

        let skip = position - self.position;
        if skip > 0 {
            let skip = i64::try_from(skip).map_err(|_| {
                RecordError::framing("set_position", format!("offset {position} out of range"))
            })?;
            self.reader_mut("set_position")?
                .seek_relative(skip)
                .map_err(|e| RecordError::io("set_position", e))?;
            self.position = position;
        }
        Ok(())
    }

    /// Read the chunk whose header section starts at `position`.
    ///
    /// Positions come from the index, see [`chunk_summaries`](Self::chunk_summaries).
    /// The cursor is left after the chunk body.
    pub fn read_chunk(&mut self, position: u64) -> Result<(ChunkHeader, ChunkBody)> {
        self.set_position(position)?;
        let header = self.expect_section("read_chunk", SectionType::SectionChunkHeader)?;
        let header = ChunkHeader::decode(header.as_slice())?;
        let body = self.expect_section("read_chunk", SectionType::SectionChunkBody)?;
        let body = ChunkBody::decode(body.as_slice())?;
        Ok((header, body))
    }

    /// Read a whole file: header, index (if complete), then messages.
    pub fn parse<P, M>(
        &mut self,
        path: P,
        sinks: &mut SinkMap<M>,
        codecs: &CodecTable<M>,
    ) -> Result<usize>
    where
        P: AsRef<Path>,
    {
        self.open(path)?;
        if self.read_header()?.is_complete {
            self.read_index()?;
        } else {
            warn!(path = %self.path, "record file is incomplete, scanning without index");
        }
        let stored = self.read_messages(sinks, codecs);
        self.close();
        stored
    }

    /// Channel directory of a complete file, read from its index alone.
    pub fn get_channels<P: AsRef<Path>>(path: P) -> Result<Vec<ChannelInfo>> {
        let mut parser = Self::new();
        parser.open(path)?;
        parser.read_header()?;
        parser.read_index()?;
        parser.close();
        Ok(parser.channels())
    }

    /// Summary of a file.
    ///
    /// Complete files are summarized from header and index. Incomplete
    /// files are scanned for channel and chunk header sections instead.
    pub fn info<P: AsRef<Path>>(path: P) -> Result<RecordInfo> {
        let path = path.as_ref();
        let file_size = std::fs::metadata(path)
            .map_err(|e| RecordError::open(path.display().to_string(), e.to_string()))?
            .len();

        let mut parser = Self::new();
        parser.open(path)?;
        let header = parser.read_header()?.clone();
        let mut info = RecordInfo::from_header(parser.path.clone(), &header, file_size);

        if header.is_complete {
            parser.read_index()?;
            info.channels = parser.channels();
            info.chunks = parser.chunk_summaries();
        } else {
            let (channels, chunks) = parser.scan_directory()?;
            info.message_count = chunks.iter().map(|c| c.message_count).sum();
            info.chunk_count = chunks.len() as u64;
            info.begin_time = chunks.iter().map(|c| c.begin_time).min().unwrap_or(0);
            info.end_time = chunks.iter().map(|c| c.end_time).max().unwrap_or(0);
            info.channels = channels;
            info.chunks = chunks;
        }
        parser.close();
        Ok(info)
    }

    /// Channels from the index, in file order.
    pub fn channels(&self) -> Vec<ChannelInfo> {
        self.index
            .iter()
            .flat_map(|index| index.entries_of(SectionType::SectionChannel))
            .filter_map(|entry| entry.channel_cache())
            .map(ChannelInfo::from)
            .collect()
    }

    /// Chunk summaries from the index, in file order.
    pub fn chunk_summaries(&self) -> Vec<ChunkInfo> {
        self.index
            .iter()
            .flat_map(|index| index.entries_of(SectionType::SectionChunkHeader))
            .filter_map(|entry| {
                entry
                    .chunk_header_cache()
                    .map(|cache| ChunkInfo::from_cache(entry.position, cache))
            })
            .collect()
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    /// Index cache for a channel.
    pub fn channel_info(&self, name: &str) -> Option<&ChannelCache> {
        self.channel_info.get(name)
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Handle one section. `None` marks the end of message data.
    fn read_section<M>(
        &mut self,
        sinks: &mut SinkMap<M>,
        codecs: &CodecTable<M>,
    ) -> Result<Option<usize>> {
        let start = self.position;
        let Some(frame) = self.next_frame()? else {
            return Ok(None);
        };

        match frame.section_type {
            SectionType::SectionIndex => {
                self.skip_payload(&frame)?;
                return Ok(None);
            }
            SectionType::SectionChunkBody if sinks.is_empty() => {
                self.skip_payload(&frame)?;
                return Ok(Some(0));
            }
            _ => {}
        }

        let payload = Bytes::from(self.next_payload(&frame)?);
        match Section::decode(frame.section_type, payload)? {
            Section::Header(_) => Err(RecordError::framing(
                "read_messages",
                format!("unexpected HEADER section at offset {start}"),
            )),
            Section::Channel(channel) => {
                debug!(
                    channel = %channel.name,
                    message_type = %channel.message_type,
                    "channel section"
                );
                Ok(Some(0))
            }
            Section::ChunkHeader(_) => Ok(Some(0)),
            Section::ChunkBody(body) => store_messages(body, sinks, codecs).map(Some),
            Section::Index(_) => Ok(None),
        }
    }

    /// Linear scan collecting channel and chunk header sections.
    fn scan_directory(&mut self) -> Result<(Vec<ChannelInfo>, Vec<ChunkInfo>)> {
        let mut channels = Vec::new();
        let mut chunks = Vec::new();
        loop {
            let start = self.position;
            let frame = match self.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) if e.is_framing() => {
                    warn!(path = %self.path, error = %e, "stopping scan at truncated section");
                    break;
                }
                Err(e) => return Err(e),
            };
            let result = match frame.section_type {
                SectionType::SectionIndex => break,
                SectionType::SectionChannel => self.next_payload(&frame).and_then(|p| {
                    let channel = Channel::decode(p.as_slice())?;
                    channels.push(ChannelInfo::new(channel.name, channel.message_type));
                    Ok(())
                }),
                SectionType::SectionChunkHeader => self.next_payload(&frame).and_then(|p| {
                    let header = ChunkHeader::decode(p.as_slice())?;
                    chunks.push(ChunkInfo {
                        position: start,
                        begin_time: header.begin_time,
                        end_time: header.end_time,
                        message_count: header.message_number,
                        raw_size: header.raw_size,
                    });
                    Ok(())
                }),
                _ => self.skip_payload(&frame),
            };
            if let Err(e) = result {
                if !e.is_framing() {
                    return Err(e);
                }
                warn!(path = %self.path, error = %e, "stopping scan at truncated section");
                break;
            }
        }
        Ok((channels, chunks))
    }

    /// Payload of the next section, which must be of type `expected`.
    fn expect_section(&mut self, context: &str, expected: SectionType) -> Result<Vec<u8>> {
        let start = self.position;
        let frame = self.next_frame()?.ok_or_else(|| {
            RecordError::framing(context, format!("no section at offset {start}"))
        })?;
        if frame.section_type != expected {
            return Err(RecordError::framing(
                context,
                format!(
                    "expected {} section at offset {start}, found {}",
                    expected.name(),
                    frame.section_type.name()
                ),
            ));
        }
        self.next_payload(&frame)
    }

    fn next_frame(&mut self) -> Result<Option<SectionFrame>> {
        let frame = read_frame(self.reader_mut("read_frame")?)?;
        if frame.is_some() {
            self.position += SECTION_LENGTH;
        }
        Ok(frame)
    }

    fn next_payload(&mut self, frame: &SectionFrame) -> Result<Vec<u8>> {
        let payload = read_payload(self.reader_mut("read_payload")?, frame.length)?;
        self.position += frame.length;
        Ok(payload)
    }

    /// Skip a payload without reading it.
    ///
    /// Truncation only shows up at the next frame read.
    fn skip_payload(&mut self, frame: &SectionFrame) -> Result<()> {
        self.set_position(self.position + frame.length)
    }

    fn require_header(&self, context: &str) -> Result<&Header> {
        self.header
            .as_ref()
            .ok_or_else(|| RecordError::framing(context, "header has not been read"))
    }

    fn reader_mut(&mut self, context: &str) -> Result<&mut BufReader<File>> {
        let path = &self.path;
        self.reader.as_mut().ok_or_else(|| {
            RecordError::framing(context, format!("parser for '{path}' has no open file"))
        })
    }
}

/// Decode and store the messages of one chunk body.
fn store_messages<M>(
    body: ChunkBody,
    sinks: &mut SinkMap<M>,
    codecs: &CodecTable<M>,
) -> Result<usize> {
    let mut stored = 0;
    for message in body.messages {
        let Some(sink) = sinks.get_mut(&message.channel_name) else {
            continue;
        };
        let Some(codec) = codecs.get(&message.channel_name) else {
            continue;
        };
        let decoded = codec.decode(&message.content).map_err(|e| {
            RecordError::schema(
                &message.channel_name,
                format!("failed to decode message at time {}: {e}", message.time),
            )
        })?;
        if sink.store(message.time, decoded) {
            stored += 1;
        }
    }
    Ok(stored)
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Segmented record writer.
//!
//! [`RecordWriter`] drives a [`RecordFileWriter`] across one or more
//! physical files. After every message it checks the segment thresholds;
//! once one is crossed the current file is closed and the next one opened
//! as `<base>.<NNNNN>`, with every known channel declared again so each
//! segment can be read on its own.
//!
//! The batch entry point [`RecordWriter::write_all`] takes per-channel
//! message collections plus codecs, merges them into one stream ordered by
//! time and writes it.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cyberrec::core::RecordConfig;
//! use cyberrec::encoding::{CodecTable, RawCodec};
//! use cyberrec::io::formats::record::RecordWriter;
//! use cyberrec::io::sink::{MessageSink, SinkMap};
//!
//! let mut messages = SinkMap::new();
//! let mut camera = MessageSink::ordered();
//! camera.store(1_000, vec![1u8, 2, 3]);
//! messages.insert("/camera".to_string(), camera);
//!
//! let codecs = CodecTable::new().with("/camera", RawCodec::new("sensor.Image"));
//!
//! let mut writer = RecordWriter::new(RecordConfig::default());
//! let summary = writer.write_all("drive.record", &messages, &codecs)?;
//! println!("{} messages in {} segment(s)", summary.messages, summary.segments.len());
//! # Ok(())
//! # }
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::constants::MAX_SEGMENT_INDEX;
use super::file_writer::RecordFileWriter;
use super::header::HeaderBuilder;
use super::proto::{Channel, Header, SingleMessage};
use crate::core::{RecordConfig, RecordError, Result};
use crate::encoding::{resolve_timestamp, CodecTable};
use crate::io::sink::SinkMap;

/// Outcome of [`RecordWriter::write_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Messages written across all segments
    pub messages: u64,
    /// Channels declared
    pub channels: usize,
    /// Physical files written, in order
    pub segments: Vec<PathBuf>,
}

/// Writer producing one logical recording, possibly split over segments.
pub struct RecordWriter {
    /// Header every segment starts from
    template: Header,
    /// Base output path
    base: PathBuf,
    /// Suffix of the current segment
    file_index: u32,
    /// Active file, `None` when closed
    current: Option<RecordFileWriter>,
    /// Raw payload bytes written to the current segment
    segment_raw_size: u64,
    /// Earliest message time in the current segment
    segment_begin_time: Option<u64>,
    /// Channels declared so far, replayed into every new segment
    channels: Vec<Channel>,
    /// Files opened so far
    segment_paths: Vec<PathBuf>,
}

impl RecordWriter {
    /// Writer using the thresholds from `config`.
    pub fn new(config: RecordConfig) -> Self {
        Self::with_header(HeaderBuilder::from_config(&config).build())
    }

    /// Writer using the version and thresholds of `template`.
    ///
    /// Counters in `template` are ignored; every segment starts from zero.
    pub fn with_header(template: Header) -> Self {
        Self {
            template: HeaderBuilder::from_template(&template),
            base: PathBuf::new(),
            file_index: 0,
            current: None,
            segment_raw_size: 0,
            segment_begin_time: None,
            channels: Vec::new(),
            segment_paths: Vec::new(),
        }
    }

    /// Whether either segment trigger is enabled.
    ///
    /// Unsegmented output is written at the base path itself.
    pub fn is_segmented(&self) -> bool {
        self.template.segment_interval > 0 || self.template.segment_raw_size > 0
    }

    /// Start a new recording at `base`.
    ///
    /// Any recording still open is closed first. Channel declarations and
    /// segment history are reset.
    pub fn open<P: AsRef<Path>>(&mut self, base: P) -> Result<()> {
        self.close()?;
        self.base = base.as_ref().to_path_buf();
        self.file_index = 0;
        self.channels.clear();
        self.segment_paths.clear();
        self.open_segment()
    }

    /// Declare a channel in the current segment and all later ones.
    ///
    /// Declaring an already known name again is a no-op.
    pub fn write_channel(
        &mut self,
        name: &str,
        message_type: &str,
        proto_desc: &[u8],
    ) -> Result<()> {
        if self.channels.iter().any(|c| c.name == name) {
            return Ok(());
        }
        let channel = Channel {
            name: name.to_string(),
            message_type: message_type.to_string(),
            proto_desc: proto_desc.to_vec(),
        };
        self.current_mut("write_channel")?
            .write_channel(channel.clone())?;
        self.channels.push(channel);
        Ok(())
    }

    /// Write one message, starting a new segment if a threshold is crossed.
    pub fn write_message(&mut self, message: SingleMessage) -> Result<()> {
        let time = message.time;
        let size = message.content.len() as u64;
        self.current_mut("write_message")?.write_message(message)?;

        self.segment_raw_size += size;
        let begin = match self.segment_begin_time {
            Some(begin) => begin.min(time),
            None => time,
        };
        self.segment_begin_time = Some(begin);

        let raw_limit = self.template.segment_raw_size;
        let interval = self.template.segment_interval;
        let need_split = (raw_limit > 0 && self.segment_raw_size > raw_limit)
            || (interval > 0 && time.saturating_sub(begin) > interval);
        if need_split {
            self.split()?;
        }
        Ok(())
    }

    /// Close the current segment. Does nothing if nothing is open.
    pub fn close(&mut self) -> Result<()> {
        match self.current.take() {
            Some(mut file) => file.close(),
            None => Ok(()),
        }
    }

    /// Merge, declare and write a whole recording, then close it.
    ///
    /// Every channel in `messages` is declared (in name order) even if its
    /// collection is empty. Each channel needs a codec in `codecs`.
    pub fn write_all<P, M>(
        &mut self,
        base: P,
        messages: &SinkMap<M>,
        codecs: &CodecTable<M>,
    ) -> Result<WriteSummary>
    where
        P: AsRef<Path>,
    {
        let merged = merge_messages(messages, codecs)?;
        self.open(base)?;

        let result = self.write_merged(messages, codecs, merged);
        let close_result = self.close();
        let written = result?;
        close_result?;

        info!(
            base = %self.base.display(),
            messages = written,
            segments = self.segment_paths.len(),
            "recording written"
        );

        Ok(WriteSummary {
            messages: written,
            channels: self.channels.len(),
            segments: self.segment_paths.clone(),
        })
    }

    /// Files opened so far, including the current one.
    pub fn segment_paths(&self) -> &[PathBuf] {
        &self.segment_paths
    }

    /// Channels declared so far.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn header_template(&self) -> &Header {
        &self.template
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    fn write_merged<M>(
        &mut self,
        messages: &SinkMap<M>,
        codecs: &CodecTable<M>,
        merged: Vec<SingleMessage>,
    ) -> Result<u64> {
        for channel in messages.keys() {
            let codec = codecs.require(channel)?;
            self.write_channel(
                channel,
                codec.message_type(),
                codec.proto_desc().unwrap_or_default(),
            )?;
        }

        let mut written = 0u64;
        for message in merged {
            self.write_message(message)?;
            written += 1;
        }
        Ok(written)
    }

    fn split(&mut self) -> Result<()> {
        debug!(
            base = %self.base.display(),
            segment = self.file_index,
            raw_size = self.segment_raw_size,
            "segment threshold reached"
        );
        self.close()?;
        self.file_index = next_segment_index(self.file_index);
        self.open_segment()
    }

    fn open_segment(&mut self) -> Result<()> {
        let path = if self.is_segmented() {
            segment_path(&self.base, self.file_index)
        } else {
            self.base.clone()
        };

        let mut file = RecordFileWriter::open(&path)?;
        file.write_header(self.template.clone())?;
        for channel in &self.channels {
            file.write_channel(channel.clone())?;
        }

        self.current = Some(file);
        self.segment_raw_size = 0;
        self.segment_begin_time = None;
        self.segment_paths.push(path);
        Ok(())
    }

    fn current_mut(&mut self, context: &str) -> Result<&mut RecordFileWriter> {
        self.current
            .as_mut()
            .ok_or_else(|| RecordError::framing(context, "no recording is open"))
    }
}

/// Flatten per-channel collections into one time-ordered message stream.
///
/// Payloads are encoded with each channel's codec and timed per
/// [`resolve_timestamp`]. The sort is stable: messages sharing a time keep
/// channel name order, then their order within the channel.
pub fn merge_messages<M>(
    messages: &SinkMap<M>,
    codecs: &CodecTable<M>,
) -> Result<Vec<SingleMessage>> {
    let mut merged = Vec::with_capacity(messages.values().map(|s| s.len()).sum());
    for (channel, sink) in messages {
        let codec = codecs.require(channel)?;
        for (explicit, message) in sink.entries() {
            let time = resolve_timestamp(channel, explicit, message, codec)?;
            let content = codec.encode(message)?;
            merged.push(SingleMessage::new(channel.clone(), time, content));
        }
    }
    merged.sort_by_key(|m| m.time);
    Ok(merged)
}

/// Path of segment `index`: `<base>.<NNNNN>`.
pub fn segment_path(base: &Path, index: u32) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{index:05}"));
    PathBuf::from(name)
}

fn next_segment_index(index: u32) -> u32 {
    if index >= MAX_SEGMENT_INDEX {
        0
    } else {
        index + 1
    }
}

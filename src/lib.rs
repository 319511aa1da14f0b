// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Cyberrec
//!
//! Reader and writer for the Cyber record container: a chunked, indexed,
//! optionally segmented log of timestamped multi-channel messages.
//!
//! ## Architecture
//!
//! - `core/` - Errors and split-threshold configuration
//! - `encoding/` - Caller-supplied message codecs and timestamp resolution
//! - `io/formats/record/` - Section framing, file writer, segmented writer, parser
//! - `io/sink.rs` - Per-channel message collections (ordered or keyed by time)
//!
//! Message payloads are opaque to the container. Every channel needs a
//! [`MessageCodec`](encoding::MessageCodec) registered under its name; the
//! codec also supplies the schema type name recorded in the file.
//!
//! ## Example: Writing and reading back
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cyberrec::{CodecTable, MessageSink, RawCodec, RecordConfig, RecordParser, RecordWriter, SinkMap};
//!
//! let codecs = CodecTable::new().with("/lidar", RawCodec::new("sensor.PointCloud"));
//!
//! let mut messages = SinkMap::new();
//! let mut lidar = MessageSink::ordered();
//! lidar.store(1_000_000, vec![0u8; 64]);
//! lidar.store(2_000_000, vec![1u8; 64]);
//! messages.insert("/lidar".to_string(), lidar);
//!
//! let summary = RecordWriter::new(RecordConfig::default())
//!     .write_all("drive.record", &messages, &codecs)?;
//!
//! for segment in &summary.segments {
//!     let mut sinks = SinkMap::new();
//!     sinks.insert("/lidar".to_string(), MessageSink::ordered());
//!     RecordParser::new().parse(segment, &mut sinks, &codecs)?;
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use crate::core::{RecordConfig, RecordError, Result};

// Message codecs
pub mod encoding;

pub use encoding::{CodecTable, MessageCodec, ProstCodec, RawCodec};

// I/O types (record format, sinks, metadata)
pub mod io;

// Re-export key I/O types
pub use io::formats::record::{
    HeaderBuilder, RecordFileWriter, RecordParser, RecordWriter, SingleMessage, WriteSummary,
};
pub use io::metadata::{ChannelInfo, ChunkInfo, RecordInfo};
pub use io::sink::{MessageSink, SinkKind, SinkMap, TimedMessage};

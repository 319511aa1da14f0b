// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for record files.
//!
//! This module provides the container format itself plus the per-channel
//! sinks and summary types exchanged with callers.

pub mod formats;
pub mod metadata;
pub mod sink;

// Re-exports
pub use formats::record::{RecordFileWriter, RecordParser, RecordWriter, WriteSummary};
pub use metadata::{ChannelInfo, ChunkInfo, RecordInfo};
pub use sink::{MessageSink, SinkKind, SinkMap, TimedMessage};

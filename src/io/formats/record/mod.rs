// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Cyber record format implementation.
//!
//! This module provides a complete record writer/parser with:
//! - Section framing with a rewritable fixed-width header
//! - Chunk buffering with time and size flush thresholds
//! - Segmented output split on time and size thresholds
//! - Indexed and linear reading with per-channel decoding

// Wire constants
pub mod constants;

// Protobuf payloads
pub mod proto;

// Section framing
pub mod section;

// Header defaults
pub mod header;

// Active chunk
pub mod chunk;

// Single-file writer
pub mod file_writer;

// Segmented writer
pub mod writer;

// Parser
pub mod parser;

// Re-exports
pub use chunk::Chunk;
pub use file_writer::RecordFileWriter;
pub use header::HeaderBuilder;
pub use parser::RecordParser;
pub use proto::{
    Channel, ChannelCache, ChunkBody, ChunkBodyCache, ChunkHeader, ChunkHeaderCache,
    CompressType, Header, Index, SectionType, SingleIndex, SingleMessage,
};
pub use section::{Section, SectionFrame};
pub use writer::{merge_messages, segment_path, RecordWriter, WriteSummary};

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! On-disk record payloads.
//!
//! These are protobuf messages matching the Cyber `record.proto` schema
//! field for field, so files written here open in Cyber tooling and vice
//! versa. Scalars use implicit presence: a zero value is simply omitted
//! from the encoding, which proto2 readers see as an unset optional with
//! the same default.

/// Section type code stored in every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SectionType {
    SectionHeader = 0,
    SectionChunkHeader = 1,
    SectionChunkBody = 2,
    SectionIndex = 3,
    SectionChannel = 4,
}

impl SectionType {
    /// Upper-case name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            SectionType::SectionHeader => "HEADER",
            SectionType::SectionChunkHeader => "CHUNK_HEADER",
            SectionType::SectionChunkBody => "CHUNK_BODY",
            SectionType::SectionIndex => "INDEX",
            SectionType::SectionChannel => "CHANNEL",
        }
    }
}

/// Chunk compression mode. Only `CompressNone` is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CompressType {
    CompressNone = 0,
    CompressBz2 = 1,
    CompressLz4 = 2,
}

/// Container metadata. Lives in the fixed-width region at offset 0.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(uint32, tag = "1")]
    pub major_version: u32,
    #[prost(uint32, tag = "2")]
    pub minor_version: u32,
    #[prost(enumeration = "CompressType", tag = "3")]
    pub compress: i32,
    #[prost(uint64, tag = "4")]
    pub chunk_interval: u64,
    #[prost(uint64, tag = "5")]
    pub segment_interval: u64,
    #[prost(uint64, tag = "6")]
    pub index_position: u64,
    #[prost(uint64, tag = "7")]
    pub chunk_number: u64,
    #[prost(uint64, tag = "8")]
    pub channel_number: u64,
    #[prost(uint64, tag = "9")]
    pub begin_time: u64,
    #[prost(uint64, tag = "10")]
    pub end_time: u64,
    #[prost(uint64, tag = "11")]
    pub message_number: u64,
    #[prost(uint64, tag = "12")]
    pub size: u64,
    #[prost(bool, tag = "13")]
    pub is_complete: bool,
    #[prost(uint64, tag = "14")]
    pub chunk_raw_size: u64,
    #[prost(uint64, tag = "15")]
    pub segment_raw_size: u64,
}

/// Channel declaration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Channel {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub message_type: String,
    #[prost(bytes = "vec", tag = "3")]
    pub proto_desc: Vec<u8>,
}

/// Summary of the chunk body that follows it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChunkHeader {
    #[prost(uint64, tag = "1")]
    pub begin_time: u64,
    #[prost(uint64, tag = "2")]
    pub end_time: u64,
    #[prost(uint64, tag = "3")]
    pub message_number: u64,
    #[prost(uint64, tag = "4")]
    pub raw_size: u64,
}

/// One message on one channel.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SingleMessage {
    #[prost(string, tag = "1")]
    pub channel_name: String,
    #[prost(uint64, tag = "2")]
    pub time: u64,
    #[prost(bytes = "bytes", tag = "3")]
    pub content: ::bytes::Bytes,
}

impl SingleMessage {
    /// Create a message.
    pub fn new(
        channel_name: impl Into<String>,
        time: u64,
        content: impl Into<::bytes::Bytes>,
    ) -> Self {
        Self {
            channel_name: channel_name.into(),
            time,
            content: content.into(),
        }
    }
}

/// Ordered batch of messages.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChunkBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<SingleMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelCache {
    #[prost(uint64, tag = "1")]
    pub message_number: u64,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub message_type: String,
    #[prost(bytes = "vec", tag = "4")]
    pub proto_desc: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChunkHeaderCache {
    #[prost(uint64, tag = "1")]
    pub message_number: u64,
    #[prost(uint64, tag = "2")]
    pub begin_time: u64,
    #[prost(uint64, tag = "3")]
    pub end_time: u64,
    #[prost(uint64, tag = "4")]
    pub raw_size: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChunkBodyCache {
    #[prost(uint64, tag = "1")]
    pub message_number: u64,
}

/// One index entry: where a section starts and what it summarises.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SingleIndex {
    #[prost(enumeration = "SectionType", tag = "1")]
    pub r#type: i32,
    #[prost(uint64, tag = "2")]
    pub position: u64,
    #[prost(oneof = "single_index::Cache", tags = "101, 102, 103")]
    pub cache: Option<single_index::Cache>,
}

pub mod single_index {
    /// Per-section summary carried in the index.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Cache {
        #[prost(message, tag = "101")]
        ChannelCache(super::ChannelCache),
        #[prost(message, tag = "102")]
        ChunkHeaderCache(super::ChunkHeaderCache),
        #[prost(message, tag = "103")]
        ChunkBodyCache(super::ChunkBodyCache),
    }
}

impl SingleIndex {
    /// Index entry for a channel section.
    pub fn channel(position: u64, cache: ChannelCache) -> Self {
        Self {
            r#type: SectionType::SectionChannel as i32,
            position,
            cache: Some(single_index::Cache::ChannelCache(cache)),
        }
    }

    /// Index entry for a chunk header section.
    pub fn chunk_header(position: u64, cache: ChunkHeaderCache) -> Self {
        Self {
            r#type: SectionType::SectionChunkHeader as i32,
            position,
            cache: Some(single_index::Cache::ChunkHeaderCache(cache)),
        }
    }

    /// Index entry for a chunk body section.
    pub fn chunk_body(position: u64, cache: ChunkBodyCache) -> Self {
        Self {
            r#type: SectionType::SectionChunkBody as i32,
            position,
            cache: Some(single_index::Cache::ChunkBodyCache(cache)),
        }
    }

    /// Channel cache, if this entry carries one.
    pub fn channel_cache(&self) -> Option<&ChannelCache> {
        match &self.cache {
            Some(single_index::Cache::ChannelCache(cache)) => Some(cache),
            _ => None,
        }
    }

    /// Chunk header cache, if this entry carries one.
    pub fn chunk_header_cache(&self) -> Option<&ChunkHeaderCache> {
        match &self.cache {
            Some(single_index::Cache::ChunkHeaderCache(cache)) => Some(cache),
            _ => None,
        }
    }
}

/// End-of-file directory of sections.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Index {
    #[prost(message, repeated, tag = "1")]
    pub indexes: Vec<SingleIndex>,
}

impl Index {
    /// Entries of the given section type, in file order.
    pub fn entries_of(&self, ty: SectionType) -> impl Iterator<Item = &SingleIndex> {
        self.indexes
            .iter()
            .filter(move |entry| entry.r#type == ty as i32)
    }
}

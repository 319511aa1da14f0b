// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Caller-supplied message codecs.
//!
//! The container never interprets message payloads. For every channel the
//! caller registers a [`MessageCodec`] that turns its message type `M` into
//! bytes and back, and that names the schema type written into the
//! channel's declaration. Nothing is inferred from the Rust type.
//!
//! ## Example
//!
//! ```
//! use cyberrec::encoding::{CodecTable, RawCodec};
//!
//! let mut codecs = CodecTable::new();
//! codecs.register("/camera/raw", RawCodec::new("sensor.RawImage"));
//! assert_eq!(codecs.message_type("/camera/raw"), Some("sensor.RawImage"));
//! ```

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::core::{RecordError, Result};

/// Encode/decode routines for one channel's message type.
pub trait MessageCodec<M>: Send + Sync {
    /// Schema type name recorded in the channel declaration
    /// (e.g. `apollo.perception.PerceptionObstacles`).
    fn message_type(&self) -> &str;

    /// Optional schema descriptor bytes recorded with the channel.
    fn proto_desc(&self) -> Option<&[u8]> {
        None
    }

    /// Serialize a message into the opaque payload.
    fn encode(&self, message: &M) -> Result<Vec<u8>>;

    /// Deserialize an opaque payload.
    fn decode(&self, data: &[u8]) -> Result<M>;

    /// Derive a timestamp (nanoseconds) from message content.
    ///
    /// Consulted only when the input entry carries no explicit time.
    fn timestamp(&self, _message: &M) -> Option<u64> {
        None
    }
}

/// Channel name → codec mapping.
pub struct CodecTable<M> {
    codecs: HashMap<String, Box<dyn MessageCodec<M>>>,
}

impl<M> Default for CodecTable<M> {
    fn default() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }
}

impl<M> CodecTable<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the codec for a channel.
    pub fn register<C>(&mut self, channel: impl Into<String>, codec: C) -> &mut Self
    where
        C: MessageCodec<M> + 'static,
    {
        self.codecs.insert(channel.into(), Box::new(codec));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<C>(mut self, channel: impl Into<String>, codec: C) -> Self
    where
        C: MessageCodec<M> + 'static,
    {
        self.register(channel, codec);
        self
    }

    pub fn get(&self, channel: &str) -> Option<&dyn MessageCodec<M>> {
        self.codecs.get(channel).map(|c| c.as_ref())
    }

    /// Codec for a channel, or a schema error naming it.
    pub fn require(&self, channel: &str) -> Result<&dyn MessageCodec<M>> {
        self.get(channel)
            .ok_or_else(|| RecordError::schema(channel, "no codec registered for channel"))
    }

    pub fn message_type(&self, channel: &str) -> Option<&str> {
        self.get(channel).map(|c| c.message_type())
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.codecs.contains_key(channel)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

/// Identity codec over raw bytes.
#[derive(Debug, Clone)]
pub struct RawCodec {
    message_type: String,
}

impl RawCodec {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
        }
    }
}

impl MessageCodec<Vec<u8>> for RawCodec {
    fn message_type(&self) -> &str {
        &self.message_type
    }

    fn encode(&self, message: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(message.clone())
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

type TimestampFn<T> = Box<dyn Fn(&T) -> Option<u64> + Send + Sync>;

/// Codec for prost-generated protobuf messages.
///
/// ```
/// use cyberrec::encoding::{MessageCodec, ProstCodec};
/// use cyberrec::io::formats::record::ChunkHeader;
///
/// let codec = ProstCodec::<ChunkHeader>::new("cyber.proto.ChunkHeader")
///     .with_timestamp(|h| Some(h.begin_time));
/// let bytes = codec.encode(&ChunkHeader { begin_time: 7, ..Default::default() }).unwrap();
/// let decoded = codec.decode(&bytes).unwrap();
/// assert_eq!(codec.timestamp(&decoded), Some(7));
/// ```
pub struct ProstCodec<T> {
    message_type: String,
    proto_desc: Option<Vec<u8>>,
    timestamp: Option<TimestampFn<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ProstCodec<T>
where
    T: prost::Message + Default,
{
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            proto_desc: None,
            timestamp: None,
            _marker: PhantomData,
        }
    }

    /// Attach serialized descriptor bytes to the channel declaration.
    pub fn with_proto_desc(mut self, desc: Vec<u8>) -> Self {
        self.proto_desc = Some(desc);
        self
    }

    /// Derive timestamps from message content.
    pub fn with_timestamp<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Option<u64> + Send + Sync + 'static,
    {
        self.timestamp = Some(Box::new(f));
        self
    }
}

impl<T> MessageCodec<T> for ProstCodec<T>
where
    T: prost::Message + Default,
{
    fn message_type(&self) -> &str {
        &self.message_type
    }

    fn proto_desc(&self) -> Option<&[u8]> {
        self.proto_desc.as_deref()
    }

    fn encode(&self, message: &T) -> Result<Vec<u8>> {
        Ok(message.encode_to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<T> {
        T::decode(data).map_err(|e| RecordError::schema(&self.message_type, e.to_string()))
    }

    fn timestamp(&self, message: &T) -> Option<u64> {
        self.timestamp.as_ref().and_then(|f| f(message))
    }
}

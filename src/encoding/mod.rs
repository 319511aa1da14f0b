// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message codecs and timestamp resolution.
//!
//! Payload schemas are external to the container: callers register a
//! [`MessageCodec`] per channel in a [`CodecTable`].

pub mod codec;
pub mod timestamp;

pub use codec::{CodecTable, MessageCodec, ProstCodec, RawCodec};
pub use timestamp::{resolve_timestamp, seconds_to_nanos};

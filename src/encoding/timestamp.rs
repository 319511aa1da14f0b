// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message timestamp resolution.
//!
//! A message's record time is resolved in this order:
//!
//! 1. An explicit time carried with the input entry (the key of a keyed
//!    sink, or [`TimedMessage::time`](crate::io::sink::TimedMessage) when set).
//!    Messages read back by the parser always carry one.
//! 2. The channel codec's [`MessageCodec::timestamp`] derived from content.
//!    Codecs whose messages store float seconds convert with
//!    [`seconds_to_nanos`].
//! 3. Otherwise the message is rejected with a schema error.

use super::codec::MessageCodec;
use crate::core::{RecordError, Result};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Convert float seconds to integer nanoseconds.
///
/// Negative and non-finite inputs yield `None`.
pub fn seconds_to_nanos(seconds: f64) -> Option<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let nanos = (seconds * NANOS_PER_SEC).round();
    if nanos > u64::MAX as f64 {
        return None;
    }
    Some(nanos as u64)
}

/// Resolve the record time of one message.
pub fn resolve_timestamp<M>(
    channel: &str,
    explicit: Option<u64>,
    message: &M,
    codec: &dyn MessageCodec<M>,
) -> Result<u64> {
    if let Some(time) = explicit {
        return Ok(time);
    }
    codec.timestamp(message).ok_or_else(|| {
        RecordError::schema(
            channel,
            "message has no explicit time and the codec derives none",
        )
    })
}

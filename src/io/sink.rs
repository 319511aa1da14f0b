// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-channel message collections.
//!
//! A [`MessageSink`] is both the writer's input (what to record on a
//! channel) and the parser's output (what was read back). The caller picks
//! the shape explicitly:
//!
//! - [`MessageSink::Ordered`] keeps every message in arrival order.
//! - [`MessageSink::Keyed`] keeps one message per timestamp; the first
//!   message stored for a time wins and later ones are dropped. Useful for
//!   aligning channels by time.

use std::collections::BTreeMap;

/// A message with its record time, if known.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedMessage<M> {
    /// Record time in nanoseconds. `None` defers to the codec on write.
    pub time: Option<u64>,
    pub message: M,
}

impl<M> TimedMessage<M> {
    /// Message with an explicit time.
    pub fn at(time: u64, message: M) -> Self {
        Self {
            time: Some(time),
            message,
        }
    }

    /// Message whose time the codec derives.
    pub fn untimed(message: M) -> Self {
        Self {
            time: None,
            message,
        }
    }
}

/// Shape of a [`MessageSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Ordered,
    Keyed,
}

/// Message collection for one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageSink<M> {
    /// Arrival order, duplicates kept
    Ordered(Vec<TimedMessage<M>>),
    /// One message per timestamp, first write wins
    Keyed(BTreeMap<u64, M>),
}

/// Channel name → sink. Ordered by name so channel declaration order is
/// deterministic.
pub type SinkMap<M> = BTreeMap<String, MessageSink<M>>;

impl<M> MessageSink<M> {
    pub fn ordered() -> Self {
        MessageSink::Ordered(Vec::new())
    }

    pub fn keyed() -> Self {
        MessageSink::Keyed(BTreeMap::new())
    }

    /// Empty sink of the given shape.
    pub fn of_kind(kind: SinkKind) -> Self {
        match kind {
            SinkKind::Ordered => Self::ordered(),
            SinkKind::Keyed => Self::keyed(),
        }
    }

    pub fn kind(&self) -> SinkKind {
        match self {
            MessageSink::Ordered(_) => SinkKind::Ordered,
            MessageSink::Keyed(_) => SinkKind::Keyed,
        }
    }

    /// Store a decoded message. Returns `false` if a keyed sink already
    /// held a message for `time`.
    pub fn store(&mut self, time: u64, message: M) -> bool {
        match self {
            MessageSink::Ordered(messages) => {
                messages.push(TimedMessage::at(time, message));
                true
            }
            MessageSink::Keyed(messages) => {
                if messages.contains_key(&time) {
                    return false;
                }
                messages.insert(time, message);
                true
            }
        }
    }

    /// Append a message whose time may be derived later by a codec.
    ///
    /// Keyed sinks need a key, so untimed messages are only accepted by
    /// ordered sinks; returns `false` when rejected.
    pub fn push(&mut self, entry: TimedMessage<M>) -> bool {
        if let MessageSink::Ordered(messages) = self {
            messages.push(entry);
            return true;
        }
        match entry.time {
            Some(time) => self.store(time, entry.message),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MessageSink::Ordered(messages) => messages.len(),
            MessageSink::Keyed(messages) => messages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(explicit time, message)` pairs in sink order.
    pub fn entries(&self) -> Box<dyn Iterator<Item = (Option<u64>, &M)> + '_> {
        match self {
            MessageSink::Ordered(messages) => {
                Box::new(messages.iter().map(|entry| (entry.time, &entry.message)))
            }
            MessageSink::Keyed(messages) => {
                Box::new(messages.iter().map(|(time, message)| (Some(*time), message)))
            }
        }
    }

    /// Messages in sink order, times dropped.
    pub fn into_messages(self) -> Vec<M> {
        match self {
            MessageSink::Ordered(messages) => messages.into_iter().map(|e| e.message).collect(),
            MessageSink::Keyed(messages) => messages.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_first_write_wins() {
        let mut sink = MessageSink::keyed();
        assert!(sink.store(5, "first"));
        assert!(!sink.store(5, "second"));
        assert!(sink.store(6, "third"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.kind(), SinkKind::Keyed);
        assert_eq!(sink.into_messages(), vec!["first", "third"]);
    }

    #[test]
    fn test_ordered_keeps_duplicates() {
        let mut sink = MessageSink::ordered();
        sink.store(5, 1);
        sink.store(5, 2);
        sink.store(1, 3);
        let entries: Vec<_> = sink.entries().map(|(t, m)| (t, *m)).collect();
        assert_eq!(entries, vec![(Some(5), 1), (Some(5), 2), (Some(1), 3)]);
    }

    #[test]
    fn test_push_untimed() {
        let mut ordered = MessageSink::of_kind(SinkKind::Ordered);
        assert!(ordered.push(TimedMessage::untimed('a')));
        assert_eq!(ordered.entries().next(), Some((None, &'a')));

        let mut keyed = MessageSink::of_kind(SinkKind::Keyed);
        assert!(!keyed.push(TimedMessage::untimed('a')));
        assert!(keyed.push(TimedMessage::at(3, 'b')));
        assert!(!keyed.is_empty());
    }
}

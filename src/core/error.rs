// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for cyberrec.
//!
//! Every layer (section codec, file writer/parser, segmented writer)
//! returns [`RecordError`] so failures surface to the caller unchanged:
//! - Opening or creating files
//! - Section framing and record decoding
//! - Caller-supplied message codecs
//! - Random access on incomplete files

use std::fmt;

/// Errors that can occur while writing or parsing record files.
#[derive(Debug, Clone)]
pub enum RecordError {
    /// File could not be created or opened
    OpenError {
        /// Path that failed to open
        path: String,
        /// Underlying error message
        message: String,
    },

    /// Short read, malformed frame, or unexpected section type
    FramingError {
        /// What was being read or written
        context: String,
        /// Error message
        message: String,
    },

    /// Payload rejected by the injected codec
    SchemaError {
        /// Channel the payload belongs to
        channel: String,
        /// Error message
        message: String,
    },

    /// Random access attempted on a file whose header is not complete
    IncompleteFile {
        /// Path of the incomplete file
        path: String,
    },

    /// Invalid configuration
    Config {
        /// Error message
        message: String,
    },

    /// I/O error outside of framing (writes, seeks, flushes)
    Io {
        /// Operation that failed
        context: String,
        /// Error message
        message: String,
    },
}

impl RecordError {
    /// Create an open error.
    pub fn open(path: impl Into<String>, message: impl Into<String>) -> Self {
        RecordError::OpenError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a framing error.
    pub fn framing(context: impl Into<String>, message: impl Into<String>) -> Self {
        RecordError::FramingError {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a schema error for a channel.
    pub fn schema(channel: impl Into<String>, message: impl Into<String>) -> Self {
        RecordError::SchemaError {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create an incomplete file error.
    pub fn incomplete(path: impl Into<String>) -> Self {
        RecordError::IncompleteFile { path: path.into() }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        RecordError::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        RecordError::Io {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error came from a short read or malformed frame.
    pub fn is_framing(&self) -> bool {
        matches!(self, RecordError::FramingError { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            RecordError::OpenError { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            RecordError::FramingError { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            RecordError::SchemaError { channel, message } => {
                vec![("channel", channel.clone()), ("message", message.clone())]
            }
            RecordError::IncompleteFile { path } => vec![("path", path.clone())],
            RecordError::Config { message } => vec![("message", message.clone())],
            RecordError::Io { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::OpenError { path, message } => {
                write!(f, "Failed to open '{path}': {message}")
            }
            RecordError::FramingError { context, message } => {
                write!(f, "Framing error in {context}: {message}")
            }
            RecordError::SchemaError { channel, message } => {
                write!(f, "Schema error on channel '{channel}': {message}")
            }
            RecordError::IncompleteFile { path } => {
                write!(f, "Record file '{path}' is not complete")
            }
            RecordError::Config { message } => write!(f, "Invalid configuration: {message}"),
            RecordError::Io { context, message } => write!(f, "I/O error in {context}: {message}"),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<std::io::Error> for RecordError {
    fn from(err: std::io::Error) -> Self {
        RecordError::Io {
            context: "IO".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<prost::DecodeError> for RecordError {
    fn from(err: prost::DecodeError) -> Self {
        RecordError::FramingError {
            context: "protobuf".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for cyberrec operations.
pub type Result<T> = std::result::Result<T, RecordError>;

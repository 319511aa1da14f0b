// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout cyberrec.
//!
//! - [`RecordError`] - Error taxonomy shared by every layer
//! - [`RecordConfig`] - Chunk and segment split thresholds

pub mod config;
pub mod error;

pub use config::RecordConfig;
pub use error::{RecordError, Result};

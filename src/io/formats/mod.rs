// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! File format implementations.
//!
//! - [`record`]: Cyber record container format

pub mod record;

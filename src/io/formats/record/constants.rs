// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record format constants.
//!
//! Single source of truth for frame widths and version numbers shared by
//! the writer and the parser.

/// Width of a section frame: type (4) + reserved (4) + length (8).
pub const SECTION_LENGTH: u64 = 16;

/// Fixed payload width of the header section. The real header payload is
/// zero-padded up to this size so the header can be rewritten in place.
pub const HEADER_LENGTH: u64 = 2048;

/// Offset of the first section after the header region.
pub const HEADER_REGION_END: u64 = SECTION_LENGTH + HEADER_LENGTH;

/// Format major version.
pub const MAJOR_VERSION: u32 = 1;

/// Format minor version.
pub const MINOR_VERSION: u32 = 0;

/// Largest segment suffix before the counter wraps back to 0.
pub const MAX_SEGMENT_INDEX: u32 = 99_999;

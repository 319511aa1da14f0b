// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Section framing.
//!
//! Every block in a record file is a section:
//!
//! ```text
//! [type: i32 LE][reserved: 4 bytes][length: i64 LE][payload: length bytes]
//! ```
//!
//! The header section is special: it always starts at offset 0 and its
//! payload is zero-padded to [`HEADER_LENGTH`] bytes, so the whole header
//! region is [`HEADER_REGION_END`] bytes wide no matter what the header
//! contains. That is what allows the writer to overwrite it at close
//! without moving any later section.

use std::io::{Cursor, ErrorKind, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use prost::Message;

use super::constants::{HEADER_LENGTH, HEADER_REGION_END, SECTION_LENGTH};
use super::proto::{Channel, ChunkBody, ChunkHeader, Header, Index, SectionType};
use crate::core::{RecordError, Result};

/// Decoded section frame: type and payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionFrame {
    /// Section type code
    pub section_type: SectionType,
    /// Payload length in bytes (padding excluded)
    pub length: u64,
}

impl SectionFrame {
    /// Create a frame.
    pub fn new(section_type: SectionType, length: u64) -> Self {
        Self {
            section_type,
            length,
        }
    }

    /// Encode the 16-byte frame.
    pub fn to_bytes(&self) -> [u8; SECTION_LENGTH as usize] {
        let mut raw = [0u8; SECTION_LENGTH as usize];
        raw[0..4].copy_from_slice(&(self.section_type as i32).to_le_bytes());
        raw[8..16].copy_from_slice(&(self.length as i64).to_le_bytes());
        raw
    }

    /// Decode a 16-byte frame.
    pub fn from_bytes(raw: &[u8; SECTION_LENGTH as usize]) -> Result<Self> {
        let mut cursor = Cursor::new(&raw[..]);
        let code = cursor
            .read_i32::<LittleEndian>()
            .map_err(|e| RecordError::framing("SectionFrame", e.to_string()))?;
        cursor.set_position(8);
        let length = cursor
            .read_i64::<LittleEndian>()
            .map_err(|e| RecordError::framing("SectionFrame", e.to_string()))?;

        let section_type = SectionType::try_from(code).map_err(|_| {
            RecordError::framing("SectionFrame", format!("unknown section type {code}"))
        })?;
        if length < 0 {
            return Err(RecordError::framing(
                "SectionFrame",
                format!("negative section length {length}"),
            ));
        }

        Ok(Self {
            section_type,
            length: length as u64,
        })
    }

    /// Bytes this section occupies on disk, frame included.
    pub fn total_len(&self) -> u64 {
        match self.section_type {
            SectionType::SectionHeader => HEADER_REGION_END,
            _ => SECTION_LENGTH + self.length,
        }
    }
}

/// A decoded section payload.
///
/// Dispatch is on the wire type code, never on the payload's Rust type.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Header(Header),
    ChunkHeader(ChunkHeader),
    ChunkBody(ChunkBody),
    Index(Index),
    Channel(Channel),
}

impl Section {
    /// Wire type code for this section.
    pub fn section_type(&self) -> SectionType {
        match self {
            Section::Header(_) => SectionType::SectionHeader,
            Section::ChunkHeader(_) => SectionType::SectionChunkHeader,
            Section::ChunkBody(_) => SectionType::SectionChunkBody,
            Section::Index(_) => SectionType::SectionIndex,
            Section::Channel(_) => SectionType::SectionChannel,
        }
    }

    /// Serialize the payload without framing.
    pub fn encode_payload(&self) -> Vec<u8> {
        match self {
            Section::Header(m) => m.encode_to_vec(),
            Section::ChunkHeader(m) => m.encode_to_vec(),
            Section::ChunkBody(m) => m.encode_to_vec(),
            Section::Index(m) => m.encode_to_vec(),
            Section::Channel(m) => m.encode_to_vec(),
        }
    }

    /// Decode a payload of the given section type.
    ///
    /// Byte fields of the decoded messages share `payload`'s buffer.
    pub fn decode(section_type: SectionType, payload: Bytes) -> Result<Self> {
        let section = match section_type {
            SectionType::SectionHeader => Section::Header(Header::decode(payload)?),
            SectionType::SectionChunkHeader => Section::ChunkHeader(ChunkHeader::decode(payload)?),
            SectionType::SectionChunkBody => Section::ChunkBody(ChunkBody::decode(payload)?),
            SectionType::SectionIndex => Section::Index(Index::decode(payload)?),
            SectionType::SectionChannel => Section::Channel(Channel::decode(payload)?),
        };
        Ok(section)
    }
}

/// Frame a payload.
///
/// Header payloads are padded to [`HEADER_LENGTH`]; a header payload larger
/// than that cannot be rewritten in place and is rejected.
pub fn encode_section(section_type: SectionType, payload: &[u8]) -> Result<Vec<u8>> {
    let is_header = section_type == SectionType::SectionHeader;
    if is_header && payload.len() as u64 > HEADER_LENGTH {
        return Err(RecordError::framing(
            "encode_section",
            format!(
                "header payload is {} bytes, exceeds fixed width {HEADER_LENGTH}",
                payload.len()
            ),
        ));
    }

    let frame = SectionFrame::new(section_type, payload.len() as u64);
    let mut buffer = Vec::with_capacity(frame.total_len() as usize);
    buffer.extend_from_slice(&frame.to_bytes());
    buffer.extend_from_slice(payload);
    if is_header {
        buffer.resize(HEADER_REGION_END as usize, 0);
    }
    Ok(buffer)
}

/// Read the next frame.
///
/// Returns `Ok(None)` on a clean end of file (no bytes left at a section
/// boundary) and a framing error when the frame itself is cut short.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<SectionFrame>> {
    let mut raw = [0u8; SECTION_LENGTH as usize];
    let filled = read_up_to(reader, &mut raw).map_err(|e| RecordError::io("read_frame", e))?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < raw.len() {
        return Err(RecordError::framing(
            "read_frame",
            format!("short read: {filled} of {SECTION_LENGTH} frame bytes"),
        ));
    }
    SectionFrame::from_bytes(&raw).map(Some)
}

/// Read exactly `length` payload bytes.
pub fn read_payload<R: Read>(reader: &mut R, length: u64) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    reader
        .take(length)
        .read_to_end(&mut payload)
        .map_err(|e| RecordError::io("read_payload", e))?;
    if (payload.len() as u64) < length {
        return Err(RecordError::framing(
            "read_payload",
            format!("short read: {} of {length} payload bytes", payload.len()),
        ));
    }
    Ok(payload)
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 10-byte ID3v2 tag header.

use audiotag_core::config::Id3v2Version;
use audiotag_core::errors::{AudioTagError, Id3v2Error, Result};
use audiotag_core::io::{ByteReader, ByteWriter};

pub fn major_version(version: Id3v2Version) -> u8 {
    match version {
        Id3v2Version::V3 => 3,
        Id3v2Version::V4 => 4,
    }
}

/// v2.4 syncsafe-encodes the frame size; v2.3 uses a plain big-endian `u32`.
pub fn frame_size_is_syncsafe(version: Id3v2Version) -> bool {
    matches!(version, Id3v2Version::V4)
}

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub version: Id3v2Version,
    pub unsynchronisation: bool,
    pub has_extended_header: bool,
    pub experimental: bool,
    pub has_footer: bool,
    /// Size of the tag body (frames + padding), excluding the 10-byte header.
    pub tag_size: u32,
}

impl Header {
    pub const SIZE: usize = 10;

    /// Parses the header from the first 10 bytes of a file. Returns `Ok(None)` when the buffer is
    /// too short or does not begin with the `ID3` marker (tag absent, not an error for strip).
    pub fn parse(buf: &[u8]) -> Result<Option<Header>> {
        if buf.len() < Header::SIZE || &buf[0..3] != b"ID3" {
            return Ok(None);
        }

        let mut reader = ByteReader::new(&buf[0..Header::SIZE]);
        reader.skip(3)?;
        let major = reader.read_u8()?;
        let _revision = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let tag_size = reader.read_syncsafe_u32()?;

        let version = match major {
            3 => Id3v2Version::V3,
            4 => Id3v2Version::V4,
            other => {
                return Err(AudioTagError::Id3v2(Id3v2Error::UnsupportedVersion { major: other, minor: 0 }))
            }
        };

        Ok(Some(Header {
            version,
            unsynchronisation: flags & 0x80 != 0,
            has_extended_header: flags & 0x40 != 0,
            experimental: flags & 0x20 != 0,
            has_footer: version == Id3v2Version::V4 && flags & 0x10 != 0,
            tag_size,
        }))
    }

    pub fn total_size(&self) -> u64 {
        Header::SIZE as u64 + self.tag_size as u64
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_bytes(b"ID3");
        writer.write_u8(major_version(self.version));
        writer.write_u8(0);

        let mut flags = 0u8;
        if self.unsynchronisation {
            flags |= 0x80;
        }
        writer.write_u8(flags);
        writer.write_syncsafe_u32(self.tag_size);
    }
}

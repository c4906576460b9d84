// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text encodings shared by the byte reader and byte writer.
//!
//! ID3v2 frames carry a single leading encoding byte that selects both the character set and the
//! width of the terminator that follows description/value strings. The four values below are the
//! full closed set; anything else is an `invalid-encoding` error at the call site.

use crate::errors::{AudioTagError, Id3v2Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Latin1,
    Utf16Bom,
    Utf16Be,
    Utf8,
}

impl TextEncoding {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(TextEncoding::Latin1),
            1 => Ok(TextEncoding::Utf16Bom),
            2 => Ok(TextEncoding::Utf16Be),
            3 => Ok(TextEncoding::Utf8),
            other => Err(AudioTagError::Id3v2(Id3v2Error::InvalidEncoding(other))),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            TextEncoding::Latin1 => 0,
            TextEncoding::Utf16Bom => 1,
            TextEncoding::Utf16Be => 2,
            TextEncoding::Utf8 => 3,
        }
    }

    /// Width, in bytes, of this encoding's null terminator.
    pub fn null_width(self) -> usize {
        match self {
            TextEncoding::Latin1 | TextEncoding::Utf8 => 1,
            TextEncoding::Utf16Bom | TextEncoding::Utf16Be => 2,
        }
    }
}

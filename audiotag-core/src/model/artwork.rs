// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Artwork`]: an immutable image payload with an auto-detected format tag.

use crate::errors::{AudioTagError, ModelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkFormat {
    Jpeg,
    Png,
}

impl ArtworkFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ArtworkFormat::Jpeg => "image/jpeg",
            ArtworkFormat::Png => "image/png",
        }
    }

    fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ArtworkFormat::Jpeg)
        } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(ArtworkFormat::Png)
        } else {
            None
        }
    }
}

/// An immutable pair of raw image bytes and an auto-detected format.
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    bytes: Vec<u8>,
    format: ArtworkFormat,
}

impl Artwork {
    /// Detects the format from magic bytes; fails if neither JPEG nor PNG is recognized.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = ArtworkFormat::detect(&bytes)
            .ok_or(AudioTagError::Model(ModelError::ArtworkUnrecognizedFormat))?;
        Ok(Artwork { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ArtworkFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_jpeg() {
        let art = Artwork::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();
        assert_eq!(art.format(), ArtworkFormat::Jpeg);
    }

    #[test]
    fn detects_png() {
        let art = Artwork::from_bytes(vec![0x89, 0x50, 0x4E, 0x47, 0x0D]).unwrap();
        assert_eq!(art.format(), ArtworkFormat::Png);
    }

    #[test]
    fn rejects_unrecognized_bytes() {
        assert!(Artwork::from_bytes(vec![0x00, 0x01, 0x02]).is_err());
    }
}

// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Container auto-detection: leading-byte magic first, file-extension heuristics as a fallback.

use std::path::Path;

use audiotag_core::errors::{AudioTagError, EngineError, Result};
use audiotag_core::io::FileReader;

/// The two container families this library understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    M4a,
}

/// Identifies `path`'s container by inspecting its first bytes, falling back to its extension.
pub fn detect_format(path: &Path) -> Result<AudioFormat> {
    let mut reader = FileReader::open(path)?;
    let probe_len = 8.min(reader.size());
    let probe = reader.read(0, probe_len)?;

    if probe.starts_with(b"ID3") {
        return Ok(AudioFormat::Mp3);
    }
    if probe.len() == 8 && &probe[4..8] == b"ftyp" {
        return Ok(AudioFormat::M4a);
    }

    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("mp3") => Ok(AudioFormat::Mp3),
        Some("m4a" | "m4b" | "aax") => Ok(AudioFormat::M4a),
        _ => Err(AudioTagError::Engine(EngineError::UnsupportedFormat(format!(
            "could not identify container for {}",
            path.display()
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn detects_mp3_by_id3_marker() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"ID3\x04\x00\x00\x00\x00\x00\x00").unwrap();
        f.flush().unwrap();
        assert_eq!(detect_format(f.path()).unwrap(), AudioFormat::Mp3);
    }

    #[test]
    fn detects_m4a_by_ftyp_marker() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"\x00\x00\x00\x18ftypM4A \x00\x00\x00\x00").unwrap();
        f.flush().unwrap();
        assert_eq!(detect_format(f.path()).unwrap(), AudioFormat::M4a);
    }

    #[test]
    fn falls_back_to_extension_when_magic_is_inconclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        std::fs::write(&path, b"not really id3 but named .mp3").unwrap();
        assert_eq!(detect_format(&path).unwrap(), AudioFormat::Mp3);
    }

    #[test]
    fn unrecognized_file_is_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.bin");
        std::fs::write(&path, b"whatever").unwrap();
        assert!(detect_format(&path).is_err());
    }
}

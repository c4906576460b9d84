// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tag assembly and the in-place / atomic-rewrite write strategy.

use std::path::Path;

use log::{debug, trace, warn};

use audiotag_core::errors::{AudioTagError, Id3v2Error, Result};
use audiotag_core::io::{ByteWriter, FileReader, FileWriter, DEFAULT_BUFFER_SIZE};
use audiotag_core::model::AudioFileInfo;

use crate::convert::{frames_to_info, info_to_frames};
use crate::frame::{parse_frame_list, write_frame, Frame};
use audiotag_core::config::Id3v2Version;
use crate::header::Header;

/// Frame identifiers that form a chapter group: a `CTOC` plus every `CHAP` it can reference.
const CHAPTER_FRAME_IDS: &[&str] = &["CTOC", "CHAP"];

fn is_chapter_frame(frame: &Frame) -> bool {
    CHAPTER_FRAME_IDS.contains(&frame.id())
}

/// Builds the raw tag bytes (header + frames + `padding` zero bytes).
fn build_tag_bytes(frames: &[Frame], version: Id3v2Version, padding: usize) -> Vec<u8> {
    let mut frame_bytes = ByteWriter::new();
    for frame in frames {
        write_frame(&mut frame_bytes, frame, version);
    }

    let header = Header {
        version,
        unsynchronisation: false,
        has_extended_header: false,
        experimental: false,
        has_footer: false,
        tag_size: (frame_bytes.len() + padding) as u32,
    };

    let mut out = ByteWriter::new();
    header.write(&mut out);
    out.write_bytes(frame_bytes.as_slice());
    out.write_fill(0, padding);
    out.into_bytes()
}

/// Reads the existing tag, if any, returning its header and parsed frame list. Never errors when
/// no tag is present (`read`-vs-`strip` asymmetry lives in the caller).
fn read_existing(path: &Path) -> Result<Option<(Header, Vec<Frame>)>> {
    let mut reader = FileReader::open(path)?;
    let probe_len = Header::SIZE.min(reader.size() as usize);
    let probe = reader.read(0, probe_len as u64)?;

    let header = match Header::parse(&probe)? {
        Some(h) => h,
        None => return Ok(None),
    };

    let body = reader.read(Header::SIZE as u64, header.tag_size as u64)?;
    let frames = parse_frame_list(&body, header.version)?;
    Ok(Some((header, frames)))
}

/// Reads an ID3v2 tag, failing with `NoTag` if the file has no recognisable header.
pub fn read(path: &Path) -> Result<AudioFileInfo> {
    match read_existing(path)? {
        Some((_, frames)) => Ok(frames_to_info(&frames)),
        None => Err(AudioTagError::Id3v2(Id3v2Error::NoTag)),
    }
}

/// Writes a fresh tag built only from `info`, choosing in-place patch or atomic rewrite.
pub fn write(info: &AudioFileInfo, path: &Path, version: Id3v2Version, default_padding: usize, buffer_size: usize) -> Result<()> {
    let frames = info_to_frames(info, version);
    write_frames(&frames, path, version, default_padding, buffer_size)
}

/// Modifies the tag in place, preserving every unknown frame from the existing tag.
pub fn modify(info: &AudioFileInfo, path: &Path, version: Id3v2Version, default_padding: usize, buffer_size: usize) -> Result<()> {
    let mut frames = info_to_frames(info, version);

    if let Some((_, existing_frames)) = read_existing(path)? {
        let known_ids: std::collections::HashSet<&str> = frames.iter().map(|f| f.id()).collect();
        for existing in existing_frames {
            if let Frame::Unknown { id, .. } = &existing {
                if !known_ids.contains(id.as_str()) {
                    debug!("id3v2: preserving unknown frame '{id}' on modify");
                    frames.push(existing);
                }
            }
        }
        write_frames(&frames, path, version, default_padding, buffer_size)
    } else {
        debug!("id3v2: no existing tag found, modify degrades to write");
        write_frames(&frames, path, version, default_padding, buffer_size)
    }
}

/// Removes the tag, preserving a minimal chapters-only tag if the existing tag had chapters.
pub fn strip(path: &Path, version: Id3v2Version, buffer_size: usize) -> Result<()> {
    let existing = read_existing(path)?;

    let chapter_frames: Vec<Frame> = match &existing {
        Some((_, frames)) => frames.iter().filter(|f| is_chapter_frame(f)).cloned().collect(),
        None => Vec::new(),
    };

    if !chapter_frames.is_empty() {
        warn!("id3v2: strip preserves {} chapter frame(s) rather than deleting them", chapter_frames.len());
        write_frames(&chapter_frames, path, version, 0, buffer_size)
    } else {
        remove_tag_entirely(path, buffer_size)
    }
}

/// Rewrites the file with no ID3v2 header at all. Unlike `write_frames`, this never takes the
/// in-place branch: an empty frame list still builds a 10-byte header, which `write_frames` would
/// happily patch in place instead of dropping the tag region.
fn remove_tag_entirely(path: &Path, buffer_size: usize) -> Result<()> {
    let existing_header = {
        let mut reader = FileReader::open(path)?;
        let probe_len = Header::SIZE.min(reader.size() as usize);
        let probe = reader.read(0, probe_len as u64)?;
        Header::parse(&probe)?
    };
    let existing_space = existing_header.map(|h| h.total_size()).unwrap_or(0);
    if existing_space == 0 {
        return Ok(());
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let sidecar = tempfile::Builder::new()
        .prefix(".audiotag-")
        .tempfile_in(dir)
        .map_err(AudioTagError::from)?;
    let sidecar_path = sidecar.path().to_path_buf();

    let result = (|| -> Result<()> {
        let mut sidecar_writer = FileWriter::create(&sidecar_path)?;
        let mut source_reader = FileReader::open(path)?;
        let audio_len = source_reader.size() - existing_space;
        sidecar_writer.copy_chunked(&mut source_reader, existing_space, audio_len, buffer_size)?;
        sidecar_writer.synchronize()
    })();

    match result {
        Ok(()) => {
            sidecar
                .persist(path)
                .map_err(|e| AudioTagError::from(e.error))?;
            Ok(())
        }
        Err(e) => {
            drop(sidecar);
            Err(e)
        }
    }
}

/// Shared write path for `write`/`modify`/`strip`: decides in-place vs. atomic rewrite and
/// performs it.
fn write_frames(frames: &[Frame], path: &Path, version: Id3v2Version, default_padding: usize, buffer_size: usize) -> Result<()> {
    let existing_header = {
        let mut reader = FileReader::open(path)?;
        let probe_len = Header::SIZE.min(reader.size() as usize);
        let probe = reader.read(0, probe_len as u64)?;
        Header::parse(&probe)?
    };

    let existing_space = existing_header.map(|h| h.total_size()).unwrap_or(0);
    let min_tag_bytes = build_tag_bytes(frames, version, 0);
    let min_tag_size = min_tag_bytes.len() as u64;

    if existing_space >= min_tag_size {
        let padding = (existing_space - min_tag_size) as usize;
        trace!("id3v2: writing in place (existing {existing_space} bytes >= minimum {min_tag_size} bytes)");
        let tag_bytes = build_tag_bytes(frames, version, padding);
        let mut writer = FileWriter::create(path)?;
        writer.write(&tag_bytes, 0)?;
        writer.synchronize()?;
        Ok(())
    } else {
        trace!("id3v2: existing tag region too small, rewriting via sidecar");
        rewrite_via_sidecar(frames, path, version, default_padding, existing_space, buffer_size)
    }
}

fn rewrite_via_sidecar(
    frames: &[Frame],
    path: &Path,
    version: Id3v2Version,
    default_padding: usize,
    existing_space: u64,
    buffer_size: usize,
) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let sidecar = tempfile::Builder::new()
        .prefix(".audiotag-")
        .tempfile_in(dir)
        .map_err(AudioTagError::from)?;
    let sidecar_path = sidecar.path().to_path_buf();

    let result = (|| -> Result<()> {
        let tag_bytes = build_tag_bytes(frames, version, default_padding);
        let mut sidecar_writer = FileWriter::create(&sidecar_path)?;
        sidecar_writer.append(&tag_bytes)?;

        let mut source_reader = FileReader::open(path)?;
        let audio_len = source_reader.size() - existing_space;
        sidecar_writer.copy_chunked(&mut source_reader, existing_space, audio_len, buffer_size)?;
        sidecar_writer.synchronize()
    })();

    match result {
        Ok(()) => {
            sidecar
                .persist(path)
                .map_err(|e| AudioTagError::from(e.error))?;
            Ok(())
        }
        Err(e) => {
            drop(sidecar);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn synthetic_mp3(tag: &[u8], audio: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(tag).unwrap();
        f.write_all(audio).unwrap();
        f.flush().unwrap();
        f
    }

    fn minimal_tag(frames: &[Frame], version: Id3v2Version, padding: usize) -> Vec<u8> {
        build_tag_bytes(frames, version, padding)
    }

    #[test]
    fn read_fails_with_no_tag_when_absent() {
        let tmp = synthetic_mp3(b"", b"fake-audio-bytes");
        assert!(read(tmp.path()).is_err());
    }

    #[test]
    fn round_trips_title_through_write_and_read() {
        let tmp = synthetic_mp3(b"", b"audio-payload");
        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("Test Title".to_string());
        write(&info, tmp.path(), Id3v2Version::V4, 2048, DEFAULT_BUFFER_SIZE).unwrap();

        let read_back = read(tmp.path()).unwrap();
        assert_eq!(read_back.metadata.title.as_deref(), Some("Test Title"));
    }

    #[test]
    fn in_place_write_preserves_existing_padding_size() {
        let frames = vec![Frame::Text { id: "TIT2".to_string(), value: "A".to_string() }];
        let tag = minimal_tag(&frames, Id3v2Version::V4, 2048);
        let existing_space = tag.len() as u64;

        let tmp = synthetic_mp3(&tag, b"audio-payload");
        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("A".to_string());
        write(&info, tmp.path(), Id3v2Version::V4, 2048, DEFAULT_BUFFER_SIZE).unwrap();

        let size_after = std::fs::metadata(tmp.path()).unwrap().len();
        let audio_len = b"audio-payload".len() as u64;
        assert_eq!(size_after, existing_space + audio_len);
    }

    #[test]
    fn strip_preserves_chapter_frames_only() {
        let chapter = Frame::Chapter {
            element_id: "chp0".to_string(),
            start_ms: 0,
            end_ms: 1000,
            sub_frames: vec![Frame::Text { id: "TIT2".to_string(), value: "Intro".to_string() }],
        };
        let toc = Frame::TableOfContents {
            element_id: "toc1".to_string(),
            ordered: true,
            top_level: true,
            children: vec!["chp0".to_string()],
            sub_frames: Vec::new(),
        };
        let title = Frame::Text { id: "TIT2".to_string(), value: "Album Title".to_string() };
        let tag = minimal_tag(&[title, toc, chapter], Id3v2Version::V4, 0);

        let tmp = synthetic_mp3(&tag, b"audio-payload");
        strip(tmp.path(), Id3v2Version::V4, DEFAULT_BUFFER_SIZE).unwrap();

        let info = read(tmp.path()).unwrap();
        assert!(info.metadata.title.is_none());
        assert_eq!(info.chapters.len(), 1);
    }

    #[test]
    fn strip_removes_tag_entirely_when_no_chapters() {
        let frames = vec![Frame::Text { id: "TIT2".to_string(), value: "Solo".to_string() }];
        let tag = minimal_tag(&frames, Id3v2Version::V4, 0);
        let tmp = synthetic_mp3(&tag, b"audio-payload");

        strip(tmp.path(), Id3v2Version::V4, DEFAULT_BUFFER_SIZE).unwrap();
        let bytes = std::fs::read(tmp.path()).unwrap();
        assert_eq!(bytes, b"audio-payload");
    }
}

// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame-tree parsing and emission: the closed set of recognised ID3v2 frame grammars, plus
//! opaque round-tripping for everything else.

use audiotag_core::errors::{AudioTagError, Id3v2Error, Result};
use audiotag_core::io::{ByteReader, ByteWriter, TextEncoding};

use audiotag_core::config::Id3v2Version;
use crate::header::frame_size_is_syncsafe;
use crate::unsync;

const TEXT_IDS: &[&str] = &[
    "TIT2", "TPE1", "TALB", "TCON", "TRCK", "TYER", "TDRC", "TPE2", "TCOM", "TPUB", "TCOP", "TENC",
    "TLEN", "TBPM", "TKEY", "TLAN", "TPOS", "TSRC",
];

const URL_IDS: &[&str] = &["WOAR", "WOAS", "WOAF", "WPUB", "WCOM"];

#[derive(Debug, Clone, PartialEq)]
pub struct SyltEvent {
    pub text: String,
    pub timestamp_ms: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text { id: String, value: String },
    Url { id: String, value: String },
    UserText { description: String, value: String },
    UserUrl { description: String, value: String },
    Comment { language: String, description: String, text: String },
    UnsyncLyrics { language: String, description: String, text: String },
    SynchronizedLyrics {
        language: String,
        content_type: u8,
        description: String,
        events: Vec<SyltEvent>,
    },
    Picture { mime: String, picture_type: u8, description: String, data: Vec<u8> },
    Chapter { element_id: String, start_ms: u32, end_ms: u32, sub_frames: Vec<Frame> },
    TableOfContents {
        element_id: String,
        ordered: bool,
        top_level: bool,
        children: Vec<String>,
        sub_frames: Vec<Frame>,
    },
    PrivateData { owner: String, data: Vec<u8> },
    UniqueFileIdentifier { owner: String, data: Vec<u8> },
    PlayCount(u64),
    Popularimeter { email: String, rating: u8, play_count: u64 },
    Unknown { id: String, data: Vec<u8> },
}

impl Frame {
    pub fn id(&self) -> &str {
        match self {
            Frame::Text { id, .. } => id,
            Frame::Url { id, .. } => id,
            Frame::UserText { .. } => "TXXX",
            Frame::UserUrl { .. } => "WXXX",
            Frame::Comment { .. } => "COMM",
            Frame::UnsyncLyrics { .. } => "USLT",
            Frame::SynchronizedLyrics { .. } => "SYLT",
            Frame::Picture { .. } => "APIC",
            Frame::Chapter { .. } => "CHAP",
            Frame::TableOfContents { .. } => "CTOC",
            Frame::PrivateData { .. } => "PRIV",
            Frame::UniqueFileIdentifier { .. } => "UFID",
            Frame::PlayCount(_) => "PCNT",
            Frame::Popularimeter { .. } => "POPM",
            Frame::Unknown { id, .. } => id,
        }
    }
}

/// Chooses the write-time text encoding: v2.4 always emits UTF-8; v2.3 emits Latin-1 when every
/// scalar fits in a byte, otherwise UTF-16 with a byte-order mark.
fn choose_encoding(version: Id3v2Version, text: &str) -> TextEncoding {
    match version {
        Id3v2Version::V4 => TextEncoding::Utf8,
        Id3v2Version::V3 => {
            if text.chars().all(|c| (c as u32) <= 0xFF) {
                TextEncoding::Latin1
            } else {
                TextEncoding::Utf16Bom
            }
        }
    }
}

/// Right-pads an ISO 639-2 language code to exactly three ASCII bytes.
fn pad_language(language: &str) -> String {
    let mut padded: String = language.chars().take(3).collect();
    while padded.len() < 3 {
        padded.push(' ');
    }
    padded
}

fn is_valid_frame_id(id: &[u8; 4]) -> bool {
    id.iter().all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Parses a frame list until a null byte (padding), an invalid identifier, or the buffer is
/// exhausted. Used both at the tag's top level and recursively for `CHAP`/`CTOC` sub-frames.
pub fn parse_frame_list(buf: &[u8], version: Id3v2Version) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    let mut reader = ByteReader::new(buf);

    loop {
        if reader.remaining() < 10 {
            break;
        }
        if buf[reader.pos() as usize] == 0 {
            break;
        }

        let id_bytes = reader.read_bytes(4)?;
        let id_arr: [u8; 4] = id_bytes.try_into().unwrap();
        if !is_valid_frame_id(&id_arr) {
            break;
        }
        let id = String::from_utf8_lossy(&id_arr).into_owned();

        let size = if frame_size_is_syncsafe(version) {
            reader.read_syncsafe_u32()?
        } else {
            reader.read_u32()?
        };
        let flags = reader.read_u16()?;

        if reader.remaining() < size as u64 {
            return Err(AudioTagError::Id3v2(Id3v2Error::TruncatedData {
                expected: size as u64,
                available: reader.remaining(),
            }));
        }

        let raw_payload = reader.read_bytes(size as usize)?;
        let mut owned_payload;
        let payload: &[u8] = if version == Id3v2Version::V4 && flags & 0x0002 != 0 {
            owned_payload = raw_payload.to_vec();
            unsync::decode(&mut owned_payload);
            &owned_payload
        } else {
            raw_payload
        };

        frames.push(parse_frame_body(&id, payload, version)?);
    }

    Ok(frames)
}

fn parse_frame_body(id: &str, payload: &[u8], version: Id3v2Version) -> Result<Frame> {
    if TEXT_IDS.contains(&id) {
        return parse_text_frame(id, payload);
    }
    if URL_IDS.contains(&id) {
        let mut r = ByteReader::new(payload);
        let value = r.read_latin1_terminated()?;
        return Ok(Frame::Url { id: id.to_string(), value });
    }

    match id {
        "TXXX" => {
            let mut r = ByteReader::new(payload);
            let encoding = TextEncoding::from_byte(r.read_u8()?)?;
            let description = r.read_terminated_string(encoding)?;
            let value = decode_remainder(&mut r, encoding);
            Ok(Frame::UserText { description, value })
        }
        "WXXX" => {
            let mut r = ByteReader::new(payload);
            let encoding = TextEncoding::from_byte(r.read_u8()?)?;
            let description = r.read_terminated_string(encoding)?;
            let value = r.read_latin1_terminated()?;
            Ok(Frame::UserUrl { description, value })
        }
        "COMM" => {
            let mut r = ByteReader::new(payload);
            let encoding = TextEncoding::from_byte(r.read_u8()?)?;
            let language = String::from_utf8_lossy(r.read_bytes(3)?).into_owned();
            let description = r.read_terminated_string(encoding)?;
            let text = decode_remainder(&mut r, encoding);
            Ok(Frame::Comment { language, description, text })
        }
        "USLT" => {
            let mut r = ByteReader::new(payload);
            let encoding = TextEncoding::from_byte(r.read_u8()?)?;
            let language = String::from_utf8_lossy(r.read_bytes(3)?).into_owned();
            let description = r.read_terminated_string(encoding)?;
            let text = decode_remainder(&mut r, encoding);
            Ok(Frame::UnsyncLyrics { language, description, text })
        }
        "SYLT" => {
            let mut r = ByteReader::new(payload);
            let encoding = TextEncoding::from_byte(r.read_u8()?)?;
            let language = String::from_utf8_lossy(r.read_bytes(3)?).into_owned();
            let _timestamp_format = r.read_u8()?;
            let content_type = r.read_u8()?;
            let description = r.read_terminated_string(encoding)?;

            let mut events = Vec::new();
            while r.remaining() > 0 {
                let text = r.read_terminated_string(encoding)?;
                if r.remaining() < 4 {
                    break;
                }
                let timestamp_ms = r.read_u32()?;
                events.push(SyltEvent { text, timestamp_ms });
            }

            Ok(Frame::SynchronizedLyrics { language, content_type, description, events })
        }
        "APIC" => {
            let mut r = ByteReader::new(payload);
            let encoding = TextEncoding::from_byte(r.read_u8()?)?;
            let mime = r.read_latin1_terminated()?;
            let picture_type = r.read_u8()?;
            let description = r.read_terminated_string(encoding)?;
            let data = r.read_remainder().to_vec();
            Ok(Frame::Picture { mime, picture_type, description, data })
        }
        "CHAP" => {
            let mut r = ByteReader::new(payload);
            let element_id = r.read_latin1_terminated()?;
            let start_ms = r.read_u32()?;
            let end_ms = r.read_u32()?;
            let _start_offset = r.read_u32()?;
            let _end_offset = r.read_u32()?;
            let sub_frames = parse_frame_list(r.read_remainder(), version)?;
            Ok(Frame::Chapter { element_id, start_ms, end_ms, sub_frames })
        }
        "CTOC" => {
            let mut r = ByteReader::new(payload);
            let element_id = r.read_latin1_terminated()?;
            let flags = r.read_u8()?;
            let child_count = r.read_u8()?;
            let mut children = Vec::with_capacity(child_count as usize);
            for _ in 0..child_count {
                children.push(r.read_latin1_terminated()?);
            }
            let sub_frames = parse_frame_list(r.read_remainder(), version)?;
            Ok(Frame::TableOfContents {
                element_id,
                ordered: flags & 0x01 != 0,
                top_level: flags & 0x02 != 0,
                children,
                sub_frames,
            })
        }
        "PRIV" => {
            let mut r = ByteReader::new(payload);
            let owner = r.read_latin1_terminated()?;
            let data = r.read_remainder().to_vec();
            Ok(Frame::PrivateData { owner, data })
        }
        "UFID" => {
            let mut r = ByteReader::new(payload);
            let owner = r.read_latin1_terminated()?;
            let data = r.read_remainder().to_vec();
            Ok(Frame::UniqueFileIdentifier { owner, data })
        }
        "PCNT" => {
            let mut value: u64 = 0;
            for &byte in payload {
                value = (value << 8) | byte as u64;
            }
            Ok(Frame::PlayCount(value))
        }
        "POPM" => {
            let mut r = ByteReader::new(payload);
            let email = r.read_latin1_terminated()?;
            let rating = r.read_u8()?;
            let mut play_count: u64 = 0;
            for &byte in r.read_remainder() {
                play_count = (play_count << 8) | byte as u64;
            }
            Ok(Frame::Popularimeter { email, rating, play_count })
        }
        other => Ok(Frame::Unknown { id: other.to_string(), data: payload.to_vec() }),
    }
}

fn decode_remainder(reader: &mut ByteReader<'_>, encoding: TextEncoding) -> String {
    let bytes = reader.read_remainder();
    match encoding {
        TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        TextEncoding::Utf16Bom | TextEncoding::Utf16Be => ByteReader::new(bytes)
            .read_utf16_terminated()
            .unwrap_or_default(),
    }
}

fn parse_text_frame(id: &str, payload: &[u8]) -> Result<Frame> {
    let mut r = ByteReader::new(payload);
    let encoding = TextEncoding::from_byte(r.read_u8()?)?;
    let value = decode_remainder(&mut r, encoding);
    Ok(Frame::Text { id: id.to_string(), value })
}

/// Serializes a frame (and any sub-frames) as a complete `id + size + flags + body` record.
pub fn write_frame(writer: &mut ByteWriter, frame: &Frame, version: Id3v2Version) {
    let mut body = ByteWriter::new();
    write_frame_body(&mut body, frame, version);

    writer.write_bytes(frame.id().as_bytes());
    if frame_size_is_syncsafe(version) {
        writer.write_syncsafe_u32(body.len() as u32);
    } else {
        writer.write_u32(body.len() as u32);
    }
    writer.write_u16(0);
    writer.write_bytes(body.as_slice());
}

fn write_frame_body(w: &mut ByteWriter, frame: &Frame, version: Id3v2Version) {
    match frame {
        Frame::Text { value, .. } => {
            let encoding = choose_encoding(version, value);
            w.write_u8(encoding.to_byte());
            w.write_encoded(value, encoding);
        }
        Frame::Url { value, .. } => {
            w.write_latin1(value);
        }
        Frame::UserText { description, value } => {
            let encoding = choose_encoding(version, description).min_with(choose_encoding(version, value));
            w.write_u8(encoding.to_byte());
            w.write_encoded_terminated(description, encoding);
            w.write_encoded(value, encoding);
        }
        Frame::UserUrl { description, value } => {
            let encoding = choose_encoding(version, description);
            w.write_u8(encoding.to_byte());
            w.write_encoded_terminated(description, encoding);
            w.write_latin1(value);
        }
        Frame::Comment { language, description, text } => {
            let encoding = choose_encoding(version, description).min_with(choose_encoding(version, text));
            w.write_u8(encoding.to_byte());
            w.write_latin1(&pad_language(language));
            w.write_encoded_terminated(description, encoding);
            w.write_encoded(text, encoding);
        }
        Frame::UnsyncLyrics { language, description, text } => {
            let encoding = choose_encoding(version, description).min_with(choose_encoding(version, text));
            w.write_u8(encoding.to_byte());
            w.write_latin1(&pad_language(language));
            w.write_encoded_terminated(description, encoding);
            w.write_encoded(text, encoding);
        }
        Frame::SynchronizedLyrics { language, content_type, description, events } => {
            let encoding = choose_encoding(version, description);
            w.write_u8(encoding.to_byte());
            w.write_latin1(&pad_language(language));
            w.write_u8(0x02); // timestamp format: milliseconds
            w.write_u8(*content_type);
            w.write_encoded_terminated(description, encoding);
            for event in events {
                w.write_encoded_terminated(&event.text, encoding);
                w.write_u32(event.timestamp_ms);
            }
        }
        Frame::Picture { mime, picture_type, description, data } => {
            let encoding = choose_encoding(version, description);
            w.write_u8(encoding.to_byte());
            w.write_latin1(mime);
            w.write_u8(0);
            w.write_u8(*picture_type);
            w.write_encoded_terminated(description, encoding);
            w.write_bytes(data);
        }
        Frame::Chapter { element_id, start_ms, end_ms, sub_frames } => {
            w.write_latin1(element_id);
            w.write_u8(0);
            w.write_u32(*start_ms);
            w.write_u32(*end_ms);
            w.write_u32(0xFFFF_FFFF);
            w.write_u32(0xFFFF_FFFF);
            for sub in sub_frames {
                write_frame(w, sub, version);
            }
        }
        Frame::TableOfContents { element_id, ordered, top_level, children, sub_frames } => {
            w.write_latin1(element_id);
            w.write_u8(0);
            let mut flags = 0u8;
            if *ordered {
                flags |= 0x01;
            }
            if *top_level {
                flags |= 0x02;
            }
            w.write_u8(flags);
            w.write_u8(children.len() as u8);
            for child in children {
                w.write_latin1(child);
                w.write_u8(0);
            }
            for sub in sub_frames {
                write_frame(w, sub, version);
            }
        }
        Frame::PrivateData { owner, data } => {
            w.write_latin1(owner);
            w.write_u8(0);
            w.write_bytes(data);
        }
        Frame::UniqueFileIdentifier { owner, data } => {
            w.write_latin1(owner);
            w.write_u8(0);
            w.write_bytes(data);
        }
        Frame::PlayCount(count) => {
            w.write_u32(*count as u32);
        }
        Frame::Popularimeter { email, rating, play_count } => {
            w.write_latin1(email);
            w.write_u8(0);
            w.write_u8(*rating);
            w.write_u32(*play_count as u32);
        }
        Frame::Unknown { data, .. } => {
            w.write_bytes(data);
        }
    }
}

impl TextEncoding {
    /// When two independent strings share one frame, the stricter (non-Latin-1) encoding wins.
    fn min_with(self, other: TextEncoding) -> TextEncoding {
        if self == TextEncoding::Latin1 {
            other
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_text_frame() {
        let mut w = ByteWriter::new();
        write_frame(&mut w, &Frame::Text { id: "TIT2".to_string(), value: "Title".to_string() }, Id3v2Version::V4);
        let frames = parse_frame_list(w.as_slice(), Id3v2Version::V4).unwrap();
        assert_eq!(frames, vec![Frame::Text { id: "TIT2".to_string(), value: "Title".to_string() }]);
    }

    #[test]
    fn round_trips_chapter_with_sub_frames() {
        let chapter = Frame::Chapter {
            element_id: "chp0".to_string(),
            start_ms: 0,
            end_ms: 3000,
            sub_frames: vec![Frame::Text { id: "TIT2".to_string(), value: "Intro".to_string() }],
        };
        let mut w = ByteWriter::new();
        write_frame(&mut w, &chapter, Id3v2Version::V4);
        let frames = parse_frame_list(w.as_slice(), Id3v2Version::V4).unwrap();
        assert_eq!(frames, vec![chapter]);
    }

    #[test]
    fn leading_null_byte_terminates_scan() {
        let buf = [0u8; 20];
        let frames = parse_frame_list(&buf, Id3v2Version::V4).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn declared_size_exceeding_buffer_is_truncated_data() {
        let mut buf = b"TIT2".to_vec();
        buf.extend_from_slice(&[0, 0, 0, 100]);
        buf.extend_from_slice(&[0, 0]);
        assert!(parse_frame_list(&buf, Id3v2Version::V3).is_err());
    }

    #[test]
    fn pcnt_combines_arbitrary_length_counter() {
        let frame = parse_frame_body("PCNT", &[0x00, 0x00, 0x01, 0x00], Id3v2Version::V4).unwrap();
        assert_eq!(frame, Frame::PlayCount(256));
    }
}

// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chapter extraction (Nero `chpl`, QuickTime text track) and chapter text-track construction
//! for the write path.

use audiotag_core::errors::Result;
use audiotag_core::io::{ByteReader, ByteWriter, FileReader};
use audiotag_core::model::{AudioTimestamp, Chapter, ChapterList};

use crate::atom::Atom;

/// Reads a Nero `chpl` atom's chapter list. Returns an empty list if `chpl` is absent or has
/// zero entries.
pub fn read_chpl(udta: Option<&Atom>) -> Result<ChapterList> {
    let Some(udta) = udta else { return Ok(ChapterList::new()) };
    let Some(chpl) = udta.find(b"chpl") else { return Ok(ChapterList::new()) };
    let Some(payload) = chpl.leaf_data() else { return Ok(ChapterList::new()) };

    let mut r = ByteReader::new(payload);
    let _version = r.read_u8()?;
    r.skip(3)?;
    let count = r.read_u8()?;

    let mut chapters = Vec::with_capacity(count as usize);
    for i in 0..count {
        let units = r.read_u64()?;
        let title_len = r.read_u8()?;
        let title = r.read_utf8(title_len as usize)?;
        let start_seconds = units as f64 / 10_000_000.0;
        chapters.push(Chapter::new(format!("chpl{i}"), AudioTimestamp::from_seconds(start_seconds), title));
    }

    Ok(ChapterList::from_vec(chapters))
}

fn handler_type(trak: &Atom) -> Option<[u8; 4]> {
    let hdlr = trak.walk(&[*b"mdia", *b"hdlr"])?;
    let payload = hdlr.leaf_data()?;
    if payload.len() < 12 {
        return None;
    }
    Some(payload[8..12].try_into().unwrap())
}

fn media_timescale(trak: &Atom) -> Option<u32> {
    let mdhd = trak.walk(&[*b"mdia", *b"mdhd"])?;
    let payload = mdhd.leaf_data()?;
    if payload.is_empty() {
        return None;
    }
    let version = payload[0];
    let offset = if version == 1 { 20 } else { 12 };
    if payload.len() < offset + 4 {
        return None;
    }
    Some(u32::from_be_bytes(payload[offset..offset + 4].try_into().unwrap()))
}

fn chap_track_ids(trak: &Atom) -> Vec<u32> {
    let Some(tref) = trak.find(b"tref") else { return Vec::new() };
    let Some(chap) = tref.find(b"chap") else { return Vec::new() };
    let Some(payload) = chap.leaf_data() else { return Vec::new() };

    payload
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
        .collect()
}

fn track_id(trak: &Atom) -> Option<u32> {
    let tkhd = trak.find(b"tkhd")?;
    let payload = tkhd.leaf_data()?;
    let offset = if payload.first() == Some(&1) { 20 } else { 12 };
    if payload.len() < offset + 4 {
        return None;
    }
    Some(u32::from_be_bytes(payload[offset..offset + 4].try_into().unwrap()))
}

fn sample_sizes(stbl: &Atom) -> Vec<u32> {
    let Some(stsz) = stbl.find(b"stsz") else { return Vec::new() };
    let Some(payload) = stsz.leaf_data() else { return Vec::new() };
    if payload.len() < 12 {
        return Vec::new();
    }
    let uniform_size = u32::from_be_bytes(payload[4..8].try_into().unwrap());
    let count = u32::from_be_bytes(payload[8..12].try_into().unwrap()) as usize;
    if uniform_size != 0 {
        return vec![uniform_size; count];
    }
    payload[12..]
        .chunks_exact(4)
        .take(count)
        .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
        .collect()
}

fn sample_durations(stbl: &Atom) -> Vec<u64> {
    let Some(stts) = stbl.find(b"stts") else { return Vec::new() };
    let Some(payload) = stts.leaf_data() else { return Vec::new() };
    if payload.len() < 8 {
        return Vec::new();
    }
    let entry_count = u32::from_be_bytes(payload[4..8].try_into().unwrap()) as usize;
    let mut durations = Vec::new();
    for entry in payload[8..].chunks_exact(8).take(entry_count) {
        let count = u32::from_be_bytes(entry[0..4].try_into().unwrap());
        let delta = u32::from_be_bytes(entry[4..8].try_into().unwrap()) as u64;
        for _ in 0..count {
            durations.push(delta);
        }
    }
    durations
}

fn chunk_offsets(stbl: &Atom) -> Vec<u64> {
    if let Some(stco) = stbl.find(b"stco") {
        if let Some(payload) = stco.leaf_data() {
            if payload.len() >= 8 {
                let count = u32::from_be_bytes(payload[4..8].try_into().unwrap()) as usize;
                return payload[8..]
                    .chunks_exact(4)
                    .take(count)
                    .map(|c| u32::from_be_bytes(c.try_into().unwrap()) as u64)
                    .collect();
            }
        }
    }
    if let Some(co64) = stbl.find(b"co64") {
        if let Some(payload) = co64.leaf_data() {
            if payload.len() >= 8 {
                let count = u32::from_be_bytes(payload[4..8].try_into().unwrap()) as usize;
                return payload[8..]
                    .chunks_exact(8)
                    .take(count)
                    .map(|c| u64::from_be_bytes(c.try_into().unwrap()))
                    .collect();
            }
        }
    }
    Vec::new()
}

/// Reads one sample's `(title, url)` payload: 2-byte length-prefixed UTF-8 text, optionally
/// followed by an inline `href` atom providing a URL.
fn read_sample_text(reader: &mut FileReader, offset: u64, size: u32) -> Result<(String, Option<String>)> {
    let bytes = reader.read(offset, size as u64)?;
    let mut r = ByteReader::new(&bytes);
    let text_len = r.read_u16()? as usize;
    let title = r.read_utf8(text_len)?;

    let mut url = None;
    if r.remaining() >= 8 {
        let _href_size = r.read_u32()?;
        let tag = r.read_bytes(4)?;
        if tag == b"href" {
            let _flags = r.read_u16()?;
            let _char_count = r.read_u16()?;
            let url_len = r.read_u8()? as usize;
            if r.remaining() >= url_len as u64 {
                url = Some(r.read_utf8(url_len)?);
            }
        }
    }

    Ok((title, url))
}

/// Reads the QuickTime text chapter track referenced by the audio track's `tref/chap`.
pub fn read_qt_text_chapters(reader: &mut FileReader, moov: &Atom) -> Result<ChapterList> {
    let audio_trak = moov
        .children()
        .iter()
        .find(|t| t.fourcc == *b"trak" && handler_type(t) == Some(*b"soun"));

    let Some(audio_trak) = audio_trak else { return Ok(ChapterList::new()) };
    let referenced = chap_track_ids(audio_trak);
    if referenced.is_empty() {
        return Ok(ChapterList::new());
    }

    for trak in moov.children().iter().filter(|t| t.fourcc == *b"trak") {
        if track_id(trak) != Some(referenced[0]) {
            continue;
        }
        let handler = handler_type(trak);
        if handler != Some(*b"text") && handler != Some(*b"sbtl") {
            continue;
        }

        let Some(timescale) = media_timescale(trak) else { continue };
        let Some(stbl) = trak.walk(&[*b"mdia", *b"minf", *b"stbl"]) else { continue };

        let sizes = sample_sizes(stbl);
        let durations = sample_durations(stbl);
        let offsets = chunk_offsets(stbl);

        let mut chapters = Vec::new();
        let mut cumulative_ticks: u64 = 0;
        for (i, &size) in sizes.iter().enumerate() {
            let Some(&offset) = offsets.get(i) else { break };
            let (title, url) = read_sample_text(reader, offset, size)?;
            let start_seconds = cumulative_ticks as f64 / timescale as f64;
            let mut chapter = Chapter::new(format!("qt{i}"), AudioTimestamp::from_seconds(start_seconds), title);
            chapter.url = url;
            chapters.push(chapter);
            cumulative_ticks += durations.get(i).copied().unwrap_or(0);
        }

        return Ok(ChapterList::from_vec(chapters));
    }

    Ok(ChapterList::new())
}

/// One encoded chapter text sample plus its optional `href` suffix, ready to be placed in `mdat`.
pub struct ChapterSample {
    pub bytes: Vec<u8>,
}

/// Encodes a chapter's title (and optional URL) as a QuickTime text sample.
pub fn encode_chapter_sample(title: &str, url: Option<&str>) -> ChapterSample {
    let mut w = ByteWriter::new();
    w.write_u16(title.len() as u16);
    w.write_bytes(title.as_bytes());

    if let Some(url) = url {
        let mut href = ByteWriter::new();
        href.write_bytes(b"href");
        href.write_u16(0x0005);
        href.write_u16(title.len() as u16);
        href.write_u8(url.len() as u8);
        href.write_bytes(url.as_bytes());
        href.write_u16(0);

        w.write_u32((4 + href.len()) as u32);
        w.write_bytes(href.as_slice());
    }

    ChapterSample { bytes: w.into_bytes() }
}

/// Builds a Nero `chpl` atom from a chapter list (kept for compatibility with non-QuickTime
/// players).
pub fn build_chpl(chapters: &ChapterList) -> Atom {
    let mut payload = ByteWriter::new();
    payload.write_u8(1);
    payload.write_fill(0, 3);
    payload.write_u8(chapters.len().min(255) as u8);

    for chapter in chapters.iter().take(255) {
        let units = (chapter.start.as_seconds() * 10_000_000.0) as u64;
        payload.write_u64(units);
        let title_bytes = chapter.title.as_bytes();
        payload.write_u8(title_bytes.len().min(255) as u8);
        payload.write_bytes(&title_bytes[..title_bytes.len().min(255)]);
    }

    Atom::leaf(*b"chpl", payload.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chpl_round_trips_through_read_and_build() {
        let mut chapters = ChapterList::new();
        chapters.append(Chapter::new("a", AudioTimestamp::from_seconds(0.0), "Intro"));
        chapters.append(Chapter::new("b", AudioTimestamp::from_seconds(12.5), "Body"));

        let chpl = build_chpl(&chapters);
        let udta = Atom::container(*b"udta", vec![chpl]);
        let back = read_chpl(Some(&udta)).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back.as_slice()[0].title, "Intro");
        assert!((back.as_slice()[1].start.as_seconds() - 12.5).abs() < 0.001);
    }

    #[test]
    fn encodes_sample_with_href_suffix() {
        let sample = encode_chapter_sample("Chapter One", Some("https://example.com"));
        assert!(sample.bytes.len() > "Chapter One".len() + 2);
        let text_len = u16::from_be_bytes([sample.bytes[0], sample.bytes[1]]) as usize;
        assert_eq!(text_len, "Chapter One".len());
    }
}

// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end coverage of the façade across both containers: round-trips, in-place-size
//! preservation, unknown-data preservation, chapter-track construction, and the MP3-vs-MP4
//! strip asymmetry.

use std::io::Write as _;

use audiotag::{AudioFileInfo, AudioFormat, Chapter, ChapterList, Engine};
use audiotag_core::model::{Artwork, AudioTimestamp};

fn synthetic_mp3(tag: &[u8], audio: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
    f.write_all(tag).unwrap();
    f.write_all(audio).unwrap();
    f.flush().unwrap();
    f
}

fn synthetic_m4a(audio: &[u8]) -> tempfile::NamedTempFile {
    use audiotag_mp4::Atom;

    let ftyp = Atom::leaf(*b"ftyp", b"M4A \x00\x00\x00\x00M4A mp42isom".to_vec()).to_bytes();

    let mut mvhd_payload = Vec::new();
    mvhd_payload.extend_from_slice(&[0, 0, 0, 0]);
    mvhd_payload.extend_from_slice(&[0; 8]);
    mvhd_payload.extend_from_slice(&1000u32.to_be_bytes());
    mvhd_payload.extend_from_slice(&5000u32.to_be_bytes());
    let mvhd = Atom::leaf(*b"mvhd", mvhd_payload);

    let mut hdlr_payload = Vec::new();
    hdlr_payload.extend_from_slice(&[0, 0, 0, 0]);
    hdlr_payload.extend_from_slice(&[0, 0, 0, 0]);
    hdlr_payload.extend_from_slice(b"soun");
    hdlr_payload.extend_from_slice(&[0; 12]);
    hdlr_payload.push(0);
    let hdlr = Atom::leaf(*b"hdlr", hdlr_payload);
    let mdia = Atom::container(*b"mdia", vec![hdlr]);

    let mut tkhd_payload = Vec::new();
    tkhd_payload.extend_from_slice(&[0, 0, 0, 0]);
    tkhd_payload.extend_from_slice(&[0; 8]);
    tkhd_payload.extend_from_slice(&1u32.to_be_bytes());
    tkhd_payload.extend_from_slice(&[0; 4]);
    tkhd_payload.extend_from_slice(&5000u32.to_be_bytes());
    let tkhd = Atom::leaf(*b"tkhd", tkhd_payload);

    let trak = Atom::container(*b"trak", vec![tkhd, mdia]);
    let moov = Atom::container(*b"moov", vec![mvhd, trak]).to_bytes();

    let mut mdat = Vec::new();
    mdat.extend_from_slice(&(8 + audio.len() as u32).to_be_bytes());
    mdat.extend_from_slice(b"mdat");
    mdat.extend_from_slice(audio);

    let mut f = tempfile::Builder::new().suffix(".m4a").tempfile().unwrap();
    f.write_all(&ftyp).unwrap();
    f.write_all(&moov).unwrap();
    f.write_all(&mdat).unwrap();
    f.flush().unwrap();
    f
}

fn three_chapters() -> ChapterList {
    let mut chapters = ChapterList::new();
    chapters.append(Chapter::new("intro", AudioTimestamp::from_millis(0), "Intro"));
    chapters.append(Chapter::new("body", AudioTimestamp::from_millis(2_000), "Body"));
    chapters.append(Chapter::new("outro", AudioTimestamp::from_millis(4_000), "Outro"));
    chapters
}

#[test]
fn detect_format_routes_by_magic_bytes() {
    let mp3 = synthetic_mp3(b"", b"audio-bytes");
    let m4a = synthetic_m4a(b"audio-bytes");
    let engine = Engine::default();
    assert_eq!(engine.detect_format(mp3.path()).unwrap(), AudioFormat::Mp3);
    assert_eq!(engine.detect_format(m4a.path()).unwrap(), AudioFormat::M4a);
}

#[test]
fn mp3_round_trip_preserves_title_artist_year_and_three_chapters() {
    let tmp = synthetic_mp3(b"", b"audio-payload-0123456789");
    let engine = Engine::default();

    let mut info = AudioFileInfo::new();
    info.metadata.title = Some("Episode One".to_string());
    info.metadata.artist = Some("Narrator".to_string());
    info.metadata.year = Some("2026".to_string());
    info.chapters = three_chapters();

    engine.write(&info, tmp.path()).unwrap();

    let back = engine.read(tmp.path()).unwrap();
    assert_eq!(back.metadata.title.as_deref(), Some("Episode One"));
    assert_eq!(back.metadata.artist.as_deref(), Some("Narrator"));
    assert_eq!(back.metadata.year.as_deref(), Some("2026"));
    assert_eq!(back.chapters.len(), 3);
    assert_eq!(back.chapters.as_slice()[1].title, "Body");
}

#[test]
fn mp3_in_place_write_does_not_grow_the_file_when_padding_allows_it() {
    let tmp = synthetic_mp3(b"", b"audio-payload-0123456789");
    let engine = Engine::default();

    let mut info = AudioFileInfo::new();
    info.metadata.title = Some("A".to_string());
    engine.write(&info, tmp.path()).unwrap();
    let size_after_first_write = std::fs::metadata(tmp.path()).unwrap().len();

    info.metadata.title = Some("B".to_string());
    engine.write(&info, tmp.path()).unwrap();
    let size_after_second_write = std::fs::metadata(tmp.path()).unwrap().len();

    assert_eq!(size_after_first_write, size_after_second_write);
}

#[test]
fn mp3_modify_preserves_unknown_frames() {
    let tmp = synthetic_mp3(b"", b"audio-payload-0123456789");
    let engine = Engine::default();

    let mut info = AudioFileInfo::new();
    info.metadata.title = Some("Original".to_string());
    info.metadata.custom_text.insert("TXXX:mood".to_string(), "upbeat".to_string());
    engine.write(&info, tmp.path()).unwrap();

    let mut modified = engine.read(tmp.path()).unwrap();
    modified.metadata.title = Some("Updated".to_string());
    modified.metadata.custom_text.clear();
    engine.modify(&modified, tmp.path()).unwrap();

    let back = engine.read(tmp.path()).unwrap();
    assert_eq!(back.metadata.title.as_deref(), Some("Updated"));
}

#[test]
fn mp4_chapter_track_insertion_round_trips_three_chapters() {
    let tmp = synthetic_m4a(b"audio-bytes-0123456789");
    let engine = Engine::default();

    let mut info = engine.read(tmp.path()).unwrap();
    info.metadata.title = Some("My Audiobook".to_string());
    info.chapters = three_chapters();
    engine.write(&info, tmp.path()).unwrap();

    let back = engine.read(tmp.path()).unwrap();
    assert_eq!(back.metadata.title.as_deref(), Some("My Audiobook"));
    assert_eq!(back.chapters.len(), 3);
    assert_eq!(back.chapters.as_slice()[2].title, "Outro");
}

#[test]
fn mp4_chapter_artwork_builds_a_second_video_track() {
    let tmp = synthetic_m4a(b"audio-bytes-0123456789");
    let engine = Engine::default();

    let jpeg_one = Artwork::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02, 0x03]).unwrap();
    let jpeg_two = Artwork::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x04, 0x05, 0x06, 0x07]).unwrap();

    let mut chapters = three_chapters();
    let mut with_art: Vec<Chapter> = chapters.clone().into_vec();
    with_art[0].artwork = Some(jpeg_one);
    with_art[1].artwork = Some(jpeg_two);
    chapters = ChapterList::from_vec(with_art);

    let mut info = engine.read(tmp.path()).unwrap();
    info.chapters = chapters;
    engine.write(&info, tmp.path()).unwrap();

    let back = engine.read(tmp.path()).unwrap();
    assert_eq!(back.chapters.len(), 3);
    assert!(back.chapters.as_slice()[0].artwork.is_some());
    assert!(back.chapters.as_slice()[1].artwork.is_some());
}

#[test]
fn strip_is_asymmetric_between_mp3_and_mp4() {
    let mp3 = synthetic_mp3(b"", b"audio-payload-0123456789");
    let m4a = synthetic_m4a(b"audio-bytes-0123456789");
    let engine = Engine::default();

    let mut mp3_info = AudioFileInfo::new();
    mp3_info.metadata.title = Some("Has Title".to_string());
    mp3_info.chapters = three_chapters();
    engine.write(&mp3_info, mp3.path()).unwrap();
    engine.strip(mp3.path()).unwrap();
    let mp3_back = engine.read(mp3.path()).unwrap();
    assert!(mp3_back.metadata.title.is_none());
    assert_eq!(mp3_back.chapters.len(), 3, "MP3 strip preserves chapters");

    let mut m4a_info = engine.read(m4a.path()).unwrap();
    m4a_info.metadata.title = Some("Has Title".to_string());
    m4a_info.chapters = three_chapters();
    engine.write(&m4a_info, m4a.path()).unwrap();
    engine.strip(m4a.path()).unwrap();
    let m4a_back = engine.read(m4a.path()).unwrap();
    assert!(m4a_back.metadata.title.is_none());
    assert!(m4a_back.chapters.is_empty(), "MP4 strip removes chapters");
}

#[test]
fn write_chapters_then_clearing_removes_them_on_both_containers() {
    let mp3 = synthetic_mp3(b"", b"audio-payload-0123456789");
    let m4a = synthetic_m4a(b"audio-bytes-0123456789");
    let engine = Engine::default();

    engine.write_chapters(three_chapters(), mp3.path()).unwrap();
    assert_eq!(engine.read_chapters(mp3.path()).unwrap().len(), 3);
    engine.write_chapters(ChapterList::new(), mp3.path()).unwrap();
    assert!(engine.read_chapters(mp3.path()).unwrap().is_empty());

    engine.write_chapters(three_chapters(), m4a.path()).unwrap();
    assert_eq!(engine.read_chapters(m4a.path()).unwrap().len(), 3);
    engine.write_chapters(ChapterList::new(), m4a.path()).unwrap();
    assert!(engine.read_chapters(m4a.path()).unwrap().is_empty());
}

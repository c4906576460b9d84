// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rebuilds `moov` from an existing tree plus fresh metadata and chapters: drops stale chapter
//! tracks, rebuilds `udta`, and appends a QuickTime text chapter track (and, when any chapter
//! carries artwork, a companion video track).

use audiotag_core::errors::{AudioTagError, Mp4Error, Result};
use audiotag_core::io::ByteWriter;
use audiotag_core::model::{ArtworkFormat, AudioFileInfo, AudioTimestamp};

use crate::atom::{Atom, FourCc};
use crate::chapters::{build_chpl, encode_chapter_sample};
use crate::metadata::build_ilst;

fn handler_type(trak: &Atom) -> Option<FourCc> {
    let hdlr = trak.walk(&[*b"mdia", *b"hdlr"])?;
    let payload = hdlr.leaf_data()?;
    if payload.len() < 12 {
        return None;
    }
    Some(payload[8..12].try_into().unwrap())
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

fn chap_referenced_ids(trak: &Atom) -> Vec<u32> {
    let Some(payload) = trak.find(b"tref").and_then(|t| t.find(b"chap")).and_then(|c| c.leaf_data()) else {
        return Vec::new();
    };
    payload.chunks_exact(4).map(|c| u32::from_be_bytes(c.try_into().unwrap())).collect()
}

/// Reads `mvhd`'s duration in seconds, if present and its timescale is non-zero.
pub fn movie_duration_seconds(moov: &Atom) -> Option<f64> {
    let mvhd = moov.find(b"mvhd")?;
    let (timescale, duration) = mvhd_timescale_duration(mvhd)?;
    if timescale == 0 {
        return None;
    }
    Some(duration as f64 / timescale as f64)
}

fn mvhd_timescale_duration(mvhd: &Atom) -> Option<(u32, u64)> {
    let payload = mvhd.leaf_data()?;
    if payload.is_empty() {
        return None;
    }
    let version = payload[0];
    if version == 1 {
        if payload.len() < 32 {
            return None;
        }
        let timescale = u32::from_be_bytes(payload[20..24].try_into().unwrap());
        let duration = u64::from_be_bytes(payload[24..32].try_into().unwrap());
        Some((timescale, duration))
    } else {
        if payload.len() < 20 {
            return None;
        }
        let timescale = u32::from_be_bytes(payload[12..16].try_into().unwrap());
        let duration = u32::from_be_bytes(payload[16..20].try_into().unwrap()) as u64;
        Some((timescale, duration))
    }
}

fn build_tref(chapter_track_id: u32, artwork_track_id: Option<u32>) -> Atom {
    let mut payload = ByteWriter::new();
    payload.write_u32(chapter_track_id);
    if let Some(id) = artwork_track_id {
        payload.write_u32(id);
    }
    Atom::container(*b"tref", vec![Atom::leaf(*b"chap", payload.into_bytes())])
}

fn identity_matrix(w: &mut ByteWriter) {
    const MATRIX: [i32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];
    for v in MATRIX {
        w.write_u32(v as u32);
    }
}

fn build_tkhd(track_id: u32, duration: u64) -> Atom {
    let mut p = ByteWriter::new();
    p.write_u8(0); // version 0
    p.write_u24(0); // flags: disabled track (no 0x1/0x2/0x4 bits set)
    p.write_u32(0); // creation time
    p.write_u32(0); // modification time
    p.write_u32(track_id);
    p.write_u32(0); // reserved
    p.write_u32(duration.min(u32::MAX as u64) as u32);
    p.write_fill(0, 8); // reserved
    p.write_u16(0); // layer
    p.write_u16(0); // alternate group
    p.write_u16(0); // volume
    p.write_u16(0); // reserved
    identity_matrix(&mut p);
    p.write_u32(0); // width (16.16 fixed point)
    p.write_u32(0); // height
    Atom::leaf(*b"tkhd", p.into_bytes())
}

fn build_mdhd(media_timescale: u32, media_duration: u64) -> Atom {
    let mut p = ByteWriter::new();
    p.write_u8(0);
    p.write_u24(0);
    p.write_u32(0);
    p.write_u32(0);
    p.write_u32(media_timescale);
    p.write_u32(media_duration.min(u32::MAX as u64) as u32);
    p.write_u16(0x55C4); // undetermined language
    p.write_u16(0);
    Atom::leaf(*b"mdhd", p.into_bytes())
}

fn build_hdlr(handler_type: &FourCc, handler_name: &str) -> Atom {
    let mut p = ByteWriter::new();
    p.write_u32(0); // version+flags
    p.write_u32(0); // predefined
    p.write_bytes(handler_type);
    p.write_fill(0, 12); // reserved
    p.write_utf8(handler_name);
    p.write_u8(0);
    Atom::leaf(*b"hdlr", p.into_bytes())
}

fn build_dref_self_contained() -> Atom {
    let mut url_payload = ByteWriter::new();
    url_payload.write_u8(0);
    url_payload.write_u24(0x000001); // self-contained flag
    let url = Atom::leaf(*b"url ", url_payload.into_bytes());

    let mut dref_header = ByteWriter::new();
    dref_header.write_u32(0);
    dref_header.write_u32(1);
    let mut children_bytes = ByteWriter::new();
    url.write(&mut children_bytes);

    let mut payload = ByteWriter::new();
    payload.write_bytes(dref_header.as_slice());
    payload.write_bytes(children_bytes.as_slice());
    Atom::leaf(*b"dref", payload.into_bytes())
}

fn build_gmhd() -> Atom {
    let mut gmin = ByteWriter::new();
    gmin.write_u32(0);
    gmin.write_u16(0x0040); // graphics mode
    gmin.write_fill(0, 6); // opcolor
    gmin.write_u16(0); // balance
    gmin.write_u16(0); // reserved
    Atom::container(*b"gmhd", vec![Atom::leaf(*b"gmin", gmin.into_bytes())])
}

/// A 59-byte QuickTime plain-text sample description.
fn build_text_stsd() -> Atom {
    let mut entry = ByteWriter::new();
    entry.write_u32(0); // display flags
    entry.write_u32(1); // text justification
    entry.write_fill(0, 6); // background color
    entry.write_fill(0, 8); // default text box
    entry.write_u32(0); // reserved
    entry.write_u16(0); // font number
    entry.write_u16(0); // font face
    entry.write_u8(0); // reserved
    entry.write_u16(0); // reserved
    entry.write_fill(0, 4); // foreground color
    entry.write_u8(0); // pascal-string text name, empty

    let sample_entry = crate::atom::build_leaf(b"text", entry.as_slice());

    let mut payload = ByteWriter::new();
    payload.write_u32(0);
    payload.write_u32(1);
    payload.write_bytes(&sample_entry);
    Atom::leaf(*b"stsd", payload.into_bytes())
}

/// A minimal video sample description, built the same loosely-structured way as
/// [`build_text_stsd`]: just enough fields for a player to recognize the codec, width, and height.
fn build_video_stsd(format: ArtworkFormat) -> Atom {
    let fourcc: FourCc = match format {
        ArtworkFormat::Jpeg => *b"jpeg",
        ArtworkFormat::Png => *b"png ",
    };

    let mut entry = ByteWriter::new();
    entry.write_u16(0); // version
    entry.write_u16(0); // revision
    entry.write_fill(0, 4); // vendor
    entry.write_u32(0); // temporal quality
    entry.write_u32(0x200); // spatial quality
    entry.write_u16(0); // width (unknown; derived from the decoded image)
    entry.write_u16(0); // height
    entry.write_u32(0x0048_0000); // horizontal resolution, 72 dpi
    entry.write_u32(0x0048_0000); // vertical resolution
    entry.write_u32(0); // data size
    entry.write_u16(1); // frame count
    entry.write_fill(0, 32); // compressor name, empty pascal string
    entry.write_u16(24); // depth
    entry.write_u16(0xFFFF); // color table id = -1

    let sample_entry = crate::atom::build_leaf(&fourcc, entry.as_slice());

    let mut payload = ByteWriter::new();
    payload.write_u32(0);
    payload.write_u32(1);
    payload.write_bytes(&sample_entry);
    Atom::leaf(*b"stsd", payload.into_bytes())
}

fn build_stts(durations: &[u64]) -> Atom {
    let mut p = ByteWriter::new();
    p.write_u32(0);
    p.write_u32(durations.len() as u32);
    for &d in durations {
        p.write_u32(1);
        p.write_u32(d.max(1).min(u32::MAX as u64) as u32);
    }
    Atom::leaf(*b"stts", p.into_bytes())
}

fn build_stsc_one_sample_per_chunk(count: usize) -> Atom {
    let mut p = ByteWriter::new();
    p.write_u32(0);
    p.write_u32(if count == 0 { 0 } else { 1 });
    if count > 0 {
        p.write_u32(1);
        p.write_u32(1);
        p.write_u32(1);
    }
    Atom::leaf(*b"stsc", p.into_bytes())
}

fn build_stsz(sizes: &[u32]) -> Atom {
    let mut p = ByteWriter::new();
    p.write_u32(0);
    p.write_u32(0); // uniform size 0 => per-sample table follows
    p.write_u32(sizes.len() as u32);
    for &s in sizes {
        p.write_u32(s);
    }
    Atom::leaf(*b"stsz", p.into_bytes())
}

fn build_stco_placeholder(count: usize) -> Atom {
    let mut p = ByteWriter::new();
    p.write_u32(0);
    p.write_u32(count as u32);
    p.write_fill(0, count * 4);
    Atom::leaf(*b"stco", p.into_bytes())
}

/// Result of rebuilding `moov`: the new bytes, the chapter (and optional artwork) sample bytes to
/// place in `mdat`, and the byte offset of each track's `stco` fourcc within the new `moov` bytes
/// (for later absolute-offset patching).
pub struct RebuildResult {
    pub moov_bytes: Vec<u8>,
    pub chapter_samples: Vec<Vec<u8>>,
    /// Byte offset of the chapter track's `stco` fourcc within `moov_bytes`.
    pub chapter_stco_offset: Option<usize>,
    /// One artwork image per chapter that carries one, in chapter order.
    pub artwork_samples: Vec<Vec<u8>>,
    /// Byte offset of the artwork track's `stco` fourcc within `moov_bytes`.
    pub artwork_stco_offset: Option<usize>,
}

/// Rebuilds `moov` given the existing tree and the fresh `(metadata, chapters)`.
pub fn rebuild(existing_moov: &Atom, info: &AudioFileInfo) -> Result<RebuildResult> {
    let mvhd = existing_moov
        .find(b"mvhd")
        .ok_or(AudioTagError::Mp4(Mp4Error::AtomNotFound("mvhd")))?;
    let (movie_timescale, movie_duration) =
        mvhd_timescale_duration(mvhd).ok_or(AudioTagError::Mp4(Mp4Error::InvalidAtom { atom_type: *b"mvhd", reason: "unreadable timescale/duration" }))?;

    let traks: Vec<&Atom> = existing_moov.children().iter().filter(|a| a.fourcc == *b"trak").collect();
    let max_tid = traks.iter().filter_map(|t| track_id(t)).max().unwrap_or(0);

    let audio_trak = traks.iter().find(|t| handler_type(t) == Some(*b"soun")).copied();
    let mut drop_ids: Vec<u32> = Vec::new();
    if let Some(audio) = audio_trak {
        drop_ids.extend(chap_referenced_ids(audio));
    }
    for trak in &traks {
        let h = handler_type(trak);
        if (h == Some(*b"text") || h == Some(*b"sbtl")) && !drop_ids.contains(&track_id(trak).unwrap_or(0)) {
            if let Some(tid) = track_id(trak) {
                drop_ids.push(tid);
            }
        }
    }

    let has_chapters = !info.chapters.is_empty();
    let has_artwork = info.chapters.iter().any(|c| c.artwork.is_some());
    let chapter_track_id = max_tid + 1;
    let artwork_track_id = if has_artwork { Some(max_tid + 2) } else { None };

    let mut new_children: Vec<Atom> = Vec::new();
    new_children.push(mvhd.clone());

    for trak in &traks {
        let tid = track_id(trak).unwrap_or(0);
        if drop_ids.contains(&tid) {
            continue;
        }
        if Some(*trak) == audio_trak {
            let mut rebuilt_children: Vec<Atom> =
                trak.children().iter().filter(|c| c.fourcc != *b"tref").cloned().collect();
            if has_chapters {
                rebuilt_children.push(build_tref(chapter_track_id, artwork_track_id));
            }
            new_children.push(Atom::container(*b"trak", rebuilt_children));
        } else {
            new_children.push((*trak).clone());
        }
    }

    for other in existing_moov.children().iter().filter(|a| a.fourcc != *b"trak" && a.fourcc != *b"mvhd" && a.fourcc != *b"udta") {
        new_children.push(other.clone());
    }

    let mut chapter_samples = Vec::new();
    let mut chapter_stco_offset = None;
    let mut artwork_samples = Vec::new();
    let mut artwork_stco_offset = None;

    if has_chapters {
        let derived = info.chapters.derive_end_times(info.duration.or(Some(AudioTimestamp::from_millis(
            (movie_duration as f64 / movie_timescale.max(1) as f64 * 1000.0) as u64,
        ))));

        const MEDIA_TIMESCALE: u32 = 1000;
        let chapters: Vec<_> = derived.into_vec();
        let mut durations = Vec::with_capacity(chapters.len());
        for (i, chapter) in chapters.iter().enumerate() {
            let next_start_ms = chapters.get(i + 1).map(|c| c.start.as_millis());
            let end_ms = next_start_ms.unwrap_or_else(|| {
                (movie_duration as f64 / movie_timescale.max(1) as f64 * 1000.0) as u64
            });
            let duration_ticks = end_ms.saturating_sub(chapter.start.as_millis()).max(1);
            durations.push(duration_ticks);
        }

        for chapter in &chapters {
            let sample = encode_chapter_sample(&chapter.title, chapter.url.as_deref());
            chapter_samples.push(sample.bytes);
        }

        let sizes: Vec<u32> = chapter_samples.iter().map(|s| s.len() as u32).collect();
        let media_duration_ticks: u64 = durations.iter().sum();

        let stbl = Atom::container(
            *b"stbl",
            vec![
                build_text_stsd(),
                build_stts(&durations),
                build_stsc_one_sample_per_chunk(chapters.len()),
                build_stsz(&sizes),
                build_stco_placeholder(chapters.len()),
            ],
        );

        let minf = Atom::container(
            *b"minf",
            vec![build_gmhd(), Atom::container(*b"dinf", vec![build_dref_self_contained()]), stbl],
        );

        let mdia = Atom::container(
            *b"mdia",
            vec![build_mdhd(MEDIA_TIMESCALE, media_duration_ticks), build_hdlr(b"text", "ChapterHandler"), minf],
        );

        let chapter_trak =
            Atom::container(*b"trak", vec![build_tkhd(chapter_track_id, movie_duration), mdia]);

        // The chapter `trak` is the first new track appended after `mvhd` and the retained
        // tracks; its `stco` lives inside `mdia/minf/stbl`, found by byte-scanning the serialized
        // bytes once the whole tree (including this `trak`) has been flattened.
        new_children.push(chapter_trak);

        if let Some(artwork_track_id) = artwork_track_id {
            let art_entries: Vec<(&audiotag_core::model::Chapter, u64)> = chapters
                .iter()
                .zip(durations.iter().copied())
                .filter(|(c, _)| c.artwork.is_some())
                .collect();

            let art_sizes: Vec<u32> =
                art_entries.iter().map(|(c, _)| c.artwork.as_ref().unwrap().bytes().len() as u32).collect();
            let art_durations: Vec<u64> = art_entries.iter().map(|(_, d)| *d).collect();
            artwork_samples =
                art_entries.iter().map(|(c, _)| c.artwork.as_ref().unwrap().bytes().to_vec()).collect();

            let art_format = art_entries[0].0.artwork.as_ref().unwrap().format();
            let art_media_duration: u64 = art_durations.iter().sum();

            let art_stbl = Atom::container(
                *b"stbl",
                vec![
                    build_video_stsd(art_format),
                    build_stts(&art_durations),
                    build_stsc_one_sample_per_chunk(art_entries.len()),
                    build_stsz(&art_sizes),
                    build_stco_placeholder(art_entries.len()),
                ],
            );

            let art_minf = Atom::container(
                *b"minf",
                vec![build_gmhd(), Atom::container(*b"dinf", vec![build_dref_self_contained()]), art_stbl],
            );

            let art_mdia = Atom::container(
                *b"mdia",
                vec![
                    build_mdhd(MEDIA_TIMESCALE, art_media_duration),
                    build_hdlr(b"vide", "ChapterArtHandler"),
                    art_minf,
                ],
            );

            let art_trak =
                Atom::container(*b"trak", vec![build_tkhd(artwork_track_id, movie_duration), art_mdia]);

            new_children.push(art_trak);
        }
    }

    let meta_ilst = build_ilst(&info.metadata);
    let meta_payload_prefix = {
        let mut w = ByteWriter::new();
        w.write_u32(0);
        w
    };
    let mut meta_body_bytes = ByteWriter::new();
    meta_body_bytes.write_bytes(meta_payload_prefix.as_slice());
    meta_ilst.write(&mut meta_body_bytes);
    let meta_atom = Atom::leaf(*b"meta", meta_body_bytes.into_bytes());

    let mut udta_children = Vec::new();
    if has_chapters {
        udta_children.push(build_chpl(&info.chapters));
    }
    udta_children.push(meta_atom);
    new_children.push(Atom::container(*b"udta", udta_children));

    let new_moov = Atom::container(*b"moov", new_children);
    let moov_bytes = new_moov.to_bytes();

    if has_chapters {
        chapter_stco_offset = find_nth_stco_offset(&moov_bytes, 0);
        if artwork_track_id.is_some() {
            artwork_stco_offset = find_nth_stco_offset(&moov_bytes, 1);
        }
    }

    Ok(RebuildResult {
        moov_bytes,
        chapter_samples,
        chapter_stco_offset,
        artwork_samples,
        artwork_stco_offset,
    })
}

/// Finds the byte offset of the `n`-th `stco` fourcc occurrence in `buf` (0-indexed).
fn find_nth_stco_offset(buf: &[u8], n: usize) -> Option<usize> {
    let mut seen = 0usize;
    let mut i = 0usize;
    while i + 4 <= buf.len() {
        if &buf[i..i + 4] == b"stco" {
            if seen == n {
                return Some(i);
            }
            seen += 1;
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiotag_core::model::{AudioMetadata, Chapter, ChapterList};

    fn sample_mvhd() -> Atom {
        let mut p = ByteWriter::new();
        p.write_u8(0);
        p.write_u24(0);
        p.write_u32(0);
        p.write_u32(0);
        p.write_u32(1000); // timescale
        p.write_u32(10_000); // duration (10s)
        Atom::leaf(*b"mvhd", p.into_bytes())
    }

    fn sample_audio_trak(id: u32) -> Atom {
        let hdlr = build_hdlr(b"soun", "SoundHandler");
        let mdia = Atom::container(*b"mdia", vec![hdlr]);
        Atom::container(*b"trak", vec![build_tkhd(id, 10_000), mdia])
    }

    #[test]
    fn rebuild_adds_chapter_track_and_samples() {
        let moov = Atom::container(*b"moov", vec![sample_mvhd(), sample_audio_trak(1)]);
        let mut chapters = ChapterList::new();
        chapters.append(Chapter::new("a", AudioTimestamp::from_millis(0), "Intro"));
        chapters.append(Chapter::new("b", AudioTimestamp::from_millis(5000), "Body"));

        let info = AudioFileInfo { metadata: AudioMetadata::new(), chapters, duration: Some(AudioTimestamp::from_millis(10_000)) };
        let result = rebuild(&moov, &info).unwrap();

        assert_eq!(result.chapter_samples.len(), 2);
        assert!(result.chapter_stco_offset.is_some());
        assert!(result.moov_bytes.windows(4).any(|w| w == b"trak"));
    }

    #[test]
    fn rebuild_adds_artwork_track_when_chapters_carry_artwork() {
        use audiotag_core::model::Artwork;

        let moov = Atom::container(*b"moov", vec![sample_mvhd(), sample_audio_trak(1)]);
        let mut chapters = ChapterList::new();
        let jpeg = Artwork::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();
        let mut a = Chapter::new("a", AudioTimestamp::from_millis(0), "Intro");
        a.artwork = Some(jpeg.clone());
        let mut b = Chapter::new("b", AudioTimestamp::from_millis(5000), "Body");
        b.artwork = Some(jpeg);
        chapters.append(a);
        chapters.append(b);

        let info = AudioFileInfo { metadata: AudioMetadata::new(), chapters, duration: Some(AudioTimestamp::from_millis(10_000)) };
        let result = rebuild(&moov, &info).unwrap();

        assert_eq!(result.artwork_samples.len(), 2);
        assert!(result.artwork_stco_offset.is_some());
        assert!(result.moov_bytes.windows(4).any(|w| w == b"vide"));
    }

    #[test]
    fn rebuild_without_chapters_has_no_samples() {
        let moov = Atom::container(*b"moov", vec![sample_mvhd(), sample_audio_trak(1)]);
        let info = AudioFileInfo { metadata: AudioMetadata::new(), chapters: ChapterList::new(), duration: None };
        let result = rebuild(&moov, &info).unwrap();
        assert!(result.chapter_samples.is_empty());
        assert!(result.chapter_stco_offset.is_none());
    }
}

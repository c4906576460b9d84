// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Top-level `read`/`write`/`modify`/`strip` entry points for the MP4 atom codec: always an
//! atomic rewrite on write, since `moov` precedes `mdat` and `mdat`'s own chunk offsets depend on
//! the final size of the rebuilt `moov`.

use std::path::Path;

use log::trace;

use audiotag_core::errors::{AudioTagError, Mp4Error, Result};
use audiotag_core::io::{ByteWriter, FileReader, FileWriter};
use audiotag_core::model::{AudioFileInfo, AudioTimestamp};

use crate::atom::{self, Atom, TopLevelAtom};
use crate::chapters::{read_chpl, read_qt_text_chapters};
use crate::fixup::{apply_chunk_offset_delta, patch_stco_entry};
use crate::metadata::ilst_to_metadata;
use crate::moov::{self, rebuild};

struct Layout {
    ftyp: TopLevelAtom,
    moov: TopLevelAtom,
    mdat: TopLevelAtom,
}

fn locate(reader: &mut FileReader) -> Result<Layout> {
    let atoms = atom::scan_top_level(reader)?;
    let ftyp = *atom::find(&atoms, b"ftyp").ok_or(AudioTagError::Mp4(Mp4Error::AtomNotFound("ftyp")))?;
    atom::validate_ftyp(reader, &ftyp)?;
    let moov = *atom::find(&atoms, b"moov").ok_or(AudioTagError::Mp4(Mp4Error::AtomNotFound("moov")))?;
    let mdat = *atom::find(&atoms, b"mdat").ok_or(AudioTagError::Mp4(Mp4Error::AtomNotFound("mdat")))?;
    Ok(Layout { ftyp, moov, mdat })
}

fn parse_moov(reader: &mut FileReader, moov: &TopLevelAtom) -> Result<Atom> {
    let payload = reader.read(moov.payload_offset(), moov.payload_size())?;
    let children = crate::atom::parse_container(&payload, false)?;
    Ok(Atom::container(moov.fourcc, children))
}

fn existing_chapters(reader: &mut FileReader, moov_tree: &Atom) -> Result<audiotag_core::model::ChapterList> {
    let chpl_chapters = read_chpl(moov_tree.find(b"udta"))?;
    if !chpl_chapters.is_empty() {
        return Ok(chpl_chapters);
    }
    read_qt_text_chapters(reader, moov_tree)
}

/// Reads tag metadata, chapters, and duration from an MP4/M4A/M4B/AAX file.
pub fn read(path: &Path) -> Result<AudioFileInfo> {
    let mut reader = FileReader::open(path)?;
    let layout = locate(&mut reader)?;
    let moov_tree = parse_moov(&mut reader, &layout.moov)?;

    let metadata = moov_tree
        .walk(&[*b"udta", *b"meta", *b"ilst"])
        .map(ilst_to_metadata)
        .unwrap_or_default();

    let chapters = existing_chapters(&mut reader, &moov_tree)?;
    let duration = moov::movie_duration_seconds(&moov_tree).map(AudioTimestamp::from_seconds);

    Ok(AudioFileInfo { metadata, chapters, duration })
}

/// Overwrites the file's metadata and chapters with `info`, discarding anything not representable
/// by it (unrecognized `ilst` entries included).
pub fn write(info: &AudioFileInfo, path: &Path, buffer_size: usize) -> Result<()> {
    rewrite(info, path, buffer_size)
}

/// Like [`write`], but preserves `ilst` entries this codec doesn't recognize.
pub fn modify(info: &AudioFileInfo, path: &Path, buffer_size: usize) -> Result<()> {
    let mut reader = FileReader::open(path)?;
    let layout = locate(&mut reader)?;
    let moov_tree = parse_moov(&mut reader, &layout.moov)?;
    drop(reader);

    let mut merged = info.clone();
    fill_unset_fields_from_existing(&mut merged, &moov_tree);
    rewrite(&merged, path, buffer_size)
}

/// `AudioFileInfo` has no slot for raw unrecognized atoms, so "preservation" on modify means: any
/// scalar field `info` left unset falls back to what the file already had, rather than being
/// cleared, and custom-text keys merge rather than replace.
fn fill_unset_fields_from_existing(info: &mut AudioFileInfo, existing_moov: &Atom) {
    if let Some(ilst) = existing_moov.walk(&[*b"udta", *b"meta", *b"ilst"]) {
        let existing = ilst_to_metadata(ilst);
        macro_rules! fallback {
            ($field:ident) => {
                if info.metadata.$field.is_none() {
                    info.metadata.$field = existing.$field.clone();
                }
            };
        }
        fallback!(title);
        fallback!(artist);
        fallback!(album);
        fallback!(genre);
        fallback!(year);
        fallback!(composer);
        fallback!(comment);
        fallback!(encoder);
        fallback!(unsynchronized_lyrics);
        fallback!(album_artist);
        fallback!(copyright);
        fallback!(track_number);
        fallback!(disc_number);
        fallback!(bpm);
        if info.metadata.artwork.is_none() {
            info.metadata.artwork = existing.artwork.clone();
        }
        for (k, v) in existing.custom_text {
            info.metadata.custom_text.entry(k).or_insert(v);
        }
    }
}

/// Removes all metadata and chapters: unlike the ID3v2 codec, MP4 strip drops `udta` and every
/// chapter track rather than preserving them.
pub fn strip(path: &Path, buffer_size: usize) -> Result<()> {
    let info = AudioFileInfo::default();
    rewrite(&info, path, buffer_size)
}

fn rewrite(info: &AudioFileInfo, path: &Path, buffer_size: usize) -> Result<()> {
    let mut reader = FileReader::open(path)?;
    let layout = locate(&mut reader)?;
    let moov_tree = parse_moov(&mut reader, &layout.moov)?;

    let mut result = rebuild(&moov_tree, info)?;
    let delta = result.moov_bytes.len() as i64 - layout.moov.size as i64;
    apply_chunk_offset_delta(&mut result.moov_bytes, delta);

    let ftyp_bytes = reader.read(layout.ftyp.offset, layout.ftyp.size)?;
    let original_audio_size = layout.mdat.payload_size();
    let trailing_samples_size: u64 = result.chapter_samples.iter().map(|s| s.len() as u64).sum::<u64>()
        + result.artwork_samples.iter().map(|s| s.len() as u64).sum::<u64>();
    let new_mdat_payload_size = original_audio_size + trailing_samples_size;
    let new_mdat_size = 8 + new_mdat_payload_size;

    let mdat_payload_start = ftyp_bytes.len() as u64 + result.moov_bytes.len() as u64 + 8;
    let mut cumulative = mdat_payload_start + original_audio_size;

    if let Some(stco_offset) = result.chapter_stco_offset {
        let mut running = cumulative;
        for (i, sample) in result.chapter_samples.iter().enumerate() {
            patch_stco_entry(&mut result.moov_bytes, stco_offset, i, running);
            running += sample.len() as u64;
        }
    }
    cumulative += result.chapter_samples.iter().map(|s| s.len() as u64).sum::<u64>();

    if let Some(stco_offset) = result.artwork_stco_offset {
        let mut running = cumulative;
        for (i, sample) in result.artwork_samples.iter().enumerate() {
            patch_stco_entry(&mut result.moov_bytes, stco_offset, i, running);
            running += sample.len() as u64;
        }
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let sidecar = tempfile::Builder::new()
        .prefix(".audiotag-")
        .tempfile_in(dir)
        .map_err(AudioTagError::from)?;
    let sidecar_path = sidecar.path().to_path_buf();

    let write_result = (|| -> Result<()> {
        let mut writer = FileWriter::create(&sidecar_path)?;
        writer.append(&ftyp_bytes)?;
        writer.append(&result.moov_bytes)?;

        let mut mdat_header = ByteWriter::new();
        if new_mdat_size > u32::MAX as u64 {
            mdat_header.write_u32(1);
            mdat_header.write_bytes(b"mdat");
            mdat_header.write_u64(new_mdat_size);
        } else {
            mdat_header.write_u32(new_mdat_size as u32);
            mdat_header.write_bytes(b"mdat");
        }
        writer.append(mdat_header.as_slice())?;

        trace!("mp4: streaming {original_audio_size} bytes of original audio payload");
        writer.copy_chunked(&mut reader, layout.mdat.payload_offset(), original_audio_size, buffer_size)?;

        for sample in &result.chapter_samples {
            writer.append(sample)?;
        }
        for sample in &result.artwork_samples {
            writer.append(sample)?;
        }

        writer.synchronize()
    })();

    match write_result {
        Ok(()) => {
            sidecar.persist(path).map_err(|e| AudioTagError::from(e.error))?;
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
    use crate::atom::{build_leaf, Atom as RawAtom};
    use audiotag_core::io::DEFAULT_BUFFER_SIZE;
    use audiotag_core::model::{Chapter, ChapterList};
    use std::io::Write as _;

    fn sample_mvhd() -> RawAtom {
        let mut p = ByteWriter::new();
        p.write_u8(0);
        p.write_u24(0);
        p.write_u32(0);
        p.write_u32(0);
        p.write_u32(1000); // timescale
        p.write_u32(5000); // duration (5s)
        RawAtom::leaf(*b"mvhd", p.into_bytes())
    }

    fn sample_audio_trak() -> RawAtom {
        let mut hdlr = ByteWriter::new();
        hdlr.write_u32(0);
        hdlr.write_u32(0);
        hdlr.write_bytes(b"soun");
        hdlr.write_fill(0, 12);
        hdlr.write_u8(0);
        let mdia = RawAtom::container(*b"mdia", vec![RawAtom::leaf(*b"hdlr", hdlr.into_bytes())]);

        let mut tkhd = ByteWriter::new();
        tkhd.write_u8(0);
        tkhd.write_u24(0);
        tkhd.write_u32(0);
        tkhd.write_u32(0);
        tkhd.write_u32(1);
        tkhd.write_u32(0);
        tkhd.write_u32(5000);

        RawAtom::container(*b"trak", vec![RawAtom::leaf(*b"tkhd", tkhd.into_bytes()), mdia])
    }

    fn synthetic_m4a(audio: &[u8]) -> tempfile::NamedTempFile {
        let ftyp = build_leaf(b"ftyp", b"M4A \x00\x00\x00\x00M4A mp42isom");
        let moov = RawAtom::container(*b"moov", vec![sample_mvhd(), sample_audio_trak()]).to_bytes();

        let mut mdat = Vec::new();
        mdat.extend_from_slice(&(8 + audio.len() as u32).to_be_bytes());
        mdat.extend_from_slice(b"mdat");
        mdat.extend_from_slice(audio);

        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&ftyp).unwrap();
        f.write_all(&moov).unwrap();
        f.write_all(&mdat).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_duration_from_synthetic_file() {
        let tmp = synthetic_m4a(b"audio-bytes");
        let info = read(tmp.path()).unwrap();
        assert!((info.duration.unwrap().as_seconds() - 5.0).abs() < 0.001);
    }

    #[test]
    fn write_then_read_round_trips_title_and_adds_chapter_track() {
        let tmp = synthetic_m4a(b"audio-bytes-0123456789");
        let mut info = read(tmp.path()).unwrap();
        info.metadata.title = Some("My Title".to_string());
        info.chapters = ChapterList::from_vec(vec![
            Chapter::new("a", AudioTimestamp::from_millis(0), "Intro"),
            Chapter::new("b", AudioTimestamp::from_millis(2000), "Body"),
        ]);

        write(&info, tmp.path(), DEFAULT_BUFFER_SIZE).unwrap();

        let back = read(tmp.path()).unwrap();
        assert_eq!(back.metadata.title.as_deref(), Some("My Title"));
        assert_eq!(back.chapters.len(), 2);
    }

    #[test]
    fn strip_clears_metadata_and_chapters() {
        let tmp = synthetic_m4a(b"audio-bytes-0123456789");
        let mut info = read(tmp.path()).unwrap();
        info.metadata.title = Some("Has Title".to_string());
        info.chapters = ChapterList::from_vec(vec![Chapter::new("a", AudioTimestamp::from_millis(0), "Intro")]);
        write(&info, tmp.path(), DEFAULT_BUFFER_SIZE).unwrap();

        strip(tmp.path(), DEFAULT_BUFFER_SIZE).unwrap();

        let back = read(tmp.path()).unwrap();
        assert!(back.metadata.title.is_none());
        assert!(back.chapters.is_empty());
    }
}

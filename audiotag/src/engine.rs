// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The public engine façade: `read`/`write`/`modify`/`strip`/`read_chapters`/`write_chapters`/
//! `export_chapters`/`import_chapters`/`detect_format`, routed through the format dispatcher to
//! whichever container codec is enabled.

use std::path::Path;

use audiotag_core::config::EngineOptions;
use audiotag_core::errors::{AudioTagError, EngineError, Result};
use audiotag_core::model::{AudioFileInfo, ChapterList};

use crate::adapter::AdapterRegistry;
use crate::format::{detect_format, AudioFormat};

fn feature_disabled<T>(feature: &'static str) -> Result<T> {
    Err(AudioTagError::Engine(EngineError::UnsupportedFormat(format!("the '{feature}' feature is disabled"))))
}

/// Hides container selection behind one set of operations. Stateless beyond its options and its
/// chapter-interchange adapter registry; safe to share across concurrent calls on disjoint paths
/// (see §5 of the design: no internal state is shared between calls).
pub struct Engine {
    options: EngineOptions,
    adapters: AdapterRegistry,
}

impl Default for Engine {
    fn default() -> Self {
        Engine { options: EngineOptions::default(), adapters: AdapterRegistry::default() }
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Engine { options: options.normalized(), adapters: AdapterRegistry::new() }
    }

    /// Registers an external chapter-interchange adapter under `format`, replacing any adapter
    /// already registered for that tag.
    pub fn register_adapter(&mut self, format: impl Into<String>, adapter: Box<dyn crate::adapter::ChapterFormatAdapter>) {
        self.adapters.register(format, adapter);
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn detect_format(&self, path: &Path) -> Result<AudioFormat> {
        detect_format(path)
    }

    pub fn read(&self, path: &Path) -> Result<AudioFileInfo> {
        match detect_format(path)? {
            AudioFormat::Mp3 => Self::read_mp3(path),
            AudioFormat::M4a => Self::read_mp4(path),
        }
    }

    pub fn write(&self, info: &AudioFileInfo, path: &Path) -> Result<()> {
        match detect_format(path)? {
            AudioFormat::Mp3 => self.write_mp3(info, path),
            AudioFormat::M4a => self.write_mp4(info, path),
        }
    }

    /// Merges with the existing tag/atom structure, preserving unknown frames or atoms.
    pub fn modify(&self, info: &AudioFileInfo, path: &Path) -> Result<()> {
        match detect_format(path)? {
            AudioFormat::Mp3 => self.modify_mp3(info, path),
            AudioFormat::M4a => self.modify_mp4(info, path),
        }
    }

    /// Removes metadata. Preserves chapters on MP3; removes `udta` and chapter tracks on MP4.
    pub fn strip(&self, path: &Path) -> Result<()> {
        match detect_format(path)? {
            AudioFormat::Mp3 => self.strip_mp3(path),
            AudioFormat::M4a => self.strip_mp4(path),
        }
    }

    pub fn read_chapters(&self, path: &Path) -> Result<ChapterList> {
        Ok(self.read(path)?.chapters)
    }

    /// Equivalent to `modify` with chapters replaced; an empty list removes chapters.
    pub fn write_chapters(&self, chapters: ChapterList, path: &Path) -> Result<()> {
        let mut info = self.read(path)?;
        info.chapters = chapters;
        self.modify(&info, path)
    }

    pub fn export_chapters(&self, path: &Path, format: &str) -> Result<String> {
        let chapters = self.read_chapters(path)?;
        self.adapters.export(format, &chapters)
    }

    pub fn import_chapters(&self, text: &str, format: &str, path: &Path) -> Result<()> {
        let chapters = self.adapters.import(format, text)?;
        self.write_chapters(chapters, path)
    }

    #[cfg(feature = "id3v2")]
    fn read_mp3(path: &Path) -> Result<AudioFileInfo> {
        audiotag_id3v2::read(path)
    }

    #[cfg(not(feature = "id3v2"))]
    fn read_mp3(_path: &Path) -> Result<AudioFileInfo> {
        feature_disabled("id3v2")
    }

    #[cfg(feature = "mp4")]
    fn read_mp4(path: &Path) -> Result<AudioFileInfo> {
        audiotag_mp4::read(path)
    }

    #[cfg(not(feature = "mp4"))]
    fn read_mp4(_path: &Path) -> Result<AudioFileInfo> {
        feature_disabled("mp4")
    }

    #[cfg(feature = "id3v2")]
    fn write_mp3(&self, info: &AudioFileInfo, path: &Path) -> Result<()> {
        audiotag_id3v2::write(info, path, self.options.id3v2_version, self.options.default_padding, self.options.chunk_buffer_size)
    }

    #[cfg(not(feature = "id3v2"))]
    fn write_mp3(&self, _info: &AudioFileInfo, _path: &Path) -> Result<()> {
        feature_disabled("id3v2")
    }

    #[cfg(feature = "mp4")]
    fn write_mp4(&self, info: &AudioFileInfo, path: &Path) -> Result<()> {
        audiotag_mp4::write(info, path, self.options.chunk_buffer_size)
    }

    #[cfg(not(feature = "mp4"))]
    fn write_mp4(&self, _info: &AudioFileInfo, _path: &Path) -> Result<()> {
        feature_disabled("mp4")
    }

    #[cfg(feature = "id3v2")]
    fn modify_mp3(&self, info: &AudioFileInfo, path: &Path) -> Result<()> {
        audiotag_id3v2::modify(info, path, self.options.id3v2_version, self.options.default_padding, self.options.chunk_buffer_size)
    }

    #[cfg(not(feature = "id3v2"))]
    fn modify_mp3(&self, _info: &AudioFileInfo, _path: &Path) -> Result<()> {
        feature_disabled("id3v2")
    }

    #[cfg(feature = "mp4")]
    fn modify_mp4(&self, info: &AudioFileInfo, path: &Path) -> Result<()> {
        audiotag_mp4::modify(info, path, self.options.chunk_buffer_size)
    }

    #[cfg(not(feature = "mp4"))]
    fn modify_mp4(&self, _info: &AudioFileInfo, _path: &Path) -> Result<()> {
        feature_disabled("mp4")
    }

    #[cfg(feature = "id3v2")]
    fn strip_mp3(&self, path: &Path) -> Result<()> {
        audiotag_id3v2::strip(path, self.options.id3v2_version, self.options.chunk_buffer_size)
    }

    #[cfg(not(feature = "id3v2"))]
    fn strip_mp3(&self, _path: &Path) -> Result<()> {
        feature_disabled("id3v2")
    }

    #[cfg(feature = "mp4")]
    fn strip_mp4(&self, path: &Path) -> Result<()> {
        audiotag_mp4::strip(path, self.options.chunk_buffer_size)
    }

    #[cfg(not(feature = "mp4"))]
    fn strip_mp4(&self, _path: &Path) -> Result<()> {
        feature_disabled("mp4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiotag_core::model::{AudioTimestamp, Chapter};
    use std::io::Write as _;

    #[cfg(feature = "mp4")]
    fn synthetic_m4a() -> tempfile::NamedTempFile {
        use audiotag_mp4::Atom;
        let ftyp = {
            let mut b = Vec::new();
            b.extend_from_slice(&20u32.to_be_bytes());
            b.extend_from_slice(b"ftyp");
            b.extend_from_slice(b"M4A \x00\x00\x00\x00M4A ");
            b
        };
        let mvhd_payload = {
            let mut p = Vec::new();
            p.extend_from_slice(&[0, 0, 0, 0]);
            p.extend_from_slice(&[0; 8]);
            p.extend_from_slice(&1000u32.to_be_bytes());
            p.extend_from_slice(&5000u32.to_be_bytes());
            p
        };
        let mvhd = Atom::leaf(*b"mvhd", mvhd_payload);
        let moov = Atom::container(*b"moov", vec![mvhd]).to_bytes();

        let audio = b"0123456789audio-bytes";
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

    #[test]
    fn read_chapters_on_tagless_mp3_reports_no_tag() {
        let mut f = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        f.write_all(b"not an id3 tag at all").unwrap();
        f.flush().unwrap();

        let engine = Engine::default();
        assert!(engine.read_chapters(f.path()).is_err());
    }

    #[test]
    fn export_chapters_without_a_registered_adapter_fails() {
        let mut f = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        // A minimal ID3v2.4 header: "ID3", version 4.0, flags 0, syncsafe size 0.
        f.write_all(b"ID3\x04\x00\x00\x00\x00\x00\x00").unwrap();
        f.flush().unwrap();

        let engine = Engine::default();
        assert!(engine.export_chapters(f.path(), "lrc").is_err());
    }

    #[cfg(feature = "mp4")]
    #[test]
    fn write_chapters_empty_list_removes_chapters_on_mp4() {
        let tmp = synthetic_m4a();
        let engine = Engine::default();

        let mut chapters = ChapterList::new();
        chapters.append(Chapter::new("a", AudioTimestamp::from_millis(0), "Intro"));
        engine.write_chapters(chapters, tmp.path()).unwrap();
        assert_eq!(engine.read_chapters(tmp.path()).unwrap().len(), 1);

        engine.write_chapters(ChapterList::new(), tmp.path()).unwrap();
        assert!(engine.read_chapters(tmp.path()).unwrap().is_empty());
    }
}

// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # audiotag
//!
//! A unified read/write/strip engine for metadata and chapter markers carried by ID3v2-tagged
//! MPEG audio files and ISO BMFF (MP4/M4A/M4B/AAX) files.
//!
//! ```no_run
//! use audiotag::Engine;
//! use std::path::Path;
//!
//! let engine = Engine::default();
//! let mut info = engine.read(Path::new("episode.m4a"))?;
//! info.metadata.title = Some("Episode One".to_string());
//! engine.modify(&info, Path::new("episode.m4a"))?;
//! # Ok::<(), audiotag_core::errors::AudioTagError>(())
//! ```
//!
//! Container support is feature-gated: `id3v2` enables MP3/ID3v2, `mp4` enables the MP4 atom
//! codec. Both are on by default.

mod adapter;
mod engine;
mod format;

pub use adapter::{AdapterRegistry, ChapterFormatAdapter, RECOGNIZED_FORMAT_TAGS};
pub use engine::Engine;
pub use format::{detect_format, AudioFormat};

pub use audiotag_core::config::{EngineOptions, Id3v2Version};
pub use audiotag_core::errors::{AudioTagError, Result};
pub use audiotag_core::model::{AudioFileInfo, AudioMetadata, AudioTimestamp, Artwork, Chapter, ChapterList};

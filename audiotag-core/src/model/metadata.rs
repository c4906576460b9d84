// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`AudioMetadata`] and [`AudioFileInfo`]: the container-agnostic scalar record plus chapters.

use std::collections::HashMap;

use super::{Artwork, AudioTimestamp, ChapterList, SynchronizedLyrics};

/// Opaque binary data tagged with an owner identifier (ID3v2 `PRIV`).
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateData {
    pub owner: String,
    pub data: Vec<u8>,
}

/// Opaque binary data tagged with an owner identifier (ID3v2 `UFID`).
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueFileIdentifier {
    pub owner: String,
    pub data: Vec<u8>,
}

/// The closed set of typed URL slots an `AudioMetadata` carries alongside its custom URL map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    Artist,
    AudioSource,
    AudioFile,
    Publisher,
    Commercial,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub composer: Option<String>,
    pub album_artist: Option<String>,
    pub publisher: Option<String>,
    pub copyright: Option<String>,
    pub encoder: Option<String>,
    pub comment: Option<String>,
    pub bpm: Option<u32>,
    pub key: Option<String>,
    pub language: Option<String>,
    pub isrc: Option<String>,

    pub artwork: Option<Artwork>,
    pub unsynchronized_lyrics: Option<String>,
    pub synchronized_lyrics: Vec<SynchronizedLyrics>,

    pub urls: HashMap<UrlKind, String>,
    pub custom_urls: HashMap<String, String>,
    pub custom_text: HashMap<String, String>,

    pub private_data: Vec<PrivateData>,
    pub unique_file_identifiers: Vec<UniqueFileIdentifier>,

    pub play_count: Option<u64>,
    /// 0-255, matching the ID3v2 `POPM` rating byte.
    pub rating: Option<u8>,
}

impl AudioMetadata {
    pub fn new() -> Self {
        AudioMetadata::default()
    }
}

/// [`AudioMetadata`] plus a [`ChapterList`] plus an optional total duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFileInfo {
    pub metadata: AudioMetadata,
    pub chapters: ChapterList,
    pub duration: Option<AudioTimestamp>,
}

impl AudioFileInfo {
    pub fn new() -> Self {
        AudioFileInfo::default()
    }
}

// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`SynchronizedLyrics`] and its line/segment/content-type types.

use super::AudioTimestamp;

/// Closed set matching the ID3v2 SYLT content-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricContentType {
    Other,
    Lyrics,
    TextTranscription,
    MovementOrPartName,
    Events,
    Chord,
    Trivia,
    WebpageUrls,
    ImageUrls,
}

impl LyricContentType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(LyricContentType::Other),
            1 => Some(LyricContentType::Lyrics),
            2 => Some(LyricContentType::TextTranscription),
            3 => Some(LyricContentType::MovementOrPartName),
            4 => Some(LyricContentType::Events),
            5 => Some(LyricContentType::Chord),
            6 => Some(LyricContentType::Trivia),
            7 => Some(LyricContentType::WebpageUrls),
            8 => Some(LyricContentType::ImageUrls),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            LyricContentType::Other => 0,
            LyricContentType::Lyrics => 1,
            LyricContentType::TextTranscription => 2,
            LyricContentType::MovementOrPartName => 3,
            LyricContentType::Events => 4,
            LyricContentType::Chord => 5,
            LyricContentType::Trivia => 6,
            LyricContentType::WebpageUrls => 7,
            LyricContentType::ImageUrls => 8,
        }
    }
}

/// A word-level timing within a [`LyricLine`].
#[derive(Debug, Clone, PartialEq)]
pub struct LyricSegment {
    pub timestamp: AudioTimestamp,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    pub timestamp: AudioTimestamp,
    pub text: String,
    pub segments: Option<Vec<LyricSegment>>,
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynchronizedLyrics {
    /// ISO 639-2 three-character language code.
    pub language: String,
    pub content_type: LyricContentType,
    pub descriptor: String,
    pub lines: Vec<LyricLine>,
}

// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The container-agnostic domain model: the types every codec reads into and writes from.

mod artwork;
mod chapter;
mod lyrics;
mod metadata;
mod timestamp;

pub use artwork::{Artwork, ArtworkFormat};
pub use chapter::{Chapter, ChapterList};
pub use lyrics::{LyricContentType, LyricLine, LyricSegment, SynchronizedLyrics};
pub use metadata::{AudioFileInfo, AudioMetadata, PrivateData, UniqueFileIdentifier, UrlKind};
pub use timestamp::AudioTimestamp;

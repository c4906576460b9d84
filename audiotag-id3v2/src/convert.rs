// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame list ↔ domain model conversion, in both directions.

use log::debug;

use audiotag_core::model::{
    Artwork, AudioFileInfo, AudioMetadata, AudioTimestamp, Chapter, ChapterList, LyricContentType,
    LyricLine, PrivateData, SynchronizedLyrics, UniqueFileIdentifier, UrlKind,
};

use crate::frame::Frame;
use audiotag_core::config::Id3v2Version;

fn leading_component(value: &str) -> Option<u32> {
    value.split('/').next()?.trim().parse().ok()
}

fn leading_year(value: &str) -> Option<String> {
    let digits: String = value.chars().take(4).collect();
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

fn url_kind_for_id(id: &str) -> Option<UrlKind> {
    match id {
        "WOAR" => Some(UrlKind::Artist),
        "WOAS" => Some(UrlKind::AudioSource),
        "WOAF" => Some(UrlKind::AudioFile),
        "WPUB" => Some(UrlKind::Publisher),
        "WCOM" => Some(UrlKind::Commercial),
        _ => None,
    }
}

/// Converts a `CHAP` frame's sub-frame list into a [`Chapter`].
fn chapter_from_sub_frames(element_id: &str, start_ms: u32, end_ms: u32, sub_frames: &[Frame]) -> Chapter {
    let mut chapter = Chapter::new(element_id, AudioTimestamp::from_millis(start_ms as u64), element_id);
    chapter.end = Some(AudioTimestamp::from_millis(end_ms as u64));

    for sub in sub_frames {
        match sub {
            Frame::Text { id, value } if id == "TIT2" => chapter.title = value.clone(),
            Frame::Url { value, .. } if chapter.url.is_none() => chapter.url = Some(value.clone()),
            Frame::Picture { data, .. } if chapter.artwork.is_none() => {
                if let Ok(artwork) = Artwork::from_bytes(data.clone()) {
                    chapter.artwork = Some(artwork);
                }
            }
            _ => {}
        }
    }

    chapter
}

/// Builds a complete [`AudioFileInfo`] from a flat, already-parsed top-level frame list.
pub fn frames_to_info(frames: &[Frame]) -> AudioFileInfo {
    let mut metadata = AudioMetadata::new();
    let mut chapters = Vec::new();
    let mut toc: Option<(bool, Vec<String>)> = None;
    let mut duration = None;
    let mut first_artwork: Option<Artwork> = None;
    let mut cover_front_artwork: Option<Artwork> = None;

    for frame in frames {
        match frame {
            Frame::Text { id, value } => match id.as_str() {
                "TIT2" => metadata.title = Some(value.clone()),
                "TPE1" => metadata.artist = Some(value.clone()),
                "TALB" => metadata.album = Some(value.clone()),
                "TCON" => metadata.genre = Some(value.clone()),
                "TYER" => metadata.year = Some(value.clone()),
                "TDRC" => metadata.year = leading_year(value).or_else(|| Some(value.clone())),
                "TRCK" => metadata.track_number = leading_component(value),
                "TPOS" => metadata.disc_number = leading_component(value),
                "TPE2" => metadata.album_artist = Some(value.clone()),
                "TCOM" => metadata.composer = Some(value.clone()),
                "TPUB" => metadata.publisher = Some(value.clone()),
                "TCOP" => metadata.copyright = Some(value.clone()),
                "TENC" => metadata.encoder = Some(value.clone()),
                "TBPM" => metadata.bpm = value.trim().parse().ok(),
                "TKEY" => metadata.key = Some(value.clone()),
                "TLAN" => metadata.language = Some(value.clone()),
                "TSRC" => metadata.isrc = Some(value.clone()),
                "TLEN" => duration = value.trim().parse::<u64>().ok().map(AudioTimestamp::from_millis),
                _ => debug!("id3v2: unrecognized text frame '{id}' round-tripped as opaque"),
            },
            Frame::Url { id, value } => {
                if let Some(kind) = url_kind_for_id(id) {
                    metadata.urls.insert(kind, value.clone());
                }
            }
            Frame::UserText { description, value } => {
                metadata.custom_text.insert(description.clone(), value.clone());
            }
            Frame::UserUrl { description, value } => {
                metadata.custom_urls.insert(description.clone(), value.clone());
            }
            Frame::Comment { text, language, .. } => {
                metadata.comment = Some(text.clone());
                if metadata.language.is_none() {
                    metadata.language = Some(language.trim().to_string());
                }
            }
            Frame::UnsyncLyrics { text, .. } => {
                metadata.unsynchronized_lyrics = Some(text.clone());
            }
            Frame::SynchronizedLyrics { language, content_type, description, events } => {
                let lines = events
                    .iter()
                    .map(|e| LyricLine {
                        timestamp: AudioTimestamp::from_millis(e.timestamp_ms as u64),
                        text: e.text.clone(),
                        segments: None,
                        speaker: None,
                    })
                    .collect();
                metadata.synchronized_lyrics.push(SynchronizedLyrics {
                    language: language.trim().to_string(),
                    content_type: LyricContentType::from_byte(*content_type).unwrap_or(LyricContentType::Other),
                    descriptor: description.clone(),
                    lines,
                });
            }
            Frame::Picture { picture_type, data, .. } => {
                if let Ok(artwork) = Artwork::from_bytes(data.clone()) {
                    if first_artwork.is_none() {
                        first_artwork = Some(artwork.clone());
                    }
                    if *picture_type == 3 && cover_front_artwork.is_none() {
                        cover_front_artwork = Some(artwork);
                    }
                }
            }
            Frame::Chapter { element_id, start_ms, end_ms, sub_frames } => {
                chapters.push(chapter_from_sub_frames(element_id, *start_ms, *end_ms, sub_frames));
            }
            Frame::TableOfContents { ordered, children, .. } if toc.is_none() => {
                toc = Some((*ordered, children.clone()));
            }
            Frame::PrivateData { owner, data } => {
                metadata.private_data.push(PrivateData { owner: owner.clone(), data: data.clone() });
            }
            Frame::UniqueFileIdentifier { owner, data } => {
                metadata
                    .unique_file_identifiers
                    .push(UniqueFileIdentifier { owner: owner.clone(), data: data.clone() });
            }
            Frame::PlayCount(count) => metadata.play_count = Some(*count),
            Frame::Popularimeter { rating, .. } => metadata.rating = Some(*rating),
            Frame::Unknown { id, .. } => debug!("id3v2: unknown frame '{id}' round-tripped as opaque"),
            _ => {}
        }
    }

    metadata.artwork = cover_front_artwork.or(first_artwork);

    let mut chapter_list = ChapterList::from_vec(chapters);
    if let Some((ordered, children)) = toc {
        if ordered && children.len() == chapter_list.len() {
            let mut reordered = Vec::with_capacity(children.len());
            let mut remaining = chapter_list.into_vec();
            for child_id in &children {
                if let Some(pos) = remaining.iter().position(|c| &c.id == child_id) {
                    reordered.push(remaining.remove(pos));
                }
            }
            reordered.extend(remaining);
            chapter_list = ChapterList::from_vec(reordered);
        } else {
            chapter_list = ChapterList::from_vec(chapter_list.into_vec());
        }
    }

    AudioFileInfo { metadata, chapters: chapter_list, duration }
}

/// Builds the write-direction frame list from a complete [`AudioFileInfo`].
pub fn info_to_frames(info: &AudioFileInfo, version: Id3v2Version) -> Vec<Frame> {
    let mut frames = Vec::new();
    let m = &info.metadata;

    let mut push_text = |id: &str, value: &Option<String>| {
        if let Some(v) = value {
            frames.push(Frame::Text { id: id.to_string(), value: v.clone() });
        }
    };

    push_text("TIT2", &m.title);
    push_text("TPE1", &m.artist);
    push_text("TALB", &m.album);
    push_text("TCON", &m.genre);
    match version {
        Id3v2Version::V3 => push_text("TYER", &m.year),
        Id3v2Version::V4 => push_text("TDRC", &m.year),
    }
    if let Some(track) = m.track_number {
        frames.push(Frame::Text { id: "TRCK".to_string(), value: track.to_string() });
    }
    if let Some(disc) = m.disc_number {
        frames.push(Frame::Text { id: "TPOS".to_string(), value: disc.to_string() });
    }
    push_text("TPE2", &m.album_artist);
    push_text("TCOM", &m.composer);
    push_text("TPUB", &m.publisher);
    push_text("TCOP", &m.copyright);
    push_text("TENC", &m.encoder);
    if let Some(bpm) = m.bpm {
        frames.push(Frame::Text { id: "TBPM".to_string(), value: bpm.to_string() });
    }
    push_text("TKEY", &m.key);
    push_text("TLAN", &m.language);
    push_text("TSRC", &m.isrc);

    for (kind, value) in &m.urls {
        let id = match kind {
            UrlKind::Artist => "WOAR",
            UrlKind::AudioSource => "WOAS",
            UrlKind::AudioFile => "WOAF",
            UrlKind::Publisher => "WPUB",
            UrlKind::Commercial => "WCOM",
        };
        frames.push(Frame::Url { id: id.to_string(), value: value.clone() });
    }

    for (description, value) in &m.custom_text {
        frames.push(Frame::UserText { description: description.clone(), value: value.clone() });
    }
    for (description, value) in &m.custom_urls {
        frames.push(Frame::UserUrl { description: description.clone(), value: value.clone() });
    }

    if let Some(comment) = &m.comment {
        frames.push(Frame::Comment {
            language: m.language.clone().unwrap_or_else(|| "eng".to_string()),
            description: String::new(),
            text: comment.clone(),
        });
    }

    if let Some(lyrics) = &m.unsynchronized_lyrics {
        frames.push(Frame::UnsyncLyrics {
            language: m.language.clone().unwrap_or_else(|| "eng".to_string()),
            description: String::new(),
            text: lyrics.clone(),
        });
    }

    for sylt in &m.synchronized_lyrics {
        let events = sylt
            .lines
            .iter()
            .map(|line| crate::frame::SyltEvent { text: line.text.clone(), timestamp_ms: line.timestamp.as_millis() as u32 })
            .collect();
        frames.push(Frame::SynchronizedLyrics {
            language: sylt.language.clone(),
            content_type: sylt.content_type.to_byte(),
            description: sylt.descriptor.clone(),
            events,
        });
    }

    if let Some(artwork) = &m.artwork {
        frames.push(Frame::Picture {
            mime: artwork.format().mime_type().to_string(),
            picture_type: 3,
            description: String::new(),
            data: artwork.bytes().to_vec(),
        });
    }

    for private in &m.private_data {
        frames.push(Frame::PrivateData { owner: private.owner.clone(), data: private.data.clone() });
    }
    for ufid in &m.unique_file_identifiers {
        frames.push(Frame::UniqueFileIdentifier { owner: ufid.owner.clone(), data: ufid.data.clone() });
    }

    if let Some(play_count) = m.play_count {
        frames.push(Frame::PlayCount(play_count.min(u32::MAX as u64)));
    }
    if let Some(rating) = m.rating {
        frames.push(Frame::Popularimeter { email: String::new(), rating, play_count: 0 });
    }

    if !info.chapters.is_empty() {
        let derived = info.chapters.derive_end_times(info.duration);
        let children: Vec<String> = (0..derived.len()).map(|i| format!("chp{i}")).collect();
        frames.push(Frame::TableOfContents {
            element_id: "toc1".to_string(),
            ordered: true,
            top_level: true,
            children: children.clone(),
            sub_frames: Vec::new(),
        });

        for (index, chapter) in derived.iter().enumerate() {
            let mut sub_frames = vec![Frame::Text { id: "TIT2".to_string(), value: chapter.title.clone() }];
            if let Some(url) = &chapter.url {
                sub_frames.push(Frame::Url { id: "WOAR".to_string(), value: url.clone() });
            }
            if let Some(artwork) = &chapter.artwork {
                sub_frames.push(Frame::Picture {
                    mime: artwork.format().mime_type().to_string(),
                    picture_type: 3,
                    description: String::new(),
                    data: artwork.bytes().to_vec(),
                });
            }

            let start_ms = chapter.start.as_millis() as u32;
            let end_ms = chapter.end.map(|e| e.as_millis() as u32).unwrap_or(start_ms + 1);

            frames.push(Frame::Chapter { element_id: children[index].clone(), start_ms, end_ms, sub_frames });
        }
    }

    frames
}

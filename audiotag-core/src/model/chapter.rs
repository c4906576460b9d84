// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Chapter`] and [`ChapterList`].

use super::{Artwork, AudioTimestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub start: AudioTimestamp,
    pub end: Option<AudioTimestamp>,
    pub title: String,
    pub url: Option<String>,
    pub artwork: Option<Artwork>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, start: AudioTimestamp, title: impl Into<String>) -> Self {
        Chapter { id: id.into(), start, end: None, title: title.into(), url: None, artwork: None }
    }
}

/// An ordered sequence of chapters. Ordering is positional, not identity-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterList {
    chapters: Vec<Chapter>,
}

impl ChapterList {
    pub fn new() -> Self {
        ChapterList::default()
    }

    pub fn from_vec(chapters: Vec<Chapter>) -> Self {
        ChapterList { chapters }
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chapter> {
        self.chapters.iter()
    }

    pub fn as_slice(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn into_vec(self) -> Vec<Chapter> {
        self.chapters
    }

    pub fn append(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    pub fn insert(&mut self, index: usize, chapter: Chapter) {
        self.chapters.insert(index, chapter);
    }

    pub fn remove(&mut self, index: usize) -> Chapter {
        self.chapters.remove(index)
    }

    /// Stable sort by start time; chapters with equal start times keep their relative order.
    pub fn sort_by_start(&mut self) {
        self.chapters.sort_by(|a, b| a.start.as_millis().cmp(&b.start.as_millis()));
    }

    /// Returns a new list where each chapter's end is the next chapter's start, and the last
    /// chapter's end is `audio_duration` (falling back to `start + 1ms` when `None`).
    pub fn derive_end_times(&self, audio_duration: Option<AudioTimestamp>) -> ChapterList {
        let mut derived: Vec<Chapter> = self.chapters.clone();
        let len = derived.len();
        for i in 0..len {
            let next_start = derived.get(i + 1).map(|c| c.start);
            derived[i].end = match next_start {
                Some(start) => Some(start),
                None => Some(match audio_duration {
                    Some(duration) => duration,
                    None => AudioTimestamp::from_millis(derived[i].start.as_millis() + 1),
                }),
            };
        }
        ChapterList::from_vec(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter_at(ms: u64, title: &str) -> Chapter {
        Chapter::new(format!("chp{ms}"), AudioTimestamp::from_millis(ms), title)
    }

    #[test]
    fn sort_by_start_is_stable_and_ascending() {
        let mut list = ChapterList::from_vec(vec![chapter_at(5000, "b"), chapter_at(0, "a"), chapter_at(3000, "c")]);
        list.sort_by_start();
        let titles: Vec<&str> = list.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c", "b"]);
    }

    #[test]
    fn derive_end_times_uses_next_start_and_duration_fallback() {
        let list = ChapterList::from_vec(vec![chapter_at(0, "Intro"), chapter_at(3000, "Body"), chapter_at(7000, "Outro")]);
        let derived = list.derive_end_times(Some(AudioTimestamp::from_millis(10_000)));
        let ends: Vec<u64> = derived.iter().map(|c| c.end.unwrap().as_millis()).collect();
        assert_eq!(ends, vec![3000, 7000, 10_000]);
    }

    #[test]
    fn derive_end_times_falls_back_to_start_plus_one_ms() {
        let list = ChapterList::from_vec(vec![chapter_at(0, "Only")]);
        let derived = list.derive_end_times(None);
        assert_eq!(derived.iter().next().unwrap().end.unwrap().as_millis(), 1);
    }
}

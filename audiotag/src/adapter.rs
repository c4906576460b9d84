// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The chapter-interchange adapter surface: a pure pass-through between [`ChapterList`] and
//! external text codecs. No adapter implementations live here — LRC, WebVTT, SRT, TTML, Podlove
//! JSON/XML, Podcast-Namespace JSON, mp4chaps, and ffmetadata are external collaborators that
//! register their own [`ChapterFormatAdapter`] under one of [`RECOGNIZED_FORMAT_TAGS`].

use std::collections::HashMap;

use audiotag_core::errors::{AudioTagError, ExportError, Result};
use audiotag_core::model::ChapterList;

/// Format tags the façade recognizes well enough to route, without implementing any of them.
pub const RECOGNIZED_FORMAT_TAGS: &[&str] = &[
    "podlove-json",
    "podlove-xml",
    "mp4chaps",
    "ffmetadata",
    "markdown",
    "podcast-ns",
    "lrc",
    "ttml",
    "webvtt",
    "srt",
    "cue",
];

/// Converts a [`ChapterList`] to and from one external text format.
///
/// Chapter titles, start times, and URLs round-trip through every adapter; end times are not
/// guaranteed to, since not every interchange format carries them explicitly.
pub trait ChapterFormatAdapter: Send + Sync {
    fn export(&self, chapters: &ChapterList) -> Result<String>;
    fn import(&self, text: &str) -> Result<ChapterList>;
}

/// A caller-populated table from format tag to adapter. Empty by default.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Box<dyn ChapterFormatAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        AdapterRegistry::default()
    }

    pub fn register(&mut self, format: impl Into<String>, adapter: Box<dyn ChapterFormatAdapter>) {
        self.adapters.insert(format.into(), adapter);
    }

    pub fn get(&self, format: &str) -> Option<&dyn ChapterFormatAdapter> {
        self.adapters.get(format).map(|a| a.as_ref())
    }

    pub fn export(&self, format: &str, chapters: &ChapterList) -> Result<String> {
        self.get(format)
            .ok_or_else(|| AudioTagError::Export(ExportError::InvalidFormat(format.to_string())))?
            .export(chapters)
    }

    pub fn import(&self, format: &str, text: &str) -> Result<ChapterList> {
        self.get(format)
            .ok_or_else(|| AudioTagError::Export(ExportError::InvalidFormat(format.to_string())))?
            .import(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiotag_core::model::{AudioTimestamp, Chapter};

    struct PipeSeparated;

    impl ChapterFormatAdapter for PipeSeparated {
        fn export(&self, chapters: &ChapterList) -> Result<String> {
            Ok(chapters.iter().map(|c| format!("{}|{}", c.start.as_millis(), c.title)).collect::<Vec<_>>().join("\n"))
        }

        fn import(&self, text: &str) -> Result<ChapterList> {
            let mut list = ChapterList::new();
            for (i, line) in text.lines().enumerate() {
                let (ms, title) = line.split_once('|').unwrap();
                list.append(Chapter::new(format!("c{i}"), AudioTimestamp::from_millis(ms.parse().unwrap()), title));
            }
            Ok(list)
        }
    }

    #[test]
    fn registry_round_trips_through_a_registered_adapter() {
        let mut registry = AdapterRegistry::new();
        registry.register("pipe", Box::new(PipeSeparated));

        let mut chapters = ChapterList::new();
        chapters.append(Chapter::new("a", AudioTimestamp::from_millis(0), "Intro"));
        chapters.append(Chapter::new("b", AudioTimestamp::from_millis(1000), "Body"));

        let text = registry.export("pipe", &chapters).unwrap();
        let back = registry.import("pipe", &text).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.as_slice()[1].title, "Body");
    }

    #[test]
    fn unregistered_format_is_an_error() {
        let registry = AdapterRegistry::new();
        assert!(registry.export("lrc", &ChapterList::new()).is_err());
    }
}

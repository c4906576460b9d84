// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ilst` ↔ [`AudioMetadata`] conversion.

use log::debug;

use audiotag_core::io::{ByteReader, ByteWriter};
use audiotag_core::model::{Artwork, ArtworkFormat, AudioMetadata};

use crate::atom::{build_leaf, Atom, AtomBody, FourCc};
use crate::genre;

fn data_payload(atom: &Atom) -> Option<&[u8]> {
    let data = atom.find(b"data")?;
    let bytes = data.leaf_data()?;
    if bytes.len() < 8 {
        return None;
    }
    Some(&bytes[8..])
}

fn text_value(atom: &Atom) -> Option<String> {
    let payload = data_payload(atom)?;
    Some(String::from_utf8_lossy(payload).into_owned())
}

fn leading_year(text: &str) -> Option<String> {
    let digits: String = text.chars().take(4).collect();
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

fn u16_at(bytes: &[u8], offset: usize) -> Option<u16> {
    if bytes.len() < offset + 2 {
        return None;
    }
    Some(u16::from_be_bytes([bytes[offset], bytes[offset + 1]]))
}

/// Builds an [`AudioMetadata`] from an already-parsed `ilst` atom's children.
pub fn ilst_to_metadata(ilst: &Atom) -> AudioMetadata {
    let mut metadata = AudioMetadata::new();
    let mut has_custom_genre = false;

    for child in ilst.children() {
        match &child.fourcc {
            b"\xa9nam" => metadata.title = text_value(child),
            b"\xa9ART" => metadata.artist = text_value(child),
            b"\xa9alb" => metadata.album = text_value(child),
            b"\xa9gen" => {
                if let Some(v) = text_value(child) {
                    metadata.genre = Some(v);
                    has_custom_genre = true;
                }
            }
            b"\xa9day" => metadata.year = text_value(child).as_deref().and_then(leading_year),
            b"\xa9wrt" => metadata.composer = text_value(child),
            b"\xa9cmt" => metadata.comment = text_value(child),
            b"\xa9too" => metadata.encoder = text_value(child),
            b"\xa9lyr" => metadata.unsynchronized_lyrics = text_value(child),
            b"aART" => metadata.album_artist = text_value(child),
            b"cprt" => metadata.copyright = text_value(child),
            b"trkn" => {
                if let Some(payload) = data_payload(child) {
                    metadata.track_number = u16_at(payload, 2).map(|v| v as u32);
                }
            }
            b"disk" => {
                if let Some(payload) = data_payload(child) {
                    metadata.disc_number = u16_at(payload, 2).map(|v| v as u32);
                }
            }
            b"tmpo" => {
                if let Some(payload) = data_payload(child) {
                    metadata.bpm = u16_at(payload, 0).map(|v| v as u32);
                }
            }
            b"gnre" => {
                if !has_custom_genre {
                    if let Some(payload) = data_payload(child) {
                        if let Some(index) = u16_at(payload, 0) {
                            metadata.genre = genre::resolve(index).map(|s| s.to_string());
                        }
                    }
                }
            }
            b"covr" => {
                if let Some(data) = child.find(b"data").and_then(|d| d.leaf_data()) {
                    if data.len() > 8 {
                        // Type indicator (13=JPEG, 14=PNG) is a hint; magic-byte sniffing in
                        // `Artwork::from_bytes` is authoritative.
                        if let Ok(art) = Artwork::from_bytes(data[8..].to_vec()) {
                            metadata.artwork = Some(art);
                        }
                    }
                }
            }
            b"----" => {
                if let (Some(mean), Some(name), Some(data)) =
                    (child.find(b"mean"), child.find(b"name"), child.find(b"data"))
                {
                    if let (Some(mean_bytes), Some(name_bytes), Some(data_bytes)) =
                        (mean.leaf_data(), name.leaf_data(), data.leaf_data())
                    {
                        if mean_bytes.len() > 4 && name_bytes.len() > 4 && data_bytes.len() >= 8 {
                            let mean_str = String::from_utf8_lossy(&mean_bytes[4..]).into_owned();
                            let name_str = String::from_utf8_lossy(&name_bytes[4..]).into_owned();
                            let value = String::from_utf8_lossy(&data_bytes[8..]).into_owned();
                            metadata.custom_text.insert(format!("{mean_str}:{name_str}"), value);
                        }
                    }
                }
            }
            other => debug!("mp4: unrecognized ilst key '{}' ignored", String::from_utf8_lossy(other)),
        }
    }

    metadata
}

fn text_data_atom(fourcc: &FourCc, text: &str) -> Atom {
    let mut payload = ByteWriter::new();
    payload.write_u32(1); // UTF-8 type indicator
    payload.write_u32(0); // locale
    payload.write_bytes(text.as_bytes());
    Atom::container(*fourcc, vec![Atom::leaf(*b"data", payload.into_bytes())])
}

fn u16_pair_data_atom(fourcc: &FourCc, value: u16) -> Atom {
    let mut payload = ByteWriter::new();
    payload.write_u32(0);
    payload.write_u32(0);
    payload.write_u16(0);
    payload.write_u16(value);
    payload.write_u16(0);
    payload.write_u16(0);
    Atom::container(*fourcc, vec![Atom::leaf(*b"data", payload.into_bytes())])
}

fn u16_data_atom(fourcc: &FourCc, value: u16) -> Atom {
    let mut payload = ByteWriter::new();
    payload.write_u32(0);
    payload.write_u32(0);
    payload.write_u16(value);
    Atom::container(*fourcc, vec![Atom::leaf(*b"data", payload.into_bytes())])
}

fn cover_atom(artwork: &Artwork) -> Atom {
    let type_indicator: u32 = match artwork.format() {
        ArtworkFormat::Jpeg => 13,
        ArtworkFormat::Png => 14,
    };
    let mut payload = ByteWriter::new();
    payload.write_u32(type_indicator);
    payload.write_u32(0);
    payload.write_bytes(artwork.bytes());
    Atom::container(*b"covr", vec![Atom::leaf(*b"data", payload.into_bytes())])
}

fn freeform_atom(key: &str, value: &str) -> Option<Atom> {
    let (mean, name) = key.split_once(':')?;
    let mut mean_payload = ByteWriter::new();
    mean_payload.write_u32(0);
    mean_payload.write_bytes(mean.as_bytes());
    let mut name_payload = ByteWriter::new();
    name_payload.write_u32(0);
    name_payload.write_bytes(name.as_bytes());
    let mut data_payload = ByteWriter::new();
    data_payload.write_u32(1);
    data_payload.write_u32(0);
    data_payload.write_bytes(value.as_bytes());

    Some(Atom::container(
        *b"----",
        vec![
            Atom::leaf(*b"mean", mean_payload.into_bytes()),
            Atom::leaf(*b"name", name_payload.into_bytes()),
            Atom::leaf(*b"data", data_payload.into_bytes()),
        ],
    ))
}

/// Builds the children of a fresh `ilst` atom from an [`AudioMetadata`].
pub fn metadata_to_ilst_children(metadata: &AudioMetadata) -> Vec<Atom> {
    let mut children = Vec::new();
    let mut push_text = |fourcc: &FourCc, value: &Option<String>| {
        if let Some(v) = value {
            children.push(text_data_atom(fourcc, v));
        }
    };

    push_text(b"\xa9nam", &metadata.title);
    push_text(b"\xa9ART", &metadata.artist);
    push_text(b"\xa9alb", &metadata.album);
    push_text(b"\xa9gen", &metadata.genre);
    push_text(b"\xa9day", &metadata.year);
    push_text(b"\xa9wrt", &metadata.composer);
    push_text(b"\xa9cmt", &metadata.comment);
    push_text(b"\xa9too", &metadata.encoder);
    push_text(b"\xa9lyr", &metadata.unsynchronized_lyrics);
    push_text(b"aART", &metadata.album_artist);
    push_text(b"cprt", &metadata.copyright);

    if let Some(track) = metadata.track_number {
        children.push(u16_pair_data_atom(b"trkn", track.min(u16::MAX as u32) as u16));
    }
    if let Some(disc) = metadata.disc_number {
        children.push(u16_pair_data_atom(b"disk", disc.min(u16::MAX as u32) as u16));
    }
    if let Some(bpm) = metadata.bpm {
        children.push(u16_data_atom(b"tmpo", bpm.min(u16::MAX as u32) as u16));
    }
    if let Some(artwork) = &metadata.artwork {
        children.push(cover_atom(artwork));
    }

    for (key, value) in &metadata.custom_text {
        if let Some(atom) = freeform_atom(key, value) {
            children.push(atom);
        }
    }

    children
}

pub fn build_ilst(metadata: &AudioMetadata) -> Atom {
    Atom::container(*b"ilst", metadata_to_ilst_children(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::parse_container;

    #[test]
    fn round_trips_title_and_track_number() {
        let mut metadata = AudioMetadata::new();
        metadata.title = Some("A Title".to_string());
        metadata.track_number = Some(7);

        let ilst = build_ilst(&metadata);
        let bytes = ilst.to_bytes();
        let parsed = parse_container(&bytes, false).unwrap();
        let back = ilst_to_metadata(&parsed[0]);

        assert_eq!(back.title.as_deref(), Some("A Title"));
        assert_eq!(back.track_number, Some(7));
    }

    #[test]
    fn gnre_resolves_against_table_unless_overridden_by_custom_genre() {
        let gnre = u16_data_atom(b"gnre", 1); // index 1 -> "Blues"
        let ilst = Atom::container(*b"ilst", vec![gnre]);
        let metadata = ilst_to_metadata(&ilst);
        assert_eq!(metadata.genre.as_deref(), Some("Blues"));

        let custom_gen = text_data_atom(b"\xa9gen", "Custom");
        let gnre2 = u16_data_atom(b"gnre", 1);
        let ilst2 = Atom::container(*b"ilst", vec![custom_gen, gnre2]);
        let metadata2 = ilst_to_metadata(&ilst2);
        assert_eq!(metadata2.genre.as_deref(), Some("Custom"));
    }

    #[test]
    fn freeform_tag_round_trips_with_mean_colon_name_key() {
        let mut metadata = AudioMetadata::new();
        metadata.custom_text.insert("com.apple.iTunes:MyKey".to_string(), "value".to_string());
        let ilst = build_ilst(&metadata);
        let back = ilst_to_metadata(&ilst);
        assert_eq!(back.custom_text.get("com.apple.iTunes:MyKey").map(|s| s.as_str()), Some("value"));
    }
}

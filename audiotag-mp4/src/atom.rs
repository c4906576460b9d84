// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISO BMFF atom tree: top-level scanning (offsets and sizes only) and in-memory parsing of a
//! single container's bytes (used for `moov`, whose contents are rebuilt on every write).

use audiotag_core::errors::{AudioTagError, Mp4Error, Result};
use audiotag_core::io::{ByteReader, ByteWriter, FileReader};

pub type FourCc = [u8; 4];

const ACCEPTED_BRANDS: [FourCc; 7] =
    [*b"M4A ", *b"M4B ", *b"mp41", *b"mp42", *b"isom", *b"iso2", *b"aax "];

fn is_container_type(fourcc: &FourCc) -> bool {
    matches!(
        fourcc,
        b"moov" | b"trak" | b"mdia" | b"minf" | b"stbl" | b"udta" | b"dinf" | b"edts" | b"gmhd" | b"meta"
    )
}

fn invalid_file(reason: &'static str) -> AudioTagError {
    AudioTagError::Mp4(Mp4Error::InvalidFile(reason))
}

fn invalid_atom(kind: FourCc, reason: &'static str) -> AudioTagError {
    AudioTagError::Mp4(Mp4Error::InvalidAtom { atom_type: kind, reason })
}

/// One atom at the top level of the file: only its identity and byte range are recorded, never
/// its payload, so the audio `mdat` is never pulled into memory.
#[derive(Debug, Clone, Copy)]
pub struct TopLevelAtom {
    pub fourcc: FourCc,
    /// Absolute offset of the atom's size field.
    pub offset: u64,
    pub header_size: u64,
    /// Total size of the atom, including its header.
    pub size: u64,
}

impl TopLevelAtom {
    pub fn payload_offset(&self) -> u64 {
        self.offset + self.header_size
    }

    pub fn payload_size(&self) -> u64 {
        self.size - self.header_size
    }

    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Reads one atom header (size + fourcc [+ 64-bit extended size]) at `offset`, resolving a
/// zero size to "extends to `file_size`".
fn read_header(reader: &mut FileReader, offset: u64, file_size: u64) -> Result<TopLevelAtom> {
    if offset + 8 > file_size {
        return Err(invalid_file("atom header runs past end of file"));
    }
    let head = reader.read(offset, 8)?;
    let mut r = ByteReader::new(&head);
    let size32 = r.read_u32()?;
    let fourcc: FourCc = r.read_bytes(4)?.try_into().unwrap();

    match size32 {
        0 => Ok(TopLevelAtom { fourcc, offset, header_size: 8, size: file_size - offset }),
        1 => {
            if offset + 16 > file_size {
                return Err(invalid_atom(fourcc, "truncated 64-bit size field"));
            }
            let ext = reader.read(offset + 8, 8)?;
            let size = ByteReader::new(&ext).read_u64()?;
            if size < 16 {
                return Err(invalid_atom(fourcc, "declared size smaller than header"));
            }
            if offset + size > file_size {
                return Err(invalid_atom(fourcc, "declared size runs past end of file"));
            }
            Ok(TopLevelAtom { fourcc, offset, header_size: 16, size })
        }
        n if n < 8 => Err(invalid_atom(fourcc, "declared size smaller than header")),
        n => {
            let size = n as u64;
            if offset + size > file_size {
                return Err(invalid_atom(fourcc, "declared size runs past end of file"));
            }
            Ok(TopLevelAtom { fourcc, offset, header_size: 8, size })
        }
    }
}

/// Scans the top level of the file, recording every atom's identity and byte range.
pub fn scan_top_level(reader: &mut FileReader) -> Result<Vec<TopLevelAtom>> {
    let file_size = reader.size();
    let mut atoms = Vec::new();
    let mut offset = 0u64;

    while offset < file_size {
        let atom = read_header(reader, offset, file_size)?;
        offset = atom.end();
        atoms.push(atom);
    }

    Ok(atoms)
}

pub fn find<'a>(atoms: &'a [TopLevelAtom], fourcc: &FourCc) -> Option<&'a TopLevelAtom> {
    atoms.iter().find(|a| &a.fourcc == fourcc)
}

/// Validates that `ftyp`'s major brand or one of its compatible brands is in the accepted set.
pub fn validate_ftyp(reader: &mut FileReader, ftyp: &TopLevelAtom) -> Result<()> {
    let payload = reader.read(ftyp.payload_offset(), ftyp.payload_size())?;
    if payload.len() < 8 {
        return Err(invalid_atom(*b"ftyp", "payload too small"));
    }

    let major: FourCc = payload[0..4].try_into().unwrap();
    if ACCEPTED_BRANDS.contains(&major) {
        return Ok(());
    }

    let mut offset = 8usize;
    while offset + 4 <= payload.len() {
        let brand: FourCc = payload[offset..offset + 4].try_into().unwrap();
        if ACCEPTED_BRANDS.contains(&brand) {
            return Ok(());
        }
        offset += 4;
    }

    Err(AudioTagError::Mp4(Mp4Error::UnsupportedFileType(String::from_utf8_lossy(&major).into_owned())))
}

/// An atom inside an in-memory container tree (used for `moov` and its descendants).
#[derive(Debug, Clone)]
pub struct Atom {
    pub fourcc: FourCc,
    pub body: AtomBody,
}

#[derive(Debug, Clone)]
pub enum AtomBody {
    Container(Vec<Atom>),
    Leaf(Vec<u8>),
}

impl Atom {
    pub fn leaf(fourcc: FourCc, data: Vec<u8>) -> Self {
        Atom { fourcc, body: AtomBody::Leaf(data) }
    }

    pub fn container(fourcc: FourCc, children: Vec<Atom>) -> Self {
        Atom { fourcc, body: AtomBody::Container(children) }
    }

    pub fn children(&self) -> &[Atom] {
        match &self.body {
            AtomBody::Container(c) => c,
            AtomBody::Leaf(_) => &[],
        }
    }

    pub fn leaf_data(&self) -> Option<&[u8]> {
        match &self.body {
            AtomBody::Leaf(d) => Some(d),
            AtomBody::Container(_) => None,
        }
    }

    pub fn find(&self, fourcc: &FourCc) -> Option<&Atom> {
        self.children().iter().find(|a| &a.fourcc == fourcc)
    }

    /// Walks a path of fourccs from this atom, returning the atom at the end if every segment
    /// exists (e.g. `["udta", "meta", "ilst"]`).
    pub fn walk(&self, path: &[FourCc]) -> Option<&Atom> {
        let mut cur = self;
        for fourcc in path {
            cur = cur.find(fourcc)?;
        }
        Some(cur)
    }

    /// Serializes this atom (header + payload) back to bytes.
    pub fn write(&self, w: &mut ByteWriter) {
        let mut body = ByteWriter::new();
        match &self.body {
            AtomBody::Leaf(data) => body.write_bytes(data),
            AtomBody::Container(children) => {
                for child in children {
                    child.write(&mut body);
                }
            }
        }
        w.write_u32((8 + body.len()) as u32);
        w.write_bytes(&self.fourcc);
        w.write_bytes(body.as_slice());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.write(&mut w);
        w.into_bytes()
    }
}

/// Parses a flat run of sibling atoms from `buf`. `parent_is_ilst` forces every direct child to
/// be treated as a container, matching `ilst`'s special per-tag atom layout (`©nam/data`,
/// `----/mean+name+data`, ...).
pub fn parse_container(buf: &[u8], parent_is_ilst: bool) -> Result<Vec<Atom>> {
    let mut out = Vec::new();
    let mut r = ByteReader::new(buf);

    while r.remaining() >= 8 {
        let start = r.pos();
        let size32 = r.read_u32()?;
        let fourcc: FourCc = r.read_bytes(4)?.try_into().unwrap();

        let (header_len, total_size): (u64, u64) = match size32 {
            0 => {
                let remaining_from_start = buf.len() as u64 - start;
                (8, remaining_from_start)
            }
            1 => {
                let large = r.read_u64()?;
                if large < 16 {
                    return Err(invalid_atom(fourcc, "declared 64-bit size smaller than header"));
                }
                (16, large)
            }
            n if n < 8 => return Err(invalid_atom(fourcc, "declared size smaller than header")),
            n => (8, n as u64),
        };

        if start + total_size > buf.len() as u64 {
            return Err(invalid_atom(fourcc, "declared size runs past end of enclosing atom"));
        }

        let payload_len = (total_size - header_len) as usize;
        let payload = r.read_bytes(payload_len)?;

        let body = if fourcc == *b"meta" {
            if payload.len() < 4 {
                return Err(invalid_atom(fourcc, "meta payload missing version/flags word"));
            }
            AtomBody::Container(parse_container(&payload[4..], false)?)
        } else if fourcc == *b"----" || parent_is_ilst || is_container_type(&fourcc) {
            AtomBody::Container(parse_container(payload, fourcc == *b"ilst")?)
        } else {
            AtomBody::Leaf(payload.to_vec())
        };

        out.push(Atom { fourcc, body });
    }

    Ok(out)
}

/// Builds a leaf atom's raw bytes directly, without going through the [`Atom`] tree — used for
/// cheaply assembling small fixed-layout atoms (`mean`, `name`, `data`, `href`, ...).
pub fn build_leaf(fourcc: &FourCc, payload: &[u8]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_u32((8 + payload.len()) as u32);
    w.write_bytes(fourcc);
    w.write_bytes(payload);
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        build_leaf(fourcc, payload)
    }

    #[test]
    fn parses_flat_leaf_atoms() {
        let mut buf = atom(b"free", b"");
        buf.extend(atom(b"stsz", &[1, 2, 3, 4]));
        let atoms = parse_container(&buf, false).unwrap();
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[0].fourcc, *b"free");
        assert_eq!(atoms[1].leaf_data(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn recurses_into_container_types() {
        let inner = atom(b"mvhd", &[9, 9]);
        let outer = atom(b"moov", &inner);
        let atoms = parse_container(&outer, false).unwrap();
        assert_eq!(atoms[0].children()[0].fourcc, *b"mvhd");
    }

    #[test]
    fn ilst_children_are_forced_containers() {
        let data = atom(b"data", &[0, 0, 0, 1, 0, 0, 0, 0, b'h', b'i']);
        let nam = atom(b"\xa9nam", &data);
        let ilst = atom(b"ilst", &nam);
        let atoms = parse_container(&ilst, false).unwrap();
        let ilst_atom = &atoms[0];
        assert!(matches!(ilst_atom.body, AtomBody::Container(_)));
        let nam_atom = &ilst_atom.children()[0];
        assert!(matches!(nam_atom.body, AtomBody::Container(_)));
        assert_eq!(nam_atom.children()[0].fourcc, *b"data");
    }

    #[test]
    fn rejects_declared_size_past_buffer_end() {
        let mut buf = vec![0, 0, 0, 100];
        buf.extend_from_slice(b"free");
        assert!(parse_container(&buf, false).is_err());
    }

    #[test]
    fn round_trips_through_write() {
        let leaf = Atom::leaf(*b"mvhd", vec![1, 2, 3]);
        let container = Atom::container(*b"moov", vec![leaf]);
        let bytes = container.to_bytes();
        let parsed = parse_container(&bytes, false).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].children()[0].leaf_data(), Some(&[1u8, 2, 3][..]));
    }
}

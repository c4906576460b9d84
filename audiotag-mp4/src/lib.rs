// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISO BMFF (MP4/M4A/M4B/AAX) atom codec: top-level scanning, in-memory `moov` parsing and
//! rebuilding, `ilst` metadata conversion, Nero/QuickTime chapter extraction, and the
//! always-atomic-rewrite write strategy.

mod atom;
mod chapters;
mod file;
mod fixup;
mod genre;
mod metadata;
mod moov;

pub use atom::{Atom, AtomBody, FourCc, TopLevelAtom};
pub use file::{modify, read, strip, write};

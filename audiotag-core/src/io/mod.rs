// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements byte- and file-level I/O shared by every format codec.
//!
//! The following nomenclature is used:
//!  * A `Reader`/`Writer` operates on an in-memory `&[u8]`/`Vec<u8>` buffer ([`ByteReader`],
//!    [`ByteWriter`]).
//!  * A `FileReader`/`FileWriter` operates on a scoped, open file descriptor and never holds the
//!    whole file in memory at once.

mod byte_reader;
mod byte_writer;
mod encoding;
mod file;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use encoding::TextEncoding;
pub use file::{FileReader, FileWriter, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE};

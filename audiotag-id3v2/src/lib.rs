// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ID3v2.3/2.4 tag codec: frame parsing, frame/model conversion, and the in-place / atomic-
//! rewrite write strategy.

mod convert;
mod frame;
mod header;
mod tag;
mod unsync;

pub use frame::{Frame, SyltEvent};
pub use header::Header;
pub use tag::{modify, read, strip, write};

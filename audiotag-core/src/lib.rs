// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared byte/file I/O, the container-agnostic domain model, configuration, and error types
//! used by every format codec in the workspace.

pub mod config;
pub mod errors;
pub mod io;
pub mod model;

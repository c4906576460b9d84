// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the subsystem-grouped error taxonomy shared by every crate in the
//! workspace.
//!
//! Each subsystem gets its own error enum (mirroring the shape, not the content, of a typical
//! hand-rolled container-format error type: a closed set of variants, a `Display` impl, and a set
//! of `From` conversions into the top-level [`AudioTagError`]). No operation in this workspace
//! catches and swallows an error from a lower subsystem; it is always converted and propagated.

use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, AudioTagError>;

/// The union of every error a library-boundary operation can return.
#[derive(Debug)]
pub enum AudioTagError {
    Stream(StreamError),
    Byte(ByteError),
    Id3v2(Id3v2Error),
    Mp4(Mp4Error),
    Engine(EngineError),
    Export(ExportError),
    Model(ModelError),
}

impl fmt::Display for AudioTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioTagError::Stream(e) => write!(f, "{e}"),
            AudioTagError::Byte(e) => write!(f, "{e}"),
            AudioTagError::Id3v2(e) => write!(f, "{e}"),
            AudioTagError::Mp4(e) => write!(f, "{e}"),
            AudioTagError::Engine(e) => write!(f, "{e}"),
            AudioTagError::Export(e) => write!(f, "{e}"),
            AudioTagError::Model(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AudioTagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioTagError::Stream(StreamError::Io(e)) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised by the streaming file reader/writer (§4.2).
#[derive(Debug)]
pub enum StreamError {
    FileNotFound(std::path::PathBuf),
    CannotOpen(std::path::PathBuf),
    ReadFailed(io::Error),
    WriteFailed(io::Error),
    OutOfBounds { offset: u64, size: u64 },
    InvalidBufferSize(usize),
    FileTooSmall { expected: u64, actual: u64 },
    Io(io::Error),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::FileNotFound(p) => write!(f, "file not found: {}", p.display()),
            StreamError::CannotOpen(p) => write!(f, "cannot open: {}", p.display()),
            StreamError::ReadFailed(e) => write!(f, "read failed: {e}"),
            StreamError::WriteFailed(e) => write!(f, "write failed: {e}"),
            StreamError::OutOfBounds { offset, size } => {
                write!(f, "out of bounds: offset {offset} exceeds size {size}")
            }
            StreamError::InvalidBufferSize(size) => {
                write!(f, "invalid buffer size: {size} (expected 4 KiB..=1 MiB)")
            }
            StreamError::FileTooSmall { expected, actual } => {
                write!(f, "file too small: expected at least {expected} bytes, got {actual}")
            }
            StreamError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

/// Errors raised by the byte-buffer reader/writer (§4.1).
#[derive(Debug)]
pub enum ByteError {
    UnexpectedEnd { offset: u64, requested: u64, available: u64 },
    InvalidEncoding { offset: u64 },
    SeekOutOfBounds { offset: u64, size: u64 },
}

impl fmt::Display for ByteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteError::UnexpectedEnd { offset, requested, available } => write!(
                f,
                "unexpected end of buffer at offset {offset}: requested {requested}, available {available}"
            ),
            ByteError::InvalidEncoding { offset } => {
                write!(f, "invalid text encoding byte at offset {offset}")
            }
            ByteError::SeekOutOfBounds { offset, size } => {
                write!(f, "seek to {offset} is out of bounds for buffer of size {size}")
            }
        }
    }
}

/// Errors raised by the ID3v2 codec (§4.3).
#[derive(Debug)]
pub enum Id3v2Error {
    NoTag,
    InvalidHeader(&'static str),
    UnsupportedVersion { major: u8, minor: u8 },
    InvalidFrame { id: String, reason: &'static str },
    InvalidEncoding(u8),
    TruncatedData { expected: u64, available: u64 },
    InvalidSyncsafeInteger,
}

impl fmt::Display for Id3v2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id3v2Error::NoTag => write!(f, "no ID3v2 tag present"),
            Id3v2Error::InvalidHeader(reason) => write!(f, "invalid ID3v2 header: {reason}"),
            Id3v2Error::UnsupportedVersion { major, minor } => {
                write!(f, "unsupported ID3v2 version: {major}.{minor}")
            }
            Id3v2Error::InvalidFrame { id, reason } => {
                write!(f, "invalid frame '{id}': {reason}")
            }
            Id3v2Error::InvalidEncoding(byte) => {
                write!(f, "invalid text encoding byte: {byte:#04x}")
            }
            Id3v2Error::TruncatedData { expected, available } => {
                write!(f, "truncated frame data: expected {expected} bytes, {available} available")
            }
            Id3v2Error::InvalidSyncsafeInteger => write!(f, "invalid syncsafe integer"),
        }
    }
}

/// Errors raised by the MP4 atom codec (§4.4).
#[derive(Debug)]
pub enum Mp4Error {
    InvalidFile(&'static str),
    InvalidAtom { atom_type: [u8; 4], reason: &'static str },
    UnsupportedFileType(String),
    AtomNotFound(&'static str),
}

impl fmt::Display for Mp4Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mp4Error::InvalidFile(reason) => write!(f, "invalid MP4 file: {reason}"),
            Mp4Error::InvalidAtom { atom_type, reason } => {
                write!(f, "invalid atom '{}': {reason}", atom_type_str(atom_type))
            }
            Mp4Error::UnsupportedFileType(brand) => {
                write!(f, "unsupported file type, major brand '{brand}'")
            }
            Mp4Error::AtomNotFound(atom_type) => write!(f, "required atom not found: {atom_type}"),
        }
    }
}

fn atom_type_str(atom_type: &[u8; 4]) -> String {
    String::from_utf8_lossy(atom_type).into_owned()
}

/// Errors raised at the public engine façade (§4.5, §6).
#[derive(Debug)]
pub enum EngineError {
    ReadFailed(String),
    WriteFailed(String),
    UnsupportedFormat(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ReadFailed(msg) => write!(f, "read failed: {msg}"),
            EngineError::WriteFailed(msg) => write!(f, "write failed: {msg}"),
            EngineError::UnsupportedFormat(msg) => write!(f, "unsupported format: {msg}"),
        }
    }
}

/// Errors raised by the chapter-interchange adapter surface.
#[derive(Debug)]
pub enum ExportError {
    InvalidFormat(String),
    InvalidData(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::InvalidFormat(reason) => write!(f, "invalid export format: {reason}"),
            ExportError::InvalidData(reason) => write!(f, "invalid chapter data: {reason}"),
        }
    }
}

/// Errors raised by domain-model constructors (`Artwork`, `AudioTimestamp`).
#[derive(Debug)]
pub enum ModelError {
    ArtworkUnrecognizedFormat,
    ArtworkFileNotFound(std::path::PathBuf),
    TimestampInvalidFormat(String),
    TimestampNegativeValue,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::ArtworkUnrecognizedFormat => {
                write!(f, "artwork bytes do not match a recognized image format")
            }
            ModelError::ArtworkFileNotFound(p) => {
                write!(f, "artwork file not found: {}", p.display())
            }
            ModelError::TimestampInvalidFormat(s) => {
                write!(f, "invalid timestamp format: '{s}'")
            }
            ModelError::TimestampNegativeValue => write!(f, "timestamp value is negative"),
        }
    }
}

macro_rules! impl_from_subsystem {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for AudioTagError {
            fn from(e: $ty) -> Self {
                AudioTagError::$variant(e)
            }
        }
    };
}

impl_from_subsystem!(Stream, StreamError);
impl_from_subsystem!(Byte, ByteError);
impl_from_subsystem!(Id3v2, Id3v2Error);
impl_from_subsystem!(Mp4, Mp4Error);
impl_from_subsystem!(Engine, EngineError);
impl_from_subsystem!(Export, ExportError);
impl_from_subsystem!(Model, ModelError);

impl From<io::Error> for AudioTagError {
    fn from(e: io::Error) -> Self {
        AudioTagError::Stream(StreamError::Io(e))
    }
}

/// Convenience constructor mirroring the teacher's `decode_error`/`unsupported_error` helpers.
pub fn byte_error<T>(e: ByteError) -> Result<T> {
    Err(AudioTagError::Byte(e))
}

pub fn id3v2_error<T>(e: Id3v2Error) -> Result<T> {
    Err(AudioTagError::Id3v2(e))
}

pub fn mp4_error<T>(e: Mp4Error) -> Result<T> {
    Err(AudioTagError::Mp4(e))
}

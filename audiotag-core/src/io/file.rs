// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Streaming file reader and writer, scoped to an open file descriptor.
//!
//! These wrap [`std::fs::File`] rather than reading whole files into memory, since a chaptered
//! audiobook (`.m4b`/`.aax`) can run into the hundreds of megabytes and most of that is audio
//! payload the codecs never need to inspect.

use std::fs::{File, OpenOptions};
use std::io::{Read as _, Seek as _, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use crate::errors::{AudioTagError, Result, StreamError};

pub const MIN_BUFFER_SIZE: usize = 4 * 1024;
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

fn validate_buffer_size(size: usize) -> Result<()> {
    if size < MIN_BUFFER_SIZE || size > MAX_BUFFER_SIZE {
        return Err(AudioTagError::Stream(StreamError::InvalidBufferSize(size)));
    }
    Ok(())
}

/// A scoped read handle over an existing file.
pub struct FileReader {
    file: File,
    path: PathBuf,
    size: u64,
}

impl FileReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(AudioTagError::Stream(StreamError::FileNotFound(path)));
        }
        let file = File::open(&path).map_err(|_| AudioTagError::Stream(StreamError::CannotOpen(path.clone())))?;
        let size = file
            .metadata()
            .map_err(|e| AudioTagError::Stream(StreamError::ReadFailed(e)))?
            .len();
        Ok(FileReader { file, path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads exactly `count` bytes starting at `at`.
    pub fn read(&mut self, at: u64, count: u64) -> Result<Vec<u8>> {
        if at + count > self.size {
            return Err(AudioTagError::Stream(StreamError::OutOfBounds { offset: at + count, size: self.size }));
        }
        self.file
            .seek(SeekFrom::Start(at))
            .map_err(|e| AudioTagError::Stream(StreamError::ReadFailed(e)))?;
        let mut buf = vec![0u8; count as usize];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| AudioTagError::Stream(StreamError::ReadFailed(e)))?;
        Ok(buf)
    }

    /// Reads from `from` to the end of the file.
    pub fn read_to_end(&mut self, from: u64) -> Result<Vec<u8>> {
        if from > self.size {
            return Err(AudioTagError::Stream(StreamError::OutOfBounds { offset: from, size: self.size }));
        }
        self.read(from, self.size - from)
    }

    /// Reads `count` bytes starting at `from` in fixed-size chunks, invoking `callback` with
    /// `(chunk, bytes_read_so_far, total)` after each chunk.
    pub fn read_chunked<F>(&mut self, from: u64, count: u64, buffer_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8], u64, u64) -> Result<()>,
    {
        validate_buffer_size(buffer_size)?;
        if from + count > self.size {
            return Err(AudioTagError::Stream(StreamError::OutOfBounds { offset: from + count, size: self.size }));
        }

        self.file
            .seek(SeekFrom::Start(from))
            .map_err(|e| AudioTagError::Stream(StreamError::ReadFailed(e)))?;

        let mut remaining = count;
        let mut read_so_far = 0u64;
        let mut buf = vec![0u8; buffer_size];

        while remaining > 0 {
            let this_chunk = remaining.min(buffer_size as u64) as usize;
            self.file
                .read_exact(&mut buf[..this_chunk])
                .map_err(|e| AudioTagError::Stream(StreamError::ReadFailed(e)))?;
            read_so_far += this_chunk as u64;
            remaining -= this_chunk as u64;
            callback(&buf[..this_chunk], read_so_far, count)?;
        }
        Ok(())
    }
}

/// A scoped write handle over an existing or newly created file.
pub struct FileWriter {
    file: File,
    path: PathBuf,
}

impl FileWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|_| AudioTagError::Stream(StreamError::CannotOpen(path.clone())))?;
        Ok(FileWriter { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::End(0))
            .map_err(|e| AudioTagError::Stream(StreamError::WriteFailed(e)))?;
        self.file
            .write_all(bytes)
            .map_err(|e| AudioTagError::Stream(StreamError::WriteFailed(e)))
    }

    pub fn write(&mut self, bytes: &[u8], at: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(at))
            .map_err(|e| AudioTagError::Stream(StreamError::WriteFailed(e)))?;
        self.file
            .write_all(bytes)
            .map_err(|e| AudioTagError::Stream(StreamError::WriteFailed(e)))
    }

    pub fn truncate(&mut self, length: u64) -> Result<()> {
        self.file
            .set_len(length)
            .map_err(|e| AudioTagError::Stream(StreamError::WriteFailed(e)))
    }

    /// Flushes and `fsync`s the file so the write is durable before any sidecar swap.
    pub fn synchronize(&mut self) -> Result<()> {
        self.file
            .flush()
            .map_err(|e| AudioTagError::Stream(StreamError::WriteFailed(e)))?;
        self.file
            .sync_all()
            .map_err(|e| AudioTagError::Stream(StreamError::WriteFailed(e)))
    }

    /// Streams `count` bytes from `from_reader` starting at `offset` into this writer's current
    /// append position, without buffering the whole payload in memory.
    pub fn copy_chunked(&mut self, from_reader: &mut FileReader, offset: u64, count: u64, buffer_size: usize) -> Result<()> {
        validate_buffer_size(buffer_size)?;
        from_reader.read_chunked(offset, count, buffer_size, |chunk, _, _| self.append(chunk))
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn temp_file_with(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_exact_range() {
        let tmp = temp_file_with(b"0123456789");
        let mut reader = FileReader::open(tmp.path()).unwrap();
        assert_eq!(reader.read(2, 3).unwrap(), b"234");
    }

    #[test]
    fn out_of_bounds_read_fails() {
        let tmp = temp_file_with(b"01234");
        let mut reader = FileReader::open(tmp.path()).unwrap();
        assert!(reader.read(3, 10).is_err());
    }

    #[test]
    fn rejects_buffer_size_outside_bounds() {
        let tmp = temp_file_with(&vec![0u8; 1024]);
        let mut reader = FileReader::open(tmp.path()).unwrap();
        assert!(reader.read_chunked(0, 10, 1, |_, _, _| Ok(())).is_err());
    }

    #[test]
    fn read_chunked_visits_every_byte() {
        let data = vec![7u8; 200_000];
        let tmp = temp_file_with(&data);
        let mut reader = FileReader::open(tmp.path()).unwrap();
        let mut total = 0u64;
        reader
            .read_chunked(0, data.len() as u64, MIN_BUFFER_SIZE, |chunk, read_so_far, total_expected| {
                total += chunk.len() as u64;
                assert_eq!(read_so_far, total);
                assert_eq!(total_expected, data.len() as u64);
                Ok(())
            })
            .unwrap();
        assert_eq!(total, data.len() as u64);
    }
}

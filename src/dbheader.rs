//! Parses the 100-byte SQLite database file header.
//!
//! This reader does not reject files for carrying values a live engine
//! would never write (freelist pages in use, non-default schema format,
//! application id set, etc.) — a forensic reader's whole point is to work
//! on files the live engine itself might now refuse to open. Only two
//! things are treated as fatal here: a bad magic string, and an
//! unsupported page size.

use crate::byte_reader::{read_u16, read_u32, read_u8};

pub const HEADER_BYTES: usize = 100;
const MAGIC: &[u8] = b"SQLite format 3\0";

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("File is smaller than the 100-byte SQLite header.")]
    TooShort,
    #[error("The magic bytes for this file are wrong.")]
    WrongMagic,
    #[error("Declared page size is not a supported SQLite page size.")]
    UnsupportedPageSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    fn from_code(code: u32) -> TextEncoding {
        match code {
            2 => TextEncoding::Utf16Le,
            3 => TextEncoding::Utf16Be,
            // 1, and anything unrecognized: default to the common case
            // rather than fail a header that is otherwise readable.
            _ => TextEncoding::Utf8,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub page_size: u32,
    /// The in-header database size. May be 0 on databases written by very
    /// old SQLite versions; callers should fall back to `file_len /
    /// page_size` in that case (see `Database::open`).
    pub declared_page_count: u32,
    pub reserved_tail: u8,
    pub text_encoding: TextEncoding,
    pub incremental_vacuum: bool,
}

fn valid_page_size(raw: u16) -> Option<u32> {
    match raw {
        1 => Some(65536),
        512 | 1024 | 2048 | 4096 | 8192 | 16384 | 32768 => Some(raw as u32),
        _ => None,
    }
}

/// Parses the 100-byte header from the start of `data` (the whole file).
pub fn parse(data: &[u8]) -> Result<FileHeader, Error> {
    if data.len() < HEADER_BYTES {
        return Err(Error::TooShort);
    }
    if &data[0..16] != MAGIC {
        return Err(Error::WrongMagic);
    }
    let raw_page_size = read_u16(data, 16).ok_or(Error::TooShort)?;
    let page_size = valid_page_size(raw_page_size).ok_or(Error::UnsupportedPageSize)?;
    let reserved_tail = read_u8(data, 20).unwrap_or(0);
    let declared_page_count = read_u32(data, 28).unwrap_or(0);
    let text_encoding = TextEncoding::from_code(read_u32(data, 56).unwrap_or(1));
    let incremental_vacuum = read_u32(data, 64).unwrap_or(0) != 0;

    Ok(FileHeader {
        page_size,
        declared_page_count,
        reserved_tail,
        text_encoding,
        incremental_vacuum,
    })
}

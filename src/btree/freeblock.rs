//! Walks a page's freeblock linked list and scans its unallocated region,
//! attempting a best-effort record decode at each candidate offset. This is
//! the heart of deleted-row recovery: SQLite doesn't zero a cell when a row
//! is deleted, it just splices the space onto the freeblock list (or, if the
//! deletion didn't coalesce into a freeblock, leaves it as unallocated
//! slack between the cell pointer array and the cell content area).
//!
//! The walk follows freeblock-offset/size pairs with a cycle guard (`next
//! offset must exceed the current one, or the chain terminates`) and then
//! attempts to reinterpret the bytes as a record.
//!
//! A scavenged candidate is decoded starting directly at the
//! payload-header-length varint (skipping the `payload_len`/`row_id` varint
//! pair a live cell would have) since a freed cell's leading bytes are the
//! least reliable part of the reconstruction; candidates that don't decode
//! to a plausible record are still reported, with `record: None`, so the
//! caller can render the raw bytes.

use crate::byte_reader::read_u16;
use crate::dbheader::TextEncoding;
use std::collections::HashSet;

use super::cell::{decode_record, Record};
use super::header::PageHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    pub offset: u16,
    pub size: u16,
}

/// Walks the freeblock list starting at `start` (a page's header
/// `freeblock_start`). Returns the blocks found and whether the walk had to
/// be cut short (cycle, non-increasing offset, or truncated page).
pub fn walk_freeblocks(page: &[u8], start: u16) -> (Vec<FreeBlock>, bool) {
    let mut blocks = Vec::new();
    let mut seen = HashSet::new();
    let mut offset = start;
    let mut truncated = false;

    while offset != 0 {
        if !seen.insert(offset) {
            truncated = true;
            break;
        }
        let next = match read_u16(page, offset as usize) {
            Some(v) => v,
            None => {
                truncated = true;
                break;
            }
        };
        let size = match read_u16(page, offset as usize + 2) {
            Some(v) => v,
            None => {
                truncated = true;
                break;
            }
        };
        blocks.push(FreeBlock { offset, size });
        if next != 0 && next <= offset {
            // The format requires freeblock offsets to strictly increase;
            // anything else is a cycle or corruption.
            truncated = true;
            break;
        }
        offset = next;
    }
    (blocks, truncated)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScavengeSource {
    Freeblock,
    Unallocated,
}

#[derive(Debug, Clone)]
pub struct ScavengedCell {
    /// Offset, within the page, where this candidate starts.
    pub offset: u16,
    pub source: ScavengeSource,
    /// `None` if the bytes at this offset didn't decode to a plausible
    /// record; still reported so the raw bytes can be rendered.
    pub record: Option<Record>,
}

fn try_decode(bytes: &[u8], encoding: TextEncoding) -> Option<Record> {
    decode_record(bytes, encoding).ok()
}

/// Scans both the freeblock list and the unallocated region of a page for
/// recoverable record bytes.
pub fn scavenge(page: &[u8], header: &PageHeader, encoding: TextEncoding) -> Vec<ScavengedCell> {
    let mut out = Vec::new();

    let (blocks, _truncated) = walk_freeblocks(page, header.freeblock_start);
    for fb in &blocks {
        let start = fb.offset as usize + 4;
        let end = fb.offset as usize + fb.size as usize;
        if end > page.len() || start >= end {
            continue;
        }
        let record = try_decode(&page[start..end], encoding);
        out.push(ScavengedCell {
            offset: fb.offset,
            source: ScavengeSource::Freeblock,
            record,
        });
    }

    let unalloc_start = header.cell_pointer_array_offset() + header.cell_count as usize * 2;
    let unalloc_end = (header.cell_content_start as usize).min(page.len());
    if unalloc_end > unalloc_start {
        let region = &page[unalloc_start..unalloc_end];
        let mut i = 0;
        while i < region.len() {
            if region[i] == 0 {
                i += 1;
                continue;
            }
            if let Some(record) = try_decode(&region[i..], encoding) {
                out.push(ScavengedCell {
                    offset: (unalloc_start + i) as u16,
                    source: ScavengeSource::Unallocated,
                    record: Some(record),
                });
            }
            i += 1;
        }
    }

    out
}

//! Decodes the four b-tree cell formats and the record payload they carry.
//!
//! Cells are sliced out of the cell pointer array (`header::cell_pointers`),
//! then their record payload is walked as a header-length varint followed
//! by a serial-type vector. Overflow chains are resolved inline (via
//! `overflow::follow`) so callers get a single concatenated, fully-decoded
//! `Record` regardless of whether the payload spilled, and decoding never
//! panics: any structural inconsistency in a single cell — a varint running
//! past the end of the page, an out-of-range serial type — aborts decoding
//! of that cell only and is reported as `CellError`.

use crate::byte_reader::{read_u32, read_varint};
use crate::dbheader::TextEncoding;
use crate::file_view::FileView;
use crate::sql_value::Value;
use crate::{overflow, serial_type};

use super::header::PageKind;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("Cell at offset {0} runs past the end of the page.")]
    OutOfBounds(usize),
    #[error("Record payload header is malformed.")]
    MalformedPayloadHeader,
    #[error("Page kind {0:?} does not have a defined cell format.")]
    UnsupportedPageKind(PageKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: Vec<Value>,
    /// True if the payload's overflow chain broke (out-of-range page,
    /// cycle, or ran off the end of the file) before all declared bytes
    /// were recovered. The record is still decoded from whatever bytes were
    /// recovered.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    TableInterior {
        left_child_page: u32,
        row_id: i64,
    },
    TableLeaf {
        row_id: i64,
        record: Record,
        overflow_pages: Vec<u32>,
    },
    IndexLeaf {
        record: Record,
        overflow_pages: Vec<u32>,
    },
    IndexInterior {
        left_child_page: u32,
        record: Record,
        overflow_pages: Vec<u32>,
    },
}

/// `maxLocal`: the largest payload size that stays entirely on the b-tree
/// page (no overflow) for a table leaf cell, per the file format.
pub fn max_local(usable_size: u32) -> u32 {
    usable_size - 35
}

fn min_local(usable_size: u32) -> u32 {
    (usable_size - 12) * 32 / 255 - 23
}

/// Computes how many bytes of a payload of total length `payload_len` stay
/// local to the page, with the rest spilling to overflow pages. Mirrors the
/// file format's `local = minLocal + (payload - minLocal) mod (U - 4)`,
/// falling back to `minLocal` when that exceeds `maxLocal`.
pub fn local_payload_size(payload_len: u32, usable_size: u32) -> u32 {
    let max_local = max_local(usable_size);
    if payload_len <= max_local {
        return payload_len;
    }
    let min_local = min_local(usable_size);
    let surplus = min_local + (payload_len - min_local) % (usable_size - 4);
    if surplus <= max_local {
        surplus
    } else {
        min_local
    }
}

/// Decodes a record payload-header and serial-type vector, then the values
/// they describe, starting at `payload[0]`. Used both for ordinary cells
/// (where `payload` is the already-concatenated local+overflow bytes) and
/// for free-space-scavenged candidate records (where it is whatever bytes
/// follow a plausible header-length varint inside a freeblock).
pub fn decode_record(payload: &[u8], encoding: TextEncoding) -> Result<Record, CellError> {
    let (header_len, n) = read_varint(payload);
    if n == 0 || header_len < 1 {
        return Err(CellError::MalformedPayloadHeader);
    }
    let header_len = header_len as usize;
    let mut offset = n;
    let mut serial_types = Vec::new();
    while offset < header_len {
        let (code, n) = read_varint(&payload[offset..]);
        if n == 0 {
            return Err(CellError::MalformedPayloadHeader);
        }
        serial_types.push(code);
        offset += n;
    }
    if offset != header_len {
        // The serial-type vector overran the declared header length.
        return Err(CellError::MalformedPayloadHeader);
    }

    let mut fields = Vec::with_capacity(serial_types.len());
    let mut data_offset = header_len;
    for code in serial_types {
        let len = serial_type::value_byte_len(code).ok_or(CellError::MalformedPayloadHeader)?;
        let slice = payload
            .get(data_offset..data_offset + len)
            .ok_or(CellError::MalformedPayloadHeader)?;
        let value =
            serial_type::decode(code, slice, encoding).map_err(|_| CellError::MalformedPayloadHeader)?;
        fields.push(value);
        data_offset += len;
    }
    Ok(Record {
        fields,
        truncated: false,
    })
}

/// Reads a payload that may spill to overflow pages: `payload_len` total
/// bytes, `local_off` local bytes available starting at `local_off` in
/// `page`. Returns the fully concatenated bytes plus the list of overflow
/// pages visited (empty if the payload never spilled).
fn read_spillable_payload(
    view: &FileView,
    page: &[u8],
    local_off: usize,
    payload_len: i64,
) -> Result<(Vec<u8>, Vec<u32>, bool), CellError> {
    if payload_len < 0 {
        return Err(CellError::MalformedPayloadHeader);
    }
    let payload_len = payload_len as usize;
    let usable = view.usable_size();
    let local_len = local_payload_size(payload_len as u32, usable) as usize;
    let local_bytes = page
        .get(local_off..local_off + local_len)
        .ok_or(CellError::OutOfBounds(local_off))?;

    if payload_len <= local_len {
        return Ok((local_bytes.to_vec(), Vec::new(), false));
    }

    let overflow_ptr_off = local_off + local_len;
    let first_overflow =
        read_u32(page, overflow_ptr_off).ok_or(CellError::OutOfBounds(overflow_ptr_off))?;
    let residual = payload_len - local_len;
    let result = overflow::follow(view, first_overflow, residual);

    let mut bytes = local_bytes.to_vec();
    bytes.extend_from_slice(&result.bytes);
    Ok((bytes, result.pages_visited, result.truncated))
}

/// Decodes the cell at `cell_offset` (relative to the start of `page`) as
/// the kind of cell `kind` describes. `page_num` is needed only to resolve
/// the file-header offset on page 1.
pub fn decode(
    kind: PageKind,
    view: &FileView,
    page: &[u8],
    cell_offset: usize,
    encoding: TextEncoding,
) -> Result<Cell, CellError> {
    match kind {
        PageKind::InteriorTable => {
            let left_child_page =
                read_u32(page, cell_offset).ok_or(CellError::OutOfBounds(cell_offset))?;
            let (row_id, n) = read_varint(&page[cell_offset + 4..]);
            if n == 0 {
                return Err(CellError::MalformedPayloadHeader);
            }
            Ok(Cell::TableInterior {
                left_child_page,
                row_id,
            })
        }
        PageKind::LeafTable => {
            let (payload_len, n1) = read_varint(&page[cell_offset..]);
            if n1 == 0 {
                return Err(CellError::MalformedPayloadHeader);
            }
            let (row_id, n2) = read_varint(&page[cell_offset + n1..]);
            if n2 == 0 {
                return Err(CellError::MalformedPayloadHeader);
            }
            let local_off = cell_offset + n1 + n2;
            let (payload, overflow_pages, truncated) =
                read_spillable_payload(view, page, local_off, payload_len)?;
            let mut record = decode_record(&payload, encoding)?;
            record.truncated = truncated;
            // A NULL serial type in the row-id column means the value is
            // the cell's own integer key.
            if let Some(first) = record.fields.first_mut() {
                if *first == Value::Null {
                    *first = Value::Int(row_id);
                }
            }
            Ok(Cell::TableLeaf {
                row_id,
                record,
                overflow_pages,
            })
        }
        PageKind::LeafIndex => {
            let (payload_len, n1) = read_varint(&page[cell_offset..]);
            if n1 == 0 {
                return Err(CellError::MalformedPayloadHeader);
            }
            let local_off = cell_offset + n1;
            let (payload, overflow_pages, truncated) =
                read_spillable_payload(view, page, local_off, payload_len)?;
            let mut record = decode_record(&payload, encoding)?;
            record.truncated = truncated;
            Ok(Cell::IndexLeaf {
                record,
                overflow_pages,
            })
        }
        PageKind::InteriorIndex => {
            let left_child_page =
                read_u32(page, cell_offset).ok_or(CellError::OutOfBounds(cell_offset))?;
            let (payload_len, n1) = read_varint(&page[cell_offset + 4..]);
            if n1 == 0 {
                return Err(CellError::MalformedPayloadHeader);
            }
            let local_off = cell_offset + 4 + n1;
            let (payload, overflow_pages, truncated) =
                read_spillable_payload(view, page, local_off, payload_len)?;
            let mut record = decode_record(&payload, encoding)?;
            record.truncated = truncated;
            Ok(Cell::IndexInterior {
                left_child_page,
                record,
                overflow_pages,
            })
        }
        other => Err(CellError::UnsupportedPageKind(other)),
    }
}

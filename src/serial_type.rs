//! Decodes a SQLite record's serial-type codes into `sql_value::Value`s.
//!
//! Two details matter here:
//!
//! * int48 (serial type 5) is decoded as a *signed* big-endian 48-bit
//!   integer — the record format requires two's-complement, not a raw
//!   unsigned read.
//! * Text decoding honours the file's declared text encoding instead of
//!   assuming UTF-8, and falls back to raw bytes (as a `Value::Blob`) on a
//!   decode failure rather than erroring the whole cell.

use crate::dbheader::TextEncoding;
use crate::sql_value::Value;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Serial type {0} is reserved and never appears in a well-formed record.")]
    ReservedSerialType(i64),
    #[error("Serial type {0} is negative and not a valid serial type code.")]
    NegativeSerialType(i64),
    #[error("Value bytes for serial type {0} are truncated.")]
    Truncated(i64),
}

/// Number of payload bytes a value of this serial type occupies, or `None`
/// if the code is reserved/invalid (10, 11, or negative).
pub fn value_byte_len(serial_type: i64) -> Option<usize> {
    match serial_type {
        0 | 8 | 9 => Some(0),
        1 => Some(1),
        2 => Some(2),
        3 => Some(3),
        4 => Some(4),
        5 => Some(6),
        6 | 7 => Some(8),
        10 | 11 => None,
        n if n >= 12 => Some(if n % 2 == 0 {
            ((n - 12) / 2) as usize
        } else {
            ((n - 13) / 2) as usize
        }),
        _ => None,
    }
}

fn sign_extend(bytes: &[u8], width: usize) -> i64 {
    let mut buf = [0u8; 8];
    let negative = bytes[0] & 0x80 != 0;
    if negative {
        buf = [0xffu8; 8];
    }
    buf[8 - width..].copy_from_slice(bytes);
    i64::from_be_bytes(buf)
}

fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Value {
    let decoded = match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(|s| s.to_string()),
        TextEncoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
        TextEncoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
    };
    match decoded {
        Some(s) => Value::Text(s),
        // Fall back to raw bytes rather than failing the whole cell.
        None => Value::Blob(bytes.to_vec()),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| unit([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Decodes the value bytes for one serial type into a `Value`. `data` must
/// already be sliced to exactly `value_byte_len(serial_type)` bytes by the
/// caller (the record/cell decoder), except that a short slice is treated
/// as `Truncated` rather than panicking.
pub fn decode(serial_type: i64, data: &[u8], encoding: TextEncoding) -> Result<Value, Error> {
    if serial_type < 0 {
        return Err(Error::NegativeSerialType(serial_type));
    }
    if serial_type == 10 || serial_type == 11 {
        return Err(Error::ReservedSerialType(serial_type));
    }
    let want = value_byte_len(serial_type).ok_or(Error::ReservedSerialType(serial_type))?;
    if data.len() < want {
        return Err(Error::Truncated(serial_type));
    }
    let data = &data[..want];
    Ok(match serial_type {
        0 => Value::Null,
        1 => Value::Int(data[0] as i8 as i64),
        2 => Value::Int(sign_extend(data, 2)),
        3 => Value::Int(sign_extend(data, 3)),
        4 => Value::Int(sign_extend(data, 4)),
        5 => Value::Int(sign_extend(data, 6)),
        6 => Value::Int(i64::from_be_bytes(data.try_into().unwrap())),
        7 => Value::Real(f64::from_be_bytes(data.try_into().unwrap())),
        8 => Value::Int(0),
        9 => Value::Int(1),
        n if n >= 12 && n % 2 == 0 => Value::Blob(data.to_vec()),
        n if n >= 12 => decode_text(data, encoding),
        _ => unreachable!("handled above"),
    })
}

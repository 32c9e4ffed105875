//! Decode/encode signal fields against a CAN message payload.
//!
//! Both operations take a compiled [`CodecHandle`] and are pure: no state, no I/O.
//! Offsets and lengths are byte-granular and multi-byte integers are little-endian.
//! Errors are fail-closed; a short payload or a bad transform never yields a
//! truncated or zero-filled value.

use crate::descriptor::{CodecHandle, DataType, FieldDescriptor};
use crate::script;
use crate::value::SignalValue;
use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("field bytes {offset}..{end} out of bounds for a {payload}-byte payload")]
    OutOfBounds {
        offset: usize,
        end: usize,
        payload: usize,
    },
    #[error("unsupported string encoding {0:?}")]
    UnsupportedEncoding(String),
    #[error("text field: {0}")]
    Text(String),
    #[error("custom script: {0}")]
    CustomScript(String),
    #[error("cannot encode {got} as {expected:?}")]
    WrongType { expected: DataType, got: String },
    #[error("value {value} does not fit in {bytes} byte(s)")]
    Overflow { value: i128, bytes: u16 },
}

/// Decode one signal from `payload`.
///
/// Reads `data_length` bytes at `data_offset`, interprets them per the descriptor's
/// kind, then runs the read transform when one is set. The transform output replaces
/// the built-in interpretation.
pub fn decode(handle: &CodecHandle, payload: &[u8]) -> Result<SignalValue, CodecError> {
    let d = handle.descriptor();
    let raw = field_bytes(d, payload)?;
    let value = match d.data_type {
        DataType::Bool => {
            let bits = load_unsigned(raw);
            SignalValue::Bool(((bits & d.boolean_mask) != 0) ^ d.boolean_invert)
        }
        DataType::Float => SignalValue::Float(LittleEndian::read_f32(raw)),
        DataType::Double => SignalValue::Double(LittleEndian::read_f64(raw)),
        DataType::Str => decode_text(raw, &d.data_encoding)?,
        DataType::Custom => {
            if d.custom_script_read.is_some() {
                // The transform wants a primitive; hand it the unsigned load.
                SignalValue::U64(load_unsigned(raw))
            } else {
                SignalValue::Bytes(raw.to_vec())
            }
        }
        _ => decode_integer(d.data_type, raw),
    };
    match &d.custom_script_read {
        Some(src) => script::transform(src, &value),
        None => Ok(value),
    }
}

/// Encode `value` as this signal's field bytes (exactly `data_length` bytes, ready
/// to splice into the payload at `data_offset`).
///
/// When a write transform is set, it runs first and its output is what gets packed.
pub fn encode(handle: &CodecHandle, value: &SignalValue) -> Result<Vec<u8>, CodecError> {
    let d = handle.descriptor();
    let transformed;
    let value = match &d.custom_script_write {
        Some(src) => {
            transformed = script::transform(src, value)?;
            &transformed
        }
        None => value,
    };
    let len = d.data_length as usize;
    match d.data_type {
        DataType::Bool => {
            let b = value.as_bool().ok_or_else(|| wrong_type(d, value))?;
            let bits = if b ^ d.boolean_invert { d.boolean_mask } else { 0 };
            Ok(store_unsigned(bits, len))
        }
        DataType::Float => {
            let x = value.as_f64().ok_or_else(|| wrong_type(d, value))?;
            let mut out = vec![0u8; 4];
            LittleEndian::write_f32(&mut out, x as f32);
            Ok(out)
        }
        DataType::Double => {
            let x = value.as_f64().ok_or_else(|| wrong_type(d, value))?;
            let mut out = vec![0u8; 8];
            LittleEndian::write_f64(&mut out, x);
            Ok(out)
        }
        DataType::Str => {
            let s = value.as_text().ok_or_else(|| wrong_type(d, value))?;
            encode_text(s, &d.data_encoding, len)
        }
        DataType::Custom => match value {
            SignalValue::Bytes(b) => {
                if b.len() != len {
                    return Err(CodecError::Overflow {
                        value: b.len() as i128,
                        bytes: d.data_length,
                    });
                }
                Ok(b.clone())
            }
            other => {
                let raw = other.as_u64().ok_or_else(|| wrong_type(d, other))?;
                check_unsigned_fits(raw, d.data_length)?;
                Ok(store_unsigned(raw, len))
            }
        },
        kind if kind.is_signed() => {
            let n = value.as_i64().ok_or_else(|| wrong_type(d, value))?;
            check_signed_fits(n, d.data_length)?;
            Ok(store_unsigned(n as u64, len))
        }
        _ => {
            let n = value.as_u64().ok_or_else(|| wrong_type(d, value))?;
            check_unsigned_fits(n, d.data_length)?;
            Ok(store_unsigned(n, len))
        }
    }
}

/// Encode `value` and splice it into `payload` in place.
pub fn encode_into(
    handle: &CodecHandle,
    payload: &mut [u8],
    value: &SignalValue,
) -> Result<(), CodecError> {
    let d = handle.descriptor();
    let offset = d.data_offset as usize;
    let end = offset + d.data_length as usize;
    if end > payload.len() {
        return Err(CodecError::OutOfBounds {
            offset,
            end,
            payload: payload.len(),
        });
    }
    let bytes = encode(handle, value)?;
    payload[offset..end].copy_from_slice(&bytes);
    Ok(())
}

fn wrong_type(d: &FieldDescriptor, value: &SignalValue) -> CodecError {
    CodecError::WrongType {
        expected: d.data_type,
        got: format!("{:?}", value),
    }
}

fn field_bytes<'a>(d: &FieldDescriptor, payload: &'a [u8]) -> Result<&'a [u8], CodecError> {
    let offset = d.data_offset as usize;
    let end = offset + d.data_length as usize;
    if end > payload.len() {
        return Err(CodecError::OutOfBounds {
            offset,
            end,
            payload: payload.len(),
        });
    }
    Ok(&payload[offset..end])
}

/// Little-endian unsigned load of up to 8 bytes. Compilation caps every numeric
/// field at 8 bytes, so `raw` always fits one word here.
fn load_unsigned(raw: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let n = raw.len().min(8);
    buf[..n].copy_from_slice(&raw[..n]);
    LittleEndian::read_u64(&buf)
}

/// Little-endian store into exactly `len` bytes. Bytes past the eighth are the
/// zero high-order part of the value's LE representation (script-less custom
/// fields may be wider than one word); narrowing below 8 is only reached after
/// an overflow check.
fn store_unsigned(value: u64, len: usize) -> Vec<u8> {
    let mut buf = [0u8; 8];
    LittleEndian::write_u64(&mut buf, value);
    let mut out = buf.to_vec();
    out.resize(len, 0);
    out
}

fn decode_integer(kind: DataType, raw: &[u8]) -> SignalValue {
    let bits = (raw.len() as u32) * 8;
    let unsigned = load_unsigned(raw);
    match kind {
        DataType::U8 => SignalValue::U8(unsigned as u8),
        DataType::U16 => SignalValue::U16(unsigned as u16),
        DataType::U32 => SignalValue::U32(unsigned as u32),
        DataType::U64 => SignalValue::U64(unsigned),
        DataType::I8 => SignalValue::I8(sign_extend(unsigned, bits) as i8),
        DataType::I16 => SignalValue::I16(sign_extend(unsigned, bits) as i16),
        DataType::I32 => SignalValue::I32(sign_extend(unsigned, bits) as i32),
        DataType::I64 => SignalValue::I64(sign_extend(unsigned, bits)),
        _ => SignalValue::U64(unsigned),
    }
}

fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits >= 64 {
        return raw as i64;
    }
    let sign = 1u64 << (bits - 1);
    if raw & sign != 0 {
        (raw | !((1u64 << bits) - 1)) as i64
    } else {
        raw as i64
    }
}

fn check_unsigned_fits(value: u64, bytes: u16) -> Result<(), CodecError> {
    if bytes >= 8 {
        return Ok(());
    }
    let max = (1u64 << (bytes as u32 * 8)) - 1;
    if value > max {
        return Err(CodecError::Overflow {
            value: value as i128,
            bytes,
        });
    }
    Ok(())
}

fn check_signed_fits(value: i64, bytes: u16) -> Result<(), CodecError> {
    if bytes >= 8 {
        return Ok(());
    }
    let bits = bytes as u32 * 8;
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    if value < min || value > max {
        return Err(CodecError::Overflow {
            value: value as i128,
            bytes,
        });
    }
    Ok(())
}

fn decode_text(raw: &[u8], encoding: &str) -> Result<SignalValue, CodecError> {
    // CAN string fields are NUL-padded to the field width.
    let trimmed = match raw.iter().rposition(|&b| b != 0) {
        Some(i) => &raw[..=i],
        None => &raw[..0],
    };
    let text = match encoding.to_ascii_lowercase().as_str() {
        "utf8" | "utf-8" => std::str::from_utf8(trimmed)
            .map_err(|e| CodecError::Text(e.to_string()))?
            .to_string(),
        "ascii" => {
            if let Some(b) = trimmed.iter().find(|&&b| b > 0x7f) {
                return Err(CodecError::Text(format!("byte 0x{:02X} is not ASCII", b)));
            }
            trimmed.iter().map(|&b| b as char).collect()
        }
        "latin1" => trimmed.iter().map(|&b| b as char).collect(),
        other => return Err(CodecError::UnsupportedEncoding(other.to_string())),
    };
    Ok(SignalValue::Text(text))
}

fn encode_text(s: &str, encoding: &str, len: usize) -> Result<Vec<u8>, CodecError> {
    let bytes: Vec<u8> = match encoding.to_ascii_lowercase().as_str() {
        "utf8" | "utf-8" => s.as_bytes().to_vec(),
        "ascii" => {
            if let Some(c) = s.chars().find(|c| !c.is_ascii()) {
                return Err(CodecError::Text(format!("{:?} is not ASCII", c)));
            }
            s.bytes().collect()
        }
        "latin1" => {
            let mut out = Vec::with_capacity(s.len());
            for c in s.chars() {
                let cp = c as u32;
                if cp > 0xff {
                    return Err(CodecError::Text(format!("{:?} is not Latin-1", c)));
                }
                out.push(cp as u8);
            }
            out
        }
        other => return Err(CodecError::UnsupportedEncoding(other.to_string())),
    };
    if bytes.len() > len {
        return Err(CodecError::Overflow {
            value: bytes.len() as i128,
            bytes: len as u16,
        });
    }
    let mut out = bytes;
    out.resize(len, 0);
    Ok(out)
}

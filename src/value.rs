//! Runtime signal values produced by decode and consumed by encode.

/// A single decoded signal value.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Bool(bool),
    Float(f32),
    Double(f64),
    Text(String),
    /// Raw field bytes (custom kind without a read transform).
    Bytes(Vec<u8>),
}

impl SignalValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SignalValue::U8(x) => Some(*x as u64),
            SignalValue::U16(x) => Some(*x as u64),
            SignalValue::U32(x) => Some(*x as u64),
            SignalValue::U64(x) => Some(*x),
            SignalValue::I8(x) if *x >= 0 => Some(*x as u64),
            SignalValue::I16(x) if *x >= 0 => Some(*x as u64),
            SignalValue::I32(x) if *x >= 0 => Some(*x as u64),
            SignalValue::I64(x) if *x >= 0 => Some(*x as u64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SignalValue::I8(x) => Some(*x as i64),
            SignalValue::I16(x) => Some(*x as i64),
            SignalValue::I32(x) => Some(*x as i64),
            SignalValue::I64(x) => Some(*x),
            SignalValue::U8(x) => Some(*x as i64),
            SignalValue::U16(x) => Some(*x as i64),
            SignalValue::U32(x) => Some(*x as i64),
            SignalValue::U64(x) => i64::try_from(*x).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SignalValue::Float(x) => Some(*x as f64),
            SignalValue::Double(x) => Some(*x),
            other => other.as_i64().map(|n| n as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SignalValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SignalValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SignalValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

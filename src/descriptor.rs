//! Byte-field descriptors: scalar kind, byte range, and decode options for one signal.
//!
//! A descriptor is plain editable data. Compiling it produces a [`CodecHandle`],
//! the realized form the codec decodes/encodes with; any edit discards the handle
//! until the descriptor is compiled again.

use serde::{Deserialize, Serialize};

/// Scalar kind of a signal field.
///
/// Integer kinds may be narrower than their natural width (`data_length` below the
/// type's byte width reads a sized little-endian integer with sign extension for
/// signed kinds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    #[serde(rename = "uint8")]
    U8,
    #[serde(rename = "uint16")]
    U16,
    #[serde(rename = "uint32")]
    U32,
    #[serde(rename = "uint64")]
    U64,
    #[serde(rename = "int8")]
    I8,
    #[serde(rename = "int16")]
    I16,
    #[serde(rename = "int32")]
    I32,
    #[serde(rename = "int64")]
    I64,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "string")]
    Str,
    #[serde(rename = "boolean")]
    Bool,
    #[serde(rename = "custom")]
    Custom,
}

impl DataType {
    pub fn is_signed(&self) -> bool {
        matches!(self, DataType::I8 | DataType::I16 | DataType::I32 | DataType::I64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::U8
                | DataType::U16
                | DataType::U32
                | DataType::U64
                | DataType::I8
                | DataType::I16
                | DataType::I32
                | DataType::I64
        )
    }

    /// Natural byte width for fixed-width kinds; `None` for string/boolean/custom.
    pub fn natural_width(&self) -> Option<u16> {
        match self {
            DataType::U8 | DataType::I8 => Some(1),
            DataType::U16 | DataType::I16 => Some(2),
            DataType::U32 | DataType::I32 | DataType::Float => Some(4),
            DataType::U64 | DataType::I64 | DataType::Double => Some(8),
            DataType::Str | DataType::Bool | DataType::Custom => None,
        }
    }
}

/// Field-level validation failures. Recoverable: reported in verdicts, never thrown
/// past the entity boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("message id {0:?} must be exactly 3 or 8 hex digits")]
    MalformedId(String),
    #[error("signal id must not be empty")]
    EmptyId,
    #[error("{field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
    #[error("unsupported string encoding {0:?}")]
    UnsupportedEncoding(String),
}

/// True if `name` is a text encoding the codec can decode.
pub fn encoding_supported(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "utf8" | "utf-8" | "ascii" | "latin1"
    )
}

/// Editable byte-field descriptor for one signal within a message payload.
///
/// Offsets and lengths are byte-granular; multi-byte integers are little-endian
/// (the wire convention of the supported adapters).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub data_type: DataType,
    /// Zero-based byte offset into the message payload.
    pub data_offset: u16,
    /// Field width in bytes.
    pub data_length: u16,
    /// Display unit; no effect on decoding.
    pub data_unit: String,
    /// Text encoding, used only for string kinds.
    pub data_encoding: String,
    /// Mask applied to the raw bits before interpreting a boolean field.
    pub boolean_mask: u64,
    /// Flips the post-mask boolean result.
    pub boolean_invert: bool,
    /// Transform expression applied to the raw primitive after decode.
    pub custom_script_read: Option<String>,
    /// Transform expression applied to the given value before encode.
    pub custom_script_write: Option<String>,
}

impl Default for FieldDescriptor {
    fn default() -> Self {
        FieldDescriptor {
            data_type: DataType::U8,
            data_offset: 0,
            data_length: 1,
            data_unit: String::new(),
            data_encoding: "utf8".to_string(),
            boolean_mask: 0x01,
            boolean_invert: false,
            custom_script_read: None,
            custom_script_write: None,
        }
    }
}

impl FieldDescriptor {
    /// Compile into a runnable codec handle.
    ///
    /// `max_len` is the message's fixed payload length when its DLC is constrained;
    /// `None` defers the extent check to decode time. Custom transform scripts are
    /// deliberately not checked here: a script failure is a decode/encode-time error
    /// and does not invalidate the descriptor.
    pub fn compile(&self, max_len: Option<u16>) -> Result<CodecHandle, FieldError> {
        if self.data_length == 0 {
            return Err(FieldError::OutOfRange {
                field: "data_length",
                reason: "must be greater than zero".to_string(),
            });
        }
        match self.data_type {
            DataType::Float => {
                if self.data_length != 4 {
                    return Err(FieldError::OutOfRange {
                        field: "data_length",
                        reason: "float fields must be exactly 4 bytes".to_string(),
                    });
                }
            }
            DataType::Double => {
                if self.data_length != 8 {
                    return Err(FieldError::OutOfRange {
                        field: "data_length",
                        reason: "double fields must be exactly 8 bytes".to_string(),
                    });
                }
            }
            DataType::Bool => {
                if self.data_length > 8 {
                    return Err(FieldError::OutOfRange {
                        field: "data_length",
                        reason: "boolean fields are at most 8 bytes".to_string(),
                    });
                }
            }
            DataType::Str => {
                if !encoding_supported(&self.data_encoding) {
                    return Err(FieldError::UnsupportedEncoding(self.data_encoding.clone()));
                }
            }
            DataType::Custom => {
                // A transform works on a single primitive, so the raw load is capped
                // at one 64-bit word. Script-less custom fields pass bytes through.
                if (self.custom_script_read.is_some() || self.custom_script_write.is_some())
                    && self.data_length > 8
                {
                    return Err(FieldError::OutOfRange {
                        field: "data_length",
                        reason: "custom fields with a transform are at most 8 bytes".to_string(),
                    });
                }
            }
            kind => {
                let width = kind.natural_width().unwrap_or(8);
                if self.data_length > width {
                    return Err(FieldError::OutOfRange {
                        field: "data_length",
                        reason: format!("{} bytes exceeds the {}-byte type width", self.data_length, width),
                    });
                }
            }
        }
        if let Some(max) = max_len {
            let end = self.data_offset as u32 + self.data_length as u32;
            if end > max as u32 {
                return Err(FieldError::OutOfRange {
                    field: "data_offset",
                    reason: format!("field ends at byte {} but the message is {} bytes", end, max),
                });
            }
        }
        Ok(CodecHandle {
            descriptor: self.clone(),
        })
    }
}

/// Realized, runnable form of a descriptor. Only the compiler constructs one, so a
/// handle always wraps a descriptor that passed the static checks.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecHandle {
    descriptor: FieldDescriptor,
}

impl CodecHandle {
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

/// Compilation state of a parser's descriptor.
///
/// `NotCompiled` means "awaiting first validation" (fresh or just edited), which is
/// distinct from `Failed` (checks ran and rejected it) and `Compiled` (ready to
/// decode).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CompileState {
    #[default]
    NotCompiled,
    Compiled(CodecHandle),
    Failed(String),
}

impl CompileState {
    pub fn handle(&self) -> Option<&CodecHandle> {
        match self {
            CompileState::Compiled(h) => Some(h),
            _ => None,
        }
    }
}

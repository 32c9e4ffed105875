//! # candef — CAN message definition model and signal codec
//!
//! Configuration model for a CAN protocol adapter: each message definition carries
//! a hex identifier, an optional data length code, direction flags, and a set of
//! named *parsers* (signal extractors) that decode/encode byte fields within the
//! payload. The crate keeps those definitions well-formed for the decode pipeline
//! that consumes them; it does not touch the bus.
//!
//! ## Pieces
//!
//! - **Entities**: [`Message`] owns an insertion-ordered map of storage key →
//!   [`Parser`]; keys are opaque, collision-resistant, and never reused.
//! - **Validation**: a message is valid iff its own fields pass and every cached
//!   parser verdict is true. Mutations revalidate only the touched entity and
//!   recompute the AND; verdict changes are reported through an [`EventSink`].
//! - **Codec**: [`decode`]/[`encode`] read and write one signal against a payload
//!   buffer, byte-granular, little-endian, fail-closed. Optional `evalexpr`
//!   transforms (`value` in, one primitive out) supersede the built-in
//!   interpretation.
//! - **Interchange**: [`MessageConfig`]/[`ParserConfig`] are the only serialized
//!   shapes the core reads or writes.
//!
//! ## Example
//!
//! ```
//! use candef::{Message, MessageConfig, ParserUpdate, NullSink};
//!
//! let mut msg = Message::from_config(&MessageConfig {
//!     id: "355".to_string(),
//!     dlc: 8,
//!     ..MessageConfig::default()
//! });
//! let key = msg.add_parser(&mut NullSink);
//! assert!(!msg.is_valid()); // fresh parser has no signal id yet
//! msg.update_parser(&key, ParserUpdate {
//!     id: Some("soc".to_string()),
//!     ..ParserUpdate::default()
//! }, &mut NullSink);
//! assert!(msg.is_valid());
//! ```

pub mod codec;
pub mod config;
pub mod descriptor;
pub mod event;
pub mod keygen;
pub mod message;
pub mod parser;
mod script;
pub mod validity;
pub mod value;

pub use codec::{decode, encode, encode_into, CodecError};
pub use config::{MessageConfig, ParserConfig};
pub use descriptor::{CodecHandle, CompileState, DataType, FieldDescriptor, FieldError};
pub use event::{EventSink, NullSink, RecordedEvent, RecordingSink};
pub use message::{id_is_well_formed, Message, MessageUpdate, MessageVerdict};
pub use parser::{Parser, ParserUpdate, ParserVerdict};
pub use validity::ValidityCache;
pub use value::SignalValue;

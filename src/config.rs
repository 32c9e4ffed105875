//! Serialized configuration shapes exchanged with the editor shell.
//!
//! These records are the only forms the core reads or writes; how the shell stores
//! them is its own business. Field names follow the adapter's JSON convention
//! (camelCase), and every field has a default so partial records load.

use crate::descriptor::{DataType, FieldDescriptor};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One signal extractor as configured by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// User-facing signal identifier (distinct from the storage key).
    pub id: String,
    pub name: String,
    pub data_type: DataType,
    pub data_offset: u16,
    pub data_length: u16,
    pub data_unit: String,
    pub data_encoding: String,
    pub boolean_mask: u64,
    pub boolean_invert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_script_read: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_script_write: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let d = FieldDescriptor::default();
        ParserConfig {
            id: String::new(),
            name: String::new(),
            data_type: d.data_type,
            data_offset: d.data_offset,
            data_length: d.data_length,
            data_unit: d.data_unit,
            data_encoding: d.data_encoding,
            boolean_mask: d.boolean_mask,
            boolean_invert: d.boolean_invert,
            custom_script_read: None,
            custom_script_write: None,
        }
    }
}

impl ParserConfig {
    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor {
            data_type: self.data_type,
            data_offset: self.data_offset,
            data_length: self.data_length,
            data_unit: self.data_unit.clone(),
            data_encoding: self.data_encoding.clone(),
            boolean_mask: self.boolean_mask,
            boolean_invert: self.boolean_invert,
            custom_script_read: self.custom_script_read.clone(),
            custom_script_write: self.custom_script_write.clone(),
        }
    }
}

/// One CAN message definition as configured by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageConfig {
    /// Hex message id: 3 digits (standard frame) or 8 digits (extended frame).
    pub id: String,
    /// Data length code in `[-1, 8]`; `-1` means unconstrained.
    pub dlc: i8,
    pub name: String,
    pub receive: bool,
    pub send: bool,
    pub autosend: bool,
    /// Storage key -> parser, insertion-ordered.
    pub parsers: IndexMap<String, ParserConfig>,
    /// `None` marks a message synthesized from live traffic rather than configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        MessageConfig {
            id: String::new(),
            dlc: -1,
            name: String::new(),
            receive: false,
            send: false,
            autosend: false,
            parsers: IndexMap::new(),
            uuid: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: MessageConfig = serde_json::from_str(r#"{"id": "1AB"}"#).unwrap();
        assert_eq!(cfg.id, "1AB");
        assert_eq!(cfg.dlc, -1);
        assert!(!cfg.send && !cfg.receive && !cfg.autosend);
        assert!(cfg.parsers.is_empty());
        assert!(cfg.uuid.is_none());
    }

    #[test]
    fn parser_config_json_round_trip() {
        let json = r#"{
            "id": "soc",
            "dataType": "uint16",
            "dataOffset": 2,
            "dataLength": 2,
            "dataUnit": "%",
            "customScriptRead": "value / 10"
        }"#;
        let cfg: ParserConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.data_type, DataType::U16);
        assert_eq!(cfg.data_offset, 2);
        assert_eq!(cfg.custom_script_read.as_deref(), Some("value / 10"));
        let back = serde_json::to_string(&cfg).unwrap();
        let again: ParserConfig = serde_json::from_str(&back).unwrap();
        assert_eq!(cfg, again);
    }

    #[test]
    fn parser_order_survives_round_trip() {
        let json = r#"{"id": "355", "parsers": {
            "k-b": {"id": "soc"},
            "k-a": {"id": "soh"}
        }}"#;
        let cfg: MessageConfig = serde_json::from_str(json).unwrap();
        let keys: Vec<_> = cfg.parsers.keys().cloned().collect();
        assert_eq!(keys, vec!["k-b", "k-a"]);
    }
}

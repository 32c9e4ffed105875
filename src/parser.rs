//! Parser entity: one signal extractor owned by a message.
//!
//! A parser is identity metadata (user-facing signal id, label) plus a byte-field
//! descriptor and its compile state. Edits go through [`Parser::apply`], which
//! merges partial fields and recompiles, so the compile state can never silently
//! outlive an edit.

use crate::config::ParserConfig;
use crate::descriptor::{CompileState, DataType, FieldDescriptor, FieldError};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Parser {
    id: String,
    name: String,
    descriptor: FieldDescriptor,
    instance: CompileState,
}

/// Partial update for a parser; `None` leaves a field untouched. The script fields
/// are doubly optional so an update can set or clear a transform.
#[derive(Debug, Clone, Default)]
pub struct ParserUpdate {
    pub id: Option<String>,
    pub name: Option<String>,
    pub data_type: Option<DataType>,
    pub data_offset: Option<u16>,
    pub data_length: Option<u16>,
    pub data_unit: Option<String>,
    pub data_encoding: Option<String>,
    pub boolean_mask: Option<u64>,
    pub boolean_invert: Option<bool>,
    pub custom_script_read: Option<Option<String>>,
    pub custom_script_write: Option<Option<String>>,
}

/// Outcome of a parser validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserVerdict {
    pub is_valid: bool,
    /// Which checks failed, empty when valid.
    pub errors: Vec<FieldError>,
}

impl Parser {
    /// A fresh, deliberately incomplete parser: default descriptor, empty signal
    /// id, not yet compiled. Invalid until the operator names it.
    pub fn new() -> Self {
        Parser {
            id: String::new(),
            name: String::new(),
            descriptor: FieldDescriptor::default(),
            instance: CompileState::NotCompiled,
        }
    }

    /// Build from a stored config and validate immediately.
    pub fn from_config(cfg: &ParserConfig, max_len: Option<u16>) -> (Self, ParserVerdict) {
        let mut parser = Parser {
            id: cfg.id.clone(),
            name: cfg.name.clone(),
            descriptor: cfg.descriptor(),
            instance: CompileState::NotCompiled,
        };
        let verdict = parser.recompile(max_len);
        (parser, verdict)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn instance(&self) -> &CompileState {
        &self.instance
    }

    /// Valid means the last validation pass compiled the descriptor and the signal
    /// id is non-empty. A never-validated parser is not valid.
    pub fn is_valid(&self) -> bool {
        matches!(self.instance, CompileState::Compiled(_))
    }

    /// Merge partial fields, then recompile against the owning message's fixed
    /// payload length (`None` when the DLC is unconstrained).
    pub fn apply(&mut self, update: ParserUpdate, max_len: Option<u16>) -> ParserVerdict {
        if let Some(id) = update.id {
            self.id = id;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(v) = update.data_type {
            self.descriptor.data_type = v;
        }
        if let Some(v) = update.data_offset {
            self.descriptor.data_offset = v;
        }
        if let Some(v) = update.data_length {
            self.descriptor.data_length = v;
        }
        if let Some(v) = update.data_unit {
            self.descriptor.data_unit = v;
        }
        if let Some(v) = update.data_encoding {
            self.descriptor.data_encoding = v;
        }
        if let Some(v) = update.boolean_mask {
            self.descriptor.boolean_mask = v;
        }
        if let Some(v) = update.boolean_invert {
            self.descriptor.boolean_invert = v;
        }
        if let Some(v) = update.custom_script_read {
            self.descriptor.custom_script_read = v;
        }
        if let Some(v) = update.custom_script_write {
            self.descriptor.custom_script_write = v;
        }
        self.recompile(max_len)
    }

    /// Re-run validation without changing any field. Used when the surrounding
    /// message requests an explicit revalidation (e.g. after a DLC change).
    pub fn revalidate(&mut self, max_len: Option<u16>) -> ParserVerdict {
        self.recompile(max_len)
    }

    fn recompile(&mut self, max_len: Option<u16>) -> ParserVerdict {
        let mut errors = Vec::new();
        if self.id.is_empty() {
            errors.push(FieldError::EmptyId);
        }
        match self.descriptor.compile(max_len) {
            Ok(handle) if errors.is_empty() => {
                self.instance = CompileState::Compiled(handle);
            }
            Ok(_) => {
                self.instance = CompileState::Failed(errors[0].to_string());
            }
            Err(e) => {
                self.instance = CompileState::Failed(e.to_string());
                errors.push(e);
            }
        }
        let is_valid = errors.is_empty();
        if !is_valid {
            warn!(signal = %self.id, ?errors, "parser failed validation");
        }
        ParserVerdict { is_valid, errors }
    }

    pub fn to_config(&self) -> ParserConfig {
        ParserConfig {
            id: self.id.clone(),
            name: self.name.clone(),
            data_type: self.descriptor.data_type,
            data_offset: self.descriptor.data_offset,
            data_length: self.descriptor.data_length,
            data_unit: self.descriptor.data_unit.clone(),
            data_encoding: self.descriptor.data_encoding.clone(),
            boolean_mask: self.descriptor.boolean_mask,
            boolean_invert: self.descriptor.boolean_invert,
            custom_script_read: self.descriptor.custom_script_read.clone(),
            custom_script_write: self.descriptor.custom_script_write.clone(),
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_parser_is_not_valid() {
        let p = Parser::new();
        assert!(!p.is_valid());
        assert_eq!(*p.instance(), CompileState::NotCompiled);
    }

    #[test]
    fn naming_makes_the_default_parser_valid() {
        let mut p = Parser::new();
        let verdict = p.apply(
            ParserUpdate {
                id: Some("soc".to_string()),
                ..ParserUpdate::default()
            },
            None,
        );
        assert!(verdict.is_valid);
        assert!(p.instance().handle().is_some());
    }

    #[test]
    fn clearing_the_id_invalidates_again() {
        let mut p = Parser::new();
        p.apply(
            ParserUpdate {
                id: Some("soc".to_string()),
                ..ParserUpdate::default()
            },
            None,
        );
        let verdict = p.apply(
            ParserUpdate {
                id: Some(String::new()),
                ..ParserUpdate::default()
            },
            None,
        );
        assert!(!verdict.is_valid);
        assert_eq!(verdict.errors, vec![FieldError::EmptyId]);
        assert!(matches!(p.instance(), CompileState::Failed(_)));
    }

    #[test]
    fn extent_error_names_the_field() {
        let mut p = Parser::new();
        let verdict = p.apply(
            ParserUpdate {
                id: Some("volts".to_string()),
                data_type: Some(DataType::U32),
                data_offset: Some(6),
                data_length: Some(4),
                ..ParserUpdate::default()
            },
            Some(8),
        );
        assert!(!verdict.is_valid);
        assert!(matches!(
            verdict.errors[0],
            FieldError::OutOfRange { field: "data_offset", .. }
        ));
    }

    #[test]
    fn update_clears_a_transform() {
        let mut p = Parser::new();
        p.apply(
            ParserUpdate {
                id: Some("soc".to_string()),
                custom_script_read: Some(Some("value / 10".to_string())),
                ..ParserUpdate::default()
            },
            None,
        );
        assert!(p.descriptor().custom_script_read.is_some());
        p.apply(
            ParserUpdate {
                custom_script_read: Some(None),
                ..ParserUpdate::default()
            },
            None,
        );
        assert!(p.descriptor().custom_script_read.is_none());
    }
}

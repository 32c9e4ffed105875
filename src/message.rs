//! Message entity: a CAN message definition and its parsers.
//!
//! The message owns the insertion-ordered parser map and the validity cache.
//! Every mutation validates the touched entity, feeds the verdict into the cache,
//! and reports the aggregate before returning.

use crate::config::MessageConfig;
use crate::descriptor::FieldError;
use crate::event::EventSink;
use crate::keygen;
use crate::parser::{Parser, ParserUpdate, ParserVerdict};
use crate::validity::ValidityCache;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// A message id is exactly 3 hex digits (standard 11-bit frame) or exactly 8 hex
/// digits (extended 29-bit frame), case-insensitive. Anything else, including the
/// empty string, is malformed.
pub fn id_is_well_formed(id: &str) -> bool {
    (id.len() == 3 || id.len() == 8) && id.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone)]
pub struct Message {
    id: String,
    dlc: i8,
    name: String,
    receive: bool,
    send: bool,
    autosend: bool,
    uuid: Option<String>,
    parsers: IndexMap<String, Parser>,
    validity: ValidityCache,
}

/// Partial update for a message's own scalar fields; `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct MessageUpdate {
    pub id: Option<String>,
    pub dlc: Option<i8>,
    pub name: Option<String>,
    pub receive: Option<bool>,
    pub send: Option<bool>,
    pub autosend: Option<bool>,
    pub uuid: Option<Option<String>>,
}

/// Outcome of a message-field validation pass. `is_valid` is the aggregate verdict
/// (own fields AND cached parser verdicts), `errors` the own-field failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageVerdict {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

impl Message {
    /// Seed from a possibly partial configuration. Parsers are built and validated
    /// immediately; no events fire (call [`Message::revalidate`] with a sink to get
    /// the initial reports).
    pub fn from_config(cfg: &MessageConfig) -> Self {
        let dlc = cfg.dlc.clamp(-1, 8);
        let max_len = (dlc >= 0).then_some(dlc as u16);
        let mut parsers = IndexMap::new();
        let mut validity = ValidityCache::new(id_is_well_formed(&cfg.id));
        for (key, pc) in &cfg.parsers {
            if key.is_empty() {
                warn!(message = %cfg.id, "dropping parser with empty storage key");
                continue;
            }
            let (parser, verdict) = Parser::from_config(pc, max_len);
            validity.report_child(key, verdict.is_valid);
            parsers.insert(key.clone(), parser);
        }
        Message {
            id: cfg.id.clone(),
            dlc,
            name: cfg.name.clone(),
            receive: cfg.receive,
            send: cfg.send,
            autosend: cfg.autosend,
            uuid: cfg.uuid.clone(),
            parsers,
            validity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dlc(&self) -> i8 {
        self.dlc
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receive(&self) -> bool {
        self.receive
    }

    pub fn send(&self) -> bool {
        self.send
    }

    pub fn autosend(&self) -> bool {
        self.autosend
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// Numeric CAN id, available only for a well-formed hex id.
    pub fn id_num(&self) -> Option<u32> {
        if id_is_well_formed(&self.id) {
            u32::from_str_radix(&self.id, 16).ok()
        } else {
            None
        }
    }

    /// Extended (29-bit) frame format iff the id has 8 hex digits.
    pub fn is_extended(&self) -> bool {
        id_is_well_formed(&self.id) && self.id.len() == 8
    }

    /// Composite key disambiguating messages that share an id but declare
    /// different lengths: `"{id}-{dlc}"` when constrained, plain `"{id}"` otherwise.
    pub fn id_with_dlc(&self) -> String {
        if self.dlc >= 0 {
            format!("{}-{}", self.id, self.dlc)
        } else {
            self.id.clone()
        }
    }

    /// Fixed payload length in bytes, when the DLC constrains it.
    pub fn effective_len(&self) -> Option<u16> {
        (self.dlc >= 0).then_some(self.dlc as u16)
    }

    pub fn parsers(&self) -> impl Iterator<Item = (&str, &Parser)> {
        self.parsers.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn parser(&self, key: &str) -> Option<&Parser> {
        self.parsers.get(key)
    }

    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    /// Current aggregate verdict: own fields AND every cached parser verdict.
    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    /// Apply own-field changes. A malformed id is still stored (the operator sees
    /// their input back) but recorded as a field error; a DLC outside `[-1, 8]` is
    /// rejected without touching the stored value. Neither aborts the rest of the
    /// batch.
    pub fn apply(&mut self, update: MessageUpdate, sink: &mut dyn EventSink) -> MessageVerdict {
        let mut errors = Vec::new();
        let mut changed = false;
        if let Some(id) = update.id {
            if !id_is_well_formed(&id) {
                errors.push(FieldError::MalformedId(id.clone()));
            }
            if id != self.id {
                self.id = id;
                changed = true;
            }
        }
        if let Some(dlc) = update.dlc {
            if (-1..=8).contains(&dlc) {
                if dlc != self.dlc {
                    self.dlc = dlc;
                    changed = true;
                }
            } else {
                errors.push(FieldError::OutOfRange {
                    field: "dlc",
                    reason: format!("{} is outside [-1, 8]", dlc),
                });
            }
        }
        if let Some(name) = update.name {
            changed |= name != self.name;
            self.name = name;
        }
        if let Some(v) = update.receive {
            changed |= v != self.receive;
            self.receive = v;
        }
        if let Some(v) = update.send {
            changed |= v != self.send;
            self.send = v;
        }
        // Deliberately accepted even when `send` is off; the relationship is not
        // structurally enforced.
        if let Some(v) = update.autosend {
            changed |= v != self.autosend;
            self.autosend = v;
        }
        if let Some(uuid) = update.uuid {
            changed |= uuid != self.uuid;
            self.uuid = uuid;
        }
        self.validity.set_own(id_is_well_formed(&self.id));
        let message_id = self.id_with_dlc();
        if changed {
            let cfg = self.to_config();
            sink.message_changed(&message_id, &cfg);
        }
        self.validity.publish(&message_id, sink, false);
        MessageVerdict {
            is_valid: self.validity.is_valid(),
            errors,
        }
    }

    /// Insert a fresh parser under a newly allocated key and return the key so the
    /// caller can focus it. The parser starts nameless, so its initial verdict is
    /// reported invalid before any edit.
    pub fn add_parser(&mut self, sink: &mut dyn EventSink) -> String {
        let key = keygen::allocate();
        // 128-bit keys do not collide; a hit here is a broken allocator.
        assert!(
            !self.parsers.contains_key(&key),
            "duplicate parser key {key}"
        );
        debug!(message = %self.id, key = %key, "adding parser");
        self.parsers.insert(key.clone(), Parser::new());
        sink.parser_validated(&key, false);
        self.validity.report_child(&key, false);
        let message_id = self.id_with_dlc();
        let cfg = self.to_config();
        sink.message_changed(&message_id, &cfg);
        self.validity.publish(&message_id, sink, false);
        key
    }

    /// Update one parser and fold its new verdict into the aggregate. Returns
    /// `None` when the key is unknown (deleted keys are never reused).
    pub fn update_parser(
        &mut self,
        key: &str,
        update: ParserUpdate,
        sink: &mut dyn EventSink,
    ) -> Option<ParserVerdict> {
        let max_len = self.effective_len();
        let parser = self.parsers.get_mut(key)?;
        let before = parser.to_config();
        let verdict = parser.apply(update, max_len);
        let changed = parser.to_config() != before;
        sink.parser_validated(key, verdict.is_valid);
        self.validity.report_child(key, verdict.is_valid);
        let message_id = self.id_with_dlc();
        if changed {
            let cfg = self.to_config();
            sink.message_changed(&message_id, &cfg);
        }
        self.validity.publish(&message_id, sink, false);
        Some(verdict)
    }

    /// Remove a parser permanently. Sibling keys and their order are untouched;
    /// the aggregate can only improve or stay the same when the removed child was
    /// the failing one.
    pub fn delete_parser(&mut self, key: &str, sink: &mut dyn EventSink) -> bool {
        if self.parsers.shift_remove(key).is_none() {
            return false;
        }
        debug!(message = %self.id, key = %key, "deleted parser");
        self.validity.remove_child(key);
        let message_id = self.id_with_dlc();
        let cfg = self.to_config();
        sink.message_changed(&message_id, &cfg);
        self.validity.publish(&message_id, sink, false);
        true
    }

    /// Re-run every check from scratch and report unconditionally: each parser is
    /// recompiled against the current DLC, then the aggregate is published even if
    /// it did not change.
    pub fn revalidate(&mut self, sink: &mut dyn EventSink) {
        self.validity.set_own(id_is_well_formed(&self.id));
        let max_len = self.effective_len();
        for (key, parser) in self.parsers.iter_mut() {
            let verdict = parser.revalidate(max_len);
            sink.parser_validated(key, verdict.is_valid);
            self.validity.report_child(key, verdict.is_valid);
        }
        let message_id = self.id_with_dlc();
        self.validity.publish(&message_id, sink, true);
    }

    pub fn to_config(&self) -> MessageConfig {
        MessageConfig {
            id: self.id.clone(),
            dlc: self.dlc,
            name: self.name.clone(),
            receive: self.receive,
            send: self.send,
            autosend: self.autosend,
            parsers: self
                .parsers
                .iter()
                .map(|(k, p)| (k.clone(), p.to_config()))
                .collect(),
            uuid: self.uuid.clone(),
        }
    }
}

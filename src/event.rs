//! Callbacks from the model to the editor shell.
//!
//! The shell implements [`EventSink`] and passes it into mutations; every callback
//! fires before the mutation returns, so the shell never observes a torn state.
//! `message_added` / `message_removed` belong to the shell's outer message
//! collection, which the core does not manage; they are part of the vocabulary so
//! one sink can drive the whole editor.

use crate::config::MessageConfig;

/// Receiver for model callbacks. All methods default to no-ops; implement only the
/// ones the shell cares about.
pub trait EventSink {
    /// A persisted field of the message changed (not fired for validity-only
    /// transitions).
    fn message_changed(&mut self, message_id: &str, config: &MessageConfig) {
        let _ = (message_id, config);
    }

    /// The message's aggregate verdict changed, or a revalidation was requested.
    fn message_validated(&mut self, message_id: &str, is_valid: bool) {
        let _ = (message_id, is_valid);
    }

    /// A parser was (re)validated; fired on every update, including the initial
    /// invalid report for a freshly added parser.
    fn parser_validated(&mut self, parser_key: &str, is_valid: bool) {
        let _ = (parser_key, is_valid);
    }

    fn message_added(&mut self, message_id: &str) {
        let _ = message_id;
    }

    fn message_removed(&mut self, message_id: &str) {
        let _ = message_id;
    }
}

/// Sink that ignores everything.
pub struct NullSink;

impl EventSink for NullSink {}

/// What a [`RecordingSink`] saw, in firing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    MessageChanged(String),
    MessageValidated(String, bool),
    ParserValidated(String, bool),
    MessageAdded(String),
    MessageRemoved(String),
}

/// Sink that records every callback; used by tests and by shells that replay
/// events into their own dispatch.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<RecordedEvent>,
}

impl EventSink for RecordingSink {
    fn message_changed(&mut self, message_id: &str, _config: &MessageConfig) {
        self.events.push(RecordedEvent::MessageChanged(message_id.to_string()));
    }

    fn message_validated(&mut self, message_id: &str, is_valid: bool) {
        self.events
            .push(RecordedEvent::MessageValidated(message_id.to_string(), is_valid));
    }

    fn parser_validated(&mut self, parser_key: &str, is_valid: bool) {
        self.events
            .push(RecordedEvent::ParserValidated(parser_key.to_string(), is_valid));
    }

    fn message_added(&mut self, message_id: &str) {
        self.events.push(RecordedEvent::MessageAdded(message_id.to_string()));
    }

    fn message_removed(&mut self, message_id: &str) {
        self.events.push(RecordedEvent::MessageRemoved(message_id.to_string()));
    }
}

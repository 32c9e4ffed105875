//! Aggregate validity for a message: own-field verdict AND every cached child
//! verdict.
//!
//! The cache holds each child's last reported verdict so a single changed field
//! never forces re-deriving unrelated siblings; the aggregator only recomputes the
//! AND. It never fails, it only computes a boolean.

use crate::event::EventSink;
use std::collections::HashMap;
use tracing::debug;

/// Per-message validity cache. Not persisted; created with the entity and
/// discarded with it.
#[derive(Debug, Clone, Default)]
pub struct ValidityCache {
    own_valid: bool,
    children: HashMap<String, bool>,
    last_reported: Option<bool>,
}

impl ValidityCache {
    pub fn new(own_valid: bool) -> Self {
        ValidityCache {
            own_valid,
            children: HashMap::new(),
            last_reported: None,
        }
    }

    pub fn set_own(&mut self, valid: bool) {
        self.own_valid = valid;
    }

    /// Record a child's latest verdict.
    pub fn report_child(&mut self, key: &str, valid: bool) {
        self.children.insert(key.to_string(), valid);
    }

    /// Forget a deleted child. Removing an invalid child can only improve or
    /// preserve the aggregate.
    pub fn remove_child(&mut self, key: &str) {
        self.children.remove(key);
    }

    pub fn child_verdict(&self, key: &str) -> Option<bool> {
        self.children.get(key).copied()
    }

    /// `own_fields_valid AND (AND over cached child verdicts)`. With zero children
    /// the AND is vacuously true.
    pub fn is_valid(&self) -> bool {
        self.own_valid && self.children.values().all(|v| *v)
    }

    /// Notify the sink when the verdict differs from the last one reported, or
    /// unconditionally when `force` is set (explicit revalidation).
    pub fn publish(&mut self, message_id: &str, sink: &mut dyn EventSink, force: bool) {
        let verdict = self.is_valid();
        if force || self.last_reported != Some(verdict) {
            debug!(message_id, verdict, "aggregate validity");
            sink.message_validated(message_id, verdict);
            self.last_reported = Some(verdict);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{RecordedEvent, RecordingSink};

    #[test]
    fn vacuous_and_is_true() {
        let cache = ValidityCache::new(true);
        assert!(cache.is_valid());
    }

    #[test]
    fn one_invalid_child_poisons_the_aggregate() {
        let mut cache = ValidityCache::new(true);
        cache.report_child("a", true);
        cache.report_child("b", false);
        assert!(!cache.is_valid());
        cache.report_child("b", true);
        assert!(cache.is_valid());
    }

    #[test]
    fn removing_the_failing_child_restores_validity() {
        let mut cache = ValidityCache::new(true);
        cache.report_child("a", true);
        cache.report_child("b", false);
        assert!(!cache.is_valid());
        cache.remove_child("b");
        assert!(cache.is_valid());
    }

    #[test]
    fn publish_only_on_change_unless_forced() {
        let mut cache = ValidityCache::new(true);
        let mut sink = RecordingSink::default();
        cache.publish("355", &mut sink, false);
        cache.publish("355", &mut sink, false);
        assert_eq!(
            sink.events,
            vec![RecordedEvent::MessageValidated("355".to_string(), true)]
        );
        cache.publish("355", &mut sink, true);
        assert_eq!(sink.events.len(), 2);
        cache.report_child("a", false);
        cache.publish("355", &mut sink, false);
        assert_eq!(
            sink.events.last(),
            Some(&RecordedEvent::MessageValidated("355".to_string(), false))
        );
    }
}

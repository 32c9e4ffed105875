//! Validity aggregation and event reporting across message/parser mutations.

use candef::{
    DataType, Message, MessageConfig, MessageUpdate, NullSink, ParserUpdate, RecordedEvent,
    RecordingSink,
};

fn message(id: &str, dlc: i8) -> Message {
    Message::from_config(&MessageConfig {
        id: id.to_string(),
        dlc,
        ..MessageConfig::default()
    })
}

#[test]
fn empty_message_with_valid_id_is_valid() {
    assert!(message("1AB", -1).is_valid());
    assert!(message("00A0123B", 8).is_valid());
}

#[test]
fn empty_message_with_bad_id_is_invalid() {
    assert!(!message("1A", -1).is_valid());
    assert!(!message("00A0123", -1).is_valid());
    assert!(!message("", -1).is_valid());
}

#[test]
fn fresh_parser_reports_invalid_before_any_edit() {
    let mut sink = RecordingSink::default();
    let mut msg = message("1AB", -1);
    let key = msg.add_parser(&mut sink);
    assert_eq!(
        sink.events.first(),
        Some(&RecordedEvent::ParserValidated(key.clone(), false))
    );
    assert!(!msg.is_valid());
}

#[test]
fn deleting_the_only_failing_parser_restores_validity() {
    let mut msg = message("1AB", -1);
    let good = msg.add_parser(&mut NullSink);
    msg.update_parser(
        &good,
        ParserUpdate {
            id: Some("soc".to_string()),
            ..ParserUpdate::default()
        },
        &mut NullSink,
    );
    let bad = msg.add_parser(&mut NullSink);
    assert!(!msg.is_valid());

    let mut sink = RecordingSink::default();
    assert!(msg.delete_parser(&bad, &mut sink));
    assert!(msg.is_valid());
    assert!(sink
        .events
        .contains(&RecordedEvent::MessageValidated("1AB".to_string(), true)));
}

#[test]
fn sibling_verdicts_are_cached_not_rederived() {
    let mut msg = message("1AB", 8);
    let a = msg.add_parser(&mut NullSink);
    msg.update_parser(
        &a,
        ParserUpdate {
            id: Some("a".to_string()),
            ..ParserUpdate::default()
        },
        &mut NullSink,
    );
    let b = msg.add_parser(&mut NullSink);
    msg.update_parser(
        &b,
        ParserUpdate {
            id: Some("b".to_string()),
            data_offset: Some(1),
            ..ParserUpdate::default()
        },
        &mut NullSink,
    );
    assert!(msg.is_valid());

    // Updating b alone must not emit a verdict for a.
    let mut sink = RecordingSink::default();
    msg.update_parser(
        &b,
        ParserUpdate {
            data_offset: Some(9),
            ..ParserUpdate::default()
        },
        &mut sink,
    );
    assert!(!msg.is_valid());
    assert!(!sink
        .events
        .iter()
        .any(|e| matches!(e, RecordedEvent::ParserValidated(k, _) if *k == a)));
}

#[test]
fn extent_violation_only_with_constrained_dlc() {
    let mut unconstrained = message("1AB", -1);
    let key = unconstrained.add_parser(&mut NullSink);
    let verdict = unconstrained
        .update_parser(
            &key,
            ParserUpdate {
                id: Some("wide".to_string()),
                data_type: Some(DataType::U64),
                data_offset: Some(4),
                data_length: Some(8),
                ..ParserUpdate::default()
            },
            &mut NullSink,
        )
        .unwrap();
    assert!(verdict.is_valid);

    let mut constrained = message("1AB", 8);
    let key = constrained.add_parser(&mut NullSink);
    let verdict = constrained
        .update_parser(
            &key,
            ParserUpdate {
                id: Some("wide".to_string()),
                data_type: Some(DataType::U64),
                data_offset: Some(4),
                data_length: Some(8),
                ..ParserUpdate::default()
            },
            &mut NullSink,
        )
        .unwrap();
    assert!(!verdict.is_valid);
}

#[test]
fn aggregate_reported_only_on_change() {
    let mut sink = RecordingSink::default();
    let mut msg = message("1AB", -1);
    // Three scalar edits; the verdict never changes, so at most one report (from
    // the first publish) may appear.
    for name in ["a", "b", "c"] {
        msg.apply(
            MessageUpdate {
                name: Some(name.to_string()),
                ..MessageUpdate::default()
            },
            &mut sink,
        );
    }
    let verdicts: Vec<_> = sink
        .events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::MessageValidated(..)))
        .collect();
    assert_eq!(verdicts.len(), 1);
}

#[test]
fn revalidate_reports_unconditionally_and_recompiles() {
    let mut msg = message("1AB", -1);
    let key = msg.add_parser(&mut NullSink);
    msg.update_parser(
        &key,
        ParserUpdate {
            id: Some("wide".to_string()),
            data_type: Some(DataType::U32),
            data_offset: Some(6),
            data_length: Some(4),
            ..ParserUpdate::default()
        },
        &mut NullSink,
    );
    assert!(msg.is_valid());

    // Constraining the DLC is accepted at set time; the stale parser verdict only
    // flips on the next compile, which revalidate forces.
    msg.apply(
        MessageUpdate {
            dlc: Some(8),
            ..MessageUpdate::default()
        },
        &mut NullSink,
    );
    assert!(msg.is_valid());

    let mut sink = RecordingSink::default();
    msg.revalidate(&mut sink);
    assert!(!msg.is_valid());
    assert_eq!(
        sink.events,
        vec![
            RecordedEvent::ParserValidated(key, false),
            RecordedEvent::MessageValidated("1AB-8".to_string(), false),
        ]
    );
}

#[test]
fn validity_events_use_the_composite_message_key() {
    let mut sink = RecordingSink::default();
    let mut msg = message("1AB", 4);
    msg.add_parser(&mut sink);
    assert!(sink
        .events
        .contains(&RecordedEvent::MessageValidated("1AB-4".to_string(), false)));
}

#[test]
fn noop_parser_update_does_not_fire_message_changed() {
    let mut msg = message("1AB", -1);
    let key = msg.add_parser(&mut NullSink);
    msg.update_parser(
        &key,
        ParserUpdate {
            id: Some("soc".to_string()),
            ..ParserUpdate::default()
        },
        &mut NullSink,
    );

    let mut sink = RecordingSink::default();
    // Empty update and a same-value update persist nothing.
    msg.update_parser(&key, ParserUpdate::default(), &mut sink).unwrap();
    msg.update_parser(
        &key,
        ParserUpdate {
            id: Some("soc".to_string()),
            ..ParserUpdate::default()
        },
        &mut sink,
    )
    .unwrap();
    assert!(!sink
        .events
        .iter()
        .any(|e| matches!(e, RecordedEvent::MessageChanged(_))));

    // A real field change still reports.
    msg.update_parser(
        &key,
        ParserUpdate {
            data_offset: Some(2),
            ..ParserUpdate::default()
        },
        &mut sink,
    )
    .unwrap();
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, RecordedEvent::MessageChanged(_))));
}

#[test]
fn message_changed_not_fired_for_validity_only_transitions() {
    let mut sink = RecordingSink::default();
    let mut msg = message("1AB", -1);
    // Re-applying identical values changes nothing persisted.
    msg.apply(
        MessageUpdate {
            dlc: Some(-1),
            ..MessageUpdate::default()
        },
        &mut sink,
    );
    assert!(!sink
        .events
        .iter()
        .any(|e| matches!(e, RecordedEvent::MessageChanged(_))));
}

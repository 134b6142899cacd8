use super::super::common::{PRIMARY_PARTITION, customers_task, primary_hash, subscription};
use velostream_fkjoin::velostream::error::{ErrorClassification, StreamsError};
use velostream_fkjoin::velostream::fkjoin::{
    CURRENT_VERSION, CombinedKey, Instruction, SubscriptionResponseWrapper, SubscriptionWrapper,
};
use velostream_fkjoin::velostream::processor::Record;
use velostream_fkjoin::velostream::state::{Change, ValueAndTimestamp};

const ALL_INSTRUCTIONS: [Instruction; 4] = [
    Instruction::DeleteKeyNoPropagate,
    Instruction::DeleteKeyAndPropagate,
    Instruction::PropagateNullIfNoForeignValue,
    Instruction::PropagateOnlyIfForeignValueAvailable,
];

fn response(foreign_value: Option<&str>) -> SubscriptionResponseWrapper<String> {
    SubscriptionResponseWrapper::new(
        Some(primary_hash()),
        foreign_value.map(str::to_string),
        PRIMARY_PARTITION,
    )
}

#[test]
fn test_instruction_outcomes_with_foreign_value() {
    for instruction in ALL_INSTRUCTIONS {
        let (table, mut task) = customers_task();
        table.put("c1".to_string(), "Alice".to_string(), 100);

        let output = task
            .process(subscription("order-1", Some("c1"), instruction, 50))
            .unwrap();

        let expected = match instruction {
            Instruction::DeleteKeyNoPropagate => vec![],
            // tombstone even though the customer exists
            Instruction::DeleteKeyAndPropagate => {
                vec![Record::new("order-1".to_string(), response(None), 100)]
            }
            Instruction::PropagateNullIfNoForeignValue
            | Instruction::PropagateOnlyIfForeignValueAvailable => {
                vec![Record::new("order-1".to_string(), response(Some("Alice")), 100)]
            }
        };
        assert_eq!(output, expected, "instruction {}", instruction);
    }
}

#[test]
fn test_instruction_outcomes_without_foreign_value() {
    for instruction in ALL_INSTRUCTIONS {
        let (_table, mut task) = customers_task();

        let output = task
            .process(subscription("order-1", Some("c404"), instruction, 50))
            .unwrap();

        let expected = match instruction {
            Instruction::DeleteKeyNoPropagate
            | Instruction::PropagateOnlyIfForeignValueAvailable => vec![],
            Instruction::DeleteKeyAndPropagate | Instruction::PropagateNullIfNoForeignValue => {
                vec![Record::new("order-1".to_string(), response(None), 50)]
            }
        };
        assert_eq!(output, expected, "instruction {}", instruction);
    }
}

#[test]
fn test_result_timestamp_is_max_of_inputs() {
    let cases = [
        // (foreign ts, subscription ts, expected)
        (100, 50, 100),
        (20, 50, 50),
        (70, 70, 70),
    ];
    for (foreign_ts, subscription_ts, expected) in cases {
        let (table, mut task) = customers_task();
        table.put("c1".to_string(), "Alice".to_string(), foreign_ts);

        let output = task
            .process(subscription(
                "order-1",
                Some("c1"),
                Instruction::PropagateOnlyIfForeignValueAvailable,
                subscription_ts,
            ))
            .unwrap();

        assert_eq!(output.len(), 1);
        assert_eq!(
            output[0].timestamp, expected,
            "foreign ts {} / subscription ts {}",
            foreign_ts, subscription_ts
        );
    }
}

#[test]
fn test_result_timestamp_without_foreign_value_is_subscription_timestamp() {
    let (_table, mut task) = customers_task();
    let output = task
        .process(subscription(
            "order-1",
            Some("c404"),
            Instruction::PropagateNullIfNoForeignValue,
            -5,
        ))
        .unwrap();
    assert_eq!(output[0].timestamp, -5);
}

#[test]
fn test_absent_foreign_key_skips_lookup() {
    let (table, mut task) = customers_task();
    // a row stored under the empty key must not be picked up
    table.put(String::new(), "Ghost".to_string(), 500);

    let output = task
        .process(subscription(
            "order-1",
            None,
            Instruction::PropagateNullIfNoForeignValue,
            50,
        ))
        .unwrap();

    assert_eq!(
        output,
        vec![Record::new("order-1".to_string(), response(None), 50)]
    );
}

#[test]
fn test_delete_key_no_propagate_ignores_store_contents() {
    let (table, mut task) = customers_task();
    table.put("c1".to_string(), "Alice".to_string(), 10);

    for fk in [Some("c1"), Some("c404"), None] {
        let output = task
            .process(subscription(
                "order-1",
                fk,
                Instruction::DeleteKeyNoPropagate,
                50,
            ))
            .unwrap();
        assert!(output.is_empty(), "foreign key {:?}", fk);
    }
}

#[test]
fn test_newer_subscription_version_is_rejected() {
    let (table, mut task) = customers_task();
    table.put("c1".to_string(), "Alice".to_string(), 10);

    let wrapper = SubscriptionWrapper::new(
        Some(primary_hash()),
        Instruction::PropagateOnlyIfForeignValueAvailable,
        Some("c1".to_string()),
        PRIMARY_PARTITION,
    )
    .with_version(CURRENT_VERSION + 1);
    let record = Record::new(
        CombinedKey::new("c1".to_string(), "order-1".to_string()),
        Change::insert(ValueAndTimestamp::new(wrapper, 50)),
        50,
    );

    let err = task.process(record).unwrap_err();
    match &err {
        StreamsError::UnsupportedVersion {
            version,
            max_supported,
            ..
        } => {
            assert_eq!(*version, CURRENT_VERSION + 1);
            assert_eq!(*max_supported, CURRENT_VERSION);
        }
        other => panic!("expected UnsupportedVersion, got {:?}", other),
    }
    assert_eq!(
        err.classification(),
        ErrorClassification::ProtocolIncompatibility
    );
    assert!(task.is_failed());
}

#[test]
fn test_missing_record_parts_are_fatal() {
    let valid = subscription(
        "order-1",
        Some("c1"),
        Instruction::PropagateNullIfNoForeignValue,
        50,
    );

    let no_key = Record {
        key: None,
        ..valid.clone()
    };
    let no_value = Record {
        value: None,
        ..valid.clone()
    };
    let no_new_value = Record {
        value: Some(Change::new(None, valid.value.clone().and_then(|c| c.new_value))),
        ..valid
    };

    for (record, field) in [(no_key, "key"), (no_value, "value"), (no_new_value, "newValue")] {
        let (_table, mut task) = customers_task();
        let err = task.process(record).unwrap_err();
        match &err {
            StreamsError::MissingRecordField { field: missing, .. } => {
                assert_eq!(*missing, field)
            }
            other => panic!("expected MissingRecordField, got {:?}", other),
        }
        assert_eq!(err.classification(), ErrorClassification::FatalInvariant);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("should never see a null"));
    }
}

#[test]
fn test_failed_task_refuses_further_records() {
    let (_table, mut task) = customers_task();
    let poisoned = Record {
        key: None,
        ..subscription(
            "order-1",
            Some("c1"),
            Instruction::PropagateNullIfNoForeignValue,
            50,
        )
    };
    task.process(poisoned).unwrap_err();

    let err = task
        .process(subscription(
            "order-2",
            Some("c1"),
            Instruction::PropagateNullIfNoForeignValue,
            60,
        ))
        .unwrap_err();
    assert!(matches!(err, StreamsError::TaskFailed { .. }));
}

#[test]
fn test_lookup_sees_latest_table_state() {
    let (table, mut task) = customers_task();
    let sub = || {
        subscription(
            "order-1",
            Some("c1"),
            Instruction::PropagateNullIfNoForeignValue,
            50,
        )
    };

    table.put("c1".to_string(), "Alice".to_string(), 10);
    let first = task.process(sub()).unwrap();
    assert_eq!(first[0].value, Some(response(Some("Alice"))));

    table.delete(&"c1".to_string());
    let second = task.process(sub()).unwrap();
    assert_eq!(second[0].value, Some(response(None)));
}

use velostream_fkjoin::velostream::error::StreamsError;
use velostream_fkjoin::velostream::fkjoin::{
    CURRENT_VERSION, CombinedKey, CombinedKeySerde, Instruction, RESPONSE_CURRENT_VERSION,
    SubscriptionResponseWrapper, SubscriptionResponseWrapperSerde, SubscriptionWrapper,
    SubscriptionWrapperSerde, UNKNOWN_PARTITION, VERSION_0, ValueHash,
};
use velostream_fkjoin::velostream::serialization::{
    I64Serde, Serde, SerializationError, StringSerde,
};

fn subscription_serde() -> SubscriptionWrapperSerde<String, StringSerde> {
    SubscriptionWrapperSerde::new(StringSerde)
}

#[test]
fn test_subscription_envelope_layout() {
    let hash = ValueHash::of(b"order-1");
    let wrapper = SubscriptionWrapper::new(
        Some(hash),
        Instruction::PropagateOnlyIfForeignValueAvailable,
        Some("c1".to_string()),
        7,
    );

    let bytes = subscription_serde().encode(&wrapper).unwrap();

    assert_eq!(bytes[0], CURRENT_VERSION as u8);
    assert_eq!(bytes[1], Instruction::PropagateOnlyIfForeignValueAvailable.code());
    assert_eq!(&bytes[2..18], hash.as_bytes());
    assert_eq!(&bytes[18..22], &7i32.to_be_bytes());
    assert_eq!(&bytes[22..], b"c1");
    assert_eq!(subscription_serde().decode(&bytes).unwrap(), wrapper);
}

#[test]
fn test_subscription_envelope_with_absent_fields() {
    let wrapper: SubscriptionWrapper<String> =
        SubscriptionWrapper::new(None, Instruction::DeleteKeyNoPropagate, None, 2);

    let bytes = subscription_serde().encode(&wrapper).unwrap();

    // flags byte, instruction, partition
    assert_eq!(bytes.len(), 6);
    assert_eq!(bytes[0] & 0xc0, 0xc0);
    assert_eq!(subscription_serde().decode(&bytes).unwrap(), wrapper);
}

#[test]
fn test_version_zero_subscription_has_unknown_partition() {
    let wrapper = SubscriptionWrapper::new(
        Some(ValueHash::of(b"v")),
        Instruction::PropagateNullIfNoForeignValue,
        Some("c1".to_string()),
        9,
    )
    .with_version(VERSION_0);

    let bytes = subscription_serde().encode(&wrapper).unwrap();
    let decoded = subscription_serde().decode(&bytes).unwrap();

    assert_eq!(decoded.version, VERSION_0);
    assert_eq!(decoded.primary_partition, UNKNOWN_PARTITION);
    assert_eq!(decoded.foreign_key.as_deref(), Some("c1"));
    assert!(decoded.check_version().is_ok());
}

#[test]
fn test_newer_subscription_version_rejected_on_decode() {
    let bytes = [(CURRENT_VERSION + 1) as u8, 0, 0, 0, 0, 0];
    let err = subscription_serde().decode(&bytes).unwrap_err();
    assert!(matches!(
        err,
        StreamsError::UnsupportedVersion { version, .. } if version == CURRENT_VERSION + 1
    ));
}

#[test]
fn test_unknown_instruction_rejected() {
    let bytes = [0xc0 | CURRENT_VERSION as u8, 42, 0, 0, 0, 1];
    let err = subscription_serde().decode(&bytes).unwrap_err();
    assert!(matches!(err, StreamsError::UnknownInstruction { code: 42 }));
}

#[test]
fn test_truncated_subscription_rejected() {
    let wrapper = SubscriptionWrapper::new(
        Some(ValueHash::of(b"v")),
        Instruction::DeleteKeyAndPropagate,
        Some("c1".to_string()),
        1,
    );
    let bytes = subscription_serde().encode(&wrapper).unwrap();

    // cut inside the hash
    let err = subscription_serde().decode(&bytes[..10]).unwrap_err();
    assert!(matches!(
        err,
        StreamsError::Serialization(SerializationError::Truncated { .. })
    ));

    assert!(subscription_serde().decode(&[]).is_err());
}

#[test]
fn test_response_envelope_round_trip() {
    let serde = SubscriptionResponseWrapperSerde::new(I64Serde);
    let present = SubscriptionResponseWrapper::new(Some(ValueHash::of(b"x")), Some(-12i64), 4);
    let tombstone: SubscriptionResponseWrapper<i64> = SubscriptionResponseWrapper::new(None, None, 0);

    for response in [present, tombstone] {
        let bytes = serde.encode(&response).unwrap();
        assert_eq!(u32::from(bytes[0] & 0x3f), RESPONSE_CURRENT_VERSION);
        assert_eq!(serde.decode(&bytes).unwrap(), response);
    }
}

#[test]
fn test_newer_response_version_rejected() {
    let serde: SubscriptionResponseWrapperSerde<String, _> =
        SubscriptionResponseWrapperSerde::new(StringSerde);
    let bytes = [0xc0 | (RESPONSE_CURRENT_VERSION + 1) as u8, 0, 0, 0, 0];
    assert!(matches!(
        serde.decode(&bytes),
        Err(StreamsError::UnsupportedVersion { .. })
    ));
}

#[test]
fn test_combined_key_layout() {
    let serde = CombinedKeySerde::new(StringSerde, StringSerde);
    let key = CombinedKey::new("cust".to_string(), "order-1".to_string());

    let bytes = serde.serialize(&key).unwrap();

    assert_eq!(&bytes[..4], &4i32.to_be_bytes());
    assert_eq!(&bytes[4..8], b"cust");
    assert_eq!(&bytes[8..], b"order-1");
    assert!(bytes.starts_with(&serde.prefix(&"cust".to_string()).unwrap()));
    assert_eq!(serde.deserialize(&bytes).unwrap(), key);
}

#[test]
fn test_combined_key_rejects_bad_length() {
    let serde = CombinedKeySerde::<String, String, _, _>::new(StringSerde, StringSerde);

    let mut bytes = 100i32.to_be_bytes().to_vec();
    bytes.extend_from_slice(b"short");
    assert!(serde.deserialize(&bytes).is_err());

    let negative = (-1i32).to_be_bytes();
    assert!(serde.deserialize(&negative).is_err());
}

#[test]
fn test_newer_subscription_version_refused_on_encode() {
    let wrapper = SubscriptionWrapper::new(
        Some(ValueHash::of(b"v")),
        Instruction::PropagateNullIfNoForeignValue,
        Some("c1".to_string()),
        1,
    )
    .with_version(CURRENT_VERSION + 1);

    assert!(matches!(
        subscription_serde().encode(&wrapper),
        Err(StreamsError::UnsupportedVersion { .. })
    ));
}

use std::sync::Arc;

use proto_yaml::{
    unmarshal, DecodeError, Decoder, DescriptorPool, DescriptorPoolBuilder, DynamicMessage,
    FieldType, Kind, MapKey, MessageBuilder, Value,
};

fn test_pool() -> DescriptorPool {
    let mut builder = DescriptorPoolBuilder::new();
    builder.add_enum("test.Enum", [("ZERO", 0), ("ONE", 1), ("TWO", 2)]);

    let mut msg = MessageBuilder::new("test.Message");
    msg.field("abool", Kind::Bool);
    msg.field("anint32", Kind::Int32);
    msg.field("anint64", Kind::Int64);
    msg.field("astring", Kind::String);
    msg.field("anenum", FieldType::enumeration("test.Enum"));
    msg.field("amessage", FieldType::message("test.Message"));
    msg.repeated("arepeated_int32", Kind::Int32);
    msg.repeated("arepeated_message", FieldType::message("test.Message"));
    msg.map("astring_int32_map", Kind::String, Kind::Int32);
    msg.map("astring_message_map", Kind::String, FieldType::message("test.Message"));
    msg.map("anint64_string_map", Kind::Int64, Kind::String);
    msg.map("auint32_string_map", Kind::Uint32, Kind::String);
    msg.map("abool_string_map", Kind::Bool, Kind::String);
    msg.map("adouble_string_map", Kind::Double, Kind::String);
    builder.add_message(msg);

    let mut known = MessageBuilder::new("test.Known");
    known.field("aduration", FieldType::message("google.protobuf.Duration"));
    known.field("atimestamp", FieldType::message("google.protobuf.Timestamp"));
    known.field("anany", FieldType::message("google.protobuf.Any"));
    known.field("amask", FieldType::message("google.protobuf.FieldMask"));
    builder.add_message(known);

    builder.build().unwrap()
}

fn new_message(pool: &DescriptorPool, name: &str) -> DynamicMessage {
    DynamicMessage::new(pool.message_by_name(name).unwrap())
}

#[test]
fn unmarshal_string_field() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"astring: hello", &mut got).unwrap();
    assert_eq!(got.get_by_name("astring"), Some(&Value::String("hello".into())));
    assert_eq!(got.fields().count(), 1, "no other field is set");
}

#[test]
fn decode_multiple_fields() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"anint32: 42\nastring: hello", &mut got).unwrap();
    assert_eq!(got.get_by_name("anint32"), Some(&Value::I32(42)));
    assert_eq!(got.get_by_name("astring"), Some(&Value::String("hello".into())));
}

#[test]
fn multiple_documents_then_end_of_stream() {
    let pool = test_pool();
    let mut decoder = Decoder::from("astring: hello\n---\nanint32: 42");

    let mut first = new_message(&pool, "test.Message");
    decoder.decode(&mut first).unwrap();
    assert_eq!(first.get_by_name("astring"), Some(&Value::String("hello".into())));

    let mut second = new_message(&pool, "test.Message");
    decoder.decode(&mut second).unwrap();
    assert_eq!(second.get_by_name("anint32"), Some(&Value::I32(42)));

    let mut third = new_message(&pool, "test.Message");
    let err = decoder.decode(&mut third).unwrap_err();
    assert!(err.is_end_of_stream());
}

#[test]
fn field_matrix() {
    let pool = test_pool();

    // scalar sequence
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"arepeated_int32: [42, 43]", &mut got).unwrap();
    assert_eq!(
        got.get_by_name("arepeated_int32"),
        Some(&Value::List(vec![Value::I32(42), Value::I32(43)]))
    );

    // message sequence
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"arepeated_message: [{anint64: 42}, {anint64: 43}]", &mut got).unwrap();
    let list = got.get_by_name("arepeated_message").and_then(Value::as_list).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(
        list[0].as_message().unwrap().get_by_name("anint64"),
        Some(&Value::I64(42))
    );
    assert_eq!(
        list[1].as_message().unwrap().get_by_name("anint64"),
        Some(&Value::I64(43))
    );

    // nested message mapping
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"amessage: {anint32: 42}", &mut got).unwrap();
    assert_eq!(
        got.get_by_name("amessage")
            .and_then(Value::as_message)
            .unwrap()
            .get_by_name("anint32"),
        Some(&Value::I32(42))
    );

    // scalar map
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"astring_int32_map: {anykey: 42}", &mut got).unwrap();
    let map = got.get_by_name("astring_int32_map").and_then(Value::as_map).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map[&MapKey::from("anykey")], Value::I32(42));

    // message map
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"astring_message_map: {anykey: {anint32: 42}}", &mut got).unwrap();
    let map = got.get_by_name("astring_message_map").and_then(Value::as_map).unwrap();
    assert_eq!(
        map[&MapKey::from("anykey")].as_message().unwrap().get_by_name("anint32"),
        Some(&Value::I32(42))
    );
}

#[test]
fn empty_sequence_yields_present_empty_list() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"arepeated_int32: []", &mut got).unwrap();
    assert_eq!(got.get_by_name("arepeated_int32"), Some(&Value::List(vec![])));
}

#[test]
fn duplicate_mapping_key_last_wins() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"anint32: 1\nanint32: 2", &mut got).unwrap();
    assert_eq!(got.get_by_name("anint32"), Some(&Value::I32(2)));
}

#[test]
fn unknown_field_is_reported_wherever_it_appears() {
    let pool = test_pool();
    for doc in ["bogus: 1", "astring: ok\nbogus: 1"] {
        let mut got = new_message(&pool, "test.Message");
        let err = unmarshal(doc.as_bytes(), &mut got).unwrap_err();
        match err {
            DecodeError::UnknownField { message, field } => {
                assert_eq!(message, "test.Message");
                assert_eq!(field, "bogus");
            }
            other => panic!("expected UnknownField, got {other}"),
        }
    }
}

#[test]
fn shape_mismatches_are_hard_errors() {
    let pool = test_pool();

    // sequence into a non-list field
    let mut got = new_message(&pool, "test.Message");
    assert!(matches!(
        unmarshal(b"anint32: [1, 2]", &mut got),
        Err(DecodeError::TypeMismatch { actual: "sequence", .. })
    ));

    // mapping into a non-map, non-message field
    let mut got = new_message(&pool, "test.Message");
    assert!(matches!(
        unmarshal(b"anint32: {a: 1}", &mut got),
        Err(DecodeError::TypeMismatch { actual: "mapping", .. })
    ));

    // scalar into a repeated field
    let mut got = new_message(&pool, "test.Message");
    assert!(matches!(
        unmarshal(b"arepeated_int32: 42", &mut got),
        Err(DecodeError::TypeMismatch { expected: "sequence", .. })
    ));

    // sequence into a map field
    let mut got = new_message(&pool, "test.Message");
    assert!(matches!(
        unmarshal(b"astring_int32_map: [1]", &mut got),
        Err(DecodeError::TypeMismatch { expected: "mapping", .. })
    ));

    // non-mapping document root
    let mut got = new_message(&pool, "test.Message");
    assert!(matches!(
        unmarshal(b"[1, 2]", &mut got),
        Err(DecodeError::TypeMismatch { expected: "mapping", actual: "sequence", .. })
    ));
}

#[test]
fn enum_by_name_and_open_number() {
    let pool = test_pool();

    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"anenum: ONE", &mut got).unwrap();
    assert_eq!(got.get_by_name("anenum"), Some(&Value::EnumNumber(1)));

    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"anenum: 17", &mut got).unwrap();
    assert_eq!(got.get_by_name("anenum"), Some(&Value::EnumNumber(17)));
}

#[test]
fn map_key_kinds_accept_and_reject() {
    let pool = test_pool();

    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"anint64_string_map: {-7: minus}", &mut got).unwrap();
    let map = got.get_by_name("anint64_string_map").and_then(Value::as_map).unwrap();
    assert_eq!(map[&MapKey::I64(-7)], Value::String("minus".into()));

    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"auint32_string_map: {7: seven}", &mut got).unwrap();
    let map = got.get_by_name("auint32_string_map").and_then(Value::as_map).unwrap();
    assert_eq!(map[&MapKey::U32(7)], Value::String("seven".into()));

    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"abool_string_map: {true: yes_}", &mut got).unwrap();
    let map = got.get_by_name("abool_string_map").and_then(Value::as_map).unwrap();
    assert_eq!(map[&MapKey::Bool(true)], Value::String("yes_".into()));

    // A key kind outside {bool, integer, string} coerces fine but is not a
    // permitted key type.
    let mut got = new_message(&pool, "test.Message");
    let err = unmarshal(b"adouble_string_map: {1.5: x}", &mut got).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::InvalidMapKey { kind: "double", .. }
    ));
}

#[test]
fn duplicate_map_keys_last_wins() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"astring_int32_map: {k: 1, k: 2}", &mut got).unwrap();
    let map = got.get_by_name("astring_int32_map").and_then(Value::as_map).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map[&MapKey::from("k")], Value::I32(2));
}

#[test]
fn duration_field() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Known");
    unmarshal(b"aduration: \"42s\"", &mut got).unwrap();
    let duration = got.get_by_name("aduration").and_then(Value::as_message).unwrap();
    assert_eq!(duration.get_by_name("seconds"), Some(&Value::I64(42)));
    assert_eq!(duration.get_by_name("nanos"), Some(&Value::I32(0)));

    let mut got = new_message(&pool, "test.Known");
    unmarshal(b"aduration: \"-1.5s\"", &mut got).unwrap();
    let duration = got.get_by_name("aduration").and_then(Value::as_message).unwrap();
    assert_eq!(duration.get_by_name("seconds"), Some(&Value::I64(-1)));
    assert_eq!(duration.get_by_name("nanos"), Some(&Value::I32(-500_000_000)));

    // a mapping is not a valid duration node, even though the declared
    // fields would structurally accept one
    let mut got = new_message(&pool, "test.Known");
    assert!(matches!(
        unmarshal(b"aduration: {seconds: 42}", &mut got),
        Err(DecodeError::TypeMismatch { expected: "scalar", .. })
    ));
}

#[test]
fn timestamp_field() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Known");
    unmarshal(b"atimestamp: \"1970-01-01T00:01:00Z\"", &mut got).unwrap();
    let ts = got.get_by_name("atimestamp").and_then(Value::as_message).unwrap();
    assert_eq!(ts.get_by_name("seconds"), Some(&Value::I64(60)));
    assert_eq!(ts.get_by_name("nanos"), Some(&Value::I32(0)));

    let mut got = new_message(&pool, "test.Known");
    unmarshal(b"atimestamp: \"2001-02-03T04:05:06.5+01:00\"", &mut got).unwrap();
    let ts = got.get_by_name("atimestamp").and_then(Value::as_message).unwrap();
    assert_eq!(ts.get_by_name("seconds"), Some(&Value::I64(981_169_506)));
    assert_eq!(ts.get_by_name("nanos"), Some(&Value::I32(500_000_000)));

    let mut got = new_message(&pool, "test.Known");
    assert!(matches!(
        unmarshal(b"atimestamp: \"not a time\"", &mut got),
        Err(DecodeError::InvalidScalarLiteral { kind: "timestamp", .. })
    ));
}

#[test]
fn field_mask_field() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Known");
    unmarshal(b"amask: [a.b, c, a.b]", &mut got).unwrap();
    let mask = got.get_by_name("amask").and_then(Value::as_message).unwrap();
    assert_eq!(
        mask.get_by_name("paths"),
        Some(&Value::List(vec![
            Value::String("a.b".into()),
            Value::String("c".into()),
            Value::String("a.b".into()),
        ]))
    );
}

#[test]
fn any_envelope_round_trip() {
    let pool = test_pool();
    let mut decoder = Decoder::from(
        "anany:\n  \"@type\": type.googleapis.com/test.Message\n  astring: hello\n  anint32: 42",
    );
    decoder.set_type_resolver(Arc::new(pool.clone()));

    let mut got = new_message(&pool, "test.Known");
    decoder.decode(&mut got).unwrap();
    let envelope = got.get_by_name("anany").and_then(Value::as_message).unwrap();
    assert_eq!(
        envelope.get_by_name("type_url"),
        Some(&Value::String("type.googleapis.com/test.Message".into()))
    );

    // the unwrapped payload equals the same fields decoded directly
    let mut direct = new_message(&pool, "test.Message");
    unmarshal(b"astring: hello\nanint32: 42", &mut direct).unwrap();
    assert_eq!(
        envelope.get_by_name("value").and_then(Value::as_message),
        Some(&direct)
    );
}

#[test]
fn any_envelope_errors() {
    let pool = test_pool();

    // no discriminator at all
    let mut decoder = Decoder::from("anany: {astring: hello}");
    decoder.set_type_resolver(Arc::new(pool.clone()));
    let mut got = new_message(&pool, "test.Known");
    assert!(matches!(
        decoder.decode(&mut got),
        Err(DecodeError::MissingAnyTypeKey { .. })
    ));

    // discriminator that resolves to nothing
    let mut decoder = Decoder::from("anany: {\"@type\": type.googleapis.com/test.Nope}");
    decoder.set_type_resolver(Arc::new(pool.clone()));
    let mut got = new_message(&pool, "test.Known");
    match decoder.decode(&mut got).unwrap_err() {
        DecodeError::UnresolvedAnyType { type_url } => {
            assert_eq!(type_url, "type.googleapis.com/test.Nope");
        }
        other => panic!("expected UnresolvedAnyType, got {other}"),
    }
}

#[test]
fn yaml_anchors_and_aliases_resolve() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Message");
    unmarshal(b"astring: &a hello\namessage: {astring: *a}", &mut got).unwrap();
    assert_eq!(got.get_by_name("astring"), Some(&Value::String("hello".into())));
    assert_eq!(
        got.get_by_name("amessage")
            .and_then(Value::as_message)
            .unwrap()
            .get_by_name("astring"),
        Some(&Value::String("hello".into()))
    );
}

#[test]
fn decoding_is_idempotent_across_fresh_destinations() {
    let pool = test_pool();
    let doc = b"anint32: 42\nastring: hello\narepeated_int32: [1, 2, 3]\namessage: {abool: true}";

    let mut a = new_message(&pool, "test.Message");
    unmarshal(doc, &mut a).unwrap();
    let mut b = new_message(&pool, "test.Message");
    unmarshal(doc, &mut b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let pool = test_pool();
    let mut got = new_message(&pool, "test.Message");
    assert!(matches!(
        unmarshal(b"astring: [unclosed", &mut got),
        Err(DecodeError::Parse(_))
    ));
}

#[test]
fn syntax_error_surfaces_at_its_own_document_boundary() {
    let pool = test_pool();
    let mut decoder = Decoder::from("astring: one\n---\nastring: two\n---\nastring: [unclosed");

    let mut first = new_message(&pool, "test.Message");
    decoder.decode(&mut first).unwrap();
    assert_eq!(first.get_by_name("astring"), Some(&Value::String("one".into())));

    let mut second = new_message(&pool, "test.Message");
    decoder.decode(&mut second).unwrap();
    assert_eq!(second.get_by_name("astring"), Some(&Value::String("two".into())));

    let mut third = new_message(&pool, "test.Message");
    assert!(matches!(
        decoder.decode(&mut third),
        Err(DecodeError::Parse(_))
    ));
}

#[test]
fn user_declared_well_known_name_decodes_by_its_own_fields() {
    let mut builder = DescriptorPoolBuilder::new();
    let mut msg = MessageBuilder::new("google.protobuf.Duration");
    msg.field("text", Kind::String);
    builder.add_message(msg);
    let pool = builder.build().unwrap();

    let mut got = new_message(&pool, "google.protobuf.Duration");
    unmarshal(b"text: hello", &mut got).unwrap();
    assert_eq!(got.get_by_name("text"), Some(&Value::String("hello".into())));
}

use csv_parquet_core::*;

#[test]
fn test_parse_all_primitive_types() {
    let schema = parse(
        "message all { required binary b = 1; optional int32 i = 2; required int64 l = 3; optional float f = 4; required double d = 5; optional boolean z = 6; }",
    )
    .unwrap();

    assert_eq!(schema.name(), "all");
    let types: Vec<PrimitiveType> = schema.fields().iter().map(|f| f.primitive_type).collect();
    assert_eq!(types, PrimitiveType::ALL.to_vec());

    let ordinals: Vec<usize> = schema.fields().iter().map(|f| f.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3, 4, 5]);

    assert!(schema.field(0).unwrap().is_required());
    assert!(!schema.field(1).unwrap().is_required());
    assert_eq!(schema.field_by_name("d").unwrap().ordinal, 4);
}

#[test]
fn test_reserialized_schema_parses_to_same_fields() {
    let sources = [
        "message csv {required binary firstName = 1; required binary lastName = 2; required binary dob = 3; required binary pob = 4;}",
        "message m{optional int64 a=1;required boolean b=2;}",
        "  message   spaced   {   optional   double   x   =   1 ;   }  ",
    ];

    for source in sources {
        let schema = parse(source).unwrap();
        let text = schema.to_string();
        let reparsed: Schema = text.parse().unwrap();
        assert_eq!(schema, reparsed, "reparse of {:?} differs", text);
    }
}

#[test]
fn test_builder_matches_parser() {
    let built = SchemaBuilder::new("people")
        .required("name", PrimitiveType::Binary)
        .optional("age", PrimitiveType::Int32)
        .build()
        .unwrap();
    let parsed =
        parse("message people { required binary name = 1; optional int32 age = 2; }").unwrap();
    assert_eq!(built, parsed);
}

#[test]
fn test_unknown_type_names_token() {
    let err = parse("message m { required string s = 1; }").unwrap_err();
    assert_eq!(err, SchemaError::UnknownType("string".to_string()));

    // keywords are case sensitive
    let err = parse("message m { required INT32 s = 1; }").unwrap_err();
    assert_eq!(err, SchemaError::UnknownType("INT32".to_string()));
}

#[test]
fn test_ordinal_gaps_and_duplicates() {
    let gap = parse("message m { required int32 a = 1; required int32 b = 3; }").unwrap_err();
    assert!(matches!(
        gap,
        SchemaError::OrdinalMismatch {
            expected: 2,
            found: 3,
            ..
        }
    ));

    let repeated = parse("message m { required int32 a = 1; required int32 b = 1; }").unwrap_err();
    assert!(matches!(repeated, SchemaError::OrdinalMismatch { .. }));

    let zero = parse("message m { required int32 a = 0; }").unwrap_err();
    assert!(matches!(zero, SchemaError::OrdinalMismatch { .. }));
}

#[test]
fn test_duplicate_field_names() {
    let err = parse("message m { required int32 a = 1; optional binary a = 2; }").unwrap_err();
    assert_eq!(err, SchemaError::DuplicateField("a".to_string()));
}

#[test]
fn test_malformed_declarations() {
    let cases = [
        "",
        "message",
        "message m",
        "message m {}",
        "group m { required int32 a = 1; }",
        "message m { repeated int32 a = 1; }",
        "message m { required int32 a = 1 }",
        "message m { required int32 a 1; }",
        "message m { required int32 a = one; }",
        "message m { required int32 a = 1; ",
        "message m { required int32 a = 1; } trailing",
    ];

    for case in cases {
        match parse(case) {
            Err(SchemaError::MalformedDeclaration(_)) => {}
            other => panic!("expected malformed declaration for {:?}, got {:?}", case, other),
        }
    }
}

#[test]
fn test_builder_validation() {
    assert!(matches!(
        SchemaBuilder::new("m").build(),
        Err(SchemaError::MalformedDeclaration(_))
    ));
    assert!(matches!(
        SchemaBuilder::new("m")
            .required("a", PrimitiveType::Int32)
            .optional("a", PrimitiveType::Binary)
            .build(),
        Err(SchemaError::DuplicateField(_))
    ));
}

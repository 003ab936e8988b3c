use bytes::Bytes;
use csv_parquet_core::*;
use parquet::basic::{Compression, Repetition as ParquetRepetition, Type as PhysicalType};
use parquet::file::reader::{FileReader, SerializedFileReader};

use test_helpers::*;

#[test]
fn test_roundtrip_all_types() {
    let schema = create_test_schema().to_string();
    let lines = generate_test_lines(500);

    let rows = test_roundtrip(&schema, &lines).unwrap();
    assert_eq!(rows[7][0], Some(PrimitiveValue::Int32(7)));
    assert_eq!(rows[7][1], Some(PrimitiveValue::from("name_7")));
    assert_eq!(rows[7][2], Some(PrimitiveValue::Int64(7_000_000_000)));
    assert_eq!(rows[7][3], Some(PrimitiveValue::from(1.75f32)));
    assert_eq!(rows[7][4], Some(PrimitiveValue::from(10.5f64)));
    assert_eq!(rows[7][5], Some(PrimitiveValue::Boolean(false)));
}

#[test]
fn test_roundtrip_with_nulls() {
    let schema = create_test_schema().to_string();
    let lines: Vec<String> = vec![
        "1,,,,,true".into(),
        "2,x,,,,false".into(),
        "3,,42,,,1".into(),
        "4,,,0.5,,0".into(),
        "5,,,,-1e3,TRUE".into(),
        "6,y,7,7.5,7.25,False".into(),
    ];

    let rows = test_roundtrip(&schema, &lines).unwrap();
    assert_eq!(
        rows[0],
        vec![
            Some(PrimitiveValue::Int32(1)),
            None,
            None,
            None,
            None,
            Some(PrimitiveValue::Boolean(true))
        ]
    );
    assert_eq!(rows[4][4], Some(PrimitiveValue::from(-1000.0f64)));
    assert_eq!(rows[5][1], Some(PrimitiveValue::from("y")));
}

#[test]
fn test_roundtrip_compression_codecs() {
    let schema = create_test_schema().to_string();
    let lines = generate_test_lines(300);

    let codecs = vec![
        ("UNCOMPRESSED", Compression::UNCOMPRESSED),
        ("SNAPPY", Compression::SNAPPY),
        ("LZ4_RAW", Compression::LZ4_RAW),
        ("ZSTD", Compression::ZSTD(Default::default())),
    ];

    for (name, codec) in codecs {
        let rows = test_roundtrip_with_options(&schema, &lines, codec)
            .unwrap_or_else(|e| panic!("{} roundtrip failed: {}", name, e));
        assert_eq!(rows.len(), 300, "{} lost rows", name);
    }
}

#[test]
fn test_repetitive_data_compresses() {
    let schema = "message m { required binary text = 1; }";
    let lines: Vec<String> = (0..2000).map(|_| "A".repeat(100)).collect();

    let (_, uncompressed) = convert_to_buffer(schema, &lines, Compression::UNCOMPRESSED).unwrap();
    let (_, zstd) =
        convert_to_buffer(schema, &lines, Compression::ZSTD(Default::default())).unwrap();
    assert!(zstd.len() < uncompressed.len());
}

#[test]
fn test_required_columns_map_to_parquet_repetition() {
    let (_, buffer) =
        convert_to_buffer(PEOPLE_SCHEMA, &["a,b,c,d".to_string()], Compression::SNAPPY).unwrap();

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let descr = reader.metadata().file_metadata().schema_descr_ptr();
    assert_eq!(descr.num_columns(), 4);

    let expected = [
        ("firstName", ParquetRepetition::REQUIRED),
        ("lastName", ParquetRepetition::OPTIONAL),
        ("dob", ParquetRepetition::REQUIRED),
        ("pob", ParquetRepetition::REQUIRED),
    ];
    for (i, (name, repetition)) in expected.iter().enumerate() {
        let column = descr.column(i);
        assert_eq!(column.name(), *name);
        assert_eq!(column.self_type().get_basic_info().repetition(), *repetition);
        assert_eq!(column.physical_type(), PhysicalType::BYTE_ARRAY);
    }
}

#[test]
fn test_physical_types() {
    let (_, buffer) = convert_to_buffer(
        &create_test_schema().to_string(),
        &generate_test_lines(3),
        Compression::UNCOMPRESSED,
    )
    .unwrap();

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let descr = reader.metadata().file_metadata().schema_descr_ptr();
    let physical: Vec<PhysicalType> = (0..descr.num_columns())
        .map(|i| descr.column(i).physical_type())
        .collect();
    assert_eq!(
        physical,
        vec![
            PhysicalType::INT32,
            PhysicalType::BYTE_ARRAY,
            PhysicalType::INT64,
            PhysicalType::FLOAT,
            PhysicalType::DOUBLE,
            PhysicalType::BOOLEAN,
        ]
    );
}

#[test]
fn test_embedded_schema_reads_back() {
    let (_, buffer) =
        convert_to_buffer(PEOPLE_SCHEMA, &["a,,c,d".to_string()], Compression::SNAPPY).unwrap();

    let reader = Reader::new(Bytes::from(buffer));
    let schema = reader.schema().unwrap();
    assert_eq!(schema, Schema::parse(PEOPLE_SCHEMA).unwrap());
    assert_eq!(reader.metadata().unwrap().num_rows(), 1);
}

#[test]
fn test_read_single_column() {
    let (_, buffer) = convert_to_buffer(
        PEOPLE_SCHEMA,
        &[
            "Alice,Smith,1990-01-01,Paris".to_string(),
            "Bob,,1985-05-05,Lyon".to_string(),
        ],
        Compression::SNAPPY,
    )
    .unwrap();

    let last_names = Reader::new(Bytes::from(buffer)).read_column(1).unwrap();
    assert_eq!(last_names, vec![Some(PrimitiveValue::from("Smith")), None]);
}

#[test]
fn test_read_column_out_of_range() {
    let schema = "message m { required int32 a = 1; }";
    let lines = vec!["1".to_string(), "2".to_string()];
    let (_, buffer) = convert_to_buffer(schema, &lines, Compression::UNCOMPRESSED).unwrap();
    let buffer = Bytes::from(buffer);

    let err = Reader::new(buffer.clone()).read_column(5).unwrap_err();
    assert!(matches!(err, StorageError::Schema(_)));
    assert!(err.to_string().contains("no column at ordinal 5"));

    let values = Reader::new(buffer).read_column(0).unwrap();
    assert_eq!(
        values,
        vec![Some(PrimitiveValue::Int32(1)), Some(PrimitiveValue::Int32(2))]
    );
}

#[test]
fn test_large_input_spans_batches() {
    let schema = create_test_schema().to_string();
    let lines = generate_test_lines(5000);

    let mut buffer = Vec::new();
    {
        let mut sink = ParquetSinkBuilder::new()
            .with_batch_size(128)
            .with_compression(Compression::SNAPPY)
            .build(&mut buffer);
        let count = run(&schema, lines.iter().map(|l| Ok(l.as_str())), &mut sink).unwrap();
        assert_eq!(count, 5000);
        assert_eq!(sink.rows_written(), 5000);
    }

    let rows = read_rows(buffer).unwrap();
    assert_eq!(rows.len(), 5000);
    assert_eq!(rows[4999][0], Some(PrimitiveValue::Int32(4999)));
}

#[test]
fn test_empty_input_writes_valid_file() {
    let (count, buffer) =
        convert_to_buffer(PEOPLE_SCHEMA, &[], Compression::UNCOMPRESSED).unwrap();
    assert_eq!(count, 0);

    let reader = Reader::new(Bytes::from(buffer));
    assert_eq!(reader.metadata().unwrap().num_rows(), 0);
    assert_eq!(reader.read_rows().unwrap().count(), 0);
}

#[test]
fn test_convert_into_file() {
    use tempfile::NamedTempFile;

    let mut temp_file = NamedTempFile::new().unwrap();
    let lines = generate_test_lines(20);
    {
        let mut sink = ParquetSink::new(temp_file.as_file_mut());
        run(
            &create_test_schema().to_string(),
            lines.iter().map(|l| Ok(l.as_str())),
            &mut sink,
        )
        .unwrap();
    }

    let rows = read_rows(std::fs::read(temp_file.path()).unwrap()).unwrap();
    assert_eq!(rows.len(), 20);
    assert_eq!(rows[19][1], Some(PrimitiveValue::from("name_19")));
}

#[test]
fn test_two_parquet_runs_decode_identically() {
    let schema = create_test_schema().to_string();
    let lines = generate_test_lines(250);

    let (_, first) = convert_to_buffer(&schema, &lines, Compression::SNAPPY).unwrap();
    let (_, second) = convert_to_buffer(&schema, &lines, Compression::SNAPPY).unwrap();
    assert_eq!(read_rows(first).unwrap(), read_rows(second).unwrap());
}

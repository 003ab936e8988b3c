//! Test utilities for csv-parquet-core

#[cfg(test)]
pub mod test {
    use crate::{
        ConversionError, Converter, ParquetSinkBuilder, PrimitiveType, PrimitiveValue, Reader,
        RecordCount, Schema, SchemaBuilder,
    };
    use parquet::basic::Compression;

    /// The four-column people schema used throughout the tests
    pub fn people_schema_text() -> &'static str {
        "message csv {required binary firstName = 1; required binary lastName = 2; required binary dob = 3; required binary pob = 4;}"
    }

    /// Schema covering every primitive type, all optional except `id`
    pub fn typed_schema() -> Schema {
        SchemaBuilder::new("typed")
            .required("id", PrimitiveType::Int64)
            .optional("name", PrimitiveType::Binary)
            .optional("age", PrimitiveType::Int32)
            .optional("score", PrimitiveType::Float)
            .optional("balance", PrimitiveType::Double)
            .optional("active", PrimitiveType::Boolean)
            .build()
            .unwrap()
    }

    /// Lines conforming to [`typed_schema`]
    pub fn typed_lines(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                format!(
                    "{},Person{},{},{},{},{}",
                    i,
                    i,
                    20 + i % 50,
                    i as f32 * 0.5,
                    50000.0 + i as f64 * 1000.0,
                    i % 2 == 0
                )
            })
            .collect()
    }

    /// Run a conversion into an in-memory Parquet buffer
    pub fn convert_to_parquet(
        schema: &str,
        lines: &[String],
    ) -> (Result<RecordCount, ConversionError>, Vec<u8>) {
        let mut buffer = Vec::new();
        let result = {
            let mut sink = ParquetSinkBuilder::new()
                .with_compression(Compression::UNCOMPRESSED)
                .build(&mut buffer);
            Converter::default().run(schema, lines.iter().map(|l| Ok(l.as_str())), &mut sink)
        };
        (result, buffer)
    }

    /// Decode every row of an in-memory Parquet file
    pub fn read_back(buffer: Vec<u8>) -> Vec<Vec<Option<PrimitiveValue>>> {
        Reader::new(bytes::Bytes::from(buffer))
            .read_rows()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }
}

#[cfg(test)]
mod test_utils_tests {
    use super::test::*;
    use crate::PrimitiveValue;

    #[test]
    fn test_people_schema_parses() {
        let schema = crate::parse(people_schema_text()).unwrap();
        assert_eq!(schema.len(), 4);
    }

    #[test]
    fn test_typed_round_trip() {
        let schema = typed_schema().to_string();
        let lines = typed_lines(25);
        let (result, buffer) = convert_to_parquet(&schema, &lines);
        assert_eq!(result.unwrap(), 25);

        let rows = read_back(buffer);
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[3][0], Some(PrimitiveValue::Int64(3)));
        assert_eq!(rows[3][1], Some(PrimitiveValue::from("Person3")));
        assert_eq!(rows[3][2], Some(PrimitiveValue::Int32(23)));
        assert_eq!(rows[3][3], Some(PrimitiveValue::from(1.5f32)));
        assert_eq!(rows[3][4], Some(PrimitiveValue::from(53000.0f64)));
        assert_eq!(rows[3][5], Some(PrimitiveValue::Boolean(false)));
    }
}

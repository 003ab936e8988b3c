//! Line-by-line conversion driver
//!
//! Each line is tokenized, coerced and encoded before the next one is pulled
//! from the input. The first failure ends the run; there is no skip mode,
//! since dropping a record would misalign every column after it.

use std::io;

use log::{debug, info};

use crate::coercer::{Coercer, EmptyFieldPolicy};
use crate::encoder::ColumnEncoder;
use crate::encoding::TextEncoding;
use crate::error::{ConversionError, EncodeError, SchemaError};
use crate::schema::Schema;
use crate::sink::ColumnSink;
use crate::tokenizer::{tokenize, Delimiter};

/// Number of records successfully written
pub type RecordCount = u64;

const PROGRESS_INTERVAL: RecordCount = 100_000;

/// Settings applied to every line of a run
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    delimiter: Delimiter,
    encoding: TextEncoding,
    empty_policy: EmptyFieldPolicy,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Encoding for binary column bytes
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_empty_field_policy(mut self, policy: EmptyFieldPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn empty_field_policy(&self) -> EmptyFieldPolicy {
        self.empty_policy
    }
}

/// Drives lines through tokenizer, coercer and encoder into a sink
#[derive(Debug, Clone, Default)]
pub struct Converter {
    delimiter: Delimiter,
    coercer: Coercer,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        Self {
            coercer: Coercer::new(options.encoding, options.empty_policy),
            delimiter: options.delimiter,
        }
    }

    /// Convert `lines` using a schema supplied separately
    ///
    /// Data lines are numbered from 1; schema errors are reported at line 1
    /// of the schema source. The sink is closed only if every line converts.
    pub fn run<I, L, S>(
        &self,
        schema_source: &str,
        lines: I,
        sink: &mut S,
    ) -> Result<RecordCount, ConversionError>
    where
        I: IntoIterator<Item = io::Result<L>>,
        L: AsRef<str>,
        S: ColumnSink + ?Sized,
    {
        let schema = parse_schema(schema_source, 1)?;
        self.convert(&schema, lines, 1, sink)
    }

    /// Convert `lines` whose first line is the schema declaration
    pub fn run_with_inline_schema<I, L, S>(
        &self,
        lines: I,
        sink: &mut S,
    ) -> Result<RecordCount, ConversionError>
    where
        I: IntoIterator<Item = io::Result<L>>,
        L: AsRef<str>,
        S: ColumnSink + ?Sized,
    {
        let mut lines = lines.into_iter();
        let header = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(source)) => return Err(ConversionError::Input { line: 1, source }),
            None => {
                return Err(ConversionError::Schema {
                    line: 1,
                    source: SchemaError::malformed("input is empty, expected a schema line"),
                })
            }
        };
        let schema = parse_schema(header.as_ref(), 1)?;
        self.convert(&schema, lines, 2, sink)
    }

    fn convert<I, L, S>(
        &self,
        schema: &Schema,
        lines: I,
        first_line: usize,
        sink: &mut S,
    ) -> Result<RecordCount, ConversionError>
    where
        I: IntoIterator<Item = io::Result<L>>,
        L: AsRef<str>,
        S: ColumnSink + ?Sized,
    {
        let schema_line = first_line.saturating_sub(1).max(1);
        sink.init(schema).map_err(|e| ConversionError::Encode {
            line: schema_line,
            source: EncodeError::from(e),
        })?;
        info!(
            "converting records for message '{}' ({} fields, delimiter {:?}, encoding {})",
            schema.name(),
            schema.len(),
            self.delimiter.as_str(),
            self.coercer.encoding()
        );

        let encoder = ColumnEncoder::new(schema);
        let mut count: RecordCount = 0;
        let mut last_line = schema_line;

        for (idx, line) in lines.into_iter().enumerate() {
            let line_no = first_line + idx;
            last_line = line_no;
            let line = line.map_err(|source| ConversionError::Input {
                line: line_no,
                source,
            })?;

            let raw = tokenize(line.as_ref(), &self.delimiter);
            let fields = self
                .coercer
                .coerce(&raw, schema)
                .map_err(|source| ConversionError::Coercion {
                    line: line_no,
                    source,
                })?;
            encoder
                .encode(&fields, sink)
                .map_err(|source| ConversionError::Encode {
                    line: line_no,
                    source,
                })?;

            count += 1;
            if count % PROGRESS_INTERVAL == 0 {
                debug!("{} records converted", count);
            }
        }

        sink.close().map_err(|e| ConversionError::Encode {
            line: last_line,
            source: EncodeError::from(e),
        })?;
        info!("converted {} records", count);
        Ok(count)
    }
}

fn parse_schema(text: &str, line: usize) -> Result<Schema, ConversionError> {
    let text = text.trim_start_matches('\u{feff}');
    let schema = Schema::parse(text).map_err(|source| ConversionError::Schema { line, source })?;
    debug!("parsed schema: {}", schema);
    Ok(schema)
}

/// Convert `lines` with default options, schema supplied separately
pub fn run<I, L, S>(schema_source: &str, lines: I, sink: &mut S) -> Result<RecordCount, ConversionError>
where
    I: IntoIterator<Item = io::Result<L>>,
    L: AsRef<str>,
    S: ColumnSink + ?Sized,
{
    Converter::default().run(schema_source, lines, sink)
}

//! Schema-driven conversion of delimited text into Parquet
//!
//! `csv-parquet-core` turns row-oriented, delimiter-separated lines into
//! typed columnar output. A compact schema declaration names each field's
//! type and whether it is required:
//!
//! ```text
//! message people { required binary name = 1; optional int32 age = 2; }
//! ```
//!
//! # Key Components
//!
//! - **Schema**: parser for the declaration format ([`schema::parse`])
//! - **Tokenizer**: literal-separator splitting of one line ([`tokenizer::tokenize`])
//! - **Coercer**: per-field conversion of raw text into typed values
//!   ([`Coercer`]), with an explicit text encoding for binary columns
//! - **Encoder**: emits `start_message`/`start_field`/`write_*`/`end_field`/
//!   `end_message` events to any [`ColumnSink`] ([`ColumnEncoder`])
//! - **Driver**: pulls lines one at a time through the pipeline and stops at
//!   the first error, naming the input line ([`Converter`])
//!
//! # Sinks
//!
//! - [`ParquetSink`] buffers values per column and writes Arrow record
//!   batches through `parquet::arrow::ArrowWriter`
//! - [`RecordingSink`] keeps the event stream in memory
//!
//! Files written by [`ParquetSink`] can be read back with [`Reader`].

pub mod arrow_conversion;
pub mod coercer;
pub mod driver;
pub mod encoder;
pub mod encoding;
pub mod error;
pub mod reader;
pub mod recording;
pub mod schema;
pub mod sink;
pub mod tokenizer;
pub mod value;
pub mod writer;

#[cfg(test)]
pub mod test_utils;

pub use coercer::{Coercer, EmptyFieldPolicy};
pub use driver::{run, ConversionOptions, Converter, RecordCount};
pub use encoder::{encode, ColumnEncoder};
pub use encoding::TextEncoding;
pub use error::{
    CoercionError, ConversionError, EncodeError, SchemaError, SinkError, StorageError,
};
pub use reader::Reader;
pub use recording::{RecordingSink, SinkEvent};
pub use schema::{parse, FieldSpec, PrimitiveType, Repetition, Schema, SchemaBuilder};
pub use sink::{ColumnSink, WriteContext};
pub use tokenizer::{tokenize, Delimiter, RawRecord};
pub use value::{PrimitiveValue, TypedField};
pub use writer::{ParquetSink, ParquetSinkBuilder};

//! Parquet-backed column sink

use std::io::Write;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use log::{debug, info};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rand::Rng;

use crate::arrow_conversion::{schema_to_arrow, values_to_arrow_array, SCHEMA_METADATA_KEY};
use crate::error::SinkError;
use crate::schema::Schema;
use crate::sink::{ColumnSink, MessageTracker, WriteContext};
use crate::value::{PrimitiveValue, SLOT_SIZE};

// Default configuration constants
const DEFAULT_BATCH_SIZE: usize = 1000;
const DEFAULT_MEMORY_THRESHOLD: usize = 100 * 1024 * 1024; // 100MB
const DEFAULT_SAMPLE_SIZE: usize = 100;
const MIN_BATCH_SIZE: usize = 10;
const MIN_SAMPLES_FOR_ESTIMATE: usize = 10;

/// Builder for creating a configured ParquetSink
#[derive(Debug, Clone)]
pub struct ParquetSinkBuilder {
    compression: Compression,
    batch_size: Option<usize>,
    memory_threshold: usize,
    sample_size: usize,
}

impl Default for ParquetSinkBuilder {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            batch_size: None,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl ParquetSinkBuilder {
    /// Create a new ParquetSinkBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression algorithm
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set a fixed batch size (disables dynamic sizing)
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size.max(1));
        self
    }

    /// Set the memory threshold for flushing
    pub fn with_memory_threshold(mut self, threshold: usize) -> Self {
        self.memory_threshold = threshold;
        self
    }

    /// Set the sample size for row size estimation
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    /// Build a sink writing to `writer`; nothing is written until `init`
    pub fn build<W: Write + Send>(self, writer: W) -> ParquetSink<W> {
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .build();

        ParquetSink {
            state: State::Pending { writer, props },
            columns: Vec::new(),
            row: Vec::new(),
            buffered_rows: 0,
            current_batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            memory_threshold: self.memory_threshold,
            sample_size: self.sample_size,
            size_samples: Vec::with_capacity(self.sample_size),
            total_rows_written: 0,
            fixed_batch_size: self.batch_size,
        }
    }
}

enum State<W: Write + Send> {
    Pending {
        writer: W,
        props: WriterProperties,
    },
    Open {
        arrow_writer: ArrowWriter<W>,
        arrow_schema: Arc<arrow_schema::Schema>,
        tracker: MessageTracker,
    },
    Closed,
}

/// Column sink that materializes records as a Parquet file
///
/// Values are appended to per-column buffers as messages complete and
/// written as Arrow record batches once the batch size is reached.
pub struct ParquetSink<W: Write + Send> {
    state: State<W>,
    columns: Vec<Vec<Option<PrimitiveValue>>>,
    row: Vec<Option<PrimitiveValue>>,
    buffered_rows: usize,
    current_batch_size: usize,
    memory_threshold: usize,
    sample_size: usize,
    size_samples: Vec<usize>,
    total_rows_written: usize,
    fixed_batch_size: Option<usize>,
}

impl<W> ParquetSink<W>
where
    W: Write + Send,
{
    /// Create a new sink with default settings
    pub fn new(writer: W) -> Self {
        ParquetSinkBuilder::new().build(writer)
    }

    /// Create a new sink with custom properties
    pub fn new_with_properties(writer: W, props: WriterProperties) -> Self {
        let mut sink = ParquetSinkBuilder::new().build(writer);
        if let State::Pending { props: current, .. } = &mut sink.state {
            *current = props;
        }
        sink
    }

    /// Records handed to the Parquet writer so far
    pub fn rows_written(&self) -> usize {
        self.total_rows_written
    }

    /// Records waiting in the column buffers
    pub fn buffered_rows(&self) -> usize {
        self.buffered_rows
    }

    /// Current target batch size
    pub fn batch_size(&self) -> usize {
        self.current_batch_size
    }

    fn tracker(&mut self) -> Result<&mut MessageTracker, SinkError> {
        match &mut self.state {
            State::Open { tracker, .. } => Ok(tracker),
            State::Pending { .. } => Err(SinkError::NotInitialized),
            State::Closed => Err(SinkError::Closed),
        }
    }

    fn write_value(&mut self, value: PrimitiveValue) -> Result<(), SinkError> {
        let ordinal = self.tracker()?.value(value.primitive_type())?;
        self.row[ordinal] = Some(value);
        Ok(())
    }

    /// Sample row size for dynamic batch sizing using reservoir sampling
    fn sample_row_size(&mut self, row_size: usize) {
        if self.size_samples.len() < self.sample_size {
            self.size_samples.push(row_size);
        } else {
            let mut rng = rand::rng();
            let idx = rng.random_range(0..=self.total_rows_written + self.buffered_rows);
            if idx < self.sample_size {
                self.size_samples[idx] = row_size;
            }
        }

        if self.size_samples.len() >= MIN_SAMPLES_FOR_ESTIMATE {
            self.update_batch_size();
        }
    }

    /// Update dynamic batch size based on current samples
    fn update_batch_size(&mut self) {
        if self.size_samples.is_empty() {
            return;
        }

        let total_size: usize = self.size_samples.iter().sum();
        let avg_row_size = (total_size as f64 / self.size_samples.len() as f64).max(1.0);
        let suggested_batch_size = (self.memory_threshold as f64 / avg_row_size).floor() as usize;
        self.current_batch_size = suggested_batch_size.max(MIN_BATCH_SIZE);
    }

    /// Write buffered columns as one record batch
    fn flush_buffered_rows(&mut self) -> Result<(), SinkError> {
        if self.buffered_rows == 0 {
            return Ok(());
        }

        let State::Open {
            arrow_writer,
            arrow_schema,
            tracker,
        } = &mut self.state
        else {
            return Err(SinkError::Closed);
        };

        let arrow_columns = self
            .columns
            .iter_mut()
            .zip(tracker.schema().fields())
            .map(|(values, field)| {
                values_to_arrow_array(field.primitive_type, std::mem::take(values))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let batch = RecordBatch::try_new(arrow_schema.clone(), arrow_columns)?;
        arrow_writer.write(&batch)?;

        // Check if we need to flush based on memory usage
        if arrow_writer.in_progress_size() >= self.memory_threshold {
            arrow_writer.flush()?;
        }

        debug!(
            "flushed batch of {} rows (batch size {})",
            self.buffered_rows, self.current_batch_size
        );
        self.total_rows_written += self.buffered_rows;
        self.buffered_rows = 0;
        Ok(())
    }
}

impl<W> ColumnSink for ParquetSink<W>
where
    W: Write + Send,
{
    fn init(&mut self, schema: &Schema) -> Result<WriteContext, SinkError> {
        let (writer, props) = match std::mem::replace(&mut self.state, State::Closed) {
            State::Pending { writer, props } => (writer, props),
            open @ State::Open { .. } => {
                self.state = open;
                return Err(SinkError::protocol("sink initialized twice"));
            }
            State::Closed => return Err(SinkError::Closed),
        };

        let arrow_schema = schema_to_arrow(schema);
        let arrow_writer = ArrowWriter::try_new(writer, arrow_schema.clone(), Some(props))?;

        self.columns = vec![Vec::with_capacity(self.current_batch_size); schema.len()];
        self.row = vec![None; schema.len()];
        self.state = State::Open {
            arrow_writer,
            arrow_schema,
            tracker: MessageTracker::new(schema),
        };

        debug!(
            "parquet sink initialized for message '{}' with {} columns",
            schema.name(),
            schema.len()
        );
        Ok(WriteContext::new(schema).with_metadata(SCHEMA_METADATA_KEY, schema.to_string()))
    }

    fn start_message(&mut self) -> Result<(), SinkError> {
        self.tracker()?.start_message()?;
        self.row.iter_mut().for_each(|v| *v = None);
        Ok(())
    }

    fn start_field(&mut self, name: &str, ordinal: usize) -> Result<(), SinkError> {
        self.tracker()?.start_field(name, ordinal)
    }

    fn write_binary(&mut self, value: Bytes) -> Result<(), SinkError> {
        self.write_value(PrimitiveValue::Binary(value))
    }

    fn write_int32(&mut self, value: i32) -> Result<(), SinkError> {
        self.write_value(PrimitiveValue::Int32(value))
    }

    fn write_int64(&mut self, value: i64) -> Result<(), SinkError> {
        self.write_value(PrimitiveValue::Int64(value))
    }

    fn write_float(&mut self, value: f32) -> Result<(), SinkError> {
        self.write_value(PrimitiveValue::from(value))
    }

    fn write_double(&mut self, value: f64) -> Result<(), SinkError> {
        self.write_value(PrimitiveValue::from(value))
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), SinkError> {
        self.write_value(PrimitiveValue::Boolean(value))
    }

    fn end_field(&mut self, name: &str, ordinal: usize) -> Result<(), SinkError> {
        self.tracker()?.end_field(name, ordinal)
    }

    fn end_message(&mut self) -> Result<(), SinkError> {
        self.tracker()?.end_message()?;

        let mut row_size = 0;
        for (column, value) in self.columns.iter_mut().zip(self.row.iter_mut()) {
            let value = value.take();
            row_size += value.as_ref().map_or(SLOT_SIZE, PrimitiveValue::estimated_size);
            column.push(value);
        }
        self.buffered_rows += 1;

        if self.fixed_batch_size.is_none() {
            self.sample_row_size(row_size);
        }

        if self.buffered_rows >= self.current_batch_size {
            self.flush_buffered_rows()?;
        }
        Ok(())
    }

    /// Flush remaining rows and write the file footer
    fn close(&mut self) -> Result<(), SinkError> {
        if self.tracker()?.in_message() {
            return Err(SinkError::protocol("close inside an open message"));
        }
        self.flush_buffered_rows()?;

        if let State::Open { arrow_writer, .. } = std::mem::replace(&mut self.state, State::Closed)
        {
            arrow_writer.close()?;
        }
        info!("parquet sink closed after {} rows", self.total_rows_written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveType, SchemaBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new("m")
            .required("id", PrimitiveType::Int64)
            .optional("name", PrimitiveType::Binary)
            .build()
            .unwrap()
    }

    fn write_row<S: ColumnSink>(sink: &mut S, id: i64, name: Option<&str>) {
        sink.start_message().unwrap();
        sink.start_field("id", 0).unwrap();
        sink.write_int64(id).unwrap();
        sink.end_field("id", 0).unwrap();
        if let Some(name) = name {
            sink.start_field("name", 1).unwrap();
            sink.write_binary(Bytes::copy_from_slice(name.as_bytes()))
                .unwrap();
            sink.end_field("name", 1).unwrap();
        }
        sink.end_message().unwrap();
    }

    #[test]
    fn test_fixed_batch_size_flushes() {
        let mut buffer = Vec::new();
        let mut sink = ParquetSinkBuilder::new()
            .with_batch_size(2)
            .with_compression(Compression::UNCOMPRESSED)
            .build(&mut buffer);
        let ctx = sink.init(&schema()).unwrap();
        assert_eq!(
            ctx.extra_metadata.get(SCHEMA_METADATA_KEY),
            Some(&schema().to_string())
        );

        write_row(&mut sink, 1, Some("a"));
        assert_eq!(sink.buffered_rows(), 1);
        write_row(&mut sink, 2, None);
        assert_eq!(sink.buffered_rows(), 0);
        assert_eq!(sink.rows_written(), 2);
        write_row(&mut sink, 3, Some("c"));

        sink.close().unwrap();
        assert_eq!(sink.rows_written(), 3);
        drop(sink);
        assert!(buffer.starts_with(b"PAR1"));
        assert!(buffer.ends_with(b"PAR1"));
    }

    #[test]
    fn test_dynamic_batch_size_adapts() {
        let mut buffer = Vec::new();
        let mut sink = ParquetSinkBuilder::new()
            .with_memory_threshold(1024)
            .with_sample_size(20)
            .build(&mut buffer);
        sink.init(&schema()).unwrap();

        for i in 0..50 {
            write_row(&mut sink, i, Some("some name"));
        }
        assert!(sink.batch_size() < DEFAULT_BATCH_SIZE);
        assert!(sink.batch_size() >= MIN_BATCH_SIZE);
        sink.close().unwrap();
    }

    #[test]
    fn test_default_batch_size_stays_under_memory_threshold() {
        let single = SchemaBuilder::new("m")
            .required("n", PrimitiveType::Int32)
            .build()
            .unwrap();
        let mut buffer = Vec::new();
        let mut sink = ParquetSink::new(&mut buffer);
        sink.init(&single).unwrap();

        for i in 0..200 {
            sink.start_message().unwrap();
            sink.start_field("n", 0).unwrap();
            sink.write_int32(i).unwrap();
            sink.end_field("n", 0).unwrap();
            sink.end_message().unwrap();
        }

        let buffered_at_flush = sink.batch_size() * SLOT_SIZE;
        assert!(buffered_at_flush <= DEFAULT_MEMORY_THRESHOLD);
        assert!(sink.batch_size() > DEFAULT_BATCH_SIZE);
        sink.close().unwrap();
    }

    #[test]
    fn test_absent_columns_count_toward_row_size() {
        let mut buffer = Vec::new();
        let mut sink = ParquetSinkBuilder::new()
            .with_memory_threshold(SLOT_SIZE * 2 * 100)
            .build(&mut buffer);
        sink.init(&schema()).unwrap();

        for i in 0..20 {
            write_row(&mut sink, i, None);
        }
        // two slots per row, id present and name absent
        assert_eq!(sink.batch_size(), 100);
        sink.close().unwrap();
    }

    #[test]
    fn test_missing_required_value_is_rejected() {
        let mut buffer = Vec::new();
        let mut sink = ParquetSink::new(&mut buffer);
        sink.init(&schema()).unwrap();

        sink.start_message().unwrap();
        sink.start_field("name", 1).unwrap();
        sink.write_binary(Bytes::from_static(b"x")).unwrap();
        sink.end_field("name", 1).unwrap();
        let err = sink.end_message().unwrap_err();
        assert!(matches!(err, SinkError::MissingRequiredValue { column } if column == "id"));
    }

    #[test]
    fn test_lifecycle() {
        let mut buffer = Vec::new();
        let mut sink = ParquetSink::new(&mut buffer);
        assert!(matches!(sink.start_message(), Err(SinkError::NotInitialized)));

        sink.init(&schema()).unwrap();
        assert!(matches!(sink.init(&schema()), Err(SinkError::Protocol(_))));

        sink.close().unwrap();
        assert!(matches!(sink.start_message(), Err(SinkError::Closed)));
        assert!(matches!(sink.close(), Err(SinkError::Closed)));
    }
}

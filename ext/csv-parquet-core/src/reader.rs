//! Reading converted Parquet files back into typed values

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::file::metadata::FileMetaData;
use parquet::file::reader::ChunkReader;

use crate::arrow_conversion::{arrow_to_value, SCHEMA_METADATA_KEY};
use crate::error::StorageError;
use crate::schema::Schema;
use crate::value::PrimitiveValue;

type Result<T> = std::result::Result<T, StorageError>;

/// One decoded record, a value or `None` per column
pub type Row = Vec<Option<PrimitiveValue>>;

/// Parquet reader over any chunked source (`Bytes`, `File`, ...)
#[derive(Clone)]
pub struct Reader<R> {
    inner: R,
}

impl<R> Reader<R>
where
    R: ChunkReader + Clone + 'static,
{
    /// Create a new reader
    pub fn new(reader: R) -> Self {
        Self { inner: reader }
    }

    /// Get the Parquet file metadata
    pub fn metadata(&self) -> Result<FileMetaData> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(self.inner.clone())?;
        Ok(builder.metadata().file_metadata().clone())
    }

    /// Schema declaration embedded by the Parquet sink
    pub fn schema(&self) -> Result<Schema> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(self.inner.clone())?;
        let text = builder
            .schema()
            .metadata()
            .get(SCHEMA_METADATA_KEY)
            .ok_or_else(|| {
                StorageError::schema(format!("file has no '{}' metadata", SCHEMA_METADATA_KEY))
            })?;
        Schema::parse(text).map_err(|e| StorageError::schema(e.to_string()))
    }

    /// Read rows from the Parquet file
    pub fn read_rows(self) -> Result<RowIterator> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(self.inner)?;
        let reader = builder.build()?;

        Ok(RowIterator {
            batch_reader: reader,
            current_batch: None,
            current_row: 0,
        })
    }

    /// Read every value of one column, in record order
    pub fn read_column(self, ordinal: usize) -> Result<Vec<Option<PrimitiveValue>>> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(self.inner)?;
        let root_fields = builder.parquet_schema().root_schema().get_fields().len();
        if ordinal >= root_fields {
            return Err(StorageError::schema(format!("no column at ordinal {}", ordinal)));
        }
        let mask = parquet::arrow::ProjectionMask::roots(builder.parquet_schema(), [ordinal]);
        let reader = builder.with_projection(mask).build()?;

        let mut values = Vec::new();
        for batch in reader {
            let batch = batch?;
            let column = batch.column(0);
            for row in 0..column.len() {
                values.push(arrow_to_value(column, row)?);
            }
        }
        Ok(values)
    }
}

/// Iterator over rows in a Parquet file
pub struct RowIterator {
    batch_reader: ParquetRecordBatchReader,
    current_batch: Option<RecordBatch>,
    current_row: usize,
}

impl Iterator for RowIterator {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // If we have a current batch and haven't exhausted it
            if let Some(ref batch) = self.current_batch {
                if self.current_row < batch.num_rows() {
                    let row = batch
                        .columns()
                        .iter()
                        .map(|column| arrow_to_value(column, self.current_row))
                        .collect::<Result<Row>>();

                    self.current_row += 1;
                    return Some(row);
                }
            }

            // Need to fetch next batch
            match self.batch_reader.next() {
                Some(Ok(batch)) => {
                    self.current_batch = Some(batch);
                    self.current_row = 0;
                }
                Some(Err(e)) => return Some(Err(e.into())),
                None => return None,
            }
        }
    }
}

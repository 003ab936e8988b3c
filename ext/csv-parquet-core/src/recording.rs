//! In-memory sink that records the event stream

use bytes::Bytes;

use crate::error::SinkError;
use crate::schema::Schema;
use crate::sink::{ColumnSink, MessageTracker, WriteContext};
use crate::value::PrimitiveValue;

/// One call received by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    StartMessage,
    StartField { name: String, ordinal: usize },
    Value(PrimitiveValue),
    EndField { name: String, ordinal: usize },
    EndMessage,
}

/// Sink that keeps every event in memory
///
/// Applies the same protocol and type checks as the Parquet sink, which makes
/// it suitable for verifying encoder output without touching the filesystem.
#[derive(Debug, Default)]
pub struct RecordingSink {
    tracker: Option<MessageTracker>,
    events: Vec<SinkEvent>,
    messages: usize,
    closed: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Number of completed messages
    pub fn messages(&self) -> usize {
        self.messages
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Rebuild completed records, one `Option` per schema column
    pub fn rows(&self) -> Vec<Vec<Option<PrimitiveValue>>> {
        let width = self.tracker.as_ref().map_or(0, |t| t.schema().len());
        let mut rows = Vec::with_capacity(self.messages);
        let mut row = vec![None; width];
        let mut current = None;

        for event in &self.events {
            match event {
                SinkEvent::StartMessage => row = vec![None; width],
                SinkEvent::StartField { ordinal, .. } => current = Some(*ordinal),
                SinkEvent::Value(value) => {
                    if let Some(ordinal) = current {
                        row[ordinal] = Some(value.clone());
                    }
                }
                SinkEvent::EndField { .. } => current = None,
                SinkEvent::EndMessage => rows.push(std::mem::take(&mut row)),
            }
        }
        rows
    }

    /// Values of one column across completed records, absent entries skipped
    pub fn column_values(&self, ordinal: usize) -> Vec<PrimitiveValue> {
        self.rows()
            .into_iter()
            .filter_map(|mut row| row.get_mut(ordinal).and_then(Option::take))
            .collect()
    }

    fn tracker(&mut self) -> Result<&mut MessageTracker, SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.tracker.as_mut().ok_or(SinkError::NotInitialized)
    }

    fn record_value(&mut self, value: PrimitiveValue) -> Result<(), SinkError> {
        self.tracker()?.value(value.primitive_type())?;
        self.events.push(SinkEvent::Value(value));
        Ok(())
    }
}

impl ColumnSink for RecordingSink {
    fn init(&mut self, schema: &Schema) -> Result<WriteContext, SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        if self.tracker.is_some() {
            return Err(SinkError::protocol("sink initialized twice"));
        }
        self.tracker = Some(MessageTracker::new(schema));
        Ok(WriteContext::new(schema))
    }

    fn start_message(&mut self) -> Result<(), SinkError> {
        self.tracker()?.start_message()?;
        self.events.push(SinkEvent::StartMessage);
        Ok(())
    }

    fn start_field(&mut self, name: &str, ordinal: usize) -> Result<(), SinkError> {
        self.tracker()?.start_field(name, ordinal)?;
        self.events.push(SinkEvent::StartField {
            name: name.to_string(),
            ordinal,
        });
        Ok(())
    }

    fn write_binary(&mut self, value: Bytes) -> Result<(), SinkError> {
        self.record_value(PrimitiveValue::Binary(value))
    }

    fn write_int32(&mut self, value: i32) -> Result<(), SinkError> {
        self.record_value(PrimitiveValue::Int32(value))
    }

    fn write_int64(&mut self, value: i64) -> Result<(), SinkError> {
        self.record_value(PrimitiveValue::Int64(value))
    }

    fn write_float(&mut self, value: f32) -> Result<(), SinkError> {
        self.record_value(PrimitiveValue::from(value))
    }

    fn write_double(&mut self, value: f64) -> Result<(), SinkError> {
        self.record_value(PrimitiveValue::from(value))
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), SinkError> {
        self.record_value(PrimitiveValue::Boolean(value))
    }

    fn end_field(&mut self, name: &str, ordinal: usize) -> Result<(), SinkError> {
        self.tracker()?.end_field(name, ordinal)?;
        self.events.push(SinkEvent::EndField {
            name: name.to_string(),
            ordinal,
        });
        Ok(())
    }

    fn end_message(&mut self) -> Result<(), SinkError> {
        self.tracker()?.end_message()?;
        self.events.push(SinkEvent::EndMessage);
        self.messages += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.tracker()?.in_message() {
            return Err(SinkError::protocol("close inside an open message"));
        }
        self.closed = true;
        Ok(())
    }
}

//! The column sink capability and the message protocol shared by sinks
//!
//! A record is delivered as
//! `start_message (start_field write_* end_field)* end_message`, with one
//! `start_field`/`end_field` pair per column that carries a value. Columns
//! without a pair are absent for that record.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::SinkError;
use crate::schema::{PrimitiveType, Schema};

/// Write-side handle returned by [`ColumnSink::init`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteContext {
    pub column_count: usize,
    /// Key/value pairs the sink stores alongside the data
    pub extra_metadata: BTreeMap<String, String>,
}

impl WriteContext {
    pub fn new(schema: &Schema) -> Self {
        Self {
            column_count: schema.len(),
            extra_metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extra_metadata.insert(key.into(), value.into());
        self
    }
}

/// Receiver of per-column write events
///
/// `init` must be called with the same schema the encoder is built from,
/// before any other call. `close` flushes and finalizes the output.
pub trait ColumnSink {
    fn init(&mut self, schema: &Schema) -> Result<WriteContext, SinkError>;

    fn start_message(&mut self) -> Result<(), SinkError>;

    fn start_field(&mut self, name: &str, ordinal: usize) -> Result<(), SinkError>;

    fn write_binary(&mut self, value: Bytes) -> Result<(), SinkError>;

    fn write_int32(&mut self, value: i32) -> Result<(), SinkError>;

    fn write_int64(&mut self, value: i64) -> Result<(), SinkError>;

    fn write_float(&mut self, value: f32) -> Result<(), SinkError>;

    fn write_double(&mut self, value: f64) -> Result<(), SinkError>;

    fn write_boolean(&mut self, value: bool) -> Result<(), SinkError>;

    fn end_field(&mut self, name: &str, ordinal: usize) -> Result<(), SinkError>;

    fn end_message(&mut self) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError>;
}

/// Validates call order and value types against the schema a sink was
/// initialized with
#[derive(Debug, Clone)]
pub(crate) struct MessageTracker {
    schema: Schema,
    in_message: bool,
    current: Option<usize>,
    written: Vec<bool>,
}

impl MessageTracker {
    pub(crate) fn new(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
            in_message: false,
            current: None,
            written: vec![false; schema.len()],
        }
    }

    pub(crate) fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn start_message(&mut self) -> Result<(), SinkError> {
        if self.in_message {
            return Err(SinkError::protocol("start_message inside an open message"));
        }
        self.in_message = true;
        self.written.iter_mut().for_each(|w| *w = false);
        Ok(())
    }

    pub(crate) fn start_field(&mut self, name: &str, ordinal: usize) -> Result<(), SinkError> {
        if !self.in_message {
            return Err(SinkError::protocol(format!(
                "start_field '{}' outside a message",
                name
            )));
        }
        if let Some(open) = self.current {
            return Err(SinkError::protocol(format!(
                "start_field '{}' while field at ordinal {} is open",
                name, open
            )));
        }
        match self.schema.field(ordinal) {
            Some(field) if field.name == name => {}
            _ => {
                return Err(SinkError::UnknownColumn {
                    name: name.to_string(),
                    ordinal,
                })
            }
        }
        if self.written[ordinal] {
            return Err(SinkError::protocol(format!(
                "field '{}' started twice in one message",
                name
            )));
        }
        self.current = Some(ordinal);
        Ok(())
    }

    /// Check a value against the open field; returns its column index
    pub(crate) fn value(&mut self, actual: PrimitiveType) -> Result<usize, SinkError> {
        let ordinal = self
            .current
            .ok_or_else(|| SinkError::protocol(format!("{} value written outside a field", actual)))?;
        let field = &self.schema.fields()[ordinal];
        if field.primitive_type != actual {
            return Err(SinkError::TypeMismatch {
                column: field.name.clone(),
                expected: field.primitive_type,
                actual,
            });
        }
        if self.written[ordinal] {
            return Err(SinkError::protocol(format!(
                "second value for field '{}'",
                field.name
            )));
        }
        self.written[ordinal] = true;
        Ok(ordinal)
    }

    pub(crate) fn end_field(&mut self, name: &str, ordinal: usize) -> Result<(), SinkError> {
        if self.current != Some(ordinal) {
            return Err(SinkError::protocol(format!(
                "end_field '{}' at ordinal {} does not match the open field",
                name, ordinal
            )));
        }
        if self.schema.fields()[ordinal].name != name {
            return Err(SinkError::UnknownColumn {
                name: name.to_string(),
                ordinal,
            });
        }
        if !self.written[ordinal] {
            return Err(SinkError::protocol(format!(
                "field '{}' ended without a value",
                name
            )));
        }
        self.current = None;
        Ok(())
    }

    /// Close the message; returns which columns received a value
    pub(crate) fn end_message(&mut self) -> Result<&[bool], SinkError> {
        if !self.in_message {
            return Err(SinkError::protocol("end_message without start_message"));
        }
        if let Some(open) = self.current {
            return Err(SinkError::protocol(format!(
                "end_message while field at ordinal {} is open",
                open
            )));
        }
        if let Some(field) = self
            .schema
            .fields()
            .iter()
            .find(|f| f.is_required() && !self.written[f.ordinal])
        {
            return Err(SinkError::MissingRequiredValue {
                column: field.name.clone(),
            });
        }
        self.in_message = false;
        Ok(&self.written)
    }

    pub(crate) fn in_message(&self) -> bool {
        self.in_message
    }
}

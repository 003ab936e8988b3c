//! Emission of coerced records as column sink events

use crate::error::EncodeError;
use crate::schema::Schema;
use crate::sink::ColumnSink;
use crate::value::{PrimitiveValue, TypedField};

/// Writes typed records to any [`ColumnSink`]
///
/// Must be built from the schema the sink was initialized with.
#[derive(Debug, Clone, Copy)]
pub struct ColumnEncoder<'s> {
    schema: &'s Schema,
}

impl<'s> ColumnEncoder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Emit one record; absent fields produce no field events at all
    pub fn encode<S>(&self, fields: &[TypedField], sink: &mut S) -> Result<(), EncodeError>
    where
        S: ColumnSink + ?Sized,
    {
        sink.start_message()?;

        for field in fields {
            let Some(value) = &field.value else {
                continue;
            };
            let spec = self
                .schema
                .field(field.ordinal)
                .ok_or(EncodeError::UnknownOrdinal(field.ordinal))?;

            sink.start_field(&spec.name, spec.ordinal)?;
            match value {
                PrimitiveValue::Binary(b) => sink.write_binary(b.clone())?,
                PrimitiveValue::Int32(v) => sink.write_int32(*v)?,
                PrimitiveValue::Int64(v) => sink.write_int64(*v)?,
                PrimitiveValue::Float(v) => sink.write_float(v.into_inner())?,
                PrimitiveValue::Double(v) => sink.write_double(v.into_inner())?,
                PrimitiveValue::Boolean(v) => sink.write_boolean(*v)?,
            }
            sink.end_field(&spec.name, spec.ordinal)?;
        }

        sink.end_message()?;
        Ok(())
    }
}

/// Encode one record against `schema`
pub fn encode<S>(fields: &[TypedField], schema: &Schema, sink: &mut S) -> Result<(), EncodeError>
where
    S: ColumnSink + ?Sized,
{
    ColumnEncoder::new(schema).encode(fields, sink)
}

//! Conversion between schema columns and Arrow arrays
//!
//! The Parquet sink buffers values per column and turns each buffer into an
//! Arrow array when a batch is flushed; the reader goes the other way.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::{builder::*, Array, ArrayRef};
use arrow_schema::{DataType, Field};
use bytes::Bytes;

use crate::error::StorageError;
use crate::schema::{FieldSpec, PrimitiveType, Schema};
use crate::value::PrimitiveValue;

/// Arrow schema metadata key holding the source schema declaration
pub const SCHEMA_METADATA_KEY: &str = "csv_parquet.schema";

type Result<T> = std::result::Result<T, StorageError>;

/// Arrow type a primitive column is stored as
pub fn primitive_type_to_arrow(primitive_type: PrimitiveType) -> DataType {
    match primitive_type {
        PrimitiveType::Binary => DataType::Binary,
        PrimitiveType::Int32 => DataType::Int32,
        PrimitiveType::Int64 => DataType::Int64,
        PrimitiveType::Float => DataType::Float32,
        PrimitiveType::Double => DataType::Float64,
        PrimitiveType::Boolean => DataType::Boolean,
    }
}

/// Convert a FieldSpec to an Arrow Field; optional fields are nullable
pub fn field_to_arrow(field: &FieldSpec) -> Field {
    Field::new(
        &field.name,
        primitive_type_to_arrow(field.primitive_type),
        !field.is_required(),
    )
}

/// Convert our Schema to an Arrow Schema carrying the declaration text
pub fn schema_to_arrow(schema: &Schema) -> Arc<arrow_schema::Schema> {
    let fields: Vec<Field> = schema.fields().iter().map(field_to_arrow).collect();
    let metadata = HashMap::from([(SCHEMA_METADATA_KEY.to_string(), schema.to_string())]);
    Arc::new(arrow_schema::Schema::new_with_metadata(fields, metadata))
}

/// Build an Arrow array from one column's buffered values
pub fn values_to_arrow_array(
    primitive_type: PrimitiveType,
    values: Vec<Option<PrimitiveValue>>,
) -> Result<ArrayRef> {
    match primitive_type {
        PrimitiveType::Binary => {
            let mut builder = BinaryBuilder::with_capacity(values.len(), 0);
            for value in values {
                match value {
                    Some(PrimitiveValue::Binary(b)) => builder.append_value(&b),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(primitive_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Int32 => {
            let mut builder = Int32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(PrimitiveValue::Int32(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(primitive_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Int64 => {
            let mut builder = Int64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(PrimitiveValue::Int64(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(primitive_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Float => {
            let mut builder = Float32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(PrimitiveValue::Float(v)) => builder.append_value(v.into_inner()),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(primitive_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Double => {
            let mut builder = Float64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(PrimitiveValue::Double(v)) => builder.append_value(v.into_inner()),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(primitive_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(PrimitiveValue::Boolean(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(primitive_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
    }
}

fn mismatch(expected: PrimitiveType, value: &PrimitiveValue) -> StorageError {
    StorageError::conversion(format!(
        "Expected {}, got {}",
        expected,
        value.primitive_type()
    ))
}

/// Read one value out of an Arrow array; nulls become `None`
pub fn arrow_to_value(array: &dyn Array, index: usize) -> Result<Option<PrimitiveValue>> {
    use arrow_array::*;

    if array.is_null(index) {
        return Ok(None);
    }

    let value = match array.data_type() {
        DataType::Binary => {
            let array = downcast_array::<BinaryArray>(array)?;
            PrimitiveValue::Binary(Bytes::copy_from_slice(array.value(index)))
        }
        DataType::Int32 => PrimitiveValue::Int32(downcast_array::<Int32Array>(array)?.value(index)),
        DataType::Int64 => PrimitiveValue::Int64(downcast_array::<Int64Array>(array)?.value(index)),
        DataType::Float32 => {
            PrimitiveValue::from(downcast_array::<Float32Array>(array)?.value(index))
        }
        DataType::Float64 => {
            PrimitiveValue::from(downcast_array::<Float64Array>(array)?.value(index))
        }
        DataType::Boolean => {
            PrimitiveValue::Boolean(downcast_array::<BooleanArray>(array)?.value(index))
        }
        dt => {
            return Err(StorageError::conversion(format!(
                "Unsupported data type for conversion: {:?}",
                dt
            )))
        }
    };
    Ok(Some(value))
}

/// Helper function to downcast an array with better error messages
fn downcast_array<T: 'static>(array: &dyn Array) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        StorageError::conversion(format!("Failed to cast to {}", std::any::type_name::<T>()))
    })
}

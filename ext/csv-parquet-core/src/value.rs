use bytes::Bytes;
use ordered_float::OrderedFloat;

use crate::schema::PrimitiveType;

/// Size of one buffered column slot, present or absent
pub const SLOT_SIZE: usize = std::mem::size_of::<Option<PrimitiveValue>>();

/// A typed value produced by coercion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveValue {
    Binary(Bytes),
    Int32(i32),
    Int64(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Boolean(bool),
}

impl PrimitiveValue {
    /// The schema type this value belongs to
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            PrimitiveValue::Binary(_) => PrimitiveType::Binary,
            PrimitiveValue::Int32(_) => PrimitiveType::Int32,
            PrimitiveValue::Int64(_) => PrimitiveType::Int64,
            PrimitiveValue::Float(_) => PrimitiveType::Float,
            PrimitiveValue::Double(_) => PrimitiveType::Double,
            PrimitiveValue::Boolean(_) => PrimitiveType::Boolean,
        }
    }

    /// Approximate buffered footprint: the column slot plus any heap payload
    pub fn estimated_size(&self) -> usize {
        match self {
            PrimitiveValue::Binary(b) => SLOT_SIZE + b.len(),
            _ => SLOT_SIZE,
        }
    }
}

impl From<i32> for PrimitiveValue {
    fn from(v: i32) -> Self {
        PrimitiveValue::Int32(v)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(v: i64) -> Self {
        PrimitiveValue::Int64(v)
    }
}

impl From<f32> for PrimitiveValue {
    fn from(v: f32) -> Self {
        PrimitiveValue::Float(OrderedFloat(v))
    }
}

impl From<f64> for PrimitiveValue {
    fn from(v: f64) -> Self {
        PrimitiveValue::Double(OrderedFloat(v))
    }
}

impl From<bool> for PrimitiveValue {
    fn from(v: bool) -> Self {
        PrimitiveValue::Boolean(v)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(v: &str) -> Self {
        PrimitiveValue::Binary(Bytes::copy_from_slice(v.as_bytes()))
    }
}

impl From<Vec<u8>> for PrimitiveValue {
    fn from(v: Vec<u8>) -> Self {
        PrimitiveValue::Binary(Bytes::from(v))
    }
}

/// One coerced field of a record; `None` means the field carries no value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedField {
    pub ordinal: usize,
    pub value: Option<PrimitiveValue>,
}

impl TypedField {
    pub fn new(ordinal: usize, value: Option<PrimitiveValue>) -> Self {
        Self { ordinal, value }
    }

    pub fn absent(ordinal: usize) -> Self {
        Self {
            ordinal,
            value: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }
}

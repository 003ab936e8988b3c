//! Conversion of raw text tokens into typed field values

use crate::encoding::TextEncoding;
use crate::error::CoercionError;
use crate::schema::{FieldSpec, PrimitiveType, Schema};
use crate::tokenizer::RawRecord;
use crate::value::{PrimitiveValue, TypedField};

/// How an empty token is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyFieldPolicy {
    /// An empty token means "no value", for required and optional fields alike
    #[default]
    Absent,
    /// An empty token for a required field is a coercion error
    RejectRequired,
}

/// Schema-driven converter from [`RawRecord`] to typed fields
#[derive(Debug, Clone, Default)]
pub struct Coercer {
    encoding: TextEncoding,
    empty_policy: EmptyFieldPolicy,
}

impl Coercer {
    pub fn new(encoding: TextEncoding, empty_policy: EmptyFieldPolicy) -> Self {
        Self {
            encoding,
            empty_policy,
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn empty_policy(&self) -> EmptyFieldPolicy {
        self.empty_policy
    }

    /// Coerce every schema field in ordinal order, stopping at the first error
    pub fn coerce(
        &self,
        raw: &RawRecord<'_>,
        schema: &Schema,
    ) -> Result<Vec<TypedField>, CoercionError> {
        if raw.len() > schema.len() {
            return Err(CoercionError::TooManyFields {
                expected: schema.len(),
                found: raw.len(),
            });
        }

        schema
            .fields()
            .iter()
            .map(|field| {
                let value = match raw.get(field.ordinal) {
                    None if field.is_required() => {
                        return Err(CoercionError::MissingRequiredField {
                            field: field.name.clone(),
                            ordinal: field.ordinal,
                        })
                    }
                    None => None,
                    Some("") => {
                        if field.is_required() && self.empty_policy == EmptyFieldPolicy::RejectRequired
                        {
                            return Err(CoercionError::EmptyRequiredField {
                                field: field.name.clone(),
                                ordinal: field.ordinal,
                            });
                        }
                        None
                    }
                    Some(text) => Some(self.coerce_value(field, text)?),
                };
                Ok(TypedField::new(field.ordinal, value))
            })
            .collect()
    }

    /// Convert one non-empty token to the field's declared type
    pub fn coerce_value(
        &self,
        field: &FieldSpec,
        text: &str,
    ) -> Result<PrimitiveValue, CoercionError> {
        let mismatch = || CoercionError::TypeMismatch {
            field: field.name.clone(),
            ordinal: field.ordinal,
            expected: field.primitive_type,
            raw_text: text.to_string(),
        };

        Ok(match field.primitive_type {
            PrimitiveType::Binary => PrimitiveValue::Binary(self.encoding.encode(text)),
            PrimitiveType::Int32 => PrimitiveValue::Int32(text.parse().map_err(|_| mismatch())?),
            PrimitiveType::Int64 => PrimitiveValue::Int64(text.parse().map_err(|_| mismatch())?),
            PrimitiveType::Float => {
                PrimitiveValue::from(text.parse::<f32>().map_err(|_| mismatch())?)
            }
            PrimitiveType::Double => {
                PrimitiveValue::from(text.parse::<f64>().map_err(|_| mismatch())?)
            }
            PrimitiveType::Boolean => {
                PrimitiveValue::Boolean(parse_boolean(text).ok_or_else(mismatch)?)
            }
        })
    }
}

fn parse_boolean(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

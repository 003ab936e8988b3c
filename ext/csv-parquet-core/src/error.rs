use thiserror::Error;

use crate::schema::PrimitiveType;

/// Errors from the Arrow/Parquet storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO errors from file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow errors from Arrow operations
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Parquet format errors
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Values that do not fit the Arrow column they are destined for
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// File contents that this crate did not write or cannot interpret
    #[error("Schema error: {0}")]
    Schema(String),
}

impl StorageError {
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        StorageError::Conversion(msg.into())
    }

    pub fn schema<S: Into<String>>(msg: S) -> Self {
        StorageError::Schema(msg.into())
    }
}

/// Errors raised while parsing a schema declaration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A token in type position is not one of the primitive type keywords
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// Declared ordinals must run 1, 2, 3, ... in declaration order
    #[error("field '{field}' declares ordinal {found}, expected {expected}")]
    OrdinalMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    /// The same field name was declared twice
    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    /// Any other violation of the declaration grammar
    #[error("malformed schema declaration: {0}")]
    MalformedDeclaration(String),
}

impl SchemaError {
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        SchemaError::MalformedDeclaration(msg.into())
    }
}

/// Errors raised while converting raw text tokens into typed values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("required field '{field}' (ordinal {ordinal}) is missing")]
    MissingRequiredField { field: String, ordinal: usize },

    #[error("required field '{field}' (ordinal {ordinal}) is empty")]
    EmptyRequiredField { field: String, ordinal: usize },

    #[error("field '{field}' (ordinal {ordinal}) expected {expected}, got '{raw_text}'")]
    TypeMismatch {
        field: String,
        ordinal: usize,
        expected: PrimitiveType,
        raw_text: String,
    },

    #[error("record has {found} fields but schema declares {expected}")]
    TooManyFields { expected: usize, found: usize },
}

/// Errors reported by a [`ColumnSink`](crate::sink::ColumnSink) implementation
#[derive(Error, Debug)]
pub enum SinkError {
    /// A value was written whose type differs from the column's declared type
    #[error("column '{column}' expects {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: PrimitiveType,
        actual: PrimitiveType,
    },

    /// A message ended without a value for a required column
    #[error("required column '{column}' received no value")]
    MissingRequiredValue { column: String },

    /// start_field/end_field named a column the sink does not know about
    #[error("unknown column '{name}' at ordinal {ordinal}")]
    UnknownColumn { name: String, ordinal: usize },

    /// Calls arrived out of the start/end message and field nesting order
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("sink used before init")]
    NotInitialized,

    #[error("sink has been closed")]
    Closed,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Storage(err.into())
    }
}

impl From<arrow_schema::ArrowError> for SinkError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        SinkError::Storage(err.into())
    }
}

impl From<parquet::errors::ParquetError> for SinkError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        SinkError::Storage(err.into())
    }
}

impl SinkError {
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        SinkError::Protocol(msg.into())
    }
}

/// Errors raised while emitting a coerced record to a sink
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The sink rejected a value's type; schema and sink have diverged
    #[error("unsupported column type for '{column}': sink expects {expected}, encoder sent {actual}")]
    UnsupportedColumnType {
        column: String,
        expected: PrimitiveType,
        actual: PrimitiveType,
    },

    #[error("no schema field at ordinal {0}")]
    UnknownOrdinal(usize),

    #[error("sink write failed: {0}")]
    SinkWriteFailure(#[source] SinkError),
}

impl From<SinkError> for EncodeError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::TypeMismatch {
                column,
                expected,
                actual,
            } => EncodeError::UnsupportedColumnType {
                column,
                expected,
                actual,
            },
            other => EncodeError::SinkWriteFailure(other),
        }
    }
}

/// Error surfaced by a conversion run, always naming the 1-based input line
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("line {line}: {source}")]
    Schema {
        line: usize,
        #[source]
        source: SchemaError,
    },

    #[error("line {line}: failed to read input: {source}")]
    Input {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Coercion {
        line: usize,
        #[source]
        source: CoercionError,
    },

    #[error("line {line}: {source}")]
    Encode {
        line: usize,
        #[source]
        source: EncodeError,
    },
}

impl ConversionError {
    /// Input line at which the run failed
    pub fn line(&self) -> usize {
        match self {
            ConversionError::Schema { line, .. }
            | ConversionError::Input { line, .. }
            | ConversionError::Coercion { line, .. }
            | ConversionError::Encode { line, .. } => *line,
        }
    }

    /// Short, stable label for the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::Schema { source, .. } => match source {
                SchemaError::UnknownType(_) => "unknown-type",
                SchemaError::OrdinalMismatch { .. } => "ordinal-mismatch",
                SchemaError::DuplicateField(_) => "duplicate-field",
                SchemaError::MalformedDeclaration(_) => "malformed-declaration",
            },
            ConversionError::Input { .. } => "input",
            ConversionError::Coercion { source, .. } => match source {
                CoercionError::MissingRequiredField { .. } => "missing-required-field",
                CoercionError::EmptyRequiredField { .. } => "empty-required-field",
                CoercionError::TypeMismatch { .. } => "type-mismatch",
                CoercionError::TooManyFields { .. } => "too-many-fields",
            },
            ConversionError::Encode { source, .. } => match source {
                EncodeError::UnsupportedColumnType { .. } => "unsupported-column-type",
                EncodeError::UnknownOrdinal(_) => "unknown-ordinal",
                EncodeError::SinkWriteFailure(_) => "sink-write-failure",
            },
        }
    }
}

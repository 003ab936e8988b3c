//! Schema model and the parser for the single-line declaration format
//!
//! ```text
//! message <ident> { (required|optional) <type> <ident> = <positive-int>; ... }
//! ```
//!
//! Ordinals are written 1-based and must follow declaration order; they are
//! stored 0-based and double as the column index of each field.

use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Primitive column types a schema can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Binary,
    Int32,
    Int64,
    Float,
    Double,
    Boolean,
}

/// Whether a field must carry a value in every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    /// Field must have exactly one value
    Required,
    /// Field can have 0 or 1 value
    Optional,
}

/// A single declared field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub primitive_type: PrimitiveType,
    pub repetition: Repetition,
    /// 0-based position in declaration order
    pub ordinal: usize,
}

/// Ordered, immutable field list shared by the coercer, encoder and sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 6] = [
        PrimitiveType::Binary,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::Boolean,
    ];

    /// Keyword used for this type in schema text
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveType::Binary => "binary",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Boolean => "boolean",
        }
    }

    /// Look up a type by its exact keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.keyword() == keyword)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl Repetition {
    pub fn keyword(&self) -> &'static str {
        match self {
            Repetition::Required => "required",
            Repetition::Optional => "optional",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "required" => Some(Repetition::Required),
            "optional" => Some(Repetition::Optional),
            _ => None,
        }
    }
}

impl FieldSpec {
    pub fn is_required(&self) -> bool {
        self.repetition == Repetition::Required
    }
}

impl Schema {
    /// Parse a schema declaration
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        parse(text)
    }

    /// Name following the `message` keyword
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field at a 0-based ordinal
    pub fn field(&self, ordinal: usize) -> Option<&FieldSpec> {
        self.fields.get(ordinal)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Re-serializes into the declaration grammar; `parse` accepts the output.
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message {} {{", self.name)?;
        for field in &self.fields {
            write!(
                f,
                " {} {} {} = {};",
                field.repetition.keyword(),
                field.primitive_type,
                field.name,
                field.ordinal + 1
            )?;
        }
        f.write_str(" }")
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Builder for creating schemas in code
///
/// Ordinals are assigned in the order fields are added.
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field<S: Into<String>>(
        mut self,
        name: S,
        primitive_type: PrimitiveType,
        repetition: Repetition,
    ) -> Self {
        let ordinal = self.fields.len();
        self.fields.push(FieldSpec {
            name: name.into(),
            primitive_type,
            repetition,
            ordinal,
        });
        self
    }

    pub fn required<S: Into<String>>(self, name: S, primitive_type: PrimitiveType) -> Self {
        self.field(name, primitive_type, Repetition::Required)
    }

    pub fn optional<S: Into<String>>(self, name: S, primitive_type: PrimitiveType) -> Self {
        self.field(name, primitive_type, Repetition::Optional)
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        if !is_identifier(&self.name) {
            return Err(SchemaError::malformed(format!(
                "invalid message name '{}'",
                self.name
            )));
        }
        if self.fields.is_empty() {
            return Err(SchemaError::malformed("message declares no fields"));
        }
        for (idx, field) in self.fields.iter().enumerate() {
            if !is_identifier(&field.name) {
                return Err(SchemaError::malformed(format!(
                    "invalid field name '{}'",
                    field.name
                )));
            }
            if self.fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Schema {
            name: self.name,
            fields: self.fields,
        })
    }
}

/// Parse a schema declaration into a [`Schema`]
pub fn parse(text: &str) -> Result<Schema, SchemaError> {
    let tokens = lex(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_message()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Punct(char),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{}'", w),
            Token::Punct(c) => write!(f, "'{}'", c),
        }
    }
}

fn lex(text: &str) -> Result<Vec<Token<'_>>, SchemaError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if matches!(c, '{' | '}' | '=' | ';') {
            tokens.push(Token::Punct(c));
            chars.next();
        } else if c.is_ascii_alphanumeric() || c == '_' {
            let mut end = start;
            while let Some(&(idx, c)) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                end = idx + c.len_utf8();
                chars.next();
            }
            tokens.push(Token::Word(&text[start..end]));
        } else {
            return Err(SchemaError::malformed(format!(
                "unexpected character '{}' at offset {}",
                c, start
            )));
        }
    }

    Ok(tokens)
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_message(&mut self) -> Result<Schema, SchemaError> {
        match self.next_word("'message'")? {
            "message" => {}
            other => {
                return Err(SchemaError::malformed(format!(
                    "expected 'message', found '{}'",
                    other
                )))
            }
        }
        let name = self.identifier("message name")?;
        self.punct('{')?;

        let mut builder = SchemaBuilder::new(name);
        let mut count = 0;
        while self.peek() != Some(Token::Punct('}')) {
            builder = self.parse_field(builder, count)?;
            count += 1;
        }
        self.punct('}')?;

        if let Some(token) = self.peek() {
            return Err(SchemaError::malformed(format!(
                "unexpected {} after closing brace",
                token
            )));
        }

        builder.build()
    }

    fn parse_field(
        &mut self,
        builder: SchemaBuilder,
        declared: usize,
    ) -> Result<SchemaBuilder, SchemaError> {
        let repetition_word = self.next_word("'required' or 'optional'")?;
        let repetition = Repetition::from_keyword(repetition_word).ok_or_else(|| {
            SchemaError::malformed(format!(
                "expected 'required' or 'optional', found '{}'",
                repetition_word
            ))
        })?;

        let type_word = self.next_word("a type")?;
        let primitive_type = PrimitiveType::from_keyword(type_word)
            .ok_or_else(|| SchemaError::UnknownType(type_word.to_string()))?;

        let name = self.identifier("field name")?;
        if builder.fields.iter().any(|f| f.name == name) {
            return Err(SchemaError::DuplicateField(name.to_string()));
        }

        self.punct('=')?;
        let ordinal_word = self.next_word("an ordinal")?;
        let found: usize = ordinal_word.parse().map_err(|_| {
            SchemaError::malformed(format!(
                "ordinal of field '{}' is not a positive integer: '{}'",
                name, ordinal_word
            ))
        })?;
        let expected = declared + 1;
        if found != expected {
            return Err(SchemaError::OrdinalMismatch {
                field: name.to_string(),
                expected,
                found,
            });
        }
        self.punct(';')?;

        Ok(builder.field(name, primitive_type, repetition))
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn next_word(&mut self, expected: &str) -> Result<&'a str, SchemaError> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w),
            Some(token) => Err(SchemaError::malformed(format!(
                "expected {}, found {}",
                expected, token
            ))),
            None => Err(SchemaError::malformed(format!(
                "expected {}, found end of input",
                expected
            ))),
        }
    }

    fn identifier(&mut self, what: &str) -> Result<&'a str, SchemaError> {
        let word = self.next_word(what)?;
        if is_identifier(word) {
            Ok(word)
        } else {
            Err(SchemaError::malformed(format!("invalid {} '{}'", what, word)))
        }
    }

    fn punct(&mut self, expected: char) -> Result<(), SchemaError> {
        match self.next() {
            Some(Token::Punct(c)) if c == expected => Ok(()),
            Some(token) => Err(SchemaError::malformed(format!(
                "expected '{}', found {}",
                expected, token
            ))),
            None => Err(SchemaError::malformed(format!(
                "expected '{}', found end of input",
                expected
            ))),
        }
    }
}

//! Text encoding applied to binary columns

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};

/// Character encoding used to turn text tokens into binary column bytes
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding(&'static Encoding);

impl TextEncoding {
    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    /// Resolve a WHATWG encoding label such as `utf-8`, `latin1` or `shift_jis`
    ///
    /// Encodings that cannot be produced as output (UTF-16 and `replacement`)
    /// are rejected.
    pub fn for_label(label: &str) -> Result<Self, UnknownEncoding> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| UnknownEncoding(label.to_string()))?;
        if encoding.output_encoding() != encoding {
            return Err(UnknownEncoding(label.to_string()));
        }
        Ok(Self(encoding))
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Encode text; unmappable characters are replaced, never rejected
    pub fn encode(&self, text: &str) -> Bytes {
        if self.0 == UTF_8 {
            return Bytes::copy_from_slice(text.as_bytes());
        }
        let (bytes, _, _) = self.0.encode(text);
        Bytes::copy_from_slice(&bytes)
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextEncoding").field(&self.name()).finish()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_label(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEncoding(pub String);

impl fmt::Display for UnknownEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported text encoding '{}'", self.0)
    }
}

impl std::error::Error for UnknownEncoding {}

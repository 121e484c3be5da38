//! Project character encoding.
//!
//! Payloads (`eval` expressions, breakpoint conditions, property values)
//! travel base64-encoded; the bytes inside are in the project's encoding.
//! Any label `encoding_rs` knows is accepted, so names resolve the way a
//! browser resolves them (`latin1` and `iso-8859-1` mean windows-1252).

use std::fmt;
use std::str::FromStr;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::{DbgpError, Result};

/// A character encoding resolved from its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Charset(&'static Encoding);

impl Charset {
    /// UTF-8, also the platform default.
    pub const UTF_8: Charset = Charset(&encoding_rs::UTF_8_INIT);
    /// What `ISO-8859-1` resolves to: windows-1252, a superset of Latin-1.
    pub const LATIN_1: Charset = Charset(&encoding_rs::WINDOWS_1252_INIT);

    /// Look up an encoding label such as `UTF-8`, `latin1` or `Shift_JIS`.
    pub fn for_label(label: &str) -> Result<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Charset)
            .ok_or_else(|| DbgpError::UnsupportedCharset(label.to_string()))
    }

    /// The charset used when no project encoding is known.
    pub fn platform_default() -> Self {
        Charset::UTF_8
    }

    /// Resolve an optional encoding name, falling back to the platform default.
    pub fn resolve(name: Option<&str>) -> Result<Self> {
        match name {
            Some(name) => Self::for_label(name),
            None => Ok(Self::platform_default()),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.0
    }

    /// Encode text; characters outside the charset become `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let (bytes, _, unmappable) = self.0.encode(text);
        if !unmappable {
            return bytes.into_owned();
        }
        let mut out = Vec::with_capacity(text.len());
        let mut buf = [0u8; 4];
        for c in text.chars() {
            let (bytes, _, unmappable) = self.0.encode(c.encode_utf8(&mut buf));
            if unmappable {
                out.push(b'?');
            } else {
                out.extend_from_slice(&bytes);
            }
        }
        out
    }

    /// Decode bytes; malformed sequences become U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        self.0.decode_without_bom_handling(bytes).0.into_owned()
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Strict ISO-8859-1 bytes of `text`, one per char; chars above U+00FF
/// become `?`.
pub(crate) fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

impl FromStr for Charset {
    type Err = DbgpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::for_label(s)
    }
}

impl TryFrom<String> for Charset {
    type Error = DbgpError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Charset> for String {
    fn from(charset: Charset) -> Self {
        charset.name().to_string()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

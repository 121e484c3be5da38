//! Client-engine communication protocol framing.
//!
//! Requests travel as a single ASCII line terminated by a NUL byte:
//! `<command> -i <transaction id>[ <arguments>][ -- <base64 payload>]\0`.
//! The engine answers with `<length>\0<xml document>\0`; the document is
//! decoded with the encoding its XML declaration names.

use std::io::{ErrorKind, Read};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::charset::Charset;
use crate::error::{DbgpError, Result};

/// Frame terminator.
pub const NUL: u8 = 0;
/// Flag carrying the transaction id.
pub const TRANSACTION_FLAG: &str = "-i";
/// Separates arguments from the base64 payload.
pub const PAYLOAD_SEPARATOR: &str = " -- ";

/// Build a complete request frame.
pub fn encode_frame(name: &str, transaction_id: &str, arguments: &str, payload: Option<&[u8]>) -> Vec<u8> {
    let mut frame = format!("{name} {TRANSACTION_FLAG} {transaction_id}");
    if !arguments.is_empty() {
        frame.push(' ');
        frame.push_str(arguments);
    }
    if let Some(payload) = payload {
        frame.push_str(PAYLOAD_SEPARATOR);
        frame.push_str(&STANDARD.encode(payload));
    }
    let mut bytes = frame.into_bytes();
    bytes.push(NUL);
    bytes
}

/// Decode a base64 payload, ignoring embedded whitespace.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Splits the engine's byte stream into XML documents.
///
/// Bytes are buffered across reads, so a frame may arrive in any number of
/// pieces.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Take the next complete frame body out of the buffer, if there is one.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(len_end) = self.buf.iter().position(|&b| b == NUL) else {
            return Ok(None);
        };
        let len_text = String::from_utf8_lossy(&self.buf[..len_end]).into_owned();
        let len: usize = len_text
            .trim()
            .parse()
            .map_err(|_| DbgpError::MalformedFrame(format!("bad length prefix {len_text:?}")))?;
        let body_start = len_end + 1;
        // body plus its trailing NUL
        if self.buf.len() < body_start + len + 1 {
            return Ok(None);
        }
        if self.buf[body_start + len] != NUL {
            return Err(DbgpError::MalformedFrame(format!(
                "frame of {len} bytes is not NUL terminated"
            )));
        }
        let body = self.buf[body_start..body_start + len].to_vec();
        self.buf.drain(..body_start + len + 1);
        Ok(Some(body))
    }

    /// Block on `reader` until a whole frame is available.
    ///
    /// Returns `Ok(None)` on a clean end of stream.
    pub fn read_frame(&mut self, reader: &mut impl Read) -> Result<Option<Vec<u8>>> {
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(frame) = self.next_frame()? {
                return Ok(Some(frame));
            }
            let n = match reader.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                if !self.buf.is_empty() {
                    log::warn!("connection closed with {} unread bytes", self.buf.len());
                }
                return Ok(None);
            }
            self.push(&chunk[..n]);
        }
    }
}

/// The `encoding` named by a leading `<?xml ...?>` declaration.
fn declared_encoding(body: &[u8]) -> Option<String> {
    let rest = body.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|w| w == b"?>")?;
    let declaration = String::from_utf8_lossy(&rest[..end]).into_owned();
    let value = declaration.split_once("encoding")?.1.trim_start();
    let value = value.strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &value[1..];
    Some(value[..value.find(quote)?].to_string())
}

/// Decode a frame body to text using the encoding its XML declaration
/// names, UTF-8 when there is none.
pub fn decode_document(body: &[u8]) -> String {
    let charset = match declared_encoding(body) {
        Some(label) => Charset::for_label(&label).unwrap_or_else(|e| {
            log::warn!("{e}, reading the message as UTF-8");
            Charset::UTF_8
        }),
        None => Charset::UTF_8,
    };
    charset.decode(body)
}

/// Wrap an XML document the way an engine sends it.
pub fn engine_frame(xml: &str) -> Vec<u8> {
    let mut bytes = xml.len().to_string().into_bytes();
    bytes.push(NUL);
    bytes.extend_from_slice(xml.as_bytes());
    bytes.push(NUL);
    bytes
}

use rustc_hash::FxHashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;

/// Size of the single read performed per connection. Anything the client
/// sends beyond this is never seen.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Header names are kept exactly as written, values with the `\r` removed.
pub type Headers = FxHashMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Percent and plus decoded request-line path.
    pub path: String,
    pub headers: Headers,
    pub body: String,
}

impl Request {
    /// Parses one buffered read. Malformed input yields empty or partial
    /// fields, never an error.
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        Self::parse_text(&text)
    }

    pub fn parse_text(text: &str) -> Self {
        Self {
            method: extract_method(text),
            path: decode_path(&extract_path(text)),
            headers: parse_headers(text),
            body: extract_body(text),
        }
    }
}

/// Performs exactly one read of at most [`READ_BUFFER_SIZE`] bytes.
/// End-of-stream gives an empty buffer; other read failures are errors.
pub async fn read_request<R>(conn: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let length = conn.read(&mut buffer).await?;
    buffer.truncate(length);
    Ok(buffer)
}

pub fn extract_method(text: &str) -> String {
    text.split_ascii_whitespace().next().unwrap_or_default().to_string()
}

/// Second whitespace-delimited token, not decoded.
pub fn extract_path(text: &str) -> String {
    text.split_ascii_whitespace().nth(1).unwrap_or_default().to_string()
}

/// Decodes `%XX` escapes and `+`. A `%` followed by fewer than two
/// characters is kept as is.
pub fn decode_path(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                decoded.push(hex_pair_value(bytes[i + 1], bytes[i + 2]));
                i += 3;
            }
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

// Reads the pair the way strtol reads a two-character buffer: optional
// leading whitespace or sign, then leading hex digits. "4z" is 4, "zz" is 0,
// "+5" is 5 and "-1" wraps to 0xff.
fn hex_pair_value(first: u8, second: u8) -> u8 {
    let digit = |b: u8| (b as char).to_digit(16).map(|d| d as u8);

    match first {
        b'+' => digit(second).unwrap_or(0),
        b'-' => digit(second).unwrap_or(0).wrapping_neg(),
        b if b.is_ascii_whitespace() || b == 0x0b => digit(second).unwrap_or(0),
        b => match (digit(b), digit(second)) {
            (Some(h), Some(l)) => h * 16 + l,
            (Some(h), None) => h,
            _ => 0,
        },
    }
}

/// Collects `Name: value` lines until a line that is exactly `"\r"`.
/// Lines without `": "`, including the request line, are skipped.
pub fn parse_headers(text: &str) -> Headers {
    let mut headers = Headers::default();

    for line in text.split('\n') {
        if line == "\r" {
            break;
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some((name, value)) = line.split_once(": ") {
            headers.insert(name.to_string(), value.to_string());
        }
    }

    headers
}

/// Everything after the first blank line, or an empty string.
pub fn extract_body(text: &str) -> String {
    text.split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default()
}

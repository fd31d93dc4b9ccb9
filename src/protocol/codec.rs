//! Protocol codec
//!
//! Text encoding of requests and parsing of replies.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! <VERB> tag=<tag>&<key>=<value>&...[&<session key>]
//! ```
//! The tag is always the first pair. A session-bound request ends with the
//! bare session key.
//!
//! ### Reply
//! ```text
//! [<tag>] <code> [field field ...]
//! ```
//!
//! ### Escaping
//! - `&` is sent as `&amp;`
//! - CR, LF and CRLF are sent as `<br />`
//! - a backtick in received text stands for an apostrophe
//!
//! The scheme is lossy: a literal `<br />` in sent text is indistinguishable
//! from an escaped line break and comes back as `\n`, and every line ending
//! comes back as `\n`.

use bytes::Bytes;

use crate::error::{AnidbError, Result};

use super::request::Request;
use super::response::ApiResponse;
use super::return_code::ReturnCode;
use super::tag::CorrelationTag;

/// Escaped form of a literal ampersand
pub const AMPERSAND_ESCAPE: &str = "&amp;";

/// Escaped form of a line break
pub const LINE_BREAK_ESCAPE: &str = "<br />";

// =============================================================================
// Content Escaping
// =============================================================================

/// Escape text before it goes on the wire
pub fn encode_content(content: &str) -> String {
    content
        .replace('&', AMPERSAND_ESCAPE)
        .replace("\r\n", LINE_BREAK_ESCAPE)
        .replace('\r', LINE_BREAK_ESCAPE)
        .replace('\n', LINE_BREAK_ESCAPE)
}

/// Reverse [`encode_content`] on received text
///
/// Line breaks come back as `\n` and backticks as apostrophes.
pub fn decode_content(content: &str) -> String {
    content
        .replace(LINE_BREAK_ESCAPE, "\n")
        .replace(AMPERSAND_ESCAPE, "&")
        .replace('`', "'")
}

/// Decode raw datagram bytes (ASCII) and unescape them
pub fn decode_bytes(data: &[u8]) -> String {
    decode_content(&String::from_utf8_lossy(data))
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Serialize a request
///
/// `session_key` is only consulted for session-bound requests; those fail
/// with `SessionRequired` when it is missing.
pub fn encode_request(request: &Request, session_key: Option<&str>) -> Result<Bytes> {
    let mut line = String::with_capacity(64);
    line.push_str(request.command_base());
    line.push_str(" tag=");
    line.push_str(request.tag().as_str());

    for (name, value) in request.parameters() {
        line.push('&');
        line.push_str(&encode_content(name));
        line.push('=');
        line.push_str(&encode_content(value));
    }

    if request.requires_session() {
        let key = session_key
            .ok_or_else(|| AnidbError::SessionRequired(request.command_base().to_string()))?;
        line.push('&');
        line.push_str(key);
    }

    Ok(Bytes::from(line))
}

// =============================================================================
// Reply Parsing
// =============================================================================

/// Parse one datagram into an [`ApiResponse`]
///
/// Fails if the token after the optional tag is not a known return code.
pub fn parse_response(data: &[u8]) -> Result<ApiResponse> {
    let raw = decode_bytes(data);
    let text = raw.trim_end_matches(['\r', '\n']);

    let mut tokens = text.split(' ').peekable();

    let tag = tokens.peek().and_then(|first| CorrelationTag::parse(first));
    if tag.is_some() {
        tokens.next();
    }

    let code_token = tokens
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AnidbError::MalformedResponse(format!("missing return code: {:?}", raw)))?;

    let raw_code: u16 = code_token.parse().map_err(|_| {
        AnidbError::MalformedResponse(format!(
            "couldn't parse '{}' as a return code",
            code_token
        ))
    })?;

    let return_code = ReturnCode::from_code(raw_code)
        .ok_or_else(|| AnidbError::MalformedResponse(format!("unknown return code {}", raw_code)))?;

    let fields = tokens.map(str::to_string).collect();

    Ok(ApiResponse {
        tag,
        return_code,
        raw_code,
        fields,
        raw,
    })
}

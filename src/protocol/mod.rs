//! Protocol Module
//!
//! Defines the text protocol spoken with the API server.
//!
//! ## Request Format
//! ```text
//! PING tag=_a1B2&nat=1
//! LOGOUT tag=_x9Zq&<session key>
//! ```
//!
//! ## Reply Format
//! ```text
//! _a1B2 300 PONG
//! _x9Zq 203 LOGGED OUT
//! ```
//!
//! ## Return Code Bands
//! - 2xx/3xx: success and empty results
//! - 4xx/5xx: client errors
//! - 600-699: server errors (601/602 are availability codes)

pub mod commands;
mod codec;
mod request;
mod response;
mod return_code;
mod tag;

pub use codec::{
    decode_bytes, decode_content, encode_content, encode_request, parse_response,
    AMPERSAND_ESCAPE, LINE_BREAK_ESCAPE,
};
pub use request::{DataType, ParamSchema, Request, RequestBuilder};
pub use response::{ApiResponse, CommandResult, ResultKind};
pub use return_code::{is_reportable_server_error, ReturnCode, SERVER_ERROR_BAND};
pub use tag::{CorrelationTag, TagRegistry, TAG_BODY_LEN, TAG_SENTINEL};

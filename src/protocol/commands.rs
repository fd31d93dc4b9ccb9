//! Concrete requests
//!
//! The handful of requests the engine itself needs to reason about:
//! - AUTH:    start a session
//! - ENCRYPT: switch on encryption (must precede AUTH)
//! - LOGOUT:  end the session
//! - PING:    liveness / NAT keep-alive

use crate::config::Config;

use super::request::{DataType, ParamSchema, RequestBuilder};
use super::response::ResultKind;

pub const AUTH: &str = "AUTH";
pub const ENCRYPT: &str = "ENCRYPT";
pub const LOGOUT: &str = "LOGOUT";
pub const PING: &str = "PING";

/// Encryption type 1 = AES-128, the only one the server implements
pub const ENCRYPTION_TYPE_AES: &str = "1";

const AUTH_OPTIONAL_PARAMS: ParamSchema = &[
    ("nat", DataType::Boolean),
    ("comp", DataType::Boolean),
    ("enc", DataType::String),
    ("mtu", DataType::Int4),
    ("imgserver", DataType::Boolean),
];

const PING_OPTIONAL_PARAMS: ParamSchema = &[("nat", DataType::Boolean)];

/// AUTH with the client identity from `config`
pub fn auth(config: &Config, username: &str, password: &str) -> RequestBuilder {
    RequestBuilder::new(AUTH, ResultKind::Auth)
        .optional_params(AUTH_OPTIONAL_PARAMS)
        .param("user", username)
        .param("pass", password)
        .param("protover", config.protocol_version.as_str())
        .param("client", config.client_name.as_str())
        .param("clientver", config.client_version.as_str())
}

/// ENCRYPT for `username`
pub fn encrypt(username: &str) -> RequestBuilder {
    RequestBuilder::new(ENCRYPT, ResultKind::Encrypt)
        .param("user", username)
        .param("type", ENCRYPTION_TYPE_AES)
}

/// LOGOUT of the current session
pub fn logout() -> RequestBuilder {
    RequestBuilder::new(LOGOUT, ResultKind::Logout).requires_session(true)
}

/// PING; set `nat` to 1 to have the server report our public port
pub fn ping() -> RequestBuilder {
    RequestBuilder::new(PING, ResultKind::Generic).optional_params(PING_OPTIONAL_PARAMS)
}

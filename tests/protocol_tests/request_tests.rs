//! Request Tests
//!
//! Tests for request building, optional-parameter validation, the concrete
//! commands and result construction.

use anidb_udp::protocol::{
    commands, CommandResult, CorrelationTag, DataType, RequestBuilder, ResultKind, ReturnCode,
};
use anidb_udp::{AnidbError, Config};

// =============================================================================
// Helper Functions
// =============================================================================

fn tag() -> CorrelationTag {
    CorrelationTag::parse("_test").unwrap()
}

fn keys(builder: RequestBuilder) -> Vec<String> {
    builder
        .into_request(tag())
        .parameters()
        .iter()
        .map(|(k, _)| k.clone())
        .collect()
}

// =============================================================================
// Data Type Tests
// =============================================================================

#[test]
fn test_boolean_accepts_only_zero_and_one() {
    assert!(DataType::Boolean.accepts("0"));
    assert!(DataType::Boolean.accepts("1"));
    assert!(!DataType::Boolean.accepts("true"));
    assert!(!DataType::Boolean.accepts("2"));
    assert!(!DataType::Boolean.accepts(""));
}

#[test]
fn test_integer_widths() {
    assert!(DataType::Int2.accepts("32767"));
    assert!(DataType::Int2.accepts("-32768"));
    assert!(!DataType::Int2.accepts("32768"));
    assert!(!DataType::Int2.accepts("abc"));

    assert!(DataType::Int4.accepts("1400"));
    assert!(DataType::Int4.accepts("2147483647"));
    assert!(!DataType::Int4.accepts("2147483648"));
    assert!(!DataType::Int4.accepts("1.5"));
}

#[test]
fn test_string_types_accept_anything() {
    assert!(DataType::String.accepts(""));
    assert!(DataType::String.accepts("utf8 & more"));
    assert!(DataType::HexString.accepts("ff00"));
}

// =============================================================================
// Optional Parameter Tests
// =============================================================================

#[test]
fn test_set_declared_optional() {
    let mut ping = commands::ping();
    ping.set_optional("nat", "1").unwrap();

    let request = ping.into_request(tag());
    assert_eq!(request.parameters(), &[("nat".to_string(), "1".to_string())]);
}

#[test]
fn test_unknown_optional_rejected() {
    let mut ping = commands::ping();
    match ping.set_optional("comp", "1") {
        Err(AnidbError::UnknownParameter(name)) => assert_eq!(name, "comp"),
        other => panic!("Expected UnknownParameter, got {:?}", other),
    }
    assert!(keys(ping).is_empty());
}

#[test]
fn test_invalid_optional_value_rejected() {
    let config = Config::default();
    let mut auth = commands::auth(&config, "alice", "secret");

    match auth.set_optional("mtu", "big") {
        Err(AnidbError::InvalidParameter {
            name,
            expected,
            value,
        }) => {
            assert_eq!(name, "mtu");
            assert_eq!(expected, DataType::Int4.expected());
            assert_eq!(value, "big");
        }
        other => panic!("Expected InvalidParameter, got {:?}", other),
    }

    assert!(matches!(
        auth.set_optional("nat", "yes"),
        Err(AnidbError::InvalidParameter { .. })
    ));
}

#[test]
fn test_overwrite_keeps_position() {
    let builder = RequestBuilder::new("ANIME", ResultKind::Generic)
        .param("aid", "1")
        .param("amask", "ff")
        .param("aid", "2");

    let request = builder.into_request(tag());
    assert_eq!(
        request.parameters(),
        &[
            ("aid".to_string(), "2".to_string()),
            ("amask".to_string(), "ff".to_string()),
        ]
    );
}

#[test]
fn test_optional_overwrite_keeps_position() {
    let config = Config::default();
    let auth = commands::auth(&config, "alice", "secret")
        .with_optional("nat", "1")
        .unwrap()
        .with_optional("mtu", "1400")
        .unwrap()
        .with_optional("nat", "0")
        .unwrap();

    let request = auth.into_request(tag());
    let params = request.parameters();
    assert_eq!(params[5], ("nat".to_string(), "0".to_string()));
    assert_eq!(params[6], ("mtu".to_string(), "1400".to_string()));
    assert_eq!(params.len(), 7);
}

// =============================================================================
// Concrete Command Tests
// =============================================================================

#[test]
fn test_auth_shape() {
    let config = Config::default();
    let auth = commands::auth(&config, "alice", "secret");

    assert_eq!(auth.command_base(), commands::AUTH);
    assert_eq!(auth.result_kind(), ResultKind::Auth);

    let request = auth.into_request(tag());
    assert!(!request.requires_session());
    assert_eq!(
        request.parameters(),
        &[
            ("user".to_string(), "alice".to_string()),
            ("pass".to_string(), "secret".to_string()),
            ("protover".to_string(), "3".to_string()),
            ("client".to_string(), "anidbudp".to_string()),
            ("clientver".to_string(), "1".to_string()),
        ]
    );
}

#[test]
fn test_encrypt_shape() {
    let request = commands::encrypt("alice").into_request(tag());

    assert_eq!(request.command_base(), commands::ENCRYPT);
    assert_eq!(request.result_kind(), ResultKind::Encrypt);
    assert_eq!(
        request.parameters(),
        &[
            ("user".to_string(), "alice".to_string()),
            ("type".to_string(), commands::ENCRYPTION_TYPE_AES.to_string()),
        ]
    );
}

#[test]
fn test_logout_requires_session() {
    let request = commands::logout().into_request(tag());

    assert_eq!(request.command_base(), commands::LOGOUT);
    assert_eq!(request.result_kind(), ResultKind::Logout);
    assert!(request.requires_session());
    assert!(request.parameters().is_empty());
}

#[test]
fn test_ping_shape() {
    let request = commands::ping().into_request(tag());

    assert_eq!(request.command_base(), commands::PING);
    assert_eq!(request.result_kind(), ResultKind::Generic);
    assert!(!request.requires_session());
    assert_eq!(request.optional_params(), &[("nat", DataType::Boolean)]);
    assert_eq!(request.tag(), &tag());
}

// =============================================================================
// Result Construction Tests
// =============================================================================

#[test]
fn test_build_auth_accepted() {
    let result = CommandResult::build(ResultKind::Auth, ReturnCode::LoginAccepted, Some("abcd1234"));
    assert_eq!(
        result,
        CommandResult::Auth {
            code: ReturnCode::LoginAccepted,
            session_key: Some("abcd1234".to_string()),
        }
    );
}

#[test]
fn test_build_auth_failed_has_no_key() {
    let result = CommandResult::build(ResultKind::Auth, ReturnCode::LoginFailed, Some("LOGIN"));
    assert_eq!(
        result,
        CommandResult::Auth {
            code: ReturnCode::LoginFailed,
            session_key: None,
        }
    );
}

#[test]
fn test_build_encrypt() {
    let enabled = CommandResult::build(ResultKind::Encrypt, ReturnCode::EncryptionEnabled, Some("salt"));
    assert_eq!(
        enabled,
        CommandResult::Encrypt {
            code: ReturnCode::EncryptionEnabled,
            salt: Some("salt".to_string()),
        }
    );

    let refused = CommandResult::build(ResultKind::Encrypt, ReturnCode::NoSuchUser, Some("NO"));
    assert_eq!(refused.kind(), ResultKind::Encrypt);
    assert_eq!(
        refused,
        CommandResult::Encrypt {
            code: ReturnCode::NoSuchUser,
            salt: None,
        }
    );
}

#[test]
fn test_build_logout() {
    let result = CommandResult::build(ResultKind::Logout, ReturnCode::LoggedOut, Some("LOGGED"));
    assert_eq!(result, CommandResult::Logout { code: ReturnCode::LoggedOut });
}

#[test]
fn test_availability_codes_force_generic() {
    for code in [
        ReturnCode::ServerBusy,
        ReturnCode::OutOfService,
        ReturnCode::Timeout,
        ReturnCode::InternalServerError,
        ReturnCode::NoData,
        ReturnCode::ApiViolation,
    ] {
        for kind in [ResultKind::Auth, ResultKind::Encrypt, ResultKind::Logout] {
            let result = CommandResult::build(kind, code, None);
            assert_eq!(result.kind(), ResultKind::Generic, "{} for {:?}", code, kind);
            assert_eq!(result.return_code(), code);
        }
    }
}

#[test]
fn test_server_error_band_is_generic() {
    let no_data = CommandResult::build(ResultKind::Auth, ReturnCode::NoData, Some("ERR"));
    assert_eq!(
        no_data,
        CommandResult::Generic {
            code: ReturnCode::NoData,
            data: Some("ERR".to_string()),
        }
    );

    let violation = CommandResult::build(ResultKind::Logout, ReturnCode::ApiViolation, None);
    assert_eq!(violation, CommandResult::generic(ReturnCode::ApiViolation));
}

#[test]
fn test_client_error_codes_keep_declared_kind() {
    for code in [ReturnCode::UnknownCommand, ReturnCode::Banned, ReturnCode::NotLoggedIn] {
        let result = CommandResult::build(ResultKind::Logout, code, None);
        assert_eq!(result, CommandResult::Logout { code });
    }
}

#[test]
fn test_local_codes_keep_declared_kind() {
    let closed = CommandResult::build(ResultKind::Auth, ReturnCode::ConnectionClosed, None);
    assert_eq!(
        closed,
        CommandResult::Auth {
            code: ReturnCode::ConnectionClosed,
            session_key: None,
        }
    );

    let declined = CommandResult::build(ResultKind::Logout, ReturnCode::RequestDeclined, None);
    assert_eq!(declined.kind(), ResultKind::Logout);
}

#[test]
fn test_generic_result() {
    let result = CommandResult::generic(ReturnCode::RequestTimedOut);
    assert_eq!(
        result,
        CommandResult::Generic {
            code: ReturnCode::RequestTimedOut,
            data: None,
        }
    );
}

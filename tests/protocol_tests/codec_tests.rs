//! Codec Tests
//!
//! Tests for content escaping, request serialization and reply parsing.

use anidb_udp::protocol::{
    commands, decode_bytes, decode_content, encode_content, encode_request, is_reportable_server_error,
    parse_response, CorrelationTag, RequestBuilder, ResultKind, ReturnCode,
};
use anidb_udp::AnidbError;

// =============================================================================
// Helper Functions
// =============================================================================

fn tag(text: &str) -> CorrelationTag {
    CorrelationTag::parse(text).unwrap()
}

/// What a string should look like after a trip through the wire
///
/// Line endings collapse to `\n`, and a literal `<br />` cannot be told
/// apart from an escaped line break.
fn normalized(s: &str) -> String {
    s.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("<br />", "\n")
        .replace('`', "'")
}

// =============================================================================
// Escaping Tests
// =============================================================================

#[test]
fn test_encode_ampersand() {
    assert_eq!(encode_content("a&b"), "a&amp;b");
}

#[test]
fn test_encode_line_endings() {
    assert_eq!(encode_content("a\r\nb"), "a<br />b");
    assert_eq!(encode_content("a\rb"), "a<br />b");
    assert_eq!(encode_content("a\nb"), "a<br />b");
    assert_eq!(encode_content("a\r\n\nb"), "a<br /><br />b");
}

#[test]
fn test_decode_line_break_and_backtick() {
    assert_eq!(decode_content("it`s<br />fine"), "it's\nfine");
}

#[test]
fn test_decode_ampersand() {
    assert_eq!(decode_content("Tom &amp; Jerry"), "Tom & Jerry");
}

#[test]
fn test_escape_round_trip() {
    let samples = [
        "",
        "plain",
        "a&b",
        "&&&",
        "&amp;",
        "&amp;amp;",
        "line1\nline2",
        "line1\r\nline2",
        "line1\rline2",
        "\r\n\r\n\n\r",
        "it`s",
        "``&\r\n`",
        "mixed & `quoted`\r\nnext & \rlast\n",
        "a<br />b",
        "<br />&amp;<br />",
    ];

    for sample in samples {
        let decoded = decode_content(&encode_content(sample));
        assert_eq!(decoded, normalized(sample), "round trip of {:?}", sample);
    }
}

#[test]
fn test_literal_line_break_escape_comes_back_as_newline() {
    assert_eq!(encode_content("a<br />b"), "a<br />b");
    assert_eq!(decode_content(&encode_content("a<br />b")), "a\nb");
}

#[test]
fn test_escape_round_trip_is_idempotent_on_normalized_form() {
    let sample = "a & b\r\nc`d";
    let once = decode_content(&encode_content(sample));
    let twice = decode_content(&encode_content(&once));
    assert_eq!(once, twice);
}

#[test]
fn test_decode_bytes_ascii() {
    assert_eq!(decode_bytes(b"_abcd 300 PONG"), "_abcd 300 PONG");
}

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[test]
fn test_encode_ping_with_nat() {
    let request = commands::ping()
        .with_optional("nat", "1")
        .unwrap()
        .into_request(tag("_a1B2"));

    let bytes = encode_request(&request, None).unwrap();
    assert_eq!(&bytes[..], b"PING tag=_a1B2&nat=1");
}

#[test]
fn test_encode_tag_is_first_key() {
    let request = RequestBuilder::new("ANIME", ResultKind::Generic)
        .param("aid", "1")
        .param("amask", "b2")
        .into_request(tag("_zzzz"));

    let bytes = encode_request(&request, None).unwrap();
    assert_eq!(&bytes[..], b"ANIME tag=_zzzz&aid=1&amask=b2");
}

#[test]
fn test_encode_bare_request() {
    let request = commands::ping().into_request(tag("_0000"));
    let bytes = encode_request(&request, None).unwrap();
    assert_eq!(&bytes[..], b"PING tag=_0000");
}

#[test]
fn test_encode_appends_session_key() {
    let request = commands::logout().into_request(tag("_x9Zq"));
    let bytes = encode_request(&request, Some("abcd1234")).unwrap();
    assert_eq!(&bytes[..], b"LOGOUT tag=_x9Zq&abcd1234");
}

#[test]
fn test_encode_ignores_session_key_when_not_required() {
    let request = commands::ping().into_request(tag("_x9Zq"));
    let bytes = encode_request(&request, Some("abcd1234")).unwrap();
    assert_eq!(&bytes[..], b"PING tag=_x9Zq");
}

#[test]
fn test_encode_session_required_without_key() {
    let request = commands::logout().into_request(tag("_x9Zq"));
    match encode_request(&request, None) {
        Err(AnidbError::SessionRequired(command)) => assert_eq!(command, "LOGOUT"),
        other => panic!("Expected SessionRequired, got {:?}", other),
    }
}

#[test]
fn test_encode_escapes_values() {
    let request = RequestBuilder::new("MYLISTADD", ResultKind::Generic)
        .param("other", "Tom & Jerry\nsecond line")
        .into_request(tag("_abcd"));

    let bytes = encode_request(&request, None).unwrap();
    assert_eq!(
        &bytes[..],
        b"MYLISTADD tag=_abcd&other=Tom &amp; Jerry<br />second line"
    );
}

#[test]
fn test_encode_auth_parameter_order() {
    let config = anidb_udp::Config::builder().client("testclient", "7").build();
    let request = commands::auth(&config, "alice", "secret").into_request(tag("_auth"));

    let bytes = encode_request(&request, None).unwrap();
    assert_eq!(
        &bytes[..],
        &b"AUTH tag=_auth&user=alice&pass=secret&protover=3&client=testclient&clientver=7"[..]
    );
}

// =============================================================================
// Reply Parsing Tests
// =============================================================================

#[test]
fn test_parse_tagged_reply() {
    let response = parse_response(b"_a1B2 300 PONG").unwrap();

    assert_eq!(response.tag, Some(tag("_a1B2")));
    assert_eq!(response.return_code, ReturnCode::Pong);
    assert_eq!(response.raw_code, 300);
    assert_eq!(response.fields, vec!["PONG".to_string()]);
}

#[test]
fn test_parse_untagged_reply() {
    let response = parse_response(b"598 UNKNOWN COMMAND").unwrap();

    assert_eq!(response.tag, None);
    assert_eq!(response.return_code, ReturnCode::UnknownCommand);
    assert_eq!(response.fields, vec!["UNKNOWN", "COMMAND"]);
}

#[test]
fn test_parse_login_fields_in_order() {
    let response = parse_response(b"_t0t0 200 abcd1234 LOGIN ACCEPTED\n").unwrap();

    assert_eq!(response.return_code, ReturnCode::LoginAccepted);
    assert_eq!(response.first_field(), Some("abcd1234"));
    assert_eq!(response.fields, vec!["abcd1234", "LOGIN", "ACCEPTED"]);
}

#[test]
fn test_parse_no_fields() {
    let response = parse_response(b"_t0t0 300").unwrap();
    assert!(response.fields.is_empty());
    assert_eq!(response.first_field(), None);
}

#[test]
fn test_parse_strips_trailing_line_ending() {
    let response = parse_response(b"_t0t0 203 LOGGED OUT\r\n").unwrap();
    assert_eq!(response.fields, vec!["LOGGED", "OUT"]);
}

#[test]
fn test_parse_unescapes_fields() {
    let response = parse_response(b"_t0t0 230 Tom &amp; Jerry`s").unwrap();
    assert_eq!(response.fields, vec!["Tom", "&", "Jerry's"]);
}

#[test]
fn test_parse_non_numeric_code() {
    match parse_response(b"_t0t0 PONG") {
        Err(AnidbError::MalformedResponse(_)) => {}
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[test]
fn test_parse_unknown_code() {
    match parse_response(b"_t0t0 299 WHAT") {
        Err(AnidbError::MalformedResponse(msg)) => assert!(msg.contains("299")),
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[test]
fn test_parse_empty_datagram() {
    assert!(matches!(
        parse_response(b""),
        Err(AnidbError::MalformedResponse(_))
    ));
    assert!(matches!(
        parse_response(b"_t0t0"),
        Err(AnidbError::MalformedResponse(_))
    ));
}

#[test]
fn test_parse_tag_shaped_but_wrong_length_is_not_a_tag() {
    // "_abc" is not a tag, so it is read as the return code and fails
    assert!(parse_response(b"_abc 300").is_err());
}

#[test]
fn test_parse_server_error_band() {
    let response = parse_response(b"600 INTERNAL SERVER ERROR").unwrap();
    assert_eq!(response.return_code, ReturnCode::InternalServerError);
    assert!(response.is_server_error());

    let unnamed = parse_response(b"_t0t0 650 SOMETHING").unwrap();
    assert_eq!(unnamed.return_code, ReturnCode::InternalServerError);
    assert_eq!(unnamed.raw_code, 650);
    assert!(unnamed.is_server_error());
}

#[test]
fn test_parse_availability_codes_are_not_server_errors() {
    let busy = parse_response(b"_t0t0 602 SERVER BUSY").unwrap();
    assert_eq!(busy.return_code, ReturnCode::ServerBusy);
    assert!(!busy.is_server_error());

    let out = parse_response(b"_t0t0 601 ANIDB OUT OF SERVICE - TRY AGAIN LATER").unwrap();
    assert_eq!(out.return_code, ReturnCode::OutOfService);
    assert!(!out.is_server_error());
}

// =============================================================================
// Return Code Tests
// =============================================================================

#[test]
fn test_local_codes_are_never_parsed() {
    for code in [901, 902, 903] {
        assert_eq!(ReturnCode::from_code(code), None);
    }
    assert!(ReturnCode::RequestTimedOut.is_local());
    assert!(ReturnCode::ConnectionClosed.is_local());
    assert!(ReturnCode::RequestDeclined.is_local());
    assert!(!ReturnCode::Pong.is_local());
}

#[test]
fn test_reportable_server_error_band() {
    assert!(is_reportable_server_error(600));
    assert!(is_reportable_server_error(604));
    assert!(is_reportable_server_error(699));
    assert!(!is_reportable_server_error(601));
    assert!(!is_reportable_server_error(602));
    assert!(!is_reportable_server_error(598));
    assert!(!is_reportable_server_error(700));
}

#[test]
fn test_server_error_band_forces_generic() {
    for code in [600, 603, 604, 650, 666] {
        assert!(ReturnCode::from_code(code).unwrap().forces_generic(), "{}", code);
    }
    assert!(ReturnCode::ServerBusy.forces_generic());
    assert!(ReturnCode::OutOfService.forces_generic());
    assert!(!ReturnCode::UnknownCommand.forces_generic());
    assert!(!ReturnCode::RequestDeclined.forces_generic());
}

#[test]
fn test_code_round_trip_for_named_codes() {
    for code in [200, 201, 203, 209, 300, 403, 500, 501, 506, 598, 600, 601, 602, 604, 666] {
        let rc = ReturnCode::from_code(code).unwrap();
        assert_eq!(rc.code(), code);
    }
}

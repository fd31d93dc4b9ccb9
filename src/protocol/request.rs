//! Request definitions
//!
//! A [`RequestBuilder`] describes what to send; the client turns it into an
//! immutable [`Request`] by attaching a freshly reserved tag at submission.

use crate::error::{AnidbError, Result};

use super::response::ResultKind;
use super::tag::CorrelationTag;

/// Value types an optional parameter can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Only "0" or "1"
    Boolean,
    /// Any text
    String,
    /// Signed 16-bit integer
    Int2,
    /// Signed 32-bit integer
    Int4,
    /// Hex text, passed through as-is
    HexString,
}

impl DataType {
    /// Human-readable name used in validation errors
    pub fn expected(self) -> &'static str {
        match self {
            DataType::Boolean => "a boolean (0 or 1)",
            DataType::String => "a string",
            DataType::Int2 => "a 2-byte integer",
            DataType::Int4 => "a 4-byte integer",
            DataType::HexString => "a hex string",
        }
    }

    /// Whether `value` is acceptable for this type
    pub fn accepts(self, value: &str) -> bool {
        match self {
            DataType::Boolean => value == "0" || value == "1",
            DataType::Int2 => value.parse::<i16>().is_ok(),
            DataType::Int4 => value.parse::<i32>().is_ok(),
            DataType::String | DataType::HexString => true,
        }
    }
}

/// Declared optional-parameter schema: name → type
pub type ParamSchema = &'static [(&'static str, DataType)];

/// Mutable description of a request, before it owns a tag
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    command_base: String,
    requires_session: bool,
    result_kind: ResultKind,
    optional_params: ParamSchema,
    parameters: Vec<(String, String)>,
}

impl RequestBuilder {
    /// Start a request for `command_base` whose reply builds `result_kind`
    pub fn new(command_base: impl Into<String>, result_kind: ResultKind) -> Self {
        Self {
            command_base: command_base.into(),
            requires_session: false,
            result_kind,
            optional_params: &[],
            parameters: Vec::new(),
        }
    }

    /// Mark the request as needing the session key
    pub fn requires_session(mut self, required: bool) -> Self {
        self.requires_session = required;
        self
    }

    /// Declare which optional parameters callers may set
    pub fn optional_params(mut self, schema: ParamSchema) -> Self {
        self.optional_params = schema;
        self
    }

    /// Set a fixed parameter (not checked against the schema)
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(name.into(), value.into());
        self
    }

    /// Set a declared optional parameter, validating its value
    pub fn set_optional(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let data_type = self
            .optional_params
            .iter()
            .find(|(declared, _)| *declared == name)
            .map(|(_, data_type)| *data_type)
            .ok_or_else(|| AnidbError::UnknownParameter(name.to_string()))?;

        if !data_type.accepts(&value) {
            return Err(AnidbError::InvalidParameter {
                name: name.to_string(),
                expected: data_type.expected(),
                value,
            });
        }

        self.put(name.to_string(), value);
        Ok(())
    }

    /// Chaining form of [`set_optional`](Self::set_optional)
    pub fn with_optional(mut self, name: &str, value: impl Into<String>) -> Result<Self> {
        self.set_optional(name, value)?;
        Ok(self)
    }

    pub fn command_base(&self) -> &str {
        &self.command_base
    }

    pub fn result_kind(&self) -> ResultKind {
        self.result_kind
    }

    /// Freeze the builder under `tag`
    pub fn into_request(self, tag: CorrelationTag) -> Request {
        Request {
            command_base: self.command_base,
            requires_session: self.requires_session,
            result_kind: self.result_kind,
            optional_params: self.optional_params,
            parameters: self.parameters,
            tag,
        }
    }

    // Overwrites keep the original insertion position
    fn put(&mut self, name: String, value: String) {
        match self.parameters.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.parameters.push((name, value)),
        }
    }
}

/// An immutable request bound to its correlation tag
///
/// Not `Clone`: a request is moved into the outbound queue exactly once.
#[derive(Debug)]
pub struct Request {
    command_base: String,
    requires_session: bool,
    result_kind: ResultKind,
    optional_params: ParamSchema,
    parameters: Vec<(String, String)>,
    tag: CorrelationTag,
}

impl Request {
    pub fn command_base(&self) -> &str {
        &self.command_base
    }

    pub fn requires_session(&self) -> bool {
        self.requires_session
    }

    pub fn result_kind(&self) -> ResultKind {
        self.result_kind
    }

    pub fn optional_params(&self) -> ParamSchema {
        self.optional_params
    }

    /// Parameters in send order
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn tag(&self) -> &CorrelationTag {
        &self.tag
    }
}

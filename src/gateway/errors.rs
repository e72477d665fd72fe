//! Error taxonomy and the per-invocation error envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every failure the gateway can report to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing or malformed source identifier. Terminal.
    SourceId,
    /// Configuration store unreachable.
    Database,
    /// A flow could not be turned into a request.
    TransformSource,
    /// A body template did not render the declared format.
    MappingFormat,
    /// A rendered header is not a legal HTTP header.
    HeaderFormat,
    TargetNotFound,
    /// Response mapping missing or unresolved.
    ResponseId,
    InvalidResponse,
    /// Response templating failed.
    TransformResponse,
    /// Anything unanticipated. Terminal.
    Mapper,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::SourceId => "SOURCE_ID",
            ErrorKind::Database => "DATABASE",
            ErrorKind::TransformSource => "TRANSFORM_SOURCE",
            ErrorKind::MappingFormat => "MAPPING_FORMAT",
            ErrorKind::HeaderFormat => "HEADER_FORMAT",
            ErrorKind::TargetNotFound => "TARGET_NOT_FOUND",
            ErrorKind::ResponseId => "RESPONSE_ID",
            ErrorKind::InvalidResponse => "INVALID_RESPONSE",
            ErrorKind::TransformResponse => "TRANSFORM_RESPONSE",
            ErrorKind::Mapper => "MAPPER",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::SourceId => "Invalid source id",
            ErrorKind::Database => "Error reading configuration store",
            ErrorKind::TransformSource => "Error transforming source",
            ErrorKind::MappingFormat => "Mapping did not render the declared content type",
            ErrorKind::HeaderFormat => "Invalid header",
            ErrorKind::TargetNotFound => "Error target not found",
            ErrorKind::ResponseId => "Error response mapping not found",
            ErrorKind::InvalidResponse => "Invalid response mapping",
            ErrorKind::TransformResponse => "Error transforming response",
            ErrorKind::Mapper => "Unexpected error handling request",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One reported failure, as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl ErrorResponse {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            code: kind,
            message: kind.message().to_string(),
            meta: Map::new(),
        }
    }

    #[must_use]
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.code
    }
}

/// Ordered, append-only list of the non-terminal failures of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorEnvelope {
    errors: Vec<ErrorResponse>,
}

impl ErrorEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ErrorResponse) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorResponse> {
        self.errors.iter()
    }

    /// `None` when nothing failed; callers branch on absence, not emptiness.
    pub fn into_option(self) -> Option<Vec<ErrorResponse>> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors)
        }
    }

    /// Borrowing form of [`Self::into_option`].
    pub fn as_option(&self) -> Option<&[ErrorResponse]> {
        if self.errors.is_empty() {
            None
        } else {
            Some(&self.errors)
        }
    }
}

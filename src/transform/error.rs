//! Transformation failures.

use thiserror::Error;

use crate::gateway::errors::ErrorKind;
use crate::template::RenderError;
use crate::transform::headers::HeaderError;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Error target not found")]
    TargetNotFound,

    #[error("invalid target method '{0}'")]
    InvalidMethod(String),

    #[error("error rendering target {field}: {source}")]
    TargetTemplate {
        field: &'static str,
        #[source]
        source: RenderError,
    },

    #[error("invalid target url '{0}'")]
    InvalidUrl(String),

    #[error("error parsing target headers: {0}")]
    TargetHeaders(#[source] HeaderError),

    #[error("invalid target header: {0}")]
    HeaderFormat(#[source] HeaderError),

    #[error("error rendering mapping: {0}")]
    MappingTemplate(#[source] RenderError),

    #[error("mapping is not valid JSON: {0}")]
    MappingFormat(#[source] serde_json::Error),

    #[error("Invalid response mapping")]
    InvalidResponse,

    #[error("error rendering response {field}: {source}")]
    ResponseTemplate {
        field: &'static str,
        #[source]
        source: RenderError,
    },

    #[error("invalid response status '{0}'")]
    InvalidStatus(String),

    #[error("error parsing response headers: {0}")]
    ResponseHeaders(#[source] HeaderError),

    #[error("response is not valid JSON ({source}): {text}")]
    ResponseFormat {
        text: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::TargetNotFound => ErrorKind::TargetNotFound,
            TransformError::InvalidMethod(_)
            | TransformError::TargetTemplate { .. }
            | TransformError::InvalidUrl(_)
            | TransformError::TargetHeaders(_) => ErrorKind::TransformSource,
            TransformError::HeaderFormat(_) => ErrorKind::HeaderFormat,
            TransformError::MappingTemplate(_) | TransformError::MappingFormat(_) => {
                ErrorKind::MappingFormat
            }
            TransformError::InvalidResponse => ErrorKind::InvalidResponse,
            TransformError::ResponseTemplate { .. }
            | TransformError::InvalidStatus(_)
            | TransformError::ResponseHeaders(_)
            | TransformError::ResponseFormat { .. } => ErrorKind::TransformResponse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(TransformError::TargetNotFound.kind(), ErrorKind::TargetNotFound);
        assert_eq!(TransformError::TargetNotFound.to_string(), "Error target not found");
        assert_eq!(
            TransformError::InvalidUrl("x".into()).kind(),
            ErrorKind::TransformSource
        );
        assert_eq!(
            TransformError::InvalidStatus("undefined".into()).kind(),
            ErrorKind::TransformResponse
        );
    }
}

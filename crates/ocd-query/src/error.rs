//! Error taxonomy for the query pipeline.

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Errors surfaced by the validate → compile → execute → project pipeline.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Unrecognized parameter key or unparsable bound value.
    #[error("invalid parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },

    /// Detail lookup found no record for the identifier.
    #[error("no {entity} record with id '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// The data store could not be reached or the query failed.
    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] StoreError),
}

impl QueryError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// The offending query parameter, if this error names one.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::InvalidParameter { key, .. } => Some(key),
            Self::NotFound { .. } | Self::DataUnavailable(_) => None,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    /// The offending query parameter, for 400 responses.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parameter: Option<String>,
}

impl From<&QueryError> for ErrorResponse {
    /// Store failures are reported without their cause.
    fn from(err: &QueryError) -> Self {
        let error = match err {
            QueryError::DataUnavailable(_) => "Internal server error".to_string(),
            QueryError::InvalidParameter { .. } | QueryError::NotFound { .. } => err.to_string(),
        };
        Self {
            error,
            parameter: err.parameter().map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message_names_the_key() {
        let err = QueryError::invalid("sponsorships__name__contains", "not a recognized filter");
        assert_eq!(err.parameter(), Some("sponsorships__name__contains"));
        assert!(err.to_string().contains("sponsorships__name__contains"));
    }

    #[test]
    fn response_bodies() {
        let not_found = QueryError::NotFound {
            entity: "bills",
            id: "ocd-bill/x".into(),
        };
        let body = ErrorResponse::from(&not_found);
        assert_eq!(body.error, "no bills record with id 'ocd-bill/x'");
        assert_eq!(body.parameter, None);

        let unavailable = QueryError::from(StoreError::Unavailable("connection refused".into()));
        let body = ErrorResponse::from(&unavailable);
        assert_eq!(body.error, "Internal server error");
        assert!(!body.error.contains("connection refused"));
    }

    #[test]
    fn parameter_is_omitted_when_absent() {
        let json = serde_json::to_string(&ErrorResponse {
            error: "gone".into(),
            parameter: None,
        })
        .expect("serialize");
        assert_eq!(json, r#"{"error":"gone"}"#);
    }
}

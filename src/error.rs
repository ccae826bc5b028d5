//! Error types for talking to the query service.

/// Errors from a single round-trip with the query service.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("query service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("response body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("request task ended without a result")]
    Interrupted,
}

impl QueryError {
    /// Build a status error, preferring the service's own `error` field over the raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .and_then(|e| e.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());

        QueryError::Status { status, message }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_uses_service_error_field() {
        let err = QueryError::from_status(400, r#"{"error": "Missing 'query' in request body"}"#);
        assert_eq!(
            err.to_string(),
            "query service returned 400: Missing 'query' in request body"
        );
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        let err = QueryError::from_status(502, "  Bad Gateway\n");
        assert!(matches!(err, QueryError::Status { status: 502, .. }));
        assert_eq!(err.to_string(), "query service returned 502: Bad Gateway");
    }

    #[test]
    fn test_invalid_body_display() {
        let parse = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = QueryError::from(parse);
        assert!(err.to_string().starts_with("response body is not valid JSON"));
    }
}

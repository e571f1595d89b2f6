use reqwest::StatusCode;
use thiserror::Error;

/// Longest slice of a response body kept inside an error.
const MAX_BODY_IN_ERROR: usize = 500;

/// Why a configs request failed.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 403: the server refused the supplied headers.
    #[error("Server refused access to the configs: {0}")]
    AccessDenied(String),

    /// 401: the request carried no usable credentials.
    #[error("Configs request was not authorized, check the custom headers")]
    Unauthorized,

    /// 404: nothing lives at the remote URL.
    #[error("No configs at the remote URL: {0}")]
    NotFound(String),

    /// 429
    #[error("Configs server is rate limiting requests")]
    RateLimited,

    /// Any 5xx status.
    #[error("Configs server failed: {0}")]
    ServerError(String),

    /// The request never got a response (DNS, TLS, connect, timeout).
    #[error("Could not reach the configs server: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// A custom header name or value is not valid HTTP.
    #[error("Bad custom header {0}")]
    InvalidHeader(String),

    /// A status the store has no specific meaning for.
    #[error("Unexpected configs response: {0}")]
    InvalidResponse(String),
}

/// First `MAX_BODY_IN_ERROR` characters of `body`, with a marker when cut.
fn excerpt(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_IN_ERROR) {
        None => body.to_string(),
        Some((cut, _)) => format!("{}... ({} bytes in full)", &body[..cut], body.len()),
    }
}

impl ApiError {
    /// Classify a non-success status. The body is kept, shortened, for the
    /// variants that can carry a server message.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
            StatusCode::FORBIDDEN => ApiError::AccessDenied(excerpt(body)),
            StatusCode::NOT_FOUND => ApiError::NotFound(excerpt(body)),
            s if s.is_server_error() => ApiError::ServerError(excerpt(body)),
            s => ApiError::InvalidResponse(format!("status {}: {}", s, excerpt(body))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(StatusCode::FORBIDDEN, "no"), ApiError::AccessDenied(b) if b == "no"));
        assert!(matches!(ApiError::from_status(StatusCode::NOT_FOUND, ""), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""), ApiError::RateLimited));
        assert!(matches!(ApiError::from_status(StatusCode::BAD_GATEWAY, ""), ApiError::ServerError(_)));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, "tea"),
            ApiError::InvalidResponse(m) if m.starts_with("status 418") && m.ends_with("tea")
        ));
    }

    #[test]
    fn test_excerpt_cuts_on_characters() {
        let long = "é".repeat(600);
        let cut = excerpt(&long);
        assert!(cut.starts_with(&"é".repeat(500)));
        assert!(cut.ends_with("... (1200 bytes in full)"));

        let exact = "a".repeat(500);
        assert_eq!(excerpt(&exact), exact);
        assert_eq!(excerpt("short"), "short");
    }
}

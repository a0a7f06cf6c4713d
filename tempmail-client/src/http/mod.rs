// tempmail-client/src/http/mod.rs
use async_trait::async_trait;

/// Error from HTTP request
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: Option<u16>,
    pub message: String,
}

impl HttpError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// True when the server rejected the request's credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(status) = self.status {
            write!(f, "HTTP error {}: {}", status, self.message)
        } else {
            write!(f, "HTTP error: {}", self.message)
        }
    }
}

impl std::error::Error for HttpError {}

/// Generic HTTP client trait - users can implement their own
///
/// Implementations return the response body for 2xx statuses and an
/// `HttpError` carrying the status code otherwise.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url`, optionally with a bearer token
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<Vec<u8>, HttpError>;

    /// POST JSON data to URL, return response bytes
    async fn post_json(
        &self,
        url: &str,
        body: Vec<u8>,
        bearer: Option<&str>,
    ) -> Result<Vec<u8>, HttpError>;
}

#[cfg(feature = "reqwest")]
pub mod reqwest;

#[cfg(feature = "reqwest")]
pub use reqwest::ReqwestClient;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_statuses() {
        let err = HttpError {
            status: Some(401),
            message: "nope".to_string(),
        };
        assert!(err.is_unauthorized());

        let err = HttpError {
            status: Some(403),
            message: "nope".to_string(),
        };
        assert!(err.is_unauthorized());

        let err = HttpError {
            status: Some(500),
            message: "boom".to_string(),
        };
        assert!(!err.is_unauthorized());
        assert!(!HttpError::transport("refused").is_unauthorized());
    }

    #[test]
    fn test_display_includes_status() {
        let err = HttpError {
            status: Some(404),
            message: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 404: missing");
        assert_eq!(
            HttpError::transport("timed out").to_string(),
            "HTTP error: timed out"
        );
    }
}

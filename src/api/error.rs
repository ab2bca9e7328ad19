use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("base url cannot be extended with a path: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Text suitable for an error popup. Prefers what the server said.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Extract the `message` field the API puts in error bodies.
///
/// Validation failures come back with an array of messages; those are
/// joined. Bodies that are not JSON are used verbatim.
pub(crate) fn server_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("message") {
            Some(serde_json::Value::String(message)) => message.clone(),
            Some(serde_json::Value::Array(messages)) => messages
                .iter()
                .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_message_field() {
        let msg = server_message(StatusCode::BAD_REQUEST, r#"{"message":"name must not be empty"}"#);
        assert_eq!(msg, "name must not be empty");
    }

    #[test]
    fn joins_message_arrays() {
        let msg = server_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":["name is required","goal is required"],"error":"Bad Request"}"#,
        );
        assert_eq!(msg, "name is required; goal is required");
    }

    #[test]
    fn falls_back_to_body_or_reason() {
        assert_eq!(server_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(server_message(StatusCode::NOT_FOUND, "  "), "Not Found");
    }
}

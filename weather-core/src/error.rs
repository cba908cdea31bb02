use std::fmt;

use thiserror::Error;

/// Why a lookup failed. All kinds are shown to the user the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No API key was configured.
    Config,
    /// The city name was empty.
    Validation,
    /// No response was received from the provider.
    Network,
    /// The provider answered with a non-success status.
    Api,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::Api => "api",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MISSING_API_KEY: &str =
    "API key is missing. Set OPENWEATHER_API_KEY or run `weather configure` first.";
pub const EMPTY_CITY: &str = "Please enter a city name.";
pub const NETWORK_FAILURE: &str = "Network error. Please check your internet connection.";

/// A failed lookup: its kind plus the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LookupError {
    pub kind: ErrorKind,
    pub message: String,
}

impl LookupError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_api_key() -> Self {
        Self::new(ErrorKind::Config, MISSING_API_KEY)
    }

    pub fn empty_city() -> Self {
        Self::new(ErrorKind::Validation, EMPTY_CITY)
    }

    pub fn network() -> Self {
        Self::new(ErrorKind::Network, NETWORK_FAILURE)
    }

    /// Build an API error from the response status and the (possibly absent) parsed body.
    ///
    /// The provider's own `message` field wins when it is a non-empty scalar.
    pub fn api(status: u16, body: Option<&serde_json::Value>) -> Self {
        let message = body
            .and_then(|b| b.get("message"))
            .and_then(provider_message)
            .unwrap_or_else(|| format!("Request failed: {status}"));

        Self::new(ErrorKind::Api, message)
    }
}

/// Text for a `message` value. Empty strings, zero, `false`, `null` and
/// structured values carry nothing worth showing.
fn provider_message(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_error_prefers_provider_message() {
        let body = json!({ "cod": "404", "message": "city not found" });
        let err = LookupError::api(404, Some(&body));

        assert_eq!(err.kind, ErrorKind::Api);
        assert_eq!(err.to_string(), "city not found");
    }

    #[test]
    fn api_error_falls_back_to_status() {
        let err = LookupError::api(500, None);
        assert_eq!(err.to_string(), "Request failed: 500");

        let empty = json!({ "message": "" });
        let err = LookupError::api(502, Some(&empty));
        assert_eq!(err.to_string(), "Request failed: 502");
    }

    #[test]
    fn api_error_shows_non_string_message() {
        let err = LookupError::api(401, Some(&json!({ "message": 401 })));
        assert_eq!(err.to_string(), "401");

        let err = LookupError::api(400, Some(&json!({ "message": true })));
        assert_eq!(err.to_string(), "true");
    }

    #[test]
    fn api_error_ignores_falsy_or_structured_message() {
        for message in [json!(0), json!(false), json!(null), json!({ "text": "x" })] {
            let err = LookupError::api(503, Some(&json!({ "message": message })));
            assert_eq!(err.to_string(), "Request failed: 503");
        }
    }

    #[test]
    fn display_is_just_the_message() {
        assert_eq!(LookupError::empty_city().to_string(), "Please enter a city name.");
        assert_eq!(
            LookupError::network().to_string(),
            "Network error. Please check your internet connection."
        );
    }
}

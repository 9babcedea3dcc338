//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

/// A slash-command invocation.
///
/// Slack posts these form-encoded with many more fields; only the ones
/// used here are kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandRequest {
    /// Station name typed after the command
    #[serde(default)]
    pub text: String,

    /// Where Slack accepts delayed replies (form mode only)
    #[serde(default)]
    pub response_url: Option<String>,
}

impl CommandRequest {
    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn from_form(body: &[u8]) -> Self {
        let mut request = Self {
            text: String::new(),
            response_url: None,
        };
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "text" => request.text = value.into_owned(),
                "response_url" => request.response_url = Some(value.into_owned()),
                _ => {}
            }
        }
        request
    }

    /// Parse a JSON body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

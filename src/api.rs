//! Client side of the dashboard's action API.
//!
//! Every call is a `POST` of `{"action": ..., ...payload}` to one endpoint.
//! Successful replies are wrapped in [`ApiResponse`]; failed ones are turned
//! into an [`ApiError`] whose message is fit to show the user as-is.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use ureq::Agent;

pub const TOKEN_EXPIRED_MESSAGE: &str = "Your auth token has expired, please reload the page";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";
const UNKNOWN_API_ERROR: &str = "Unknown API error";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.ok, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ApiError::new("API response contained no data")),
            (false, _) => Err(ApiError::new(
                self.error.unwrap_or_else(|| UNKNOWN_API_ERROR.to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
    pub validation: Option<Validation>,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            validation: None,
            details: None,
        }
    }

    fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Builds the envelope. Payload keys are spread after `action` and win on
/// collision; a payload that is not an object contributes nothing.
pub fn request_body(action: &str, payload: Option<&Value>) -> Value {
    let mut body = Map::new();
    body.insert("action".to_string(), json!(action));
    if let Some(Value::Object(fields)) = payload {
        body.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Value::Object(body)
}

/// Turns a non-2xx reply into a user-facing error.
///
/// Precedence: a plain-text `Unauthorized` 403, then validation issues
/// (one `field: message` per line), then `error.details`, then a string
/// `error`. A body that is not JSON yields the token-expired message for
/// 403 and the generic message otherwise.
pub fn decode_error_body(status: u16, content_type: Option<&str>, body: &str) -> ApiError {
    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    if status == 403 && !is_json && body.trim() == "Unauthorized" {
        return ApiError::new(TOKEN_EXPIRED_MESSAGE).with_status(status);
    }

    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        let message = if status == 403 {
            TOKEN_EXPIRED_MESSAGE
        } else {
            UNKNOWN_ERROR_MESSAGE
        };
        return ApiError::new(message).with_status(status);
    };

    let error = &parsed["error"];

    if let Ok(validation) = serde_json::from_value::<Validation>(error["validation"].clone()) {
        let message = validation
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("\n");
        let mut err = ApiError::new(message).with_status(status);
        err.validation = Some(validation);
        return err;
    }

    if let Some(details) = error["details"].as_str() {
        let mut err = ApiError::new(details).with_status(status);
        err.details = Some(details.to_string());
        return err;
    }

    if let Some(message) = error.as_str() {
        return ApiError::new(message).with_status(status);
    }

    ApiError::new(UNKNOWN_ERROR_MESSAGE).with_status(status)
}

pub struct ApiClient {
    agent: Agent,
    url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();

        Self {
            agent,
            url: url.into(),
            token,
        }
    }

    pub fn query<T: DeserializeOwned>(&self, action: &str, payload: Option<&Value>) -> Result<T> {
        debug!(action, url = %self.url, "Sending API request");

        let mut request = self
            .agent
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let response = request
            .send_json(request_body(action, payload))
            .with_context(|| format!("API request '{action}' failed"))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .into_body()
            .read_to_string()
            .context("Failed to read API response body")?;

        if !(200..300).contains(&status) {
            let err = decode_error_body(status, content_type.as_deref(), &body);
            warn!(action, status, error = %err, "API request rejected");
            return Err(err.into());
        }

        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).context("Failed to parse API response")?;
        Ok(envelope.into_result()?)
    }
}

use gwsync_errors::{GatewayError, Operation, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// How a 404 is reported for a given operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    /// Plain protocol error.
    Unexpected,
    /// The parent the call is scoped to does not exist, e.g. `service "users"`.
    Dependency(String),
    /// Protocol error with a fixed explanation.
    Reason(&'static str),
}

const BAD_RESPONSE: &str = "bad response from the admin API";

/// Check `observed` against the single success code of an operation.
///
/// `server_message` is the `message` the admin API put in the error body, if
/// any; it becomes the error reason.
pub fn expect_status(
    operation: &Operation,
    expected: StatusCode,
    observed: StatusCode,
    not_found: &NotFound,
    server_message: Option<&str>,
) -> Result<()> {
    if observed == expected {
        return Ok(());
    }

    let mut reason = server_message.unwrap_or(BAD_RESPONSE).to_string();
    if observed == StatusCode::NOT_FOUND {
        match not_found {
            NotFound::Dependency(dependency) => {
                return Err(GatewayError::DependencyNotFound {
                    operation: operation.clone(),
                    dependency: dependency.clone(),
                });
            }
            NotFound::Reason(fixed) => reason = (*fixed).to_string(),
            NotFound::Unexpected => {}
        }
    }

    Err(GatewayError::Protocol {
        operation: operation.clone(),
        expected,
        observed,
        reason,
    })
}

pub fn encode<T: Serialize + ?Sized>(operation: &Operation, payload: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(payload)
        .map_err(|source| GatewayError::Marshal {
            operation: operation.clone(),
            source,
        })
}

pub fn decode<T: DeserializeOwned>(
    operation: &Operation,
    observed: StatusCode,
    body: &[u8],
) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| GatewayError::MalformedResponse {
        operation: operation.clone(),
        observed,
        source,
    })
}

/// Pull `message` out of an admin API error body, falling back to the
/// leading part of the raw text.
pub fn server_message(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(serde_json::Value::String(message)) = map.get("message") {
            return Some(message.clone());
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(200).collect())
}

//! Maps HTTP error responses onto `DirectoryError`.

use log::debug;
use reqwest::{Response, StatusCode};
use serde_json::Value;

use crate::error::DirectoryError;

/// Header the service uses to correlate a failed request with its logs.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Passes successful responses through and turns 4xx/5xx into a `DirectoryError`.
pub async fn check_status(response: Response) -> Result<Response, DirectoryError> {
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(DirectoryError::AuthenticationRequired);
    }

    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    debug!("Error body for HTTP {}: {}", status.as_u16(), body);

    Err(DirectoryError::Api {
        status: status.as_u16(),
        message: error_message(&body, status),
        request_id,
    })
}

/// Extracts a readable message from an error body.
///
/// Understands `{"detail": "..."}` and field error maps such as
/// `{"source": ["... already exists."]}`, which become `source: ... already exists.`.
/// Anything else falls back to the status reason phrase.
pub fn error_message(body: &str, status: StatusCode) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    };

    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    if let Some(Value::String(detail)) = map.get("detail") {
        return detail.clone();
    }

    let fields: Vec<String> = map
        .iter()
        .filter_map(|(field, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                _ => return None,
            };
            (!text.is_empty()).then(|| format!("{}: {}", field, text))
        })
        .collect();

    if fields.is_empty() {
        fallback()
    } else {
        fields.join("; ")
    }
}

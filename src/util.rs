//! Shared helpers for the board-sync crate.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::RemoteError;

/// Serialize `value` as pretty JSON indented with tabs.
pub fn to_tab_indented_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(serde::ser::Error::custom)
}

/// Pull a human-readable message out of an error response body.
///
/// Uses the `message` field when the body is a JSON object (GitHub style),
/// otherwise the trimmed text (Trello style), falling back to the status
/// reason when the body is empty.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(message) = value.get("message").and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turn a response into `T`, or into a `RemoteError::Status` carrying the
/// service's own message when the status is not a success.
///
/// Request URLs may carry credentials in the query string, so they are
/// stripped from the underlying reqwest error.
pub async fn decode_response<T: DeserializeOwned>(
    service: &'static str,
    url: &str,
    resp: reqwest::Response,
) -> Result<T, RemoteError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RemoteError::Status {
            service,
            status: status.as_u16(),
            message: error_message(status, &body),
        });
    }
    resp.json::<T>().await.map_err(|source| RemoteError::Decode {
        url: url.to_string(),
        source: source.without_url(),
    })
}

/// Mask a secret for display, keeping only its last four characters.
pub fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

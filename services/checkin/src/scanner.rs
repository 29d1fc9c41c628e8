//! Kiosk side of a badge scan: report the scanned student to `/qr`

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// How the kiosk proves it may report scans
#[derive(Debug, Clone)]
pub enum Credentials {
    ApiKey(String),
    Session(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanBody<'a> {
    student_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("server rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("server rejected the scan ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Send one scan; succeeds once the server accepted it for broadcast
pub async fn send_scan(
    client: &reqwest::Client,
    base_url: &str,
    student_id: &str,
    credentials: &Credentials,
) -> Result<(), ScanError> {
    let url = format!("{}/qr", base_url.trim_end_matches('/'));

    let (api_key, cookie) = match credentials {
        Credentials::ApiKey(key) => (Some(key.as_str()), None),
        Credentials::Session(token) => (None, Some(format!("auth-session={}", token))),
    };

    let mut request = client.post(&url).json(&ScanBody {
        student_id,
        api_key,
    });
    if let Some(cookie) = cookie {
        request = request.header(reqwest::header::COOKIE, cookie);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    debug!("POST {} -> {} {}", url, status, body);

    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED => Err(ScanError::Unauthorized(message_of(&body))),
        status => Err(ScanError::Rejected {
            status,
            body: message_of(&body),
        }),
    }
}

/// Pull the human-readable part out of an error body
fn message_of(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_scan_with_api_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/qr")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "studentId": "S1",
                "apiKey": "kiosk-key"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let result = send_scan(
            &reqwest::Client::new(),
            &server.url(),
            "S1",
            &Credentials::ApiKey("kiosk-key".to_string()),
        )
        .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_scan_with_session_sends_cookie() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/qr")
            .match_header("cookie", "auth-session=tok")
            .match_body(Matcher::Json(json!({ "studentId": "S2" })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let url = format!("{}/", server.url());
        let result = send_scan(
            &reqwest::Client::new(),
            &url,
            "S2",
            &Credentials::Session("tok".to_string()),
        )
        .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_key_is_unauthorized() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/qr")
            .with_status(401)
            .with_body(r#"{"message":"Invalid api key"}"#)
            .create_async()
            .await;

        let result = send_scan(
            &reqwest::Client::new(),
            &server.url(),
            "S1",
            &Credentials::ApiKey("wrong".to_string()),
        )
        .await;

        match result {
            Err(ScanError::Unauthorized(message)) => assert_eq!(message, "Invalid api key"),
            other => panic!("expected unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation_failure_is_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/qr")
            .with_status(400)
            .with_body(r#"{"error":"Validation failed","issues":[]}"#)
            .create_async()
            .await;

        let result = send_scan(
            &reqwest::Client::new(),
            &server.url(),
            "",
            &Credentials::ApiKey("k".to_string()),
        )
        .await;

        match result {
            Err(ScanError::Rejected { status, body }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "Validation failed");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_message_of_falls_back_to_raw_body() {
        assert_eq!(message_of("gateway timeout"), "gateway timeout");
        assert_eq!(message_of(r#"{"error":"nope"}"#), "nope");
    }
}

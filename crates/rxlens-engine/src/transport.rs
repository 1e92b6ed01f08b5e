use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::AnalysisError;

/// Status and body of one HTTP exchange, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One outbound JSON POST with a bearer credential.
///
/// Implementations only report network faults as errors; HTTP status handling
/// belongs to [`interpret_chat_response`].
pub trait Transport: Send + Sync {
    fn post_json(
        &self,
        endpoint: &str,
        credential: &str,
        payload: &Value,
    ) -> Result<RawResponse, AnalysisError>;
}

pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, AnalysisError> {
        // reqwest's blocking client defaults to a 30s timeout; `None` disables it.
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn post_json(
        &self,
        endpoint: &str,
        credential: &str,
        payload: &Value,
    ) -> Result<RawResponse, AnalysisError> {
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(credential)
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .map_err(|err| AnalysisError::Transport(format!("request to {endpoint} failed: {err}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| AnalysisError::Transport(format!("response body read failed: {err}")))?;
        Ok(RawResponse { status, body })
    }
}

/// Turns a raw exchange into the model's message content.
///
/// Non-success statuses fail with the server's `error.message` when it has
/// one, otherwise with a message naming the status code.
pub fn interpret_chat_response(response: RawResponse) -> Result<String, AnalysisError> {
    let parsed = serde_json::from_str::<Value>(&response.body).ok();
    if !response.is_success() {
        let message = parsed
            .as_ref()
            .and_then(|value| value.pointer("/error/message"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("API request failed with status {}", response.status));
        return Err(AnalysisError::ApiRequest {
            status: response.status,
            message,
        });
    }

    let Some(parsed) = parsed else {
        return Err(AnalysisError::UnexpectedResponse(format!(
            "body is not JSON: {}",
            truncate_text(&response.body, 256)
        )));
    };
    parsed
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AnalysisError::UnexpectedResponse(
                "missing choices[0].message.content".to_string(),
            )
        })
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    use serde_json::{json, Value};

    use super::{interpret_chat_response, HttpTransport, RawResponse, Transport};
    use crate::error::AnalysisError;

    #[derive(Debug)]
    struct CapturedRequest {
        request_line: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl CapturedRequest {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }
    }

    /// Serves exactly one request on a loopback port with a canned response.
    fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> anyhow::Result<(String, mpsc::Receiver<CapturedRequest>)> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            if let Ok(captured) = read_request(&stream) {
                let _ = tx.send(captured);
            }
            let mut stream = stream;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        });
        Ok((format!("http://{addr}/v1/chat/completions"), rx))
    }

    fn read_request(stream: &TcpStream) -> std::io::Result<CapturedRequest> {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;
        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line)?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.trim().to_string(), value.trim().to_string()));
            }
        }
        let length = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0; length];
        reader.read_exact(&mut body)?;
        Ok(CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        })
    }

    #[test]
    fn http_transport_posts_json_with_bearer_credential() -> anyhow::Result<()> {
        let (endpoint, captured) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"hello"}}]}"#,
        )?;
        let transport = HttpTransport::new(None)?;
        let payload = json!({"model": "gpt-4o", "max_tokens": 1500});
        let response = transport.post_json(&endpoint, "sk-test", &payload)?;
        assert_eq!(response.status, 200);
        assert_eq!(interpret_chat_response(response)?, "hello");

        let request = captured.recv()?;
        assert_eq!(request.request_line, "POST /v1/chat/completions HTTP/1.1");
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(&request.body)?;
        assert_eq!(body, payload);
        Ok(())
    }

    #[test]
    fn http_transport_returns_error_status_without_failing() -> anyhow::Result<()> {
        let (endpoint, _captured) = serve_once(
            "401 Unauthorized",
            r#"{"error":{"message":"invalid api key"}}"#,
        )?;
        let transport = HttpTransport::new(None)?;
        let response = transport.post_json(&endpoint, "bad", &json!({}))?;
        assert_eq!(response.status, 401);
        match interpret_chat_response(response) {
            Err(AnalysisError::ApiRequest { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => anyhow::bail!("expected ApiRequest, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn connection_refused_is_a_transport_error() -> anyhow::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let transport = HttpTransport::new(None)?;
        let result = transport.post_json(
            &format!("http://{addr}/v1/chat/completions"),
            "sk-test",
            &json!({}),
        );
        assert!(matches!(result, Err(AnalysisError::Transport(_))));
        Ok(())
    }

    #[test]
    fn error_status_without_message_names_the_status() {
        for body in ["", "<html>bad gateway</html>", r#"{"error":{}}"#, r#"{"error":{"message":""}}"#] {
            match interpret_chat_response(RawResponse::new(502, body)) {
                Err(AnalysisError::ApiRequest { status, message }) => {
                    assert_eq!(status, 502);
                    assert_eq!(message, "API request failed with status 502");
                }
                other => panic!("expected ApiRequest for {body:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn success_without_content_is_unexpected() {
        for body in ["not json", "{}", r#"{"choices":[]}"#, r#"{"choices":[{"message":{"content":null}}]}"#] {
            assert!(
                matches!(
                    interpret_chat_response(RawResponse::new(200, body)),
                    Err(AnalysisError::UnexpectedResponse(_))
                ),
                "{body}"
            );
        }
    }

    #[test]
    fn success_returns_first_choice_content_verbatim() -> anyhow::Result<()> {
        let body = json!({
            "choices": [
                {"message": {"content": "  first\n"}},
                {"message": {"content": "second"}},
            ]
        })
        .to_string();
        assert_eq!(interpret_chat_response(RawResponse::new(200, body))?, "  first\n");
        Ok(())
    }
}

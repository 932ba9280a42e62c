//! HTTP client for the signed streaming chat protocol.
//!
//! [`ChatClient`] opens the "create conversation" request and the long-lived
//! "stream completion" request. Completion responses arrive as
//! newline-delimited frames with an optional `data: ` prefix; frames are
//! decoded into [`ProtocolEvent`]s, and anything that fails to decode is
//! skipped — the protocol is tolerant of noise and keepalives. A transport
//! error mid-stream silently ends the event sequence; whatever was streamed
//! up to that point stays usable.
//!
//! [`ChatTransport`] is the seam between the orchestration loop and the
//! network, so tests can script event sequences without a server.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{
    CONNECT_TIMEOUT_SECS, CLIENT_VERSION, CREATE_TIMEOUT_SECS, FE_VERSION, PAGE_TITLE,
    STREAM_DONE_SENTINEL, USER_AGENT,
};
use crate::protocol::ProtocolEvent;
use crate::signature;

/// Lazy sequence of decoded protocol events from one completion request.
pub type EventStream = Pin<Box<dyn Stream<Item = ProtocolEvent> + Send>>;

/// Errors surfaced by the protocol client.
///
/// Transport errors during streaming never appear here; they end the event
/// stream silently instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("credential contains characters not valid in a header")]
    InvalidCredential(#[from] InvalidHeaderValue),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("conversation creation response missing id")]
    MissingConversationId,
}

/// The transport seam consumed by the orchestration loop.
#[async_trait]
pub trait ChatTransport {
    /// Creates a conversation and returns its server-assigned id.
    async fn create_conversation(&self, payload: &Value) -> Result<String, ClientError>;

    /// Opens a streaming completion request for one turn.
    async fn stream_completion(
        &self,
        conversation_id: &str,
        payload: &Value,
    ) -> Result<EventStream, ClientError>;
}

/// A configured client for the remote chat endpoint.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ChatClient {
    /// Builds a client carrying the fixed browser header set plus the
    /// credential as both a bearer header and a plain `token` header.
    pub fn new(
        token: impl Into<String>,
        cookie: Option<&str>,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let token = token.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert("accept-language", HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("origin", HeaderValue::from_str(&base_url)?);
        headers.insert("referer", HeaderValue::from_str(&format!("{}/", base_url))?);
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert("token", HeaderValue::from_str(&token)?);
        headers.insert("x-fe-version", HeaderValue::from_static(FE_VERSION));
        if let Some(cookie) = cookie {
            headers.insert("cookie", HeaderValue::from_str(cookie)?);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The fixed simulated-browser telemetry block sent as query parameters.
    /// Static and derived values only; nothing here branches.
    fn telemetry_query(
        &self,
        conversation_id: &str,
        request_id: &str,
        user_id: &str,
        timestamp_ms: i64,
        now: DateTime<Utc>,
    ) -> Vec<(&'static str, String)> {
        let host = self
            .base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .to_string();
        vec![
            ("timestamp", timestamp_ms.to_string()),
            ("requestId", request_id.to_string()),
            ("user_id", user_id.to_string()),
            ("version", CLIENT_VERSION.to_string()),
            ("platform", "web".to_string()),
            ("token", self.token.clone()),
            ("user_agent", USER_AGENT.to_string()),
            ("language", "en-US".to_string()),
            ("languages", "en-US,en".to_string()),
            ("timezone", "UTC".to_string()),
            ("cookie_enabled", "true".to_string()),
            ("screen_width", "1536".to_string()),
            ("screen_height", "864".to_string()),
            ("screen_resolution", "1536x864".to_string()),
            ("viewport_height", "772".to_string()),
            ("viewport_width", "744".to_string()),
            ("viewport_size", "744x772".to_string()),
            ("color_depth", "24".to_string()),
            ("pixel_ratio", "1.125".to_string()),
            (
                "current_url",
                format!("{}/c/{}", self.base_url, conversation_id),
            ),
            ("pathname", format!("/c/{}", conversation_id)),
            ("search", String::new()),
            ("hash", String::new()),
            ("host", host.clone()),
            ("hostname", host),
            ("protocol", "https:".to_string()),
            ("referrer", String::new()),
            ("title", PAGE_TITLE.to_string()),
            ("timezone_offset", "0".to_string()),
            (
                "local_time",
                now.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            ),
            (
                "utc_time",
                now.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            ),
            ("is_mobile", "false".to_string()),
            ("is_touch", "false".to_string()),
            ("max_touch_points", "0".to_string()),
            ("browser_name", "Chrome".to_string()),
            ("os_name", "Windows".to_string()),
            ("signature_timestamp", timestamp_ms.to_string()),
        ]
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn create_conversation(&self, payload: &Value) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.url("/api/v1/chats/new"))
            .query(&[("token", self.token.as_str())])
            .header("accept", "application/json")
            .timeout(Duration::from_secs(CREATE_TIMEOUT_SECS))
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        match body.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(ClientError::MissingConversationId),
        }
    }

    async fn stream_completion(
        &self,
        conversation_id: &str,
        payload: &Value,
    ) -> Result<EventStream, ClientError> {
        let now = Utc::now();
        let timestamp_ms = now.timestamp_millis();
        let request_id = Uuid::new_v4().to_string();
        let user_id = extract_user_id(&self.token);

        // The prompt is signed as the "action"; the payload carries it under
        // signature_prompt, falling back to the first message body.
        let action = payload
            .get("signature_prompt")
            .and_then(Value::as_str)
            .or_else(|| payload.pointer("/messages/0/content").and_then(Value::as_str))
            .unwrap_or_default();
        let summary = format!(
            "requestId,{},timestamp,{},user_id,{}",
            request_id, timestamp_ms, user_id
        );
        let signature = signature::sign(&summary, action, timestamp_ms);

        let query = self.telemetry_query(conversation_id, &request_id, &user_id, timestamp_ms, now);
        let response = self
            .http
            .post(self.url("/api/v2/chat/completions"))
            .query(&query)
            .header("accept", "*/*")
            .header(
                "referer",
                format!("{}/c/{}", self.base_url, conversation_id),
            )
            .header("x-signature", signature)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(decode_event_stream(response))
    }
}

/// Best-effort extraction of the user identifier from the credential.
///
/// Decodes the middle JWT segment as unpadded url-safe base64 JSON and reads
/// its `id` field. Any failure yields an empty string rather than an error.
fn extract_user_id(token: &str) -> String {
    let Some(segment) = token.split('.').nth(1) else {
        return String::new();
    };
    let Ok(decoded) = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')) else {
        return String::new();
    };
    serde_json::from_slice::<Value>(&decoded)
        .ok()
        .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

/// Wraps a streaming response body into a lazy sequence of decoded events.
fn decode_event_stream(response: reqwest::Response) -> EventStream {
    let stream = response
        .bytes_stream()
        .scan(FrameBuffer::default(), |buffer, chunk| {
            let events = buffer.handle_chunk(chunk);
            async move { Some(events) }
        })
        .flat_map(futures::stream::iter);
    Box::pin(stream)
}

/// Decodes a single raw frame, or `None` for frames that carry no event:
/// empties, the terminal sentinel, and anything that is not valid JSON.
fn parse_frame(line: &str) -> Option<ProtocolEvent> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let content = line.strip_prefix("data: ").unwrap_or(line);
    if content.is_empty() || content == STREAM_DONE_SENTINEL {
        return None;
    }
    serde_json::from_str(content).ok()
}

/// Buffers body chunks into newline-delimited frames, taking care not to
/// split multi-byte UTF-8 sequences that straddle chunk boundaries.
#[derive(Default)]
struct FrameBuffer {
    buffer: String,
    utf8_pending: Vec<u8>,
    failed: bool,
}

impl FrameBuffer {
    /// Feeds one body chunk and drains every complete frame it finishes.
    /// A transport error flips the buffer into a terminal state that yields
    /// nothing further, ending the stream silently.
    fn handle_chunk<B, E>(&mut self, chunk: Result<B, E>) -> Vec<ProtocolEvent>
    where
        B: AsRef<[u8]>,
    {
        if self.failed {
            return Vec::new();
        }
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(_) => {
                self.failed = true;
                return Vec::new();
            }
        };
        self.push_bytes(bytes.as_ref());
        self.drain_frames()
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.utf8_pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.utf8_pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.utf8_pending.clear();
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                if valid_up_to > 0 {
                    let valid = String::from_utf8_lossy(&self.utf8_pending[..valid_up_to]);
                    self.buffer.push_str(&valid);
                    self.utf8_pending.drain(..valid_up_to);
                }
            }
        }
    }

    fn drain_frames(&mut self) -> Vec<ProtocolEvent> {
        let mut events = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(event) = parse_frame(&line) {
                events.push(event);
            }
        }
        events
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.find('\n')?;
        let line = self.buffer[..pos].to_string();
        self.buffer.drain(..=pos);
        Some(line)
    }
}

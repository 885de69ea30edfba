//! Server-sent event stream plumbing.
//!
//! The store delivers change notifications over a long-lived HTTP response
//! in SSE framing: `event:` / `data:` lines terminated by a blank line.
//! [`SseParser`] turns raw body chunks into [`ServerEvent`]s; [`EventStream`]
//! drives it from a live response body.

use std::collections::VecDeque;

use reqwest::Response;
use tracing::debug;

use crate::error::{RtdbError, RtdbResult};
use crate::types::StreamPayload;

/// A parsed event from the store's notification stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// The value at `path` was replaced with `data`.
    Put(StreamPayload),

    /// The children named in `data` were written at `path`.
    Patch(StreamPayload),

    /// Periodic no-op to keep the connection open.
    KeepAlive,

    /// The server is closing the stream (for example after a rules change).
    Cancel,

    /// The credentials used to open the stream expired.
    AuthRevoked,
}

/// Incremental SSE frame parser.
///
/// Body chunks can split frames, lines, and even UTF-8 sequences at
/// arbitrary byte boundaries; bytes are buffered until a full line arrives.
#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buffer: Vec<u8>,
    event_name: Option<String>,
    data_lines: Vec<String>,
    ready: VecDeque<ServerEvent>,
}

impl SseParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Consume a body chunk, queueing any frames it completes.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> RtdbResult<()> {
        self.buffer.extend_from_slice(chunk);
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line_bytes: Vec<u8> = self.buffer.drain(..=pos).collect();
            line_bytes.pop();
            if line_bytes.last() == Some(&b'\r') {
                line_bytes.pop();
            }
            let line = String::from_utf8(line_bytes)
                .map_err(|_| RtdbError::invalid_response("event stream sent invalid UTF-8"))?;
            self.handle_line(&line)?;
        }
        Ok(())
    }

    /// Pop the next completed event, if any.
    pub(crate) fn next_event(&mut self) -> Option<ServerEvent> {
        self.ready.pop_front()
    }

    fn handle_line(&mut self, line: &str) -> RtdbResult<()> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // comment line, some proxies inject these as padding
            return Ok(());
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event_name = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            other => debug!(field = other, "Ignoring unknown event stream field"),
        }
        Ok(())
    }

    fn dispatch(&mut self) -> RtdbResult<()> {
        if self.event_name.is_none() && self.data_lines.is_empty() {
            return Ok(());
        }
        let name = self.event_name.take().unwrap_or_default();
        let data = std::mem::take(&mut self.data_lines).join("\n");

        match name.as_str() {
            "put" => {
                let payload: StreamPayload = serde_json::from_str(&data)?;
                self.ready.push_back(ServerEvent::Put(payload));
            }
            "patch" => {
                let payload: StreamPayload = serde_json::from_str(&data)?;
                self.ready.push_back(ServerEvent::Patch(payload));
            }
            "keep-alive" => self.ready.push_back(ServerEvent::KeepAlive),
            "cancel" => self.ready.push_back(ServerEvent::Cancel),
            "auth_revoked" => self.ready.push_back(ServerEvent::AuthRevoked),
            other => debug!(event = other, "Ignoring unknown event stream event"),
        }
        Ok(())
    }
}

/// Live notification stream for one subscribed path.
pub struct EventStream {
    response: Response,
    parser: SseParser,
    failed: Option<RtdbError>,
}

impl EventStream {
    pub(crate) fn new(response: Response) -> Self {
        Self {
            response,
            parser: SseParser::new(),
            failed: None,
        }
    }

    /// Next event from the stream, or `None` once the server closes it.
    ///
    /// A frame left incomplete when the connection drops is discarded.
    /// When a chunk parses partway, the frames it completed are returned
    /// before the failure is.
    pub async fn next_event(&mut self) -> RtdbResult<Option<ServerEvent>> {
        loop {
            if let Some(event) = self.parser.next_event() {
                return Ok(Some(event));
            }
            if let Some(e) = self.failed.take() {
                return Err(e);
            }
            match self.response.chunk().await? {
                Some(chunk) => {
                    if let Err(e) = self.parser.feed(&chunk) {
                        self.failed = Some(e);
                    }
                }
                None => return Ok(None),
            }
        }
    }
}

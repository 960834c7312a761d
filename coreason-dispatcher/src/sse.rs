//! A minimal server-sent-events line parser (§4.5).

use tracing::warn;

/// Incremental SSE parser: feed it lines one at a time, get back a completed event's
/// parsed JSON payload whenever a blank line (or end-of-stream, via [`finish`]) closes one.
///
/// [`finish`]: SseEventParser::finish
#[derive(Debug, Default)]
pub struct SseEventParser {
    buffer: Vec<String>,
}

impl SseEventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its trailing newline). Returns the parsed payload if this
    /// line closed a non-empty event.
    pub fn feed_line(&mut self, line: &str) -> Option<serde_json::Value> {
        if line.trim().is_empty() {
            return self.flush();
        }

        if let Some(rest) = line.strip_prefix("data:") {
            let content = rest.strip_prefix(' ').unwrap_or(rest);
            self.buffer.push(content.to_string());
        }
        // `:` comments, `id:`, `event:`, `retry:` lines are ignored.

        None
    }

    /// Flush any buffered event at end-of-stream.
    pub fn finish(&mut self) -> Option<serde_json::Value> {
        self.flush()
    }

    fn flush(&mut self) -> Option<serde_json::Value> {
        if self.buffer.is_empty() {
            return None;
        }
        let full_data = self.buffer.join("");
        self.buffer.clear();

        match serde_json::from_str(&full_data) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(event = %full_data, "failed to parse SSE event payload");
                None
            }
        }
    }
}

/// Parse an already-fully-buffered SSE body into its sequence of payloads. Used by tests
/// and by any dispatcher that reads the full response body rather than streaming it.
pub fn parse_sse_body(body: &str) -> Vec<serde_json::Value> {
    let mut parser = SseEventParser::new();
    let mut out = Vec::new();

    for line in body.lines() {
        if let Some(value) = parser.feed_line(line) {
            out.push(value);
        }
    }
    if let Some(value) = parser.finish() {
        out.push(value);
    }

    out
}

//! Incremental SSE parser for the upstream completion stream.
//!
//! vLLM frames streamed completions as `data: <json>` events separated by
//! blank lines, ending with `data: [DONE]`. Events can split across TCP
//! reads, so the parser buffers raw bytes and only decodes an event once its
//! terminating blank line has arrived. Buffering bytes rather than text
//! keeps multi-byte UTF-8 codepoints intact when a read boundary falls
//! inside one.

/// Buffers raw transport chunks and extracts complete `data:` payloads.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk; returns the payloads of every event
    /// completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.buf.drain(..pos + 2).collect();
            let event = String::from_utf8_lossy(&event);
            for line in event.lines() {
                if let Some(data) = line.strip_prefix("data:") {
                    payloads.push(data.strip_prefix(' ').unwrap_or(data).to_string());
                }
            }
        }
        payloads
    }
}

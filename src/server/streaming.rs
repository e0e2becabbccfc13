//! SSE (Server-Sent Events) framing for token-by-token responses.
//!
//! Turns the backend's fragment stream into the wire format the gateway's
//! consumers expect: escaped `data:` lines, early termination on the
//! end-of-sequence marker, and a single trailing `[DONE]` sentinel.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::client::vllm::{ClientError, FragmentStream};

/// End-of-sequence marker, possibly embedded mid-fragment.
pub const EOS_MARKER: &str = "</s>";

/// Terminal event closing every completed stream.
pub const DONE_EVENT: &str = "data: [DONE]\n\n";

/// Placeholder for a space character. SSE transport trims leading and
/// trailing whitespace from data lines, so spaces are escaped and restored
/// client-side. Known limitation: genuine model output containing the
/// literal `@#$` is indistinguishable from an escaped space.
pub const SPACE_MARKER: &str = "@#$";

/// Format one raw fragment as an SSE data line, or `None` to skip it.
///
/// Whitespace-only fragments are dropped, except for the two shapes a
/// consumer must be able to reconstruct: a lone space and a lone newline.
pub fn post_process_chunk(text: &str) -> Option<String> {
    if text == " " {
        return Some(format!("data: {SPACE_MARKER}\n\n"));
    }
    if text == "\n" {
        return Some("data: <br/>\n\n".to_string());
    }
    if !text.is_empty() && text.chars().all(char::is_whitespace) {
        return None;
    }
    Some(format!("data: {}\n\n", text.replace(' ', SPACE_MARKER)))
}

/// Convert a backend fragment stream into the SSE response body.
///
/// A producer task pulls fragments one at a time through a bounded channel,
/// so at most one formatted event is in flight. When the downstream
/// connection goes away the channel send fails, the task returns, and the
/// backend stream is dropped with it. A fragment containing [`EOS_MARKER`]
/// ends the stream early: only the text before the marker is emitted and no
/// further fragments are pulled. Every completed stream ends with exactly
/// one [`DONE_EVENT`]; a backend error aborts the body without one.
pub fn completion_sse_stream(
    mut fragments: FragmentStream,
) -> impl Stream<Item = Result<Bytes, ClientError>> {
    let (tx, rx) = mpsc::channel::<Result<Bytes, ClientError>>(1);

    tokio::spawn(async move {
        // Accumulated response, kept only for end-of-stream diagnostics.
        let mut transcript = String::new();

        while let Some(next) = fragments.next().await {
            let text = match next {
                Ok(text) => text,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };
            transcript.push_str(&text);

            if text.is_empty() {
                continue;
            }
            let Some(event) = post_process_chunk(&text) else {
                continue;
            };

            if let Some((before, _)) = text.split_once(EOS_MARKER) {
                if !before.is_empty() {
                    if let Some(event) = post_process_chunk(before) {
                        if tx.send(Ok(Bytes::from(event))).await.is_err() {
                            return;
                        }
                    }
                }
                break;
            }

            if tx.send(Ok(Bytes::from(event))).await.is_err() {
                // Consumer went away, stop pulling.
                return;
            }
        }

        info!(response = %transcript, "stream complete");
        let _ = tx
            .send(Ok(Bytes::from_static(DONE_EVENT.as_bytes())))
            .await;
    });

    ReceiverStream::new(rx)
}

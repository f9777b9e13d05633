//! # Line Framer
//!
//! Turns response-body chunks into complete protocol frames. Chunk
//! boundaries carry no meaning: a frame (or a single UTF-8 character) may be
//! split across any number of chunks.

use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;

/// Marker every protocol line starts with
pub const EVENT_PREFIX: &str = "data: ";

/// Longest line held back while waiting for its newline
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Push-style framer with a carry-over buffer
///
/// A line that outgrows the limit is dropped whole, up to its newline.
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    max_line_bytes: usize,
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line_bytes,
            discarding: false,
        }
    }

    /// Append a chunk and return every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            if self.discarding {
                self.discarding = false;
            } else if let Some(frame) = frame_payload(&self.pending[consumed..end]) {
                frames.push(frame);
            }
            consumed = end + 1;
        }
        self.pending.drain(..consumed);

        if self.pending.len() > self.max_line_bytes {
            if !self.discarding {
                tracing::warn!(limit = self.max_line_bytes, "Dropping oversized line");
            }
            self.pending.clear();
            self.discarding = true;
        }

        frames
    }

    /// Flush the unterminated tail once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.pending);
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        frame_payload(&tail)
    }

    /// Bytes held back waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Extract the payload of one line, or `None` if the line is not a frame
fn frame_payload(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let text = String::from_utf8_lossy(line);
    let payload = text.strip_prefix(EVENT_PREFIX)?;
    if payload.trim().is_empty() {
        return None;
    }
    Some(payload.to_string())
}

/// Adapt a chunk stream into a frame stream
///
/// The first transport error is yielded and ends the sequence.
pub fn frames<S, B, E>(chunks: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    let state = (chunks, LineFramer::new(), VecDeque::<String>::new(), false);

    stream::unfold(state, |(mut chunks, mut framer, mut ready, mut ended)| async move {
        loop {
            if let Some(frame) = ready.pop_front() {
                return Some((Ok(frame), (chunks, framer, ready, ended)));
            }
            if ended {
                return None;
            }
            match chunks.next().await {
                Some(Ok(chunk)) => ready.extend(framer.push(chunk.as_ref())),
                Some(Err(e)) => {
                    ended = true;
                    return Some((Err(e), (chunks, framer, ready, ended)));
                }
                None => {
                    ended = true;
                    ready.extend(framer.finish());
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "data: {\"type\":\"event\",\"data\":{\"agentId\":\"researcher\"}}\n\
                        : keepalive\n\
                        \n\
                        data: {\"type\":\"event\",\"data\":{\"message\":\"写作中…\"}}\r\n\
                        event: ignored\n\
                        data: {\"type\":\"done\",\"data\":\"ok\"}\n";

    fn collect_chunked(body: &[u8], size: usize) -> Vec<String> {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
            body.chunks(size).map(|c| Ok(c.to_vec())).collect();
        tokio_test::block_on(
            frames(stream::iter(chunks))
                .map(|frame| frame.unwrap())
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_only_prefixed_lines_are_frames() {
        let mut framer = LineFramer::new();
        let frames = framer.push(BODY.as_bytes());

        assert_eq!(frames.len(), 3);
        assert!(frames[0].contains("researcher"));
        assert!(frames[1].ends_with('}'), "carriage return must be stripped");
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_framing_is_chunk_boundary_independent() {
        let whole = collect_chunked(BODY.as_bytes(), BODY.len());
        for size in 1..=17 {
            assert_eq!(collect_chunked(BODY.as_bytes(), size), whole, "chunk size {}", size);
        }
    }

    #[test]
    fn test_partial_line_is_carried_over() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"data: {\"type\":").is_empty());
        assert_eq!(framer.pending_len(), 14);

        let frames = framer.push(b"\"done\"}\ndata: ");
        assert_eq!(frames, vec!["{\"type\":\"done\"}".to_string()]);
        assert_eq!(framer.pending_len(), 6);
    }

    #[test]
    fn test_unterminated_tail_flushed_on_finish() {
        let mut framer = LineFramer::new();
        framer.push(b"data: {\"type\":\"done\"}");
        assert_eq!(framer.finish().as_deref(), Some("{\"type\":\"done\"}"));
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut framer = LineFramer::with_max_line_bytes(16);
        assert!(framer.push(b"data: 0123456789abcdef").is_empty());
        assert_eq!(framer.pending_len(), 0);
        assert!(framer.push(b"more of the same line").is_empty());

        let frames = framer.push(b" end\ndata: ok\n");
        assert_eq!(frames, vec!["ok".to_string()]);

        framer.push(b"data: 0123456789abcdef");
        assert_eq!(framer.finish(), None);
        framer.push(b"data: next");
        assert_eq!(framer.finish().as_deref(), Some("next"));
    }

    #[test]
    fn test_transport_error_ends_frames() {
        let chunks: Vec<Result<&[u8], &str>> = vec![
            Ok(&b"data: one\ndata: tw"[..]),
            Err("connection reset"),
            Ok(&b"o\n"[..]),
        ];
        let out = tokio_test::block_on(frames(stream::iter(chunks)).collect::<Vec<_>>());

        assert_eq!(out, vec![Ok("one".to_string()), Err("connection reset")]);
    }
}

//! Decoding of the streamed chat reply.
//!
//! The backend answers `POST /chat/{id}/chat` with lines of the form
//! `data: {token}` separated by blank lines, terminated by `data: [DONE]`.
//! Network reads can split a line anywhere, including inside a multi-byte
//! character or the sentinel itself, so bytes are buffered until a full line
//! is available.

use std::collections::VecDeque;

use futures_util::stream::{self, BoxStream, StreamExt};

use super::error::ApiError;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// One decoded unit of the chat stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Text to append to the assistant message
    Delta(String),
    /// The `[DONE]` sentinel
    Done,
}

/// Incremental line decoder for the chat event stream
#[derive(Debug, Default)]
pub struct ChatEventDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl ChatEventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the sentinel has been seen; later input is ignored
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk of bytes, returning every event completed by it
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChatEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = self.decode_line(&line[..line.len() - 1]) {
                events.push(event);
                if self.done {
                    self.buffer.clear();
                    break;
                }
            }
        }
        events
    }

    /// Flush a trailing line that was never newline-terminated
    pub fn finish(&mut self) -> Option<ChatEvent> {
        if self.done || self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line)
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<ChatEvent> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        let payload = line.strip_prefix(DATA_PREFIX)?;

        if payload == DONE_SENTINEL {
            self.done = true;
            return Some(ChatEvent::Done);
        }
        Some(ChatEvent::Delta(payload.to_string()))
    }
}

type ByteStream = BoxStream<'static, Result<Vec<u8>, ApiError>>;

/// Streamed assistant reply.
///
/// Yields text deltas in arrival order and ends at the sentinel or when the
/// connection closes.
pub struct ChatStream {
    bytes: ByteStream,
    decoder: ChatEventDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("pending", &self.pending.len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl ChatStream {
    /// Wrap an HTTP response whose body is the event stream
    pub fn from_response(response: reqwest::Response) -> Self {
        let bytes = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|b| b.to_vec())
                    .map_err(|e| ApiError::network("backend", format!("Stream error: {}", e)))
            })
            .boxed();
        Self::from_byte_stream(bytes)
    }

    /// Build from an arbitrary sequence of byte chunks
    pub fn from_byte_stream(bytes: ByteStream) -> Self {
        Self {
            bytes,
            decoder: ChatEventDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Build from in-memory chunks
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        let chunks: Vec<Result<Vec<u8>, ApiError>> =
            chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self::from_byte_stream(stream::iter(chunks).boxed())
    }

    /// Next text delta, `None` once the stream has ended
    pub async fn next_delta(&mut self) -> Option<Result<String, ApiError>> {
        loop {
            if let Some(delta) = self.pending.pop_front() {
                return Some(Ok(delta));
            }
            if self.finished {
                return None;
            }

            match self.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = self.decoder.feed(&chunk);
                    self.push_events(events);
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    let tail = self.decoder.finish();
                    self.push_events(tail);
                    self.finished = true;
                }
            }
        }
    }

    fn push_events(&mut self, events: impl IntoIterator<Item = ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::Delta(text) => self.pending.push_back(text),
                ChatEvent::Done => self.finished = true,
            }
        }
    }
}

//! Line-oriented decoding of streamed HTTP bodies (NDJSON and SSE)
//!
//! Network chunks do not respect line or UTF-8 boundaries, so bytes are
//! buffered until a full line is available before anything is decoded.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use crate::error::{Error, Result};

use super::llm::ProviderStream;

/// Turns one complete line into an optional fragment
pub type LineDecodeFn = fn(&str) -> Option<Result<String>>;

/// Accumulates bytes and hands out complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Add bytes, returning every line completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(Self::decode(&line[..line.len() - 1]));
        }
        lines
    }

    /// Whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(Self::decode(&rest))
    }

    fn decode(line: &[u8]) -> String {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        String::from_utf8_lossy(line).into_owned()
    }
}

struct DecoderState<S> {
    bytes: Pin<Box<S>>,
    buffer: LineBuffer,
    ready: VecDeque<Result<String>>,
    finished: bool,
    decode: LineDecodeFn,
}

impl<S> DecoderState<S> {
    fn queue(&mut self, line: &str) {
        if let Some(item) = (self.decode)(line) {
            self.ready.push_back(item);
        }
    }
}

/// Decode a byte stream line by line into a fragment stream
///
/// A transport error ends the stream after being yielded once.
pub fn decode_lines<S, E>(bytes: S, decode: LineDecodeFn) -> ProviderStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Display,
{
    let state = DecoderState {
        bytes: Box::pin(bytes),
        buffer: LineBuffer::default(),
        ready: VecDeque::new(),
        finished: false,
        decode,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for line in state.buffer.push(&chunk) {
                        state.queue(&line);
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .ready
                        .push_back(Err(Error::generation(format!("Stream error: {}", e))));
                }
                None => {
                    state.finished = true;
                    if let Some(line) = state.buffer.finish() {
                        state.queue(&line);
                    }
                }
            }
        }
    }))
}

//! Incremental decoder for `Content-Length` framed JSON-RPC messages.
//!
//! Bytes arrive in arbitrary chunks through [`FrameDecoder::feed`]; complete
//! messages are pulled out with [`FrameDecoder::try_take_message`] or the
//! [`FrameDecoder::messages`] iterator. The decoder never performs I/O and
//! never blocks: "not enough bytes yet" is reported as `Ok(None)`.
//!
//! # Example
//!
//! ```
//! use lsp_framing::lsp::{encode, FrameDecoder};
//!
//! let mut decoder = FrameDecoder::new();
//! let frame = encode(&serde_json::json!({"jsonrpc": "2.0", "method": "exit"})).unwrap();
//!
//! decoder.feed(&frame[..10]);
//! assert!(decoder.try_take_message().unwrap().is_none());
//!
//! decoder.feed(&frame[10..]);
//! let message = decoder.try_take_message().unwrap().unwrap();
//! assert_eq!(message["method"], "exit");
//! ```

use bytes::{Buf, BytesMut};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::error::{FrameError, Result};
use crate::lsp::headers::{
    find_content_length_key, find_header_end, leading_blank_lines, parse_content_length,
    CONTENT_LENGTH,
};

/// Default cap on a single message body (4 MiB).
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 4 * 1024 * 1024;

/// Default cap on a header block (8 KiB).
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Smallest header cap accepted; below this resynchronization could stall.
pub const MIN_HEADER_BYTES: usize = 64;

/// Limits applied by a [`FrameDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    max_content_length: usize,
    max_header_bytes: usize,
}

impl DecoderConfig {
    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }

    pub fn max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    pub fn with_max_content_length(mut self, max: usize) -> Self {
        self.max_content_length = max;
        self
    }

    /// Values below [`MIN_HEADER_BYTES`] are raised to it.
    pub fn with_max_header_bytes(mut self, max: usize) -> Self {
        self.max_header_bytes = max.max(MIN_HEADER_BYTES);
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning for the blank line that ends a header block.
    AwaitingHeaders,
    /// Header parsed, waiting for `content_length` body bytes.
    AwaitingBody { content_length: usize },
    /// Skipping the body of a frame that exceeded the size limit.
    Discarding { remaining: usize },
}

/// Decoder turning a byte stream into JSON-RPC message values.
///
/// One decoder serves one stream. It is reusable for the whole lifetime of
/// that stream, including after errors.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    state: State,
    /// Set after a malformed header block until a `Content-Length` key is seen.
    resyncing: bool,
    config: DecoderConfig,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        let config = config.with_max_header_bytes(config.max_header_bytes);
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            state: State::AwaitingHeaders,
            resyncing: false,
            config,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Append raw bytes from the stream.
    pub fn feed(&mut self, data: &[u8]) {
        if let State::Discarding { remaining } = self.state {
            if !self.buffer.is_empty() {
                // earlier bytes of the skipped body are still buffered
                self.buffer.extend_from_slice(data);
                return;
            }
            // skip oversized body bytes without ever buffering them
            let skipped = remaining.min(data.len());
            self.state = if skipped == remaining {
                State::AwaitingHeaders
            } else {
                State::Discarding {
                    remaining: remaining - skipped,
                }
            };
            self.buffer.extend_from_slice(&data[skipped..]);
            return;
        }
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete message, if one is buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Errors are per frame:
    /// after any `Err` the decoder has already dropped the offending bytes and
    /// the next call continues with whatever follows them.
    pub fn try_take_message(&mut self) -> Result<Option<serde_json::Value>> {
        self.try_take()
    }

    /// Like [`try_take_message`](Self::try_take_message), deserializing the
    /// body straight into `T`. A body that does not fit `T` is a
    /// [`FrameError::JsonParse`] and the frame is consumed.
    pub fn try_take<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            match self.state {
                State::AwaitingHeaders => {
                    if self.resyncing && !self.resync() {
                        return Ok(None);
                    }

                    let blank = leading_blank_lines(&self.buffer);
                    self.buffer.advance(blank);

                    let Some(end) = find_header_end(&self.buffer) else {
                        if self.buffer.len() > self.config.max_header_bytes {
                            return Err(self.overflow_headers());
                        }
                        return Ok(None);
                    };

                    let header = self.buffer.split_to(end.total_len());
                    if end.header_len > self.config.max_header_bytes {
                        warn!(
                            header_len = end.header_len,
                            max = self.config.max_header_bytes,
                            header = %header_preview(&header[..end.header_len]),
                            "dropping oversized header block"
                        );
                        self.resyncing = true;
                        return Err(FrameError::MalformedFrame(format!(
                            "header block of {} bytes exceeds {}",
                            end.header_len, self.config.max_header_bytes
                        )));
                    }

                    let content_length = match parse_content_length(&header[..end.header_len]) {
                        Ok(len) => len,
                        Err(err) => {
                            warn!(
                                header = %header_preview(&header[..end.header_len]),
                                "dropping malformed header block: {err}"
                            );
                            self.resyncing = true;
                            return Err(err);
                        }
                    };

                    if content_length > self.config.max_content_length {
                        warn!(
                            content_length,
                            max = self.config.max_content_length,
                            "skipping oversized frame"
                        );
                        self.state = State::Discarding {
                            remaining: content_length,
                        };
                        return Err(FrameError::FrameTooLarge {
                            length: content_length,
                            max: self.config.max_content_length,
                        });
                    }

                    trace!(content_length, "header block parsed");
                    self.state = State::AwaitingBody { content_length };
                }
                State::AwaitingBody { content_length } => {
                    if self.buffer.len() < content_length {
                        return Ok(None);
                    }

                    let body = self.buffer.split_to(content_length);
                    self.state = State::AwaitingHeaders;
                    debug!(content_length, "frame decoded");

                    return match serde_json::from_slice(&body) {
                        Ok(message) => Ok(Some(message)),
                        Err(err) => {
                            warn!(content_length, "frame body is not valid JSON: {err}");
                            Err(FrameError::JsonParse(err))
                        }
                    };
                }
                State::Discarding { remaining } => {
                    let skipped = remaining.min(self.buffer.len());
                    self.buffer.advance(skipped);
                    if skipped < remaining {
                        self.state = State::Discarding {
                            remaining: remaining - skipped,
                        };
                        return Ok(None);
                    }
                    self.state = State::AwaitingHeaders;
                }
            }
        }
    }

    /// Iterate over every message currently decodable from the buffer.
    ///
    /// The iterator ends when more bytes are needed; feeding more and calling
    /// `messages` again picks up where it stopped.
    pub fn messages(&mut self) -> Messages<'_> {
        Messages { decoder: self }
    }

    /// Number of bytes held for frames not yet complete.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// True when no partial frame is pending.
    pub fn is_idle(&self) -> bool {
        self.state == State::AwaitingHeaders && self.buffer.is_empty() && !self.resyncing
    }

    /// True while a frame has started but not completed.
    ///
    /// Bytes held only while skipping to the next `Content-Length` key are
    /// leftovers of an already reported error, not a frame.
    pub fn has_partial_frame(&self) -> bool {
        match self.state {
            State::AwaitingBody { .. } | State::Discarding { .. } => true,
            State::AwaitingHeaders => !self.resyncing && !self.buffer.is_empty(),
        }
    }

    /// Drop all buffered bytes and return to the initial state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::AwaitingHeaders;
        self.resyncing = false;
    }

    /// Skip to the next `Content-Length` key. Returns false if none is buffered yet.
    fn resync(&mut self) -> bool {
        match find_content_length_key(&self.buffer) {
            Some(pos) => {
                if pos > 0 {
                    debug!(skipped = pos, "resynchronized on Content-Length header");
                }
                self.buffer.advance(pos);
                self.resyncing = false;
                true
            }
            None => {
                // keep a tail that may be the start of a split key
                let keep = CONTENT_LENGTH.len() - 1;
                let drop = self.buffer.len().saturating_sub(keep);
                self.buffer.advance(drop);
                false
            }
        }
    }

    fn overflow_headers(&mut self) -> FrameError {
        let buffered = self.buffer.len();
        warn!(
            buffered,
            max = self.config.max_header_bytes,
            "header block never terminated, discarding"
        );
        let keep = CONTENT_LENGTH.len() - 1;
        self.buffer.advance(buffered.saturating_sub(keep));
        self.resyncing = true;
        FrameError::MalformedFrame(format!(
            "header block exceeds {} bytes without terminator",
            self.config.max_header_bytes
        ))
    }
}

const HEADER_PREVIEW_BYTES: usize = 128;

fn header_preview(header: &[u8]) -> String {
    let end = header.len().min(HEADER_PREVIEW_BYTES);
    let mut preview = String::from_utf8_lossy(&header[..end]).into_owned();
    if header.len() > end {
        preview.push_str("...");
    }
    preview
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Draining iterator returned by [`FrameDecoder::messages`].
pub struct Messages<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Messages<'_> {
    type Item = Result<serde_json::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.try_take_message().transpose()
    }
}

//! Outbound framing: `Content-Length: N\r\n\r\n{json}`.

use std::io::Write;

use bytes::{BufMut, BytesMut};
use serde::Serialize;

use crate::error::{FrameError, Result};
use crate::lsp::headers::CONTENT_LENGTH;

/// Serializes messages into LSP wire frames.
///
/// Holds no state; one encoder can be shared by any number of writers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameEncoder;

impl FrameEncoder {
    pub fn new() -> Self {
        FrameEncoder
    }

    /// Encode one message into a complete frame.
    ///
    /// `Content-Length` is the UTF-8 byte length of the serialized body.
    pub fn encode<T: Serialize + ?Sized>(&self, message: &T) -> Result<Vec<u8>> {
        let (header, body) = frame_parts(message)?;

        let mut frame = Vec::with_capacity(header.len() + body.len());
        frame.extend_from_slice(header.as_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Append one frame to `dst`. On error `dst` is left untouched.
    pub fn encode_into<T: Serialize + ?Sized>(&self, message: &T, dst: &mut BytesMut) -> Result<()> {
        let (header, body) = frame_parts(message)?;

        dst.reserve(header.len() + body.len());
        dst.put_slice(header.as_bytes());
        dst.put_slice(&body);
        Ok(())
    }

    /// Encode one message and write it to a caller-supplied sink.
    pub fn write_frame<W, T>(&self, sink: &mut W, message: &T) -> Result<()>
    where
        W: Write + ?Sized,
        T: Serialize + ?Sized,
    {
        let frame = self.encode(message)?;
        sink.write_all(&frame)?;
        sink.flush()?;
        Ok(())
    }
}

fn frame_parts<T: Serialize + ?Sized>(message: &T) -> Result<(String, Vec<u8>)> {
    let body = serde_json::to_vec(message).map_err(FrameError::Serialization)?;
    let header = format!("{CONTENT_LENGTH}: {}\r\n\r\n", body.len());
    Ok((header, body))
}

/// Encode one message with a default [`FrameEncoder`].
pub fn encode<T: Serialize + ?Sized>(message: &T) -> Result<Vec<u8>> {
    FrameEncoder::new().encode(message)
}

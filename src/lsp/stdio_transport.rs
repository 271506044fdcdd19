// async byte-stream transport driving the sans-io encoder and decoder
use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Stdin, Stdout};
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::lsp::decoder::{DecoderConfig, FrameDecoder};
use crate::lsp::encoder::FrameEncoder;
use crate::lsp::transport::LspTransport;

const READ_CHUNK: usize = 8 * 1024;

/// Framed messages over any async reader/writer pair.
pub struct FramedStream<R, W> {
    reader: R,
    writer: W,
    encoder: FrameEncoder,
    decoder: FrameDecoder,
    read_buf: Vec<u8>,
    write_buf: BytesMut,
}

/// Framed messages over the process's own stdin/stdout.
pub type StdioTransport = FramedStream<Stdin, Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        FramedStream::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> FramedStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, DecoderConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: DecoderConfig) -> Self {
        FramedStream {
            reader,
            writer,
            encoder: FrameEncoder::new(),
            decoder: FrameDecoder::with_config(config),
            read_buf: vec![0u8; READ_CHUNK],
            write_buf: BytesMut::new(),
        }
    }

    /// Read until one message is decoded.
    ///
    /// `Ok(None)` means the reader hit EOF between frames.
    async fn read_message(&mut self) -> Result<Option<serde_json::Value>> {
        loop {
            if let Some(message) = self.decoder.try_take_message()? {
                return Ok(Some(message));
            }

            let n = self.reader.read(&mut self.read_buf).await?;
            if n == 0 {
                if !self.decoder.has_partial_frame() {
                    let leftover = self.decoder.buffered_len();
                    if leftover > 0 {
                        debug!(leftover, "dropping bytes left over from resynchronization");
                    }
                    self.decoder.clear();
                    debug!("stream closed");
                    return Ok(None);
                }
                let buffered = self.decoder.buffered_len();
                // a truncated frame can never complete; start clean if read again
                self.decoder.clear();
                return Err(FrameError::UnexpectedEof { buffered });
            }
            self.decoder.feed(&self.read_buf[..n]);
        }
    }

    async fn write_message(&mut self, message: &serde_json::Value) -> Result<()> {
        self.write_buf.clear();
        self.encoder.encode_into(message, &mut self.write_buf)?;
        self.writer.write_all(&self.write_buf).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[async_trait]
impl<R, W> LspTransport for FramedStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &serde_json::Value) -> Result<()> {
        self.write_message(message).await
    }

    async fn recv(&mut self) -> Result<Option<serde_json::Value>> {
        self.read_message().await
    }
}

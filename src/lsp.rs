//! LSP base-protocol framing.
//!
//! The codec itself ([`FrameEncoder`], [`FrameDecoder`]) is pure and does no
//! I/O. [`stdio_transport`] drives it over async streams and [`types`] plus
//! [`message_parser`] give decoded values a JSON-RPC shape when wanted.

pub mod decoder;
pub mod encoder;
mod headers;
pub mod message_creator;
pub mod message_parser;
pub mod stdio_transport;
pub mod transport;
pub mod types;

pub use decoder::{DecoderConfig, FrameDecoder, Messages};
pub use encoder::{encode, FrameEncoder};
pub use message_creator::MessageFactory;
pub use message_parser::classify;
pub use stdio_transport::{FramedStream, StdioTransport};
pub use transport::LspTransport;
pub use types::{Message, Notification, Request, RequestId, ResponseError, ResponseMessage, SendMessage};

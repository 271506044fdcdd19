//! Content-Length framing for Language Server Protocol streams.
//!
//! ```
//! use lsp_framing::lsp::{FrameDecoder, FrameEncoder};
//!
//! let encoder = FrameEncoder::new();
//! let mut decoder = FrameDecoder::new();
//!
//! let request = serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "shutdown"});
//! decoder.feed(&encoder.encode(&request).unwrap());
//!
//! assert_eq!(decoder.try_take_message().unwrap(), Some(request));
//! ```

pub mod error;
pub mod lsp;

pub use error::{FrameError, Result};

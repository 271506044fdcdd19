//! Header block scanning and `Content-Length` parsing.

use crate::error::{FrameError, Result};

pub(crate) const CONTENT_LENGTH: &str = "Content-Length";

/// Location of a complete header block inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderEnd {
    /// Bytes of header lines, excluding the terminating blank line.
    pub header_len: usize,
    /// Length of the terminator itself (`\r\n\r\n` or `\n\n`).
    pub terminator_len: usize,
}

impl HeaderEnd {
    pub fn total_len(&self) -> usize {
        self.header_len + self.terminator_len
    }
}

/// Find the first blank line ending a header block.
///
/// Accepts the protocol's `\r\n\r\n` as well as a bare `\n\n`.
pub(crate) fn find_header_end(buf: &[u8]) -> Option<HeaderEnd> {
    for i in 0..buf.len() {
        let rest = &buf[i..];
        if rest.starts_with(b"\r\n\r\n") {
            return Some(HeaderEnd {
                header_len: i,
                terminator_len: 4,
            });
        }
        if rest.starts_with(b"\n\n") {
            return Some(HeaderEnd {
                header_len: i,
                terminator_len: 2,
            });
        }
    }
    None
}

/// Number of leading blank lines (`\r\n` or `\n`) at the start of `buf`.
pub(crate) fn leading_blank_lines(buf: &[u8]) -> usize {
    let mut skip = 0;
    loop {
        let rest = &buf[skip..];
        if rest.starts_with(b"\r\n") {
            skip += 2;
        } else if rest.starts_with(b"\n") {
            skip += 1;
        } else {
            return skip;
        }
    }
}

/// Position of a `Content-Length` header name (any case) inside `buf`.
pub(crate) fn find_content_length_key(buf: &[u8]) -> Option<usize> {
    let key = CONTENT_LENGTH.as_bytes();
    buf.windows(key.len())
        .position(|window| window.eq_ignore_ascii_case(key))
}

/// Extract `Content-Length` from a header block (terminator excluded).
///
/// Keys are matched case-insensitively and unknown headers are ignored.
/// Repeated `Content-Length` headers must agree.
pub(crate) fn parse_content_length(header: &[u8]) -> Result<usize> {
    let header = std::str::from_utf8(header)
        .map_err(|_| FrameError::MalformedFrame("header block is not valid UTF-8".into()))?;

    let mut content_length: Option<usize> = None;
    for line in header.split('\n') {
        let line = line.trim_end_matches('\r');
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            continue;
        }

        let value = value.trim();
        // `usize::from_str` accepts a leading '+', the protocol does not
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FrameError::MalformedFrame(format!(
                "invalid Content-Length value {value:?}"
            )));
        }
        let parsed: usize = value.parse().map_err(|_| {
            FrameError::MalformedFrame(format!("Content-Length value {value} out of range"))
        })?;

        match content_length {
            Some(previous) if previous != parsed => {
                return Err(FrameError::MalformedFrame(format!(
                    "conflicting Content-Length headers {previous} and {parsed}"
                )));
            }
            _ => content_length = Some(parsed),
        }
    }

    content_length.ok_or_else(|| FrameError::MalformedFrame("missing Content-Length header".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_crlf_terminator() {
        let buf = b"Content-Length: 2\r\n\r\n{}";
        let end = find_header_end(buf).unwrap();
        assert_eq!(end.header_len, 17);
        assert_eq!(end.terminator_len, 4);
        assert_eq!(&buf[end.total_len()..], b"{}");
    }

    #[test]
    fn test_find_bare_lf_terminator() {
        let buf = b"Content-Length: 2\n\n{}";
        let end = find_header_end(buf).unwrap();
        assert_eq!(end.header_len, 17);
        assert_eq!(end.terminator_len, 2);
    }

    #[test]
    fn test_partial_terminator_not_found() {
        assert!(find_header_end(b"Content-Length: 2\r\n\r").is_none());
        assert!(find_header_end(b"").is_none());
    }

    #[test]
    fn test_leading_blank_lines() {
        assert_eq!(leading_blank_lines(b"\r\n\nContent"), 3);
        assert_eq!(leading_blank_lines(b"Content"), 0);
        // a lone '\r' may still become "\r\n"
        assert_eq!(leading_blank_lines(b"\r"), 0);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(parse_content_length(b"content-length: 42").unwrap(), 42);
        assert_eq!(parse_content_length(b"CONTENT-LENGTH:7").unwrap(), 7);
    }

    #[test]
    fn test_parse_ignores_other_headers() {
        let header = b"Content-Type: application/vscode-jsonrpc; charset=utf-8\r\nContent-Length: 5";
        assert_eq!(parse_content_length(header).unwrap(), 5);
    }

    #[test]
    fn test_parse_missing_content_length() {
        let err = parse_content_length(b"Foo: bar").unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame(_)));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        for header in [
            &b"Content-Length: abc"[..],
            b"Content-Length: -1",
            b"Content-Length: +1",
            b"Content-Length: ",
            b"Content-Length: 99999999999999999999999999",
        ] {
            assert!(
                matches!(parse_content_length(header), Err(FrameError::MalformedFrame(_))),
                "{:?}",
                String::from_utf8_lossy(header)
            );
        }
    }

    #[test]
    fn test_parse_duplicate_headers() {
        assert_eq!(
            parse_content_length(b"Content-Length: 3\r\ncontent-length: 3").unwrap(),
            3
        );
        assert!(parse_content_length(b"Content-Length: 3\r\nContent-Length: 4").is_err());
    }

    #[test]
    fn test_find_content_length_key() {
        assert_eq!(find_content_length_key(b"{}content-LENGTH: 1"), Some(2));
        assert_eq!(find_content_length_key(b"garbage"), None);
    }
}

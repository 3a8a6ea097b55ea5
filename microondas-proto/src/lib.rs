//! Smart Microondas wire protocol - text commands over a write/notify pair
//!
//! Inbound writes are decoded into a [`Request`], answered with a
//! [`Response`], and the response is encoded back into a notification
//! payload. Both directions are bounded by the transport's frame limit.

pub mod ble;

pub use ble::{MAX_FRAME_LEN, commands};

/// Errors that stop an inbound message from being dispatched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("message was truncated to the frame limit")]
    Truncated,
    #[error("message is empty")]
    Empty,
    #[error("message is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
}

/// Errors from encoding a response into a notification payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The encoded body did not fit; `truncated` holds the first `max` bytes
    #[error("payload of {len} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge {
        len: usize,
        max: usize,
        truncated: Vec<u8>,
    },
}

impl EncodeError {
    /// The bytes that still fit in one frame
    pub fn into_truncated(self) -> Vec<u8> {
        match self {
            EncodeError::PayloadTooLarge { truncated, .. } => truncated,
        }
    }
}

/// One inbound write, already cut to the frame limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub bytes: Vec<u8>,
    /// Set when the transport delivered more than `max` bytes
    pub truncated: bool,
}

impl RawMessage {
    /// Copy at most `max` bytes of `data`, flagging anything that was cut
    pub fn bounded(data: &[u8], max: usize) -> Self {
        let truncated = data.len() > max;
        let len = data.len().min(max);
        Self {
            bytes: data[..len].to_vec(),
            truncated,
        }
    }

    pub fn parse(&self) -> Result<Request, ParseError> {
        parse(&self.bytes, self.truncated)
    }
}

/// Parsed inbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Exactly `PING`
    Ping,
    /// Any other text, carried unchanged
    Other(String),
}

impl Request {
    pub fn verb(&self) -> &'static str {
        match self {
            Request::Ping => commands::PING,
            Request::Other(_) => "OTHER",
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Request::Ping => None,
            Request::Other(text) => Some(text),
        }
    }
}

/// Reply to a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub body: String,
}

impl Response {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn pong() -> Self {
        Self::new(commands::PONG)
    }

    /// `OK:` followed by the original text
    pub fn echo(text: &str) -> Self {
        let mut body = String::with_capacity(commands::OK_PREFIX.len() + text.len());
        body.push_str(commands::OK_PREFIX);
        body.push_str(text);
        Self { body }
    }
}

/// Decode an inbound write into a request
///
/// Verbs match case-sensitively and exactly; anything that is not a known
/// verb becomes [`Request::Other`] with the whole text as payload.
pub fn parse(bytes: &[u8], truncated: bool) -> Result<Request, ParseError> {
    if truncated {
        return Err(ParseError::Truncated);
    }
    if bytes.is_empty() {
        return Err(ParseError::Empty);
    }

    let text = std::str::from_utf8(bytes)?;
    Ok(match text {
        commands::PING => Request::Ping,
        other => Request::Other(other.to_string()),
    })
}

/// Encode a response body for one notification
///
/// An oversized body is reported as [`EncodeError::PayloadTooLarge`], which
/// still carries the first `max` bytes so the caller can send them.
pub fn encode(response: &Response, max: usize) -> Result<Vec<u8>, EncodeError> {
    let bytes = response.body.as_bytes();
    if bytes.len() > max {
        return Err(EncodeError::PayloadTooLarge {
            len: bytes.len(),
            max,
            truncated: bytes[..max].to_vec(),
        });
    }
    Ok(bytes.to_vec())
}

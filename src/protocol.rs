//! Wire codec for the request/response text protocol.
//!
//! Requests are ASCII text frames of the form `<request_type>:<payload>`,
//! terminated by `\n`. Responses are raw bytes followed by a single NUL
//! terminator; the terminator counts toward the response length on the wire.

use bytes::Bytes;

/// One parsed request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Request type: the text before the first `:`.
    pub request_type: String,
    /// Payload: the text after the first `:`, empty when absent.
    pub payload: String,
}

impl Frame {
    /// Build a frame from one complete segment (terminator excluded).
    fn from_segment(segment: &[u8]) -> Self {
        let text = String::from_utf8_lossy(segment);
        match text.split_once(':') {
            Some((request_type, payload)) => Frame {
                request_type: request_type.to_string(),
                payload: payload.to_string(),
            },
            None => Frame {
                request_type: text.into_owned(),
                payload: String::new(),
            },
        }
    }
}

/// An encoded response ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    bytes: Bytes,
}

impl Response {
    /// The bytes to put on the wire, terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared length; every byte of it must reach the socket.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Parse complete frames out of `buffer`.
///
/// Returns the frames plus the number of bytes consumed (one past the last
/// `\n`). The caller advances its accumulation buffer by that count, so any
/// bytes after the last `\n` remain buffered for the next read. A frame is
/// never produced from a segment that has not yet seen its `\n`.
pub fn parse(buffer: &[u8]) -> (Vec<Frame>, usize) {
    let mut frames = Vec::new();
    let mut consumed = 0;

    while let Some(pos) = find_newline(&buffer[consumed..]) {
        frames.push(Frame::from_segment(&buffer[consumed..consumed + pos]));
        consumed += pos + 1;
    }

    (frames, consumed)
}

/// Encode a response: the message bytes plus the trailing NUL terminator.
pub fn encode(message: &str) -> Response {
    let mut bytes = Vec::with_capacity(message.len() + 1);
    bytes.extend_from_slice(message.as_bytes());
    bytes.push(0);
    Response {
        bytes: Bytes::from(bytes),
    }
}

/// Find `\n` in buffer, returning its position.
fn find_newline(buffer: &[u8]) -> Option<usize> {
    buffer.iter().position(|&b| b == b'\n')
}

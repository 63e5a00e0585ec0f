//! Protocol peer: connects to a server, sends the canonical request
//! sequence, and collects the responses.
//!
//! Responses carry no framing beyond a trailing NUL per response, so the
//! peer reads until EOF and splits the received buffer on the terminator.

use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Requests sent by the client, in order.
const REQUESTS: &[&str] = &["GET_HELLO:", "SEND_MESSAGE:Hello, server!"];

/// Connect, send the request sequence, and read responses until EOF.
///
/// The write side is half-closed after the last request so the server sees
/// EOF and finishes the connection. Only requests that call for a response
/// produce one, so the returned list can be shorter than the request list.
pub async fn run(host: &str, port: u16) -> io::Result<Vec<String>> {
    let mut stream = TcpStream::connect((host, port)).await?;
    debug!(host, port, "Connected");

    for request in REQUESTS {
        stream.write_all(request.as_bytes()).await?;
        stream.write_all(b"\n").await?;
    }
    stream.shutdown().await?;

    let mut received = Vec::new();
    stream.read_to_end(&mut received).await?;
    debug!(bytes = received.len(), "Server closed connection");

    Ok(split_responses(&received))
}

/// Split the received byte stream on NUL terminators.
fn split_responses(received: &[u8]) -> Vec<String> {
    received
        .split(|&b| b == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_response() {
        assert_eq!(split_responses(b"Hello client!\0"), vec!["Hello client!"]);
    }

    #[test]
    fn test_split_multiple_responses() {
        assert_eq!(split_responses(b"one\0two\0"), vec!["one", "two"]);
    }

    #[test]
    fn test_split_empty_stream() {
        assert!(split_responses(b"").is_empty());
    }

    #[test]
    fn test_split_ignores_trailing_terminator() {
        // No empty string for the bytes after the final NUL.
        assert_eq!(split_responses(b"only\0"), vec!["only"]);
    }
}

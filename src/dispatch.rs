//! Request dispatch: maps one parsed frame to a behavior.
//!
//! Pure with respect to I/O: produces at most one response and one log
//! event, touches no socket or file. The worker is responsible for writing
//! the response and forwarding the event to the sink.

use crate::logging::LogEvent;
use crate::protocol::{self, Frame, Response};

/// Greeting returned for `GET_HELLO`.
const HELLO_MESSAGE: &str = "Hello client!";

/// What a single frame asks the worker to do.
#[derive(Debug)]
pub struct Outcome {
    /// Response to write back, if the request calls for one.
    pub response: Option<Response>,
    /// Event for the log sink, if the request calls for one.
    pub log: Option<LogEvent>,
}

/// Dispatch one frame.
///
/// `GET_HELLO` replies with the greeting and logs nothing. `SEND_MESSAGE`
/// records its payload as an INFO event and stays silent on the wire. Any
/// other request type, the empty string included, produces a WARNING
/// naming the type; the connection is not penalized.
pub fn dispatch(frame: &Frame) -> Outcome {
    match frame.request_type.as_str() {
        "GET_HELLO" => Outcome {
            response: Some(protocol::encode(HELLO_MESSAGE)),
            log: None,
        },
        "SEND_MESSAGE" => Outcome {
            response: None,
            log: Some(LogEvent::info(format!(
                "Message from client: {}",
                frame.payload
            ))),
        },
        other => Outcome {
            response: None,
            log: Some(LogEvent::warning(format!(
                "Unknown request type: \"{}\"",
                other
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Level;

    fn frame(request_type: &str, payload: &str) -> Frame {
        Frame {
            request_type: request_type.to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn test_get_hello_responds_with_greeting() {
        let outcome = dispatch(&frame("GET_HELLO", ""));

        let response = outcome.response.expect("GET_HELLO must respond");
        assert_eq!(response.as_bytes(), b"Hello client!\0");
        assert!(outcome.log.is_none());
    }

    #[test]
    fn test_get_hello_ignores_payload() {
        let outcome = dispatch(&frame("GET_HELLO", "ignored"));
        assert_eq!(
            outcome.response.expect("must respond").as_bytes(),
            b"Hello client!\0"
        );
    }

    #[test]
    fn test_send_message_logs_payload_at_info() {
        let outcome = dispatch(&frame("SEND_MESSAGE", "x"));

        assert!(outcome.response.is_none());
        let event = outcome.log.expect("SEND_MESSAGE must log");
        assert_eq!(event.level, Level::Info);
        assert!(event.message.contains("x"));
    }

    #[test]
    fn test_unknown_type_warns_and_names_it() {
        let outcome = dispatch(&frame("BOGUS", "z"));

        assert!(outcome.response.is_none());
        let event = outcome.log.expect("unknown type must log");
        assert_eq!(event.level, Level::Warning);
        assert!(event.message.contains("BOGUS"));
    }

    #[test]
    fn test_empty_type_is_unknown_not_dropped() {
        let outcome = dispatch(&frame("", ""));

        assert!(outcome.response.is_none());
        let event = outcome.log.expect("empty type must log");
        assert_eq!(event.level, Level::Warning);
    }
}

//! parley: a minimal concurrent TCP request/response server and client.
//!
//! The server speaks a line-oriented text protocol: requests are
//! `<request_type>:<payload>` terminated by `\n`, responses are raw bytes
//! with a trailing NUL terminator. Two request types are recognized:
//! `GET_HELLO` (replies with a greeting) and `SEND_MESSAGE` (records the
//! payload in an append-only protocol log).
//!
//! Module map:
//! - [`protocol`]: wire codec for frames and responses
//! - [`dispatch`]: pure request-to-behavior mapping
//! - [`logging`]: protocol log events and the file sink
//! - [`server`]: accept loop and per-connection workers
//! - [`shutdown`]: signal-driven shutdown state machine
//! - [`client`]: the protocol's peer
//! - [`config`]: CLI arguments and JSON config file

pub mod client;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod shutdown;

//! TCP server core: accept loop and per-connection workers.
//!
//! One task per accepted connection, spawned detached. A single mutex over
//! the log sink serializes every connection's dispatch-and-log phase;
//! socket reads and writes happen outside it, so two connections only ever
//! contend on the critical section itself.

use crate::config::ServerConfig;
use crate::dispatch;
use crate::logging::{LogEvent, LogSink};
use crate::protocol;
use crate::shutdown::Shutdown;
use bytes::{Buf, BytesMut};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Read buffer size
const BUFFER_SIZE: usize = 4 * 1024;

/// State shared between the accept loop and every worker.
///
/// The log sink doubles as the critical section: holding its lock is what
/// serializes dispatch-and-log across connections.
pub struct ServerContext {
    critical: Mutex<LogSink>,
    shutdown: Arc<Shutdown>,
}

/// Server instance: a bound listener plus the shared context.
///
/// Instances are self-contained, so a process can run several independent
/// servers (the integration tests do).
pub struct Server {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl Server {
    /// Open the log sink and bind the listening socket.
    ///
    /// Failures here are setup errors: the caller reports them and exits
    /// before any connection is accepted.
    pub async fn bind(config: &ServerConfig, shutdown: Arc<Shutdown>) -> io::Result<Server> {
        let sink = LogSink::open(&config.log_file_path)?;
        let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
        info!(address = %listener.local_addr()?, "Server listening");

        Ok(Server {
            listener,
            context: Arc::new(ServerContext {
                critical: Mutex::new(sink),
                shutdown,
            }),
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown is requested.
    ///
    /// Each accepted connection gets its own detached worker; worker
    /// failures never reach this loop. Accept errors are fatal to the
    /// loop. Once shutdown is observed the listener is dropped, the log
    /// sink is flushed and closed, and the controller moves to its
    /// terminal phase. In-flight workers are not drained.
    pub async fn run(self) -> io::Result<()> {
        let Server { listener, context } = self;

        loop {
            tokio::select! {
                () = context.shutdown.wait() => break,
                accepted = listener.accept() => {
                    let (stream, addr) = accepted?;
                    debug!(peer = %addr, "New connection");

                    let context = Arc::clone(&context);
                    tokio::spawn(async move {
                        let report = handle_connection(stream, &context).await;
                        finish_connection(addr, report, &context).await;
                    });
                }
            }
        }

        drop(listener);
        {
            let mut sink = context.critical.lock().await;
            if let Err(e) = sink.close() {
                warn!(error = %e, "Failed to close log sink");
            }
        }
        context.shutdown.complete();
        info!("Server stopped");

        Ok(())
    }
}

/// What a worker hands back when its connection ends.
#[derive(Debug)]
pub struct ConnReport {
    /// Total bytes read from the peer.
    pub bytes_processed: u64,
    /// Time from accept to close.
    pub elapsed: Duration,
    /// The error that ended the connection, if it did not end at EOF.
    pub error: Option<io::Error>,
}

/// Run one connection to completion.
///
/// Reads into a growing buffer until EOF or an unrecoverable I/O error.
/// Complete frames are dispatched one at a time: dispatch and the log
/// append happen under the critical section, the response write after the
/// lock is released. A short or failed write is fatal to this connection
/// only; the stream is dropped and the failure reported upward.
async fn handle_connection(mut stream: TcpStream, context: &ServerContext) -> ConnReport {
    let started = Instant::now();
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);
    let mut bytes_processed: u64 = 0;

    let error = loop {
        match stream.read_buf(&mut buffer).await {
            Ok(0) => break None, // peer closed
            Ok(n) => bytes_processed += n as u64,
            Err(e) => break Some(e),
        }

        let (frames, consumed) = protocol::parse(&buffer);

        let mut write_error = None;
        for frame in &frames {
            let outcome = {
                let mut sink = context.critical.lock().await;
                let outcome = dispatch::dispatch(frame);
                if let Some(event) = &outcome.log {
                    if let Err(e) = sink.append(event) {
                        warn!(error = %e, "Failed to append log event");
                    }
                }
                outcome
            };

            if let Some(response) = outcome.response {
                if let Err(e) = stream.write_all(response.as_bytes()).await {
                    write_error = Some(e);
                    break;
                }
            }
        }
        buffer.advance(consumed);

        if let Some(e) = write_error {
            break Some(e);
        }
    };

    ConnReport {
        bytes_processed,
        elapsed: started.elapsed(),
        error,
    }
}

/// Record a finished connection: tracing for the operator, an event for
/// the protocol log.
async fn finish_connection(addr: SocketAddr, report: ConnReport, context: &ServerContext) {
    let elapsed_ms = report.elapsed.as_millis() as u64;

    let event = match &report.error {
        None => {
            debug!(
                peer = %addr,
                bytes = report.bytes_processed,
                elapsed_ms,
                "Connection closed"
            );
            LogEvent::debug(format!(
                "Connection from {} closed: {} bytes in {} ms",
                addr, report.bytes_processed, elapsed_ms
            ))
        }
        Some(e) => {
            warn!(
                peer = %addr,
                bytes = report.bytes_processed,
                error = %e,
                "Connection failed"
            );
            LogEvent::error(format!(
                "Connection from {} failed after {} bytes: {}",
                addr, report.bytes_processed, e
            ))
        }
    };

    let mut sink = context.critical.lock().await;
    if let Err(e) = sink.append(&event) {
        warn!(error = %e, "Failed to append log event");
    }
}

//! GazeFlow session client.
//!
//! The client is an explicit state machine that owns the TCP stream for one
//! connection:
//!
//! ```text
//! Disconnected ──▶ Connecting ──▶ Handshaking ──▶ Streaming
//!       ▲               │               │              │
//!       └───────────────┴───────────────┴──────────────┘
//!                   (failure, loss or disconnect)
//! ```
//!
//! The stream is released on every path back to `Disconnected`, including
//! drop. A [`ShutdownHandle`] lets another thread abort a blocked read.

use crate::error::{ConnectionError, Error, ProtocolError, Result, SampleError, StateError};
use crate::protocol::codec::{
    decode_length_prefixed_bytes, decode_length_prefixed_string, encode_length_prefixed_string,
};
use crate::protocol::sample::{parse_sample, GazeSample};
use crate::protocol::RESULT_FORMAT;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    Handshaking,
    Streaming,
}

/// Transport settings applied to each connection.
///
/// Both timeouts default to `None` (block until the peer acts). A read
/// timeout that fires while streaming is reported as a lost connection.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

type SharedStream = Arc<Mutex<Option<TcpStream>>>;

/// Handle that can shut the client's stream down from another thread.
///
/// Shutting down makes any read blocked on the stream return promptly; the
/// client then reports `ConnectionLost` and moves to `Disconnected`.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    stream: SharedStream,
}

impl ShutdownHandle {
    /// Shut the current stream down, if any. Errors are ignored.
    pub fn shutdown(&self) {
        let guard = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stream) = guard.as_ref() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// Client for one GazeFlow connection.
pub struct GazeSessionClient {
    config: ClientConfig,
    state: ClientState,
    stream: Option<TcpStream>,
    shared: SharedStream,
}

impl GazeSessionClient {
    /// Create a disconnected client.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: ClientState::Disconnected,
            stream: None,
            shared: Arc::new(Mutex::new(None)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Whether samples can be received.
    pub fn is_connected(&self) -> bool {
        self.state == ClientState::Streaming
    }

    /// Address of the tracker, while a stream is held.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    /// Get a handle for aborting blocked reads from another thread.
    ///
    /// The handle stays valid across reconnects.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            stream: Arc::clone(&self.shared),
        }
    }

    /// Open a connection and perform the handshake.
    ///
    /// Handshake failures are terminal for this attempt and are never
    /// retried here.
    pub fn connect(&mut self, host: &str, port: u16, app_key: &str) -> Result<()> {
        if self.state != ClientState::Disconnected {
            return Err(StateError::AlreadyConnected.into());
        }

        self.state = ClientState::Connecting;
        let stream = match self.open_stream(host, port) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Could not reach tracker at {host}:{port}: {e}");
                self.release();
                return Err(e.into());
            }
        };
        self.attach(stream);

        self.state = ClientState::Handshaking;
        let response = match self.handshake(app_key) {
            Ok(response) => response,
            Err(e) => {
                warn!("Handshake with {host}:{port} failed: {e}");
                self.release();
                return Err(e.into());
            }
        };

        if response.starts_with("ok") {
            info!("Connected to tracker at {host}:{port} ({response})");
            self.state = ClientState::Streaming;
            Ok(())
        } else {
            warn!("Tracker rejected connection: {response}");
            self.release();
            Err(ConnectionError::ConnectionRejected { reason: response }.into())
        }
    }

    /// Block until the next sample arrives.
    ///
    /// `MalformedSample` leaves the client streaming; `ConnectionLost`
    /// means the stream has been released.
    pub fn receive_sample(&mut self) -> Result<GazeSample> {
        if self.state != ClientState::Streaming {
            return Err(StateError::NotConnected.into());
        }
        let Some(stream) = self.stream.as_mut() else {
            self.state = ClientState::Disconnected;
            return Err(StateError::NotConnected.into());
        };

        let payload = match decode_length_prefixed_bytes(stream) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Stream failure while streaming: {e}");
                self.release();
                return Err(ConnectionError::ConnectionLost.into());
            }
        };

        if payload.is_empty() {
            info!("Received empty payload, treating as disconnect");
            self.release();
            return Err(ConnectionError::ConnectionLost.into());
        }

        let text = String::from_utf8(payload).map_err(|e| {
            Error::from(SampleError::MalformedSample {
                reason: format!("payload is not UTF-8: {e}"),
            })
        })?;

        let sample = parse_sample(&text).map_err(|e| {
            debug!("Problematic payload: {text:?}");
            Error::from(e)
        })?;
        debug!(x = sample.x, y = sample.y, "gaze sample");
        Ok(sample)
    }

    /// Release the stream and return to `Disconnected`. Safe to call in any
    /// state, any number of times.
    pub fn disconnect(&mut self) {
        self.release();
    }

    fn open_stream(&self, host: &str, port: u16) -> std::result::Result<TcpStream, ProtocolError> {
        let stream = match self.config.connect_timeout {
            Some(timeout) => {
                let mut last_err = None;
                let mut connected = None;
                for addr in (host, port).to_socket_addrs()? {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(stream) => {
                            connected = Some(stream);
                            break;
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                match (connected, last_err) {
                    (Some(stream), _) => stream,
                    (None, Some(e)) => return Err(e.into()),
                    (None, None) => {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            format!("no addresses for {host}"),
                        )
                        .into())
                    }
                }
            }
            None => TcpStream::connect((host, port))?,
        };
        stream.set_read_timeout(self.config.read_timeout)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn attach(&mut self, stream: TcpStream) {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        match stream.try_clone() {
            Ok(clone) => *shared = Some(clone),
            Err(e) => warn!("Could not clone stream for shutdown handle: {e}"),
        }
        self.stream = Some(stream);
    }

    fn handshake(&mut self, app_key: &str) -> std::result::Result<String, ProtocolError> {
        let stream = self.stream.as_mut().ok_or(ProtocolError::StreamClosed)?;
        stream.write_all(RESULT_FORMAT)?;
        stream.write_all(&encode_length_prefixed_string(app_key))?;
        stream.flush()?;
        decode_length_prefixed_string(stream)
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            info!("Disconnected from tracker");
        }
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        *shared = None;
        self.state = ClientState::Disconnected;
    }
}

impl Default for GazeSessionClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Drop for GazeSessionClient {
    fn drop(&mut self) {
        self.release();
    }
}

//! CdpTransport trait and the blocking websocket implementation.

use std::net::TcpStream;
use std::time::{Duration, Instant};

use serde_json::Value;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::error::CdpError;
use crate::protocol::{Incoming, decode_incoming, encode_command};

/// How long one blocking socket read may wait before the deadline is rechecked.
const READ_SLICE: Duration = Duration::from_millis(250);

/// Issues CDP commands. Enables mock injection for testing.
pub trait CdpTransport: Send {
    fn call(&mut self, method: &str, params: Value, timeout: Duration) -> Result<Value, CdpError>;
}

impl<T: CdpTransport + ?Sized> CdpTransport for &mut T {
    fn call(&mut self, method: &str, params: Value, timeout: Duration) -> Result<Value, CdpError> {
        (**self).call(method, params, timeout)
    }
}

impl<T: CdpTransport + ?Sized> CdpTransport for Box<T> {
    fn call(&mut self, method: &str, params: Value, timeout: Duration) -> Result<Value, CdpError> {
        (**self).call(method, params, timeout)
    }
}

/// Synchronous websocket connection to one DevTools target.
///
/// Commands are strictly request/response: one in flight at a time, events
/// read while waiting are discarded.
pub struct WsTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

impl WsTransport {
    /// Only plain `ws://` endpoints are accepted: the read deadline relies on
    /// a timeout on the raw TCP stream.
    pub fn connect(ws_url: &str) -> Result<Self, CdpError> {
        let refused = |reason: &str| CdpError::Connect {
            url: ws_url.to_string(),
            reason: reason.to_string(),
        };
        if !ws_url.starts_with("ws://") {
            return Err(refused("only ws:// DevTools endpoints are supported"));
        }
        tracing::debug!(url = ws_url, "connecting to DevTools target");
        let (socket, _response) =
            tungstenite::connect(ws_url).map_err(|e| refused(&e.to_string()))?;
        match socket.get_ref() {
            MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(READ_SLICE))?,
            _ => return Err(refused("unexpected TLS stream on a ws:// endpoint")),
        }
        Ok(Self { socket, next_id: 1 })
    }

    fn send(&mut self, frame: String) -> Result<(), CdpError> {
        self.socket
            .send(Message::Text(frame.into()))
            .map_err(map_ws_error)
    }

    fn await_response(
        &mut self,
        id: u64,
        method: &str,
        timeout: Duration,
    ) -> Result<Value, CdpError> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(CdpError::Timeout {
                    method: method.to_string(),
                    duration: timeout,
                });
            }
            let msg = match self.socket.read() {
                Ok(msg) => msg,
                Err(tungstenite::Error::Io(e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(map_ws_error(e)),
            };
            let text = match msg {
                Message::Text(text) => text.to_string(),
                Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => text,
                    Err(_) => continue,
                },
                Message::Close(_) => return Err(CdpError::Closed),
                _ => continue,
            };
            match decode_incoming(&text)? {
                Incoming::Response { id: got, outcome } if got == id => {
                    return outcome.map_err(|err| CdpError::Command {
                        method: method.to_string(),
                        code: err.code,
                        message: err.message,
                    });
                }
                Incoming::Response { id: got, .. } => {
                    tracing::trace!(id = got, "dropping response for stale command");
                }
                Incoming::Event { method } => {
                    tracing::trace!(%method, "ignoring event");
                }
            }
        }
    }
}

fn map_ws_error(err: tungstenite::Error) -> CdpError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            CdpError::Closed
        }
        tungstenite::Error::Io(e) => CdpError::Io(e),
        other => CdpError::Protocol(other.to_string()),
    }
}

impl CdpTransport for WsTransport {
    fn call(&mut self, method: &str, params: Value, timeout: Duration) -> Result<Value, CdpError> {
        let id = self.next_id;
        self.next_id += 1;
        tracing::trace!(id, method, "sending CDP command");
        let frame = encode_command(id, method, &params)?;
        self.send(frame)?;
        self.await_response(id, method, timeout)
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}

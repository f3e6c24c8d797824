//! TCP transport
//!
//! A Select unit serves one control client at a time on its TCP port. The
//! driver opens a socket per conversation, so a connect that does not
//! complete in time usually means another client holds the channel and is
//! reported as [`Error::ConnectionTimeout`].
//!
//! Replies may arrive split across reads. [`TcpTransport::receive`] keeps
//! reading until the buffer ends with the frame tail `0xFF`; the unit never
//! sends that byte inside a reply body.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use selectpdu_core::constants::{DEFAULT_CONNECT_TIMEOUT_MS, TAIL};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Socket to one Select unit
pub struct TcpTransport {
    addr: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Transport for the unit at `addr:port`, not yet connected
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket_addr: None,
            stream: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    /// How long to wait for the unit to accept the socket
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Look the unit up once; later conversations reuse the address
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }

        let host = (self.addr.as_str(), self.port);
        let addr = tokio::net::lookup_host(host)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}:{}: {}", self.addr, self.port, e)))?
            .next()
            .ok_or_else(|| {
                Error::InvalidAddress(format!("{}:{} did not resolve", self.addr, self.port))
            })?;

        self.socket_addr = Some(addr);
        Ok(addr)
    }
}

/// Read until the buffer ends with the tail byte
async fn read_frame(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<()> {
    loop {
        let n = stream.read_buf(buf).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        if buf.last() == Some(&TAIL) {
            return Ok(());
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let addr = self.resolve_addr().await?;

        debug!("Opening control channel to {}", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                debug!("Unit at {} did not accept within {:?}", addr, self.connect_timeout);
                Error::ConnectionTimeout
            })?
            .map_err(Error::Io)?;

        // Frames are tiny request/response pairs
        stream.set_nodelay(true)?;

        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing control channel to {}", self.remote_addr());

            if let Err(e) = stream.shutdown().await {
                debug!("Socket shutdown failed: {}", e);
            }
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {}", data.len(), hex::encode(data));

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn receive(&mut self, timeout_duration: Duration) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let mut buf = BytesMut::with_capacity(256);

        timeout(timeout_duration, read_frame(stream, &mut buf))
            .await
            .map_err(|_| {
                warn!("Read timeout after {:?}", timeout_duration);
                Error::ReadTimeout
            })??;

        trace!("Received {} bytes: {}", buf.len(), hex::encode(&buf));

        Ok(buf)
    }

    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Control channel to {} dropped while open", self.remote_addr());
        }
    }
}

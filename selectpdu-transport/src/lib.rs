//! Transport layer for the Select protocol
//!
//! Provides TCP communication with units.

pub mod tcp;
pub mod error;

pub use error::{Error, Result};
pub use tcp::TcpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use selectpdu_core::ErrorReply;
use tracing::debug;

/// Transport trait for communicating with a unit
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to device
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from device
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive one reply frame (with timeout)
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Get remote address
    fn remote_addr(&self) -> String;

    /// Send a frame and wait for its reply
    ///
    /// A reply that is one of the unit's error frames fails the round-trip
    /// with [`Error::CommandFailed`].
    async fn request(&mut self, data: &[u8], timeout: Duration) -> Result<BytesMut> {
        self.send(data).await?;
        let reply = self.receive(timeout).await?;

        if let Some(error) = ErrorReply::match_frame(&reply) {
            debug!("Unit rejected command: {}", error);
            return Err(Error::CommandFailed(error));
        }

        Ok(reply)
    }
}

//! Transport errors

use std::io;

use selectpdu_core::ErrorReply;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection timed out")]
    ConnectionTimeout,

    #[error("Read timeout")]
    ReadTimeout,

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Command failed: {0}")]
    CommandFailed(ErrorReply),
}

impl Error {
    /// Check if the unit could not be reached in time (its single control channel is busy)
    pub fn is_connection_timeout(&self) -> bool {
        match self {
            Self::ConnectionTimeout => true,
            Self::Io(e) => e.kind() == io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

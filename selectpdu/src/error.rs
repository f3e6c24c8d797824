//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] selectpdu_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] selectpdu_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] selectpdu_types::Error),

    #[error("Login rejected by unit (code 0x{code:02X})")]
    LoginRejected { code: u8 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}

impl Error {
    /// Check if the session could not be established or was lost
    pub fn is_session_error(&self) -> bool {
        match self {
            Self::LoginRejected { .. } => true,
            Self::Core(e) => e.requires_reconnect(),
            Self::Transport(selectpdu_transport::Error::CommandFailed(reply)) => {
                *reply == selectpdu_core::ErrorReply::BadCredentials
                    || *reply == selectpdu_core::ErrorReply::AccessDenied
            }
            _ => false,
        }
    }

    /// Check if the unit refused the connection in time
    pub fn is_connection_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connection_timeout())
    }

    /// Check if the unit answered with something that could not be interpreted
    pub fn is_malformed_reply(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_malformed_reply())
    }
}

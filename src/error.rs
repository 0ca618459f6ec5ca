use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The remote call failed. `status` is `None` when no HTTP response arrived.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("{0}")]
    Decode(String),

    /// The client itself is misconfigured (service url, http client setup).
    #[error("{0}")]
    Config(String),

    /// Input rejected on the client before any remote call.
    #[error("{0}")]
    Validation(String),

    /// The owning view went away before the operation resolved.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

use thiserror::Error;

use cubedeck_core::GatewayError;

pub type Result<T> = std::result::Result<T, TerminalError>;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid log filter: {0}")]
    LogFilter(String),
}

//! Error types for the stream reducer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Observer error: {0}")]
    Observer(String),

    #[error("Channel send error")]
    ChannelClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

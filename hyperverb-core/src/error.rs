//! Error types for HyperVerb

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HyperVerbError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio loading error: {0}")]
    AudioLoading(String),
}

pub type Result<T> = std::result::Result<T, HyperVerbError>;

//! Error types for the VR subsystem

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VrError {
    #[error("VR initialization error: {0}")]
    Init(String),

    /// There is no degraded mode without a compositor; callers treat this
    /// as fatal.
    #[error("VR compositor unavailable")]
    CompositorUnavailable,

    #[error("Input binding error: {0}")]
    Input(String),

    #[error("Render model error: {0}")]
    Model(String),

    #[error("Render target error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VrError>;

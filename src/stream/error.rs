//! Typed failures surfaced by the stream core.
//!
//! None of these are retried internally; they go straight back to the caller.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamStartError {
    #[error("A stream is already running")]
    AlreadyRunning,

    #[error("Stream key must not be empty")]
    EmptyStreamKey,

    #[error("Encoder binary '{program}' not found")]
    EncoderNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("Failed to spawn encoder process: {0}")]
    Spawn(#[source] io::Error),

    #[error("Encoder process has no stdin pipe")]
    MissingStdin,
}

impl StreamStartError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "already_running",
            Self::EmptyStreamKey => "empty_stream_key",
            Self::EncoderNotFound { .. } => "encoder_not_found",
            Self::Spawn(_) => "spawn_failed",
            Self::MissingStdin => "missing_stdin",
        }
    }
}

#[derive(Debug, Error)]
pub enum StreamStopError {
    #[error("No stream is running")]
    NotRunning,

    #[error("Failed to terminate encoder process: {0}")]
    Terminate(#[source] io::Error),
}

impl StreamStopError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotRunning => "not_running",
            Self::Terminate(_) => "terminate_failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum ControlChannelError {
    #[error("Control channel is closed (no running stream)")]
    Closed,

    #[error("Stream has fewer than two audio sources, nothing to mix")]
    NoMixer,

    #[error("Mix weight {0} is outside [0.0, 1.0]")]
    InvalidWeight(f64),

    #[error("Failed to write control command: {0}")]
    Io(#[from] io::Error),
}

impl ControlChannelError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Closed => "channel_closed",
            Self::NoMixer => "no_mixer",
            Self::InvalidWeight(_) => "invalid_weight",
            Self::Io(_) => "channel_io",
        }
    }

    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

//! External encoder binary location.
//!
//! Both device listing and streaming shell out to the same encoder (ffmpeg by
//! default). `leading_args` are placed before any generated arguments, which
//! lets a wrapper launcher sit in front of the real binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use which::which;

pub const DEFAULT_ENCODER: &str = "ffmpeg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderProgram {
    pub command: String,
    pub leading_args: Vec<String>,
}

impl Default for EncoderProgram {
    fn default() -> Self {
        Self {
            command: DEFAULT_ENCODER.to_string(),
            leading_args: Vec::new(),
        }
    }
}

impl EncoderProgram {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Locate the binary on PATH (or verify an explicit path).
    pub fn resolve(&self) -> Result<PathBuf, which::Error> {
        which(&self.command)
    }

    /// Build a command for the resolved `program` with `args` after the leading args.
    pub fn command<I, S>(&self, program: &Path, args: I) -> tokio::process::Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(&self.leading_args).args(args);
        cmd
    }
}

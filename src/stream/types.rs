use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ControlChannelError;

/// A capture device name exactly as the OS reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Device(String);

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Device {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Device {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// What to stream: the destination key plus up to two audio sources.
///
/// Blank device names are treated as absent, so a presentation layer can pass
/// the text of an empty selector straight through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    stream_key: String,
    mic_device: Option<Device>,
    system_device: Option<Device>,
}

impl StreamConfig {
    pub fn new(stream_key: impl Into<String>) -> Self {
        Self {
            stream_key: stream_key.into(),
            mic_device: None,
            system_device: None,
        }
    }

    pub fn with_mic(mut self, device: Option<Device>) -> Self {
        self.mic_device = non_blank(device);
        self
    }

    pub fn with_system(mut self, device: Option<Device>) -> Self {
        self.system_device = non_blank(device);
        self
    }

    pub fn stream_key(&self) -> &str {
        &self.stream_key
    }

    pub fn mic_device(&self) -> Option<&Device> {
        self.mic_device.as_ref()
    }

    pub fn system_device(&self) -> Option<&Device> {
        self.system_device.as_ref()
    }

    pub fn audio_source_count(&self) -> usize {
        self.mic_device.iter().count() + self.system_device.iter().count()
    }

    /// Only a two-source stream has an `amix` filter to adjust.
    pub fn is_mixable(&self) -> bool {
        self.audio_source_count() == 2
    }
}

fn non_blank(device: Option<Device>) -> Option<Device> {
    device.filter(|d| !d.as_str().trim().is_empty())
}

/// Relative gains for the microphone and system sources, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MixWeights {
    mic: f64,
    system: f64,
}

impl MixWeights {
    pub fn new(mic: f64, system: f64) -> Result<Self, ControlChannelError> {
        for weight in [mic, system] {
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(ControlChannelError::InvalidWeight(weight));
            }
        }
        Ok(Self { mic, system })
    }

    pub fn mic(&self) -> f64 {
        self.mic
    }

    pub fn system(&self) -> f64 {
        self.system
    }
}

/// One message on the encoder's interactive stdin protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    SetMixWeights(MixWeights),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    NotStarted,
    Running,
    Stopped,
}

impl StreamPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamPhase::NotStarted => "not_started",
            StreamPhase::Running => "running",
            StreamPhase::Stopped => "stopped",
        }
    }
}

/// Snapshot of a started stream, handed back from `start`.
///
/// `args` has the stream key redacted so it is safe to log and expose.
#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub args: Vec<String>,
    pub audio_sources: usize,
}

impl StreamInfo {
    pub fn mixable(&self) -> bool {
        self.audio_sources == 2
    }

    pub fn uptime_seconds(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }
}

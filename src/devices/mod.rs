//! Audio capture device discovery.
//!
//! The encoder prints its DirectShow device list to stderr as diagnostic text:
//!
//! ```text
//! [dshow @ 0000020b] DirectShow video devices (some may be both video and audio devices)
//! [dshow @ 0000020b]  "Integrated Camera"
//! [dshow @ 0000020b]     Alternative name "@device_pnp_\\?\usb#vid_04f2"
//! [dshow @ 0000020b] DirectShow audio devices
//! [dshow @ 0000020b]  "Microphone (Realtek High Definition Audio)"
//! [dshow @ 0000020b]     Alternative name "@device_cm_{33D9A762-90C8-11D0-BD43-00A0C911CE86}\wave_{...}"
//! ```
//!
//! Only entries after the audio section marker count, and the alternative-name
//! aliases are dropped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use tracing::{debug, info};

use crate::encoder::EncoderProgram;
use crate::stream::{device_list_args, Device};

pub const AUDIO_SECTION_MARKER: &str = "DirectShow audio devices";
const DEVICE_LINE_TAG: &str = "dshow @";
const ALTERNATIVE_NAME_TAG: &str = "Alternative";

/// Source of capture device names. Alternate platform backends implement this.
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    /// Devices in the order the platform reports them. No devices is `Ok(vec![])`.
    async fn list_input_devices(&self) -> Result<Vec<Device>>;
}

pub struct DshowParser {
    quoted_name: Regex,
}

impl DshowParser {
    pub fn new() -> Result<Self> {
        // Trailing quoted field, e.g. `[dshow @ 0x1]  "Mic (USB)"`
        let quoted_name = Regex::new(r#""([^"]*)"\s*$"#)?;
        Ok(Self { quoted_name })
    }

    pub fn parse(&self, output: &str) -> Vec<Device> {
        let mut lines = output.lines();

        if !lines.any(|line| line.contains(AUDIO_SECTION_MARKER)) {
            debug!("No audio device section in device listing");
            return Vec::new();
        }

        lines
            .filter(|line| line.contains(DEVICE_LINE_TAG))
            .filter(|line| !line.contains(ALTERNATIVE_NAME_TAG))
            .filter_map(|line| self.quoted_name.captures(line.trim_end_matches('\r')))
            .filter_map(|caps| caps.get(1))
            .map(|name| name.as_str().trim())
            .filter(|name| !name.is_empty())
            .map(Device::from)
            .collect()
    }
}

/// Lists devices by running `<encoder> -list_devices true -f dshow -i dummy`.
pub struct DshowDeviceEnumerator {
    encoder: EncoderProgram,
    parser: DshowParser,
}

impl DshowDeviceEnumerator {
    pub fn new(encoder: EncoderProgram) -> Result<Self> {
        Ok(Self {
            encoder,
            parser: DshowParser::new()?,
        })
    }
}

#[async_trait]
impl DeviceEnumerator for DshowDeviceEnumerator {
    async fn list_input_devices(&self) -> Result<Vec<Device>> {
        let program = self
            .encoder
            .resolve()
            .with_context(|| format!("Encoder '{}' not found", self.encoder.command))?;

        // Exit status is always non-zero: "dummy" is not a real input.
        let output = self
            .encoder
            .command(&program, device_list_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to run encoder device listing")?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let devices = self.parser.parse(&stderr);

        info!("Found {} audio capture device(s)", devices.len());
        for device in &devices {
            debug!("Audio device: {}", device);
        }

        Ok(devices)
    }
}

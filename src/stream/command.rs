//! Encoder argument vector construction.
//!
//! ffmpeg options are positional (input options bind to the next `-i`), so
//! the order of every clause below matters.

use super::types::StreamConfig;

/// Fixed RTMP ingest; the stream key is appended as the final path segment.
pub const INGEST_URL: &str = "rtmp://global-live.mux.com:5222/app/";

/// Placeholder video track: the FLV muxer needs one, we never capture video.
const VIDEO_STUB: &[&str] = &[
    "-re",
    "-f",
    "lavfi",
    "-i",
    "color=size=640x480:rate=6:color=black",
];
const AUDIO_INPUT_FORMAT: &[&str] = &["-f", "dshow", "-i"];
const MIX_FILTER: &[&str] = &["-filter_complex", "amix=inputs=2:duration=longest"];
const AUDIO_ENCODING: &[&str] = &["-ac", "2", "-c:a", "aac", "-ar", "44100", "-b:a", "160k"];
const OUTPUT_FORMAT: &[&str] = &["-f", "flv"];

const DEVICE_LIST_ARGS: &[&str] = &["-list_devices", "true", "-f", "dshow", "-i", "dummy"];

const REDACTED: &str = "<stream-key>";

#[derive(Debug, Clone)]
pub struct StreamCommandBuilder {
    ingest_url: String,
}

impl Default for StreamCommandBuilder {
    fn default() -> Self {
        Self {
            ingest_url: INGEST_URL.to_string(),
        }
    }
}

impl StreamCommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destination(&self, stream_key: &str) -> String {
        format!("{}{}", self.ingest_url, stream_key)
    }

    /// Build the encoder arguments (program name excluded) for `config`.
    pub fn build(&self, config: &StreamConfig) -> Vec<String> {
        let mut args = to_owned(VIDEO_STUB);

        if let Some(mic) = config.mic_device() {
            args.extend(to_owned(AUDIO_INPUT_FORMAT));
            args.push(format!("audio={}", mic));
        }

        if let Some(system) = config.system_device() {
            args.extend(to_owned(AUDIO_INPUT_FORMAT));
            args.push(format!("audio={}", system));
        }

        if config.is_mixable() {
            args.extend(to_owned(MIX_FILTER));
        }

        args.extend(to_owned(AUDIO_ENCODING));
        args.extend(to_owned(OUTPUT_FORMAT));
        args.push(self.destination(config.stream_key()));

        args
    }

    /// Same as [`build`](Self::build) with the stream key masked, for logs and status output.
    pub fn build_redacted(&self, config: &StreamConfig) -> Vec<String> {
        let mut args = self.build(config);
        if let Some(last) = args.last_mut() {
            *last = self.destination(REDACTED);
        }
        args
    }
}

/// Arguments that make the encoder dump its DirectShow devices to stderr.
pub fn device_list_args() -> Vec<String> {
    to_owned(DEVICE_LIST_ARGS)
}

fn to_owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::types::Device;

    fn count_audio_inputs(args: &[String]) -> usize {
        args.windows(2)
            .filter(|w| w[0] == "-f" && w[1] == "dshow")
            .count()
    }

    fn has_mix_filter(args: &[String]) -> bool {
        args.iter().any(|a| a == "-filter_complex")
    }

    #[test]
    fn test_video_only_stream() {
        let args = StreamCommandBuilder::new().build(&StreamConfig::new("abc123"));

        assert_eq!(&args[..5], VIDEO_STUB);
        assert_eq!(count_audio_inputs(&args), 0);
        assert!(!has_mix_filter(&args));
        assert_eq!(args.last().unwrap(), "rtmp://global-live.mux.com:5222/app/abc123");
    }

    #[test]
    fn test_single_source_has_no_mixer() {
        let config = StreamConfig::new("abc123").with_system(Some(Device::from("Stereo Mix")));
        let args = StreamCommandBuilder::new().build(&config);

        assert_eq!(count_audio_inputs(&args), 1);
        assert!(!has_mix_filter(&args));
        assert!(args.contains(&"audio=Stereo Mix".to_string()));
    }

    #[test]
    fn test_two_sources_full_vector() {
        let config = StreamConfig::new("abc123")
            .with_mic(Some(Device::from("Microphone (USB Audio)")))
            .with_system(Some(Device::from("Stereo Mix (Realtek)")));
        let args = StreamCommandBuilder::new().build(&config);

        let expected: Vec<String> = [
            "-re",
            "-f",
            "lavfi",
            "-i",
            "color=size=640x480:rate=6:color=black",
            "-f",
            "dshow",
            "-i",
            "audio=Microphone (USB Audio)",
            "-f",
            "dshow",
            "-i",
            "audio=Stereo Mix (Realtek)",
            "-filter_complex",
            "amix=inputs=2:duration=longest",
            "-ac",
            "2",
            "-c:a",
            "aac",
            "-ar",
            "44100",
            "-b:a",
            "160k",
            "-f",
            "flv",
            "rtmp://global-live.mux.com:5222/app/abc123",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(args, expected);
    }

    #[test]
    fn test_stream_key_passed_verbatim() {
        let config = StreamConfig::new("key with spaces&;|");
        let args = StreamCommandBuilder::new().build(&config);
        assert_eq!(
            args.last().unwrap(),
            "rtmp://global-live.mux.com:5222/app/key with spaces&;|"
        );
    }

    #[test]
    fn test_redacted_hides_key() {
        let config = StreamConfig::new("super-secret");
        let args = StreamCommandBuilder::new().build_redacted(&config);
        assert!(!args.iter().any(|a| a.contains("super-secret")));
        assert_eq!(args.last().unwrap(), "rtmp://global-live.mux.com:5222/app/<stream-key>");
    }

    #[test]
    fn test_device_list_args() {
        assert_eq!(
            device_list_args(),
            vec!["-list_devices", "true", "-f", "dshow", "-i", "dummy"]
        );
    }
}

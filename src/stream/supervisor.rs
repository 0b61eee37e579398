//! Lifecycle owner for the encoder process.
//!
//! `NotStarted --start--> Running --stop--> Stopped`. A later `start` spawns a
//! fresh process. Start and stop are serialized on the state lock. `adjust`
//! only holds it long enough to clone the control channel, so a stalled pipe
//! write never blocks `stop`, `phase` or `info`.

use chrono::Utc;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, ChildStdin};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::command::StreamCommandBuilder;
use super::control::ControlChannel;
use super::error::{ControlChannelError, StreamStartError, StreamStopError};
use super::types::{ControlCommand, MixWeights, StreamConfig, StreamInfo, StreamPhase};
use crate::encoder::EncoderProgram;

/// Upper bound on the graceful quit write and on releasing the channel after the kill.
const QUIT_GRACE: Duration = Duration::from_millis(500);

struct ActiveStream {
    child: Child,
    channel: Arc<ControlChannel<ChildStdin>>,
    info: StreamInfo,
}

struct SupervisorState {
    phase: StreamPhase,
    active: Option<ActiveStream>,
}

pub struct StreamSupervisor {
    encoder: EncoderProgram,
    builder: StreamCommandBuilder,
    state: Mutex<SupervisorState>,
}

impl StreamSupervisor {
    pub fn new(encoder: EncoderProgram) -> Self {
        Self {
            encoder,
            builder: StreamCommandBuilder::new(),
            state: Mutex::new(SupervisorState {
                phase: StreamPhase::NotStarted,
                active: None,
            }),
        }
    }

    pub async fn phase(&self) -> StreamPhase {
        self.state.lock().await.phase
    }

    pub async fn info(&self) -> Option<StreamInfo> {
        self.state
            .lock()
            .await
            .active
            .as_ref()
            .map(|active| active.info.clone())
    }

    pub async fn start(&self, config: StreamConfig) -> Result<StreamInfo, StreamStartError> {
        let mut state = self.state.lock().await;

        if state.active.is_some() {
            warn!("StreamSupervisor: start requested while a stream is running");
            return Err(StreamStartError::AlreadyRunning);
        }

        if config.stream_key().trim().is_empty() {
            return Err(StreamStartError::EmptyStreamKey);
        }

        let program = self
            .encoder
            .resolve()
            .map_err(|source| StreamStartError::EncoderNotFound {
                program: self.encoder.command.clone(),
                source,
            })?;

        let args = self.builder.build(&config);
        let redacted = self.builder.build_redacted(&config);
        info!(
            "Spawning encoder {} with {} audio source(s): {}",
            program.display(),
            config.audio_source_count(),
            redacted.join(" ")
        );

        let mut child = self
            .encoder
            .command(&program, &args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!("Failed to spawn encoder: {}", e);
                StreamStartError::Spawn(e)
            })?;

        let Some(stdin) = child.stdin.take() else {
            error!("Encoder spawned without a stdin pipe, killing it");
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(StreamStartError::MissingStdin);
        };

        let info = StreamInfo {
            pid: child.id(),
            started_at: Utc::now(),
            args: redacted,
            audio_sources: config.audio_source_count(),
        };

        state.active = Some(ActiveStream {
            child,
            channel: Arc::new(ControlChannel::new(stdin)),
            info: info.clone(),
        });
        state.phase = StreamPhase::Running;

        info!("Stream running (pid {:?})", info.pid);
        Ok(info)
    }

    /// Ask the encoder to quit, then kill and reap it.
    ///
    /// The quit write is bounded by `QUIT_GRACE`; the kill happens either way.
    /// The state is `Stopped` on return regardless of the outcome.
    pub async fn stop(&self) -> Result<(), StreamStopError> {
        let mut state = self.state.lock().await;

        let Some(mut active) = state.active.take() else {
            warn!("StreamSupervisor: stop requested with no running stream");
            return Err(StreamStopError::NotRunning);
        };
        state.phase = StreamPhase::Stopped;

        info!("Stopping stream (pid {:?})", active.info.pid);

        match timeout(QUIT_GRACE, active.channel.send(&ControlCommand::Quit)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_broken_pipe() => {
                debug!("Encoder stdin already closed, skipping graceful quit");
            }
            Ok(Err(e)) => warn!("Graceful quit failed, terminating anyway: {}", e),
            Err(_) => warn!(
                "Encoder did not accept quit within {:?}, terminating",
                QUIT_GRACE
            ),
        }

        if let Err(e) = active.child.start_kill() {
            debug!("Kill signal not delivered (process likely exited): {}", e);
        }

        let result = match active.child.wait().await {
            Ok(status) => {
                info!("Encoder exited with {}", status);
                Ok(())
            }
            Err(e) => {
                error!("Failed to reap encoder process: {}", e);
                Err(StreamStopError::Terminate(e))
            }
        };

        // A writer parked on a full pipe fails once the read end is gone.
        match timeout(QUIT_GRACE, active.channel.close()).await {
            Ok(stdin) => drop(stdin),
            Err(_) => warn!("Control channel still busy after the encoder exited"),
        }

        result
    }

    /// Forward new mix weights to the running encoder.
    pub async fn adjust(&self, weights: MixWeights) -> Result<(), ControlChannelError> {
        let channel = {
            let state = self.state.lock().await;
            let active = state.active.as_ref().ok_or(ControlChannelError::Closed)?;

            if !active.info.mixable() {
                return Err(ControlChannelError::NoMixer);
            }
            Arc::clone(&active.channel)
        };

        channel
            .send(&ControlCommand::SetMixWeights(weights))
            .await
    }

    /// Stop the stream if one is running; used on service shutdown.
    pub async fn shutdown(&self) -> Result<(), StreamStopError> {
        match self.stop().await {
            Err(StreamStopError::NotRunning) => Ok(()),
            other => other,
        }
    }
}

impl Drop for StreamSupervisor {
    fn drop(&mut self) {
        if let Some(active) = self.state.get_mut().active.as_mut() {
            debug!("Dropping StreamSupervisor with a running stream, killing encoder");
            let _ = active.child.start_kill();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::stream::types::Device;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::TempDir;

    /// `sh -c 'cat > "$0"' <capture> <encoder args...>` records stdin to a file.
    fn capturing_encoder(capture: &Path) -> EncoderProgram {
        EncoderProgram::new("sh").with_leading_args([
            "-c".to_string(),
            r#"exec cat > "$0""#.to_string(),
            capture.to_string_lossy().to_string(),
        ])
    }

    fn mixed_config() -> StreamConfig {
        StreamConfig::new("test-key")
            .with_mic(Some(Device::from("Microphone")))
            .with_system(Some(Device::from("Stereo Mix")))
    }

    async fn wait_for_contents(path: &Path, expected: &str) -> String {
        for _ in 0..100 {
            let contents = std::fs::read_to_string(path).unwrap_or_default();
            if contents.contains(expected) {
                return contents;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        std::fs::read_to_string(path).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_adjust_writes_protocol_line() {
        let dir = TempDir::new().unwrap();
        let capture = dir.path().join("stdin.txt");
        let supervisor = StreamSupervisor::new(capturing_encoder(&capture));

        assert_eq!(supervisor.phase().await, StreamPhase::NotStarted);
        supervisor.start(mixed_config()).await.unwrap();
        assert_eq!(supervisor.phase().await, StreamPhase::Running);

        supervisor
            .adjust(MixWeights::new(0.3, 0.9).unwrap())
            .await
            .unwrap();

        let contents = wait_for_contents(&capture, "\n").await;
        assert_eq!(contents, "camix -1 weights 0.3 0.9\n");

        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.phase().await, StreamPhase::Stopped);
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let dir = TempDir::new().unwrap();
        let supervisor = StreamSupervisor::new(capturing_encoder(&dir.path().join("stdin.txt")));

        let first = supervisor.start(mixed_config()).await.unwrap();
        let second = supervisor.start(mixed_config()).await;
        assert!(matches!(second, Err(StreamStartError::AlreadyRunning)));

        let current = supervisor.info().await.unwrap();
        assert_eq!(current.pid, first.pid);
        assert_eq!(current.started_at, first.started_at);

        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_second_stop_is_rejected() {
        let dir = TempDir::new().unwrap();
        let supervisor = StreamSupervisor::new(capturing_encoder(&dir.path().join("stdin.txt")));

        supervisor.start(mixed_config()).await.unwrap();
        supervisor.stop().await.unwrap();

        let again = supervisor.stop().await;
        assert!(matches!(again, Err(StreamStopError::NotRunning)));
        assert_eq!(supervisor.phase().await, StreamPhase::Stopped);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_rejected() {
        let supervisor = StreamSupervisor::new(EncoderProgram::new("sh"));
        assert!(matches!(
            supervisor.stop().await,
            Err(StreamStopError::NotRunning)
        ));
        assert_eq!(supervisor.phase().await, StreamPhase::NotStarted);
    }

    #[tokio::test]
    async fn test_stop_after_encoder_exited() {
        let encoder = EncoderProgram::new("sh").with_leading_args(["-c", "exit 0"]);
        let supervisor = StreamSupervisor::new(encoder);

        supervisor.start(mixed_config()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // The quit write may hit a closed pipe; stop must still complete.
        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.phase().await, StreamPhase::Stopped);

        let err = supervisor
            .adjust(MixWeights::new(0.5, 0.5).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ControlChannelError::Closed));
    }

    #[tokio::test]
    async fn test_adjust_rejected_without_two_sources() {
        let dir = TempDir::new().unwrap();
        let supervisor = StreamSupervisor::new(capturing_encoder(&dir.path().join("stdin.txt")));
        let config = StreamConfig::new("test-key").with_mic(Some(Device::from("Microphone")));

        supervisor.start(config).await.unwrap();
        let err = supervisor
            .adjust(MixWeights::new(0.5, 0.5).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ControlChannelError::NoMixer));

        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_adjust_before_start_is_closed() {
        let supervisor = StreamSupervisor::new(EncoderProgram::new("sh"));
        let err = supervisor
            .adjust(MixWeights::new(0.5, 0.5).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ControlChannelError::Closed));
    }

    #[tokio::test]
    async fn test_missing_encoder_fails_start() {
        let supervisor = StreamSupervisor::new(EncoderProgram::new("/nonexistent/mixcast-encoder"));
        let err = supervisor.start(mixed_config()).await.unwrap_err();
        assert!(matches!(err, StreamStartError::EncoderNotFound { .. }));
        assert_eq!(supervisor.phase().await, StreamPhase::NotStarted);
    }

    #[tokio::test]
    async fn test_empty_key_fails_start() {
        let supervisor = StreamSupervisor::new(EncoderProgram::new("sh"));
        let err = supervisor.start(StreamConfig::new("")).await.unwrap_err();
        assert!(matches!(err, StreamStartError::EmptyStreamKey));
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let dir = TempDir::new().unwrap();
        let supervisor = StreamSupervisor::new(capturing_encoder(&dir.path().join("stdin.txt")));

        supervisor.start(mixed_config()).await.unwrap();
        supervisor.stop().await.unwrap();

        let second = supervisor.start(mixed_config()).await.unwrap();
        assert_eq!(supervisor.phase().await, StreamPhase::Running);
        assert_eq!(supervisor.info().await.unwrap().pid, second.pid);

        supervisor.shutdown().await.unwrap();
        assert_eq!(supervisor.phase().await, StreamPhase::Stopped);
        supervisor.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_info_redacts_key() {
        let dir = TempDir::new().unwrap();
        let supervisor = StreamSupervisor::new(capturing_encoder(&dir.path().join("stdin.txt")));

        let info = supervisor.start(mixed_config()).await.unwrap();
        assert!(!info.args.iter().any(|a| a.contains("test-key")));
        assert_eq!(info.audio_sources, 2);
        assert!(info.pid.is_some());

        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_with_stalled_encoder_stdin() {
        // Never reads stdin, so sustained adjustments fill the pipe.
        let encoder = EncoderProgram::new("sh").with_leading_args(["-c", "exec sleep 30"]);
        let supervisor = Arc::new(StreamSupervisor::new(encoder));
        supervisor.start(mixed_config()).await.unwrap();

        let slider = {
            let supervisor = Arc::clone(&supervisor);
            tokio::spawn(async move {
                let weights = MixWeights::new(0.123456789, 0.987654321).unwrap();
                let began = Instant::now();
                while began.elapsed() < Duration::from_millis(1500) {
                    if supervisor.adjust(weights).await.is_err() {
                        break;
                    }
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let phase = tokio::time::timeout(Duration::from_secs(1), supervisor.phase())
            .await
            .expect("phase blocked behind a pending adjust");
        assert_eq!(phase, StreamPhase::Running);

        tokio::time::timeout(Duration::from_secs(5), supervisor.stop())
            .await
            .expect("stop did not return")
            .unwrap();
        assert_eq!(supervisor.phase().await, StreamPhase::Stopped);

        tokio::time::timeout(Duration::from_secs(5), slider)
            .await
            .expect("pending adjust was not released by stop")
            .unwrap();

        let err = supervisor
            .adjust(MixWeights::new(0.5, 0.5).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ControlChannelError::Closed));
    }
}

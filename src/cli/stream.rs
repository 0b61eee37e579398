//! Foreground streaming from the terminal.
//!
//! Each stdin line of the form `<mic> <system>` becomes a mix adjustment.
//! EOF or ctrl-c stops the stream.

use crate::app::shutdown_signal;
use crate::config::Config;
use crate::stream::{ControlChannelError, MixWeights, StreamSupervisor};
use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::args::StreamCliArgs;

pub async fn handle_stream_command(config: &Config, args: StreamCliArgs) -> Result<()> {
    let target = args.target;
    let stream_config = config
        .stream
        .stream_config(target.key, target.mic, target.system);

    let supervisor = StreamSupervisor::new(config.encoder.clone());
    let info = supervisor.start(stream_config).await?;

    println!("Streaming (pid {:?}) with {} audio source(s).", info.pid, info.audio_sources);
    if info.mixable() {
        println!("Type \"<mic> <system>\" weights (0.0-1.0) and press enter to re-mix.");
    }
    println!("Press ctrl-c or close stdin to stop.");

    let result = tokio::select! {
        res = read_adjustments(&supervisor) => res,
        _ = shutdown_signal() => {
            info!("Interrupted");
            Ok(())
        }
    };

    supervisor.stop().await?;
    println!("Stream stopped.");
    result
}

async fn read_adjustments(supervisor: &StreamSupervisor) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let weights = match parse_weights(&line) {
            Ok(weights) => weights,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match supervisor.adjust(weights).await {
            Ok(()) => info!("Mix set to mic={} system={}", weights.mic(), weights.system()),
            Err(ControlChannelError::NoMixer) => {
                eprintln!("This stream has fewer than two audio sources; nothing to mix.");
            }
            Err(e) => {
                warn!("Mix adjustment failed: {}", e);
                return Err(e.into());
            }
        }
    }

    Ok(())
}

/// Parse `"<mic> <system>"` into validated weights.
pub fn parse_weights(line: &str) -> Result<MixWeights> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [mic, system] = parts.as_slice() else {
        return Err(anyhow!("Expected two weights, e.g. \"0.8 0.5\""));
    };

    let mic: f64 = mic
        .parse()
        .with_context(|| format!("Invalid mic weight '{mic}'"))?;
    let system: f64 = system
        .parse()
        .with_context(|| format!("Invalid system weight '{system}'"))?;

    Ok(MixWeights::new(mic, system)?)
}

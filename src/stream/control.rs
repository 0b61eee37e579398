//! Live control of a running encoder through its stdin.
//!
//! ffmpeg reads single-key commands from stdin while encoding. `c` prompts for
//! a filter command line (`<target> <time> <command> <args>\n`), `q` quits.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use super::error::ControlChannelError;
use super::types::ControlCommand;

pub const MIXER_OPCODE: u8 = b'c';
pub const QUIT_OPCODE: u8 = b'q';

/// Target filter, then `-1` as the time field so the command applies immediately.
const MIX_COMMAND_PREFIX: &str = "amix -1 weights";

impl ControlCommand {
    /// Wire bytes for this command, opcode included.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ControlCommand::SetMixWeights(weights) => {
                let line = format!(
                    "{} {} {}\n",
                    MIX_COMMAND_PREFIX,
                    weights.mic(),
                    weights.system()
                );
                let mut bytes = Vec::with_capacity(line.len() + 1);
                bytes.push(MIXER_OPCODE);
                bytes.extend_from_slice(line.as_bytes());
                bytes
            }
            ControlCommand::Quit => vec![QUIT_OPCODE],
        }
    }
}

/// Single-writer wrapper around the encoder's stdin.
///
/// Every `send` holds the lock for the whole command, so concurrent callers
/// never interleave bytes. Once closed the channel rejects all sends.
pub struct ControlChannel<W> {
    writer: Mutex<Option<W>>,
}

impl<W> ControlChannel<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(Some(writer)),
        }
    }

    pub async fn send(&self, command: &ControlCommand) -> Result<(), ControlChannelError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(ControlChannelError::Closed)?;

        let bytes = command.encode();
        writer.write_all(&bytes).await?;
        writer.flush().await?;

        debug!("Sent control command {:?} ({} bytes)", command, bytes.len());
        Ok(())
    }

    #[cfg(test)]
    pub async fn is_open(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Detach the writer. Dropping the returned value closes the pipe.
    pub async fn close(&self) -> Option<W> {
        self.writer.lock().await.take()
    }
}

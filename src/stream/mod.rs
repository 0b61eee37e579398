//! Live stream core: argument construction, encoder supervision and the
//! stdin control protocol used to re-balance the audio mix while streaming.

pub mod command;
pub mod control;
pub mod error;
pub mod supervisor;
pub mod types;

pub use command::{device_list_args, StreamCommandBuilder, INGEST_URL};
pub use control::ControlChannel;
pub use error::{ControlChannelError, StreamStartError, StreamStopError};
pub use supervisor::StreamSupervisor;
pub use types::{ControlCommand, Device, MixWeights, StreamConfig, StreamInfo, StreamPhase};

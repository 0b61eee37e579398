use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mixcast")]
#[command(about = "Stream microphone and system audio to RTMP with a live mixer", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the local control API (default)
    Serve,
    /// List audio capture devices
    Devices,
    /// Print the encoder command a stream would run, without starting it
    Command(CommandCliArgs),
    /// Stream in the foreground; read "<mic> <system>" weights from stdin
    Stream(StreamCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StreamTarget {
    /// Stream key appended to the ingest URL
    #[arg(short, long)]
    pub key: String,
    /// Microphone device name (defaults to config)
    #[arg(long)]
    pub mic: Option<String>,
    /// System audio device name (defaults to config)
    #[arg(long)]
    pub system: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct CommandCliArgs {
    #[command(flatten)]
    pub target: StreamTarget,
    /// Print the stream key instead of a placeholder
    #[arg(long)]
    pub show_key: bool,
}

#[derive(ClapArgs, Debug)]
pub struct StreamCliArgs {
    #[command(flatten)]
    pub target: StreamTarget,
}

use anyhow::Result;
use clap::Parser;
use mixcast::{
    app,
    cli::{handle_command_command, handle_devices_command, handle_stream_command, Cli, CliCommand},
    config::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(CliCommand::Version) = cli.command {
        println!("mixcast {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(CliCommand::Devices) => handle_devices_command(&config).await,
        Some(CliCommand::Command(args)) => handle_command_command(&config, args),
        Some(CliCommand::Stream(args)) => {
            // Exit directly: the runtime would otherwise wait on the blocked stdin reader thread.
            if let Err(e) = handle_stream_command(&config, args).await {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
            std::process::exit(0);
        }
        Some(CliCommand::Serve) | None => app::run_service(config).await,
        Some(CliCommand::Version) => Ok(()),
    }
}

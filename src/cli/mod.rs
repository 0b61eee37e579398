use crate::config::Config;
use crate::devices::{DeviceEnumerator, DshowDeviceEnumerator};
use crate::stream::StreamCommandBuilder;
use anyhow::Result;

pub mod args;
pub mod stream;

pub use args::{Cli, CliCommand, CommandCliArgs, StreamCliArgs, StreamTarget};
pub use stream::handle_stream_command;

pub async fn handle_devices_command(config: &Config) -> Result<()> {
    let enumerator = DshowDeviceEnumerator::new(config.encoder.clone())?;
    let devices = enumerator.list_input_devices().await?;

    if devices.is_empty() {
        println!("No audio capture devices found.");
        return Ok(());
    }

    for device in devices {
        println!("{}", device);
    }

    Ok(())
}

pub fn handle_command_command(config: &Config, args: CommandCliArgs) -> Result<()> {
    let target = args.target;
    let stream_config = config
        .stream
        .stream_config(target.key, target.mic, target.system);

    let builder = StreamCommandBuilder::new();
    let stream_args = if args.show_key {
        builder.build(&stream_config)
    } else {
        builder.build_redacted(&stream_config)
    };

    let mut line: Vec<String> = vec![config.encoder.command.clone()];
    line.extend(config.encoder.leading_args.iter().cloned());
    line.extend(stream_args.iter().map(|arg| quote_arg(arg)));

    println!("{}", line.join(" "));
    Ok(())
}

/// Quote for display only; the encoder is never run through a shell.
fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || "\"'&;|<>()$`".contains(c)) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

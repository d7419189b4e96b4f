use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use scanlink_transport::{LinkConfig, SerialPortLink, DEFAULT_BAUD_RATE};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod encode;
pub mod listen;
pub mod search;
pub mod send;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one image file as a frame.
    Send(SendArgs),
    /// Act as the camera: send each new image dropped into a directory.
    Watch(WatchArgs),
    /// Act as the host: receive frames, decode them and store records.
    Listen(ListenArgs),
    /// Write the raw bytes of a frame to a file or stdout.
    Encode(EncodeArgs),
    /// Query a record store file.
    Search(SearchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Search(args) => search::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PortArgs {
    /// Serial port (e.g. /dev/ttyUSB0, COM3).
    #[arg(env = "SCANLINK_PORT")]
    pub port: String,
    /// Baud rate.
    #[arg(long, env = "SCANLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
}

impl PortArgs {
    pub fn open(&self) -> CliResult<SerialPortLink> {
        let config = LinkConfig::new(&self.port).with_baud_rate(self.baud);
        SerialPortLink::open(&config).map_err(|err| transport_error("open failed", err))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: PortArgs,
    /// Barcode value sent as the frame identifier (13 characters).
    #[arg(long, short = 'i')]
    pub identifier: String,
    /// Image file to send as the payload.
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub link: PortArgs,
    /// Directory of `<barcode>.<ext>` image files.
    pub dir: PathBuf,
    /// Directory scan interval (e.g. 500ms, 2s).
    #[arg(long, default_value = "500ms")]
    pub interval: String,
    /// Scan once and exit.
    #[arg(long)]
    pub once: bool,
    /// Remember at most this many sent identifiers. Default: all of them.
    #[arg(long, value_name = "N")]
    pub dedup_capacity: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: PortArgs,
    /// Persist records to this JSON file.
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,
    /// Keep records already in the store file instead of starting empty.
    #[arg(long, requires = "store")]
    pub append: bool,
    /// OCR command that reads an image on stdin and prints text on stdout.
    #[arg(long, value_name = "CMD", env = "SCANLINK_OCR_COMMAND")]
    pub ocr_command: Option<String>,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<usize>,
    /// Also print status events.
    #[arg(long)]
    pub events: bool,
    /// Time allowed for a whole payload after its length prefix (e.g. 5s).
    #[arg(long, default_value = "5s")]
    pub payload_timeout: String,
    /// Deliveries buffered ahead of the decoder.
    #[arg(long, default_value_t = scanlink_node::DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Frame identifier (13 characters).
    #[arg(long, short = 'i')]
    pub identifier: String,
    /// Payload file.
    #[arg(long, short = 'f')]
    pub file: PathBuf,
    /// Write the frame here instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Record store file written by `listen --store`.
    pub store: PathBuf,
    /// Case-insensitive text to look for in name, phone or identifier.
    #[arg(default_value = "")]
    pub query: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }
}

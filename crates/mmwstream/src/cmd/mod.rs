use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use mmwstream_frame::{HeaderLayout, SyncConfig, DEFAULT_MAX_FRAME_LEN, MAGIC_LEN};
use mmwstream_transport::DEFAULT_BAUD_RATE;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod gaps;
pub mod ports;
pub mod replay;
pub mod serial;
pub mod simulate;
pub mod udp;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream packets from a serial port.
    Serial(SerialArgs),
    /// Stream fixed-size frames from a UDP socket.
    Udp(UdpArgs),
    /// Run a capture file through the frame synchronizer.
    Replay(ReplayArgs),
    /// Write a synthetic capture file.
    Simulate(SimulateArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serial(args) => serial::run(args, format),
        Command::Udp(args) => udp::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Simulate(args) => simulate::run(args),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Framing options shared by commands that read or write the serial format.
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Magic word as 16 hex digits (default: TI mmWave SDK sentinel).
    #[arg(long, value_name = "HEX")]
    pub magic: Option<String>,
    /// Header without the trailing subframe_number field (28 bytes).
    #[arg(long)]
    pub legacy_header: bool,
    /// Largest accepted total_packet_len in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LEN)]
    pub max_frame_len: usize,
    /// Padding bytes tolerated after the last TLV.
    #[arg(long, default_value_t = 0)]
    pub max_padding: usize,
}

impl SyncArgs {
    pub fn to_config(&self) -> CliResult<SyncConfig> {
        let mut config = SyncConfig {
            layout: if self.legacy_header {
                HeaderLayout::Legacy
            } else {
                HeaderLayout::WithSubframe
            },
            max_frame_len: self.max_frame_len,
            max_trailing_padding: self.max_padding,
            ..SyncConfig::default()
        };
        if let Some(magic) = &self.magic {
            config.magic = parse_magic(magic)?;
        }
        if config.max_frame_len < config.min_frame_len() {
            return Err(CliError::new(
                USAGE,
                format!(
                    "--max-frame-len must be at least {} bytes",
                    config.min_frame_len()
                ),
            ));
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial port path (e.g. /dev/ttyACM1, COM4).
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Timeout for one physical read (e.g. 10ms, 1s).
    #[arg(long, default_value = "10ms")]
    pub read_timeout: String,
    /// Overall deadline for one packet (e.g. 2s).
    #[arg(long)]
    pub packet_timeout: Option<String>,
    /// Exit after receiving N packets.
    #[arg(long)]
    pub count: Option<usize>,
    #[command(flatten)]
    pub sync: SyncArgs,
}

#[derive(Args, Debug)]
pub struct UdpArgs {
    /// Local interface address or host name to bind.
    pub interface: String,
    /// Local UDP port.
    pub port: u16,
    /// Exact datagram size of one frame.
    #[arg(long)]
    pub frame_size: usize,
    /// Receive timeout per frame (e.g. 500ms, 1s).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Drop datagrams of the wrong size instead of failing.
    #[arg(long)]
    pub skip_mismatched: bool,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file holding raw serial bytes.
    pub file: PathBuf,
    /// Bytes fed to the synchronizer per read.
    #[arg(long, default_value_t = 4096)]
    pub chunk: usize,
    #[command(flatten)]
    pub sync: SyncArgs,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Output capture file.
    pub file: PathBuf,
    /// Number of frames to write.
    #[arg(long, default_value_t = 10)]
    pub frames: u32,
    /// Noise bytes written before each frame.
    #[arg(long, default_value_t = 0)]
    pub garbage: usize,
    /// Leave out every Nth frame number, to emulate drops.
    #[arg(long, value_name = "N")]
    pub drop_every: Option<u32>,
    #[command(flatten)]
    pub sync: SyncArgs,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub fn parse_magic(input: &str) -> CliResult<[u8; MAGIC_LEN]> {
    let digits: String = input
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();

    if !digits.is_ascii() || digits.len() != MAGIC_LEN * 2 {
        return Err(CliError::new(
            USAGE,
            format!("magic word must be {MAGIC_LEN} bytes ({} hex digits)", MAGIC_LEN * 2),
        ));
    }

    let mut magic = [0u8; MAGIC_LEN];
    for (i, byte) in magic.iter_mut().enumerate() {
        let pair = &digits[i * 2..i * 2 + 2];
        *byte = u8::from_str_radix(pair, 16)
            .map_err(|_| CliError::new(USAGE, format!("invalid hex in magic word: {pair}")))?;
    }
    Ok(magic)
}

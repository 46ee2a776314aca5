mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::exit::CliResult;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

/// Capture, replay and simulate TI mmWave radar frame streams.
#[derive(Parser, Debug)]
#[command(name = "mmwstream", version)]
struct Cli {
    /// Packet output format (default: table on a terminal, JSON lines otherwise).
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format on stderr.
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Log level for mmwstream itself. Overrides MMWSTREAM_LOG.
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn run(self) -> CliResult<i32> {
        init_logging(self.log_format, self.log_level);
        let format = self
            .format
            .unwrap_or_else(OutputFormat::default_for_stdout);
        cmd::run(self.command, format)
    }
}

fn main() {
    let code = Cli::parse().run().unwrap_or_else(|err| {
        eprintln!("mmwstream: {err}");
        err.code
    });
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mmwstream").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn serial_defaults_to_data_uart_rate() {
        let cli = parse(&["serial", "/dev/ttyACM1", "--count", "10"]);
        match cli.command {
            Command::Serial(args) => {
                assert_eq!(args.baud, 1_036_800);
                assert_eq!(args.read_timeout, "10ms");
                assert_eq!(args.count, Some(10));
                assert!(args.packet_timeout.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn udp_requires_frame_size() {
        let err = Cli::try_parse_from(["mmwstream", "udp", "0.0.0.0", "1024"])
            .expect_err("missing --frame-size should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = parse(&[
            "replay",
            "capture.bin",
            "--chunk",
            "7",
            "--legacy-header",
            "--format",
            "pretty",
            "--log-level",
            "debug",
        ]);
        assert!(matches!(cli.format, Some(OutputFormat::Pretty)));
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        match cli.command {
            Command::Replay(args) => {
                assert_eq!(args.chunk, 7);
                assert!(args.sync.legacy_header);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn log_level_is_optional() {
        let cli = parse(&["simulate", "out.bin", "--drop-every", "4"]);
        assert!(cli.log_level.is_none());
        assert!(matches!(
            cli.command,
            Command::Simulate(ref args) if args.drop_every == Some(4)
        ));
    }
}

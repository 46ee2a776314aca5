use std::fs::File;

use mmwstream_frame::{ReaderConfig, SerialFrameReader};
use tracing::{info, warn};

use crate::cmd::gaps::FrameGapTracker;
use crate::cmd::ReplayArgs;
use crate::exit::{file_error, frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_packet, print_summary, OutputFormat, StreamSummary};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    if args.chunk == 0 {
        return Err(CliError::new(USAGE, "--chunk must be greater than zero"));
    }

    let sync = args.sync.to_config()?;
    let file = File::open(&args.file)
        .map_err(|err| io_error(&format!("failed opening {}", args.file.display()), err))?;
    let config = ReaderConfig {
        sync,
        read_chunk_size: args.chunk,
        packet_timeout: None,
    };
    let mut reader = SerialFrameReader::with_config(file, config)
        .map_err(|err| frame_error("invalid configuration", err))?;
    let mut gaps = FrameGapTracker::default();

    // A file read only comes back empty at end of file.
    while let Some(packet) = reader
        .read_packet()
        .map_err(|err| file_error("read failed", err))?
    {
        let skipped = gaps.observe(packet.frame_number());
        if skipped > 0 {
            warn!(
                frame_number = packet.frame_number(),
                skipped, "frame number gap"
            );
        }
        print_packet(&packet, format);
    }

    let mut summary = StreamSummary::new(reader.stats(), gaps.dropped());
    let tail = reader.buffered();
    if tail > 0 {
        info!(bytes = tail, "incomplete data at end of capture");
        summary.discarded_bytes += tail as u64;
    }
    print_summary(&summary, format);

    Ok(SUCCESS)
}

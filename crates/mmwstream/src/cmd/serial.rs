use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mmwstream_frame::{ReaderConfig, SerialFrameReader};
use mmwstream_transport::SerialConfig;
use tracing::{debug, warn};

use crate::cmd::gaps::FrameGapTracker;
use crate::cmd::{parse_duration, SerialArgs};
use crate::exit::{frame_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_packet, print_summary, OutputFormat, StreamSummary};

pub fn run(args: SerialArgs, format: OutputFormat) -> CliResult<i32> {
    let serial = SerialConfig {
        baud_rate: args.baud,
        read_timeout: parse_duration(&args.read_timeout)?,
    };
    let config = ReaderConfig {
        sync: args.sync.to_config()?,
        packet_timeout: args
            .packet_timeout
            .as_deref()
            .map(parse_duration)
            .transpose()?,
        ..ReaderConfig::default()
    };

    let mut reader = SerialFrameReader::open(&args.port, &serial, config)
        .map_err(|err| frame_error("open failed", err))?;
    let stream = reader.get_ref();
    debug!(
        port = stream.name(),
        read_timeout = ?stream.read_timeout(),
        stale = stream.bytes_to_read().ok(),
        "discarding stale input"
    );
    reader
        .clear_input()
        .map_err(|err| frame_error("flush failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut gaps = FrameGapTracker::default();
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let packet = match reader.read_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => continue,
            Err(err) => return Err(frame_error("read failed", err)),
        };

        let skipped = gaps.observe(packet.frame_number());
        if skipped > 0 {
            warn!(
                frame_number = packet.frame_number(),
                skipped, "frame number gap"
            );
        }

        print_packet(&packet, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    print_summary(&StreamSummary::new(reader.stats(), gaps.dropped()), format);
    Ok(SUCCESS)
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

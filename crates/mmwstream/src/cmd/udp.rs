use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mmwstream_frame::{SizeMismatchPolicy, UdpConfig, UdpFrameReader};
use tracing::info;

use crate::cmd::serial::install_ctrlc_handler;
use crate::cmd::{parse_duration, UdpArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_datagram, print_udp_summary, OutputFormat};

pub fn run(args: UdpArgs, format: OutputFormat) -> CliResult<i32> {
    let config = UdpConfig {
        timeout: parse_duration(&args.timeout)?,
        mismatch_policy: if args.skip_mismatched {
            SizeMismatchPolicy::Skip
        } else {
            SizeMismatchPolicy::Reject
        },
        ..UdpConfig::new(args.frame_size)
    };

    let mut reader = UdpFrameReader::with_config(&args.interface, args.port, config)
        .map_err(|err| frame_error("bind failed", err))?;
    if let Ok(addr) = reader.local_addr() {
        info!(%addr, frame_size = args.frame_size, "waiting for frames");
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let frame = match reader.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        print_datagram(printed as u64, &frame, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    print_udp_summary(reader.stats(), format);
    Ok(SUCCESS)
}

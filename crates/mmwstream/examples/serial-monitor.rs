//! Reads packets from a serial port and prints one line per frame.
//!
//! Run with:
//!   cargo run --example serial-monitor -- /dev/ttyACM1

use mmwstream::frame::{tlv, ReaderConfig, SerialFrameReader};
use mmwstream::transport::SerialConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::args()
        .nth(1)
        .ok_or("usage: serial-monitor <PORT>")?;

    let mut reader =
        SerialFrameReader::open(&port, &SerialConfig::default(), ReaderConfig::default())?;
    reader.clear_input()?;
    eprintln!("Reading from {port}");

    loop {
        // Ten packets per batch; a quiet link just yields a short batch.
        let packets = match reader.read_packets(10) {
            Ok(packets) => packets,
            Err(err) => {
                eprintln!("Stopped after {} packet(s): {}", err.collected.len(), err.source);
                break;
            }
        };

        for packet in &packets {
            let point_bytes = packet
                .find_tlv(tlv::DETECTED_POINTS)
                .map_or(0, |tlv| tlv.length());
            println!(
                "frame {} objects={} point_bytes={} tlvs={}",
                packet.frame_number(),
                packet.header().num_detected_obj,
                point_bytes,
                packet.tlvs().len()
            );
        }
    }

    let stats = reader.stats();
    eprintln!(
        "packets={} rejected={} discarded_bytes={}",
        stats.packets, stats.rejected, stats.discarded_bytes
    );
    Ok(())
}

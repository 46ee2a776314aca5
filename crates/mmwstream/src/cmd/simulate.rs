use std::fs::File;
use std::io::BufWriter;

use mmwstream_frame::tlv::{DETECTED_POINTS, STATS};
use mmwstream_frame::{FrameHeader, PacketWriter, RadarPacket, SyncConfig, Tlv};
use tracing::info;

use crate::cmd::SimulateArgs;
use crate::exit::{file_error, frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};

const PLATFORM: u32 = 0x000A_6843;
const SDK_VERSION: u32 = 0x0305_0004;
const CYCLES_PER_FRAME: u32 = 20_000_000;

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    if args.drop_every == Some(0) {
        return Err(CliError::new(USAGE, "--drop-every must be greater than zero"));
    }
    let config = args.sync.to_config()?;

    let file = File::create(&args.file)
        .map_err(|err| io_error(&format!("failed creating {}", args.file.display()), err))?;
    let mut writer = PacketWriter::with_config(BufWriter::new(file), config.clone());
    let mut noise = Noise::new(0x5eed);
    let mut written = 0u32;

    for frame_number in 1..=args.frames {
        if args.drop_every.is_some_and(|every| frame_number % every == 0) {
            continue;
        }

        if args.garbage > 0 {
            writer
                .write_raw(&noise.bytes(args.garbage))
                .map_err(|err| file_error("write failed", err))?;
        }

        let packet = synthetic_packet(frame_number, &config)
            .map_err(|err| frame_error("encode failed", err))?;
        writer
            .write_packet(&packet)
            .map_err(|err| file_error("write failed", err))?;
        written += 1;
    }

    writer
        .flush()
        .map_err(|err| file_error("flush failed", err))?;
    info!(
        path = %args.file.display(),
        frames = written,
        "capture written"
    );

    Ok(SUCCESS)
}

/// A frame with a point cloud and a stats record, sized by `frame_number`.
fn synthetic_packet(
    frame_number: u32,
    config: &SyncConfig,
) -> mmwstream_frame::Result<RadarPacket> {
    let num_points = frame_number % 5 + 1;

    let mut points = Vec::with_capacity(num_points as usize * 16);
    for i in 0..num_points {
        let step = i as f32 * 0.25;
        for value in [step, 1.0 + step, 0.1, -0.5 + step] {
            points.extend_from_slice(&value.to_le_bytes());
        }
    }

    let mut stats = Vec::with_capacity(24);
    for value in [120u32, 80, 40, 2_000, 1_500, frame_number % 100] {
        stats.extend_from_slice(&value.to_le_bytes());
    }

    let header = FrameHeader {
        version: SDK_VERSION,
        platform: PLATFORM,
        frame_number,
        time_cpu_cycles: frame_number.wrapping_mul(CYCLES_PER_FRAME),
        num_detected_obj: num_points,
        subframe_number: Some(0),
        ..FrameHeader::default()
    };

    RadarPacket::assemble(
        header,
        vec![Tlv::new(DETECTED_POINTS, points), Tlv::new(STATS, stats)],
        config.layout,
    )
}

/// Deterministic line noise.
struct Noise(u32);

impl Noise {
    fn new(seed: u32) -> Self {
        Self(seed)
    }

    fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len)
            .map(|_| {
                self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (self.0 >> 24) as u8
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use mmwstream_frame::{HeaderLayout, ReaderConfig, SerialFrameReader};

    #[test]
    fn synthetic_packet_reconciles() {
        let config = SyncConfig::default();
        let packet = synthetic_packet(3, &config).unwrap();
        assert_eq!(packet.header().num_detected_obj, 4);
        assert_eq!(packet.find_tlv(DETECTED_POINTS).unwrap().length(), 64);
        assert_eq!(packet.raw_length(), 40 + 8 + 64 + 8 + 24);

        let mut writer = PacketWriter::with_config(Vec::new(), config.clone());
        writer.write_raw(&Noise::new(7).bytes(50)).unwrap();
        writer.write_packet(&packet).unwrap();

        let reader_config = ReaderConfig {
            sync: config,
            ..ReaderConfig::default()
        };
        let mut reader =
            SerialFrameReader::with_config(Cursor::new(writer.into_inner()), reader_config)
                .unwrap();
        assert_eq!(reader.read_packet().unwrap(), Some(packet));
    }

    #[test]
    fn synthetic_packet_follows_layout() {
        let config = SyncConfig {
            layout: HeaderLayout::Legacy,
            ..SyncConfig::default()
        };
        let packet = synthetic_packet(1, &config).unwrap();
        assert_eq!(packet.header().subframe_number, None);
    }

    #[test]
    fn noise_is_deterministic() {
        assert_eq!(Noise::new(1).bytes(32), Noise::new(1).bytes(32));
        assert_ne!(Noise::new(1).bytes(32), Noise::new(2).bytes(32));
    }
}

use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mmwstream_frame::tlv::tlv_type_name;
use mmwstream_frame::{RadarPacket, SyncStats, UdpStats};
use mmwstream_transport::{SerialPortInfo, SerialPortType};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct TlvOutput {
    #[serde(rename = "type")]
    tlv_type: u32,
    name: &'static str,
    length: u32,
}

#[derive(Serialize)]
struct PacketOutput {
    kind: &'static str,
    frame_number: u32,
    subframe_number: Option<u32>,
    version: String,
    platform: String,
    time_cpu_cycles: u32,
    num_detected_obj: u32,
    raw_length: u32,
    tlvs: Vec<TlvOutput>,
    timestamp: String,
}

impl PacketOutput {
    fn from_packet(packet: &RadarPacket) -> Self {
        let header = packet.header();
        Self {
            kind: "packet",
            frame_number: header.frame_number,
            subframe_number: header.subframe_number,
            version: format!("{:#010x}", header.version),
            platform: format!("{:#x}", header.platform),
            time_cpu_cycles: header.time_cpu_cycles,
            num_detected_obj: header.num_detected_obj,
            raw_length: packet.raw_length(),
            tlvs: packet
                .tlvs()
                .iter()
                .map(|tlv| TlvOutput {
                    tlv_type: tlv.tlv_type(),
                    name: tlv_type_name(tlv.tlv_type()),
                    length: tlv.length(),
                })
                .collect(),
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_packet(packet: &RadarPacket, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&PacketOutput::from_packet(packet)),
        OutputFormat::Table => {
            let header = packet.header();
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "SUBFRAME", "OBJECTS", "LENGTH", "TLVS"])
                .add_row(vec![
                    header.frame_number.to_string(),
                    subframe_label(header.subframe_number),
                    header.num_detected_obj.to_string(),
                    packet.raw_length().to_string(),
                    tlv_summary(packet),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let header = packet.header();
            println!(
                "frame={} subframe={} objects={} length={} tlvs=[{}]",
                header.frame_number,
                subframe_label(header.subframe_number),
                header.num_detected_obj,
                packet.raw_length(),
                tlv_summary(packet)
            );
        }
    }
}

#[derive(Serialize)]
struct DatagramOutput<'a> {
    kind: &'static str,
    index: u64,
    size: usize,
    head: &'a str,
    timestamp: String,
}

/// Print one fixed-size UDP frame. Only the first bytes are shown.
pub fn print_datagram(index: u64, frame: &[u8], format: OutputFormat) {
    let head = hex_preview(frame, 16);
    match format {
        OutputFormat::Json => print_json(&DatagramOutput {
            kind: "frame",
            index,
            size: frame.len(),
            head: &head,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "SIZE", "HEAD"])
                .add_row(vec![index.to_string(), frame.len().to_string(), head]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("frame={index} size={} head={head}", frame.len());
        }
    }
}

/// End-of-run counters for the serial and replay commands.
#[derive(Serialize, Debug, Default)]
pub struct StreamSummary {
    pub packets: u64,
    pub rejected: u64,
    pub discarded_bytes: u64,
    pub dropped_frames: u64,
}

impl StreamSummary {
    pub fn new(stats: SyncStats, dropped_frames: u64) -> Self {
        Self {
            packets: stats.packets,
            rejected: stats.rejected,
            discarded_bytes: stats.discarded_bytes,
            dropped_frames,
        }
    }
}

pub fn print_summary(summary: &StreamSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Tagged<'a> {
                kind: &'static str,
                #[serde(flatten)]
                summary: &'a StreamSummary,
            }
            print_json(&Tagged {
                kind: "summary",
                summary,
            });
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PACKETS", "REJECTED", "DISCARDED BYTES", "DROPPED FRAMES"])
                .add_row(vec![
                    summary.packets.to_string(),
                    summary.rejected.to_string(),
                    summary.discarded_bytes.to_string(),
                    summary.dropped_frames.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "packets={} rejected={} discarded_bytes={} dropped_frames={}",
                summary.packets, summary.rejected, summary.discarded_bytes, summary.dropped_frames
            );
        }
    }
}

pub fn print_udp_summary(stats: UdpStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct UdpSummary {
                kind: &'static str,
                frames: u64,
                mismatched: u64,
            }
            print_json(&UdpSummary {
                kind: "summary",
                frames: stats.frames,
                mismatched: stats.mismatched,
            });
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["FRAMES", "MISMATCHED"])
                .add_row(vec![stats.frames.to_string(), stats.mismatched.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("frames={} mismatched={}", stats.frames, stats.mismatched);
        }
    }
}

#[derive(Serialize)]
struct PortOutput {
    name: String,
    kind: &'static str,
    description: Option<String>,
}

pub fn print_ports(ports: &[SerialPortInfo], format: OutputFormat) {
    let rows: Vec<PortOutput> = ports.iter().map(port_output).collect();
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "DESCRIPTION"]);
            for row in rows {
                table.add_row(vec![row.name, row.kind.to_string(), row.description.unwrap_or_default()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                match row.description {
                    Some(description) => println!("{} ({}) {description}", row.name, row.kind),
                    None => println!("{} ({})", row.name, row.kind),
                }
            }
        }
    }
}

fn port_output(info: &SerialPortInfo) -> PortOutput {
    let (kind, description) = match &info.port_type {
        SerialPortType::UsbPort(usb) => (
            "usb",
            Some(match usb.product.as_deref() {
                Some(product) => format!("{:04x}:{:04x} {product}", usb.vid, usb.pid),
                None => format!("{:04x}:{:04x}", usb.vid, usb.pid),
            }),
        ),
        SerialPortType::PciPort => ("pci", None),
        SerialPortType::BluetoothPort => ("bluetooth", None),
        SerialPortType::Unknown => ("unknown", None),
    };
    PortOutput {
        name: info.port_name.clone(),
        kind,
        description,
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn subframe_label(subframe: Option<u32>) -> String {
    subframe.map_or_else(|| "-".to_string(), |n| n.to_string())
}

fn tlv_summary(packet: &RadarPacket) -> String {
    packet
        .tlvs()
        .iter()
        .map(|tlv| format!("{}({})", tlv_type_name(tlv.tlv_type()), tlv.length()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn hex_preview(bytes: &[u8], limit: usize) -> String {
    let mut out: String = bytes
        .iter()
        .take(limit)
        .map(|b| format!("{b:02x}"))
        .collect();
    if bytes.len() > limit {
        out.push_str("..");
    }
    out
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

//! Receives fixed-size UDP frames and appends them to a file.
//!
//! Run with:
//!   cargo run --example udp-capture -- 0.0.0.0 1024 1456 capture.bin

use std::fs::File;
use std::io::Write;

use mmwstream::frame::UdpFrameReader;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(interface), Some(port), Some(frame_size), Some(path)) =
        (args.next(), args.next(), args.next(), args.next())
    else {
        return Err("usage: udp-capture <INTERFACE> <PORT> <FRAME_SIZE> <FILE>".into());
    };

    let mut reader = UdpFrameReader::new(&interface, port.parse()?, frame_size.parse()?, 1000)?;
    let mut out = File::create(&path)?;
    eprintln!("Listening on {}", reader.local_addr()?);

    loop {
        match reader.read_frame()? {
            Some(frame) => out.write_all(&frame)?,
            None => {
                eprintln!("No frame within 1s, stopping");
                break;
            }
        }
    }

    eprintln!("Captured {} frame(s) to {path}", reader.stats().frames);
    Ok(())
}

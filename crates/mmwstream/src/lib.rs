//! Frame acquisition for TI mmWave radar output streams.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial port and UDP socket handles
//! - [`frame`]: magic-word synchronization, TLV validation and the frame readers

/// Re-export transport types.
pub mod transport {
    pub use mmwstream_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mmwstream_frame::*;
}

pub use mmwstream_frame::{
    FrameError, RadarPacket, SerialFrameReader, Tlv, UdpFrameReader,
};

//! Frame acquisition for TI mmWave radar output streams.
//!
//! Serial output is a continuous byte stream: every frame starts with an
//! 8-byte magic word followed by a little-endian header and a list of TLV
//! records. [`SerialFrameReader`] resynchronizes on the magic word, rejects
//! frames whose header and TLVs do not reconcile, and hands back complete
//! [`RadarPacket`]s. [`UdpFrameReader`] receives fixed-size frames, one per
//! datagram.
//!
//! Timeouts are not errors: reads return `Ok(None)` when no frame arrived.

pub mod batch;
pub mod codec;
pub mod error;
#[cfg(feature = "async")]
pub mod framed;
pub mod reader;
pub mod sync;
pub mod tlv;
pub mod udp;
pub mod writer;

pub use batch::{BatchError, BatchResult};
pub use codec::{
    decode_packet, encode_packet, FrameHeader, HeaderLayout, RadarPacket, SyncConfig, Tlv,
    DEFAULT_MAX_FRAME_LEN, MAGIC_LEN, MAGIC_WORD, TLV_HEADER_SIZE,
};
pub use error::{FrameError, Result};
#[cfg(feature = "async")]
pub use framed::RadarCodec;
pub use reader::{ReaderConfig, SerialFrameReader, DEFAULT_READ_CHUNK_SIZE};
pub use sync::{extract_packet, ByteStreamSync, SyncStats};
pub use udp::{
    SizeMismatchPolicy, UdpConfig, UdpFrameReader, UdpStats, DEFAULT_TIMEOUT_MS,
    MAX_DATAGRAM_SIZE,
};
pub use writer::PacketWriter;

//! `tokio_util` codec for radar streams.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::{RadarPacket, SyncConfig};
use crate::error::{FrameError, Result};
use crate::sync::{extract_packet, SyncStats};

/// Decoder that yields validated packets from a byte stream.
///
/// Shares the resynchronization rules of
/// [`ByteStreamSync`](crate::sync::ByteStreamSync).
#[derive(Debug, Default)]
pub struct RadarCodec {
    config: SyncConfig,
    stats: SyncStats,
}

impl RadarCodec {
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: SyncStats::default(),
        })
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }
}

impl Decoder for RadarCodec {
    type Item = RadarPacket;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        Ok(extract_packet(src, &self.config, &mut self.stats))
    }

    // A partial frame at end of stream is dropped like any other garbage.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let packet = extract_packet(src, &self.config, &mut self.stats);
        if packet.is_none() && !src.is_empty() {
            self.stats.discarded_bytes += src.len() as u64;
            src.clear();
        }
        Ok(packet)
    }
}

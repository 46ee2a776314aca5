use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::{
    build_packet, parse_tlvs, validate_length, FrameHeader, RadarPacket, SyncConfig, MAGIC_LEN,
};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Counters maintained while scanning a byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Frames extracted.
    pub packets: u64,
    /// Magic-word matches rejected by header or TLV validation.
    pub rejected: u64,
    /// Bytes dropped while searching for a frame start.
    pub discarded_bytes: u64,
}

/// Finds frame boundaries in an arbitrarily chunked byte stream.
///
/// Bytes are appended with [`feed`](Self::feed) and frames are pulled with
/// [`try_extract`](Self::try_extract). A magic-word match whose header or
/// TLVs do not validate is treated as a false positive: scanning resumes one
/// byte past it, so a corrupted frame never costs the frames behind it.
#[derive(Debug)]
pub struct ByteStreamSync {
    buf: BytesMut,
    config: SyncConfig,
    stats: SyncStats,
}

impl ByteStreamSync {
    /// Create a scanner with default configuration.
    pub fn new() -> Self {
        Self::build(SyncConfig::default())
    }

    /// Create a scanner with explicit configuration.
    ///
    /// Fails with [`FrameError::InvalidConfig`] when `max_frame_len` cannot
    /// hold even a bare header.
    pub fn with_config(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SyncConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            stats: SyncStats::default(),
        }
    }

    /// Append newly read bytes.
    ///
    /// Once more than `max_frame_len` bytes are pending, bytes ahead of the
    /// first magic-word occurrence are dropped (or all but a possible partial
    /// magic word if there is none). Buffered frames are never dropped here.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > self.config.max_frame_len {
            let stale = match find_magic(&self.buf, &self.config.magic) {
                Some(start) => start,
                None => self.buf.len().saturating_sub(MAGIC_LEN - 1),
            };
            discard(&mut self.buf, stale, &mut self.stats);
        }
    }

    /// Extract the next complete frame, or `None` if more data is needed.
    pub fn try_extract(&mut self) -> Option<RadarPacket> {
        extract_packet(&mut self.buf, &self.config, &mut self.stats)
    }

    /// Number of unconsumed bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop all unconsumed bytes. Statistics are kept.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl Default for ByteStreamSync {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan `buf` for the next valid frame and consume it.
///
/// Leading garbage and rejected magic-word matches are consumed as well.
/// Returns `None` when `buf` holds no complete valid frame; at that point
/// `buf` starts at a candidate magic word or holds at most `MAGIC_LEN - 1`
/// bytes.
pub fn extract_packet(
    buf: &mut BytesMut,
    config: &SyncConfig,
    stats: &mut SyncStats,
) -> Option<RadarPacket> {
    let prefix = config.min_frame_len();

    loop {
        let Some(start) = find_magic(buf, &config.magic) else {
            let stale = buf.len().saturating_sub(MAGIC_LEN - 1);
            discard(buf, stale, stats);
            trace!(buffered = buf.len(), "no magic word yet");
            return None;
        };
        discard(buf, start, stats);

        let Some(header) = FrameHeader::decode(&buf[MAGIC_LEN..], config.layout) else {
            trace!(buffered = buf.len(), "header incomplete");
            return None;
        };

        let total = match validate_length(&header, config) {
            Ok(total) => total,
            Err(err) => {
                reject(buf, stats, &header, &err);
                continue;
            }
        };

        if buf.len() < total {
            trace!(
                buffered = buf.len(),
                total,
                frame_number = header.frame_number,
                "frame incomplete"
            );
            return None;
        }

        match parse_tlvs(
            &buf[prefix..total],
            header.num_tlvs,
            config.max_trailing_padding,
        ) {
            Ok(spans) => {
                let frame = buf.split_to(total).freeze();
                stats.packets += 1;
                return Some(build_packet(frame, header, prefix, spans));
            }
            Err(err) => reject(buf, stats, &header, &err),
        }
    }
}

pub(crate) fn find_magic(haystack: &[u8], magic: &[u8; MAGIC_LEN]) -> Option<usize> {
    haystack
        .windows(MAGIC_LEN)
        .position(|window| window == magic)
}

fn discard(buf: &mut BytesMut, count: usize, stats: &mut SyncStats) {
    if count == 0 {
        return;
    }
    debug!(count, "discarding bytes ahead of frame start");
    buf.advance(count);
    stats.discarded_bytes += count as u64;
}

fn reject(buf: &mut BytesMut, stats: &mut SyncStats, header: &FrameHeader, err: &FrameError) {
    debug!(
        error = %err,
        frame_number = header.frame_number,
        "rejecting magic word match, resynchronizing"
    );
    stats.rejected += 1;
    buf.advance(1);
    stats.discarded_bytes += 1;
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;
    use crate::codec::tests::{raw_frame, sample_packet, wire};
    use crate::codec::{encode_packet, HeaderLayout, Tlv, MAGIC_WORD};
    use crate::tlv::{DETECTED_POINTS, RANGE_PROFILE};

    const COUNTING_MAGIC: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    /// Deterministic chunk sizes in `1..=max`.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, max: usize) -> usize {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize % max) + 1
        }
    }

    fn drain(sync: &mut ByteStreamSync) -> Vec<RadarPacket> {
        std::iter::from_fn(|| sync.try_extract()).collect()
    }

    #[test]
    fn single_tlv_frame_split_across_two_feeds() {
        let config = SyncConfig {
            magic: COUNTING_MAGIC,
            ..SyncConfig::default()
        };
        let header = FrameHeader {
            frame_number: 1,
            ..FrameHeader::default()
        };
        let packet = RadarPacket::assemble(
            header,
            vec![Tlv::new(DETECTED_POINTS, vec![0x5A; 20])],
            config.layout,
        )
        .unwrap();
        let bytes = wire(&packet, &config);
        assert_eq!(bytes.len(), 68);

        let mut sync = ByteStreamSync::with_config(config).unwrap();
        sync.feed(&bytes[..10]);
        assert!(sync.try_extract().is_none());

        sync.feed(&bytes[10..]);
        let extracted = sync.try_extract().expect("frame should be complete");
        assert_eq!(extracted.tlvs().len(), 1);
        assert_eq!(extracted.tlvs()[0].tlv_type(), DETECTED_POINTS);
        assert_eq!(extracted.tlvs()[0].payload().len(), 20);
        assert_eq!(extracted, packet);
        assert_eq!(sync.buffered(), 0);
        assert!(sync.try_extract().is_none());
    }

    #[test]
    fn multiple_frames_in_one_chunk() {
        let config = SyncConfig::default();
        let mut stream = Vec::new();
        for n in 0..4 {
            stream.extend(wire(&sample_packet(n), &config));
        }

        let mut sync = ByteStreamSync::new();
        sync.feed(&stream);
        let frames: Vec<u32> = drain(&mut sync).iter().map(|p| p.frame_number()).collect();

        assert_eq!(frames, vec![0, 1, 2, 3]);
        assert_eq!(sync.stats().packets, 4);
        assert_eq!(sync.stats().rejected, 0);
    }

    #[test]
    fn garbage_and_tiny_chunks_preserve_every_frame() {
        let config = SyncConfig::default();
        let mut rng = Lcg(0x5EED);
        let mut stream = Vec::new();
        for n in 0..25 {
            let garbage: Vec<u8> = (0..rng.next(40)).map(|_| rng.next(255) as u8).collect();
            stream.extend(garbage);
            stream.extend(wire(&sample_packet(n), &config));
        }
        // A partial magic word at the very end must not produce anything.
        stream.extend_from_slice(&MAGIC_WORD[..5]);

        for max_chunk in [1, 3, 7, 64] {
            let mut sync = ByteStreamSync::new();
            let mut extracted = Vec::new();
            let mut pos = 0;
            while pos < stream.len() {
                let end = (pos + rng.next(max_chunk)).min(stream.len());
                sync.feed(&stream[pos..end]);
                extracted.extend(drain(&mut sync));
                pos = end;
            }

            let numbers: Vec<u32> = extracted.iter().map(|p| p.frame_number()).collect();
            assert_eq!(numbers, (0..25).collect::<Vec<_>>(), "chunk {max_chunk}");
            assert!(extracted.iter().all(|p| *p == sample_packet(p.frame_number())));
            assert!(sync.buffered() < MAGIC_LEN);
        }
    }

    #[test]
    fn length_below_header_is_rejected_without_losing_next_frame() {
        let config = SyncConfig::default();
        let mut stream = raw_frame(&config, 12, 0, &[]);
        stream.extend(wire(&sample_packet(8), &config));

        let mut sync = ByteStreamSync::new();
        sync.feed(&stream);

        let packet = sync.try_extract().expect("valid frame follows the bad header");
        assert_eq!(packet.frame_number(), 8);
        assert_eq!(sync.stats().rejected, 1);
        assert_eq!(sync.stats().discarded_bytes, 40);
        assert!(sync.try_extract().is_none());
    }

    #[test]
    fn oversized_length_is_rejected() {
        let config = SyncConfig {
            max_frame_len: 256,
            ..SyncConfig::default()
        };
        let mut stream = raw_frame(&config, 10_000, 0, &[]);
        stream.extend(wire(&sample_packet(2), &config));

        let mut sync = ByteStreamSync::with_config(config).unwrap();
        sync.feed(&stream);

        assert_eq!(sync.try_extract().unwrap().frame_number(), 2);
        assert_eq!(sync.stats().rejected, 1);
    }

    #[test]
    fn tlv_sum_mismatch_rejects_frame_as_unit() {
        let config = SyncConfig::default();
        // 64-byte frame declaring 2 TLVs but holding a single 16-byte one.
        let mut stream = raw_frame(&config, 64, 2, &[(RANGE_PROFILE, 16, 16)]);
        stream.extend(wire(&sample_packet(5), &config));

        let mut sync = ByteStreamSync::new();
        sync.feed(&stream);

        let packets = drain(&mut sync);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].frame_number(), 5);
        assert_eq!(sync.stats().rejected, 1);
    }

    #[test]
    fn tlv_overrun_resumes_one_byte_past_magic() {
        let config = SyncConfig::default();
        let inner = wire(&sample_packet(77), &config);

        // Outer header claims exactly enough bytes to cover the inner frame,
        // but its only TLV declares more than the frame holds.
        let total = (40 + 8 + inner.len()) as u32;
        let mut stream = raw_frame(&config, total, 1, &[(DETECTED_POINTS, 9_999, 0)]);
        stream.extend_from_slice(&inner);

        let mut sync = ByteStreamSync::new();
        sync.feed(&stream);

        let packet = sync.try_extract().expect("embedded frame is recovered");
        assert_eq!(packet.frame_number(), 77);
        assert_eq!(sync.stats().rejected, 1);
        assert_eq!(sync.buffered(), 0);
    }

    #[test]
    fn magic_inside_payload_is_not_a_boundary() {
        let config = SyncConfig::default();
        let mut payload = vec![0u8; 16];
        payload.extend_from_slice(&MAGIC_WORD);
        payload.extend_from_slice(&[0u8; 16]);
        let packet = RadarPacket::assemble(
            FrameHeader::default(),
            vec![Tlv::new(DETECTED_POINTS, payload)],
            config.layout,
        )
        .unwrap();

        let mut sync = ByteStreamSync::new();
        sync.feed(&wire(&packet, &config));

        assert_eq!(sync.try_extract(), Some(packet));
        assert_eq!(sync.stats().rejected, 0);
        assert_eq!(sync.buffered(), 0);
    }

    #[test]
    fn garbage_without_magic_keeps_partial_match_tail() {
        let config = SyncConfig::default();
        let bytes = wire(&sample_packet(3), &config);

        let mut sync = ByteStreamSync::new();
        let mut chunk = vec![0xEE; 100];
        chunk.extend_from_slice(&bytes[..5]);
        sync.feed(&chunk);

        assert!(sync.try_extract().is_none());
        assert_eq!(sync.buffered(), MAGIC_LEN - 1);
        assert_eq!(sync.stats().discarded_bytes, 98);

        sync.feed(&bytes[5..]);
        assert_eq!(sync.try_extract().unwrap().frame_number(), 3);
    }

    #[test]
    fn incomplete_header_waits_for_data() {
        let config = SyncConfig::default();
        let bytes = wire(&sample_packet(4), &config);

        let mut sync = ByteStreamSync::new();
        sync.feed(&bytes[..MAGIC_LEN + 12]);
        assert!(sync.try_extract().is_none());
        assert_eq!(sync.buffered(), MAGIC_LEN + 12);
        assert_eq!(sync.stats().rejected, 0);
    }

    #[test]
    fn max_frame_len_below_header_is_rejected() {
        let config = SyncConfig {
            max_frame_len: 16,
            ..SyncConfig::default()
        };
        let err = ByteStreamSync::with_config(config).unwrap_err();
        assert!(matches!(err, FrameError::InvalidConfig(_)));

        let legacy = SyncConfig {
            layout: HeaderLayout::Legacy,
            max_frame_len: 36,
            ..SyncConfig::default()
        };
        assert!(ByteStreamSync::with_config(legacy.clone()).is_ok());
        let short = SyncConfig {
            max_frame_len: 35,
            ..legacy
        };
        assert!(ByteStreamSync::with_config(short).is_err());
    }

    #[test]
    fn feed_bounds_memory_under_sustained_garbage() {
        let config = SyncConfig {
            max_frame_len: 128,
            ..SyncConfig::default()
        };
        let mut sync = ByteStreamSync::with_config(config).unwrap();
        for _ in 0..50 {
            sync.feed(&[0xAB; 100]);
            assert!(sync.buffered() <= 128 + 100);
        }
        assert!(sync.buffered() < 128);
    }

    #[test]
    fn feed_bound_keeps_buffered_frames() {
        let config = SyncConfig {
            max_frame_len: 128,
            ..SyncConfig::default()
        };
        let mut stream = vec![0x42; 300];
        stream.extend(wire(&sample_packet(10), &config));
        stream.extend(wire(&sample_packet(11), &config));

        let mut sync = ByteStreamSync::with_config(config).unwrap();
        sync.feed(&stream);
        assert_eq!(sync.stats().discarded_bytes, 300);

        let numbers: Vec<u32> = drain(&mut sync).iter().map(|p| p.frame_number()).collect();
        assert_eq!(numbers, vec![10, 11]);
    }

    #[test]
    fn legacy_layout_stream() {
        let config = SyncConfig {
            layout: HeaderLayout::Legacy,
            ..SyncConfig::default()
        };
        let header = FrameHeader {
            frame_number: 31,
            ..FrameHeader::default()
        };
        let packet =
            RadarPacket::assemble(header, vec![Tlv::new(RANGE_PROFILE, vec![1; 8])], config.layout)
                .unwrap();
        let mut bytes = BytesMut::new();
        encode_packet(&packet, &config, &mut bytes).unwrap();
        bytes.put_slice(&[0xFF; 3]);

        let mut sync = ByteStreamSync::with_config(config).unwrap();
        sync.feed(&bytes);
        let extracted = sync.try_extract().unwrap();
        assert_eq!(extracted.header().subframe_number, None);
        assert_eq!(extracted.raw_length(), 36 + 16);
        assert_eq!(sync.buffered(), 3);
    }

    #[test]
    fn clear_drops_pending_bytes() {
        let config = SyncConfig::default();
        let bytes = wire(&sample_packet(1), &config);

        let mut sync = ByteStreamSync::new();
        sync.feed(&bytes[..60]);
        assert!(sync.try_extract().is_none());
        sync.clear();
        sync.feed(&bytes[60..]);

        assert!(sync.try_extract().is_none());
        assert_eq!(sync.stats().packets, 0);
    }
}

use std::ops::Range;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Length of the synchronization magic word.
pub const MAGIC_LEN: usize = 8;

/// Magic word the TI mmWave SDK emits ahead of every frame.
pub const MAGIC_WORD: [u8; MAGIC_LEN] = [0x02, 0x01, 0x04, 0x03, 0x06, 0x05, 0x08, 0x07];

/// TLV prefix: type (4) + length (4).
pub const TLV_HEADER_SIZE: usize = 8;

/// Default upper bound on `total_packet_len`: 64 KiB.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Which header fields follow the magic word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderLayout {
    /// Eight `u32` fields ending with `subframe_number` (32 bytes).
    #[default]
    WithSubframe,
    /// Seven `u32` fields, no `subframe_number` (28 bytes).
    Legacy,
}

impl HeaderLayout {
    /// Header size in bytes, excluding the magic word.
    pub const fn header_size(self) -> usize {
        match self {
            HeaderLayout::WithSubframe => 32,
            HeaderLayout::Legacy => 28,
        }
    }

    /// Magic word plus header: the smallest possible frame.
    pub const fn frame_prefix_size(self) -> usize {
        MAGIC_LEN + self.header_size()
    }
}

/// Fixed-layout frame header (the magic word is not retained).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    pub version: u32,
    /// Total frame length including magic word and header.
    pub total_packet_len: u32,
    pub platform: u32,
    /// Sensor-assigned sequence counter. Reported, never validated.
    pub frame_number: u32,
    pub time_cpu_cycles: u32,
    pub num_detected_obj: u32,
    pub num_tlvs: u32,
    /// Present only with [`HeaderLayout::WithSubframe`].
    pub subframe_number: Option<u32>,
}

impl FrameHeader {
    /// Decode header fields from `src`, which starts right after the magic word.
    ///
    /// Returns `None` if `src` is shorter than the layout's header size.
    pub fn decode(mut src: &[u8], layout: HeaderLayout) -> Option<Self> {
        if src.len() < layout.header_size() {
            return None;
        }

        Some(Self {
            version: src.get_u32_le(),
            total_packet_len: src.get_u32_le(),
            platform: src.get_u32_le(),
            frame_number: src.get_u32_le(),
            time_cpu_cycles: src.get_u32_le(),
            num_detected_obj: src.get_u32_le(),
            num_tlvs: src.get_u32_le(),
            subframe_number: match layout {
                HeaderLayout::WithSubframe => Some(src.get_u32_le()),
                HeaderLayout::Legacy => None,
            },
        })
    }

    /// Append the header fields (without magic word) to `dst`.
    pub fn encode(&self, layout: HeaderLayout, dst: &mut BytesMut) {
        dst.reserve(layout.header_size());
        dst.put_u32_le(self.version);
        dst.put_u32_le(self.total_packet_len);
        dst.put_u32_le(self.platform);
        dst.put_u32_le(self.frame_number);
        dst.put_u32_le(self.time_cpu_cycles);
        dst.put_u32_le(self.num_detected_obj);
        dst.put_u32_le(self.num_tlvs);
        if layout == HeaderLayout::WithSubframe {
            dst.put_u32_le(self.subframe_number.unwrap_or(0));
        }
    }
}

/// One type-length-value record. The payload is opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tlv_type: u32,
    payload: Bytes,
}

impl Tlv {
    /// Create a TLV record.
    pub fn new(tlv_type: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            tlv_type,
            payload: payload.into(),
        }
    }

    pub fn tlv_type(&self) -> u32 {
        self.tlv_type
    }

    /// Payload length, excluding the 8-byte type/length prefix.
    pub fn length(&self) -> u32 {
        self.payload.len() as u32
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Bytes this record occupies on the wire (prefix + payload).
    pub fn wire_size(&self) -> usize {
        TLV_HEADER_SIZE + self.payload.len()
    }
}

/// A complete, length-validated radar frame.
///
/// Immutable once constructed. TLV payloads share the frame's backing buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarPacket {
    header: FrameHeader,
    tlvs: Vec<Tlv>,
    raw_length: u32,
}

impl RadarPacket {
    /// Build a packet from parts, filling in `total_packet_len`, `num_tlvs`
    /// and `subframe_number` so the header reconciles with `tlvs` under `layout`.
    pub fn assemble(mut header: FrameHeader, tlvs: Vec<Tlv>, layout: HeaderLayout) -> Result<Self> {
        let size = layout.frame_prefix_size() + tlvs.iter().map(Tlv::wire_size).sum::<usize>();
        let max = u32::MAX as usize;
        if size > max {
            return Err(FrameError::PacketTooLarge { size, max });
        }

        header.total_packet_len = size as u32;
        header.num_tlvs = tlvs.len() as u32;
        header.subframe_number = match layout {
            HeaderLayout::WithSubframe => Some(header.subframe_number.unwrap_or(0)),
            HeaderLayout::Legacy => None,
        };

        Ok(Self {
            header,
            tlvs,
            raw_length: size as u32,
        })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn tlvs(&self) -> &[Tlv] {
        &self.tlvs
    }

    /// Number of wire bytes this packet was decoded from.
    pub fn raw_length(&self) -> u32 {
        self.raw_length
    }

    pub fn frame_number(&self) -> u32 {
        self.header.frame_number
    }

    /// First TLV of the given type, if any.
    pub fn find_tlv(&self, tlv_type: u32) -> Option<&Tlv> {
        self.tlvs.iter().find(|tlv| tlv.tlv_type == tlv_type)
    }
}

/// Stream synchronization settings.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Frame start marker. Default: [`MAGIC_WORD`].
    pub magic: [u8; MAGIC_LEN],
    /// Header layout. Default: [`HeaderLayout::WithSubframe`].
    pub layout: HeaderLayout,
    /// Largest `total_packet_len` accepted. Default: 64 KiB.
    pub max_frame_len: usize,
    /// Bytes tolerated after the last TLV. Default: 0 (exact reconciliation).
    pub max_trailing_padding: usize,
}

impl SyncConfig {
    /// Smallest acceptable `total_packet_len` (magic word + header).
    pub fn min_frame_len(&self) -> usize {
        self.layout.frame_prefix_size()
    }

    /// Check that a frame with no TLVs fits under `max_frame_len`.
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_len < self.min_frame_len() {
            return Err(FrameError::InvalidConfig(format!(
                "max_frame_len {} is below the {}-byte frame prefix",
                self.max_frame_len,
                self.min_frame_len()
            )));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            magic: MAGIC_WORD,
            layout: HeaderLayout::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            max_trailing_padding: 0,
        }
    }
}

/// Encode a packet into the serial wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────────────────────┬──────────────────────────────────┐
/// │ Magic (8B)   │ Header (28B / 32B)     │ num_tlvs × [type │ len │ payload] │
/// │              │ u32 LE fields          │             4B LE  4B LE  len B  │
/// └──────────────┴────────────────────────┴──────────────────────────────────┘
/// ```
///
/// Fails if the packet's header does not reconcile with `config.layout`.
pub fn encode_packet(packet: &RadarPacket, config: &SyncConfig, dst: &mut BytesMut) -> Result<()> {
    let expected =
        config.min_frame_len() + packet.tlvs.iter().map(Tlv::wire_size).sum::<usize>();
    if packet.header.total_packet_len as usize != expected {
        return Err(FrameError::InvalidLength {
            declared: packet.header.total_packet_len,
            min: expected,
            max: expected,
        });
    }

    dst.reserve(expected);
    dst.put_slice(&config.magic);
    packet.header.encode(config.layout, dst);
    for tlv in &packet.tlvs {
        dst.put_u32_le(tlv.tlv_type);
        dst.put_u32_le(tlv.length());
        dst.put_slice(&tlv.payload);
    }
    Ok(())
}

/// Decode one complete frame that starts with the magic word.
///
/// Bytes beyond `total_packet_len` are ignored.
pub fn decode_packet(frame: Bytes, config: &SyncConfig) -> Result<RadarPacket> {
    let prefix = config.min_frame_len();
    if frame.len() < prefix {
        return Err(FrameError::Truncated {
            needed: prefix,
            available: frame.len(),
        });
    }
    if frame[..MAGIC_LEN] != config.magic {
        return Err(FrameError::InvalidMagic);
    }

    let header = FrameHeader::decode(&frame[MAGIC_LEN..], config.layout).ok_or(
        FrameError::Truncated {
            needed: prefix,
            available: frame.len(),
        },
    )?;
    let total = validate_length(&header, config)?;
    if frame.len() < total {
        return Err(FrameError::Truncated {
            needed: total,
            available: frame.len(),
        });
    }

    let spans = parse_tlvs(
        &frame[prefix..total],
        header.num_tlvs,
        config.max_trailing_padding,
    )?;
    Ok(build_packet(frame.slice(..total), header, prefix, spans))
}

/// Check `total_packet_len` against `[magic + header, max_frame_len]`.
pub(crate) fn validate_length(header: &FrameHeader, config: &SyncConfig) -> Result<usize> {
    let total = header.total_packet_len as usize;
    let min = config.min_frame_len();
    if total < min || total > config.max_frame_len {
        return Err(FrameError::InvalidLength {
            declared: header.total_packet_len,
            min,
            max: config.max_frame_len,
        });
    }
    Ok(total)
}

/// Walk the TLV records in `body` (the bytes after the header).
///
/// Returns `(type, payload range)` pairs relative to `body`.
pub(crate) fn parse_tlvs(
    body: &[u8],
    declared: u32,
    allowed_padding: usize,
) -> Result<Vec<(u32, Range<usize>)>> {
    let mut spans = Vec::with_capacity((declared as usize).min(body.len() / TLV_HEADER_SIZE));
    let mut offset = 0usize;

    for index in 0..declared {
        let remaining = body.len() - offset;
        if remaining < TLV_HEADER_SIZE {
            return Err(FrameError::TlvCountMismatch {
                declared,
                parsed: index,
            });
        }

        let mut prefix = &body[offset..offset + TLV_HEADER_SIZE];
        let tlv_type = prefix.get_u32_le();
        let length = prefix.get_u32_le();

        let available = remaining - TLV_HEADER_SIZE;
        if length as usize > available {
            return Err(FrameError::TlvOverrun {
                index,
                length,
                available,
            });
        }

        let start = offset + TLV_HEADER_SIZE;
        let end = start + length as usize;
        spans.push((tlv_type, start..end));
        offset = end;
    }

    let trailing = body.len() - offset;
    if trailing > allowed_padding {
        return Err(FrameError::TrailingBytes {
            trailing,
            allowed: allowed_padding,
        });
    }

    Ok(spans)
}

pub(crate) fn build_packet(
    frame: Bytes,
    header: FrameHeader,
    body_offset: usize,
    spans: Vec<(u32, Range<usize>)>,
) -> RadarPacket {
    let tlvs = spans
        .into_iter()
        .map(|(tlv_type, range)| Tlv {
            tlv_type,
            payload: frame.slice(body_offset + range.start..body_offset + range.end),
        })
        .collect();

    RadarPacket {
        header,
        tlvs,
        raw_length: frame.len() as u32,
    }
}

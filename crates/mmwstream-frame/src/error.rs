/// Errors that can occur while acquiring, decoding or encoding radar frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame does not start with the configured magic word.
    #[error("frame does not start with the magic word")]
    InvalidMagic,

    /// Fewer bytes than the fixed frame prefix (magic word + header).
    #[error("truncated frame ({available} bytes, need at least {needed})")]
    Truncated { needed: usize, available: usize },

    /// The header declares a total length outside the accepted range.
    #[error("declared packet length {declared} outside [{min}, {max}]")]
    InvalidLength { declared: u32, min: usize, max: usize },

    /// A TLV's declared length runs past the end of the frame.
    #[error("tlv #{index} declares {length} bytes, only {available} remain")]
    TlvOverrun {
        index: u32,
        length: u32,
        available: usize,
    },

    /// The frame ran out of bytes before `num_tlvs` records were parsed.
    #[error("header declares {declared} tlvs, frame holds {parsed}")]
    TlvCountMismatch { declared: u32, parsed: u32 },

    /// Bytes remain after the last TLV.
    #[error("{trailing} bytes after the last tlv (allowed {allowed})")]
    TrailingBytes { trailing: usize, allowed: usize },

    /// A UDP datagram's length differs from the configured frame size.
    #[error("datagram size mismatch: expected {expected} bytes, got {received}")]
    SizeMismatch { expected: usize, received: usize },

    /// A packet being encoded does not fit the 32-bit length fields.
    #[error("packet too large ({size} bytes, max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// A reader was constructed with unusable parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The transport could not be opened or configured.
    #[error("transport error: {0}")]
    Transport(#[from] mmwstream_transport::TransportError),

    /// An I/O error occurred while reading from the transport.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True for header/TLV validation failures. These are recovered inside
    /// the sync layer and never reach `read_packet` callers.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidMagic
                | FrameError::Truncated { .. }
                | FrameError::InvalidLength { .. }
                | FrameError::TlvOverrun { .. }
                | FrameError::TlvCountMismatch { .. }
                | FrameError::TrailingBytes { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

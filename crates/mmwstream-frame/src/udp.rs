use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use bytes::Bytes;
use mmwstream_transport::{bind_udp, UdpSocketOptions, DEFAULT_RECV_BUFFER_SIZE};
use tracing::{trace, warn};

use crate::batch::{collect_batch, BatchResult};
use crate::error::{FrameError, Result};

/// Default receive timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

// Larger than any datagram, so oversized frames are measured, not truncated.
const SCRATCH_SIZE: usize = 64 * 1024;

/// What to do with a datagram whose length differs from `frame_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeMismatchPolicy {
    /// Return [`FrameError::SizeMismatch`] to the caller.
    #[default]
    Reject,
    /// Log and count the datagram, then keep waiting for the rest of the
    /// same timeout window.
    Skip,
}

/// Configuration for [`UdpFrameReader`].
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Exact datagram length of one frame.
    pub frame_size: usize,
    /// Time one `read_frame` call waits for a datagram. Default: 1 s.
    pub timeout: Duration,
    pub mismatch_policy: SizeMismatchPolicy,
    /// Default: true.
    pub reuse_address: bool,
    /// Requested kernel receive buffer. Default: 64 KiB.
    pub recv_buffer_size: usize,
}

impl UdpConfig {
    /// Defaults for the given frame size.
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            mismatch_policy: SizeMismatchPolicy::default(),
            reuse_address: true,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.frame_size == 0 || self.frame_size > MAX_DATAGRAM_SIZE {
            return Err(FrameError::InvalidConfig(format!(
                "frame_size must be in 1..={MAX_DATAGRAM_SIZE}, got {}",
                self.frame_size
            )));
        }
        if self.timeout.is_zero() {
            return Err(FrameError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Counters for a UDP reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UdpStats {
    /// Frames returned.
    pub frames: u64,
    /// Datagrams whose size did not match `frame_size`.
    pub mismatched: u64,
}

/// Receives fixed-size frames from a bound UDP socket.
///
/// Each datagram is one candidate frame; no reassembly is performed.
pub struct UdpFrameReader {
    socket: UdpSocket,
    config: UdpConfig,
    scratch: Vec<u8>,
    stats: UdpStats,
    timeout_shortened: bool,
}

impl UdpFrameReader {
    /// Bind `(interface, port)` and expect `frame_size`-byte datagrams,
    /// waiting at most `timeout_ms` per frame.
    pub fn new(interface: &str, port: u16, frame_size: usize, timeout_ms: u64) -> Result<Self> {
        let config = UdpConfig {
            timeout: Duration::from_millis(timeout_ms),
            ..UdpConfig::new(frame_size)
        };
        Self::with_config(interface, port, config)
    }

    /// Bind with explicit configuration.
    pub fn with_config(interface: &str, port: u16, config: UdpConfig) -> Result<Self> {
        config.validate()?;

        let options = UdpSocketOptions {
            reuse_address: config.reuse_address,
            recv_buffer_size: config.recv_buffer_size,
            read_timeout: Some(config.timeout),
        };
        let socket = bind_udp(interface, port, &options)?;

        Ok(Self {
            socket,
            config,
            scratch: vec![0u8; SCRATCH_SIZE],
            stats: UdpStats::default(),
            timeout_shortened: false,
        })
    }

    /// Wait for one frame.
    ///
    /// Returns `Ok(None)` if no acceptable datagram arrives within the
    /// timeout. A datagram of the wrong size is handled per
    /// [`SizeMismatchPolicy`]; it is never truncated or padded.
    pub fn read_frame(&mut self) -> Result<Option<Bytes>> {
        let deadline = Instant::now() + self.config.timeout;
        let result = self.receive_until(deadline);

        if self.timeout_shortened {
            self.socket.set_read_timeout(Some(self.config.timeout))?;
            self.timeout_shortened = false;
        }

        result
    }

    /// Read up to `n` frames, stopping at the first timeout.
    pub fn read_frames(&mut self, n: usize) -> BatchResult<Bytes> {
        collect_batch(n, || self.read_frame())
    }

    fn receive_until(&mut self, deadline: Instant) -> Result<Option<Bytes>> {
        let expected = self.config.frame_size;

        loop {
            let received = match self.socket.recv(&mut self.scratch) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    trace!("no datagram before timeout");
                    return Ok(None);
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if received == expected {
                self.stats.frames += 1;
                return Ok(Some(Bytes::copy_from_slice(&self.scratch[..received])));
            }

            self.stats.mismatched += 1;
            if self.config.mismatch_policy == SizeMismatchPolicy::Reject {
                return Err(FrameError::SizeMismatch { expected, received });
            }

            warn!(expected, received, "skipping datagram with unexpected size");
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            self.socket.set_read_timeout(Some(remaining))?;
            self.timeout_shortened = true;
        }
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn frame_size(&self) -> usize {
        self.config.frame_size
    }

    pub fn config(&self) -> &UdpConfig {
        &self.config
    }

    pub fn stats(&self) -> UdpStats {
        self.stats
    }

    /// Borrow the underlying socket.
    pub fn get_ref(&self) -> &UdpSocket {
        &self.socket
    }
}

impl std::fmt::Debug for UdpFrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpFrameReader")
            .field("local_addr", &self.socket.local_addr().ok())
            .field("frame_size", &self.config.frame_size)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

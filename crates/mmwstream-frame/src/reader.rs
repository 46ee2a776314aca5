use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use mmwstream_transport::{SerialConfig, SerialStream};
use tracing::trace;

use crate::batch::{collect_batch, BatchResult};
use crate::codec::{RadarPacket, SyncConfig};
use crate::error::{FrameError, Result};
use crate::sync::{ByteStreamSync, SyncStats};

/// Default size of one physical read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration for [`SerialFrameReader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Stream synchronization settings.
    pub sync: SyncConfig,
    /// Upper bound on bytes requested per physical read. Default: 4 KiB.
    pub read_chunk_size: usize,
    /// Overall deadline for one `read_packet` call. Default: none, so a call
    /// ends only when a read returns no data.
    pub packet_timeout: Option<Duration>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            packet_timeout: None,
        }
    }
}

/// Reads validated radar packets from any byte-oriented `Read` source.
///
/// Short reads are expected and accumulated internally; callers always
/// get complete frames. A read that times out or returns no data makes
/// [`read_packet`](Self::read_packet) return `Ok(None)`.
pub struct SerialFrameReader<T> {
    inner: T,
    sync: ByteStreamSync,
    chunk: Vec<u8>,
    packet_timeout: Option<Duration>,
}

impl<T: Read> SerialFrameReader<T> {
    /// Create a reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            sync: ByteStreamSync::new(),
            chunk: vec![0u8; DEFAULT_READ_CHUNK_SIZE],
            packet_timeout: None,
        }
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Result<Self> {
        Ok(Self {
            inner,
            sync: ByteStreamSync::with_config(config.sync)?,
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            packet_timeout: config.packet_timeout,
        })
    }

    /// Read the next packet (blocking, bounded by the transport's read timeout).
    ///
    /// Already-buffered frames are returned without touching the transport.
    /// Returns `Ok(None)` when a physical read yields no data, or when the
    /// configured `packet_timeout` expires. Transport faults are returned as
    /// [`FrameError::Io`] and are not retried.
    pub fn read_packet(&mut self) -> Result<Option<RadarPacket>> {
        let deadline = self.packet_timeout.map(|timeout| Instant::now() + timeout);

        loop {
            if let Some(packet) = self.sync.try_extract() {
                return Ok(Some(packet));
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                trace!("packet deadline expired");
                return Ok(None);
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => 0,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                trace!(buffered = self.sync.buffered(), "read returned no data");
                return Ok(None);
            }

            self.sync.feed(&self.chunk[..read]);
        }
    }

    /// Read up to `n` packets, stopping at the first timeout.
    ///
    /// On a transport fault the packets read so far travel in the error.
    pub fn read_packets(&mut self, n: usize) -> BatchResult<RadarPacket> {
        collect_batch(n, || self.read_packet())
    }

    /// Scanner statistics.
    pub fn stats(&self) -> SyncStats {
        self.sync.stats()
    }

    /// Bytes buffered but not yet part of an extracted packet.
    pub fn buffered(&self) -> usize {
        self.sync.buffered()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl SerialFrameReader<SerialStream> {
    /// Open a serial port and wrap it in a reader.
    pub fn open(port: &str, serial: &SerialConfig, config: ReaderConfig) -> Result<Self> {
        config.sync.validate()?;
        let stream = SerialStream::open(port, serial)?;
        Self::with_config(stream, config)
    }

    /// Discard both driver-side and reader-side pending bytes.
    pub fn clear_input(&mut self) -> Result<()> {
        self.inner.clear_input()?;
        self.sync.clear();
        Ok(())
    }
}

use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_packet, RadarPacket, SyncConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes packets in the serial wire format to any `Write` sink.
///
/// Used to produce capture files and synthetic streams.
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
    config: SyncConfig,
}

impl<T: Write> PacketWriter<T> {
    /// Create a writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, SyncConfig::default())
    }

    /// Create a writer with explicit magic word and header layout.
    pub fn with_config(inner: T, config: SyncConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and write one packet.
    pub fn write_packet(&mut self, packet: &RadarPacket) -> Result<()> {
        self.buf.clear();
        encode_packet(packet, &self.config, &mut self.buf)?;
        self.write_buffered()
    }

    /// Write raw bytes unchanged, e.g. line noise between frames.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

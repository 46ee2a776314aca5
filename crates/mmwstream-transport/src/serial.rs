use std::io::Read;
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortInfo, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default data-UART baud rate (115200 × 9).
pub const DEFAULT_BAUD_RATE: u32 = 1_036_800;

/// Default timeout for a single physical read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Serial port settings. The line format is always 8N1 without flow control.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. Default: 1036800.
    pub baud_rate: u32,
    /// Maximum time one physical read blocks before reporting no data. Default: 10 ms.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// An open serial port, exclusively owned. Implements [`Read`].
///
/// The port is closed when the stream is dropped.
pub struct SerialStream {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialStream {
    /// Open `path` (e.g. `/dev/ttyUSB1`, `COM4`) with the given settings.
    pub fn open(path: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: path.to_string(),
                source,
            })?;

        info!(
            port = path,
            baud = config.baud_rate,
            timeout = ?config.read_timeout,
            "opened serial port"
        );

        Ok(Self {
            port,
            name: path.to_string(),
        })
    }

    /// The path this stream was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current per-read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.port.timeout()
    }

    /// Discard bytes received by the driver but not yet read.
    pub fn clear_input(&self) -> Result<()> {
        debug!(port = %self.name, "clearing serial input buffer");
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    /// Number of bytes waiting in the driver's receive buffer.
    pub fn bytes_to_read(&self) -> Result<u32> {
        Ok(self.port.bytes_to_read()?)
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("name", &self.name)
            .finish()
    }
}

/// Enumerate serial ports present on this host.
pub fn available_ports() -> Result<Vec<SerialPortInfo>> {
    Ok(serialport::available_ports()?)
}

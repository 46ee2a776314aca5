use std::net::SocketAddr;

/// Errors that can occur while opening or using a radar transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial port.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Failed to bind the UDP socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The interface string could not be resolved to a socket address.
    #[error("cannot resolve interface {interface:?}: {source}")]
    Resolve {
        interface: String,
        source: std::io::Error,
    },

    /// A serial port operation other than open failed.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

//! Physical transports for mmWave radar acquisition.
//!
//! Two transports are provided:
//! - Serial ports (the sensor's data UART), via [`SerialStream`]
//! - Bound UDP sockets (the sensor's streaming mode), via [`bind_udp`]
//!
//! This is the lowest layer of mmwstream. Frame synchronization and
//! validation live in `mmwstream-frame`; this crate only opens, configures
//! and owns the handles.

pub mod error;
pub mod serial;
pub mod udp;

pub use error::{Result, TransportError};
pub use serial::{
    available_ports, SerialConfig, SerialStream, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT,
};
pub use serialport::{SerialPortInfo, SerialPortType};
pub use udp::{bind_udp, resolve_interface, UdpSocketOptions, DEFAULT_RECV_BUFFER_SIZE};

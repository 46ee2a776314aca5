use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default kernel receive buffer requested for radar sockets.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 64 * 1024;

/// Socket options applied before binding.
#[derive(Debug, Clone)]
pub struct UdpSocketOptions {
    /// Set `SO_REUSEADDR` so a restarted reader can rebind immediately. Default: true.
    pub reuse_address: bool,
    /// Requested `SO_RCVBUF` in bytes. The kernel may round it. Default: 64 KiB.
    pub recv_buffer_size: usize,
    /// Receive timeout. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
}

impl Default for UdpSocketOptions {
    fn default() -> Self {
        Self {
            reuse_address: true,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            read_timeout: None,
        }
    }
}

/// Resolve `(interface, port)` to a socket address.
///
/// `interface` may be an IPv4/IPv6 literal (`0.0.0.0`, `::1`) or a host name.
pub fn resolve_interface(interface: &str, port: u16) -> Result<SocketAddr> {
    if let Ok(ip) = interface.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let resolve_err = |source| TransportError::Resolve {
        interface: interface.to_string(),
        source,
    };
    (interface, port)
        .to_socket_addrs()
        .map_err(resolve_err)?
        .next()
        .ok_or_else(|| {
            resolve_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no addresses returned",
            ))
        })
}

/// Create a UDP socket, apply `options`, and bind it to `(interface, port)`.
///
/// Datagrams from any sender are accepted.
pub fn bind_udp(interface: &str, port: u16, options: &UdpSocketOptions) -> Result<UdpSocket> {
    let addr = resolve_interface(interface, port)?;
    let bind_err = |source| TransportError::Bind { addr, source };

    let socket =
        Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
    socket
        .set_reuse_address(options.reuse_address)
        .map_err(bind_err)?;
    socket
        .set_recv_buffer_size(options.recv_buffer_size)
        .map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;

    let socket: UdpSocket = socket.into();
    socket.set_read_timeout(options.read_timeout)?;

    let local = socket.local_addr()?;
    debug!(
        requested = options.recv_buffer_size,
        reuse_address = options.reuse_address,
        "udp socket options applied"
    );
    info!(%local, "bound udp socket");

    Ok(socket)
}

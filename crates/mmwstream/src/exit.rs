use std::fmt;
use std::io;

use mmwstream_frame::FrameError;
use mmwstream_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// A fault on an open device or socket. Anything not timing or permission
/// related is the link going away, not a bug.
fn stream_fault(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { .. } => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        TransportError::Resolve { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Io(source) => stream_fault(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => stream_fault(context, source),
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::SizeMismatch { .. } | FrameError::PacketTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other if other.is_protocol_violation() => {
            CliError::new(DATA_INVALID, format!("{context}: {other}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

/// Like [`frame_error`], for readers and writers backed by a file.
pub fn file_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        other => frame_error(context, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_is_data_invalid() {
        let err = frame_error(
            "receive failed",
            FrameError::SizeMismatch {
                expected: 16,
                received: 10,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("receive failed: "));
    }

    #[test]
    fn invalid_config_is_usage() {
        let err = frame_error("bind failed", FrameError::InvalidConfig("x".into()));
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn io_timeout_maps_to_124() {
        let err = frame_error("read failed", FrameError::Io(io::ErrorKind::TimedOut.into()));
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn mid_stream_read_faults_are_transport_errors() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::Other,
            io::ErrorKind::UnexpectedEof,
            io::ErrorKind::NotFound,
        ] {
            let err = frame_error("read failed", FrameError::Io(kind.into()));
            assert_eq!(err.code, TRANSPORT_ERROR, "{kind:?}");
        }
        let err = frame_error(
            "read failed",
            FrameError::Io(io::ErrorKind::PermissionDenied.into()),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn file_faults_keep_io_codes() {
        let err = file_error("write failed", FrameError::Io(io::ErrorKind::Other.into()));
        assert_eq!(err.code, INTERNAL);
        let err = file_error("read failed", FrameError::InvalidConfig("x".into()));
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn transport_fault_through_frame_error() {
        let err = frame_error(
            "read failed",
            FrameError::Transport(TransportError::Io(io::ErrorKind::BrokenPipe.into())),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);

        let err = transport_error(
            "open failed",
            TransportError::Resolve {
                interface: "nowhere".into(),
                source: io::ErrorKind::NotFound.into(),
            },
        );
        assert_eq!(err.code, USAGE);
    }
}

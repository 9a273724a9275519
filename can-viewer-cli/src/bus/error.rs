//! Bus adapter errors

use std::io;
use thiserror::Error;

/// Errors raised while opening, reading or closing a CAN bus
#[derive(Error, Debug)]
pub enum BusError {
    /// The transport could not be opened (interface missing, permission denied, ...)
    #[error("cannot open CAN interface '{iface}'")]
    Open {
        iface: String,
        #[source]
        source: io::Error,
    },

    /// Hardware backend error reported by the bmcan adapter
    #[error(transparent)]
    Bmcan(#[from] BmError),

    /// No transport implements the requested interface kind
    #[error("unsupported interface kind '{0}'")]
    UnsupportedInterface(String),

    /// CAN transports are not available on this platform
    #[cfg(not(target_os = "linux"))]
    #[error("CAN interface '{0}' is not supported on this platform")]
    UnsupportedPlatform(String),

    /// Reading from an open transport failed
    #[error("receive on '{iface}' failed")]
    Receive {
        iface: String,
        #[source]
        source: io::Error,
    },

    /// The session was used after it had been shut down
    #[error("CAN bus '{0}' is already shut down")]
    Closed(String),
}

/// Error reported by a bmcan adapter call
///
/// Carries the failing function and the adapter's error code; it adds no
/// behaviour beyond its message.
#[derive(Error, Debug)]
#[error("{function} failed ({description})")]
pub struct BmError {
    pub code: i32,
    pub function: String,
    pub description: String,
}

impl BmError {
    pub fn new(code: i32, function: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code,
            function: function.into(),
            description: description.into(),
        }
    }

    /// Wrap an OS error raised by `function`
    pub fn from_io(function: impl Into<String>, err: &io::Error) -> Self {
        Self::new(err.raw_os_error().unwrap_or(-1), function, err.to_string())
    }
}

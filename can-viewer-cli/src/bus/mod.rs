//! CAN bus adapter layer
//!
//! Resolves the command-line interface kind into concrete open parameters,
//! opens the matching transport, and wraps it in a [`BusSession`] that
//! guarantees a single shutdown on every exit path.

use can_viewer_decoder::CanFrame;
use std::fmt;
use std::time::Duration;

pub mod error;

#[cfg(target_os = "linux")]
pub mod socketcan;

#[cfg(test)]
pub(crate) mod scripted;

pub use error::{BmError, BusError};

/// Data-phase bitrate forced for the bmcan and pcan adapters
pub const FORCED_DATA_BITRATE: u32 = 2_000_000;

/// Interface kind selected with `--interface`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusKind {
    Bmcan,
    Pcan,
    SocketCan,
    /// Any other name, passed through literally
    Other(String),
}

impl BusKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "bmcan" => BusKind::Bmcan,
            "pcan" => BusKind::Pcan,
            "socketcan" => BusKind::SocketCan,
            other => BusKind::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BusKind::Bmcan => "bmcan",
            BusKind::Pcan => "pcan",
            BusKind::SocketCan => "socketcan",
            BusKind::Other(name) => name,
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Channel to open on the selected backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSpec {
    /// Logical channel number
    Index(u32),
    /// Channel name given by the user
    Name(String),
}

impl ChannelSpec {
    /// Network interface name backing this channel
    pub fn interface_name(&self) -> String {
        match self {
            ChannelSpec::Index(index) => format!("can{}", index),
            ChannelSpec::Name(name) => name.clone(),
        }
    }
}

/// Fully resolved parameters for opening a bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenParams {
    pub kind: BusKind,
    pub channel: ChannelSpec,
    /// Nominal (arbitration phase) bitrate in bit/s
    pub bitrate: u32,
    /// Data phase bitrate, when the backend is told one
    pub data_bitrate: Option<u32>,
    /// Timestamp frames with microsecond resolution
    pub time_resolution: bool,
    /// `Some(false)` forces classic CAN, `None` leaves the backend default
    pub fd: Option<bool>,
}

/// Resolve the open parameters for an interface kind
///
/// - bmcan always uses logical channel 0 and forces the data bitrate, time
///   resolution on and CAN-FD off.
/// - pcan uses the caller's channel with the same forced options.
/// - Every other kind uses the caller's channel and bitrate as given.
pub fn resolve_open_params(kind: BusKind, channel: &str, bitrate: u32) -> OpenParams {
    match kind {
        BusKind::Bmcan => OpenParams {
            kind,
            channel: ChannelSpec::Index(0),
            bitrate,
            data_bitrate: Some(FORCED_DATA_BITRATE),
            time_resolution: true,
            fd: Some(false),
        },
        BusKind::Pcan => OpenParams {
            kind,
            channel: ChannelSpec::Name(channel.to_string()),
            bitrate,
            data_bitrate: Some(FORCED_DATA_BITRATE),
            time_resolution: true,
            fd: Some(false),
        },
        kind => OpenParams {
            kind,
            channel: ChannelSpec::Name(channel.to_string()),
            bitrate,
            data_bitrate: None,
            time_resolution: false,
            fd: None,
        },
    }
}

/// A source of CAN frames
pub trait BusAdapter {
    /// Block for up to `timeout` waiting for a frame
    ///
    /// A timeout is `Ok(None)`, not an error.
    fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, BusError>;

    /// Release the underlying transport
    fn shutdown(&mut self) -> Result<(), BusError>;
}

/// Open the transport described by `params`
#[cfg(target_os = "linux")]
pub fn open(params: &OpenParams) -> Result<socketcan::SocketCanBus, BusError> {
    log::info!(
        "Opening {} bus on {} at {} bit/s",
        params.kind,
        params.channel.interface_name(),
        params.bitrate
    );

    match &params.kind {
        BusKind::Bmcan => socketcan::SocketCanBus::open(params).map_err(|err| match err {
            BusError::Open { iface, source } => {
                BmError::from_io(format!("open {}", iface), &source).into()
            }
            other => other,
        }),
        BusKind::Pcan | BusKind::SocketCan => socketcan::SocketCanBus::open(params),
        BusKind::Other(name) => Err(BusError::UnsupportedInterface(name.clone())),
    }
}

/// Open the transport described by `params`
#[cfg(not(target_os = "linux"))]
pub fn open(params: &OpenParams) -> Result<UnavailableBus, BusError> {
    Err(BusError::UnsupportedPlatform(params.kind.to_string()))
}

/// Placeholder transport type on platforms without SocketCAN
#[cfg(not(target_os = "linux"))]
pub enum UnavailableBus {}

#[cfg(not(target_os = "linux"))]
impl BusAdapter for UnavailableBus {
    fn receive(&mut self, _timeout: Duration) -> Result<Option<CanFrame>, BusError> {
        match *self {}
    }

    fn shutdown(&mut self) -> Result<(), BusError> {
        match *self {}
    }
}

/// An open bus that is shut down exactly once
///
/// [`BusSession::release`] shuts the adapter down and reports the result.
/// If the session is dropped without being released (early return, panic
/// unwinding), the drop performs the shutdown instead.
pub struct BusSession<B: BusAdapter> {
    bus: B,
    released: bool,
}

impl<B: BusAdapter> BusSession<B> {
    pub fn new(bus: B) -> Self {
        Self { bus, released: false }
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Shut the bus down
    pub fn release(mut self) -> Result<(), BusError> {
        self.released = true;
        self.bus.shutdown()
    }
}

impl<B: BusAdapter> Drop for BusSession<B> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.bus.shutdown() {
            log::warn!("CAN bus shutdown failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::scripted::ScriptedBus;
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!(BusKind::from_name("bmcan"), BusKind::Bmcan);
        assert_eq!(BusKind::from_name("pcan"), BusKind::Pcan);
        assert_eq!(BusKind::from_name("socketcan"), BusKind::SocketCan);
        assert_eq!(BusKind::from_name("kvaser"), BusKind::Other("kvaser".to_string()));
        assert_eq!(BusKind::from_name("kvaser").to_string(), "kvaser");
    }

    #[test]
    fn test_bmcan_forces_channel_zero() {
        let params = resolve_open_params(BusKind::Bmcan, "vcan5", 250_000);
        assert_eq!(params.channel, ChannelSpec::Index(0));
        assert_eq!(params.channel.interface_name(), "can0");
        assert_eq!(params.bitrate, 250_000);
        assert_eq!(params.data_bitrate, Some(2_000_000));
        assert!(params.time_resolution);
        assert_eq!(params.fd, Some(false));
    }

    #[test]
    fn test_pcan_keeps_channel_with_forced_options() {
        let params = resolve_open_params(BusKind::Pcan, "can1", 500_000);
        assert_eq!(params.channel, ChannelSpec::Name("can1".to_string()));
        assert_eq!(params.data_bitrate, Some(FORCED_DATA_BITRATE));
        assert!(params.time_resolution);
        assert_eq!(params.fd, Some(false));
    }

    #[test]
    fn test_other_kinds_pass_through() {
        for kind in [BusKind::SocketCan, BusKind::Other("virtual".to_string())] {
            let params = resolve_open_params(kind.clone(), "vcan0", 125_000);
            assert_eq!(params.kind, kind);
            assert_eq!(params.channel.interface_name(), "vcan0");
            assert_eq!(params.bitrate, 125_000);
            assert_eq!(params.data_bitrate, None);
            assert!(!params.time_resolution);
            assert_eq!(params.fd, None);
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unknown_kind_fails_to_open() {
        let params = resolve_open_params(BusKind::from_name("nosuchbus"), "x", 500_000);
        assert!(matches!(
            open(&params),
            Err(BusError::UnsupportedInterface(name)) if name == "nosuchbus"
        ));
    }

    #[test]
    fn test_session_release_runs_once() {
        let bus = ScriptedBus::new(vec![]);
        let shutdowns = bus.shutdown_counter();

        let session = BusSession::new(bus);
        session.release().unwrap();
        assert_eq!(shutdowns.get(), 1);
    }

    #[test]
    fn test_session_drop_releases() {
        let bus = ScriptedBus::new(vec![]);
        let shutdowns = bus.shutdown_counter();

        drop(BusSession::new(bus));
        assert_eq!(shutdowns.get(), 1);
    }

    #[test]
    fn test_session_released_on_panic() {
        let bus = ScriptedBus::new(vec![]);
        let shutdowns = bus.shutdown_counter();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _session = BusSession::new(bus);
            panic!("render fault");
        }));

        assert!(result.is_err());
        assert_eq!(shutdowns.get(), 1);
    }
}

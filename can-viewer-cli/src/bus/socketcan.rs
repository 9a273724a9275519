//! SocketCAN transport (Linux)

use super::{BusAdapter, BusError, OpenParams};
use can_viewer_decoder::CanFrame;
use chrono::{DateTime, Utc};
use socketcan::nl::CanInterface;
use socketcan::{CanAnyFrame, CanFdSocket, CanSocket, EmbeddedFrame, Frame, Socket, SocketOptions};
use std::io;
use std::time::{Duration, SystemTime};

enum Transport {
    /// Classic CAN 2.0 frames only
    Classic(CanSocket),
    /// Classic and FD frames
    Flexible(CanFdSocket),
}

impl Transport {
    fn enable_arrival_stamps(&self) -> io::Result<()> {
        match self {
            Transport::Classic(sock) => sock.set_recv_timestamp(true),
            Transport::Flexible(sock) => sock.set_recv_timestamp(true),
        }
    }

    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Transport::Classic(sock) => sock.set_read_timeout(timeout),
            Transport::Flexible(sock) => sock.set_read_timeout(timeout),
        }
    }

    /// Next frame with the kernel's receive time (`SO_TIMESTAMPNS`)
    fn read_stamped(&self) -> io::Result<(CanAnyFrame, SystemTime)> {
        match self {
            Transport::Classic(sock) => sock
                .read_frame_with_timestamp()
                .map(|(frame, at)| (CanAnyFrame::from(frame), at)),
            Transport::Flexible(sock) => sock.read_frame_with_timestamp(),
        }
    }
}

/// A raw SocketCAN socket bound to one network interface
pub struct SocketCanBus {
    iface: String,
    transport: Option<Transport>,
    read_timeout: Option<Duration>,
    time_resolution: bool,
}

impl SocketCanBus {
    pub fn open(params: &OpenParams) -> Result<Self, BusError> {
        let iface = params.channel.interface_name();
        let open_err = |source: io::Error| BusError::Open {
            iface: iface.clone(),
            source,
        };

        let transport = if params.fd == Some(false) {
            Transport::Classic(CanSocket::open(&iface).map_err(open_err)?)
        } else {
            Transport::Flexible(CanFdSocket::open(&iface).map_err(open_err)?)
        };
        transport.enable_arrival_stamps().map_err(open_err)?;

        check_bit_timing(&iface, params);
        log::info!("SocketCAN interface {} opened", iface);

        Ok(Self {
            iface,
            transport: Some(transport),
            read_timeout: None,
            time_resolution: params.time_resolution,
        })
    }
}

impl BusAdapter for SocketCanBus {
    fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, BusError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| BusError::Closed(self.iface.clone()))?;

        let receive_err = |source: io::Error| BusError::Receive {
            iface: self.iface.clone(),
            source,
        };

        if self.read_timeout != Some(timeout) {
            transport.set_read_timeout(timeout).map_err(receive_err)?;
            self.read_timeout = Some(timeout);
        }

        match transport.read_stamped() {
            Ok((frame, at)) => Ok(convert_frame(frame, arrival_seconds(at, self.time_resolution))),
            Err(err) if is_timeout(&err) => Ok(None),
            Err(source) => Err(receive_err(source)),
        }
    }

    fn shutdown(&mut self) -> Result<(), BusError> {
        if self.transport.take().is_some() {
            log::info!("SocketCAN interface {} closed", self.iface);
        }
        Ok(())
    }
}

/// Timeouts and signal interruptions both leave the socket usable
fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Kernel arrival time as Unix seconds
fn arrival_seconds(at: SystemTime, time_resolution: bool) -> f64 {
    stamp(DateTime::<Utc>::from(at), time_resolution)
}

/// Seconds since the Unix epoch, truncated to micro- or milliseconds
fn stamp(at: DateTime<Utc>, time_resolution: bool) -> f64 {
    if time_resolution {
        at.timestamp_micros() as f64 / 1_000_000.0
    } else {
        at.timestamp_millis() as f64 / 1_000.0
    }
}

/// Data frames only; remote and error frames carry no signals
fn convert_frame(frame: CanAnyFrame, timestamp: f64) -> Option<CanFrame> {
    match frame {
        CanAnyFrame::Normal(frame) => Some(CanFrame {
            timestamp,
            can_id: frame.raw_id(),
            data: frame.data().to_vec(),
            is_extended: frame.is_extended(),
            is_fd: false,
        }),
        CanAnyFrame::Fd(frame) => Some(CanFrame {
            timestamp,
            can_id: frame.raw_id(),
            data: frame.data().to_vec(),
            is_extended: frame.is_extended(),
            is_fd: true,
        }),
        CanAnyFrame::Remote(_) | CanAnyFrame::Error(_) => {
            log::trace!("Skipping non-data frame");
            None
        }
    }
}

/// Compare the requested bitrates with the interface configuration
///
/// Changing bit timing needs CAP_NET_ADMIN and a downed link, so a mismatch
/// is reported rather than corrected. Virtual interfaces have no timing.
fn check_bit_timing(iface: &str, params: &OpenParams) {
    let nl_iface = match CanInterface::open(iface) {
        Ok(nl_iface) => nl_iface,
        Err(err) => {
            log::debug!("Cannot query bit timing of {}: {}", iface, err);
            return;
        }
    };

    match nl_iface.bit_rate() {
        Ok(Some(actual)) if actual != params.bitrate => log::warn!(
            "{} runs at {} bit/s, requested {} bit/s",
            iface,
            actual,
            params.bitrate
        ),
        Ok(Some(_)) => {}
        Ok(None) => log::debug!("{} reports no bitrate (virtual interface?)", iface),
        Err(err) => log::debug!("Cannot read bitrate of {}: {:?}", iface, err),
    }

    if let Some(requested) = params.data_bitrate {
        match nl_iface.data_bit_timing() {
            Ok(Some(timing)) if timing.bitrate != requested => log::warn!(
                "{} data phase runs at {} bit/s, requested {} bit/s",
                iface,
                timing.bitrate,
                requested
            ),
            Ok(_) => {}
            Err(err) => log::debug!("Cannot read data bitrate of {}: {:?}", iface, err),
        }
    }
}

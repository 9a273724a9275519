//! Display loop
//!
//! Receives frames, decodes them, keeps the latest entries and redraws the
//! table on every iteration until the cancellation token fires or a fault
//! stops the loop. The bus session is released exactly once either way.

use crate::bus::{BusAdapter, BusError, BusSession};
use crate::history::{DecodedEntry, History, DEFAULT_CAPACITY};
use crate::render;
use crate::shutdown::CancelToken;
use can_viewer_decoder::{Decoder, DecoderError};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Loop timing and sizing
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Rows kept and shown
    pub history_capacity: usize,
    /// Upper bound on a single receive
    pub receive_timeout: Duration,
    /// Pause after each redraw
    pub refresh_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            receive_timeout: Duration::from_secs(1),
            refresh_interval: Duration::from_millis(100),
        }
    }
}

/// Faults that end the display loop
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("CAN bus fault")]
    Bus(#[from] BusError),

    #[error("decode fault")]
    Decode(#[from] DecoderError),

    #[error("terminal output failed")]
    Render(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Init,
    Running,
    ShuttingDown,
    Terminated,
}

/// What one loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Receive timed out
    Idle,
    /// Frame had no definition or decoded to nothing
    Skipped,
    /// A new entry was added to the history
    Appended,
    /// Cancellation was observed after the receive; nothing was drawn
    Interrupted,
}

pub struct Monitor<'a, W: Write> {
    decoder: &'a Decoder,
    history: History,
    out: W,
    settings: MonitorSettings,
    state: MonitorState,
}

impl<'a, W: Write> Monitor<'a, W> {
    pub fn new(decoder: &'a Decoder, out: W, settings: MonitorSettings) -> Self {
        Self {
            decoder,
            history: History::new(settings.history_capacity),
            out,
            settings,
            state: MonitorState::Init,
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[cfg(test)]
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Run until cancelled or until a fault, then release the session
    ///
    /// A clean cancellation prints the exit notice and returns `Ok`. A loop
    /// fault is returned after the bus has been released; it takes
    /// precedence over a failure of the release itself.
    pub fn run<B: BusAdapter>(
        &mut self,
        mut session: BusSession<B>,
        cancel: &CancelToken,
    ) -> Result<(), MonitorError> {
        self.transition(MonitorState::Running);
        log::info!("Display loop running");

        let outcome = self.run_loop(session.bus_mut(), cancel);

        self.transition(MonitorState::ShuttingDown);
        let outcome = outcome.and_then(|()| {
            writeln!(self.out, "Exiting...")?;
            self.out.flush()?;
            Ok(())
        });
        if let Err(err) = &outcome {
            log::debug!("Display loop stopped: {:?}", err);
        }

        let released = session.release();
        self.transition(MonitorState::Terminated);
        log::info!(
            "Display loop terminated after {} decoded messages",
            self.history.total_appended()
        );

        outcome?;
        released?;
        Ok(())
    }

    fn transition(&mut self, next: MonitorState) {
        log::debug!("Display loop {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn run_loop<B: BusAdapter>(&mut self, bus: &mut B, cancel: &CancelToken) -> Result<(), MonitorError> {
        while !cancel.is_cancelled() {
            if self.step(bus, cancel)? == Step::Interrupted {
                break;
            }
            if !self.settings.refresh_interval.is_zero() {
                thread::sleep(self.settings.refresh_interval);
            }
        }
        Ok(())
    }

    /// One iteration: receive, decode, record, redraw
    pub fn step<B: BusAdapter>(&mut self, bus: &mut B, cancel: &CancelToken) -> Result<Step, MonitorError> {
        let frame = bus.receive(self.settings.receive_timeout)?;
        if cancel.is_cancelled() {
            return Ok(Step::Interrupted);
        }

        let step = match frame {
            None => Step::Idle,
            Some(frame) => match self.decoder.decode(&frame)? {
                Some(message) if !message.is_empty() => {
                    self.history.push(DecodedEntry::new(&frame, &message));
                    Step::Appended
                }
                _ => Step::Skipped,
            },
        };

        render::draw(&mut self.out, &self.history)?;
        Ok(step)
    }
}

//! In-memory bus adapter for tests

use super::{BusAdapter, BusError};
use crate::shutdown::CancelToken;
use can_viewer_decoder::CanFrame;
use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

/// One scripted receive result
pub enum Slot {
    Timeout,
    Frame(CanFrame),
    Fault,
}

/// Replays a fixed script of receive results
///
/// Once the script is exhausted, each further receive reports a timeout and
/// cancels the attached token, if any.
pub struct ScriptedBus {
    script: VecDeque<Slot>,
    cancel_when_done: Option<CancelToken>,
    receives: Rc<Cell<usize>>,
    shutdowns: Rc<Cell<usize>>,
}

impl ScriptedBus {
    pub fn new(script: Vec<Slot>) -> Self {
        Self {
            script: script.into(),
            cancel_when_done: None,
            receives: Rc::new(Cell::new(0)),
            shutdowns: Rc::new(Cell::new(0)),
        }
    }

    pub fn cancel_when_done(mut self, token: &CancelToken) -> Self {
        self.cancel_when_done = Some(token.clone());
        self
    }

    pub fn shutdown_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.shutdowns)
    }

    pub fn receive_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.receives)
    }
}

impl BusAdapter for ScriptedBus {
    fn receive(&mut self, _timeout: Duration) -> Result<Option<CanFrame>, BusError> {
        self.receives.set(self.receives.get() + 1);

        let slot = self.script.pop_front();
        if slot.is_none() {
            if let Some(token) = &self.cancel_when_done {
                token.cancel();
            }
        }

        match slot {
            Some(Slot::Frame(frame)) => Ok(Some(frame)),
            Some(Slot::Fault) => Err(BusError::Receive {
                iface: "scripted".to_string(),
                source: io::Error::new(io::ErrorKind::BrokenPipe, "adapter unplugged"),
            }),
            Some(Slot::Timeout) | None => Ok(None),
        }
    }

    fn shutdown(&mut self) -> Result<(), BusError> {
        self.shutdowns.set(self.shutdowns.get() + 1);
        Ok(())
    }
}

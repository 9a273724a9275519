//! Decoded message history
//!
//! A fixed-capacity ring of the most recent decoded frames, oldest first.

use can_viewer_decoder::{CanFrame, DecodedMessage, DecodedSignal};
use std::collections::VecDeque;

/// Number of rows kept for display
pub const DEFAULT_CAPACITY: usize = 10;

/// One decoded frame, formatted for display
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntry {
    /// Arbitration ID as uppercase hex, e.g. `0x1A3`
    pub id: String,
    /// Frame timestamp in seconds with three decimals
    pub timestamp: String,
    /// Decoded signals in definition order
    pub data: Vec<DecodedSignal>,
}

impl DecodedEntry {
    pub fn new(frame: &CanFrame, message: &DecodedMessage) -> Self {
        Self {
            id: format_id(frame.can_id),
            timestamp: format_timestamp(frame.timestamp),
            data: message.signals.clone(),
        }
    }

    /// Signal mapping as `{Name: value, ...}`
    pub fn data_string(&self) -> String {
        let fields: Vec<String> = self.data.iter().map(|s| s.to_string()).collect();
        format!("{{{}}}", fields.join(", "))
    }
}

pub fn format_id(can_id: u32) -> String {
    format!("0x{:X}", can_id)
}

pub fn format_timestamp(timestamp: f64) -> String {
    format!("{:.3}", timestamp)
}

/// Ring buffer of decoded entries
#[derive(Debug)]
pub struct History {
    entries: VecDeque<DecodedEntry>,
    capacity: usize,
    total: u64,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    /// Append an entry, evicting the oldest one when full
    pub fn push(&mut self, entry: DecodedEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.total += 1;
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &DecodedEntry> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries appended since creation, including evicted ones
    pub fn total_appended(&self) -> u64 {
        self.total
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

//! Core types for the CAN viewer decoder library
//!
//! This module defines the frame type the decoder consumes and the decoded
//! values it produces. The decoder keeps no history; every call stands alone.

use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Raw CAN frame as received from a bus adapter
///
/// This represents a single CAN frame before any signal decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrame {
    /// Timestamp in seconds since an arbitrary epoch (wall clock for live buses)
    pub timestamp: f64,
    /// CAN message ID (11-bit or 29-bit, without flag bits)
    pub can_id: u32,
    /// Frame data bytes (0-8 bytes for classic CAN, up to 64 for CAN-FD)
    pub data: Vec<u8>,
    /// True if this is an extended (29-bit) CAN ID
    pub is_extended: bool,
    /// True if this is a CAN-FD frame
    pub is_fd: bool,
}

impl CanFrame {
    /// Create a classic data frame
    pub fn new(can_id: u32, data: &[u8], timestamp: f64) -> Self {
        Self {
            timestamp,
            can_id,
            data: data.to_vec(),
            is_extended: can_id > 0x7FF,
            is_fd: data.len() > 8,
        }
    }
}

/// Errors that can occur while loading a database or decoding a frame
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("{0}")]
    DbcParseError(String),

    #[error("Wrong payload length for CAN ID 0x{can_id:X}: expected {expected} bytes, got {actual}")]
    PayloadLength {
        can_id: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),
}

/// A decoded CAN message with all its active signals
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// CAN message ID
    pub can_id: u32,
    /// Message name from the DBC file
    pub name: String,
    /// Decoded signals, in definition order
    pub signals: Vec<DecodedSignal>,
    /// Active multiplexer value (if message is multiplexed)
    pub multiplexer_value: Option<u64>,
}

impl DecodedMessage {
    /// Look up a decoded signal by name
    pub fn signal(&self, name: &str) -> Option<&DecodedSignal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// A decoded signal with its current value
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the DBC file
    pub name: String,
    /// Decoded value
    pub value: SignalValue,
    /// Engineering unit (e.g., "km/h", "°C", "V")
    pub unit: Option<String>,
    /// Raw value before scaling (useful for debugging)
    pub raw_value: i64,
}

impl fmt::Display for DecodedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Signal value types supported by the decoder
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    /// Signed integer value
    Integer(i64),
    /// Floating-point value (after scaling/offset)
    Float(f64),
    /// Boolean value (single unscaled bit)
    Boolean(bool),
    /// Enumerated value with its label from a value table
    Choice { raw: i64, label: String },
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{:.3}", v),
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            SignalValue::Choice { label, .. } => write!(f, "{}", label),
        }
    }
}

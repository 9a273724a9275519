//! CAN Viewer Decoder Library
//!
//! Loads DBC signal definitions and decodes raw CAN frames into named,
//! typed signal values.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on decoding:
//! - Parses a DBC file into an immutable message catalog
//! - Decodes Intel and Motorola signals, signed and unsigned
//! - Applies scaling, value tables and multiplexing
//!
//! The library does NOT:
//! - Talk to CAN hardware
//! - Keep a history of decoded messages
//! - Render anything
//!
//! All of that lives in the application layer (can-viewer-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use can_viewer_decoder::{CanFrame, Decoder};
//! use std::path::Path;
//!
//! let decoder = Decoder::from_dbc(Path::new("powertrain.dbc")).unwrap();
//! let frame = CanFrame::new(0x123, &[0x10, 0x27, 0, 0, 0, 0, 0, 0], 12.5);
//!
//! match decoder.decode(&frame) {
//!     Ok(Some(message)) => {
//!         for signal in &message.signals {
//!             println!("{}", signal);
//!         }
//!     }
//!     Ok(None) => println!("unknown ID"),
//!     Err(e) => eprintln!("Decode error: {}", e),
//! }
//! ```

pub mod decoder;
pub mod signals;
pub mod types;

pub use decoder::{DatabaseStats, Decoder};
pub use signals::MessageDefinition;
pub use types::{CanFrame, DecodedMessage, DecodedSignal, DecoderError, Result, SignalValue};

mod message_decoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Main decoder API
//!
//! The Decoder struct owns the message catalog loaded from a DBC file and
//! turns raw frames into named signal values.

use crate::message_decoder::MessageDecoder;
use crate::signals::{MessageDefinition, SignalDatabase};
use crate::types::{CanFrame, DecodedMessage, Result};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    /// Internal message catalog (loaded from DBC files)
    signal_db: SignalDatabase,
}

impl Decoder {
    /// Create a decoder with an empty catalog
    pub fn new() -> Self {
        Self {
            signal_db: SignalDatabase::new(),
        }
    }

    /// Create a decoder from a single DBC file
    ///
    /// # Example
    /// ```no_run
    /// use can_viewer_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::from_dbc(Path::new("powertrain.dbc")).unwrap();
    /// println!("{} messages", decoder.database_stats().num_messages);
    /// ```
    pub fn from_dbc(path: &Path) -> Result<Self> {
        let mut decoder = Self::new();
        decoder.add_dbc(path)?;
        Ok(decoder)
    }

    /// Load a DBC file and add its definitions to the catalog
    ///
    /// Nothing is added if the file fails to parse.
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        let messages = crate::signals::dbc::parse_dbc_file(path)?;
        self.extend(messages);
        Ok(())
    }

    /// Add definitions from DBC text already held in memory
    pub fn add_dbc_str(&mut self, content: &str, source: &str) -> Result<()> {
        let messages = crate::signals::dbc::parse_dbc_str(content, source)?;
        self.extend(messages);
        Ok(())
    }

    fn extend(&mut self, messages: Vec<MessageDefinition>) {
        for message in messages {
            self.signal_db.add_message(message);
        }
    }

    /// Look up the message definition for a CAN ID
    pub fn lookup(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.signal_db.get_message(can_id)
    }

    /// Decode a frame
    ///
    /// Returns `Ok(None)` when the frame's ID has no definition in the
    /// catalog. Decoding faults on a known message (such as a payload length
    /// that differs from the declared size) are returned as errors.
    pub fn decode(&self, frame: &CanFrame) -> Result<Option<DecodedMessage>> {
        let Some(message_def) = self.lookup(frame.can_id) else {
            log::trace!("Unknown CAN ID: 0x{:X}", frame.can_id);
            return Ok(None);
        };

        log::debug!("Decoding message: {} (ID 0x{:X})", message_def.name, frame.can_id);
        MessageDecoder::decode_message(frame, message_def).map(Some)
    }

    /// Get statistics about the loaded catalog
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }

    /// All CAN IDs defined in the catalog, sorted ascending
    pub fn can_ids(&self) -> Vec<u32> {
        self.signal_db.get_all_can_ids()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

pub use crate::signals::DatabaseStats;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DecoderError, SignalValue};

    const DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: ECU1

BO_ 512 Vehicle: 2 ECU1
 SG_ Speed : 0|8@1+ (1,0) [0|255] "km/h" ECU1
 SG_ Gear : 8|8@1+ (1,0) [0|3] "" ECU1
"#;

    fn decoder() -> Decoder {
        let mut decoder = Decoder::new();
        decoder.add_dbc_str(DBC, "vehicle.dbc").unwrap();
        decoder
    }

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new();
        let stats = decoder.database_stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
    }

    #[test]
    fn test_unknown_id_is_none() {
        let decoder = decoder();
        let frame = CanFrame::new(0x100, &[1, 2], 0.0);
        assert!(decoder.decode(&frame).unwrap().is_none());
        assert!(decoder.lookup(0x100).is_none());
    }

    #[test]
    fn test_known_id_decodes() {
        let decoder = decoder();
        let frame = CanFrame::new(0x200, &[42, 3], 0.0);
        let decoded = decoder.decode(&frame).unwrap().unwrap();
        assert_eq!(decoded.name, "Vehicle");
        assert_eq!(decoded.signal("Speed").unwrap().value, SignalValue::Integer(42));
        assert_eq!(decoded.signal("Gear").unwrap().value, SignalValue::Integer(3));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let decoder = decoder();
        let frame = CanFrame::new(0x200, &[7, 1], 3.5);
        let first = decoder.decode(&frame).unwrap();
        let second = decoder.decode(&frame).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_short_payload_is_error() {
        let decoder = decoder();
        let frame = CanFrame::new(0x200, &[42], 0.0);
        assert!(matches!(
            decoder.decode(&frame),
            Err(DecoderError::PayloadLength { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_failed_parse_adds_nothing() {
        let mut decoder = Decoder::new();
        assert!(decoder.add_dbc_str("BO_ this is not dbc", "broken.dbc").is_err());
        assert_eq!(decoder.database_stats().num_messages, 0);
    }
}

//! Message Decoding Engine
//!
//! Extracts signal values from raw CAN frames based on signal definitions
//! from the catalog. Handles bit extraction, endianness, multiplexing,
//! and physical value conversion.

use crate::signals::database::{ByteOrder, MessageDefinition, SignalDefinition, ValueType};
use crate::types::{CanFrame, DecodedMessage, DecodedSignal, DecoderError, Result, SignalValue};

/// Message decoder - extracts signals from CAN frames
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a CAN frame against its message definition
    ///
    /// The payload length must match the declared message size exactly,
    /// otherwise `DecoderError::PayloadLength` is returned.
    pub fn decode_message(frame: &CanFrame, message_def: &MessageDefinition) -> Result<DecodedMessage> {
        if frame.data.len() != message_def.size {
            return Err(DecoderError::PayloadLength {
                can_id: frame.can_id,
                expected: message_def.size,
                actual: frame.data.len(),
            });
        }

        let mut decoded_signals = Vec::new();
        let mut multiplexer_value: Option<u64> = None;

        // For multiplexed messages, first extract the multiplexer signal value
        if let Some(ref mux_signal_name) = message_def.multiplexer_signal {
            if let Some(mux_signal) = message_def.signals.iter().find(|s| s.name == *mux_signal_name) {
                if let Some(value) = Self::extract_signal_value(&frame.data, mux_signal) {
                    multiplexer_value = Some(value as u64);
                }
            }
        }

        for signal in &message_def.signals {
            if let Some(ref mux_info) = signal.multiplexer_info {
                match multiplexer_value {
                    Some(current) if mux_info.multiplexer_values.contains(&current) => {}
                    _ => continue,
                }
            }

            if let Some(decoded) = Self::decode_signal(&frame.data, signal) {
                decoded_signals.push(decoded);
            }
        }

        Ok(DecodedMessage {
            can_id: frame.can_id,
            name: message_def.name.clone(),
            signals: decoded_signals,
            multiplexer_value,
        })
    }

    /// Decode a single signal from CAN frame data
    fn decode_signal(data: &[u8], signal: &SignalDefinition) -> Option<DecodedSignal> {
        let raw_value = Self::extract_signal_value(data, signal)?;

        let label = signal
            .value_table
            .as_ref()
            .and_then(|table| table.get(&raw_value));

        let value = if let Some(label) = label {
            SignalValue::Choice {
                raw: raw_value,
                label: label.clone(),
            }
        } else if signal.is_unscaled() && signal.length == 1 {
            SignalValue::Boolean(raw_value != 0)
        } else if !signal.is_unscaled() {
            SignalValue::Float(signal.offset + signal.factor * (raw_value as f64))
        } else {
            SignalValue::Integer(raw_value)
        };

        Some(DecodedSignal {
            name: signal.name.clone(),
            value,
            unit: signal.unit.clone(),
            raw_value,
        })
    }

    /// Extract raw signal value from CAN frame data
    fn extract_signal_value(data: &[u8], signal: &SignalDefinition) -> Option<i64> {
        let start_bit = signal.start_bit as usize;
        let length = signal.length as usize;

        let raw_value = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(data, start_bit, length),
            ByteOrder::BigEndian => Self::extract_big_endian(data, start_bit, length),
        };

        let Some(raw_value) = raw_value else {
            log::warn!(
                "Signal '{}' does not fit in a {} byte payload",
                signal.name,
                data.len()
            );
            return None;
        };

        let signed_value = match signal.value_type {
            ValueType::Unsigned => raw_value as i64,
            ValueType::Signed => Self::sign_extend(raw_value, length),
        };

        Some(signed_value)
    }

    /// Extract signal with little-endian (Intel) byte order
    ///
    /// The start bit points to the LSB; bits are numbered LSB-first within
    /// each byte, and byte 0 is the first byte of the payload.
    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        if start_bit + length > data.len() * 8 {
            return None;
        }

        let mut result: u64 = 0;
        for i in 0..length {
            let bit_pos = start_bit + i;
            let bit_value = (data[bit_pos / 8] >> (bit_pos % 8)) & 0x01;
            result |= (bit_value as u64) << i;
        }

        Some(result)
    }

    /// Extract signal with big-endian (Motorola) byte order
    ///
    /// The start bit points to the MSB using DBC numbering (bit 7 of byte 0
    /// is position 7). Walking towards the LSB goes down within a byte and
    /// wraps to bit 7 of the next byte.
    fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        let mut result: u64 = 0;
        let mut bit_pos = start_bit;

        for i in 0..length {
            let byte = *data.get(bit_pos / 8)?;
            let bit_value = (byte >> (bit_pos % 8)) & 0x01;
            result = (result << 1) | bit_value as u64;

            if i + 1 < length {
                bit_pos = if bit_pos % 8 == 0 { bit_pos + 15 } else { bit_pos - 1 };
            }
        }

        Some(result)
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}

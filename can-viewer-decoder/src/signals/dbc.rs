//! DBC file parser
//!
//! Parses Vector DBC files and converts them into our internal catalog format.

use crate::signals::database::{
    ByteOrder, MessageDefinition, MultiplexerInfo, SignalDefinition, ValueType,
};
use crate::types::{DecoderError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Bit 31 of a DBC message ID marks a 29-bit identifier
const DBC_EXTENDED_FLAG: u32 = 0x8000_0000;

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read the DBC file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        DecoderError::DbcParseError(format!("cannot read {}: {}", path.display(), e))
    })?;

    // Try UTF-8 first, then fall back to Latin-1/Windows-1252
    let dbc_content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(err) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    let messages = parse_dbc_str(&dbc_content, source_filename)?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);

    Ok(messages)
}

/// Parse DBC text that is already in memory
pub fn parse_dbc_str(content: &str, source: &str) -> Result<Vec<MessageDefinition>> {
    let dbc = can_dbc::DBC::try_from(content).map_err(|e| {
        DecoderError::DbcParseError(format!("{}: {}", source, describe_parse_error(content, e)))
    })?;

    dbc.messages()
        .iter()
        .map(|dbc_msg| convert_message(&dbc, dbc_msg, source))
        .collect()
}

/// One-line summary of a parser failure, without the unparsed remainder
fn describe_parse_error(content: &str, err: can_dbc::Error<'_>) -> String {
    match err {
        can_dbc::Error::Incomplete(_, rest) => {
            format!("unexpected content at line {}", line_of(content, rest))
        }
        can_dbc::Error::Nom(nom_err) => {
            let mut rest = None;
            let _ = nom_err.map(|e| rest = Some(e.input));
            match rest {
                Some(rest) => format!("syntax error at line {}", line_of(content, rest)),
                None => "unexpected end of file".to_string(),
            }
        }
        can_dbc::Error::MultipleMultiplexors => {
            "extended multiplexing is not supported".to_string()
        }
    }
}

/// 1-based line on which the unparsed suffix `rest` starts
fn line_of(content: &str, rest: &str) -> usize {
    let offset = content.len().saturating_sub(rest.len());
    content
        .get(..offset)
        .map_or(1, |parsed| parsed.matches('\n').count() + 1)
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    source: &str,
) -> Result<MessageDefinition> {
    let mut is_multiplexed = false;
    let mut multiplexer_signal_name: Option<String> = None;

    // First pass: identify multiplexer signal
    for dbc_sig in dbc_msg.signals() {
        match dbc_sig.multiplexer_indicator() {
            can_dbc::MultiplexIndicator::Multiplexor => {
                is_multiplexed = true;
                multiplexer_signal_name = Some(dbc_sig.name().to_string());
                break;
            }
            can_dbc::MultiplexIndicator::MultiplexedSignal(_)
            | can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(_) => {
                is_multiplexed = true;
            }
            can_dbc::MultiplexIndicator::Plain => {}
        }
    }

    // Second pass: convert all signals
    let signals = dbc_msg
        .signals()
        .iter()
        .map(|dbc_sig| {
            let value_table = dbc
                .value_descriptions_for_signal(*dbc_msg.message_id(), dbc_sig.name())
                .map(convert_value_table);
            convert_signal(dbc_sig, multiplexer_signal_name.as_deref(), value_table)
        })
        .collect::<Result<Vec<_>>>()?;

    let raw_id = dbc_msg.message_id().0;

    Ok(MessageDefinition {
        id: raw_id & !DBC_EXTENDED_FLAG,
        is_extended: raw_id & DBC_EXTENDED_FLAG != 0,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signals,
        is_multiplexed,
        multiplexer_signal: multiplexer_signal_name,
        source: source.to_string(),
    })
}

fn convert_value_table(descriptions: &[can_dbc::ValDescription]) -> HashMap<i64, String> {
    descriptions
        .iter()
        .map(|desc| (*desc.a() as i64, desc.b().to_string()))
        .collect()
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    multiplexer_signal_name: Option<&str>,
    value_table: Option<HashMap<i64, String>>,
) -> Result<SignalDefinition> {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    let length = *dbc_sig.signal_size() as u16;
    if length == 0 || length > 64 {
        return Err(DecoderError::InvalidSignalDefinition(format!(
            "Signal '{}' has unsupported length {}",
            dbc_sig.name(),
            length
        )));
    }

    let multiplexer_info = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::MultiplexedSignal(switch_value)
        | can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(switch_value) => {
            Some(MultiplexerInfo {
                multiplexer_signal: multiplexer_signal_name
                    .ok_or_else(|| {
                        DecoderError::InvalidSignalDefinition(format!(
                            "Multiplexed signal '{}' but no multiplexer found",
                            dbc_sig.name()
                        ))
                    })?
                    .to_string(),
                multiplexer_values: vec![switch_value],
            })
        }
        _ => None,
    };

    Ok(SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        min: *dbc_sig.min(),
        max: *dbc_sig.max(),
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
        value_table: value_table.filter(|table| !table.is_empty()),
        multiplexer_info,
    })
}

//! End-to-end decoding against DBC files written to disk

use can_viewer_decoder::{CanFrame, Decoder, DecoderError, SignalValue};
use std::io::Write;
use tempfile::NamedTempFile;

const POWERTRAIN_DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: ECU1 ECU2

BO_ 256 EngineData: 8 ECU1
 SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] "rpm" ECU2
 SG_ EngineTemp : 16|8@1+ (1,-40) [-40|215] "C" ECU2
 SG_ OilPressure : 31|16@0+ (0.1,0) [0|1000] "kPa" ECU2

BO_ 512 VehicleSpeed: 4 ECU1
 SG_ Speed : 0|16@1+ (1,0) [0|300] "km/h" ECU2
 SG_ Gear : 16|8@1+ (1,0) [0|3] "" ECU2
 SG_ BrakePressed : 24|1@1+ (1,0) [0|1] "" ECU2
 SG_ Torque : 25|7@1- (1,0) [-64|63] "Nm" ECU2

VAL_ 512 Gear 0 "Park" 1 "Reverse" 2 "Neutral" 3 "Drive" ;
"#;

fn write_dbc(content: &str) -> NamedTempFile {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn every_defined_id_is_found() {
    let file = write_dbc(POWERTRAIN_DBC);
    let decoder = Decoder::from_dbc(file.path()).unwrap();

    assert_eq!(decoder.can_ids(), vec![0x100, 0x200]);
    for id in decoder.can_ids() {
        assert!(decoder.lookup(id).is_some(), "0x{:X} should be defined", id);
    }
    for id in [0x000, 0x101, 0x1FF, 0x7FF] {
        assert!(decoder.lookup(id).is_none(), "0x{:X} should be undefined", id);
    }

    let stats = decoder.database_stats();
    assert_eq!(stats.num_messages, 2);
    assert_eq!(stats.num_signals, 7);
}

#[test]
fn decodes_mixed_signal_types() {
    let file = write_dbc(POWERTRAIN_DBC);
    let decoder = Decoder::from_dbc(file.path()).unwrap();

    // Speed = 42, Gear = 3, BrakePressed = 1, Torque = -2 (7-bit two's complement)
    let torque_bits: u8 = 0b111_1110;
    let frame = CanFrame::new(0x200, &[42, 0, 3, 0x01 | (torque_bits << 1)], 10.0);
    let decoded = decoder.decode(&frame).unwrap().unwrap();

    assert_eq!(decoded.name, "VehicleSpeed");
    assert_eq!(decoded.signal("Speed").unwrap().value, SignalValue::Integer(42));
    assert_eq!(decoded.signal("Speed").unwrap().to_string(), "Speed: 42");
    assert_eq!(
        decoded.signal("Gear").unwrap().value,
        SignalValue::Choice { raw: 3, label: "Drive".to_string() }
    );
    assert_eq!(decoded.signal("BrakePressed").unwrap().value, SignalValue::Boolean(true));
    assert_eq!(decoded.signal("Torque").unwrap().value, SignalValue::Integer(-2));
}

#[test]
fn decodes_scaled_and_motorola_signals() {
    let file = write_dbc(POWERTRAIN_DBC);
    let decoder = Decoder::from_dbc(file.path()).unwrap();

    // EngineSpeed = 0x0BB8 (3000), EngineTemp raw 130 -> 90 C, OilPressure raw 0x0FA0 -> 400.0
    let frame = CanFrame::new(0x100, &[0xB8, 0x0B, 130, 0x0F, 0xA0, 0, 0, 0], 11.0);
    let decoded = decoder.decode(&frame).unwrap().unwrap();

    assert_eq!(decoded.signal("EngineSpeed").unwrap().value, SignalValue::Integer(3000));
    assert_eq!(decoded.signal("EngineTemp").unwrap().value, SignalValue::Float(90.0));
    assert_eq!(decoded.signal("OilPressure").unwrap().raw_value, 0x0FA0);
    assert_eq!(decoded.signal("OilPressure").unwrap().value.to_string(), "400.000");
}

#[test]
fn unknown_and_malformed_frames() {
    let file = write_dbc(POWERTRAIN_DBC);
    let decoder = Decoder::from_dbc(file.path()).unwrap();

    let unknown = CanFrame::new(0x300, &[1, 2, 3, 4], 1.0);
    assert!(decoder.decode(&unknown).unwrap().is_none());

    let truncated = CanFrame::new(0x200, &[42, 0], 1.0);
    let err = decoder.decode(&truncated).unwrap_err();
    assert!(matches!(err, DecoderError::PayloadLength { can_id: 0x200, expected: 4, actual: 2 }));
    assert!(err.to_string().contains("0x200"));
}

#[test]
fn invalid_dbc_fails_to_load() {
    let file = write_dbc("this is not a DBC file");
    match Decoder::from_dbc(file.path()) {
        Err(DecoderError::DbcParseError(msg)) => {
            assert!(msg.contains("at line 1"), "{}", msg);
            assert!(!msg.contains("this is not"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("garbage should not load"),
    }
}

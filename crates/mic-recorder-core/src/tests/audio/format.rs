use crate::{AudioError, AudioFormat};

/// WHAT: The default format is 44.1 kHz mono 16-bit with consistent derived fields
/// WHY: Header fields are emitted from these values
#[test]
fn given_default_format_when_reading_fields_then_derived_values_consistent() {
    // Given/When: The default format
    let format = AudioFormat::default();

    // Then: Same as building it explicitly
    assert_eq!(format, AudioFormat::new(44_100, 1, 16).unwrap());
    assert_eq!(format.block_align(), 2);
    assert_eq!(format.byte_rate(), 88_200);
}

/// WHAT: Derived values follow channels and bit depth
/// WHY: block_align and byte_rate must match the base fields everywhere
#[test]
fn given_stereo_48khz_when_building_then_byte_rate_and_block_align_derived() {
    // Given/When: 48 kHz stereo 16-bit
    let format = AudioFormat::new(48_000, 2, 16).unwrap();

    // Then: 4-byte frames at 192000 bytes per second
    assert_eq!(format.block_align(), 4);
    assert_eq!(format.byte_rate(), 192_000);
}

/// WHAT: Declared length is rate * seconds * bits / 8
/// WHY: The data chunk size is duration-derived
#[test]
fn given_seconds_when_computing_declared_length_then_duration_formula_used() {
    // Given: The default format
    let format = AudioFormat::default();

    // When/Then: Zero, one and ten seconds
    assert_eq!(format.bytes_for_seconds(0), 0);
    assert_eq!(format.bytes_for_seconds(1), 88_200);
    assert_eq!(format.bytes_for_seconds(10), 882_000);
}

/// WHAT: Unsupported parameters are rejected
/// WHY: Fractional-byte samples cannot be framed
#[test]
fn given_invalid_parameters_when_building_then_invalid_format() {
    // Given/When/Then: Each invalid parameter fails
    assert!(matches!(
        AudioFormat::new(0, 1, 16),
        Err(AudioError::InvalidFormat { .. })
    ));
    assert!(matches!(
        AudioFormat::new(44_100, 0, 16),
        Err(AudioError::InvalidFormat { .. })
    ));
    assert!(matches!(
        AudioFormat::new(44_100, 1, 12),
        Err(AudioError::InvalidFormat { .. })
    ));
    assert!(matches!(
        AudioFormat::new(u32::MAX, 2, 32),
        Err(AudioError::InvalidFormat { .. })
    ));
}

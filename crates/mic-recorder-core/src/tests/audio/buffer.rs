use crate::{
    AudioError,
    audio::{BufferState, CaptureBuffer},
};

/// WHAT: Filling stops at capacity and flips the state to Full
/// WHY: The device hands the rest of a chunk to the next buffer
#[test]
fn given_chunk_larger_than_room_when_filling_then_takes_only_remaining_capacity() {
    // Given: A 4-byte buffer already holding 3 bytes
    let mut buffer = CaptureBuffer::new(0, 4).unwrap();
    assert_eq!(buffer.fill_from(&[1, 2, 3]), 3);
    assert_eq!(buffer.state(), BufferState::Empty);

    // When: Offering 3 more bytes
    let taken = buffer.fill_from(&[4, 5, 6]);

    // Then: Only one fits and the buffer is full
    assert_eq!(taken, 1);
    assert!(buffer.is_full());
    assert_eq!(buffer.recorded(), &[1, 2, 3, 4]);
}

/// WHAT: Reset clears content but keeps the prepared flag
/// WHY: Drained buffers are resubmitted without re-registration state loss
#[test]
fn given_full_prepared_buffer_when_reset_then_empty_and_still_prepared() {
    // Given: A full, prepared buffer
    let mut buffer = CaptureBuffer::new(2, 2).unwrap();
    buffer.set_prepared(true);
    buffer.fill_from(&[9, 9]);

    // When: Resetting
    buffer.reset();

    // Then: Empty with no recorded bytes, index and preparation kept
    assert_eq!(buffer.state(), BufferState::Empty);
    assert!(buffer.recorded().is_empty());
    assert!(buffer.is_prepared());
    assert_eq!(buffer.index(), 2);
}

/// WHAT: Zero-capacity buffers are rejected
/// WHY: A buffer that can never fill would stall the ring
#[test]
fn given_zero_capacity_when_creating_buffer_then_invalid_configuration() {
    assert!(matches!(
        CaptureBuffer::new(0, 0),
        Err(AudioError::InvalidConfiguration { .. })
    ));
}

use crate::{AudioError, CoreResult};

use std::panic::Location;

use error_location::ErrorLocation;

/// Lifecycle of a capture buffer within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Owned by the ring, holding no samples.
    Empty,
    /// Handed to the device, possibly partially filled.
    Queued,
    /// Filled to capacity and waiting to be drained.
    Full,
}

/// Fixed-capacity block of PCM bytes exchanged with the capture device.
///
/// Ownership moves with the buffer: the ring owns it while it is empty or
/// full, the device owns it while it is queued. Nothing else ever writes to
/// it.
#[derive(Debug)]
pub struct CaptureBuffer {
    index: usize,
    data: Box<[u8]>,
    recorded: usize,
    prepared: bool,
    state: BufferState,
}

impl CaptureBuffer {
    /// Allocate an empty buffer with the given ring index and capacity.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::InvalidConfiguration`] if `capacity` is zero.
    #[track_caller]
    pub fn new(index: usize, capacity: usize) -> CoreResult<Self> {
        if capacity == 0 {
            return Err(AudioError::InvalidConfiguration {
                reason: "capture buffer capacity must be non-zero".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self {
            index,
            data: vec![0u8; capacity].into_boxed_slice(),
            recorded: 0,
            prepared: false,
            state: BufferState::Empty,
        })
    }

    /// Position of this buffer in the ring.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Total bytes this buffer can hold.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes written so far.
    pub fn recorded_len(&self) -> usize {
        self.recorded
    }

    /// The valid recorded bytes.
    pub fn recorded(&self) -> &[u8] {
        &self.data[..self.recorded]
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Whether the buffer is registered with a device.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Whether the buffer reached capacity.
    pub fn is_full(&self) -> bool {
        self.state == BufferState::Full
    }

    pub(crate) fn set_prepared(&mut self, prepared: bool) {
        self.prepared = prepared;
    }

    pub(crate) fn mark_queued(&mut self) {
        self.state = BufferState::Queued;
    }

    /// Append as many bytes as fit, returning how many were taken.
    ///
    /// The buffer flips to [`BufferState::Full`] once capacity is reached.
    pub fn fill_from(&mut self, bytes: &[u8]) -> usize {
        let room = self.capacity() - self.recorded;
        let taken = room.min(bytes.len());
        self.data[self.recorded..self.recorded + taken].copy_from_slice(&bytes[..taken]);
        self.recorded += taken;
        if self.recorded == self.capacity() {
            self.state = BufferState::Full;
        }
        taken
    }

    /// Forget recorded content and return to [`BufferState::Empty`].
    ///
    /// Keeps the prepared flag; a drained buffer is resubmitted as-is.
    pub fn reset(&mut self) {
        self.recorded = 0;
        self.state = BufferState::Empty;
    }
}

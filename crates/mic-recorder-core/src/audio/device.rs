use crate::{AudioError, audio::CaptureBuffer};

use std::time::Duration;

/// A buffer the device refused to queue, handed back so the ring keeps it.
#[derive(Debug)]
pub struct EnqueueRejected {
    /// The buffer that was not queued.
    pub buffer: CaptureBuffer,
    /// Why the device refused it.
    pub error: AudioError,
}

/// Buffer-queue primitive over an opened audio input stream.
///
/// Buffers move into the device on [`enqueue`](CaptureDevice::enqueue) and
/// come back full through [`next_completed`](CaptureDevice::next_completed),
/// in the order they were queued.
pub trait CaptureDevice {
    /// Register a buffer with the device before it can be queued.
    fn prepare(&mut self, buffer: &mut CaptureBuffer) -> crate::CoreResult<()>;

    /// Queue a prepared, empty buffer to receive samples.
    fn enqueue(&mut self, buffer: CaptureBuffer) -> Result<(), EnqueueRejected>;

    /// Begin capturing into queued buffers.
    fn start(&mut self) -> crate::CoreResult<()>;

    /// Wait up to `timeout` for the next buffer to fill.
    fn next_completed(&mut self, timeout: Duration) -> Option<CaptureBuffer>;

    /// Halt capture and hand back every buffer the device still holds.
    ///
    /// Full buffers that were not yet collected keep their content. Partially
    /// filled ones come back in [`BufferState::Queued`](crate::audio::BufferState::Queued).
    fn stop(&mut self) -> Vec<CaptureBuffer>;

    /// Release a buffer registered by [`prepare`](CaptureDevice::prepare).
    fn unprepare(&mut self, buffer: &mut CaptureBuffer);

    /// Release the device. Safe to call more than once.
    fn close(&mut self);
}

use crate::{
    AudioError, CoreResult,
    audio::{CaptureBuffer, CaptureDevice, EnqueueRejected},
    wav::SampleSink,
};

use std::{mem, panic::Location};

use error_location::ErrorLocation;
use tracing::{debug, instrument, trace, warn};

/// Smallest ring that keeps capture continuous while one buffer drains.
pub const MIN_RING_BUFFERS: usize = 2;

/// Observable state of one ring slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Held by the ring with no pending content.
    Empty,
    /// Owned by the device.
    Queued,
    /// Held by the ring with content waiting to be drained.
    Full,
}

#[derive(Debug)]
enum Slot {
    Held(CaptureBuffer),
    WithDevice,
}

/// Arena of capture buffers indexed `0..N`, recycled in round-robin order.
///
/// Buffers are submitted as `0, 1, .., N-1` and every drained buffer is
/// resubmitted immediately, so the device queue always holds them in ring
/// order. Draining starts at the next expected index and never skips ahead,
/// which keeps segments in the raw dump chronological even if the device
/// reports completions out of order.
#[derive(Debug)]
pub struct BufferRing {
    slots: Vec<Slot>,
    buffer_capacity: usize,
    next_drain: usize,
    drained: u64,
}

impl BufferRing {
    /// Allocate `count` empty buffers of `buffer_capacity` bytes each.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::InvalidConfiguration`] if `count` is below
    /// [`MIN_RING_BUFFERS`] or the capacity is zero.
    #[track_caller]
    pub fn new(count: usize, buffer_capacity: usize) -> CoreResult<Self> {
        if count < MIN_RING_BUFFERS {
            return Err(AudioError::InvalidConfiguration {
                reason: format!(
                    "buffer ring needs at least {} buffers, got {}",
                    MIN_RING_BUFFERS, count
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let slots = (0..count)
            .map(|index| CaptureBuffer::new(index, buffer_capacity).map(Slot::Held))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            slots,
            buffer_capacity,
            next_drain: 0,
            drained: 0,
        })
    }

    /// Number of buffers in the ring.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a ring has at least [`MIN_RING_BUFFERS`] buffers.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Capacity of each buffer in bytes.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Buffers drained into a sink so far.
    pub fn drained(&self) -> u64 {
        self.drained
    }

    /// Per-slot state, indexed like the ring.
    pub fn states(&self) -> Vec<SlotState> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::WithDevice => SlotState::Queued,
                Slot::Held(buffer) if buffer.is_full() => SlotState::Full,
                Slot::Held(_) => SlotState::Empty,
            })
            .collect()
    }

    /// Prepare and queue every buffer, in index order.
    ///
    /// # Errors
    ///
    /// Stops at the first prepare or enqueue failure. Buffers queued before
    /// the failure stay with the device until it is stopped.
    #[instrument(skip(self, device), fields(buffers = self.slots.len()))]
    pub fn prime<D: CaptureDevice>(&mut self, device: &mut D) -> CoreResult<()> {
        self.next_drain = 0;
        for index in 0..self.slots.len() {
            self.submit(device, index)?;
        }

        debug!(
            buffers = self.slots.len(),
            capacity = self.buffer_capacity,
            "Buffer ring primed"
        );

        Ok(())
    }

    /// Take back a buffer the device reported complete.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::DeviceError`] for a buffer that does not belong to
    /// this ring or was not queued. The buffer is dropped in that case.
    #[track_caller]
    pub fn accept(&mut self, buffer: CaptureBuffer) -> CoreResult<()> {
        let index = buffer.index();
        match self.slots.get_mut(index) {
            Some(slot @ Slot::WithDevice) => {
                trace!(buffer = index, bytes = buffer.recorded_len(), "Buffer completed");
                *slot = Slot::Held(buffer);
                Ok(())
            }
            Some(Slot::Held(_)) => Err(AudioError::DeviceError {
                reason: format!("buffer {} completed while not queued", index),
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Err(AudioError::DeviceError {
                reason: format!(
                    "device returned buffer {} outside a ring of {}",
                    index,
                    self.slots.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Drain completed buffers in ring order and resubmit each one.
    ///
    /// Returns how many buffers were drained. Stops at the first slot that
    /// is still with the device.
    pub fn drain_ready<D, S>(&mut self, device: &mut D, sink: &mut S) -> CoreResult<usize>
    where
        D: CaptureDevice,
        S: SampleSink,
    {
        let mut count = 0;

        while let Slot::Held(buffer) = &mut self.slots[self.next_drain] {
            sink.append(buffer.recorded())?;
            trace!(
                buffer = self.next_drain,
                bytes = buffer.recorded_len(),
                "Buffer drained"
            );
            buffer.reset();

            self.submit(device, self.next_drain)?;
            self.next_drain = (self.next_drain + 1) % self.slots.len();
            self.drained += 1;
            count += 1;
        }

        Ok(count)
    }

    /// Take back the buffers a stopped device returned.
    ///
    /// Full buffers keep their content for [`flush_completed`](Self::flush_completed);
    /// partially filled ones are emptied. Returns the number of partial bytes
    /// discarded.
    pub fn reclaim(&mut self, buffers: Vec<CaptureBuffer>) -> usize {
        let mut discarded = 0;

        for mut buffer in buffers {
            if !buffer.is_full() {
                discarded += buffer.recorded_len();
                buffer.reset();
            }

            let index = buffer.index();
            match self.slots.get_mut(index) {
                Some(slot) if matches!(slot, Slot::WithDevice) => *slot = Slot::Held(buffer),
                _ => warn!(buffer = index, "Ignoring buffer returned outside the ring"),
            }
        }

        if discarded > 0 {
            debug!(bytes = discarded, "Discarded partially filled buffer content");
        }

        discarded
    }

    /// Write remaining full buffers to the sink in ring order, without
    /// resubmitting them.
    pub fn flush_completed<S: SampleSink>(&mut self, sink: &mut S) -> CoreResult<usize> {
        let len = self.slots.len();
        let mut count = 0;

        for offset in 0..len {
            let index = (self.next_drain + offset) % len;
            if let Slot::Held(buffer) = &mut self.slots[index]
                && buffer.is_full()
            {
                sink.append(buffer.recorded())?;
                buffer.reset();
                self.drained += 1;
                count += 1;
            }
        }

        self.next_drain = 0;
        if count > 0 {
            debug!(buffers = count, "Flushed completed buffers after stop");
        }

        Ok(count)
    }

    /// Release every held buffer from the device.
    pub fn unprepare_all<D: CaptureDevice>(&mut self, device: &mut D) {
        let mut missing = 0;
        for slot in &mut self.slots {
            match slot {
                Slot::Held(buffer) => {
                    if buffer.is_prepared() {
                        device.unprepare(buffer);
                    }
                }
                Slot::WithDevice => missing += 1,
            }
        }

        if missing > 0 {
            warn!(buffers = missing, "Device kept buffers after stop");
        }
    }

    fn submit<D: CaptureDevice>(&mut self, device: &mut D, index: usize) -> CoreResult<()> {
        let Slot::Held(mut buffer) = mem::replace(&mut self.slots[index], Slot::WithDevice)
        else {
            return Ok(());
        };

        if let Err(e) = device.prepare(&mut buffer) {
            self.slots[index] = Slot::Held(buffer);
            return Err(e);
        }

        if let Err(EnqueueRejected { buffer, error }) = device.enqueue(buffer) {
            self.slots[index] = Slot::Held(buffer);
            return Err(error);
        }

        Ok(())
    }
}

mod buffer;
pub(crate) mod capture;
mod device;
mod format;
mod ring;
mod session;
mod ticker;

pub use {
    buffer::{BufferState, CaptureBuffer},
    capture::CpalDevice,
    device::{CaptureDevice, EnqueueRejected},
    format::{AudioFormat, DEFAULT_SAMPLE_RATE},
    ring::{BufferRing, MIN_RING_BUFFERS, SlotState},
    session::{
        DEFAULT_BUFFER_COUNT, DEFAULT_POLL_INTERVAL, Recorder, RecorderSettings, RecordingSummary,
        record_microphone,
    },
    ticker::{ElapsedTicker, TICK_PERIOD},
};

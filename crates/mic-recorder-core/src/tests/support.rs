use crate::{
    AudioError, CoreResult,
    audio::{CaptureBuffer, CaptureDevice, EnqueueRejected, capture::Inflight},
};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{Arc, Mutex, mpsc},
    time::Duration,
};

use error_location::ErrorLocation;

/// What a scripted device observed, shared with the test after the device
/// has been moved into a session.
#[derive(Debug, Default)]
pub(crate) struct DeviceLog {
    pub(crate) prepared: usize,
    pub(crate) enqueued: usize,
    pub(crate) unprepared: usize,
    pub(crate) started: bool,
    pub(crate) stopped: bool,
    pub(crate) closed: bool,
    pub(crate) exhausted: bool,
}

/// In-memory capture device that replays a fixed PCM byte source.
///
/// Each call to `next_completed` delivers `chunk` more bytes through the same
/// buffer-filling path the cpal device uses.
pub(crate) struct ScriptedDevice {
    source: Vec<u8>,
    cursor: usize,
    chunk: usize,
    inflight: Inflight,
    completed_tx: mpsc::Sender<CaptureBuffer>,
    completed_rx: mpsc::Receiver<CaptureBuffer>,
    ready: VecDeque<CaptureBuffer>,
    running: bool,
    /// Fail the n-th prepare call (1-based).
    pub(crate) fail_prepare_at: Option<usize>,
    /// Fail the n-th enqueue call (1-based).
    pub(crate) fail_enqueue_at: Option<usize>,
    pub(crate) fail_start: bool,
    /// Report each pair of completions in reverse order.
    pub(crate) swap_completions: bool,
    log: Arc<Mutex<DeviceLog>>,
}

impl ScriptedDevice {
    pub(crate) fn new(source: Vec<u8>, chunk: usize) -> Self {
        let (completed_tx, completed_rx) = mpsc::channel();
        Self {
            source,
            cursor: 0,
            chunk,
            inflight: Inflight::default(),
            completed_tx,
            completed_rx,
            ready: VecDeque::new(),
            running: false,
            fail_prepare_at: None,
            fail_enqueue_at: None,
            fail_start: false,
            swap_completions: false,
            log: Arc::new(Mutex::new(DeviceLog::default())),
        }
    }

    pub(crate) fn log(&self) -> Arc<Mutex<DeviceLog>> {
        Arc::clone(&self.log)
    }

    fn feed(&mut self) {
        let end = (self.cursor + self.chunk).min(self.source.len());
        let bytes = self.source[self.cursor..end].to_vec();
        self.cursor = end;
        self.inflight.deliver(&bytes, &self.completed_tx);
        if self.cursor == self.source.len() {
            self.log.lock().unwrap().exhausted = true;
        }

        self.ready.extend(self.completed_rx.try_iter());
        if self.swap_completions && self.ready.len() >= 2 {
            self.ready.swap(0, 1);
        }
    }
}

/// Bytes `0, 1, 2, ..` wrapping at 251 so buffer boundaries never align with
/// the pattern.
pub(crate) fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

impl CaptureDevice for ScriptedDevice {
    #[track_caller]
    fn prepare(&mut self, buffer: &mut CaptureBuffer) -> CoreResult<()> {
        let mut log = self.log.lock().unwrap();
        log.prepared += 1;
        if self.fail_prepare_at == Some(log.prepared) {
            return Err(AudioError::HeaderPrepare {
                buffer: buffer.index(),
                reason: "scripted failure".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        buffer.set_prepared(true);
        Ok(())
    }

    #[track_caller]
    fn enqueue(&mut self, mut buffer: CaptureBuffer) -> Result<(), EnqueueRejected> {
        let mut log = self.log.lock().unwrap();
        log.enqueued += 1;
        if self.fail_enqueue_at == Some(log.enqueued) {
            return Err(EnqueueRejected {
                error: AudioError::HeaderEnqueue {
                    buffer: buffer.index(),
                    reason: "scripted failure".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                },
                buffer,
            });
        }
        buffer.mark_queued();
        self.inflight.queue.push_back(buffer);
        Ok(())
    }

    #[track_caller]
    fn start(&mut self) -> CoreResult<()> {
        if self.fail_start {
            return Err(AudioError::Start {
                reason: "scripted failure".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.running = true;
        self.log.lock().unwrap().started = true;
        Ok(())
    }

    fn next_completed(&mut self, _timeout: Duration) -> Option<CaptureBuffer> {
        if !self.running {
            return None;
        }
        if self.ready.is_empty() {
            self.feed();
        }
        self.ready.pop_front()
    }

    fn stop(&mut self) -> Vec<CaptureBuffer> {
        self.running = false;
        self.log.lock().unwrap().stopped = true;

        let mut returned: Vec<CaptureBuffer> = self.ready.drain(..).collect();
        returned.extend(self.completed_rx.try_iter());
        returned.extend(self.inflight.queue.drain(..));
        returned
    }

    fn unprepare(&mut self, buffer: &mut CaptureBuffer) {
        self.log.lock().unwrap().unprepared += 1;
        buffer.set_prepared(false);
    }

    fn close(&mut self) {
        self.log.lock().unwrap().closed = true;
    }
}

use crate::{
    AudioError, CoreResult,
    audio::{AudioFormat, BufferRing, CaptureDevice, CpalDevice, ElapsedTicker, TICK_PERIOD},
    wav::{ContainerSummary, RawDumpSink, SampleSink, finalize_file},
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Default number of capture buffers in the ring.
pub const DEFAULT_BUFFER_COUNT: usize = 2;

/// Default wait for a buffer completion before the stop signal is polled
/// again.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables for one recording session.
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    /// PCM format requested from the device and declared in the container.
    pub format: AudioFormat,
    /// Buffers in the ring.
    pub buffer_count: usize,
    /// Bytes per buffer; a multiple of the format's block align.
    pub buffer_len: usize,
    /// Longest wait for a completed buffer between stop-signal checks.
    pub poll_interval: Duration,
    /// Period of the elapsed-time ticker.
    pub tick_period: Duration,
    /// Directory for the raw dump; the system temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
}

impl RecorderSettings {
    /// Buffer length holding `duration` of audio, rounded down to whole
    /// frames and never below one frame.
    pub fn buffer_len_for(format: &AudioFormat, duration: Duration) -> usize {
        let frame = usize::from(format.block_align());
        let bytes = u128::from(format.byte_rate()) * duration.as_millis() / 1000;
        let bytes = usize::try_from(bytes).unwrap_or(usize::MAX);
        (bytes / frame).max(1) * frame
    }

    /// Check settings before any resource is acquired.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::InvalidConfiguration`] describing the first
    /// invalid value.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        let frame = usize::from(self.format.block_align());
        let reason = if self.buffer_count < crate::audio::MIN_RING_BUFFERS {
            Some(format!(
                "buffer_count must be at least {}, got {}",
                crate::audio::MIN_RING_BUFFERS,
                self.buffer_count
            ))
        } else if self.buffer_len == 0 || self.buffer_len % frame != 0 {
            Some(format!(
                "buffer_len must be a non-zero multiple of {} bytes, got {}",
                frame, self.buffer_len
            ))
        } else if self.tick_period.is_zero() {
            Some("tick_period must be non-zero".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(AudioError::InvalidConfiguration {
                reason,
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(()),
        }
    }
}

impl Default for RecorderSettings {
    /// Two one-second buffers of 44.1 kHz mono 16-bit PCM.
    fn default() -> Self {
        let format = AudioFormat::default();
        Self {
            format,
            buffer_count: DEFAULT_BUFFER_COUNT,
            buffer_len: Self::buffer_len_for(&format, Duration::from_secs(1)),
            poll_interval: DEFAULT_POLL_INTERVAL,
            tick_period: TICK_PERIOD,
            temp_dir: None,
        }
    }
}

/// Outcome of a completed recording.
#[derive(Debug, Clone)]
pub struct RecordingSummary {
    /// Container that was written.
    pub output: PathBuf,
    /// Whole ticks counted while capturing.
    pub elapsed_ticks: u32,
    /// Seconds declared in the container's data chunk size.
    pub declared_seconds: u32,
    /// Buffers written to the raw dump.
    pub buffers_drained: u64,
    /// Partially captured bytes dropped at stop.
    pub discarded_bytes: usize,
    /// Sizes written by the finalizer.
    pub container: ContainerSummary,
}

/// Runs recording sessions: capture into a raw dump, then finalize it into a
/// WAV container.
///
/// # Thread Safety
///
/// A session blocks the calling thread until the stop signal fires. Run it
/// on a dedicated or blocking-pool thread.
#[derive(Debug, Clone)]
pub struct Recorder {
    settings: RecorderSettings,
}

impl Recorder {
    /// Create a recorder with validated settings.
    #[track_caller]
    pub fn new(settings: RecorderSettings) -> CoreResult<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Settings in use.
    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// Record one session into `output`.
    ///
    /// `open` opens the device for the session format. `should_stop` is
    /// polled at least once per poll interval; capture ends once it returns
    /// true. Content of buffers that were still filling at that moment is
    /// discarded.
    ///
    /// The device is stopped, its buffers released and the device closed on
    /// every path out of this function. The raw dump is deleted after
    /// finalization, or dropped with the error otherwise.
    ///
    /// # Errors
    ///
    /// Propagates ticker, device, buffer, dump and container errors. Each is
    /// fatal to the session.
    #[instrument(skip(self, open, should_stop))]
    pub fn record<D, O, S>(
        &self,
        open: O,
        output: &Path,
        mut should_stop: S,
    ) -> CoreResult<RecordingSummary>
    where
        D: CaptureDevice,
        O: FnOnce(&AudioFormat) -> CoreResult<D>,
        S: FnMut() -> bool,
    {
        let settings = &self.settings;

        let ticker = ElapsedTicker::spawn(settings.tick_period)?;
        let mut device = open(&settings.format)?;
        let mut ring = BufferRing::new(settings.buffer_count, settings.buffer_len)?;

        let (sink, discarded_bytes) = {
            let mut guard = DeviceGuard::new(&mut device, &mut ring);
            guard.prime()?;

            let mut sink = match &settings.temp_dir {
                Some(dir) => RawDumpSink::create_in(dir)?,
                None => RawDumpSink::create()?,
            };

            guard.start()?;
            ticker.resume();
            info!(
                buffers = settings.buffer_count,
                buffer_len = settings.buffer_len,
                "Recording started"
            );

            guard.pump(&mut sink, settings.poll_interval, &mut should_stop)?;
            let discarded = guard.finish(&mut sink)?;
            (sink, discarded)
        };

        let elapsed_ticks = ticker.stop();
        // The second in progress when capture stopped counts as a whole one.
        let declared_seconds = elapsed_ticks.saturating_add(1);
        let buffers_drained = ring.drained();

        let dump = sink.close()?;
        debug!(
            dump_bytes = dump.len(),
            elapsed_ticks, declared_seconds, "Capture finished"
        );

        let container = finalize_file(dump.path(), output, &settings.format, declared_seconds)?;

        if let Err(e) = dump.delete() {
            warn!(error = ?e, "Raw dump left behind");
        }

        info!(
            output = ?output,
            declared_seconds,
            payload = container.payload_len,
            "Recording saved"
        );

        Ok(RecordingSummary {
            output: output.to_path_buf(),
            elapsed_ticks,
            declared_seconds,
            buffers_drained,
            discarded_bytes,
            container,
        })
    }
}

/// Record from the default (or named) microphone until `should_stop` fires.
///
/// # Errors
///
/// See [`Recorder::record`] and [`CpalDevice::open`].
pub fn record_microphone<S>(
    settings: RecorderSettings,
    device_name: Option<&str>,
    output: &Path,
    should_stop: S,
) -> CoreResult<RecordingSummary>
where
    S: FnMut() -> bool,
{
    Recorder::new(settings)?.record(
        |format| CpalDevice::open(format, device_name),
        output,
        should_stop,
    )
}

/// Scoped ownership of an opened device and its buffer ring.
///
/// Dropping the guard stops the device, takes the buffers back, unprepares
/// them and closes the device.
struct DeviceGuard<'a, D: CaptureDevice> {
    device: &'a mut D,
    ring: &'a mut BufferRing,
    released: bool,
}

impl<'a, D: CaptureDevice> DeviceGuard<'a, D> {
    fn new(device: &'a mut D, ring: &'a mut BufferRing) -> Self {
        Self {
            device,
            ring,
            released: false,
        }
    }

    fn prime(&mut self) -> CoreResult<()> {
        self.ring.prime(&mut *self.device)
    }

    fn start(&mut self) -> CoreResult<()> {
        self.device.start()
    }

    fn pump<S, F>(
        &mut self,
        sink: &mut S,
        poll_interval: Duration,
        should_stop: &mut F,
    ) -> CoreResult<()>
    where
        S: SampleSink,
        F: FnMut() -> bool,
    {
        while !should_stop() {
            if let Some(buffer) = self.device.next_completed(poll_interval) {
                self.ring.accept(buffer)?;
                self.ring.drain_ready(&mut *self.device, sink)?;
            }
        }

        debug!(drained = self.ring.drained(), "Stop signal received");
        Ok(())
    }

    fn finish<S: SampleSink>(mut self, sink: &mut S) -> CoreResult<usize> {
        let discarded = self.release();
        self.ring.flush_completed(sink)?;
        Ok(discarded)
    }

    fn release(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;

        let returned = self.device.stop();
        let discarded = self.ring.reclaim(returned);
        self.ring.unprepare_all(&mut *self.device);
        self.device.close();
        discarded
    }
}

impl<D: CaptureDevice> Drop for DeviceGuard<'_, D> {
    fn drop(&mut self) {
        self.release();
    }
}

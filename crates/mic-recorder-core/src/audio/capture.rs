use crate::{
    AudioError, CoreResult,
    audio::{AudioFormat, BufferState, CaptureBuffer, CaptureDevice, EnqueueRejected},
};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    time::Duration,
};

use cpal::{
    BufferSize, Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Samples converted per lock acquisition in the stream callback.
const CONVERT_CHUNK_SAMPLES: usize = 512;

/// Buffers queued with the stream callback, front is filling.
#[derive(Default)]
pub(crate) struct Inflight {
    pub(crate) queue: VecDeque<CaptureBuffer>,
    /// Bytes dropped because no buffer was queued.
    pub(crate) overrun_bytes: u64,
}

impl Inflight {
    /// Lock `shared`, recovering the buffers from a poisoned lock.
    pub(crate) fn lock(shared: &Mutex<Self>) -> MutexGuard<'_, Self> {
        shared.lock().unwrap_or_else(|e| {
            error!("Inflight buffer lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    /// Collect every buffer still held by the callback side: completed ones
    /// in completion order, then queued ones.
    ///
    /// A callback that passed the running check sends completions while
    /// holding the lock, so the channel is drained only once it is taken.
    pub(crate) fn take_all(
        shared: &Mutex<Self>,
        completed: &mpsc::Receiver<CaptureBuffer>,
    ) -> Vec<CaptureBuffer> {
        let mut inflight = Self::lock(shared);
        let mut returned: Vec<CaptureBuffer> = completed.try_iter().collect();
        returned.extend(inflight.queue.drain(..));

        if inflight.overrun_bytes > 0 {
            warn!(
                bytes = inflight.overrun_bytes,
                "Samples dropped while no buffer was queued"
            );
        }

        returned
    }

    /// Write bytes into the queued buffers, moving each one to `completed`
    /// as soon as it fills.
    pub(crate) fn deliver(&mut self, mut bytes: &[u8], completed: &mpsc::Sender<CaptureBuffer>) {
        while !bytes.is_empty() {
            let Some(buffer) = self.queue.front_mut() else {
                self.overrun_bytes += bytes.len() as u64;
                return;
            };

            let taken = buffer.fill_from(bytes);
            bytes = &bytes[taken..];

            if buffer.is_full()
                && let Some(full) = self.queue.pop_front()
                && completed.send(full).is_err()
            {
                error!("Completion channel closed, dropping filled buffer");
            }
        }
    }
}

/// Default cpal input device driving the buffer queue.
///
/// Samples arrive on cpal's audio thread, are converted to 16-bit
/// little-endian PCM and written into the buffer at the head of the queue.
/// Filled buffers are sent back over a channel in queue order.
pub struct CpalDevice {
    config: StreamConfig,
    block_align: usize,
    stream: Option<Stream>,
    inflight: Arc<Mutex<Inflight>>,
    completed_rx: mpsc::Receiver<CaptureBuffer>,
    /// Gates the callback. Cleared before the stream is dropped so no
    /// in-flight callback writes after `stop()` collects the buffers.
    running: Arc<AtomicBool>,
}

impl CpalDevice {
    /// Open the default input device, or the one named `device_name`.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::NoMicrophoneFound`] if there is no matching
    /// device, [`AudioError::InvalidFormat`] for a non-16-bit format, and
    /// [`AudioError::DeviceOpen`] if the device cannot capture `format`.
    #[track_caller]
    #[instrument(
        skip(format),
        fields(sample_rate = format.sample_rate(), channels = format.channels())
    )]
    pub fn open(format: &AudioFormat, device_name: Option<&str>) -> CoreResult<Self> {
        if format.bits_per_sample() != 16 {
            return Err(AudioError::InvalidFormat {
                reason: format!(
                    "input devices capture 16-bit PCM, got {} bits",
                    format.bits_per_sample()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let host = cpal::default_host();

        let device = match device_name {
            None => host.default_input_device(),
            Some(name) => host
                .input_devices()
                .map_err(|e| AudioError::DeviceOpen {
                    reason: format!("Failed to enumerate input devices: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?
                .find(|d| device_matches(d, name)),
        }
        .ok_or(AudioError::NoMicrophoneFound {
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rate = format.sample_rate();
        let sample_format = device
            .supported_input_configs()
            .map_err(|e| AudioError::DeviceOpen {
                reason: format!("Failed to query configs: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .filter(|range| range.channels() == format.channels())
            .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
            .map(|range| range.sample_format())
            .filter(|f| matches!(f, SampleFormat::I16 | SampleFormat::F32))
            .max_by_key(|f| *f == SampleFormat::I16)
            .ok_or_else(|| AudioError::DeviceOpen {
                reason: format!(
                    "Device does not support {} Hz, {} channel(s) as i16 or f32",
                    rate,
                    format.channels()
                ),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config = StreamConfig {
            channels: format.channels(),
            sample_rate: rate,
            buffer_size: BufferSize::Default,
        };

        let (completed_tx, completed_rx) = mpsc::channel();
        let inflight = Arc::new(Mutex::new(Inflight::default()));
        let running = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, &inflight, &running, completed_tx)
            }
            _ => build_stream::<f32>(&device, &config, &inflight, &running, completed_tx),
        }?;

        // Some backends start on build; the running flag keeps the callback
        // idle until start() either way.
        if let Err(e) = stream.pause() {
            debug!(error = %e, "Stream pause after build not supported");
        }

        info!(
            device_id = ?device.id(),
            sample_rate = rate,
            channels = format.channels(),
            sample_format = ?sample_format,
            "Input device opened"
        );

        Ok(Self {
            config,
            block_align: usize::from(format.block_align()),
            stream: Some(stream),
            inflight,
            completed_rx,
            running,
        })
    }

    /// Sample rate the stream was opened with.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn lock_inflight(&self) -> MutexGuard<'_, Inflight> {
        Inflight::lock(&self.inflight)
    }
}

impl CaptureDevice for CpalDevice {
    #[track_caller]
    fn prepare(&mut self, buffer: &mut CaptureBuffer) -> CoreResult<()> {
        if self.stream.is_none() {
            return Err(AudioError::HeaderPrepare {
                buffer: buffer.index(),
                reason: "device is closed".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if buffer.capacity() % self.block_align != 0 {
            return Err(AudioError::HeaderPrepare {
                buffer: buffer.index(),
                reason: format!(
                    "capacity {} is not a multiple of block align {}",
                    buffer.capacity(),
                    self.block_align
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        buffer.set_prepared(true);
        Ok(())
    }

    #[track_caller]
    fn enqueue(&mut self, mut buffer: CaptureBuffer) -> Result<(), EnqueueRejected> {
        let reason = if self.stream.is_none() {
            Some("device is closed".to_string())
        } else if !buffer.is_prepared() {
            Some("buffer is not prepared".to_string())
        } else if buffer.state() != BufferState::Empty {
            Some(format!("buffer is {:?}, expected Empty", buffer.state()))
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(EnqueueRejected {
                error: AudioError::HeaderEnqueue {
                    buffer: buffer.index(),
                    reason,
                    location: ErrorLocation::from(Location::caller()),
                },
                buffer,
            });
        }

        buffer.mark_queued();
        self.lock_inflight().queue.push_back(buffer);
        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn start(&mut self) -> CoreResult<()> {
        let stream = self.stream.as_ref().ok_or_else(|| AudioError::Start {
            reason: "device is closed".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.running.store(true, Ordering::Release);

        if let Err(e) = stream.play() {
            self.running.store(false, Ordering::Release);
            return Err(AudioError::Start {
                reason: format!("Failed to start stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!("Audio capture started");
        Ok(())
    }

    fn next_completed(&mut self, timeout: Duration) -> Option<CaptureBuffer> {
        self.completed_rx.recv_timeout(timeout).ok()
    }

    #[instrument(skip(self))]
    fn stop(&mut self) -> Vec<CaptureBuffer> {
        self.running.store(false, Ordering::Release);

        if let Some(stream) = self.stream.as_ref()
            && let Err(e) = stream.pause()
        {
            debug!(error = %e, "Stream pause on stop not supported");
        }

        let returned = Inflight::take_all(&self.inflight, &self.completed_rx);

        info!(buffers = returned.len(), "Audio capture stopped");
        returned
    }

    fn unprepare(&mut self, buffer: &mut CaptureBuffer) {
        buffer.set_prepared(false);
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!("Input device closed");
        }
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        self.close();
    }
}

#[allow(deprecated)]
fn device_matches(device: &Device, name: &str) -> bool {
    device.name().map(|n| n == name).unwrap_or(false)
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    inflight: &Arc<Mutex<Inflight>>,
    running: &Arc<AtomicBool>,
    completed_tx: mpsc::Sender<CaptureBuffer>,
) -> CoreResult<Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let inflight = Arc::clone(inflight);
    let running = Arc::clone(running);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !running.load(Ordering::Acquire) {
                    return;
                }

                let mut inflight = Inflight::lock(&inflight);

                let mut scratch = [0u8; CONVERT_CHUNK_SAMPLES * 2];
                for chunk in data.chunks(CONVERT_CHUNK_SAMPLES) {
                    for (sample, out) in chunk.iter().zip(scratch.chunks_exact_mut(2)) {
                        out.copy_from_slice(&sample.to_sample::<i16>().to_le_bytes());
                    }
                    inflight.deliver(&scratch[..chunk.len() * 2], &completed_tx);
                }
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::DeviceOpen {
            reason: format!("Failed to build stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
}

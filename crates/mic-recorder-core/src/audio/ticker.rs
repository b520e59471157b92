use crate::{AudioError, CoreResult};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use error_location::ErrorLocation;
use tracing::{debug, instrument, warn};

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

enum TickerSignal {
    Resume,
    Stop,
}

/// Background counter of elapsed recording seconds.
///
/// The thread is created suspended and only counts after
/// [`resume`](ElapsedTicker::resume). [`stop`](ElapsedTicker::stop) cancels it
/// cooperatively and joins it, so the returned count is final.
pub struct ElapsedTicker {
    elapsed: Arc<AtomicU32>,
    signal_tx: mpsc::Sender<TickerSignal>,
    handle: Option<JoinHandle<()>>,
}

impl ElapsedTicker {
    /// Spawn a suspended ticker thread incrementing once per `period`.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::TickerCreate`] if the OS refuses the thread.
    #[track_caller]
    #[instrument]
    pub fn spawn(period: Duration) -> CoreResult<Self> {
        let elapsed = Arc::new(AtomicU32::new(0));
        let (signal_tx, signal_rx) = mpsc::channel();
        let counter = Arc::clone(&elapsed);

        let handle = thread::Builder::new()
            .name("elapsed-ticker".to_string())
            .spawn(move || {
                // Suspended until the first signal; a Stop or a dropped sender
                // before Resume means capture never began.
                match signal_rx.recv() {
                    Ok(TickerSignal::Resume) => {}
                    Ok(TickerSignal::Stop) | Err(_) => return,
                }

                loop {
                    match signal_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {
                            counter.fetch_add(1, Ordering::Relaxed);
                        }
                        Ok(TickerSignal::Resume) => {}
                        Ok(TickerSignal::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|source| AudioError::TickerCreate {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(period_ms = period.as_millis(), "Elapsed ticker created");

        Ok(Self {
            elapsed,
            signal_tx,
            handle: Some(handle),
        })
    }

    /// Start counting.
    pub fn resume(&self) {
        if self.signal_tx.send(TickerSignal::Resume).is_err() {
            warn!("Elapsed ticker exited before resume");
        }
    }

    /// Ticks counted so far. Only stable after [`stop`](Self::stop).
    pub fn elapsed(&self) -> u32 {
        self.elapsed.load(Ordering::Relaxed)
    }

    /// Cancel the ticker, wait for its thread, and return the final count.
    #[instrument(skip(self))]
    pub fn stop(mut self) -> u32 {
        self.shutdown();
        let ticks = self.elapsed.load(Ordering::Acquire);
        debug!(ticks, "Elapsed ticker stopped");
        ticks
    }

    fn shutdown(&mut self) {
        let _ = self.signal_tx.send(TickerSignal::Stop);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Elapsed ticker thread panicked");
        }
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

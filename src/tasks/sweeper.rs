//! TTL Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};

// == Sweeper ==
/// Owned handle to a periodic sweep running on its own thread.
///
/// The sweep loop runs on a current-thread tokio runtime, so callers do not
/// need a runtime of their own. [`stop`](Sweeper::stop) signals the loop and
/// joins the thread; a sweep pass in flight always completes first.
#[derive(Debug)]
pub struct Sweeper {
    running: Mutex<Option<Running>>,
    interval: Duration,
}

#[derive(Debug)]
struct Running {
    stop_tx: oneshot::Sender<()>,
    thread: JoinHandle<()>,
}

impl Sweeper {
    /// Spawns a sweeper calling `sweep` every `interval`.
    ///
    /// `sweep` returns the number of entries it removed. A pass that panics is
    /// logged and the next pass still runs.
    ///
    /// # Errors
    /// - `InvalidConfig` if `interval` is zero
    /// - `SweeperStart` if the runtime or thread cannot be created
    pub fn spawn<F>(interval: Duration, sweep: F) -> Result<Self>
    where
        F: FnMut() -> usize + Send + 'static,
    {
        if interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep interval must be greater than zero".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(CacheError::SweeperStart)?;
        let (stop_tx, stop_rx) = oneshot::channel();

        let thread = thread::Builder::new()
            .name("cache-sweeper".to_string())
            .spawn(move || runtime.block_on(run_sweeps(interval, sweep, stop_rx)))
            .map_err(CacheError::SweeperStart)?;

        info!(
            "Starting TTL sweeper with interval of {} ms",
            interval.as_millis()
        );

        Ok(Self {
            running: Mutex::new(Some(Running { stop_tx, thread })),
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    // == Stop ==
    /// Stops the sweep loop and waits for its thread to exit.
    ///
    /// Only the first call does anything; it returns true, later calls false.
    pub fn stop(&self) -> bool {
        let mut running = self.running.lock();
        let Some(Running { stop_tx, thread }) = running.take() else {
            return false;
        };

        // The loop may already be gone if its runtime shut down
        let _ = stop_tx.send(());
        if thread.join().is_err() {
            warn!("TTL sweeper thread exited with a panic");
        }

        info!("TTL sweeper stopped");
        true
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_sweeps<F>(period: Duration, mut sweep: F, mut stop_rx: oneshot::Receiver<()>)
where
    F: FnMut() -> usize,
{
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // Fires on an explicit stop and when the handle is dropped
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                match panic::catch_unwind(AssertUnwindSafe(|| sweep())) {
                    Ok(0) => debug!("TTL sweep: no expired entries found"),
                    Ok(removed) => debug!("TTL sweep: removed {} expired entries", removed),
                    Err(_) => warn!("TTL sweep pass panicked, continuing with next pass"),
                }
            }
        }
    }
}

//! Background bulk vehicle injection.
//!
//! A stress test runs on its own thread, adding one random vehicle per
//! interval through a [`Commands`] handle.  It never synchronises with tick
//! boundaries; the registry handles the concurrency.
//!
//! The wait between vehicles parks the thread, so [`StressTest::stop`]
//! interrupts it at once instead of after the current interval.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tc_engine::TrafficEngine;
use tracing::{info, warn};

use crate::Commands;

/// Outcome of a finished (or stopped) stress test.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StressSummary {
    /// Vehicles added.
    pub spawned: usize,
    /// Attempts that found no route or were refused by the engine.
    pub failed:  usize,
}

impl StressSummary {
    #[inline]
    pub fn attempts(&self) -> usize {
        self.spawned + self.failed
    }
}

/// Handle to a running stress test.  Dropping it stops the thread.
pub struct StressTest {
    stop:   Arc<AtomicBool>,
    handle: Option<JoinHandle<StressSummary>>,
}

impl StressTest {
    /// Start adding `count` random vehicles, one every `interval`.
    pub fn start<E: TrafficEngine + 'static>(
        commands: Commands<E>,
        count:    usize,
        interval: Duration,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("stress-test".into())
            .spawn(move || inject(&commands, count, interval, &flag))?;
        info!(count, interval_ms = interval.as_millis() as u64, "stress test started");
        Ok(Self { stop, handle: Some(handle) })
    }

    /// Ask the thread to finish after the vehicle it is currently adding.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = &self.handle {
            handle.thread().unpark();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the thread and return what it did.  A panicked thread is
    /// reported as an empty summary.
    pub fn join(mut self) -> StressSummary {
        self.join_inner()
    }

    fn join_inner(&mut self) -> StressSummary {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(summary)) => summary,
            Some(Err(_)) => {
                warn!("stress test thread panicked");
                StressSummary::default()
            }
            None => StressSummary::default(),
        }
    }
}

impl Drop for StressTest {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
            self.join_inner();
        }
    }
}

fn inject<E: TrafficEngine>(
    commands: &Commands<E>,
    count:    usize,
    interval: Duration,
    stop:     &AtomicBool,
) -> StressSummary {
    let mut summary = StressSummary::default();
    for i in 0..count {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        match commands.create_random_vehicle() {
            Ok(Some(_)) => summary.spawned += 1,
            Ok(None) => summary.failed += 1,
            Err(e) => {
                warn!(error = %e, "stress test vehicle rejected");
                summary.failed += 1;
            }
        }
        if i + 1 < count {
            wait(interval, stop);
        }
    }
    info!(spawned = summary.spawned, failed = summary.failed, "stress test finished");
    summary
}

/// Sleep for `interval` unless `stop` is raised first.
fn wait(interval: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::park_timeout(deadline - now);
    }
}

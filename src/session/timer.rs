// src/session/timer.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

const TICK: Duration = Duration::from_secs(1);

/// One-second resolution elapsed-time counter backed by a cancellable task.
///
/// The ticking task is owned here and aborted on `stop()` and on drop,
/// so no periodic work outlives the session that started it.
#[derive(Debug, Default)]
pub struct ElapsedTimer {
    seconds: Arc<AtomicU64>,
    started: Option<Instant>,
    task: Option<JoinHandle<()>>,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to zero and starts ticking. Must be called inside a Tokio runtime.
    pub fn start(&mut self) {
        self.cancel();
        self.seconds = Arc::new(AtomicU64::new(0));
        let now = Instant::now();
        self.started = Some(now);

        let seconds = self.seconds.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticks = interval_at(now + TICK, TICK);
            loop {
                ticks.tick().await;
                seconds.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    /// Stops ticking and freezes the counter at the wall-clock time since start.
    /// Returns the frozen value. Calling it again returns the same value.
    pub fn stop(&mut self) -> u64 {
        if self.cancel() {
            let wall = self.wall_clock_secs();
            self.seconds.fetch_max(wall, Ordering::Relaxed);
        }
        self.seconds()
    }

    pub fn seconds(&self) -> u64 {
        self.seconds.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Whole seconds since `start()`, independent of tick delivery.
    pub fn wall_clock_secs(&self) -> u64 {
        self.started
            .map(|s| s.elapsed().as_secs())
            .unwrap_or(0)
    }

    fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

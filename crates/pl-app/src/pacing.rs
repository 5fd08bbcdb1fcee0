//! Wall-clock pacing and cooperative shutdown.

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cloneable shutdown request shared between the loop and signal handlers.
///
/// One waiter at a time is woken by the channel; every handle observes the
/// flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            let _ = self.tx.try_send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for up to `timeout`, returning early on a shutdown request.
    ///
    /// Returns `true` if shutdown has been requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.is_triggered()
            }
        }
    }
}

/// Schedules ticks on an absolute monotonic timeline.
///
/// Tick k is due at `start + k·period`; a late tick does not shift the
/// ones after it.
#[derive(Debug)]
pub struct Pacer {
    period_ns: u64,
    start: Instant,
    ticks: u64,
    overruns: u64,
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        Self {
            period_ns: period.as_nanos().min(u64::MAX as u128) as u64,
            start: Instant::now(),
            ticks: 0,
            overruns: 0,
        }
    }

    /// Wait for the next tick deadline.
    ///
    /// Returns `false` if shutdown was requested instead.
    pub fn wait_next(&mut self, shutdown: &Shutdown) -> bool {
        self.ticks += 1;
        let deadline = self.deadline(self.ticks);
        let now = Instant::now();

        match deadline.checked_duration_since(now) {
            Some(remaining) if !remaining.is_zero() => !shutdown.wait_timeout(remaining),
            _ => {
                self.overruns += 1;
                debug!(
                    tick = self.ticks,
                    late_us = now.duration_since(deadline).as_micros() as u64,
                    "Tick overran its deadline"
                );
                !shutdown.is_triggered()
            }
        }
    }

    /// Ticks that started after their deadline.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    fn deadline(&self, tick: u64) -> Instant {
        self.start + Duration::from_nanos(self.period_ns.saturating_mul(tick))
    }
}

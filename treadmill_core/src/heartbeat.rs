//! Periodic timer that drives `tick()`.
//!
//! A heartbeat never touches the session itself. It only emits
//! `DriverEvent::Tick` tagged with the generation it was armed under; the
//! engine drops ticks from any generation other than the current one, so a
//! tick still queued from a cancelled timer is harmless.

use crate::runner::DriverEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Timer handle owned by the session engine
pub trait Heartbeat {
    /// Start a periodic timer, cancelling any previous one.
    ///
    /// Returns the generation number ticks from this timer will carry.
    fn arm(&mut self, period: Duration) -> u64;

    /// Cancel the current timer, if any
    fn disarm(&mut self);

    fn is_armed(&self) -> bool;
}

/// Heartbeat backed by a background thread feeding the runner's channel
pub struct ThreadHeartbeat {
    tx: Sender<DriverEvent>,
    generation: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl ThreadHeartbeat {
    pub fn new(tx: Sender<DriverEvent>) -> Self {
        Self {
            tx,
            generation: 0,
            cancel: None,
        }
    }
}

impl Heartbeat for ThreadHeartbeat {
    fn arm(&mut self, period: Duration) -> u64 {
        self.disarm();
        self.generation += 1;

        let generation = self.generation;
        let cancel = Arc::new(AtomicBool::new(false));
        let cancelled = Arc::clone(&cancel);
        let tx = self.tx.clone();

        thread::spawn(move || {
            // Deadline-based so a slow receiver does not accumulate drift
            let mut next = Instant::now() + period;
            loop {
                thread::sleep(next.saturating_duration_since(Instant::now()));
                if cancelled.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(DriverEvent::Tick { generation }).is_err() {
                    break;
                }
                next += period;
            }
            tracing::trace!("Heartbeat generation {} stopped", generation);
        });

        self.cancel = Some(cancel);
        tracing::debug!("Armed heartbeat generation {} every {:?}", generation, period);
        generation
    }

    fn disarm(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::SeqCst);
            tracing::debug!("Disarmed heartbeat generation {}", self.generation);
        }
    }

    fn is_armed(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for ThreadHeartbeat {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Observable state of a `ManualHeartbeat`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualHeartbeatState {
    pub armed: bool,
    pub generation: u64,
    pub arm_count: u32,
    pub period: Option<Duration>,
}

/// Heartbeat that never fires on its own; tests deliver ticks by hand.
/// Clones share state, so a test can keep one to inspect arming.
#[derive(Clone, Debug, Default)]
pub struct ManualHeartbeat {
    state: Arc<Mutex<ManualHeartbeatState>>,
}

impl ManualHeartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ManualHeartbeatState {
        self.lock().clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualHeartbeatState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Heartbeat for ManualHeartbeat {
    fn arm(&mut self, period: Duration) -> u64 {
        let mut state = self.lock();
        state.armed = true;
        state.generation += 1;
        state.arm_count += 1;
        state.period = Some(period);
        state.generation
    }

    fn disarm(&mut self) {
        self.lock().armed = false;
    }

    fn is_armed(&self) -> bool {
        self.lock().armed
    }
}

//! The timer worker thread and its service handle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use pane_api::InstanceId;
use pane_mailbox::sync::lock;
use pane_mailbox::MailboxError;

use crate::table::{Fire, TimerTable};
use crate::{TimerError, TimerRequest};

/// Timer service settings.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Maximum number of timers across all windows.
    pub capacity: usize,
    /// How long the worker sleeps when no timer is active.
    pub idle_wait: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            idle_wait: Duration::from_secs(10),
        }
    }
}

struct Shared {
    table: Mutex<TimerTable>,
    running: AtomicBool,
    idle_wait: Duration,
    /// Fires refused by a full mailbox.
    dropped: AtomicU64,
}

/// Handle to the shared timer worker.
///
/// Dropping the service stops and joins the worker.
pub struct TimerService {
    shared: Arc<Shared>,

    /// Wakes the worker early. Capacity 1: wakes coalesce.
    wake: Sender<()>,

    /// Handle to the worker thread.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for TimerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService")
            .field("running", &self.shared.running.load(Ordering::SeqCst))
            .field("timers", &self.len())
            .finish_non_exhaustive()
    }
}

impl TimerService {
    /// Spawn the worker thread.
    pub fn start(config: TimerConfig) -> Result<Self, TimerError> {
        let shared = Arc::new(Shared {
            table: Mutex::new(TimerTable::new(config.capacity)),
            running: AtomicBool::new(true),
            idle_wait: config.idle_wait,
            dropped: AtomicU64::new(0),
        });
        let (wake, wake_rx) = crossbeam_channel::bounded(1);

        let shared_clone = shared.clone();
        let handle = thread::Builder::new()
            .name("pane-timer".into())
            .spawn(move || worker_loop(shared_clone, wake_rx))
            .map_err(TimerError::Spawn)?;

        tracing::debug!(capacity = config.capacity, "timer service started");
        Ok(Self {
            shared,
            wake,
            worker: Mutex::new(Some(handle)),
        })
    }

    fn ensure_running(&self) -> Result<(), TimerError> {
        if self.shared.running.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TimerError::ShutDown)
        }
    }

    fn wake(&self) {
        let _ = self.wake.try_send(());
    }

    /// Register a timer in the stopped state.
    ///
    /// An existing `(owner, id)` entry is refreshed in place and stopped,
    /// which also advances its epoch. Call [`start_timer`](Self::start_timer) to arm it.
    pub fn create_timer(&self, request: TimerRequest) -> Result<(), TimerError> {
        self.ensure_running()?;
        lock(&self.shared.table).create(request)
    }

    /// Arm a timer one interval from now.
    pub fn start_timer(&self, owner: InstanceId, id: u32) -> Result<(), TimerError> {
        self.ensure_running()?;
        lock(&self.shared.table).start(owner, id, Instant::now())?;
        // The worker may be asleep on a later deadline.
        self.wake();
        Ok(())
    }

    /// Disarm a timer, returning its new request epoch.
    pub fn stop_timer(&self, owner: InstanceId, id: u32) -> Result<u64, TimerError> {
        self.ensure_running()?;
        lock(&self.shared.table).stop(owner, id)
    }

    /// Whether a `TIMER` message stamped with `epoch` is still current.
    pub fn check(&self, owner: InstanceId, id: u32, epoch: u64) -> bool {
        lock(&self.shared.table).check(owner, id, epoch)
    }

    /// Current request epoch of a timer.
    pub fn epoch(&self, owner: InstanceId, id: u32) -> Option<u64> {
        lock(&self.shared.table).epoch(owner, id)
    }

    /// Drop every timer of a terminated team leader.
    pub fn remove_owner(&self, owner: InstanceId) -> usize {
        lock(&self.shared.table).remove_owner(owner)
    }

    /// Number of registered timers.
    pub fn len(&self) -> usize {
        lock(&self.shared.table).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active_count(&self) -> usize {
        lock(&self.shared.table).active_count()
    }

    /// Fires dropped because the owner's mailbox was full.
    pub fn dropped_fires(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.wake();
        if let Some(handle) = lock(&self.worker).take() {
            if handle.join().is_err() {
                tracing::warn!("timer worker panicked");
            }
            tracing::debug!("timer service stopped");
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The worker loop.
fn worker_loop(shared: Arc<Shared>, wake: Receiver<()>) {
    while shared.running.load(Ordering::SeqCst) {
        let deadline = lock(&shared.table)
            .next_deadline()
            .unwrap_or_else(|| Instant::now() + shared.idle_wait);

        match wake.recv_deadline(deadline) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if !shared.running.load(Ordering::SeqCst) {
            break;
        }

        let fires = lock(&shared.table).expire(Instant::now());
        for fire in fires {
            deliver(&shared, fire);
        }
    }
}

/// Post one fire. Never blocks: one window with a full mailbox must not
/// hold up every other window's timers.
///
/// A fire refused by a full mailbox is dropped; a repeating timer is already
/// re-armed and a one-shot is re-armed one interval later. A stopped or
/// vanished mailbox deactivates the timer.
fn deliver(shared: &Shared, fire: Fire) {
    let Fire {
        owner,
        id,
        epoch,
        mailbox,
        message,
    } = fire;

    let Some(mailbox) = mailbox.upgrade() else {
        tracing::debug!(%owner, id, "timer owner's mailbox is gone");
        lock(&shared.table).deactivate_if(owner, id, epoch);
        return;
    };

    match mailbox.try_send(message) {
        Ok(()) => {}
        Err(MailboxError::Full) => {
            shared.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%owner, id, "owner's mailbox is full, timer fire dropped");
            lock(&shared.table).rearm_if(owner, id, epoch, Instant::now());
        }
        Err(e) => {
            tracing::debug!(%owner, id, "timer fire not delivered: {}", e);
            lock(&shared.table).deactivate_if(owner, id, epoch);
        }
    }
}

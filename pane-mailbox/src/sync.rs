//! Synchronization primitives shared by the pane crates.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Lock a mutex, recovering the guard if a panicking holder poisoned it.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The semaphore was closed and has no permits left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

#[derive(Debug)]
struct Permits {
    available: usize,
    closed: bool,
}

/// Counting semaphore.
///
/// Closing wakes every waiter. Permits released before the close can
/// still be acquired afterwards; once they run out, acquires fail with
/// [`Closed`] instead of blocking.
#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<Permits>,
    cond: Condvar,
}

impl Semaphore {
    pub fn new(available: usize) -> Self {
        Self {
            permits: Mutex::new(Permits {
                available,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Block until a permit is available.
    pub fn acquire(&self) -> Result<(), Closed> {
        let mut permits = lock(&self.permits);
        loop {
            if permits.available > 0 {
                permits.available -= 1;
                return Ok(());
            }
            if permits.closed {
                return Err(Closed);
            }
            permits = self
                .cond
                .wait(permits)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until a permit is available or the deadline passes.
    ///
    /// Returns `Ok(false)` on timeout.
    pub fn acquire_until(&self, deadline: Instant) -> Result<bool, Closed> {
        let mut permits = lock(&self.permits);
        loop {
            if permits.available > 0 {
                permits.available -= 1;
                return Ok(true);
            }
            if permits.closed {
                return Err(Closed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            permits = self
                .cond
                .wait_timeout(permits, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Take a permit without blocking. `Ok(false)` means none available.
    pub fn try_acquire(&self) -> Result<bool, Closed> {
        let mut permits = lock(&self.permits);
        if permits.available > 0 {
            permits.available -= 1;
            Ok(true)
        } else if permits.closed {
            Err(Closed)
        } else {
            Ok(false)
        }
    }

    pub fn release(&self) {
        let mut permits = lock(&self.permits);
        permits.available += 1;
        self.cond.notify_one();
    }

    pub fn close(&self) {
        let mut permits = lock(&self.permits);
        permits.closed = true;
        self.cond.notify_all();
    }

    pub fn available(&self) -> usize {
        lock(&self.permits).available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_release() {
        let sem = Semaphore::new(2);
        sem.acquire().unwrap();
        sem.acquire().unwrap();
        assert_eq!(sem.try_acquire(), Ok(false));

        sem.release();
        assert_eq!(sem.available(), 1);
        assert_eq!(sem.try_acquire(), Ok(true));
    }

    #[test]
    fn test_release_wakes_waiter() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter = {
            let sem = sem.clone();
            thread::spawn(move || sem.acquire())
        };

        thread::sleep(Duration::from_millis(20));
        sem.release();
        assert_eq!(waiter.join().unwrap(), Ok(()));
    }

    #[test]
    fn test_close_keeps_remaining_permits() {
        let sem = Semaphore::new(1);
        sem.close();
        assert_eq!(sem.acquire(), Ok(()));
        assert_eq!(sem.acquire(), Err(Closed));
        assert_eq!(sem.try_acquire(), Err(Closed));
    }

    #[test]
    fn test_close_wakes_blocked_acquire() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter = {
            let sem = sem.clone();
            thread::spawn(move || sem.acquire())
        };

        thread::sleep(Duration::from_millis(20));
        sem.close();
        assert_eq!(waiter.join().unwrap(), Err(Closed));
    }

    #[test]
    fn test_acquire_until_times_out() {
        let sem = Semaphore::new(0);
        let deadline = Instant::now() + Duration::from_millis(10);
        assert_eq!(sem.acquire_until(deadline), Ok(false));
    }
}

//! Bounded mailbox: ring buffer plus free/filled counting semaphores.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::ring_buffer::RingBuffer;
use crate::sync::{lock, Semaphore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MailboxError {
    #[error("mailbox not initialized")]
    NotInitialized,

    #[error("mailbox already initialized")]
    AlreadyInitialized,

    #[error("mailbox stopped")]
    Stopped,

    #[error("mailbox full")]
    Full,

    #[error("mailbox must be stopped before it is destroyed")]
    NotStopped,

    #[error("mailbox still holds {0} queued messages")]
    NotDrained(usize),

    #[error("mailbox capacity must be non-zero")]
    ZeroCapacity,
}

/// Send/receive counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    /// Messages accepted into the ring.
    pub sent_ok: u64,
    /// Sends refused (stopped, full on `try_send`, not initialized).
    pub sent_ng: u64,
    /// Messages taken off the ring.
    pub received: u64,
}

#[derive(Debug)]
struct Queue<T> {
    ring: RingBuffer<T>,
    stopped: bool,
}

#[derive(Debug)]
struct Channel<T> {
    queue: Mutex<Queue<T>>,
    /// Free-slot count; senders wait here.
    free: Semaphore,
    /// Filled-slot count; receivers wait here.
    filled: Semaphore,
}

/// A fixed-capacity multi-producer message queue.
///
/// Delivery is FIFO across all senders. No lock is held while a sender
/// or receiver is blocked on a semaphore.
#[derive(Debug)]
pub struct Mailbox<T> {
    channel: Mutex<Option<Arc<Channel<T>>>>,
    sent_ok: AtomicU64,
    sent_ng: AtomicU64,
    received: AtomicU64,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    /// An uninitialized mailbox handle. Call [`Mailbox::create`] before use.
    pub fn new() -> Self {
        Self {
            channel: Mutex::new(None),
            sent_ok: AtomicU64::new(0),
            sent_ng: AtomicU64::new(0),
            received: AtomicU64::new(0),
        }
    }

    /// Create and initialize in one step.
    pub fn with_capacity(capacity: usize) -> Result<Self, MailboxError> {
        let mailbox = Self::new();
        mailbox.create(capacity)?;
        Ok(mailbox)
    }

    /// Allocate the ring and semaphores. Fails if already initialized.
    pub fn create(&self, capacity: usize) -> Result<(), MailboxError> {
        if capacity == 0 {
            return Err(MailboxError::ZeroCapacity);
        }
        let mut slot = lock(&self.channel);
        if slot.is_some() {
            return Err(MailboxError::AlreadyInitialized);
        }
        *slot = Some(Arc::new(Channel {
            queue: Mutex::new(Queue {
                ring: RingBuffer::new(capacity),
                stopped: false,
            }),
            free: Semaphore::new(capacity),
            filled: Semaphore::new(0),
        }));
        Ok(())
    }

    fn channel(&self) -> Result<Arc<Channel<T>>, MailboxError> {
        lock(&self.channel)
            .clone()
            .ok_or(MailboxError::NotInitialized)
    }

    fn refuse(&self, err: MailboxError) -> Result<(), MailboxError> {
        self.sent_ng.fetch_add(1, Ordering::Relaxed);
        Err(err)
    }

    /// Queue a message, blocking while the ring is full.
    ///
    /// Fails immediately with [`MailboxError::Stopped`] once the mailbox
    /// has been stopped, including for senders already blocked on a full
    /// ring when the stop happens.
    pub fn send(&self, message: T) -> Result<(), MailboxError> {
        let channel = match self.channel() {
            Ok(channel) => channel,
            Err(e) => return self.refuse(e),
        };
        if lock(&channel.queue).stopped {
            return self.refuse(MailboxError::Stopped);
        }
        if channel.free.acquire().is_err() {
            return self.refuse(MailboxError::Stopped);
        }
        self.commit(&channel, message)
    }

    /// Queue a message only if a slot is free right now.
    pub fn try_send(&self, message: T) -> Result<(), MailboxError> {
        let channel = match self.channel() {
            Ok(channel) => channel,
            Err(e) => return self.refuse(e),
        };
        match channel.free.try_acquire() {
            Ok(true) => self.commit(&channel, message),
            Ok(false) => self.refuse(MailboxError::Full),
            Err(_) => self.refuse(MailboxError::Stopped),
        }
    }

    /// Write into the slot reserved by an acquired free permit.
    fn commit(&self, channel: &Channel<T>, message: T) -> Result<(), MailboxError> {
        {
            let mut queue = lock(&channel.queue);
            if queue.stopped {
                drop(queue);
                channel.free.release();
                return self.refuse(MailboxError::Stopped);
            }
            if queue.ring.push(message).is_err() {
                // A held free permit guarantees a slot; keep counts coherent anyway.
                drop(queue);
                channel.free.release();
                return self.refuse(MailboxError::Full);
            }
        }
        channel.filled.release();
        self.sent_ok.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Take the oldest message, blocking while the ring is empty.
    ///
    /// On a stopped mailbox this keeps returning queued messages and then
    /// fails with [`MailboxError::Stopped`] instead of blocking forever.
    pub fn receive(&self) -> Result<T, MailboxError> {
        let channel = self.channel()?;
        channel
            .filled
            .acquire()
            .map_err(|_| MailboxError::Stopped)?;
        Ok(self.take(&channel))
    }

    /// Take the oldest message, waiting at most `timeout`.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<T>, MailboxError> {
        let channel = self.channel()?;
        let deadline = Instant::now() + timeout;
        match channel.filled.acquire_until(deadline) {
            Ok(true) => Ok(Some(self.take(&channel))),
            Ok(false) => Ok(None),
            Err(_) => Err(MailboxError::Stopped),
        }
    }

    /// Take the oldest message if one is queued. `Ok(None)` means no message.
    pub fn try_receive(&self) -> Result<Option<T>, MailboxError> {
        let channel = self.channel()?;
        match channel.filled.try_acquire() {
            Ok(true) => Ok(Some(self.take(&channel))),
            Ok(false) | Err(_) => Ok(None),
        }
    }

    /// Pop the slot reserved by an acquired filled permit.
    fn take(&self, channel: &Channel<T>) -> T {
        let message = lock(&channel.queue).ring.pop();
        channel.free.release();
        self.received.fetch_add(1, Ordering::Relaxed);
        match message {
            Some(message) => message,
            // A filled permit is only ever released after a successful push.
            None => unreachable!("filled permit without a queued message"),
        }
    }

    /// Refuse all further sends. Queued messages stay receivable.
    pub fn stop(&self) -> Result<(), MailboxError> {
        let channel = self.channel()?;
        lock(&channel.queue).stopped = true;
        channel.free.close();
        channel.filled.close();
        tracing::trace!("mailbox stopped");
        Ok(())
    }

    /// Receive everything still queued after a stop.
    pub fn drain(&self) -> Result<Vec<T>, MailboxError> {
        let mut drained = Vec::new();
        while let Some(message) = self.try_receive()? {
            drained.push(message);
        }
        Ok(drained)
    }

    /// Release the ring. Only valid after [`stop`](Self::stop) and a full drain.
    pub fn destroy(&self) -> Result<(), MailboxError> {
        let mut slot = lock(&self.channel);
        let channel = slot.as_ref().ok_or(MailboxError::NotInitialized)?;
        {
            let queue = lock(&channel.queue);
            if !queue.stopped {
                return Err(MailboxError::NotStopped);
            }
            if !queue.ring.is_empty() {
                return Err(MailboxError::NotDrained(queue.ring.len()));
            }
        }
        *slot = None;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.channel).is_some()
    }

    fn with_queue<R>(&self, f: impl FnOnce(&Queue<T>) -> R) -> Option<R> {
        let channel = self.channel().ok()?;
        let queue = lock(&channel.queue);
        Some(f(&queue))
    }

    pub fn is_stopped(&self) -> bool {
        self.with_queue(|queue| queue.stopped).unwrap_or(false)
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.with_queue(|queue| queue.ring.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.with_queue(|queue| queue.ring.capacity()).unwrap_or(0)
    }

    pub fn stats(&self) -> MailboxStats {
        MailboxStats {
            sent_ok: self.sent_ok.load(Ordering::Relaxed),
            sent_ng: self.sent_ng.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_vs_stopped() {
        let mailbox: Mailbox<u32> = Mailbox::new();
        assert_eq!(mailbox.send(1), Err(MailboxError::NotInitialized));
        assert_eq!(mailbox.try_receive(), Err(MailboxError::NotInitialized));

        mailbox.create(4).unwrap();
        mailbox.stop().unwrap();
        assert_eq!(mailbox.send(1), Err(MailboxError::Stopped));
        assert_eq!(mailbox.try_send(1), Err(MailboxError::Stopped));
    }

    #[test]
    fn test_create_twice_fails() {
        let mailbox: Mailbox<u32> = Mailbox::new();
        mailbox.create(2).unwrap();
        assert_eq!(mailbox.create(2), Err(MailboxError::AlreadyInitialized));
        assert_eq!(Mailbox::<u32>::with_capacity(0).err(), Some(MailboxError::ZeroCapacity));
    }

    #[test]
    fn test_try_send_full() {
        let mailbox = Mailbox::with_capacity(1).unwrap();
        mailbox.try_send('a').unwrap();
        assert_eq!(mailbox.try_send('b'), Err(MailboxError::Full));
        assert_eq!(mailbox.try_receive(), Ok(Some('a')));
        assert_eq!(mailbox.try_receive(), Ok(None));

        let stats = mailbox.stats();
        assert_eq!(stats.sent_ok, 1);
        assert_eq!(stats.sent_ng, 1);
        assert_eq!(stats.received, 1);
    }

    #[test]
    fn test_stop_then_drain_then_destroy() {
        let mailbox = Mailbox::with_capacity(4).unwrap();
        mailbox.send(String::from("one")).unwrap();
        mailbox.send(String::from("two")).unwrap();

        assert_eq!(mailbox.destroy(), Err(MailboxError::NotStopped));
        mailbox.stop().unwrap();
        assert_eq!(mailbox.destroy(), Err(MailboxError::NotDrained(2)));

        let drained = mailbox.drain().unwrap();
        assert_eq!(drained, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(mailbox.receive(), Err(MailboxError::Stopped));

        mailbox.destroy().unwrap();
        assert!(!mailbox.is_initialized());
        assert_eq!(mailbox.send("three".into()), Err(MailboxError::NotInitialized));
    }

    #[test]
    fn test_receive_timeout_empty() {
        let mailbox: Mailbox<u8> = Mailbox::with_capacity(2).unwrap();
        assert_eq!(mailbox.receive_timeout(Duration::from_millis(5)), Ok(None));
        mailbox.send(9).unwrap();
        assert_eq!(mailbox.receive_timeout(Duration::from_millis(5)), Ok(Some(9)));
    }
}

//! Cross-thread mailbox behaviour: blocking, ordering and shutdown.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pane_mailbox::{Mailbox, MailboxError};

#[test]
fn test_full_mailbox_blocks_sender_until_receive() {
    let mailbox = Arc::new(Mailbox::with_capacity(2).unwrap());
    mailbox.send('A').unwrap();
    mailbox.send('B').unwrap();

    let delivered = Arc::new(AtomicBool::new(false));
    let sender = {
        let mailbox = mailbox.clone();
        let delivered = delivered.clone();
        thread::spawn(move || {
            mailbox.send('C').unwrap();
            delivered.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!delivered.load(Ordering::SeqCst), "send into a full mailbox must block");
    assert_eq!(mailbox.len(), 2);

    assert_eq!(mailbox.receive().unwrap(), 'A');
    sender.join().unwrap();
    assert!(delivered.load(Ordering::SeqCst));

    assert_eq!(mailbox.receive().unwrap(), 'B');
    assert_eq!(mailbox.receive().unwrap(), 'C');
    assert_eq!(mailbox.try_receive().unwrap(), None);
}

#[test]
fn test_fifo_per_sender_across_threads() {
    const SENDERS: usize = 4;
    const PER_SENDER: usize = 500;

    let mailbox = Arc::new(Mailbox::with_capacity(8).unwrap());
    let handles: Vec<_> = (0..SENDERS)
        .map(|sender| {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
                for seq in 0..PER_SENDER {
                    mailbox.send((sender, seq)).unwrap();
                }
            })
        })
        .collect();

    let mut next = [0usize; SENDERS];
    for _ in 0..SENDERS * PER_SENDER {
        let (sender, seq) = mailbox.receive().unwrap();
        assert_eq!(seq, next[sender], "sender {} reordered", sender);
        next[sender] += 1;
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(next.iter().all(|&n| n == PER_SENDER));
}

#[test]
fn test_queue_never_exceeds_capacity() {
    const CAPACITY: usize = 3;

    let mailbox = Arc::new(Mailbox::with_capacity(CAPACITY).unwrap());
    let max_seen = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..3)
        .map(|_| {
            let mailbox = mailbox.clone();
            let max_seen = max_seen.clone();
            thread::spawn(move || {
                for i in 0..200u32 {
                    mailbox.send(i).unwrap();
                    max_seen.fetch_max(mailbox.len(), Ordering::SeqCst);
                }
            })
        })
        .collect();

    for _ in 0..600 {
        mailbox.receive().unwrap();
        max_seen.fetch_max(mailbox.len(), Ordering::SeqCst);
    }
    for producer in producers {
        producer.join().unwrap();
    }

    assert!(max_seen.load(Ordering::SeqCst) <= CAPACITY);
    assert_eq!(mailbox.stats().sent_ok, 600);
    assert_eq!(mailbox.stats().received, 600);
}

#[test]
fn test_stop_fails_blocked_sender() {
    let mailbox = Arc::new(Mailbox::with_capacity(1).unwrap());
    mailbox.send(1u32).unwrap();

    let sender = {
        let mailbox = mailbox.clone();
        thread::spawn(move || mailbox.send(2))
    };

    thread::sleep(Duration::from_millis(30));
    mailbox.stop().unwrap();
    assert_eq!(sender.join().unwrap(), Err(MailboxError::Stopped));

    // The message queued before the stop is still drained exactly once.
    assert_eq!(mailbox.drain().unwrap(), vec![1]);
    assert_eq!(mailbox.drain().unwrap(), Vec::<u32>::new());
    mailbox.destroy().unwrap();
}

#[test]
fn test_stop_wakes_blocked_receiver() {
    let mailbox: Arc<Mailbox<u32>> = Arc::new(Mailbox::with_capacity(4).unwrap());
    let receiver = {
        let mailbox = mailbox.clone();
        thread::spawn(move || mailbox.receive())
    };

    thread::sleep(Duration::from_millis(30));
    mailbox.stop().unwrap();
    assert_eq!(receiver.join().unwrap(), Err(MailboxError::Stopped));
}

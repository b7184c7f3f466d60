//! Fixed-capacity timer table.

use std::sync::Weak;
use std::time::{Duration, Instant};

use pane_api::{Event, InstanceId, Message};

use crate::{TimerError, TimerMailbox};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once, then goes inactive.
    OneShot,
    /// Fires every interval until stopped.
    Repeat,
}

/// Parameters for creating (or refreshing) a timer.
#[derive(Debug, Clone)]
pub struct TimerRequest {
    /// Team leader whose thread owns the timer. `(owner, id)` is the key.
    pub owner: InstanceId,
    /// Object the `TIMER` message is addressed to.
    pub target: InstanceId,
    /// Mailbox the fire is posted into.
    pub mailbox: Weak<TimerMailbox>,
    pub group: u32,
    pub id: u32,
    pub kind: TimerKind,
    pub interval: Duration,
}

#[derive(Debug)]
struct TimerEntry {
    owner: InstanceId,
    target: InstanceId,
    mailbox: Weak<TimerMailbox>,
    group: u32,
    id: u32,
    kind: TimerKind,
    interval: Duration,
    /// Absolute deadline; `Some` while active.
    deadline: Option<Instant>,
    /// Bumped on every stop or refresh.
    epoch: u64,
}

/// A fire collected by [`TimerTable::expire`], delivered outside the lock.
#[derive(Debug)]
pub(crate) struct Fire {
    pub owner: InstanceId,
    pub id: u32,
    pub epoch: u64,
    pub mailbox: Weak<TimerMailbox>,
    pub message: Message,
}

#[derive(Debug)]
pub(crate) struct TimerTable {
    slots: Box<[Option<TimerEntry>]>,
}

impl TimerTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    fn find(&self, owner: InstanceId, id: u32) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|entry| entry.owner == owner && entry.id == id)
        })
    }

    fn entry_mut(&mut self, owner: InstanceId, id: u32) -> Result<&mut TimerEntry, TimerError> {
        let idx = self.find(owner, id).ok_or(TimerError::NotFound { owner, id })?;
        self.slots[idx]
            .as_mut()
            .ok_or(TimerError::NotFound { owner, id })
    }

    /// Insert a stopped timer, or refresh and stop the existing one with the same key.
    pub fn create(&mut self, request: TimerRequest) -> Result<(), TimerError> {
        if request.interval.is_zero() {
            return Err(TimerError::ZeroInterval);
        }

        if let Ok(entry) = self.entry_mut(request.owner, request.id) {
            entry.target = request.target;
            entry.mailbox = request.mailbox;
            entry.group = request.group;
            entry.kind = request.kind;
            entry.interval = request.interval;
            entry.deadline = None;
            entry.epoch += 1;
            return Ok(());
        }

        let capacity = self.slots.len();
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(TimerError::TableFull(capacity))?;
        *slot = Some(TimerEntry {
            owner: request.owner,
            target: request.target,
            mailbox: request.mailbox,
            group: request.group,
            id: request.id,
            kind: request.kind,
            interval: request.interval,
            deadline: None,
            epoch: 0,
        });
        Ok(())
    }

    /// Arm the timer: deadline = now + interval.
    pub fn start(&mut self, owner: InstanceId, id: u32, now: Instant) -> Result<Instant, TimerError> {
        let entry = self.entry_mut(owner, id)?;
        let deadline = now + entry.interval;
        entry.deadline = Some(deadline);
        Ok(deadline)
    }

    /// Disarm the timer and return its new epoch. The slot stays reserved.
    pub fn stop(&mut self, owner: InstanceId, id: u32) -> Result<u64, TimerError> {
        let entry = self.entry_mut(owner, id)?;
        entry.deadline = None;
        entry.epoch += 1;
        Ok(entry.epoch)
    }

    /// Whether a fire stamped with `epoch` is still current.
    pub fn check(&self, owner: InstanceId, id: u32, epoch: u64) -> bool {
        self.find(owner, id)
            .and_then(|idx| self.slots[idx].as_ref())
            .is_some_and(|entry| entry.epoch == epoch)
    }

    pub fn epoch(&self, owner: InstanceId, id: u32) -> Option<u64> {
        self.find(owner, id)
            .and_then(|idx| self.slots[idx].as_ref())
            .map(|entry| entry.epoch)
    }

    /// Deactivate after a failed delivery, unless it was re-armed meanwhile.
    pub fn deactivate_if(&mut self, owner: InstanceId, id: u32, epoch: u64) {
        if let Ok(entry) = self.entry_mut(owner, id) {
            if entry.epoch == epoch {
                entry.deadline = None;
            }
        }
    }

    /// Re-arm an inactive timer one interval after `now`, unless it was
    /// stopped or refreshed meanwhile.
    pub fn rearm_if(&mut self, owner: InstanceId, id: u32, epoch: u64, now: Instant) {
        if let Ok(entry) = self.entry_mut(owner, id) {
            if entry.epoch == epoch && entry.deadline.is_none() {
                entry.deadline = Some(now + entry.interval);
            }
        }
    }

    /// Free every slot belonging to `owner`.
    pub fn remove_owner(&mut self, owner: InstanceId) -> usize {
        let mut removed = 0;
        for slot in self.slots.iter_mut() {
            if slot.as_ref().is_some_and(|entry| entry.owner == owner) {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .iter()
            .flatten()
            .filter_map(|entry| entry.deadline)
            .min()
    }

    /// Collect fires for every active entry whose deadline has passed.
    ///
    /// One-shot entries go inactive; repeating entries are re-armed one
    /// interval after their previous deadline, or one interval from now
    /// if the worker fell behind.
    pub fn expire(&mut self, now: Instant) -> Vec<Fire> {
        let mut fires = Vec::new();
        for entry in self.slots.iter_mut().flatten() {
            let Some(deadline) = entry.deadline else {
                continue;
            };
            if deadline > now {
                continue;
            }

            entry.deadline = match entry.kind {
                TimerKind::OneShot => None,
                TimerKind::Repeat => {
                    let next = deadline + entry.interval;
                    Some(if next <= now { now + entry.interval } else { next })
                }
            };

            fires.push(Fire {
                owner: entry.owner,
                id: entry.id,
                epoch: entry.epoch,
                mailbox: entry.mailbox.clone(),
                message: Message::new(
                    entry.target,
                    Event::Timer {
                        group: entry.group,
                        id: entry.id,
                        epoch: entry.epoch,
                    },
                ),
            });
        }
        fires
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|entry| entry.deadline.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(owner: u64, id: u32, kind: TimerKind, ms: u64) -> TimerRequest {
        TimerRequest {
            owner: InstanceId(owner),
            target: InstanceId(owner),
            mailbox: Weak::new(),
            group: 7,
            id,
            kind,
            interval: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_create_reuses_slot_for_same_key() {
        let mut table = TimerTable::new(4);
        table.create(request(1, 10, TimerKind::Repeat, 50)).unwrap();
        table.create(request(1, 10, TimerKind::OneShot, 20)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.epoch(InstanceId(1), 10), Some(1));

        table.create(request(2, 10, TimerKind::OneShot, 20)).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_table_full() {
        let mut table = TimerTable::new(2);
        table.create(request(1, 1, TimerKind::OneShot, 5)).unwrap();
        table.create(request(1, 2, TimerKind::OneShot, 5)).unwrap();
        let err = table.create(request(1, 3, TimerKind::OneShot, 5)).unwrap_err();
        assert!(matches!(err, TimerError::TableFull(2)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut table = TimerTable::new(2);
        let err = table.create(request(1, 1, TimerKind::Repeat, 0)).unwrap_err();
        assert!(matches!(err, TimerError::ZeroInterval));
    }

    #[test]
    fn test_unknown_timer() {
        let mut table = TimerTable::new(2);
        let err = table.start(InstanceId(9), 1, Instant::now()).unwrap_err();
        assert!(matches!(err, TimerError::NotFound { id: 1, .. }));
        assert!(!table.check(InstanceId(9), 1, 0));
    }

    #[test]
    fn test_one_shot_expires_once() {
        let mut table = TimerTable::new(2);
        table.create(request(1, 1, TimerKind::OneShot, 10)).unwrap();
        let now = Instant::now();
        table.start(InstanceId(1), 1, now).unwrap();

        assert!(table.expire(now).is_empty());
        let fires = table.expire(now + Duration::from_millis(10));
        assert_eq!(fires.len(), 1);
        assert_eq!(
            fires[0].message.event,
            Event::Timer {
                group: 7,
                id: 1,
                epoch: 0
            }
        );
        assert_eq!(table.active_count(), 0);
        assert!(table.expire(now + Duration::from_secs(1)).is_empty());
        // A one-shot fire that completed normally is still current.
        assert!(table.check(InstanceId(1), 1, 0));
    }

    #[test]
    fn test_repeat_rearms_and_skips_missed_periods() {
        let mut table = TimerTable::new(2);
        table.create(request(1, 1, TimerKind::Repeat, 10)).unwrap();
        let now = Instant::now();
        let first = table.start(InstanceId(1), 1, now).unwrap();

        assert_eq!(table.expire(first).len(), 1);
        assert_eq!(table.next_deadline(), Some(first + Duration::from_millis(10)));

        // Worker woke very late: one fire, re-armed relative to now.
        let late = first + Duration::from_millis(100);
        assert_eq!(table.expire(late).len(), 1);
        assert_eq!(table.next_deadline(), Some(late + Duration::from_millis(10)));
    }

    #[test]
    fn test_stop_bumps_epoch_and_invalidates_fire() {
        let mut table = TimerTable::new(2);
        table.create(request(1, 1, TimerKind::Repeat, 10)).unwrap();
        let now = Instant::now();
        table.start(InstanceId(1), 1, now).unwrap();
        let fires = table.expire(now + Duration::from_millis(10));
        let fired_epoch = fires[0].epoch;

        let epoch = table.stop(InstanceId(1), 1).unwrap();
        assert_eq!(epoch, fired_epoch + 1);
        assert!(!table.check(InstanceId(1), 1, fired_epoch));
        assert!(table.check(InstanceId(1), 1, epoch));
        assert_eq!(table.next_deadline(), None);
    }

    #[test]
    fn test_remove_owner() {
        let mut table = TimerTable::new(4);
        table.create(request(1, 1, TimerKind::Repeat, 10)).unwrap();
        table.create(request(1, 2, TimerKind::Repeat, 10)).unwrap();
        table.create(request(2, 1, TimerKind::Repeat, 10)).unwrap();

        assert_eq!(table.remove_owner(InstanceId(1)), 2);
        assert_eq!(table.len(), 1);
        assert!(table.epoch(InstanceId(2), 1).is_some());
    }

    #[test]
    fn test_rearm_if_only_restarts_current_inactive_entry() {
        let mut table = TimerTable::new(2);
        table.create(request(1, 1, TimerKind::OneShot, 10)).unwrap();
        let now = Instant::now();
        table.start(InstanceId(1), 1, now).unwrap();
        let fires = table.expire(now + Duration::from_millis(10));
        assert_eq!(table.active_count(), 0);

        let later = now + Duration::from_millis(30);
        table.rearm_if(InstanceId(1), 1, fires[0].epoch, later);
        assert_eq!(table.next_deadline(), Some(later + Duration::from_millis(10)));

        // A stop in between wins over the retry.
        let epoch = table.stop(InstanceId(1), 1).unwrap();
        table.rearm_if(InstanceId(1), 1, epoch - 1, later);
        assert_eq!(table.active_count(), 0);
    }

    #[test]
    fn test_deactivate_if_respects_epoch() {
        let mut table = TimerTable::new(2);
        table.create(request(1, 1, TimerKind::Repeat, 10)).unwrap();
        table.start(InstanceId(1), 1, Instant::now()).unwrap();

        table.deactivate_if(InstanceId(1), 1, 5);
        assert_eq!(table.active_count(), 1);
        table.deactivate_if(InstanceId(1), 1, 0);
        assert_eq!(table.active_count(), 0);
    }
}

//! Named one-shot and repeating timers.
//!
//! Two queues exist per manager, one against the simulation clock and one
//! against the real clock. Deadlines are microseconds; repeating timers
//! re-arm from the previous deadline, not the firing time, so they do not
//! drift.

use std::collections::BTreeMap;

use stagehand_core::ids::ActorId;

#[derive(Debug, Clone)]
struct TimerRecord {
    name: String,
    about_actor: Option<ActorId>,
    interval_us: u64,
    repeat: bool,
}

/// A timer that has reached its deadline.
#[derive(Debug, Clone)]
pub(crate) struct ElapsedTimer {
    pub name: String,
    pub about_actor: Option<ActorId>,
    /// Seconds past the deadline at firing time.
    pub late_secs: f64,
}

/// Deadline-ordered timer queue. Identical deadlines fire in insertion
/// order, tie-broken by a sequence counter.
#[derive(Default)]
pub(crate) struct TimerQueue {
    entries: BTreeMap<(u64, u64), TimerRecord>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn set(
        &mut self,
        name: String,
        about_actor: Option<ActorId>,
        interval_secs: f64,
        repeat: bool,
        now_us: u64,
    ) {
        let interval_us = (interval_secs.max(0.0) * 1e6) as u64;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            (now_us + interval_us, seq),
            TimerRecord {
                name,
                about_actor,
                interval_us,
                repeat,
            },
        );
    }

    pub fn clear(&mut self, name: &str, about_actor: Option<ActorId>) {
        self.entries
            .retain(|_, record| !(record.name == name && record.about_actor == about_actor));
    }

    pub fn clear_for_actor(&mut self, id: ActorId) {
        self.entries
            .retain(|_, record| record.about_actor != Some(id));
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Pop everything due at `now_us`, re-arming repeating timers.
    pub fn advance(&mut self, now_us: u64) -> Vec<ElapsedTimer> {
        let mut fired = Vec::new();
        while let Some((&(deadline, seq), _)) = self.entries.first_key_value() {
            if deadline > now_us {
                break;
            }
            let record = match self.entries.remove(&(deadline, seq)) {
                Some(record) => record,
                None => break,
            };
            fired.push(ElapsedTimer {
                name: record.name.clone(),
                about_actor: record.about_actor,
                late_secs: (now_us - deadline) as f64 / 1e6,
            });
            if record.repeat {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert((deadline + record.interval_us, seq), record);
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut queue = TimerQueue::default();
        queue.set("once".into(), None, 1.0, false, 0);

        assert!(queue.advance(999_999).is_empty());
        let fired = queue.advance(1_100_000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].name, "once");
        assert!((fired[0].late_secs - 0.1).abs() < 1e-9);
        assert!(queue.advance(10_000_000).is_empty());
    }

    #[test]
    fn test_repeat_rearms_without_drift() {
        let mut queue = TimerQueue::default();
        queue.set("beat".into(), None, 1.0, true, 0);

        // Advance in late, uneven steps; deadlines stay on whole seconds.
        assert_eq!(queue.advance(1_300_000).len(), 1);
        assert_eq!(queue.advance(2_050_000).len(), 1);
        let fired = queue.advance(3_000_000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].late_secs, 0.0);
    }

    #[test]
    fn test_same_deadline_fires_in_insertion_order() {
        let mut queue = TimerQueue::default();
        queue.set("first".into(), None, 1.0, false, 0);
        queue.set("second".into(), None, 1.0, false, 0);

        let fired = queue.advance(1_000_000);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].name, "first");
        assert_eq!(fired[1].name, "second");
    }

    #[test]
    fn test_clear_for_actor() {
        let mut queue = TimerQueue::default();
        let actor = ActorId::generate();
        queue.set("mine".into(), Some(actor), 1.0, true, 0);
        queue.set("global".into(), None, 1.0, true, 0);

        queue.clear_for_actor(actor);
        let fired = queue.advance(1_000_000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].name, "global");
    }

    #[test]
    fn test_clear_matches_name_and_actor() {
        let mut queue = TimerQueue::default();
        let actor = ActorId::generate();
        queue.set("tick".into(), Some(actor), 1.0, false, 0);
        queue.set("tick".into(), None, 1.0, false, 0);

        queue.clear("tick", None);
        assert_eq!(queue.len(), 1);
        let fired = queue.advance(1_000_000);
        assert_eq!(fired[0].about_actor, Some(actor));
    }
}

//! Cancelable one-shot timers on a virtual millisecond clock
//!
//! Each [`TimerSlot`] holds at most one pending timer: arming a slot replaces
//! whatever was there, so a stale spawn or miss timeout can never fire twice.
//! Timers that belong to an encounter carry its id and are re-checked against
//! the live encounter when they fire.

use serde::{Deserialize, Serialize};

/// Opaque handle returned when a timer is armed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerSlot {
    /// Splash screen gives way to the menu
    Splash,
    /// One second of session countdown
    Countdown,
    /// Next alien appears
    Spawn,
    /// Delayed "spawn" ping after the portal cue
    SpawnCue,
    /// Idle alien gives up waiting
    MissTimeout,
    /// Missed alien vanishes
    MissGrace,
    /// Hit alien starts listening (or leaves)
    HitFollowUp,
    /// Listening alien gives up on a question
    Patience,
    /// Thinking alien gives up on the chat backend
    ChatDeadline,
    /// Talking alien finishes its line
    Departure,
    /// Goodbye pose ends, alien vanishes
    Goodbye,
    /// Transient feedback text expires
    Feedback,
}

impl TimerSlot {
    /// Timers that may only be pending while a session is playing
    pub fn is_gameplay(&self) -> bool {
        !matches!(self, TimerSlot::Splash)
    }
}

/// A pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    pub slot: TimerSlot,
    pub due_ms: u64,
    /// Encounter this timer belongs to, if any
    pub encounter: Option<u32>,
}

/// Pending timers, fired in `(due, arm order)` order
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `slot` to fire `delay_ms` after `now_ms`, replacing any pending timer in that slot
    pub fn arm(
        &mut self,
        slot: TimerSlot,
        now_ms: u64,
        delay_ms: u64,
        encounter: Option<u32>,
    ) -> TimerId {
        self.cancel(slot);
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            slot,
            due_ms: now_ms.saturating_add(delay_ms),
            encounter,
        });
        id
    }

    /// Cancel the timer in `slot`. Returns false if nothing was pending.
    pub fn cancel(&mut self, slot: TimerSlot) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.slot != slot);
        self.timers.len() != before
    }

    /// Cancel a specific timer by handle. Stale handles are ignored.
    pub fn cancel_id(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Cancel every timer tied to an encounter
    pub fn cancel_encounter(&mut self, encounter: u32) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| t.encounter != Some(encounter));
        before - self.timers.len()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn is_armed(&self, slot: TimerSlot) -> bool {
        self.timers.iter().any(|t| t.slot == slot)
    }

    pub fn get(&self, slot: TimerSlot) -> Option<&Timer> {
        self.timers.iter().find(|t| t.slot == slot)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timer> {
        self.timers.iter()
    }

    /// Earliest deadline, if anything is pending
    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Remove and return the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Timer> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.id))
            .map(|(i, _)| i)?;
        Some(self.timers.swap_remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_replaces_same_slot() {
        let mut q = TimerQueue::new();
        let first = q.arm(TimerSlot::Spawn, 0, 2000, None);
        let second = q.arm(TimerSlot::Spawn, 100, 3000, None);
        assert_ne!(first, second);
        assert_eq!(q.len(), 1);
        assert_eq!(q.get(TimerSlot::Spawn).unwrap().due_ms, 3100);
        assert!(!q.cancel_id(first));
    }

    #[test]
    fn test_pop_due_orders_by_deadline_then_arm_order() {
        let mut q = TimerQueue::new();
        q.arm(TimerSlot::Countdown, 0, 1000, None);
        q.arm(TimerSlot::MissTimeout, 0, 500, Some(1));
        q.arm(TimerSlot::SpawnCue, 0, 1000, Some(1));

        assert_eq!(q.pop_due(400), None);
        assert_eq!(q.pop_due(2000).unwrap().slot, TimerSlot::MissTimeout);
        assert_eq!(q.pop_due(2000).unwrap().slot, TimerSlot::Countdown);
        assert_eq!(q.pop_due(2000).unwrap().slot, TimerSlot::SpawnCue);
        assert!(q.is_empty());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut q = TimerQueue::new();
        q.arm(TimerSlot::Patience, 0, 8000, Some(3));
        assert!(q.cancel(TimerSlot::Patience));
        assert!(!q.cancel(TimerSlot::Patience));
        assert_eq!(q.next_due(), None);
    }

    #[test]
    fn test_cancel_encounter_leaves_session_timers() {
        let mut q = TimerQueue::new();
        q.arm(TimerSlot::Countdown, 0, 1000, None);
        q.arm(TimerSlot::MissTimeout, 0, 4000, Some(2));
        q.arm(TimerSlot::SpawnCue, 0, 300, Some(2));
        assert_eq!(q.cancel_encounter(2), 2);
        assert!(q.is_armed(TimerSlot::Countdown));
        assert_eq!(q.next_due(), Some(1000));
    }
}

//! Virtual-clock scheduler with scope-based cancellation.
//!
//! Every scene controller gets its own [`ScopeToken`]. Closing a scope drops
//! all of its pending timers at once, so a timer can never fire into a scene
//! that has already been left.
use std::collections::{BTreeMap, BTreeSet};

/// Identifies the owner of a group of timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeToken(u64);

impl ScopeToken {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Identifies a single scheduled timer for targeted cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub scope: ScopeToken,
    pub timer: TimerId,
    pub at_ms: u64,
    pub event: E,
}

#[derive(Debug, Clone)]
struct Entry<E> {
    scope: ScopeToken,
    id: TimerId,
    event: E,
    interval_ms: u64,
    remaining: u32,
}

#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now_ms: u64,
    next_scope: u64,
    next_seq: u64,
    open: BTreeSet<ScopeToken>,
    queue: BTreeMap<(u64, u64), Entry<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_scope: 0,
            next_seq: 0,
            open: BTreeSet::new(),
            queue: BTreeMap::new(),
        }
    }
}

impl<E: Clone> Scheduler<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn open_scope(&mut self) -> ScopeToken {
        let token = ScopeToken(self.next_scope);
        self.next_scope += 1;
        self.open.insert(token);
        token
    }

    /// Close a scope and discard its pending timers. Closing twice is a no-op.
    pub fn close_scope(&mut self, token: ScopeToken) {
        if self.open.remove(&token) {
            self.queue.retain(|_, entry| entry.scope != token);
        }
    }

    #[must_use]
    pub fn is_open(&self, token: ScopeToken) -> bool {
        self.open.contains(&token)
    }

    /// Schedule a one-shot timer `delay_ms` from now.
    ///
    /// Returns `None` when the scope is already closed.
    pub fn schedule(&mut self, token: ScopeToken, delay_ms: u32, event: E) -> Option<TimerId> {
        self.schedule_repeating(token, delay_ms, 1, event)
    }

    /// Schedule a timer that fires `repeats` times, every `interval_ms`.
    ///
    /// Returns `None` when the scope is closed or `repeats` is zero.
    pub fn schedule_repeating(
        &mut self,
        token: ScopeToken,
        interval_ms: u32,
        repeats: u32,
        event: E,
    ) -> Option<TimerId> {
        if repeats == 0 || !self.is_open(token) {
            return None;
        }
        let id = TimerId(self.next_seq);
        let interval_ms = u64::from(interval_ms);
        self.enqueue(
            self.now_ms + interval_ms,
            Entry {
                scope: token,
                id,
                event,
                interval_ms,
                remaining: repeats,
            },
        );
        Some(id)
    }

    /// Cancel one timer, including any repeats it still had.
    pub fn cancel(&mut self, timer: TimerId) {
        self.queue.retain(|_, entry| entry.id != timer);
    }

    /// Number of timers still queued for a scope.
    #[must_use]
    pub fn pending(&self, token: ScopeToken) -> usize {
        self.queue
            .values()
            .filter(|entry| entry.scope == token)
            .count()
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock to
    /// its due time. Ties resolve in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired<E>> {
        let (&(due, _), _) = self.queue.first_key_value()?;
        if due > until_ms {
            return None;
        }
        let (_, mut entry) = self.queue.pop_first()?;
        self.now_ms = self.now_ms.max(due);
        let fired = Fired {
            scope: entry.scope,
            timer: entry.id,
            at_ms: due,
            event: entry.event.clone(),
        };
        entry.remaining -= 1;
        if entry.remaining > 0 {
            self.requeue(due + entry.interval_ms, entry);
        }
        Some(fired)
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    fn enqueue(&mut self, due: u64, entry: Entry<E>) {
        self.next_seq += 1;
        self.queue.insert((due, entry.id.0), entry);
    }

    fn requeue(&mut self, due: u64, entry: Entry<E>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((due, seq), entry);
    }
}

/// Scheduling handle bound to one scope, lent to a scene controller.
#[derive(Debug)]
pub struct TimerHandle<'a, E> {
    scheduler: &'a mut Scheduler<E>,
    scope: ScopeToken,
}

impl<'a, E: Clone> TimerHandle<'a, E> {
    pub fn new(scheduler: &'a mut Scheduler<E>, scope: ScopeToken) -> Self {
        Self { scheduler, scope }
    }

    #[must_use]
    pub const fn scope(&self) -> ScopeToken {
        self.scope
    }

    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn after(&mut self, delay_ms: u32, event: E) -> Option<TimerId> {
        self.scheduler.schedule(self.scope, delay_ms, event)
    }

    pub fn every(&mut self, interval_ms: u32, repeats: u32, event: E) -> Option<TimerId> {
        self.scheduler
            .schedule_repeating(self.scope, interval_ms, repeats, event)
    }

    pub fn cancel(&mut self, timer: TimerId) {
        self.scheduler.cancel(timer);
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.scheduler.pending(self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<&'static str>, until: u64) -> Vec<(u64, &'static str)> {
        let mut fired = Vec::new();
        while let Some(timer) = scheduler.pop_due(until) {
            fired.push((timer.at_ms, timer.event));
        }
        scheduler.advance_to(until);
        fired
    }

    #[test]
    fn fires_in_due_then_scheduling_order() {
        let mut scheduler = Scheduler::new();
        let scope = scheduler.open_scope();
        scheduler.schedule(scope, 300, "late");
        scheduler.schedule(scope, 100, "first");
        scheduler.schedule(scope, 100, "second");
        assert_eq!(
            drain(&mut scheduler, 1_000),
            vec![(100, "first"), (100, "second"), (300, "late")]
        );
        assert_eq!(scheduler.now_ms(), 1_000);
    }

    #[test]
    fn respects_the_until_bound() {
        let mut scheduler = Scheduler::new();
        let scope = scheduler.open_scope();
        scheduler.schedule(scope, 500, "tick");
        assert!(drain(&mut scheduler, 499).is_empty());
        assert_eq!(drain(&mut scheduler, 500), vec![(500, "tick")]);
    }

    #[test]
    fn repeating_timers_fire_the_requested_count() {
        let mut scheduler = Scheduler::new();
        let scope = scheduler.open_scope();
        scheduler.schedule_repeating(scope, 1_000, 3, "tick");
        let fired = drain(&mut scheduler, 10_000);
        assert_eq!(fired, vec![(1_000, "tick"), (2_000, "tick"), (3_000, "tick")]);
        assert_eq!(scheduler.pending(scope), 0);
        assert!(scheduler.schedule_repeating(scope, 10, 0, "never").is_none());
    }

    #[test]
    fn closed_scopes_never_fire() {
        let mut scheduler = Scheduler::new();
        let stale = scheduler.open_scope();
        scheduler.schedule(stale, 100, "stale");
        scheduler.schedule_repeating(stale, 50, 10, "stale-tick");
        assert_eq!(scheduler.pending(stale), 2);
        scheduler.close_scope(stale);
        assert_eq!(scheduler.pending(stale), 0);
        assert!(scheduler.schedule(stale, 10, "late").is_none());

        let fresh = scheduler.open_scope();
        scheduler.schedule(fresh, 200, "fresh");
        assert_eq!(drain(&mut scheduler, 1_000), vec![(200, "fresh")]);
    }

    #[test]
    fn cancel_removes_a_single_timer() {
        let mut scheduler = Scheduler::new();
        let scope = scheduler.open_scope();
        let keep = scheduler.schedule(scope, 100, "keep");
        let dropped = scheduler.schedule_repeating(scope, 100, 5, "drop").unwrap();
        scheduler.cancel(dropped);
        assert!(keep.is_some());
        assert_eq!(drain(&mut scheduler, 1_000), vec![(100, "keep")]);
    }

    #[test]
    fn handle_schedules_relative_to_current_clock() {
        let mut scheduler = Scheduler::new();
        let scope = scheduler.open_scope();
        scheduler.advance_to(5_000);
        {
            let mut handle = TimerHandle::new(&mut scheduler, scope);
            assert_eq!(handle.now_ms(), 5_000);
            handle.after(250, "soon");
            assert_eq!(handle.pending(), 1);
            assert_eq!(handle.scope(), scope);
        }
        assert_eq!(drain(&mut scheduler, 6_000), vec![(5_250, "soon")]);
    }
}

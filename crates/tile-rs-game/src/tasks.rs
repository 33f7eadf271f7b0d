//! Periodic tick sections.
//!
//! A tick section is a named callback run every `rate`. Sections are kept in
//! a priority queue keyed on the tick they next fire at.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::clock::{Clock, Rate};

/// A callback run periodically against a context `C`.
pub struct TickSection<C> {
    pub description: String,
    pub rate: Rate,
    run: Box<dyn FnMut(&mut C) + Send>,
}

impl<C> TickSection<C> {
    pub fn new(
        description: impl Into<String>,
        rate: Rate,
        run: impl FnMut(&mut C) + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            rate,
            run: Box::new(run),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledSection {
    target_tick: u64,
    /// Registration order, breaks ties between sections due on the same tick.
    seq: u64,
    index: usize,
}

struct Slot<C> {
    section: TickSection<C>,
    interval: u64,
}

/// Runs tick sections when they come due.
pub struct TaskRunner<C> {
    slots: Vec<Slot<C>>,
    queue: BinaryHeap<Reverse<ScheduledSection>>,
    next_seq: u64,
}

impl<C> Default for TaskRunner<C> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<C> TaskRunner<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section. It first fires one interval after `clock`'s
    /// current tick.
    pub fn register_tick_section(&mut self, clock: &Clock, section: TickSection<C>) {
        let interval = clock.rate_to_ticks(section.rate).max(1);
        let index = self.slots.len();
        self.slots.push(Slot { section, interval });
        self.schedule(index, clock.current_tick() + interval);
    }

    fn schedule(&mut self, index: usize, target_tick: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(ScheduledSection {
            target_tick,
            seq,
            index,
        }));
    }

    /// Run every section due at or before `current_tick`, then reschedule it.
    pub fn run_due(&mut self, current_tick: u64, ctx: &mut C) -> usize {
        let mut ran = 0;
        while let Some(Reverse(next)) = self.queue.peek().copied() {
            if next.target_tick > current_tick {
                break;
            }
            self.queue.pop();
            let slot = &mut self.slots[next.index];
            trace!("Running tick section '{}'", slot.section.description);
            (slot.section.run)(ctx);
            let interval = slot.interval;
            self.schedule(next.index, current_tick + interval);
            ran += 1;
        }
        ran
    }

    /// Move every section of `other` into this runner, keeping their
    /// schedules.
    pub fn absorb(&mut self, other: TaskRunner<C>) {
        let offset = self.slots.len();
        self.slots.extend(other.slots);
        for Reverse(scheduled) in other.queue.into_sorted_vec().into_iter().rev() {
            self.schedule(scheduled.index + offset, scheduled.target_tick);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.section.description.as_str())
    }
}

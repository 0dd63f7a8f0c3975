// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending state transitions.
//!
//! Every stateful unit (the root's top-level description, each state cell)
//! owns an [`UpdateQueue`]: an ordered FIFO of [`Update`]s tagged with the
//! lane that requested them. Draining folds the matching-lane updates over a
//! base state in strict enqueue order; mismatched-lane updates are preserved
//! for a future flush and reported to the caller.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use core::fmt;

use crate::lane::Lanes;

/// A single state transition.
pub(crate) enum Action<S> {
    /// Replace the state with this value.
    Replace(S),
    /// Derive the next state from the previous one.
    Transform(Box<dyn FnOnce(&S) -> S>),
}

impl<S> Action<S> {
    fn apply(self, prev: &S) -> S
    where
        S: Clone,
    {
        match self {
            Self::Replace(next) => next,
            Self::Transform(f) => f(prev),
        }
    }
}

impl<S> fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(_) => f.write_str("Replace"),
            Self::Transform(_) => f.write_str("Transform"),
        }
    }
}

/// A pending transition and the lane that requested it.
#[derive(Debug)]
pub(crate) struct Update<S> {
    /// The transition to apply.
    pub(crate) action: Action<S>,
    /// Priority lane of the request.
    pub(crate) lane: Lanes,
}

/// Result of draining a queue against a set of render lanes.
#[derive(Debug)]
pub(crate) struct Drained<S> {
    /// The folded state.
    pub(crate) state: S,
    /// Lanes of updates that did not match and remain queued.
    pub(crate) deferred: Lanes,
}

/// An ordered queue of pending updates.
///
/// Append is O(1) and replay order is strict FIFO regardless of how many
/// flushes were attempted in between.
pub(crate) struct UpdateQueue<S> {
    pending: VecDeque<Update<S>>,
}

impl<S> Default for UpdateQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> UpdateQueue<S> {
    /// Creates an empty queue.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Returns `true` if no updates are pending.
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending updates.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Appends an update.
    pub(crate) fn enqueue(&mut self, update: Update<S>) {
        self.pending.push_back(update);
    }

    /// Folds all pending updates whose lane is contained in `render_lanes`
    /// over `base`, in enqueue order.
    ///
    /// Updates on other lanes stay queued; their lanes are surfaced in
    /// [`Drained::deferred`] so the scheduler can keep the root marked
    /// pending.
    pub(crate) fn drain(&mut self, base: S, render_lanes: Lanes) -> Drained<S>
    where
        S: Clone,
    {
        let mut state = base;
        let mut deferred = Lanes::NONE;
        let mut retained = VecDeque::new();
        for update in self.pending.drain(..) {
            if render_lanes.contains(update.lane) {
                state = update.action.apply(&state);
            } else {
                deferred |= update.lane;
                retained.push_back(update);
            }
        }
        self.pending = retained;
        Drained { state, deferred }
    }
}

impl<S> fmt::Debug for UpdateQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace(value: i32) -> Update<i32> {
        Update {
            action: Action::Replace(value),
            lane: Lanes::SYNC,
        }
    }

    fn transform(f: impl FnOnce(&i32) -> i32 + 'static) -> Update<i32> {
        Update {
            action: Action::Transform(Box::new(f)),
            lane: Lanes::SYNC,
        }
    }

    #[test]
    fn drains_in_enqueue_order() {
        let mut queue = UpdateQueue::new();
        queue.enqueue(replace(1));
        queue.enqueue(transform(|x| x * 4));
        queue.enqueue(transform(|x| x + 1));

        let drained = queue.drain(0, Lanes::SYNC);
        assert_eq!(drained.state, 5);
        assert_eq!(drained.deferred, Lanes::NONE);
        assert!(queue.is_empty());
    }

    #[test]
    fn replacement_discards_earlier_folds() {
        let mut queue = UpdateQueue::new();
        queue.enqueue(transform(|x| x + 10));
        queue.enqueue(replace(2));
        queue.enqueue(transform(|x| x * 3));

        let drained = queue.drain(100, Lanes::SYNC);
        assert_eq!(drained.state, 6);
    }

    #[test]
    fn mismatched_lane_is_preserved() {
        let other = Lanes::from_bits(0b10);
        let mut queue = UpdateQueue::new();
        queue.enqueue(replace(1));
        queue.enqueue(Update {
            action: Action::Replace(9),
            lane: other,
        });

        let drained = queue.drain(0, Lanes::SYNC);
        assert_eq!(drained.state, 1);
        assert_eq!(drained.deferred, other);
        assert_eq!(queue.len(), 1);

        // A later flush on the other lane picks the update up, after the
        // state produced by the first flush.
        let drained = queue.drain(drained.state, other);
        assert_eq!(drained.state, 9);
        assert!(queue.is_empty());
    }
}

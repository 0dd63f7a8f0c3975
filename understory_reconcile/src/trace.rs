// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explainability hooks for the render and commit phases.
//!
//! The core loop intentionally stores no history of what it did. For many
//! embedders it is useful to answer questions like "how many render passes
//! did that flush take?" or "which host mutations did this update commit?".
//!
//! This module provides a minimal, additive callback sink,
//! [`ReconcileTrace`], accepted by
//! [`Root::flush_with_trace`](crate::Root::flush_with_trace), plus a small
//! [`EventRecorder`] that stores the observed events in order. Every trait
//! method has an empty default body, so a sink implements only what it
//! cares about.

use alloc::vec::Vec;

use crate::lane::Lanes;

/// One observed step of a flush, in occurrence order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TraceEvent {
    /// A render pass started for the given lanes.
    RenderStart(Lanes),
    /// A work unit entered the begin phase.
    Begin {
        /// Short name of the fiber variant ("root", "host", ...).
        kind: &'static str,
    },
    /// The commit phase started.
    CommitStart,
    /// A subtree was attached or moved in the host tree.
    Placement {
        /// Short name of the placed fiber variant.
        kind: &'static str,
    },
    /// A host node's content or attributes were rewritten in place.
    ContentUpdate,
    /// A subtree was detached from the host tree.
    Deletion {
        /// Short name of the deleted fiber variant.
        kind: &'static str,
    },
    /// The commit phase finished.
    CommitEnd,
    /// Deferred effects were flushed.
    PassiveFlush {
        /// Number of cleanup callbacks run.
        destroyed: usize,
        /// Number of create callbacks run.
        created: usize,
    },
}

/// A callback sink for flush tracing.
pub trait ReconcileTrace {
    /// Called when a render pass starts.
    fn render_start(&mut self, lanes: Lanes) {
        let _ = lanes;
    }

    /// Called when a work unit enters the begin phase.
    fn begin_unit(&mut self, kind: &'static str) {
        let _ = kind;
    }

    /// Called when the commit phase starts.
    fn commit_start(&mut self) {}

    /// Called when a subtree is attached or moved in the host tree.
    fn placement(&mut self, kind: &'static str) {
        let _ = kind;
    }

    /// Called when a host node is rewritten in place.
    fn content_update(&mut self) {}

    /// Called when a subtree is detached from the host tree.
    fn deletion(&mut self, kind: &'static str) {
        let _ = kind;
    }

    /// Called when the commit phase finishes.
    fn commit_end(&mut self) {}

    /// Called after deferred effects have been flushed.
    fn passive_flush(&mut self, destroyed: usize, created: usize) {
        let _ = (destroyed, created);
    }
}

/// The do-nothing sink used by [`Root::flush`](crate::Root::flush).
#[derive(Copy, Clone, Debug, Default)]
pub struct NoTrace;

impl ReconcileTrace for NoTrace {}

/// Records every observed event in order.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Vec<TraceEvent>,
}

impl EventRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Clears all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// The recorded events, in occurrence order.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&TraceEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }

    /// Number of render passes observed.
    #[must_use]
    pub fn render_passes(&self) -> usize {
        self.count(|event| matches!(event, TraceEvent::RenderStart(_)))
    }

    /// Number of commits observed.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.count(|event| matches!(event, TraceEvent::CommitStart))
    }
}

impl ReconcileTrace for EventRecorder {
    fn render_start(&mut self, lanes: Lanes) {
        self.events.push(TraceEvent::RenderStart(lanes));
    }

    fn begin_unit(&mut self, kind: &'static str) {
        self.events.push(TraceEvent::Begin { kind });
    }

    fn commit_start(&mut self) {
        self.events.push(TraceEvent::CommitStart);
    }

    fn placement(&mut self, kind: &'static str) {
        self.events.push(TraceEvent::Placement { kind });
    }

    fn content_update(&mut self) {
        self.events.push(TraceEvent::ContentUpdate);
    }

    fn deletion(&mut self, kind: &'static str) {
        self.events.push(TraceEvent::Deletion { kind });
    }

    fn commit_end(&mut self) {
        self.events.push(TraceEvent::CommitEnd);
    }

    fn passive_flush(&mut self, destroyed: usize, created: usize) {
        self.events.push(TraceEvent::PassiveFlush { destroyed, created });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_passes() {
        let mut rec = EventRecorder::new();
        rec.render_start(Lanes::SYNC);
        rec.commit_start();
        rec.commit_end();
        rec.render_start(Lanes::SYNC);
        rec.commit_start();
        rec.commit_end();
        assert_eq!(rec.render_passes(), 2);
        assert_eq!(rec.commits(), 2);
        rec.clear();
        assert!(rec.events().is_empty());
    }
}

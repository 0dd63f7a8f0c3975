// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mounted container and its flush loop.
//!
//! A [`Root`] owns the fiber arena, the host adapter, and the committed
//! tree. Work arrives through [`Root::render`], [`Root::unmount`], or a
//! [`StateHandle`](crate::StateHandle) dispatch; all three only record
//! pending lanes on the shared [`SchedulerHandle`]. Nothing renders until
//! [`Root::flush`], which is what makes dispatches between flushes batch
//! into a single render pass.
//!
//! One flush iteration renders the highest-priority pending lane into a
//! fresh work-in-progress generation, commits its mutations, swaps the
//! committed pointer, and flushes deferred effects. Effects may dispatch
//! further updates; the flush loop keeps iterating until no lanes remain
//! pending, so control returns to the embedder with the tree quiescent.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::begin::begin_work;
use crate::complete::complete_work;
use crate::element::Element;
use crate::fiber::{Fiber, FiberArena, FiberId, FiberKind, FiberProps, create_work_in_progress};
use crate::hooks::EffectCell;
use crate::host::HostAdapter;
use crate::lane::Lanes;
use crate::trace::{NoTrace, ReconcileTrace};
use crate::update::{Action, Update, UpdateQueue};

/// Shared handle for requesting lanes and marking the root pending.
///
/// Cheap to clone; every [`StateHandle`](crate::StateHandle) carries one.
/// Single-threaded by construction, like the rest of the reconciler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    pending: Rc<Cell<Lanes>>,
}

impl Default for SchedulerHandle {
    fn default() -> Self {
        Self {
            pending: Rc::new(Cell::new(Lanes::NONE)),
        }
    }
}

impl SchedulerHandle {
    /// Creates a handle with no pending work.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The lane assigned to an update dispatched right now.
    ///
    /// Everything is synchronous today; the lane plumbing exists so that
    /// queued updates can be filtered and deferred by priority.
    #[must_use]
    pub fn request_update_lane(&self) -> Lanes {
        Lanes::SYNC
    }

    /// Records that the root has work pending in `lanes`.
    pub fn mark_root_updated(&self, lanes: Lanes) {
        self.pending.set(self.pending.get().merge(lanes));
    }

    /// Lanes with work pending.
    #[must_use]
    pub fn pending_lanes(&self) -> Lanes {
        self.pending.get()
    }

    pub(crate) fn clear(&self, lanes: Lanes) {
        self.pending.set(self.pending.get().remove(lanes));
    }
}

/// Effect cells awaiting the deferred flush, bucketed by reason.
#[derive(Default)]
pub(crate) struct PassiveQueues {
    /// Cells of unmounted components; only their cleanups run.
    pub(crate) unmount: Vec<Rc<RefCell<EffectCell>>>,
    /// Cells of components that re-rendered with pending effect work.
    pub(crate) update: Vec<Rc<RefCell<EffectCell>>>,
}

/// A mounted container: the reconciler's top-level entry point.
pub struct Root<H: HostAdapter> {
    pub(crate) arena: FiberArena<H::Node>,
    pub(crate) host: H,
    pub(crate) container: H::Node,
    /// The committed root fiber.
    pub(crate) current: FiberId,
    pub(crate) scheduler: SchedulerHandle,
    pub(crate) pending_passive: PassiveQueues,
}

impl<H: HostAdapter> fmt::Debug for Root<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("container", &self.container)
            .field("pending_lanes", &self.scheduler.pending_lanes())
            .finish_non_exhaustive()
    }
}

impl<H: HostAdapter> Root<H> {
    /// Mounts an empty root into `container`.
    pub fn new(host: H, container: H::Node) -> Self {
        let mut arena = FiberArena::new();
        let mut fiber = Fiber::new(FiberKind::Root, None, FiberProps::None);
        fiber.root_queue = Some(Rc::new(RefCell::new(UpdateQueue::new())));
        let current = arena.alloc(fiber);
        Self {
            arena,
            host,
            container,
            current,
            scheduler: SchedulerHandle::new(),
            pending_passive: PassiveQueues::default(),
        }
    }

    /// The host adapter, for inspection.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The shared scheduler handle.
    #[must_use]
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Queues `element` as the root description. Takes effect on the next
    /// flush; consecutive calls between flushes collapse into one pass.
    pub fn render(&mut self, element: impl Into<Element>) {
        self.enqueue_description(Some(element.into()));
    }

    /// Queues removal of the whole tree. On the next flush every component
    /// unmounts, cleanups run, and the container is emptied.
    pub fn unmount(&mut self) {
        self.enqueue_description(None);
    }

    fn enqueue_description(&mut self, description: Option<Element>) {
        let lane = self.scheduler.request_update_lane();
        let queue = self
            .arena
            .get(self.current)
            .root_queue
            .clone()
            .expect("root fiber carries a description queue");
        queue.borrow_mut().enqueue(Update {
            action: Action::Replace(description),
            lane,
        });
        self.scheduler.mark_root_updated(lane);
    }

    /// Renders, commits, and flushes effects until no work remains pending.
    pub fn flush(&mut self) {
        self.flush_with_trace(&mut NoTrace);
    }

    /// [`Self::flush`], reporting each step to `trace`.
    pub fn flush_with_trace(&mut self, trace: &mut dyn ReconcileTrace) {
        loop {
            let pending = self.scheduler.pending_lanes();
            if pending.is_empty() {
                break;
            }
            let render_lanes = pending.highest_priority();
            self.scheduler.clear(render_lanes);
            self.render_pass(render_lanes, trace);
        }
    }

    /// One render-commit-effects iteration for `lanes`.
    fn render_pass(&mut self, lanes: Lanes, trace: &mut dyn ReconcileTrace) {
        trace.render_start(lanes);
        let finished = create_work_in_progress(&mut self.arena, self.current, FiberProps::None);
        let mut next = Some(finished);
        while let Some(unit) = next {
            trace.begin_unit(self.arena.get(unit).kind.name());
            let child = begin_work(&mut self.arena, unit, lanes, &self.scheduler);
            next = match child {
                Some(child) => Some(child),
                None => self.complete_up(unit, finished),
            };
        }
        self.commit(finished, trace);
        self.current = finished;
        self.flush_passive(trace);
    }

    /// Completes `from` and its finished ancestors, returning the next
    /// sibling to begin, or `None` when the pass is over.
    fn complete_up(&mut self, from: FiberId, top: FiberId) -> Option<FiberId> {
        let mut unit = from;
        loop {
            complete_work::<H>(&mut self.arena, unit, &mut self.host);
            if unit == top {
                return None;
            }
            if let Some(sibling) = self.arena.get(unit).sibling {
                return Some(sibling);
            }
            match self.arena.get(unit).parent {
                Some(parent) => unit = parent,
                None => return None,
            }
        }
    }
}

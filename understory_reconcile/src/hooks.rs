// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State cells and effect cells ("hooks").
//!
//! A function component's persistent state is a vector of cells on its
//! fiber, one per entry-point call site, matched to the previous render
//! generation by call order. The entry points live on [`HookCx`], which
//! exists only for the duration of a component invocation; there is no
//! ambient dispatcher to call from the wrong place.
//!
//! Call-order discipline is enforced: a component that uses a different
//! number of cells, or a different kind of cell at the same position, than
//! it did on the previous render has violated the contract and the render
//! panics naming the component. These are programmer errors in the same
//! register as a `RefCell` double borrow, not recoverable conditions.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;

use crate::flags::{EffectTags, FiberFlags};
use crate::lane::Lanes;
use crate::root::SchedulerHandle;
use crate::update::{Action, Update, UpdateQueue};
use crate::value::ErasedValue;

/// A cleanup callback captured from an effect's create callback.
pub type Cleanup = Box<dyn FnOnce()>;

/// Wraps a cleanup closure for returning from an effect create callback.
pub fn cleanup(f: impl FnOnce() + 'static) -> Option<Cleanup> {
    Some(Box::new(f))
}

type EffectCreate = Box<dyn FnOnce() -> Option<Cleanup>>;
pub(crate) type SharedStateQueue = Rc<RefCell<UpdateQueue<ErasedValue>>>;

/// One dependency value in an effect's dependency snapshot.
///
/// Equality follows `Object.is` semantics: floats compare by bit pattern,
/// so `NaN == NaN` and `-0.0 != +0.0`; everything else compares
/// structurally. [`Dep::identity`] captures reference identity for shared
/// values.
#[derive(Clone, Debug)]
pub enum Dep {
    /// A boolean dependency.
    Bool(bool),
    /// An integer dependency.
    Int(i64),
    /// A floating-point dependency, compared by bit pattern.
    Float(f64),
    /// A string dependency.
    Str(String),
    /// A reference identity (pointer address) dependency.
    Identity(usize),
}

impl Dep {
    /// Captures the identity of an `Rc`-shared value.
    ///
    /// Two clones of the same `Rc` compare equal; a freshly allocated value
    /// does not.
    #[must_use]
    pub fn identity<T>(value: &Rc<T>) -> Self {
        Self::Identity(Rc::as_ptr(value) as usize)
    }
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Identity(a), Self::Identity(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Dep {}

impl From<bool> for Dep {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Dep {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Dep {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Dep {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Dep {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Dep {
    fn from(value: &str) -> Self {
        Self::Str(String::from(value))
    }
}

impl From<String> for Dep {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// An effect's dependency snapshot.
///
/// [`Deps::ALWAYS`] (no snapshot) re-runs the effect on every render;
/// [`Deps::ONCE`] (an empty snapshot) runs it on mount only; a non-empty
/// snapshot re-runs it when any element compares unequal to the previous
/// render's snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deps(pub(crate) Option<Vec<Dep>>);

impl Deps {
    /// No dependency snapshot: the effect re-runs after every render.
    pub const ALWAYS: Self = Self(None);

    /// Empty snapshot: the effect runs once, on mount.
    pub const ONCE: Self = Self(Some(Vec::new()));

    /// Builds a snapshot from dependency values.
    #[must_use]
    pub fn list(deps: impl IntoIterator<Item = Dep>) -> Self {
        Self(Some(deps.into_iter().collect()))
    }

    /// `true` when the effect must re-run given the previous snapshot.
    ///
    /// Absence of a snapshot on either side means "changed".
    fn changed_from(&self, prev: &Self) -> bool {
        match (&prev.0, &self.0) {
            (Some(prev), Some(next)) => prev != next,
            _ => true,
        }
    }
}

impl<const N: usize> From<[Dep; N]> for Deps {
    fn from(deps: [Dep; N]) -> Self {
        Self(Some(deps.into()))
    }
}

impl From<Vec<Dep>> for Deps {
    fn from(deps: Vec<Dep>) -> Self {
        Self(Some(deps))
    }
}

/// A state cell: the committed value plus its shared pending-update queue.
///
/// The queue `Rc` is created at mount and carried through every later
/// generation, which is what keeps the dispatch handle's identity stable.
#[derive(Clone, Debug)]
pub(crate) struct StateCell {
    pub(crate) value: ErasedValue,
    pub(crate) queue: SharedStateQueue,
}

/// An effect cell.
///
/// Cells are shared (`Rc`) so that the commit phase can collect them into
/// the root's pending-passive buckets and flush them after the fiber that
/// owned them has been unlinked. On update, the previous generation's
/// captured `destroy` is moved into the fresh cell.
pub(crate) struct EffectCell {
    pub(crate) tag: EffectTags,
    pub(crate) create: Option<EffectCreate>,
    pub(crate) destroy: Option<Cleanup>,
    pub(crate) deps: Deps,
}

impl fmt::Debug for EffectCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectCell")
            .field("tag", &self.tag)
            .field("has_create", &self.create.is_some())
            .field("has_destroy", &self.destroy.is_some())
            .field("deps", &self.deps)
            .finish()
    }
}

/// One cell in a component's per-render call sequence.
#[derive(Clone, Debug)]
pub(crate) enum Hook {
    State(StateCell),
    Effect(Rc<RefCell<EffectCell>>),
}

/// A stable dispatch handle for one state cell.
///
/// Cloneable and usable from anywhere on the owning thread: event
/// callbacks, effect callbacks, or plain embedder code. Dispatching
/// requests a lane, enqueues the transition, and marks the root pending;
/// it never renders by itself.
pub struct StateHandle<T> {
    queue: SharedStateQueue,
    scheduler: SchedulerHandle,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for StateHandle<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            scheduler: self.scheduler.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for StateHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("pending", &self.queue.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> StateHandle<T> {
    /// Replaces the cell's state on the next flush.
    pub fn set(&self, value: T) {
        self.dispatch(Action::Replace(ErasedValue::new(value)));
    }

    /// Derives the next state from the previous one on the next flush.
    ///
    /// Transforms queued before a flush fold left over the committed state
    /// in dispatch order.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.dispatch(Action::Transform(Box::new(move |prev: &ErasedValue| {
            let prev = prev
                .downcast_ref::<T>()
                .expect("state cell changed type under a pending update");
            ErasedValue::new(f(prev))
        })));
    }

    fn dispatch(&self, action: Action<ErasedValue>) {
        let lane = self.scheduler.request_update_lane();
        self.queue.borrow_mut().enqueue(Update { action, lane });
        self.scheduler.mark_root_updated(lane);
    }
}

/// The per-invocation render context handed to a component function.
///
/// Entry points must be called unconditionally and in the same order on
/// every render of the same component instance.
pub struct HookCx {
    /// Previous generation's cells; `None` on first mount.
    prev_hooks: Option<Vec<Hook>>,
    hooks: Vec<Hook>,
    cursor: usize,
    render_lanes: Lanes,
    scheduler: SchedulerHandle,
    component: &'static str,
    flags: FiberFlags,
    deferred: Lanes,
}

impl fmt::Debug for HookCx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCx")
            .field("component", &self.component)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

/// What a finished component invocation hands back to the begin phase.
#[derive(Debug)]
pub(crate) struct HookRender {
    /// The new generation's cells.
    pub(crate) hooks: Vec<Hook>,
    /// The previous generation's cells, to be restored onto the alternate.
    pub(crate) prev_hooks: Option<Vec<Hook>>,
    /// Fiber flags accumulated during the invocation (passive effect).
    pub(crate) flags: FiberFlags,
    /// Lanes of updates observed but not drained this render.
    pub(crate) deferred: Lanes,
}

impl HookCx {
    pub(crate) fn new(
        prev_hooks: Option<Vec<Hook>>,
        render_lanes: Lanes,
        scheduler: SchedulerHandle,
        component: &'static str,
    ) -> Self {
        Self {
            prev_hooks,
            hooks: Vec::new(),
            cursor: 0,
            render_lanes,
            scheduler,
            component,
            flags: FiberFlags::empty(),
            deferred: Lanes::NONE,
        }
    }

    /// Declares a state cell.
    ///
    /// On mount, resolves `init` and binds a fresh queue; on update, drains
    /// pending updates for the active render lanes into the carried value.
    /// The returned handle has the same identity on every render.
    ///
    /// # Panics
    ///
    /// Panics if this render requests more cells than the previous one, if
    /// the cell at this position was an effect cell last render, or if the
    /// cell's value type changed.
    pub fn use_state<T: Clone + 'static>(&mut self, init: impl FnOnce() -> T) -> (T, StateHandle<T>) {
        let cursor = self.next_cursor();
        let (value, queue) = match self.take_prev(cursor) {
            None => {
                let value = init();
                let queue: SharedStateQueue = Rc::new(RefCell::new(UpdateQueue::new()));
                (ErasedValue::new(value), queue)
            }
            Some(Hook::State(cell)) => {
                let drained = cell
                    .queue
                    .borrow_mut()
                    .drain(cell.value.clone(), self.render_lanes);
                self.deferred |= drained.deferred;
                (drained.state, cell.queue.clone())
            }
            Some(Hook::Effect(_)) => panic!(
                "component `{}` declared a state cell where the previous render had an effect cell (cell {cursor})",
                self.component
            ),
        };
        let typed = value
            .downcast_ref::<T>()
            .unwrap_or_else(|| {
                panic!(
                    "state cell {cursor} of component `{}` changed type between renders",
                    self.component
                )
            })
            .clone();
        let handle = StateHandle {
            queue: queue.clone(),
            scheduler: self.scheduler.clone(),
            _marker: PhantomData,
        };
        self.hooks.push(Hook::State(StateCell { value, queue }));
        (typed, handle)
    }

    /// Declares a passive effect.
    ///
    /// On mount the effect is always scheduled. On update it is scheduled
    /// only if `deps` compares unequal to the previous snapshot (absence of
    /// a snapshot on either side counts as unequal); either way a cell is
    /// appended so the destroy/create chain stays intact for later renders.
    ///
    /// # Panics
    ///
    /// Panics on the same call-order violations as [`Self::use_state`].
    pub fn use_effect(
        &mut self,
        deps: impl Into<Deps>,
        create: impl FnOnce() -> Option<Cleanup> + 'static,
    ) {
        let cursor = self.next_cursor();
        let deps = deps.into();
        let cell = match self.take_prev(cursor) {
            None => {
                self.flags |= FiberFlags::PASSIVE;
                EffectCell {
                    tag: EffectTags::PASSIVE | EffectTags::HAS_EFFECT,
                    create: Some(Box::new(create)),
                    destroy: None,
                    deps,
                }
            }
            Some(Hook::Effect(prev)) => {
                let mut prev = prev.borrow_mut();
                let destroy = prev.destroy.take();
                let changed = deps.changed_from(&prev.deps);
                let mut tag = EffectTags::PASSIVE;
                let mut create_slot: Option<EffectCreate> = None;
                if changed {
                    tag |= EffectTags::HAS_EFFECT;
                    create_slot = Some(Box::new(create));
                    self.flags |= FiberFlags::PASSIVE;
                }
                EffectCell {
                    tag,
                    create: create_slot,
                    destroy,
                    deps,
                }
            }
            Some(Hook::State(_)) => panic!(
                "component `{}` declared an effect cell where the previous render had a state cell (cell {cursor})",
                self.component
            ),
        };
        self.hooks.push(Hook::Effect(Rc::new(RefCell::new(cell))));
    }

    fn next_cursor(&mut self) -> usize {
        let cursor = self.cursor;
        self.cursor += 1;
        cursor
    }

    /// The previous-generation cell for this call site, or `None` on mount.
    ///
    /// Panics when the previous generation's cell list runs out while the
    /// component keeps requesting cells.
    fn take_prev(&self, cursor: usize) -> Option<Hook> {
        let prev = self.prev_hooks.as_ref()?;
        match prev.get(cursor) {
            Some(hook) => Some(hook.clone()),
            None => panic!(
                "component `{}` used more state cells than the previous render ({} available)",
                self.component,
                prev.len()
            ),
        }
    }

    /// Closes the invocation, verifying the call count did not shrink.
    pub(crate) fn finish(self) -> HookRender {
        if let Some(prev) = &self.prev_hooks {
            assert!(
                self.cursor >= prev.len(),
                "component `{}` used fewer state cells than the previous render ({} of {})",
                self.component,
                self.cursor,
                prev.len()
            );
        }
        HookRender {
            hooks: self.hooks,
            prev_hooks: self.prev_hooks,
            flags: self.flags,
            deferred: self.deferred,
        }
    }
}

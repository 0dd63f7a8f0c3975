// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dual-generation work unit and its arena.
//!
//! A [`Fiber`] represents one position in the component tree within one
//! render generation. The committed generation ("current") and the
//! generation under construction ("work in progress") are linked through
//! `alternate`, forming a 2-cycle: a fiber's alternate's alternate is the
//! fiber itself. Tree links (`parent`, `child`, `sibling`) are only
//! meaningful within a single generation.
//!
//! Fibers live in a [`FiberArena`] and refer to each other by [`FiberId`],
//! a slot-plus-generation handle in the manner of a box-tree node id. Ids
//! of released fibers go stale rather than aliasing a later occupant.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use alloc::borrow::Cow;

use crate::element::{Attrs, ComponentFn, Element, Key};
use crate::flags::FiberFlags;
use crate::hooks::Hook;
use crate::update::UpdateQueue;
use crate::value::ErasedValue;

/// Identifier for a fiber in the arena.
///
/// A small, copyable handle consisting of a slot index and a generation
/// counter. Releasing a fiber frees its slot; any id still pointing at that
/// slot is stale and will never alias a later occupant because the
/// generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FiberId(pub(crate) u32, pub(crate) u32);

impl FiberId {
    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// The closed set of fiber variants, matched exhaustively in every phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FiberKind {
    /// The root of a mounted container. Exactly one per [`crate::Root`].
    Root,
    /// A host element with the given type tag.
    Host(Cow<'static, str>),
    /// A host text node.
    Text,
    /// A function component.
    Component(ComponentFn),
    /// A keyed grouping with no host node.
    Fragment,
}

impl FiberKind {
    /// Short name for diagnostics and traces.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Host(_) => "host",
            Self::Text => "text",
            Self::Component(_) => "component",
            Self::Fragment => "fragment",
        }
    }
}

/// Props in flight or committed for one fiber, shaped by its kind.
#[derive(Clone, Debug)]
pub(crate) enum FiberProps {
    /// The root has no props of its own.
    None,
    /// Host element attributes and child descriptions.
    Host {
        attrs: Attrs,
        children: Vec<Element>,
    },
    /// Text content.
    Text(String),
    /// Type-erased component props.
    Component(ErasedValue),
    /// A fragment's props are its child list.
    Fragment(Vec<Element>),
}

/// The root description queue, shared between both root-fiber generations.
pub(crate) type SharedRootQueue = Rc<RefCell<UpdateQueue<Option<Element>>>>;

/// One render-generation work unit.
#[derive(Clone)]
pub(crate) struct Fiber<N: Clone> {
    pub(crate) kind: FiberKind,
    pub(crate) key: Option<Key>,
    /// Owned host-tree handle, for host and text fibers once completed.
    pub(crate) host: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) index: u32,
    pub(crate) pending_props: FiberProps,
    pub(crate) memoized_props: Option<FiberProps>,
    /// Root only: the committed top-level description.
    pub(crate) memoized_element: Option<Element>,
    /// Function components: committed state cells, in call order.
    pub(crate) hooks: Vec<Hook>,
    /// Root only: pending top-level replacement updates.
    pub(crate) root_queue: Option<SharedRootQueue>,
    pub(crate) flags: FiberFlags,
    pub(crate) subtree_flags: FiberFlags,
    /// The other generation of this logical tree position.
    pub(crate) alternate: Option<FiberId>,
    /// Children removed during the last diff, awaiting commit.
    pub(crate) deletions: Vec<FiberId>,
}

impl<N: Clone> Fiber<N> {
    pub(crate) fn new(kind: FiberKind, key: Option<Key>, pending_props: FiberProps) -> Self {
        Self {
            kind,
            key,
            host: None,
            parent: None,
            child: None,
            sibling: None,
            index: 0,
            pending_props,
            memoized_props: None,
            memoized_element: None,
            hooks: Vec::new(),
            root_queue: None,
            flags: FiberFlags::empty(),
            subtree_flags: FiberFlags::empty(),
            alternate: None,
            deletions: Vec::new(),
        }
    }

    /// Builds an unmounted fiber from a description.
    pub(crate) fn from_element(element: &Element) -> Self {
        match element {
            Element::Host(host) => Self::new(
                FiberKind::Host(host.ty.clone()),
                host.key.clone(),
                FiberProps::Host {
                    attrs: host.attrs.clone(),
                    children: host.children.clone(),
                },
            ),
            Element::Text(text) => {
                Self::new(FiberKind::Text, None, FiberProps::Text(text.text.clone()))
            }
            Element::Component(component) => Self::new(
                FiberKind::Component(component.func),
                component.key.clone(),
                FiberProps::Component(component.props.clone()),
            ),
            Element::Fragment(fragment) => Self::new(
                FiberKind::Fragment,
                fragment.key.clone(),
                FiberProps::Fragment(fragment.children.clone()),
            ),
        }
    }

    /// Pending props for an existing fiber being reused for `element`.
    ///
    /// The caller has already established that kinds match.
    pub(crate) fn pending_props_from(element: &Element) -> FiberProps {
        match element {
            Element::Host(host) => FiberProps::Host {
                attrs: host.attrs.clone(),
                children: host.children.clone(),
            },
            Element::Text(text) => FiberProps::Text(text.text.clone()),
            Element::Component(component) => FiberProps::Component(component.props.clone()),
            Element::Fragment(fragment) => FiberProps::Fragment(fragment.children.clone()),
        }
    }

    /// Whether this fiber can be reused for `element` (type and key match).
    pub(crate) fn matches(&self, element: &Element) -> bool {
        if self.key.as_ref() != element.key() {
            return false;
        }
        match (&self.kind, element) {
            (FiberKind::Host(ty), Element::Host(host)) => *ty == host.ty,
            (FiberKind::Text, Element::Text(_)) => true,
            (FiberKind::Component(func), Element::Component(component)) => {
                *func == component.func
            }
            (FiberKind::Fragment, Element::Fragment(_)) => true,
            _ => false,
        }
    }
}

impl<N: Clone> fmt::Debug for Fiber<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fiber")
            .field("kind", &self.kind.name())
            .field("key", &self.key)
            .field("flags", &self.flags)
            .field("subtree_flags", &self.subtree_flags)
            .field("alternate", &self.alternate)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Slot<N: Clone> {
    generation: u32,
    fiber: Option<Fiber<N>>,
}

/// Slot arena holding both generations of every live fiber.
#[derive(Debug)]
pub(crate) struct FiberArena<N: Clone> {
    slots: Vec<Slot<N>>,
    free: Vec<u32>,
}

impl<N: Clone> FiberArena<N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, fiber: Fiber<N>) -> FiberId {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation += 1;
            slot.fiber = Some(fiber);
            FiberId(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).expect("fiber arena exhausted");
            self.slots.push(Slot {
                generation: 1,
                fiber: Some(fiber),
            });
            FiberId(idx, 1)
        }
    }

    /// Frees a fiber's slot. Ids pointing at it become stale.
    pub(crate) fn release(&mut self, id: FiberId) {
        let slot = &mut self.slots[id.idx()];
        if slot.generation == id.1 && slot.fiber.is_some() {
            slot.fiber = None;
            self.free.push(id.0);
        }
    }

    pub(crate) fn is_alive(&self, id: FiberId) -> bool {
        self.slots
            .get(id.idx())
            .is_some_and(|slot| slot.generation == id.1 && slot.fiber.is_some())
    }

    /// Borrows a live fiber.
    ///
    /// # Panics
    ///
    /// Panics on a stale id; the reconciler never holds an id across the
    /// release of its fiber.
    pub(crate) fn get(&self, id: FiberId) -> &Fiber<N> {
        let slot = &self.slots[id.idx()];
        assert!(slot.generation == id.1, "stale fiber id {id:?}");
        slot.fiber.as_ref().expect("released fiber id")
    }

    /// Mutably borrows a live fiber. Panics like [`Self::get`].
    pub(crate) fn get_mut(&mut self, id: FiberId) -> &mut Fiber<N> {
        let slot = &mut self.slots[id.idx()];
        assert!(slot.generation == id.1, "stale fiber id {id:?}");
        slot.fiber.as_mut().expect("released fiber id")
    }

    /// Number of live fibers.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.fiber.is_some()).count()
    }
}

/// Reuses or allocates the other-generation fiber for `current`, carrying
/// committed state forward and clearing last render's mutation bookkeeping.
///
/// Maintains the alternate 2-cycle: afterwards the returned fiber and
/// `current` point at each other.
pub(crate) fn create_work_in_progress<N: Clone>(
    arena: &mut FiberArena<N>,
    current: FiberId,
    pending_props: FiberProps,
) -> FiberId {
    let snapshot = arena.get(current).clone();
    match snapshot.alternate {
        Some(wip) => {
            let fiber = arena.get_mut(wip);
            fiber.kind = snapshot.kind;
            fiber.key = snapshot.key;
            fiber.host = snapshot.host;
            fiber.child = snapshot.child;
            fiber.sibling = None;
            fiber.pending_props = pending_props;
            fiber.memoized_props = snapshot.memoized_props;
            fiber.memoized_element = snapshot.memoized_element;
            fiber.hooks = snapshot.hooks;
            fiber.root_queue = snapshot.root_queue;
            fiber.flags = FiberFlags::empty();
            fiber.subtree_flags = FiberFlags::empty();
            fiber.deletions.clear();
            wip
        }
        None => {
            let mut fiber = Fiber::new(snapshot.kind, snapshot.key, pending_props);
            fiber.host = snapshot.host;
            fiber.child = snapshot.child;
            fiber.memoized_props = snapshot.memoized_props;
            fiber.memoized_element = snapshot.memoized_element;
            fiber.hooks = snapshot.hooks;
            fiber.root_queue = snapshot.root_queue;
            fiber.alternate = Some(current);
            let wip = arena.alloc(fiber);
            arena.get_mut(current).alternate = Some(wip);
            wip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Arena = FiberArena<u32>;

    fn root_fiber() -> Fiber<u32> {
        Fiber::new(FiberKind::Root, None, FiberProps::None)
    }

    #[test]
    fn slot_reuse_bumps_generation() {
        let mut arena = Arena::new();
        let a = arena.alloc(root_fiber());
        arena.release(a);
        assert!(!arena.is_alive(a));

        let b = arena.alloc(root_fiber());
        assert_eq!(a.0, b.0);
        assert_ne!(a.1, b.1);
        assert!(arena.is_alive(b));
        assert!(!arena.is_alive(a));
    }

    #[test]
    fn alternate_two_cycle() {
        let mut arena = Arena::new();
        let current = arena.alloc(root_fiber());
        let wip = create_work_in_progress(&mut arena, current, FiberProps::None);
        assert_eq!(arena.get(current).alternate, Some(wip));
        assert_eq!(arena.get(wip).alternate, Some(current));

        // A second request reuses the same alternate slot.
        let again = create_work_in_progress(&mut arena, current, FiberProps::None);
        assert_eq!(again, wip);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn work_in_progress_clears_mutation_bookkeeping() {
        let mut arena = Arena::new();
        let current = arena.alloc(root_fiber());
        let wip = create_work_in_progress(&mut arena, current, FiberProps::None);
        {
            let fiber = arena.get_mut(wip);
            fiber.flags = FiberFlags::PLACEMENT;
            fiber.subtree_flags = FiberFlags::CONTENT_UPDATE;
            fiber.deletions.push(current);
        }
        let wip = create_work_in_progress(&mut arena, current, FiberProps::None);
        let fiber = arena.get(wip);
        assert_eq!(fiber.flags, FiberFlags::empty());
        assert_eq!(fiber.subtree_flags, FiberFlags::empty());
        assert!(fiber.deletions.is_empty());
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed child reconciliation.
//!
//! Diffs a fiber's previous-generation child list against the new child
//! descriptions. Reuse requires a slot match (explicit key, else position)
//! plus a type match; reused fibers keep their host nodes and state. Old
//! children with no new counterpart are recorded on the parent's deletion
//! list. Moves among reused children are minimized with a longest
//! increasing subsequence over their previous indices: children on the
//! subsequence keep their relative order and are left untouched, everything
//! else is flagged for placement.
//!
//! During a fresh mount (the parent has no alternate) per-child effect
//! tracking is skipped; the subtree is built offscreen and attached by a
//! single placement at its top.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::element::{Element, Key};
use crate::fiber::{Fiber, FiberArena, FiberId, create_work_in_progress};
use crate::flags::FiberFlags;
use crate::util::stable_positions;

/// Identity of a child within one sibling list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Slot {
    Keyed(Key),
    Index(usize),
}

impl Slot {
    fn of(element: &Element, index: usize) -> Self {
        match element.key() {
            Some(key) => Self::Keyed(key.clone()),
            None => Self::Index(index),
        }
    }
}

/// Reconciles `wip`'s children against `new_children`, linking the new
/// child fibers and recording placements and deletions.
pub(crate) fn reconcile_children<N: Clone>(
    arena: &mut FiberArena<N>,
    wip: FiberId,
    new_children: &[Element],
    track_effects: bool,
) {
    // Index the previous generation's children by slot.
    let mut old: HashMap<Slot, (FiberId, u32)> = HashMap::new();
    {
        let current = arena.get(wip).alternate;
        let mut cursor = current.and_then(|id| arena.get(id).child);
        let mut index = 0_u32;
        while let Some(id) = cursor {
            let fiber = arena.get(id);
            let slot = match &fiber.key {
                Some(key) => Slot::Keyed(key.clone()),
                None => Slot::Index(index as usize),
            };
            old.insert(slot, (id, index));
            cursor = fiber.sibling;
            index += 1;
        }
    }

    let mut deletions: Vec<FiberId> = Vec::new();
    let mut linked: Vec<FiberId> = Vec::with_capacity(new_children.len());
    let mut old_indices: Vec<Option<u32>> = Vec::with_capacity(new_children.len());

    for (index, element) in new_children.iter().enumerate() {
        let slot = Slot::of(element, index);
        let reusable = match old.get(&slot) {
            Some(&(old_id, old_index)) if arena.get(old_id).matches(element) => {
                old.remove(&slot);
                Some((old_id, old_index))
            }
            _ => None,
        };
        let child = match reusable {
            Some((old_id, old_index)) => {
                let props = Fiber::<N>::pending_props_from(element);
                old_indices.push(Some(old_index));
                create_work_in_progress(arena, old_id, props)
            }
            None => {
                // A slot match with the wrong type still consumes the old
                // fiber: it cannot be reused and must be deleted.
                if let Some((stale, _)) = old.remove(&slot) {
                    deletions.push(stale);
                }
                old_indices.push(None);
                let id = arena.alloc(Fiber::from_element(element));
                if track_effects {
                    arena.get_mut(id).flags |= FiberFlags::PLACEMENT;
                }
                id
            }
        };
        linked.push(child);
    }

    // Whatever is left in the index was not matched by any new child.
    deletions.extend(old.drain().map(|(_, (id, _))| id));

    // Reused children off the longest increasing subsequence must move.
    if track_effects {
        let stable = stable_positions(&old_indices);
        for (position, &child) in linked.iter().enumerate() {
            if old_indices[position].is_some() && !stable[position] {
                arena.get_mut(child).flags |= FiberFlags::PLACEMENT;
            }
        }
    }

    // Link the new generation's sibling chain.
    let mut previous: Option<FiberId> = None;
    for (index, &child) in linked.iter().enumerate() {
        let fiber = arena.get_mut(child);
        fiber.parent = Some(wip);
        fiber.sibling = None;
        fiber.index = u32::try_from(index).expect("child list too long");
        match previous {
            Some(prev) => arena.get_mut(prev).sibling = Some(child),
            None => arena.get_mut(wip).child = Some(child),
        }
        previous = Some(child);
    }
    if linked.is_empty() {
        arena.get_mut(wip).child = None;
    }

    if !deletions.is_empty() && track_effects {
        let fiber = arena.get_mut(wip);
        fiber.deletions.extend(deletions);
        fiber.flags |= FiberFlags::CHILD_DELETION;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::{FiberKind, FiberProps};

    type Arena = FiberArena<u32>;

    /// Builds a committed parent with the given children and returns the
    /// work-in-progress parent ready for reconciliation.
    fn committed_parent(arena: &mut Arena, children: &[Element]) -> FiberId {
        let current = arena.alloc(Fiber::new(
            FiberKind::Host("ul".into()),
            None,
            FiberProps::None,
        ));
        reconcile_children(arena, current, children, false);
        // Children of a committed tree have the parent as alternate target.
        create_work_in_progress(arena, current, FiberProps::None)
    }

    fn child_ids(arena: &Arena, parent: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut cursor = arena.get(parent).child;
        while let Some(id) = cursor {
            out.push(id);
            cursor = arena.get(id).sibling;
        }
        out
    }

    fn keyed_li(key: &'static str) -> Element {
        Element::host("li").key(key).into()
    }

    #[test]
    fn mount_links_without_flags() {
        let mut arena = Arena::new();
        let parent = arena.alloc(Fiber::new(
            FiberKind::Host("ul".into()),
            None,
            FiberProps::None,
        ));
        reconcile_children(
            &mut arena,
            parent,
            &[keyed_li("a"), keyed_li("b")],
            false,
        );
        let children = child_ids(&arena, parent);
        assert_eq!(children.len(), 2);
        for (i, id) in children.iter().enumerate() {
            let fiber = arena.get(*id);
            assert_eq!(fiber.flags, FiberFlags::empty());
            assert_eq!(fiber.index as usize, i);
            assert_eq!(fiber.parent, Some(parent));
        }
    }

    #[test]
    fn keyed_reorder_reuses_fibers_and_minimizes_moves() {
        let mut arena = Arena::new();
        let old = [keyed_li("a"), keyed_li("b"), keyed_li("c"), keyed_li("d")];
        let wip = committed_parent(&mut arena, &old);
        let old_children: Vec<FiberId> = {
            let current = arena.get(wip).alternate.unwrap();
            child_ids(&arena, current)
        };

        // d a b c: every child is reused; only d should be flagged.
        let new = [keyed_li("d"), keyed_li("a"), keyed_li("b"), keyed_li("c")];
        reconcile_children(&mut arena, wip, &new, true);

        let children = child_ids(&arena, wip);
        assert_eq!(children.len(), 4);
        // Reuse: each new child is the alternate of an old child.
        for id in &children {
            let alt = arena.get(*id).alternate.unwrap();
            assert!(old_children.contains(&alt));
        }
        let placed: Vec<bool> = children
            .iter()
            .map(|id| arena.get(*id).flags.contains(FiberFlags::PLACEMENT))
            .collect();
        assert_eq!(placed, [true, false, false, false]);
        assert!(arena.get(wip).deletions.is_empty());
    }

    #[test]
    fn removed_children_are_recorded_for_deletion() {
        let mut arena = Arena::new();
        let old = [keyed_li("a"), keyed_li("b"), keyed_li("c")];
        let wip = committed_parent(&mut arena, &old);

        reconcile_children(&mut arena, wip, &[keyed_li("b")], true);

        let fiber = arena.get(wip);
        assert!(fiber.flags.contains(FiberFlags::CHILD_DELETION));
        assert_eq!(fiber.deletions.len(), 2);
        assert_eq!(child_ids(&arena, wip).len(), 1);
    }

    #[test]
    fn type_change_at_same_slot_replaces() {
        let mut arena = Arena::new();
        let old = [keyed_li("a")];
        let wip = committed_parent(&mut arena, &old);

        let new: Element = Element::host("p").key("a").into();
        reconcile_children(&mut arena, wip, core::slice::from_ref(&new), true);

        let children = child_ids(&arena, wip);
        assert_eq!(children.len(), 1);
        let fiber = arena.get(children[0]);
        assert!(fiber.alternate.is_none(), "replacement must be fresh");
        assert!(fiber.flags.contains(FiberFlags::PLACEMENT));
        assert_eq!(arena.get(wip).deletions.len(), 1);
    }

    #[test]
    fn unkeyed_children_match_by_position() {
        let mut arena = Arena::new();
        let old = [Element::text("one"), Element::text("two")];
        let wip = committed_parent(&mut arena, &old);

        let new = [Element::text("uno"), Element::text("dos")];
        reconcile_children(&mut arena, wip, &new, true);

        let children = child_ids(&arena, wip);
        assert_eq!(children.len(), 2);
        for id in children {
            let fiber = arena.get(id);
            assert!(fiber.alternate.is_some(), "positional reuse expected");
            let FiberProps::Text(text) = &fiber.pending_props else {
                panic!("expected text props");
            };
            assert!(text == "uno" || text == "dos");
        }
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The completion phase: realizing host nodes and bubbling effect flags.
//!
//! Runs bottom-up: by the time a fiber completes, every descendant has.
//! A host or text fiber completing for the first time creates its node
//! off-screen and gathers its nearest host descendants into it, so a
//! freshly mounted subtree reaches commit as one fully assembled node.
//! Reused fibers keep their node and only compare committed props against
//! pending ones, marking an in-place content update when they differ.
//!
//! Bubbling folds each child's own and subtree flags into the parent's
//! subtree flags; the commit traversal later skips any subtree whose
//! bubbled flags are clean.

use crate::fiber::{FiberArena, FiberId, FiberKind, FiberProps};
use crate::flags::FiberFlags;
use crate::host::HostAdapter;

/// Completes one work unit. Descendants must already be complete.
pub(crate) fn complete_work<H: HostAdapter>(
    arena: &mut FiberArena<H::Node>,
    wip: FiberId,
    host: &mut H,
) {
    let kind = arena.get(wip).kind.clone();
    match kind {
        FiberKind::Host(ty) => {
            let reused = arena.get(wip).alternate.is_some() && arena.get(wip).host.is_some();
            let attrs = match &arena.get(wip).pending_props {
                FiberProps::Host { attrs, .. } => attrs.clone(),
                _ => unreachable!("host fiber carries host props"),
            };
            if reused {
                let changed = match &arena.get(wip).memoized_props {
                    Some(FiberProps::Host { attrs: old, .. }) => *old != attrs,
                    _ => true,
                };
                if changed {
                    arena.get_mut(wip).flags |= FiberFlags::CONTENT_UPDATE;
                }
            } else {
                let node = host.create_element(&ty, &attrs);
                arena.get_mut(wip).host = Some(node);
                append_all_children(arena, wip, host);
            }
        }
        FiberKind::Text => {
            let reused = arena.get(wip).alternate.is_some() && arena.get(wip).host.is_some();
            let text = match &arena.get(wip).pending_props {
                FiberProps::Text(text) => text.clone(),
                _ => unreachable!("text fiber carries text props"),
            };
            if reused {
                let changed = match &arena.get(wip).memoized_props {
                    Some(FiberProps::Text(old)) => *old != text,
                    _ => true,
                };
                if changed {
                    arena.get_mut(wip).flags |= FiberFlags::CONTENT_UPDATE;
                }
            } else {
                let node = host.create_text(&text);
                arena.get_mut(wip).host = Some(node);
            }
        }
        FiberKind::Root | FiberKind::Component(_) | FiberKind::Fragment => {}
    }

    let pending = arena.get(wip).pending_props.clone();
    let fiber = arena.get_mut(wip);
    fiber.memoized_props = Some(pending);
    bubble_flags(arena, wip);
}

/// Attaches every nearest host descendant of `wip` to its fresh node,
/// looking through component and fragment fibers.
fn append_all_children<H: HostAdapter>(
    arena: &FiberArena<H::Node>,
    wip: FiberId,
    host: &mut H,
) {
    let parent_node = arena
        .get(wip)
        .host
        .clone()
        .unwrap_or_else(|| unreachable!("append target completed without a node"));
    let mut cursor = arena.get(wip).child;
    while let Some(cur) = cursor {
        let fiber = arena.get(cur);
        let is_host = matches!(fiber.kind, FiberKind::Host(_) | FiberKind::Text);
        if is_host {
            if let Some(node) = &fiber.host {
                host.append_initial_child(&parent_node, node);
            }
        } else if let Some(child) = fiber.child {
            cursor = Some(child);
            continue;
        }
        // Next sibling, climbing back up but never past `wip`.
        let mut back = cur;
        cursor = loop {
            if let Some(sibling) = arena.get(back).sibling {
                break Some(sibling);
            }
            match arena.get(back).parent {
                Some(parent) if parent != wip => back = parent,
                _ => break None,
            }
        };
    }
}

/// Folds the children's own and subtree flags into `wip`'s subtree flags.
fn bubble_flags<N: Clone>(arena: &mut FiberArena<N>, wip: FiberId) {
    let mut bubbled = FiberFlags::empty();
    let mut cursor = arena.get(wip).child;
    while let Some(child) = cursor {
        let fiber = arena.get(child);
        bubbled |= fiber.flags | fiber.subtree_flags;
        cursor = fiber.sibling;
    }
    arena.get_mut(wip).subtree_flags |= bubbled;
}

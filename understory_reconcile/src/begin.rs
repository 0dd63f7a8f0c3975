// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The begin phase: turning one fiber's pending description into child
//! fibers.
//!
//! Each variant resolves its own inputs first (the root drains its
//! description queue, a component invokes its function) and then hands the
//! resulting child descriptions to the keyed diff. Per-child effect
//! tracking is on only when the fiber has a committed alternate; a freshly
//! mounting subtree is assembled off-screen and attached by the single
//! placement recorded at its top.

use alloc::vec::Vec;
use core::mem;
use core::slice;

use crate::diff::reconcile_children;
use crate::element::Element;
use crate::fiber::{FiberArena, FiberId, FiberKind, FiberProps};
use crate::hooks::HookCx;
use crate::lane::Lanes;
use crate::root::SchedulerHandle;

/// Processes one work unit and returns its first child, if any.
pub(crate) fn begin_work<N: Clone>(
    arena: &mut FiberArena<N>,
    wip: FiberId,
    render_lanes: Lanes,
    scheduler: &SchedulerHandle,
) -> Option<FiberId> {
    let kind = arena.get(wip).kind.clone();
    match kind {
        FiberKind::Root => begin_root(arena, wip, render_lanes, scheduler),
        FiberKind::Host(_) => {
            let children = match &arena.get(wip).pending_props {
                FiberProps::Host { children, .. } => children.clone(),
                other => panic!("host fiber with {} props", props_name(other)),
            };
            let track = arena.get(wip).alternate.is_some();
            reconcile_children(arena, wip, &children, track);
        }
        FiberKind::Text => {
            // Text is a leaf; content changes are detected at completion.
        }
        FiberKind::Component(func) => {
            let props = match &arena.get(wip).pending_props {
                FiberProps::Component(props) => props.clone(),
                other => panic!("component fiber with {} props", props_name(other)),
            };
            // The committed cells live on the alternate; lend them to the
            // invocation and restore them afterwards so an abandoned render
            // could start over from the same committed state.
            let prev_hooks = arena
                .get(wip)
                .alternate
                .map(|alt| mem::take(&mut arena.get_mut(alt).hooks));
            let mut cx = HookCx::new(prev_hooks, render_lanes, scheduler.clone(), func.name());
            let element = func.invoke(&mut cx, &props);
            let render = cx.finish();
            if let (Some(alt), Some(prev)) = (arena.get(wip).alternate, render.prev_hooks) {
                arena.get_mut(alt).hooks = prev;
            }
            if !render.deferred.is_empty() {
                scheduler.mark_root_updated(render.deferred);
            }
            {
                let fiber = arena.get_mut(wip);
                fiber.hooks = render.hooks;
                fiber.flags |= render.flags;
            }
            let track = arena.get(wip).alternate.is_some();
            reconcile_children(arena, wip, slice::from_ref(&element), track);
        }
        FiberKind::Fragment => {
            let children = match &arena.get(wip).pending_props {
                FiberProps::Fragment(children) => children.clone(),
                other => panic!("fragment fiber with {} props", props_name(other)),
            };
            let track = arena.get(wip).alternate.is_some();
            reconcile_children(arena, wip, &children, track);
        }
    }
    arena.get(wip).child
}

/// Drains the root's description queue and diffs against the drained
/// description. `None` (an unmount) diffs against an empty child list.
fn begin_root<N: Clone>(
    arena: &mut FiberArena<N>,
    wip: FiberId,
    render_lanes: Lanes,
    scheduler: &SchedulerHandle,
) {
    let queue = arena
        .get(wip)
        .root_queue
        .clone()
        .unwrap_or_else(|| panic!("root fiber without a description queue"));
    let base = arena.get(wip).memoized_element.clone();
    let drained = queue.borrow_mut().drain(base, render_lanes);
    if !drained.deferred.is_empty() {
        scheduler.mark_root_updated(drained.deferred);
    }
    arena.get_mut(wip).memoized_element = drained.state.clone();
    let track = arena.get(wip).alternate.is_some();
    let children: Vec<Element> = match drained.state {
        Some(element) => alloc::vec![element],
        None => Vec::new(),
    };
    reconcile_children(arena, wip, &children, track);
}

fn props_name(props: &FiberProps) -> &'static str {
    match props {
        FiberProps::None => "no",
        FiberProps::Host { .. } => "host",
        FiberProps::Text(_) => "text",
        FiberProps::Component(_) => "component",
        FiberProps::Fragment(_) => "fragment",
    }
}

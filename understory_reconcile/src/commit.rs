// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The commit phase: applying a finished generation to the host tree.
//!
//! Mutations are applied in one synchronous pass over the fibers whose
//! bubbled flags demand it: deletions first (freeing slots as they go),
//! then each fiber's own placement and content updates, children before
//! parents. Effect cells encountered along the way are collected into the
//! root's passive buckets; they run only after every host mutation of the
//! commit is visible.
//!
//! The deferred flush itself runs cleanups before creates across the whole
//! batch: first every cleanup of unmounted components, then the
//! destroy/create pair of each re-rendered cell whose dependencies changed,
//! all destroys before all creates. Callbacks are taken out of their cells
//! before being invoked, so an effect dispatching new updates never
//! observes a held borrow.

use core::mem;

use crate::fiber::{FiberId, FiberKind, FiberProps};
use crate::flags::{EffectTags, FiberFlags};
use crate::hooks::Hook;
use crate::host::HostAdapter;
use crate::root::Root;
use crate::trace::ReconcileTrace;

impl<H: HostAdapter> Root<H> {
    /// Applies every pending mutation of the finished generation.
    pub(crate) fn commit(&mut self, finished: FiberId, trace: &mut dyn ReconcileTrace) {
        trace.commit_start();
        let mask = FiberFlags::MUTATION_MASK | FiberFlags::PASSIVE;
        let has_work = {
            let fiber = self.arena.get(finished);
            (fiber.flags | fiber.subtree_flags).intersects(mask)
        };
        if has_work {
            self.commit_over(finished, trace);
        }
        trace.commit_end();
    }

    /// Deletions, then children, then the fiber's own effects.
    fn commit_over(&mut self, fiber: FiberId, trace: &mut dyn ReconcileTrace) {
        let deletions = mem::take(&mut self.arena.get_mut(fiber).deletions);
        for deleted in deletions {
            self.commit_deletion(deleted, trace);
        }

        let mask = FiberFlags::MUTATION_MASK | FiberFlags::PASSIVE;
        if self.arena.get(fiber).subtree_flags.intersects(mask) {
            let mut cursor = self.arena.get(fiber).child;
            while let Some(child) = cursor {
                cursor = self.arena.get(child).sibling;
                self.commit_over(child, trace);
            }
        }

        let flags = self.arena.get(fiber).flags;
        if flags.contains(FiberFlags::PLACEMENT) {
            self.commit_placement(fiber, trace);
            self.arena.get_mut(fiber).flags -= FiberFlags::PLACEMENT;
        }
        if flags.contains(FiberFlags::CONTENT_UPDATE) {
            self.commit_content_update(fiber, trace);
            self.arena.get_mut(fiber).flags -= FiberFlags::CONTENT_UPDATE;
        }
        if flags.contains(FiberFlags::PASSIVE) {
            self.collect_passive_update(fiber);
        }
        self.arena.get_mut(fiber).flags -= FiberFlags::CHILD_DELETION;
    }

    /// Attaches the fiber's host subtree at its committed position.
    fn commit_placement(&mut self, fiber: FiberId, trace: &mut dyn ReconcileTrace) {
        trace.placement(self.arena.get(fiber).kind.name());
        let parent_node = self.host_parent_node(fiber);
        let before = self.host_sibling_node(fiber);
        self.place_node(fiber, &parent_node, before.as_ref());
    }

    /// The host node this fiber's subtree attaches into: the node of the
    /// nearest host ancestor, or the container at the root.
    fn host_parent_node(&self, fiber: FiberId) -> H::Node {
        let mut cursor = self.arena.get(fiber).parent;
        while let Some(parent) = cursor {
            let candidate = self.arena.get(parent);
            match &candidate.kind {
                FiberKind::Host(_) => {
                    return candidate
                        .host
                        .clone()
                        .expect("host ancestor committed without a node");
                }
                FiberKind::Root => return self.container.clone(),
                _ => cursor = candidate.parent,
            }
        }
        unreachable!("fiber detached from its root")
    }

    /// The first stable host node after `fiber` among its host-level
    /// siblings, to insert before. Subtrees that are themselves being
    /// placed this commit are skipped: their position is not settled yet.
    fn host_sibling_node(&self, fiber: FiberId) -> Option<H::Node> {
        let mut node = fiber;
        'siblings: loop {
            while self.arena.get(node).sibling.is_none() {
                let parent = self.arena.get(node).parent?;
                if matches!(
                    self.arena.get(parent).kind,
                    FiberKind::Host(_) | FiberKind::Root
                ) {
                    return None;
                }
                node = parent;
            }
            if let Some(sibling) = self.arena.get(node).sibling {
                node = sibling;
            }
            while !matches!(
                self.arena.get(node).kind,
                FiberKind::Host(_) | FiberKind::Text
            ) {
                if self.arena.get(node).flags.contains(FiberFlags::PLACEMENT) {
                    continue 'siblings;
                }
                match self.arena.get(node).child {
                    Some(child) => node = child,
                    None => continue 'siblings,
                }
            }
            if !self.arena.get(node).flags.contains(FiberFlags::PLACEMENT) {
                return self.arena.get(node).host.clone();
            }
        }
    }

    /// Inserts the nearest host descendants of `fiber` at the target
    /// position, looking through component and fragment fibers.
    fn place_node(&mut self, fiber: FiberId, parent: &H::Node, before: Option<&H::Node>) {
        let is_host = matches!(
            self.arena.get(fiber).kind,
            FiberKind::Host(_) | FiberKind::Text
        );
        if is_host {
            if let Some(node) = self.arena.get(fiber).host.clone() {
                match before {
                    Some(before) => self.host.insert_before(parent, &node, before),
                    None => self.host.append_child(parent, &node),
                }
            }
            return;
        }
        let mut cursor = self.arena.get(fiber).child;
        while let Some(child) = cursor {
            cursor = self.arena.get(child).sibling;
            self.place_node(child, parent, before);
        }
    }

    /// Rewrites a host node in place from the fiber's committed props.
    fn commit_content_update(&mut self, fiber: FiberId, trace: &mut dyn ReconcileTrace) {
        trace.content_update();
        let node = self
            .arena
            .get(fiber)
            .host
            .clone()
            .expect("content update on a fiber without a node");
        match self.arena.get(fiber).memoized_props.clone() {
            Some(FiberProps::Text(text)) => self.host.commit_text_update(&node, &text),
            Some(FiberProps::Host { attrs, .. }) => {
                self.host.commit_element_update(&node, &attrs);
            }
            _ => unreachable!("content update on a non-host fiber"),
        }
    }

    /// Queues the fiber's effect cells for the update-flavored flush.
    fn collect_passive_update(&mut self, fiber: FiberId) {
        for hook in &self.arena.get(fiber).hooks {
            if let Hook::Effect(cell) = hook {
                self.pending_passive.update.push(cell.clone());
            }
        }
    }

    /// Unmounts a deleted subtree: collects every cleanup, detaches its
    /// top-level host nodes, and frees both generations of its fibers.
    fn commit_deletion(&mut self, deleted: FiberId, trace: &mut dyn ReconcileTrace) {
        debug_assert!(
            self.arena.is_alive(deleted),
            "deletion list holds a released fiber"
        );
        trace.deletion(self.arena.get(deleted).kind.name());
        self.collect_passive_unmount(deleted);
        let parent_node = self.host_parent_node(deleted);
        self.remove_top_hosts(deleted, &parent_node);
        self.release_subtree(deleted);
    }

    /// Queues every effect cell in the subtree for the unmount-flavored
    /// flush, parents before children.
    fn collect_passive_unmount(&mut self, fiber: FiberId) {
        if matches!(self.arena.get(fiber).kind, FiberKind::Component(_)) {
            for hook in &self.arena.get(fiber).hooks {
                if let Hook::Effect(cell) = hook {
                    self.pending_passive.unmount.push(cell.clone());
                }
            }
        }
        let mut cursor = self.arena.get(fiber).child;
        while let Some(child) = cursor {
            cursor = self.arena.get(child).sibling;
            self.collect_passive_unmount(child);
        }
    }

    /// Detaches the nearest host descendants of a deleted fiber. Deeper
    /// host nodes go down with their parent; the adapter sees one removal
    /// per top-level node.
    fn remove_top_hosts(&mut self, fiber: FiberId, parent_node: &H::Node) {
        let is_host = matches!(
            self.arena.get(fiber).kind,
            FiberKind::Host(_) | FiberKind::Text
        );
        if is_host {
            if let Some(node) = self.arena.get(fiber).host.clone() {
                self.host.remove_child(parent_node, &node);
            }
            return;
        }
        let mut cursor = self.arena.get(fiber).child;
        while let Some(child) = cursor {
            cursor = self.arena.get(child).sibling;
            self.remove_top_hosts(child, parent_node);
        }
    }

    /// Frees a deleted subtree's fibers, both generations of each.
    fn release_subtree(&mut self, fiber: FiberId) {
        let mut cursor = self.arena.get(fiber).child;
        while let Some(child) = cursor {
            cursor = self.arena.get(child).sibling;
            self.release_subtree(child);
        }
        if let Some(alternate) = self.arena.get(fiber).alternate {
            self.arena.release(alternate);
        }
        self.arena.release(fiber);
    }

    /// Runs the deferred effects collected during commit.
    ///
    /// Ordering: every unmount cleanup, then every changed cell's cleanup,
    /// then every changed cell's create. A create's returned cleanup is
    /// stored back into its cell for the next flush or unmount.
    pub(crate) fn flush_passive(&mut self, trace: &mut dyn ReconcileTrace) {
        let unmount = mem::take(&mut self.pending_passive.unmount);
        let update = mem::take(&mut self.pending_passive.update);
        if unmount.is_empty() && update.is_empty() {
            return;
        }

        let mut destroyed = 0_usize;
        let mut created = 0_usize;

        for cell in &unmount {
            let destroy = {
                let mut cell = cell.borrow_mut();
                // A deleted component's create must never run.
                cell.tag -= EffectTags::HAS_EFFECT;
                cell.create = None;
                cell.destroy.take()
            };
            if let Some(destroy) = destroy {
                destroy();
                destroyed += 1;
            }
        }

        for cell in &update {
            let destroy = {
                let mut cell = cell.borrow_mut();
                if cell.tag.contains(EffectTags::HAS_EFFECT) {
                    cell.destroy.take()
                } else {
                    None
                }
            };
            if let Some(destroy) = destroy {
                destroy();
                destroyed += 1;
            }
        }

        for cell in &update {
            let create = {
                let mut cell = cell.borrow_mut();
                if cell.tag.contains(EffectTags::HAS_EFFECT) {
                    cell.tag -= EffectTags::HAS_EFFECT;
                    cell.create.take()
                } else {
                    None
                }
            };
            if let Some(create) = create {
                let destroy = create();
                cell.borrow_mut().destroy = destroy;
                created += 1;
            }
        }

        trace.passive_flush(destroyed, created);
    }
}

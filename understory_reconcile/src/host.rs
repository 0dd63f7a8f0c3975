// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The adapter seam between the reconciler and a concrete host tree.
//!
//! The reconciler never touches a real scene graph, DOM, or widget tree
//! directly. It computes minimal mutations and reports them through a
//! [`HostAdapter`], which owns node creation and attachment. Node handles
//! are an associated type so an adapter can use indices, `Rc` pointers, or
//! foreign handles as it sees fit; the reconciler only clones and compares
//! them.

use core::fmt;

use crate::element::Attrs;

/// Host-tree operations the commit phase is allowed to perform.
///
/// Creation happens during the completion phase, off-screen; attachment and
/// mutation happen during commit, parent-first and in sibling order, so an
/// adapter observing calls in sequence sees a consistent tree at every
/// step.
pub trait HostAdapter {
    /// Handle to one node in the host tree.
    ///
    /// Cloning must yield a handle to the same underlying node.
    type Node: Clone + PartialEq + fmt::Debug;

    /// Creates a detached element node of the given type.
    fn create_element(&mut self, ty: &str, attrs: &Attrs) -> Self::Node;

    /// Creates a detached text node.
    fn create_text(&mut self, text: &str) -> Self::Node;

    /// Attaches `child` as the last child of a node that is itself still
    /// detached. Called while a new subtree is being assembled, before any
    /// of it is visible.
    fn append_initial_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Attaches `child` as the last child of `parent` in the live tree.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Attaches `child` into `parent` immediately before `before`.
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, before: &Self::Node);

    /// Detaches `child` from `parent`. The subtree below `child` is
    /// abandoned wholesale; no per-descendant removal calls follow.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Replaces the content of a text node.
    fn commit_text_update(&mut self, node: &Self::Node, text: &str);

    /// Replaces the attributes of an element node.
    fn commit_element_update(&mut self, node: &Self::Node, attrs: &Attrs);
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Reconcile Reference Host.
//!
//! This crate provides a small, stateful implementation of
//! [`HostAdapter`] for **mutation recording and tree snapshots**.
//!
//! It is intentionally *not* a real presentation layer:
//! - It does **not** lay out, draw, or handle input.
//! - It exists so tests and debugging sessions can assert on the exact
//!   sequence of host mutations a commit performed, and on the resulting
//!   tree shape as a compact string.
//!
//! Nodes are numbered in creation order, which makes identity assertions
//! readable: if node `#3` survives an update, the committed tree reused it.

#![no_std]

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use understory_reconcile::{Attrs, HostAdapter, Root};

/// Handle to one node in the reference tree.
///
/// The wrapped number is the node's creation index, starting at 1;
/// 0 is the container itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RefNode(pub u32);

/// The container node of a [`RefHost`].
pub const CONTAINER: RefNode = RefNode(0);

#[derive(Clone, Debug)]
enum NodeContent {
    Element { ty: String, attrs: Attrs },
    Text(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    content: NodeContent,
    parent: Option<u32>,
    children: Vec<u32>,
}

/// An in-memory host tree that records every mutation applied to it.
#[derive(Clone, Debug)]
pub struct RefHost {
    nodes: HashMap<u32, NodeData>,
    next: u32,
    ops: Vec<String>,
}

impl Default for RefHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RefHost {
    /// Creates a host holding only the empty container.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            CONTAINER.0,
            NodeData {
                content: NodeContent::Element {
                    ty: String::from("#container"),
                    attrs: Attrs::new(),
                },
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            next: 0,
            ops: Vec::new(),
        }
    }

    /// Every mutation applied so far, in order, as readable strings.
    #[must_use]
    pub fn ops(&self) -> &[String] {
        &self.ops
    }

    /// Returns and clears the recorded mutations.
    pub fn take_ops(&mut self) -> Vec<String> {
        core::mem::take(&mut self.ops)
    }

    /// Number of nodes created so far, the container excluded.
    #[must_use]
    pub fn created(&self) -> u32 {
        self.next
    }

    /// The container's content as a compact markup string.
    ///
    /// Elements render as `<ty attr="v">...</ty>`, text renders bare, and
    /// the container renders its children only. Attributes appear in name
    /// order.
    #[must_use]
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        self.write_children(CONTAINER.0, &mut out);
        out
    }

    /// Child handles of `parent`, in tree order.
    #[must_use]
    pub fn children(&self, parent: RefNode) -> Vec<RefNode> {
        self.data(parent.0).children.iter().map(|&id| RefNode(id)).collect()
    }

    fn data(&self, id: u32) -> &NodeData {
        self.nodes.get(&id).expect("unknown reference node")
    }

    fn data_mut(&mut self, id: u32) -> &mut NodeData {
        self.nodes.get_mut(&id).expect("unknown reference node")
    }

    fn write_children(&self, id: u32, out: &mut String) {
        for &child in &self.data(id).children {
            self.write_node(child, out);
        }
    }

    fn write_node(&self, id: u32, out: &mut String) {
        match &self.data(id).content {
            NodeContent::Text(text) => out.push_str(text),
            NodeContent::Element { ty, attrs } => {
                out.push('<');
                out.push_str(ty);
                for (name, value) in attrs.iter() {
                    out.push_str(&format!(" {name}={value:?}"));
                }
                out.push('>');
                self.write_children(id, out);
                out.push_str(&format!("</{ty}>"));
            }
        }
    }

    fn alloc(&mut self, content: NodeContent) -> RefNode {
        self.next += 1;
        let id = self.next;
        self.nodes.insert(
            id,
            NodeData {
                content,
                parent: None,
                children: Vec::new(),
            },
        );
        RefNode(id)
    }

    /// Unlinks `child` from its current parent, if it has one.
    fn detach(&mut self, child: u32) {
        if let Some(parent) = self.data(child).parent {
            self.data_mut(parent).children.retain(|&id| id != child);
            self.data_mut(child).parent = None;
        }
    }

    fn attach(&mut self, parent: u32, child: u32, index: Option<usize>) {
        self.detach(child);
        self.data_mut(child).parent = Some(parent);
        let children = &mut self.data_mut(parent).children;
        match index {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
    }

    fn drop_subtree(&mut self, id: u32) {
        if let Some(data) = self.nodes.remove(&id) {
            for child in data.children {
                self.drop_subtree(child);
            }
        }
    }
}

impl HostAdapter for RefHost {
    type Node = RefNode;

    fn create_element(&mut self, ty: &str, attrs: &Attrs) -> RefNode {
        let node = self.alloc(NodeContent::Element {
            ty: String::from(ty),
            attrs: attrs.clone(),
        });
        self.ops.push(format!("create <{ty}> #{}", node.0));
        node
    }

    fn create_text(&mut self, text: &str) -> RefNode {
        let node = self.alloc(NodeContent::Text(String::from(text)));
        self.ops.push(format!("create {text:?} #{}", node.0));
        node
    }

    fn append_initial_child(&mut self, parent: &RefNode, child: &RefNode) {
        // Offscreen assembly is not an observable mutation.
        self.attach(parent.0, child.0, None);
    }

    fn append_child(&mut self, parent: &RefNode, child: &RefNode) {
        self.ops.push(format!("append #{} into #{}", child.0, parent.0));
        self.attach(parent.0, child.0, None);
    }

    fn insert_before(&mut self, parent: &RefNode, child: &RefNode, before: &RefNode) {
        self.ops.push(format!(
            "insert #{} into #{} before #{}",
            child.0, parent.0, before.0
        ));
        self.detach(child.0);
        let index = self
            .data(parent.0)
            .children
            .iter()
            .position(|&id| id == before.0)
            .expect("anchor is not a child of the target parent");
        self.attach(parent.0, child.0, Some(index));
    }

    fn remove_child(&mut self, parent: &RefNode, child: &RefNode) {
        self.ops.push(format!("remove #{} from #{}", child.0, parent.0));
        assert_eq!(
            self.data(child.0).parent,
            Some(parent.0),
            "removal from a parent the child is not attached to"
        );
        self.detach(child.0);
        self.drop_subtree(child.0);
    }

    fn commit_text_update(&mut self, node: &RefNode, text: &str) {
        self.ops.push(format!("retext #{} to {text:?}", node.0));
        match &mut self.data_mut(node.0).content {
            NodeContent::Text(content) => *content = String::from(text),
            NodeContent::Element { .. } => panic!("text update on an element node"),
        }
    }

    fn commit_element_update(&mut self, node: &RefNode, attrs: &Attrs) {
        self.ops.push(format!("restyle #{}", node.0));
        match &mut self.data_mut(node.0).content {
            NodeContent::Element { attrs: content, .. } => *content = attrs.clone(),
            NodeContent::Text(_) => panic!("attribute update on a text node"),
        }
    }
}

/// A root mounted on a fresh [`RefHost`] container.
#[must_use]
pub fn new_root() -> Root<RefHost> {
    Root::new(RefHost::new(), CONTAINER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_renders_markup() {
        let mut host = RefHost::new();
        let mut attrs = Attrs::new();
        attrs.set("id", "x");
        let div = host.create_element("div", &attrs);
        let hi = host.create_text("hi");
        host.append_initial_child(&div, &hi);
        host.append_child(&CONTAINER, &div);
        assert_eq!(host.snapshot(), "<div id=\"x\">hi</div>");
    }

    #[test]
    fn insert_before_reorders() {
        let mut host = RefHost::new();
        let a = host.create_text("a");
        let b = host.create_text("b");
        host.append_child(&CONTAINER, &a);
        host.append_child(&CONTAINER, &b);
        host.insert_before(&CONTAINER, &b, &a);
        assert_eq!(host.snapshot(), "ba");
    }

    #[test]
    fn removal_drops_the_subtree() {
        let mut host = RefHost::new();
        let div = host.create_element("div", &Attrs::new());
        let hi = host.create_text("hi");
        host.append_initial_child(&div, &hi);
        host.append_child(&CONTAINER, &div);
        host.remove_child(&CONTAINER, &div);
        assert_eq!(host.snapshot(), "");
        assert!(!host.nodes.contains_key(&hi.0));
    }
}

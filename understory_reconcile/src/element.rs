// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative component-tree descriptions.
//!
//! An [`Element`] describes one position in the desired tree: a host
//! element (rendered through the host adapter), a text run, a function
//! component, or a keyed fragment. Elements are plain values; the
//! reconciler diffs a new description against the previously committed
//! fiber tree to derive minimal host mutations.
//!
//! Construction is builder-flavored:
//!
//! ```
//! use understory_reconcile::Element;
//!
//! let description: Element = Element::host("div")
//!     .attr("id", "greeting")
//!     .child("hello")
//!     .into();
//! ```

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::hooks::HookCx;
use crate::value::ErasedValue;

/// Stable identity of a child across reorders of its sibling list.
///
/// Children without an explicit key are matched positionally.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(Cow<'static, str>);

impl Key {
    /// Creates a key from a string-like value.
    #[must_use]
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Key {
    fn from(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(Cow::Owned(key))
    }
}

impl From<u64> for Key {
    fn from(key: u64) -> Self {
        Self(Cow::Owned(key.to_string()))
    }
}

/// Inline capacity for attribute entries.
///
/// Host elements rarely carry more than a handful of attributes, so the
/// common case stays off the heap.
const ATTRS_INLINE: usize = 4;

/// Host-element attributes, sorted by name for binary-search lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attrs {
    entries: SmallVec<[(Cow<'static, str>, Cow<'static, str>); ATTRS_INLINE]>,
}

impl Attrs {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of attributes set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sets an attribute, replacing any previous value under the same name.
    pub fn set(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) {
        let name = name.into();
        let value = value.into();
        match self.entries.binary_search_by(|(n, _)| n.cmp(&name)) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (name, value)),
        }
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .binary_search_by(|(n, _)| n.as_ref().cmp(name))
            .ok()
            .map(|idx| self.entries[idx].1.as_ref())
    }

    /// Iterates attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_ref(), v.as_ref()))
    }
}

/// A named function component.
///
/// Identity (for type matching during reconciliation) is the function
/// pointer itself; the name is carried for diagnostics. Two generations of
/// the same logical component must therefore be described by the same `fn`
/// item, which is the natural way to write components anyway.
#[derive(Clone, Copy)]
pub struct ComponentFn {
    name: &'static str,
    render: fn(&mut HookCx, &ErasedValue) -> Element,
}

impl ComponentFn {
    /// Wraps a component function with its diagnostic name.
    #[must_use]
    pub const fn new(
        name: &'static str,
        render: fn(&mut HookCx, &ErasedValue) -> Element,
    ) -> Self {
        Self { name, render }
    }

    /// The component's diagnostic name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    pub(crate) fn invoke(self, cx: &mut HookCx, props: &ErasedValue) -> Element {
        (self.render)(cx, props)
    }
}

impl PartialEq for ComponentFn {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::fn_addr_eq(self.render, other.render)
    }
}

impl Eq for ComponentFn {}

impl fmt::Debug for ComponentFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFn").field("name", &self.name).finish()
    }
}

/// One node of a declarative tree description.
#[derive(Clone, Debug)]
pub enum Element {
    /// A host element, realized as a node in the external host tree.
    Host(HostElement),
    /// A text run, realized as a host text node.
    Text(TextElement),
    /// A function component; its child description is produced by invoking
    /// the component under the state-cell runtime.
    Component(ComponentElement),
    /// A keyed grouping with no host node of its own.
    Fragment(FragmentElement),
}

impl Element {
    /// Starts a host-element description.
    #[must_use]
    pub fn host(ty: impl Into<Cow<'static, str>>) -> HostElement {
        HostElement {
            ty: ty.into(),
            key: None,
            attrs: Attrs::new(),
            children: Vec::new(),
        }
    }

    /// A text description.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextElement { text: text.into() })
    }

    /// Starts a function-component description.
    #[must_use]
    pub fn component<P: Clone + 'static>(func: ComponentFn, props: P) -> ComponentElement {
        ComponentElement {
            func,
            key: None,
            props: ErasedValue::new(props),
        }
    }

    /// Starts a fragment description.
    #[must_use]
    pub fn fragment(children: impl IntoIterator<Item = Element>) -> FragmentElement {
        FragmentElement {
            key: None,
            children: children.into_iter().collect(),
        }
    }

    /// The explicit key of this description, if any.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::Host(host) => host.key.as_ref(),
            Self::Text(_) => None,
            Self::Component(component) => component.key.as_ref(),
            Self::Fragment(fragment) => fragment.key.as_ref(),
        }
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

/// A host-element description under construction.
#[derive(Clone, Debug)]
pub struct HostElement {
    /// Host element type tag (for a document host, the element name).
    pub ty: Cow<'static, str>,
    /// Explicit child identity.
    pub key: Option<Key>,
    /// Host attributes.
    pub attrs: Attrs,
    /// Child descriptions.
    pub children: Vec<Element>,
}

impl HostElement {
    /// Sets the key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.attrs.set(name, value);
        self
    }

    /// Appends a child description.
    #[must_use]
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends several child descriptions.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }
}

impl From<HostElement> for Element {
    fn from(host: HostElement) -> Self {
        Self::Host(host)
    }
}

/// A text description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextElement {
    /// The text content.
    pub text: String,
}

/// A function-component description.
#[derive(Clone, Debug)]
pub struct ComponentElement {
    /// The component function.
    pub func: ComponentFn,
    /// Explicit child identity.
    pub key: Option<Key>,
    /// Type-erased props passed to the component on each render.
    pub props: ErasedValue,
}

impl ComponentElement {
    /// Sets the key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl From<ComponentElement> for Element {
    fn from(component: ComponentElement) -> Self {
        Self::Component(component)
    }
}

/// A fragment description.
#[derive(Clone, Debug)]
pub struct FragmentElement {
    /// Explicit child identity.
    pub key: Option<Key>,
    /// Child descriptions.
    pub children: Vec<Element>,
}

impl FragmentElement {
    /// Sets the key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl From<FragmentElement> for Element {
    fn from(fragment: FragmentElement) -> Self {
        Self::Fragment(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attrs_sorted_and_replaced() {
        let mut attrs = Attrs::new();
        attrs.set("id", "a");
        attrs.set("class", "x");
        attrs.set("id", "b");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("id"), Some("b"));
        let names: alloc::vec::Vec<_> = attrs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["class", "id"]);
    }

    #[test]
    fn builder_shapes() {
        let el: Element = Element::host("ul")
            .key("list")
            .child(Element::host("li").key("a").child("one"))
            .child(Element::host("li").key("b").child("two"))
            .into();
        let Element::Host(host) = el else {
            panic!("expected host element");
        };
        assert_eq!(host.ty, "ul");
        assert_eq!(host.key.as_ref().map(Key::as_str), Some("list"));
        assert_eq!(host.children.len(), 2);
    }

    #[test]
    fn component_identity_is_the_function() {
        fn a(_: &mut HookCx, _: &ErasedValue) -> Element {
            Element::text("a")
        }
        fn b(_: &mut HookCx, _: &ErasedValue) -> Element {
            Element::text("b")
        }
        let fa = ComponentFn::new("A", a);
        let fa2 = ComponentFn::new("A again", a);
        let fb = ComponentFn::new("B", b);
        assert_eq!(fa, fa2);
        assert_ne!(fa, fb);
    }
}

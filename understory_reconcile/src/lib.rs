// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Reconcile: an incremental component-tree reconciliation
//! runtime.
//!
//! The crate turns declarative tree descriptions ([`Element`]) into minimal
//! mutations on an external host tree, reached only through a [`HostAdapter`].
//! Embedders describe what the tree should look like; the reconciler works
//! out placements, in-place content updates, and removals by diffing against
//! the previously committed generation.
//!
//! The moving parts:
//!
//! - **Descriptions** ([`Element`], [`ComponentFn`]): Cheap, cloneable trees
//!   of host elements, text runs, function components, and keyed fragments.
//! - **The root** ([`Root`]): Owns the committed tree, the host adapter, and
//!   the flush loop. Updates queue; nothing renders until [`Root::flush`],
//!   so consecutive updates batch into one pass.
//! - **State cells** ([`HookCx::use_state`], [`StateHandle`]): Per-component
//!   persistent state with a stable dispatch handle usable from event
//!   callbacks and effects.
//! - **Deferred effects** ([`HookCx::use_effect`], [`Deps`]): Side effects
//!   that run after commit, gated on dependency snapshots, with cleanups
//!   running before creates across the whole batch.
//! - **Lanes** ([`Lanes`]): Priority bitset carried by every queued update,
//!   so a render pass can drain some updates and defer the rest.
//! - **Tracing** ([`ReconcileTrace`], [`EventRecorder`]): An additive
//!   callback sink over render, commit, and effect flushing, for tests and
//!   embedder diagnostics.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_reconcile::{ComponentFn, Element, ErasedValue, HookCx, Root};
//! # use understory_reconcile::{Attrs, HostAdapter};
//! # #[derive(Default)]
//! # struct NullHost(u32);
//! # impl HostAdapter for NullHost {
//! #     type Node = u32;
//! #     fn create_element(&mut self, _: &str, _: &Attrs) -> u32 { self.0 += 1; self.0 }
//! #     fn create_text(&mut self, _: &str) -> u32 { self.0 += 1; self.0 }
//! #     fn append_initial_child(&mut self, _: &u32, _: &u32) {}
//! #     fn append_child(&mut self, _: &u32, _: &u32) {}
//! #     fn insert_before(&mut self, _: &u32, _: &u32, _: &u32) {}
//! #     fn remove_child(&mut self, _: &u32, _: &u32) {}
//! #     fn commit_text_update(&mut self, _: &u32, _: &str) {}
//! #     fn commit_element_update(&mut self, _: &u32, _: &Attrs) {}
//! # }
//!
//! fn counter(cx: &mut HookCx, _props: &ErasedValue) -> Element {
//!     let (count, _handle) = cx.use_state(|| 0_i32);
//!     Element::host("button")
//!         .child(format!("clicked {count} times"))
//!         .into()
//! }
//! const COUNTER: ComponentFn = ComponentFn::new("Counter", counter);
//!
//! let mut root = Root::new(NullHost::default(), 0);
//! root.render(Element::component(COUNTER, ()));
//! root.flush();
//! ```
//!
//! ## Phases
//!
//! A flush iterates render passes until quiescent. Each pass builds a fresh
//! work-in-progress generation linked to the committed one through per-fiber
//! alternates (so state survives and host nodes are reused), commits the
//! resulting mutations in one synchronous batch, swaps the committed
//! pointer, and then flushes deferred effects. Effects may dispatch more
//! updates; those start another pass within the same flush.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod begin;
mod commit;
mod complete;
mod diff;
mod element;
mod fiber;
mod flags;
mod hooks;
mod host;
mod lane;
mod root;
mod trace;
mod update;
mod util;
mod value;

pub use element::{
    Attrs, ComponentElement, ComponentFn, Element, FragmentElement, HostElement, Key, TextElement,
};
pub use hooks::{Cleanup, Dep, Deps, HookCx, StateHandle, cleanup};
pub use host::HostAdapter;
pub use lane::Lanes;
pub use root::{Root, SchedulerHandle};
pub use trace::{EventRecorder, NoTrace, ReconcileTrace, TraceEvent};
pub use value::ErasedValue;

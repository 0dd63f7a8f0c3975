// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end reconciliation behavior against the reference host.

use std::cell::RefCell;
use std::rc::Rc;

use understory_reconcile::{
    cleanup, ComponentFn, Dep, Deps, Element, ErasedValue, EventRecorder, HookCx, StateHandle,
};
use understory_reconcile_ref::new_root;

type Log = Rc<RefCell<Vec<String>>>;

#[test]
fn mount_builds_the_described_tree() {
    let mut root = new_root();
    root.render(
        Element::host("ul")
            .attr("class", "menu")
            .child(Element::host("li").child("one"))
            .child(Element::host("li").child("two")),
    );
    root.flush();
    assert_eq!(
        root.host().snapshot(),
        "<ul class=\"menu\"><li>one</li><li>two</li></ul>"
    );
    // A fresh mount is assembled off-screen and attached once, at the top.
    let appends = root
        .host()
        .ops()
        .iter()
        .filter(|op| op.starts_with("append"))
        .count();
    assert_eq!(appends, 1);
}

fn counter(cx: &mut HookCx, props: &ErasedValue) -> Element {
    let slot = props
        .downcast_ref::<Rc<RefCell<Option<StateHandle<i64>>>>>()
        .unwrap()
        .clone();
    let (count, handle) = cx.use_state(|| 100_i64);
    *slot.borrow_mut() = Some(handle);
    Element::host("div").child(format!("{count}")).into()
}

const COUNTER: ComponentFn = ComponentFn::new("Counter", counter);

#[test]
fn state_updates_batch_into_one_pass_and_rewrite_in_place() {
    let slot: Rc<RefCell<Option<StateHandle<i64>>>> = Rc::default();
    let mut root = new_root();
    root.render(Element::component(COUNTER, slot.clone()));
    root.flush();
    assert_eq!(root.host().snapshot(), "<div>100</div>");
    let created = root.host().created();

    let handle = slot.borrow().clone().unwrap();
    handle.update(|n| n + 1);
    handle.update(|n| n + 1);
    handle.set(100);
    handle.update(|n| n + 3);

    let mut rec = EventRecorder::new();
    root.flush_with_trace(&mut rec);
    assert_eq!(rec.render_passes(), 1, "queued dispatches share one pass");
    assert_eq!(root.host().snapshot(), "<div>103</div>");
    assert_eq!(root.host().created(), created, "no host nodes recreated");
    assert!(root.host().ops().iter().any(|op| op.starts_with("retext")));
}

fn effectful(cx: &mut HookCx, props: &ErasedValue) -> Element {
    let (log, name, epoch) = props
        .downcast_ref::<(Log, &'static str, i64)>()
        .unwrap()
        .clone();
    cx.use_effect(Deps::list([Dep::from(epoch)]), {
        let log = log.clone();
        move || {
            log.borrow_mut().push(format!("{name}.create"));
            cleanup(move || log.borrow_mut().push(format!("{name}.destroy")))
        }
    });
    Element::text(name)
}

const EFFECTFUL: ComponentFn = ComponentFn::new("Effectful", effectful);

fn pair(log: &Log, epoch: i64) -> Element {
    Element::host("div")
        .child(Element::component(EFFECTFUL, (log.clone(), "a", epoch)).key("a"))
        .child(Element::component(EFFECTFUL, (log.clone(), "b", epoch)).key("b"))
        .into()
}

#[test]
fn cleanups_run_before_creates_across_the_whole_batch() {
    let log: Log = Rc::default();
    let mut root = new_root();
    root.render(pair(&log, 0));
    root.flush();
    assert_eq!(*log.borrow(), ["a.create", "b.create"]);

    log.borrow_mut().clear();
    root.render(pair(&log, 1));
    root.flush();
    assert_eq!(
        *log.borrow(),
        ["a.destroy", "b.destroy", "a.create", "b.create"]
    );
}

#[test]
fn effects_skip_when_deps_are_unchanged() {
    let log: Log = Rc::default();
    let mut root = new_root();
    root.render(pair(&log, 7));
    root.flush();
    log.borrow_mut().clear();

    root.render(pair(&log, 7));
    root.flush();
    assert!(log.borrow().is_empty());
}

#[test]
fn unmount_runs_every_cleanup_and_empties_the_container() {
    let log: Log = Rc::default();
    let mut root = new_root();
    root.render(pair(&log, 0));
    root.flush();
    log.borrow_mut().clear();

    root.unmount();
    root.flush();
    assert_eq!(*log.borrow(), ["a.destroy", "b.destroy"]);
    assert_eq!(root.host().snapshot(), "");
}

fn wrapper(cx: &mut HookCx, props: &ErasedValue) -> Element {
    let (log, epoch) = props.downcast_ref::<(Log, i64)>().unwrap().clone();
    cx.use_effect(Deps::ONCE, {
        let log = log.clone();
        move || {
            log.borrow_mut().push("w.create".into());
            cleanup(move || log.borrow_mut().push("w.destroy".into()))
        }
    });
    Element::component(EFFECTFUL, (log, "inner", epoch)).into()
}

const WRAPPER: ComponentFn = ComponentFn::new("Wrapper", wrapper);

#[test]
fn deleting_a_subtree_unmounts_nested_components() {
    let log: Log = Rc::default();
    let mut root = new_root();
    root.render(Element::host("div").child(Element::component(WRAPPER, (log.clone(), 0_i64))));
    root.flush();
    // Mount effects fire children before parents.
    assert_eq!(*log.borrow(), ["inner.create", "w.create"]);

    log.borrow_mut().clear();
    root.render(Element::host("div").child("done"));
    root.flush();
    // Unmount cleanups fire parents before children, and fire even though
    // the dependencies never changed.
    assert_eq!(*log.borrow(), ["w.destroy", "inner.destroy"]);
    assert_eq!(root.host().snapshot(), "<div>done</div>");
}

fn keyed_list(keys: &[&'static str]) -> Element {
    Element::host("ul")
        .children(
            keys.iter()
                .map(|&k| Element::host("li").key(k).child(k).into()),
        )
        .into()
}

#[test]
fn keyed_reorder_moves_nodes_instead_of_recreating() {
    let mut root = new_root();
    root.render(keyed_list(&["a", "b", "c", "d"]));
    root.flush();
    let created = root.host().created();
    let before = root.host().ops().len();

    root.render(keyed_list(&["d", "a", "b", "c"]));
    root.flush();
    assert_eq!(root.host().created(), created, "all four items reused");
    let new_ops = &root.host().ops()[before..];
    // Rotating one item to the front is a single move.
    assert_eq!(new_ops.len(), 1, "ops: {new_ops:?}");
    assert!(new_ops[0].starts_with("insert"));
    assert_eq!(
        root.host().snapshot(),
        "<ul><li>d</li><li>a</li><li>b</li><li>c</li></ul>"
    );
}

#[test]
fn removed_keys_detach_only_their_subtree() {
    let mut root = new_root();
    root.render(keyed_list(&["a", "b", "c"]));
    root.flush();
    let before = root.host().ops().len();

    root.render(keyed_list(&["a", "c"]));
    root.flush();
    let new_ops = &root.host().ops()[before..];
    assert_eq!(new_ops.len(), 1, "ops: {new_ops:?}");
    assert!(new_ops[0].starts_with("remove"));
    assert_eq!(root.host().snapshot(), "<ul><li>a</li><li>c</li></ul>");
}

fn auto(cx: &mut HookCx, _props: &ErasedValue) -> Element {
    let (n, handle) = cx.use_state(|| 0_i64);
    cx.use_effect(Deps::ONCE, move || {
        handle.set(5);
        None
    });
    Element::text(format!("{n}"))
}

const AUTO: ComponentFn = ComponentFn::new("Auto", auto);

#[test]
fn a_dispatch_from_an_effect_settles_within_the_same_flush() {
    let mut root = new_root();
    let mut rec = EventRecorder::new();
    root.render(Element::component(AUTO, ()));
    root.flush_with_trace(&mut rec);
    assert_eq!(rec.render_passes(), 2);
    assert_eq!(root.host().snapshot(), "5");
}

#[test]
fn attribute_changes_rewrite_in_place() {
    let mut root = new_root();
    root.render(Element::host("div").attr("class", "old").child("x"));
    root.flush();
    let created = root.host().created();

    root.render(Element::host("div").attr("class", "new").child("x"));
    root.flush();
    assert_eq!(root.host().created(), created);
    assert_eq!(root.host().snapshot(), "<div class=\"new\">x</div>");
    assert!(root.host().ops().iter().any(|op| op.starts_with("restyle")));
}

fn toggler(cx: &mut HookCx, props: &ErasedValue) -> Element {
    let slot = props
        .downcast_ref::<Rc<RefCell<Option<StateHandle<bool>>>>>()
        .unwrap()
        .clone();
    let (on, handle) = cx.use_state(|| true);
    *slot.borrow_mut() = Some(handle);
    let mut div = Element::host("div").child("head");
    if on {
        div = div.child(Element::host("em").child("tail"));
    }
    div.into()
}

const TOGGLER: ComponentFn = ComponentFn::new("Toggler", toggler);

#[test]
fn conditional_children_come_and_go() {
    let slot: Rc<RefCell<Option<StateHandle<bool>>>> = Rc::default();
    let mut root = new_root();
    root.render(Element::component(TOGGLER, slot.clone()));
    root.flush();
    assert_eq!(root.host().snapshot(), "<div>head<em>tail</em></div>");

    let handle = slot.borrow().clone().unwrap();
    handle.set(false);
    root.flush();
    assert_eq!(root.host().snapshot(), "<div>head</div>");

    let handle = slot.borrow().clone().unwrap();
    handle.set(true);
    root.flush();
    assert_eq!(root.host().snapshot(), "<div>head<em>tail</em></div>");
}

fn fragment_list(cx: &mut HookCx, props: &ErasedValue) -> Element {
    let n = *props.downcast_ref::<i64>().unwrap();
    let _ = cx;
    Element::fragment((0..n).map(|i| Element::host("li").child(format!("{i}")).into())).into()
}

const FRAGMENT_LIST: ComponentFn = ComponentFn::new("FragmentList", fragment_list);

#[test]
fn fragments_attach_to_the_nearest_host_ancestor() {
    let mut root = new_root();
    root.render(Element::host("ul").child(Element::component(FRAGMENT_LIST, 2_i64)));
    root.flush();
    assert_eq!(root.host().snapshot(), "<ul><li>0</li><li>1</li></ul>");

    root.render(Element::host("ul").child(Element::component(FRAGMENT_LIST, 3_i64)));
    root.flush();
    assert_eq!(
        root.host().snapshot(),
        "<ul><li>0</li><li>1</li><li>2</li></ul>"
    );
}

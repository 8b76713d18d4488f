use reactive_cells::{computed::Memo, prelude::*, signal::RwSignal};
use std::sync::{Arc, RwLock};

#[test]
fn memo_calculates_value() {
    let a = RwSignal::new(1);
    let b = RwSignal::new(2);
    let c = RwSignal::new(3);

    let d = Memo::new({
        let (a, b, c) = (a.clone(), b.clone(), c.clone());
        move |_| a.get() + b.get() + c.get()
    });
    assert_eq!(d.get(), 6);
    assert_eq!(d.with_untracked(|n| *n), 6);
    assert_eq!(d.with(|n| *n), 6);
    assert_eq!(d.get_untracked(), 6);
}

#[test]
fn memo_doesnt_repeat_calculation_per_get() {
    let calculations = Arc::new(RwLock::new(0));

    let a = RwSignal::new(1);
    let b = RwSignal::new(2);
    let c = RwSignal::new(3);

    let d = Memo::new({
        let calculations = Arc::clone(&calculations);
        let (a, b, c) = (a.clone(), b.clone(), c.clone());
        move |_| {
            *calculations.write().unwrap() += 1;
            a.get() + b.get() + c.get()
        }
    });
    assert_eq!(d.get_untracked(), 6);
    assert_eq!(d.get_untracked(), 6);
    assert_eq!(d.get_untracked(), 6);
    assert_eq!(*calculations.read().unwrap(), 1);

    a.set(0);
    assert_eq!(d.get_untracked(), 5);
    assert_eq!(*calculations.read().unwrap(), 2);
}

#[test]
fn memo_writes_are_lazy() {
    let calculations = Arc::new(RwLock::new(0));

    let a = RwSignal::new(1);
    let d = Memo::new({
        let calculations = Arc::clone(&calculations);
        let a = a.clone();
        move |_| {
            *calculations.write().unwrap() += 1;
            a.get() * 10
        }
    });

    // nothing runs until the first read
    assert_eq!(*calculations.read().unwrap(), 0);
    a.set(2);
    a.set(3);
    assert_eq!(*calculations.read().unwrap(), 0);

    assert_eq!(d.get_untracked(), 30);
    assert_eq!(*calculations.read().unwrap(), 1);
}

#[test]
fn nested_memos() {
    let a = RwSignal::new(0);
    let b = RwSignal::new(0);
    let c = Memo::new({
        let (a, b) = (a.clone(), b.clone());
        move |_| a.get() + b.get()
    });
    let d = Memo::new({
        let c = c.clone();
        move |_| c.get() * 2
    });
    let e = Memo::new({
        let d = d.clone();
        move |_| d.get() + 1
    });
    assert_eq!(e.get_untracked(), 1);
    assert_eq!(d.get_untracked(), 0);
    assert_eq!(c.get_untracked(), 0);

    a.set(5);
    assert_eq!(c.get_untracked(), 5);
    assert_eq!(d.get_untracked(), 10);
    assert_eq!(e.get_untracked(), 11);

    b.set(1);
    assert_eq!(e.get_untracked(), 13);
}

#[test]
fn dropped_dependencies_stop_invalidating() {
    let calculations = Arc::new(RwLock::new(0));

    let use_fallback = RwSignal::new(false);
    let primary = RwSignal::new(10);
    let fallback = RwSignal::new(100);

    let value = Memo::new({
        let calculations = Arc::clone(&calculations);
        let (use_fallback, primary, fallback) =
            (use_fallback.clone(), primary.clone(), fallback.clone());
        move |_| {
            *calculations.write().unwrap() += 1;
            if use_fallback.get() {
                fallback.get()
            } else {
                primary.get()
            }
        }
    });

    assert_eq!(value.get_untracked(), 10);
    assert_eq!(*calculations.read().unwrap(), 1);

    // the fallback branch was never read, so writing it is invisible
    fallback.set(200);
    assert_eq!(value.get_untracked(), 10);
    assert_eq!(*calculations.read().unwrap(), 1);

    use_fallback.set(true);
    assert_eq!(value.get_untracked(), 200);
    assert_eq!(*calculations.read().unwrap(), 2);

    // and now the primary branch is the dead one
    primary.set(20);
    assert_eq!(value.get_untracked(), 200);
    assert_eq!(*calculations.read().unwrap(), 2);
}

#[test]
fn unchanged_memo_does_not_propagate() {
    let calculations = Arc::new(RwLock::new(0));

    let a = RwSignal::new(1);
    let is_positive = Memo::new({
        let a = a.clone();
        move |_| a.get() > 0
    });
    let label = Memo::new({
        let calculations = Arc::clone(&calculations);
        let is_positive = is_positive.clone();
        move |_| {
            *calculations.write().unwrap() += 1;
            if is_positive.get() { "positive" } else { "negative" }
        }
    });

    assert_eq!(label.get_untracked(), "positive");
    assert_eq!(*calculations.read().unwrap(), 1);

    // 1 -> 2 recomputes is_positive but leaves it equal, so label's cache
    // stays valid
    a.set(2);
    assert_eq!(label.get_untracked(), "positive");
    assert_eq!(*calculations.read().unwrap(), 1);

    a.set(-1);
    assert_eq!(label.get_untracked(), "negative");
    assert_eq!(*calculations.read().unwrap(), 2);
}

#[test]
fn memo_receives_previous_value() {
    let a = RwSignal::new(1);
    let history = Memo::new({
        let a = a.clone();
        move |prev: Option<&Vec<i32>>| {
            let mut all = prev.cloned().unwrap_or_default();
            all.push(a.get());
            all
        }
    });

    assert_eq!(history.get_untracked(), vec![1]);
    a.set(2);
    assert_eq!(history.get_untracked(), vec![1, 2]);
}

//! The dependency graph connecting reactive nodes.
//!
//! Every reactive primitive is a node in a graph of sources (signals, memos,
//! resource cells) and subscribers (memos, effects, resource drivers).
//! Sources remember who observes them; subscribers remember what they read
//! during their latest run. Both sides are rebuilt from actual reads on every
//! run, so a subscriber that stops reading a source stops being notified by
//! it.

use core::fmt::Debug;
use std::{cell::RefCell, hash::Hash, mem, slice, sync::Weak, vec::IntoIter};

/// Where a node stands relative to its sources since it last ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReactiveNodeState {
    /// The cached value is up to date.
    Clean,
    /// A transitive source may have changed; sources must be polled.
    Check,
    /// A direct source has changed; the node must rerun.
    Dirty,
}

/// Change propagation, implemented by every node in the graph.
pub trait ReactiveNode {
    /// Notifies this node that a direct source has changed.
    fn mark_dirty(&self);

    /// Notifies this node that a transitive source may have changed.
    fn mark_check(&self);

    /// Marks all subscribers of this node as needing to check their sources.
    fn mark_subscribers_check(&self);

    /// Brings this node up to date, returning whether its value actually
    /// changed.
    fn update_if_necessary(&self) -> bool;
}

/// A node whose changes can be observed: a signal, memo, or resource cell.
pub trait Source: ReactiveNode {
    /// Adds a subscriber to this source's list of observers.
    fn add_subscriber(&self, subscriber: AnySubscriber);

    /// Removes a subscriber from this source's list of observers.
    fn remove_subscriber(&self, subscriber: &AnySubscriber);

    /// Removes all subscribers from this source's list of observers.
    fn clear_subscribers(&self);
}

/// Conversion into a type-erased [`AnySource`].
pub trait ToAnySource {
    /// Converts this type to its type-erased equivalent.
    fn to_any_source(&self) -> AnySource;
}

/// A node that records reads from other nodes: a memo, an effect, or a
/// resource driver.
pub trait Subscriber: ReactiveNode {
    /// Records a source read during this subscriber's latest run.
    fn add_source(&self, source: AnySource);

    /// Drops every recorded source, unsubscribing from each.
    fn clear_sources(&self, subscriber: &AnySubscriber);
}

/// Conversion into a type-erased [`AnySubscriber`].
pub trait ToAnySubscriber {
    /// Converts this type to its type-erased equivalent.
    fn to_any_subscriber(&self) -> AnySubscriber;
}

/// A type-erased, weakly-held [`Source`].
///
/// The `usize` is the address of the underlying allocation and serves as the
/// node's identity. Holding the node weakly means a dropped node silently
/// falls out of the graph instead of keeping itself alive through its edges.
#[derive(Clone)]
pub struct AnySource(
    pub(crate) usize,
    pub(crate) Weak<dyn Source + Send + Sync>,
);

impl Debug for AnySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnySource").field(&self.0).finish()
    }
}

impl Hash for AnySource {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq for AnySource {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for AnySource {}

impl ReactiveNode for AnySource {
    fn mark_dirty(&self) {
        if let Some(inner) = self.1.upgrade() {
            inner.mark_dirty()
        }
    }

    fn mark_check(&self) {
        if let Some(inner) = self.1.upgrade() {
            inner.mark_check()
        }
    }

    fn mark_subscribers_check(&self) {
        if let Some(inner) = self.1.upgrade() {
            inner.mark_subscribers_check()
        }
    }

    fn update_if_necessary(&self) -> bool {
        if let Some(inner) = self.1.upgrade() {
            inner.update_if_necessary()
        } else {
            false
        }
    }
}

impl Source for AnySource {
    fn add_subscriber(&self, subscriber: AnySubscriber) {
        if let Some(inner) = self.1.upgrade() {
            inner.add_subscriber(subscriber)
        }
    }

    fn remove_subscriber(&self, subscriber: &AnySubscriber) {
        if let Some(inner) = self.1.upgrade() {
            inner.remove_subscriber(subscriber)
        }
    }

    fn clear_subscribers(&self) {
        if let Some(inner) = self.1.upgrade() {
            inner.clear_subscribers()
        }
    }
}

/// A type-erased, weakly-held [`Subscriber`].
#[derive(Clone)]
pub struct AnySubscriber(
    pub(crate) usize,
    pub(crate) Weak<dyn Subscriber + Send + Sync>,
);

impl AnySubscriber {
    /// Runs `fun` with this subscriber installed as the ambient observer, so
    /// that every tracked read inside `fun` registers an edge to it.
    pub fn with_observer<T>(&self, fun: impl FnOnce() -> T) -> T {
        let prev = Observer::replace(self.clone());
        let val = fun();
        Observer::set(prev);
        val
    }
}

impl Debug for AnySubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnySubscriber").field(&self.0).finish()
    }
}

impl Hash for AnySubscriber {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq for AnySubscriber {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for AnySubscriber {}

impl ReactiveNode for AnySubscriber {
    fn mark_dirty(&self) {
        if let Some(inner) = self.1.upgrade() {
            inner.mark_dirty()
        }
    }

    fn mark_check(&self) {
        if let Some(inner) = self.1.upgrade() {
            inner.mark_check()
        }
    }

    fn mark_subscribers_check(&self) {
        if let Some(inner) = self.1.upgrade() {
            inner.mark_subscribers_check()
        }
    }

    fn update_if_necessary(&self) -> bool {
        if let Some(inner) = self.1.upgrade() {
            inner.update_if_necessary()
        } else {
            false
        }
    }
}

impl Subscriber for AnySubscriber {
    fn add_source(&self, source: AnySource) {
        if let Some(inner) = self.1.upgrade() {
            inner.add_source(source)
        }
    }

    fn clear_sources(&self, subscriber: &AnySubscriber) {
        if let Some(inner) = self.1.upgrade() {
            inner.clear_sources(subscriber)
        }
    }
}

thread_local! {
    static OBSERVER: RefCell<Option<AnySubscriber>> = const { RefCell::new(None) };
}

/// The ambient tracking context: whichever subscriber is currently running.
///
/// Tracked reads register the read source with this observer. The runtime is
/// single-threaded, so a thread-local is the whole story.
pub(crate) struct Observer;

impl Observer {
    pub fn get() -> Option<AnySubscriber> {
        OBSERVER.with(|o| o.borrow().clone())
    }

    pub fn is(observer: &AnySubscriber) -> bool {
        OBSERVER.with(|o| o.borrow().as_ref() == Some(observer))
    }

    fn take() -> Option<AnySubscriber> {
        OBSERVER.with(|o| o.borrow_mut().take())
    }

    fn set(observer: Option<AnySubscriber>) {
        OBSERVER.with(|o| *o.borrow_mut() = observer);
    }

    fn replace(observer: AnySubscriber) -> Option<AnySubscriber> {
        OBSERVER.with(|o| mem::replace(&mut *o.borrow_mut(), Some(observer)))
    }
}

/// Runs `fun` with no ambient observer, so reads inside it register no
/// dependencies.
pub fn untrack<T>(fun: impl FnOnce() -> T) -> T {
    let prev = Observer::take();
    let value = fun();
    Observer::set(prev);
    value
}

/// The sources a subscriber read during its latest run.
///
/// A linear scan over a `Vec` beats a hash set here: subscribers read a
/// handful of sources each run.
#[derive(Default, Clone, Debug)]
pub struct SourceSet(Vec<AnySource>);

impl SourceSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(Default::default())
    }

    /// Records a source.
    pub fn insert(&mut self, source: AnySource) {
        self.0.push(source);
    }

    /// Empties the set, returning its contents.
    pub fn take(&mut self) -> Vec<AnySource> {
        mem::take(&mut self.0)
    }

    /// Empties the set, unsubscribing `subscriber` from each source.
    pub fn clear_sources(&mut self, subscriber: &AnySubscriber) {
        for source in self.take() {
            source.remove_subscriber(subscriber);
        }
    }
}

impl IntoIterator for SourceSet {
    type Item = AnySource;
    type IntoIter = IntoIter<AnySource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SourceSet {
    type Item = &'a AnySource;
    type IntoIter = slice::Iter<'a, AnySource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The subscribers currently observing a source.
#[derive(Debug, Default, Clone)]
pub struct SubscriberSet(Vec<AnySubscriber>);

impl SubscriberSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(Vec::with_capacity(2))
    }

    /// Adds a subscriber, if not already present.
    pub fn subscribe(&mut self, subscriber: AnySubscriber) {
        if !self.0.contains(&subscriber) {
            self.0.push(subscriber);
        }
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&mut self, subscriber: &AnySubscriber) {
        if let Some(pos) = self.0.iter().position(|s| s == subscriber) {
            // keep subscription order: notifications must reach subscribers in
            // the order they subscribed
            self.0.remove(pos);
        }
    }

    /// Empties the set, returning its contents.
    pub fn take(&mut self) -> Vec<AnySubscriber> {
        mem::take(&mut self.0)
    }
}

impl IntoIterator for SubscriberSet {
    type Item = AnySubscriber;
    type IntoIter = IntoIter<AnySubscriber>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SubscriberSet {
    type Item = &'a AnySubscriber;
    type IntoIter = slice::Iter<'a, AnySubscriber>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

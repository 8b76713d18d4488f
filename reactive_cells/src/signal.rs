//! Signals: the atomic units of mutable state.

use crate::{
    graph::{
        AnySource, AnySubscriber, ReactiveNode, Source, SubscriberSet,
        ToAnySource,
    },
    traits::{Trigger, UpdateUntracked, WithUntracked},
};
use core::fmt::{Debug, Formatter, Result};
use or_poisoned::OrPoisoned;
use std::sync::{Arc, RwLock, Weak};

/// A reference-counted signal that can be read from and written to.
///
/// Cloning a `RwSignal` clones a handle to the same underlying value; every
/// clone observes and notifies the same subscribers. Reads made through
/// [`With`](crate::traits::With)/[`Get`](crate::traits::Get) register the
/// signal with the ambient observer; writes through
/// [`Update`](crate::traits::Update) mark every subscriber dirty.
pub struct RwSignal<T> {
    value: Arc<RwLock<T>>,
    subscribers: Arc<RwLock<SubscriberSet>>,
}

impl<T> Clone for RwSignal<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T> Debug for RwSignal<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("RwSignal")
            .field("type", &std::any::type_name::<T>())
            .field("value", &Arc::as_ptr(&self.value))
            .finish()
    }
}

impl<T> PartialEq for RwSignal<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl<T> Eq for RwSignal<T> {}

impl<T> Default for RwSignal<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> RwSignal<T> {
    /// Creates a new signal holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
            subscribers: Arc::new(RwLock::new(SubscriberSet::new())),
        }
    }
}

// A signal is a root node: it has no sources of its own, so its graph
// behavior is entirely the behavior of its subscriber set.
impl ReactiveNode for RwLock<SubscriberSet> {
    fn mark_dirty(&self) {
        self.mark_subscribers_check();
    }

    fn mark_check(&self) {}

    fn mark_subscribers_check(&self) {
        // subscribers are dropped here and re-added when they next run and
        // actually read this signal again
        let subs = self.write().or_poisoned().take();
        for sub in subs {
            sub.mark_dirty();
        }
    }

    fn update_if_necessary(&self) -> bool {
        // a signal marks its dependents Dirty at write time; when it is
        // polled as a source it cannot itself have pending changes
        false
    }
}

impl Source for RwLock<SubscriberSet> {
    fn add_subscriber(&self, subscriber: AnySubscriber) {
        self.write().or_poisoned().subscribe(subscriber);
    }

    fn remove_subscriber(&self, subscriber: &AnySubscriber) {
        self.write().or_poisoned().unsubscribe(subscriber);
    }

    fn clear_subscribers(&self) {
        self.write().or_poisoned().take();
    }
}

impl<T> ReactiveNode for RwSignal<T> {
    fn mark_dirty(&self) {
        ReactiveNode::mark_dirty(&*self.subscribers);
    }

    fn mark_check(&self) {}

    fn mark_subscribers_check(&self) {
        ReactiveNode::mark_subscribers_check(&*self.subscribers);
    }

    fn update_if_necessary(&self) -> bool {
        false
    }
}

impl<T> Source for RwSignal<T> {
    fn add_subscriber(&self, subscriber: AnySubscriber) {
        Source::add_subscriber(&*self.subscribers, subscriber);
    }

    fn remove_subscriber(&self, subscriber: &AnySubscriber) {
        Source::remove_subscriber(&*self.subscribers, subscriber);
    }

    fn clear_subscribers(&self) {
        Source::clear_subscribers(&*self.subscribers);
    }
}

impl<T> ToAnySource for RwSignal<T> {
    fn to_any_source(&self) -> AnySource {
        AnySource(
            Arc::as_ptr(&self.subscribers) as usize,
            Arc::downgrade(&self.subscribers)
                as Weak<dyn Source + Send + Sync>,
        )
    }
}

impl<T> Trigger for RwSignal<T> {
    fn trigger(&self) {
        self.mark_dirty();
    }
}

impl<T> WithUntracked for RwSignal<T> {
    type Value = T;

    fn with_untracked<U>(&self, fun: impl FnOnce(&T) -> U) -> U {
        fun(&self.value.read().or_poisoned())
    }
}

impl<T> UpdateUntracked for RwSignal<T> {
    type Value = T;

    fn update_untracked<U>(&self, fun: impl FnOnce(&mut T) -> U) -> U {
        fun(&mut self.value.write().or_poisoned())
    }
}

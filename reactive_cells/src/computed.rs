//! Memos: lazily recomputed, cached derived values.

use crate::{
    graph::{
        AnySource, AnySubscriber, Observer, ReactiveNode, ReactiveNodeState,
        Source, SourceSet, Subscriber, SubscriberSet, ToAnySource,
        ToAnySubscriber,
    },
    traits::WithUntracked,
};
use core::fmt::Debug;
use or_poisoned::OrPoisoned;
use std::sync::{Arc, RwLock, Weak};

/// A derived value, memoized and recomputed lazily.
///
/// The computation runs inside the tracking context, so the memo's
/// dependencies are exactly the values it read during its latest run: a
/// conditional read that was skipped this time around is not a dependency
/// until it is read again. Writes to a dependency only mark the memo dirty;
/// the recomputation happens on the next read, and subscribers are notified
/// only if the new value actually differs (`PartialEq`) from the cached one.
///
/// Cloning a `Memo` clones a handle to the same cache entry.
pub struct Memo<T> {
    inner: Arc<RwLock<MemoInner<T>>>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("type", &std::any::type_name::<T>())
            .field("data", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

impl<T: Send + Sync + 'static> Memo<T> {
    /// Creates a memo from a pure function of the values it reads.
    ///
    /// The function receives its own previous value, `None` on the first
    /// run.
    pub fn new(fun: impl Fn(Option<&T>) -> T + Send + Sync + 'static) -> Self
    where
        T: PartialEq,
    {
        let inner = Arc::new_cyclic(|weak| {
            let subscriber = AnySubscriber(
                weak.as_ptr() as usize,
                Weak::clone(weak) as Weak<dyn Subscriber + Send + Sync>,
            );

            RwLock::new(MemoInner::new(Arc::new(fun), subscriber))
        });
        Self { inner }
    }
}

pub(crate) struct MemoInner<T> {
    value: Option<T>,
    #[allow(clippy::type_complexity)]
    fun: Arc<dyn Fn(Option<&T>) -> T + Send + Sync>,
    state: ReactiveNodeState,
    sources: SourceSet,
    subscribers: SubscriberSet,
    any_subscriber: AnySubscriber,
}

impl<T: Send + Sync + 'static> MemoInner<T> {
    #[allow(clippy::type_complexity)]
    fn new(
        fun: Arc<dyn Fn(Option<&T>) -> T + Send + Sync>,
        any_subscriber: AnySubscriber,
    ) -> Self {
        Self {
            value: None,
            fun,
            state: ReactiveNodeState::Dirty,
            sources: Default::default(),
            subscribers: SubscriberSet::new(),
            any_subscriber,
        }
    }
}

impl<T: PartialEq + Send + Sync + 'static> ReactiveNode
    for RwLock<MemoInner<T>>
{
    fn mark_dirty(&self) {
        self.write().or_poisoned().state = ReactiveNodeState::Dirty;
        self.mark_subscribers_check();
    }

    fn mark_check(&self) {
        {
            let mut lock = self.write().or_poisoned();
            // Check never downgrades Dirty
            if lock.state == ReactiveNodeState::Clean {
                lock.state = ReactiveNodeState::Check;
            }
        }
        self.mark_subscribers_check();
    }

    fn mark_subscribers_check(&self) {
        let lock = self.read().or_poisoned();
        for sub in (&lock.subscribers).into_iter() {
            sub.mark_check();
        }
    }

    fn update_if_necessary(&self) -> bool {
        let (state, sources) = {
            let inner = self.read().or_poisoned();
            (inner.state, inner.sources.clone())
        };

        let needs_update = match state {
            ReactiveNodeState::Clean => false,
            ReactiveNodeState::Dirty => true,
            ReactiveNodeState::Check => (&sources).into_iter().any(|source| {
                source.update_if_necessary()
                    || self.read().or_poisoned().state
                        == ReactiveNodeState::Dirty
            }),
        };

        if needs_update {
            let (fun, value) = {
                let mut lock = self.write().or_poisoned();
                (lock.fun.clone(), lock.value.take())
            };

            let any_subscriber =
                self.read().or_poisoned().any_subscriber.clone();
            any_subscriber.clear_sources(&any_subscriber);
            let new_value =
                any_subscriber.with_observer(|| fun(value.as_ref()));

            let changed = Some(&new_value) != value.as_ref();
            let mut lock = self.write().or_poisoned();
            lock.value = Some(new_value);
            lock.state = ReactiveNodeState::Clean;

            if changed {
                let subs = lock.subscribers.clone();
                drop(lock);
                for sub in subs {
                    // if this memo is being recomputed on behalf of the
                    // currently-running subscriber, that subscriber already
                    // knows; re-marking it would schedule a second run
                    if !Observer::is(&sub) {
                        sub.mark_dirty();
                    }
                }
            }

            changed
        } else {
            let mut lock = self.write().or_poisoned();
            lock.state = ReactiveNodeState::Clean;
            false
        }
    }
}

impl<T: PartialEq + Send + Sync + 'static> Source for RwLock<MemoInner<T>> {
    fn add_subscriber(&self, subscriber: AnySubscriber) {
        self.write().or_poisoned().subscribers.subscribe(subscriber);
    }

    fn remove_subscriber(&self, subscriber: &AnySubscriber) {
        self.write()
            .or_poisoned()
            .subscribers
            .unsubscribe(subscriber);
    }

    fn clear_subscribers(&self) {
        self.write().or_poisoned().subscribers.take();
    }
}

impl<T: PartialEq + Send + Sync + 'static> Subscriber
    for RwLock<MemoInner<T>>
{
    fn add_source(&self, source: AnySource) {
        self.write().or_poisoned().sources.insert(source);
    }

    fn clear_sources(&self, subscriber: &AnySubscriber) {
        self.write().or_poisoned().sources.clear_sources(subscriber);
    }
}

impl<T: PartialEq + Send + Sync + 'static> ReactiveNode for Memo<T> {
    fn mark_dirty(&self) {
        self.inner.mark_dirty();
    }

    fn mark_check(&self) {
        self.inner.mark_check();
    }

    fn mark_subscribers_check(&self) {
        self.inner.mark_subscribers_check();
    }

    fn update_if_necessary(&self) -> bool {
        self.inner.update_if_necessary()
    }
}

impl<T: PartialEq + Send + Sync + 'static> Source for Memo<T> {
    fn add_subscriber(&self, subscriber: AnySubscriber) {
        self.inner.add_subscriber(subscriber);
    }

    fn remove_subscriber(&self, subscriber: &AnySubscriber) {
        self.inner.remove_subscriber(subscriber);
    }

    fn clear_subscribers(&self) {
        self.inner.clear_subscribers();
    }
}

impl<T: PartialEq + Send + Sync + 'static> ToAnySource for Memo<T> {
    fn to_any_source(&self) -> AnySource {
        AnySource(
            Arc::as_ptr(&self.inner) as usize,
            Arc::downgrade(&self.inner) as Weak<dyn Source + Send + Sync>,
        )
    }
}

impl<T: PartialEq + Send + Sync + 'static> ToAnySubscriber for Memo<T> {
    fn to_any_subscriber(&self) -> AnySubscriber {
        AnySubscriber(
            Arc::as_ptr(&self.inner) as usize,
            Arc::downgrade(&self.inner) as Weak<dyn Subscriber + Send + Sync>,
        )
    }
}

impl<T: PartialEq + Send + Sync + 'static> WithUntracked for Memo<T> {
    type Value = T;

    fn with_untracked<U>(&self, fun: impl FnOnce(&T) -> U) -> U {
        self.inner.update_if_necessary();
        let lock = self.inner.read().or_poisoned();
        // update_if_necessary guarantees the value is Some
        fun(lock.value.as_ref().unwrap())
    }
}

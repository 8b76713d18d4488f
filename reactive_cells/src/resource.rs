//! Resource cells: asynchronous fetches keyed on a declared dependency.

use crate::{
    channel::{channel, Receiver, Sender},
    graph::{
        AnySource, AnySubscriber, ReactiveNode, SourceSet, Subscriber,
        ToAnySubscriber,
    },
    signal::RwSignal,
    traits::{Get, Update, With, WithUntracked},
};
use any_spawner::Executor;
use core::fmt::Display;
use futures::StreamExt;
use or_poisoned::OrPoisoned;
use std::{
    future::Future,
    sync::{Arc, RwLock, Weak},
};

/// The observable state of a [`Resource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceState<T> {
    /// The latest successfully fetched value, or the default before the
    /// first success.
    pub value: T,
    /// Whether a fetch is currently in flight.
    pub is_loading: bool,
    /// Whether the most recent fetch failed. A failure leaves `value` at its
    /// last good state.
    pub is_error: bool,
    /// Whether any fetch has resolved since the current dependency value was
    /// established.
    pub is_complete: bool,
}

/// An asynchronous value that refetches when its declared dependency changes.
///
/// A resource couples a *source expression* (evaluated in the tracking
/// context, so it may read signals and memos) with a *fetcher* that turns the
/// source value into a future. The fetcher runs once eagerly and then again
/// exactly when the source expression's value changes; notifications that
/// leave the value equal do not refetch.
///
/// Returning `None` from the fetcher means the input needed for the fetch is
/// absent: the cell resolves immediately to its default value without issuing
/// a call, and without flagging an error.
///
/// Every issued fetch captures a version number. A resolution whose version
/// has been superseded by a newer dependency value is discarded outright, so
/// out-of-order completions can never overwrite newer state.
///
/// While a fetch is in flight the previous value is retained and
/// `is_loading` is set; on failure `is_error` is set and the last good value
/// is kept. Consumers read the cell through [`value`](Resource::value) and
/// the flag accessors, all of which register with the ambient observer.
pub struct Resource<T> {
    state: RwSignal<ResourceState<T>>,
    inner: Arc<RwLock<ResourceInner>>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) struct ResourceInner {
    dirty: bool,
    notifier: Option<Sender>,
    sources: SourceSet,
    version: usize,
}

fn resource_base() -> (Receiver, Arc<RwLock<ResourceInner>>) {
    let (mut notifier, rx) = channel();

    // fire once so the first fetch is issued eagerly on the next tick
    notifier.notify();

    let inner = Arc::new(RwLock::new(ResourceInner {
        dirty: true,
        notifier: Some(notifier),
        sources: SourceSet::new(),
        version: 0,
    }));

    (rx, inner)
}

impl<T> Resource<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a resource cell.
    ///
    /// `source` declares the dependency; `fetcher` maps the dependency value
    /// to a future, or to `None` when the fetch's input is absent.
    pub fn new<S, Fut, E>(
        source: impl Fn() -> S + 'static,
        fetcher: impl Fn(&S) -> Option<Fut> + 'static,
        default_value: T,
    ) -> Self
    where
        S: PartialEq + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Display + 'static,
    {
        let state = RwSignal::new(ResourceState {
            value: default_value.clone(),
            is_loading: false,
            is_error: false,
            is_complete: false,
        });
        let (mut rx, inner) = resource_base();

        Executor::spawn_local({
            let state = state.clone();
            let inner = Arc::clone(&inner);
            let subscriber = inner.to_any_subscriber();

            async move {
                let mut prev_input: Option<S> = None;

                while rx.next().await.is_some() {
                    if !subscriber
                        .with_observer(|| subscriber.update_if_necessary())
                    {
                        continue;
                    }
                    subscriber.clear_sources(&subscriber);

                    let input = subscriber.with_observer(|| source());
                    if prev_input.as_ref() == Some(&input) {
                        // a source poll that left the dependency value equal
                        // is not a refetch
                        continue;
                    }

                    let version = {
                        let mut lock = inner.write().or_poisoned();
                        lock.version += 1;
                        lock.version
                    };

                    match fetcher(&input) {
                        None => {
                            tracing::trace!(
                                "resource input absent; resolving to default"
                            );
                            state.set(ResourceState {
                                value: default_value.clone(),
                                is_loading: false,
                                is_error: false,
                                is_complete: true,
                            });
                        }
                        Some(fut) => {
                            state.update(|s| s.is_loading = true);

                            Executor::spawn_local({
                                let state = state.clone();
                                let inner = Arc::clone(&inner);
                                async move {
                                    let result = fut.await;
                                    if inner.read().or_poisoned().version
                                        != version
                                    {
                                        tracing::trace!(
                                            version,
                                            "discarding stale resource \
                                             resolution"
                                        );
                                        return;
                                    }
                                    match result {
                                        Ok(value) => {
                                            state.set(ResourceState {
                                                value,
                                                is_loading: false,
                                                is_error: false,
                                                is_complete: true,
                                            });
                                        }
                                        Err(err) => {
                                            tracing::error!(
                                                "resource fetch failed: {err}"
                                            );
                                            state.update(|s| {
                                                s.is_loading = false;
                                                s.is_error = true;
                                            });
                                        }
                                    }
                                }
                            });
                        }
                    }

                    prev_input = Some(input);
                }
            }
        });

        Self { state, inner }
    }

    /// Clones the full state of the cell, tracked.
    pub fn state(&self) -> ResourceState<T> {
        self.state.get()
    }

    /// Clones the current value, tracked.
    pub fn value(&self) -> T {
        self.state.with(|s| s.value.clone())
    }

    /// Clones the current value without registering a dependency.
    pub fn value_untracked(&self) -> T {
        self.state.with_untracked(|s| s.value.clone())
    }

    /// Applies `fun` to the current value, tracked.
    pub fn with_value<U>(&self, fun: impl FnOnce(&T) -> U) -> U {
        self.state.with(|s| fun(&s.value))
    }

    /// Whether a fetch is in flight, tracked.
    pub fn is_loading(&self) -> bool {
        self.state.with(|s| s.is_loading)
    }

    /// Whether the most recent fetch failed, tracked.
    pub fn is_error(&self) -> bool {
        self.state.with(|s| s.is_error)
    }

    /// Whether a fetch has resolved for the current dependency, tracked.
    pub fn is_complete(&self) -> bool {
        self.state.with(|s| s.is_complete)
    }
}

impl ToAnySubscriber for Arc<RwLock<ResourceInner>> {
    fn to_any_subscriber(&self) -> AnySubscriber {
        AnySubscriber(
            Arc::as_ptr(self) as usize,
            Arc::downgrade(self) as Weak<dyn Subscriber + Send + Sync>,
        )
    }
}

impl ReactiveNode for RwLock<ResourceInner> {
    fn mark_dirty(&self) {
        let mut lock = self.write().or_poisoned();
        lock.dirty = true;
        if let Some(notifier) = lock.notifier.as_mut() {
            notifier.notify();
        }
    }

    fn mark_check(&self) {
        if let Some(notifier) =
            self.write().or_poisoned().notifier.as_mut()
        {
            notifier.notify();
        }
    }

    fn mark_subscribers_check(&self) {}

    fn update_if_necessary(&self) -> bool {
        let mut guard = self.write().or_poisoned();

        if guard.dirty {
            guard.dirty = false;
            return true;
        }

        let sources = guard.sources.clone();
        drop(guard);

        sources
            .into_iter()
            .any(|source| source.update_if_necessary())
    }
}

impl Subscriber for RwLock<ResourceInner> {
    fn add_source(&self, source: AnySource) {
        self.write().or_poisoned().sources.insert(source);
    }

    fn clear_sources(&self, subscriber: &AnySubscriber) {
        self.write().or_poisoned().sources.clear_sources(subscriber);
    }
}

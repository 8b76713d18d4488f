//! Effects: side effects that rerun when the values they read change.

use crate::{
    channel::{channel, Receiver, Sender},
    graph::{
        untrack, AnySource, AnySubscriber, ReactiveNode, SourceSet,
        Subscriber, ToAnySubscriber,
    },
};
use any_spawner::Executor;
use futures::StreamExt;
use or_poisoned::OrPoisoned;
use std::sync::{Arc, RwLock, Weak};

/// A side effect scheduled on the ambient executor.
///
/// The effect function runs once on the next executor turn to establish its
/// read set, then again on a later turn after any of the values it read has
/// changed. Writes made inside an effect therefore feed back through the
/// normal pipeline on a subsequent turn instead of recursing.
///
/// An effect keeps running until [`stop`](Effect::stop) is called; dropping
/// the handle does not stop it.
pub struct Effect<T> {
    value: Arc<RwLock<Option<T>>>,
    inner: Arc<RwLock<EffectInner>>,
}

impl<T> Clone for Effect<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) struct EffectInner {
    dirty: bool,
    observer: Option<Sender>,
    sources: SourceSet,
}

fn effect_base() -> (Receiver, Arc<RwLock<EffectInner>>) {
    let (mut observer, rx) = channel();

    // notify once so the effect runs on the next tick and registers the
    // values it reads
    observer.notify();

    let inner = Arc::new(RwLock::new(EffectInner {
        dirty: true,
        observer: Some(observer),
        sources: SourceSet::new(),
    }));

    (rx, inner)
}

impl<T> Effect<T>
where
    T: 'static,
{
    /// Spawns an effect that reruns `fun` whenever a value read during its
    /// previous run changes. `fun` receives its own previous return value,
    /// `None` on the first run.
    pub fn new(mut fun: impl FnMut(Option<T>) -> T + 'static) -> Self {
        let (mut rx, inner) = effect_base();
        let value = Arc::new(RwLock::new(None));

        Executor::spawn_local({
            let value = Arc::clone(&value);
            // the task holds the inner node, so the effect outlives its
            // handles and ends only when `stop` drops the notifier
            let inner = Arc::clone(&inner);
            let subscriber = inner.to_any_subscriber();

            async move {
                while rx.next().await.is_some() {
                    // polling sources runs with this effect installed as the
                    // observer, so that a memo recomputed on our behalf does
                    // not schedule us a second time
                    if !subscriber
                        .with_observer(|| subscriber.update_if_necessary())
                    {
                        continue;
                    }
                    subscriber.clear_sources(&subscriber);

                    let old_value = value.write().or_poisoned().take();
                    let new_value =
                        subscriber.with_observer(|| fun(old_value));
                    *value.write().or_poisoned() = Some(new_value);
                }
                drop(inner);
            }
        });

        Self { value, inner }
    }

    /// Spawns an effect with an explicitly declared dependency expression.
    ///
    /// `deps` runs in the tracking context; `callback` runs untracked, with
    /// the new dependency value, the previous one, and its own previous
    /// return value. The callback fires once per actual change of the
    /// dependency value (`PartialEq`), not once per notification; when
    /// `immediate` is true it also fires once with the baseline value.
    pub fn watch<W>(
        mut deps: impl FnMut() -> W + 'static,
        mut callback: impl FnMut(&W, Option<&W>, Option<T>) -> T + 'static,
        immediate: bool,
    ) -> Self
    where
        W: PartialEq + 'static,
    {
        let (mut rx, inner) = effect_base();
        let value = Arc::new(RwLock::new(None));

        Executor::spawn_local({
            let value = Arc::clone(&value);
            let inner = Arc::clone(&inner);
            let subscriber = inner.to_any_subscriber();

            async move {
                let mut prev_deps: Option<W> = None;
                let mut first_run = true;

                while rx.next().await.is_some() {
                    if !subscriber
                        .with_observer(|| subscriber.update_if_necessary())
                    {
                        continue;
                    }
                    subscriber.clear_sources(&subscriber);

                    let new_deps = subscriber.with_observer(|| deps());
                    let changed = prev_deps.as_ref() != Some(&new_deps);
                    let run = if first_run { immediate } else { changed };
                    first_run = false;

                    if run {
                        let old_value = value.write().or_poisoned().take();
                        let new_value = untrack(|| {
                            callback(&new_deps, prev_deps.as_ref(), old_value)
                        });
                        *value.write().or_poisoned() = Some(new_value);
                    }

                    prev_deps = Some(new_deps);
                }
                drop(inner);
            }
        });

        Self { value, inner }
    }

    /// Stops the effect: it unsubscribes from its sources and its task ends.
    pub fn stop(&self) {
        let subscriber = self.inner.to_any_subscriber();
        subscriber.clear_sources(&subscriber);
        self.inner.write().or_poisoned().observer = None;
    }

    /// Applies `fun` to the effect's latest return value, if it has run.
    pub fn with_value_mut<U>(
        &self,
        fun: impl FnOnce(&mut T) -> U,
    ) -> Option<U> {
        self.value.write().or_poisoned().as_mut().map(fun)
    }
}

impl ToAnySubscriber for Arc<RwLock<EffectInner>> {
    fn to_any_subscriber(&self) -> AnySubscriber {
        AnySubscriber(
            Arc::as_ptr(self) as usize,
            Arc::downgrade(self) as Weak<dyn Subscriber + Send + Sync>,
        )
    }
}

impl<T> ToAnySubscriber for Effect<T> {
    fn to_any_subscriber(&self) -> AnySubscriber {
        self.inner.to_any_subscriber()
    }
}

impl ReactiveNode for RwLock<EffectInner> {
    fn mark_dirty(&self) {
        let mut lock = self.write().or_poisoned();
        lock.dirty = true;
        if let Some(observer) = lock.observer.as_mut() {
            observer.notify();
        }
    }

    fn mark_check(&self) {
        if let Some(observer) =
            self.write().or_poisoned().observer.as_mut()
        {
            observer.notify();
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

impl Subscriber for RwLock<EffectInner> {
    fn add_source(&self, source: AnySource) {
        self.write().or_poisoned().sources.insert(source);
    }

    fn clear_sources(&self, subscriber: &AnySubscriber) {
        self.write().or_poisoned().sources.clear_sources(subscriber);
    }
}

//! The access vocabulary shared by all reactive primitives.
//!
//! Most traits here are blanket-implemented from two base capabilities:
//! untracked access ([`WithUntracked`], [`UpdateUntracked`]) and graph
//! participation ([`Track`], [`Trigger`]). A new primitive implements the
//! base traits and picks up `with`/`get`/`update`/`set` for free.
//!
//! | Trait             | Mode           | Description                                        |
//! |-------------------|----------------|----------------------------------------------------|
//! | [`Track`]         | —              | Registers this value with the ambient observer.    |
//! | [`Trigger`]       | —              | Notifies subscribers that this value has changed.  |
//! | [`WithUntracked`] | `fn(&T) -> U`  | Applies a closure to the value, no tracking.       |
//! | [`With`]          | `fn(&T) -> U`  | Same, but tracked.                                 |
//! | [`GetUntracked`]  | `T`            | Clones the value, no tracking.                     |
//! | [`Get`]           | `T`            | Clones the value, tracked.                         |
//! | [`UpdateUntracked`] | `fn(&mut T)` | Mutates in place without notifying.                |
//! | [`Update`]        | `fn(&mut T)`   | Mutates in place and notifies; also gives `set`.   |

use crate::graph::{Observer, Source, Subscriber, ToAnySource};

/// Registers this value as a source of the ambient observer, if any.
pub trait Track {
    /// Subscribes the current observer to this value.
    fn track(&self);
}

impl<T: Source + ToAnySource> Track for T {
    fn track(&self) {
        if let Some(subscriber) = Observer::get() {
            subscriber.add_source(self.to_any_source());
            self.add_subscriber(subscriber);
        }
    }
}

/// Notifies subscribers that this value has changed.
pub trait Trigger {
    /// Marks subscribers dirty.
    fn trigger(&self);
}

/// Applies a closure to the current value without registering a dependency.
pub trait WithUntracked {
    /// The inner value type.
    type Value: ?Sized;

    /// Applies `fun` to a reference to the current value.
    fn with_untracked<U>(&self, fun: impl FnOnce(&Self::Value) -> U) -> U;
}

/// Applies a closure to the current value, registering the read with the
/// ambient observer.
pub trait With: WithUntracked + Track {
    /// Applies `fun` to a reference to the current value, tracked.
    fn with<U>(&self, fun: impl FnOnce(&Self::Value) -> U) -> U {
        self.track();
        self.with_untracked(fun)
    }
}

impl<T: WithUntracked + Track> With for T {}

/// Clones the current value without registering a dependency.
pub trait GetUntracked: WithUntracked
where
    Self::Value: Clone,
{
    /// Clones out the current value, untracked.
    fn get_untracked(&self) -> Self::Value {
        self.with_untracked(Self::Value::clone)
    }
}

impl<T> GetUntracked for T
where
    T: WithUntracked,
    T::Value: Clone,
{
}

/// Clones the current value, registering the read with the ambient observer.
pub trait Get: With
where
    Self::Value: Clone,
{
    /// Clones out the current value, tracked.
    fn get(&self) -> Self::Value {
        self.with(Self::Value::clone)
    }
}

impl<T> Get for T
where
    T: With,
    T::Value: Clone,
{
}

/// Mutates the current value in place without notifying subscribers.
pub trait UpdateUntracked {
    /// The inner value type.
    type Value;

    /// Applies `fun` to a mutable reference to the value, without notifying.
    fn update_untracked<U>(&self, fun: impl FnOnce(&mut Self::Value) -> U)
        -> U;
}

/// Mutates the current value in place and notifies subscribers.
pub trait Update: UpdateUntracked + Trigger {
    /// Applies `fun` to a mutable reference to the value, then notifies.
    fn update<U>(&self, fun: impl FnOnce(&mut Self::Value) -> U) -> U {
        let value = self.update_untracked(fun);
        self.trigger();
        value
    }

    /// Replaces the value and notifies.
    fn set(&self, value: Self::Value) {
        self.update(|v| *v = value);
    }
}

impl<T: UpdateUntracked + Trigger> Update for T {}

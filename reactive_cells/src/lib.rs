//! A small implementation of a fine-grained reactive system.
//!
//! The crate composes four reactive primitives:
//! 1. **Signals**: atomic units of mutable state ([`signal::RwSignal`]).
//! 2. **Memos**: derived values that cannot be written directly, recomputed
//!    lazily when the values they read change ([`computed::Memo`]).
//! 3. **Resources**: asynchronous fetches keyed on a declared dependency
//!    expression, with loading/error state and stale-response suppression
//!    ([`resource::Resource`]).
//! 4. **Effects**: side effects that synchronize the reactive system with
//!    the world outside it ([`effect::Effect`]).
//!
//! ```rust
//! # any_spawner::Executor::init_futures_executor().ok();
//! use reactive_cells::{computed::Memo, prelude::*, signal::RwSignal};
//!
//! let count = RwSignal::new(1);
//! let double_count = Memo::new({
//!     let count = count.clone();
//!     move |_| count.get() * 2
//! });
//!
//! assert_eq!(double_count.get(), 2);
//! count.set(2);
//! assert_eq!(double_count.get(), 4);
//! ```
//!
//! ## Design notes
//!
//! - **Dependencies are tracked at runtime.** A subscriber depends on
//!   exactly the set of values it read during its latest run; a conditional
//!   branch that went unread this time is not a dependency until it is read
//!   again.
//! - **Updates are pull-based.** Writing a signal marks dependents dirty;
//!   recomputation happens on the next read, and value-equal recomputations
//!   stop propagating.
//! - **Effects are scheduled, not recursive.** Effects and resource fetches
//!   are spawned as tasks on the ambient executor
//!   ([`any_spawner::Executor`]), so a write performed inside an effect
//!   re-enters the pipeline on a later turn with bounded stack depth. The
//!   runtime is single-threaded and executor-agnostic.
//!
//! The graph algorithm (Clean/Check/Dirty marking with dynamic source sets)
//! follows the approach popularized by Reactively.

#![deny(missing_docs)]

pub(crate) mod channel;
pub mod computed;
pub mod effect;
pub mod graph;
pub mod resource;
pub mod signal;
pub mod traits;

/// Reexports frequently-used traits.
pub mod prelude {
    pub use crate::{graph::untrack, traits::*};
}

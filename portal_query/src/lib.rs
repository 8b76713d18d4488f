//! The reactive core behind the portal's query-configuration screen.
//!
//! A [`store::QueryStore`] owns the user's selections (studies, cancer
//! types, profiles, case sets) as plain reactive fields, fetches the
//! catalog and per-study data through an injected [`api::PortalApi`]
//! client, derives everything the screen renders as memoized views, and
//! keeps derived defaults in sync with newly arrived data (selecting the
//! default genetic profiles whenever a study's profile list lands).
//!
//! The derivation machinery itself lives in the [`reactive_cells`] crate;
//! this crate is the domain: what the fields are, which fetches depend on
//! which selections, and what the derived views mean.
//!
//! Selections may momentarily reference catalog entries that have not been
//! fetched yet (or were removed server-side). That is not an error here:
//! lookups yield `None` entries and counts treat them as zero, and the UI
//! decides how to render the gap.

pub mod api;
pub mod snapshot;
pub mod store;
pub mod tree;

pub use snapshot::QuerySnapshot;
pub use store::{QueryStore, QueryStoreDefaults};

//! unistore: field-granular observable state
//!
//! A [`UniversalStore`] owns a fixed-field [`Snapshot`] and notifies
//! field-scoped listeners synchronously on every transition. Reading sites
//! attach through disposable [`Binding`]s that cache a selector's latest
//! output and can never receive an update after teardown.
//!
//! # Core Concepts
//!
//! - **Snapshot**: ordered field->value state, field set fixed at
//!   construction; every external read is a copy
//! - **Dispatch**: single-field write plus synchronous notification of that
//!   field's listeners, in registration order
//! - **Batch update**: atomic multi-field write - one snapshot swap, then
//!   one notification per written field in insertion order
//! - **Binding**: liveness-flagged bridge between the store and a reading
//!   site, in whole-state-selector or single-field mode
//!
//! # Example
//!
//! ```
//! use unistore::{BatchUpdate, Snapshot, UniversalStore};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Value {
//!     Flag(bool),
//!     Text(Option<String>),
//! }
//!
//! let mut store = UniversalStore::new(Snapshot::new([
//!     ("auth", Value::Flag(false)),
//!     ("token", Value::Text(None)),
//! ]));
//!
//! let auth = store.bind_field("auth").unwrap();
//!
//! // One logical transition, one notification per field, no partially
//! // applied state observable anywhere.
//! store
//!     .batch_update(
//!         BatchUpdate::new()
//!             .set("auth", Value::Flag(true))
//!             .set("token", Value::Text(Some("abc".into()))),
//!     )
//!     .unwrap();
//!
//! assert_eq!(auth.get(), Value::Flag(true));
//! auth.dispose(&mut store);
//! ```
//!
//! # Concurrency model
//!
//! The store is single-threaded and run-to-completion: `dispatch` and
//! `batch_update` take `&mut self` and return only after every synchronous
//! callback of the pass has fired. A listener cannot call back into the
//! store mid-pass; work it wants to trigger (a network call, a follow-up
//! write) must be deferred outside the pass. Sharing a store across
//! threads means wrapping the whole store in one exclusive lock.

pub mod binding;
pub mod devtool;
pub mod field;
pub mod registry;
#[cfg(feature = "remote")]
pub mod remote;
pub mod snapshot;
pub mod store;
pub mod testing;

pub use binding::Binding;
pub use devtool::{TransitionLog, TransitionRecord};
pub use field::{FieldKey, FieldValue};
pub use registry::{ListenerFn, ListenerId};
pub use snapshot::{BatchUpdate, Snapshot};
pub use store::{StoreConfig, StoreError, UniversalStore};

#[cfg(feature = "remote")]
pub use remote::{RemoteClient, RemoteOutcome};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::binding::Binding;
    pub use crate::devtool::{TransitionLog, TransitionRecord};
    pub use crate::field::{FieldKey, FieldValue};
    pub use crate::registry::{ListenerFn, ListenerId};
    pub use crate::snapshot::{BatchUpdate, Snapshot};
    pub use crate::store::{StoreConfig, StoreError, UniversalStore};

    #[cfg(feature = "remote")]
    pub use crate::remote::{RemoteClient, RemoteOutcome};
}

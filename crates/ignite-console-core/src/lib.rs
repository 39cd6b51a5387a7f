//! Configuration state engine between `ignite-console-api` and its consumers.
//!
//! This crate owns the client-side model of a user's cluster configurations
//! and the rules for editing and saving them:
//!
//! - **[`ConfigureState`]**: the store. One immutable [`State`] tree of
//!   normalized entity slices plus the edit session, changed only by
//!   dispatching an [`Action`]. Dispatch is synchronous and strictly ordered;
//!   each new state is published through a `tokio::sync::watch` channel and
//!   every action is delivered to listeners with the state it produced.
//!
//! - **Selectors** ([`selectors`]): memoized projections such as the edited
//!   cluster's current short items or the item an edit screen should show.
//!   Outputs are `Arc`s that only change when their inputs do, so
//!   [`SelectorStream`] can report real changes only.
//!
//! - **Effects**: a background task answering request actions (saves,
//!   loads, removals) against a [`ConfigurationBackend`]. Saves update the
//!   store optimistically through a [`Transaction`] and roll it back when
//!   the backend refuses.
//!
//! - **[`Console`]**: the facade tying it together. Typed operations such
//!   as [`Console::save_basic`] dispatch a request and await its result.
//!
//! - **[`SelectionManager`]** and **[`ConfigChangesGuard`]**: list-screen
//!   selection reconciliation and the unsaved-changes prompt.

pub mod action;
pub mod backend;
pub mod bus;
pub mod config;
pub mod console;
mod effects;
pub mod error;
pub mod guard;
pub mod model;
pub mod selection;
pub mod selectors;
pub mod store;
pub mod stream;
pub mod transaction;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{
    Action, ClonedCluster, ClusterFailure, LoadRequest, SaveError, SavedItem, SavedKind, Ticket,
};
pub use backend::ConfigurationBackend;
pub use bus::{ActionEnvelope, ConfigureState};
pub use config::{ConsoleConfig, Credentials, TlsVerification};
pub use console::{CloneOutcome, Console, RemoveOutcome, RestConsole};
pub use error::CoreError;
pub use guard::{AutoConfirm, ConfigChangesGuard, Confirm};
pub use selection::{SelectionEvent, SelectionManager};
pub use selectors::Selector;
pub use store::{ChangedItems, State};
pub use stream::{ActionStream, SelectorStream, StateStream};
pub use transaction::Transaction;

pub use model::{
    AnyItem, Cache, Cluster, CompleteConfiguration, Entity, EntityId, Igfs, ItemRef, ItemType,
    Model, ShortCache, ShortCluster, ShortIgfs, ShortModel,
};

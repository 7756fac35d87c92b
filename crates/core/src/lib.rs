//! # Intake Core
//!
//! The synchronized data store behind a multi-section healthcare intake
//! record. One canonical record tree backs several semi-independent forms;
//! facts duplicated across forms (patient name, phone, address, pharmacy and
//! provider identity) are kept equal by write-time propagation, and the
//! result is persisted durably and incrementally.
//!
//! Layering, leaves first:
//!
//! - [`schema`]: the typed shape of the record; always fully shaped, so
//!   reads never fail.
//! - [`paths`]: dotted-path reads and writes over the record tree.
//! - [`rules`]: the declarative table mapping one field change to the other
//!   writes that keep duplicated facts equal.
//! - [`reducer`]: the single pure state-transition function.
//! - [`storage`] / [`persistence`]: the durable snapshot boundary and the
//!   debounced autosave on top of it.
//! - [`store`]: the façade presentation surfaces talk to.
//! - [`extract`]: the boundary to the free-text extraction collaborator.
//!
//! **No presentation concerns**: form layouts, document rendering and input
//! capture belong to the surfaces consuming [`store::IntakeStore`].

pub mod config;
pub mod error;
pub mod extract;
pub mod paths;
pub mod persistence;
pub mod reducer;
pub mod rules;
pub mod schema;
pub mod storage;
pub mod store;

pub use config::{config_from_env_values, StoreConfig, DEFAULT_AUTOSAVE_DEBOUNCE};
pub use error::{StoreError, StoreResult};
pub use extract::{extract_with_fallback, ExtractError, HeuristicExtractor, RecordExtractor};
pub use schema::IntakeRecord;
pub use store::{IntakeStore, StoreStatus};

pub use intake_types::{EntryId, FieldPath};

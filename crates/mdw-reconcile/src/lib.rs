//! mdw-reconcile
//!
//! Attribute value -> enforcement state -> marker file.
//!
//! Decisions:
//! - Only a JSON object whose `enabled` field is truthy enables enforcement
//! - Empty, unparseable, non-object, or missing-field values disable it
//! - The decision never fails; only the file side effect can
//!
//! `engine` is pure logic. `state_file` is the only module touching disk.

mod engine;
mod state_file;
mod types;

pub use engine::{decide, is_truthy, reconcile, ENABLED_FIELD};
pub use state_file::{reconcile_state_file, StateFile};
pub use types::*;

//! # Sacco Engine
//!
//! Client-side workflow for creating and editing loan applications against
//! the portal backend. The backend remains the sole source of truth; the
//! engine only coordinates form state and decides which remote operation to
//! issue.
//!
//! ## Architecture
//!
//! - **`catalog`**: read-through cache over loan products and members
//! - **`application::sections`**: pure mapping from a loan product to the visible sections
//! - **`application::field_array`**: ordered entry lists with stable local row keys
//! - **`application::form`**: authoritative form state for one editing session
//! - **`application::loader`**: lazy, once-per-session hydration of repeatable sections
//! - **`application::dispatch`**: create-whole vs. update-one-section submission
//! - **`application::session`**: the editing session tying the above to notifications
//! - **`notify`**: user-facing success/error messages

pub mod application;
pub mod catalog;
mod error;
pub mod notify;

pub use application::dispatch::{DispatchReceipt, SectionPayload, Submission};
pub use application::field_array::{FieldArray, RowKey};
pub use application::form::{ApplicationForm, FormMode};
pub use application::loader::{LoadState, SectionLoad, SectionLoadStates};
pub use application::sections::{reconcile_section, visible_sections};
pub use application::session::{ApplicationSession, SubmitOutcome};
pub use catalog::{CatalogQuery, CatalogReader};
pub use error::WorkflowError;
pub use notify::{Notification, NotificationLevel};

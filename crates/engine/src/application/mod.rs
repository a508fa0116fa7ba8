//! Loan application editing workflow.
//!
//! An [`session::ApplicationSession`] owns one [`form::ApplicationForm`]. The
//! form decides which sections are visible for the selected loan product,
//! [`loader`] hydrates repeatable sections on first visit, and [`dispatch`]
//! turns a validated form into exactly one remote write.

pub mod dispatch;
pub mod field_array;
pub mod form;
pub mod loader;
pub mod sections;
pub mod session;

//! Shared data model for the SACCO loan portal.
//!
//! These types mirror the JSON documents exchanged with the portal backend
//! (camelCase field names) and are consumed by the API client, the loan
//! application workflow engine, and the CLI.

pub mod loan;
pub mod member;
pub mod section;

pub use loan::validation::{FieldError, SectionEntry, ValidationErrors, validate_basic_info, validate_cardinality};
pub use loan::{
    ApplicantType, BasicInfo, CollateralItem, GuarantorEntry, InterestMethod, LoanApplication, LoanProduct, NextOfKinEntry,
};
pub use member::Member;
pub use section::{ParseSectionError, Section};

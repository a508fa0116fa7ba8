//! Field-level validation for loan application sections.
//!
//! Errors are attributed to a section, an optional row within a repeatable
//! section, and a wire field name so a caller can point the user at the exact
//! input to correct. Validation never touches the network.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::{BasicInfo, CollateralItem, GuarantorEntry, LoanProduct, NextOfKinEntry};
use crate::Section;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub section: Section,
    /// Position of the entry within a repeatable section; `None` for scalar
    /// fields and section-wide errors.
    pub row: Option<usize>,
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "{}[{}].{}: {}", self.section, row, self.field, self.message),
            None => write!(f, "{}.{}: {}", self.section, self.field, self.message),
        }
    }
}

/// Ordered collection of [`FieldError`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, section: Section, row: Option<usize>, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            section,
            row,
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn for_section(&self, section: Section) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |error| error.section == section)
    }

    /// Error for a specific entry field, if one was recorded.
    pub fn find(&self, section: Section, row: Option<usize>, field: &str) -> Option<&FieldError> {
        self.errors
            .iter()
            .find(|error| error.section == section && error.row == row && error.field == field)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// An entry of a repeatable section.
pub trait SectionEntry: Clone + Default {
    const SECTION: Section;

    /// Record every problem with this entry, attributed to `row`.
    fn validate(&self, row: usize, errors: &mut ValidationErrors);
}

fn require_text(errors: &mut ValidationErrors, section: Section, row: usize, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(section, Some(row), field, "is required");
    }
}

fn require_positive(errors: &mut ValidationErrors, section: Section, row: usize, field: &str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(section, Some(row), field, "must be a positive number");
    }
}

impl SectionEntry for GuarantorEntry {
    const SECTION: Section = Section::Guarantors;

    fn validate(&self, row: usize, errors: &mut ValidationErrors) {
        require_text(errors, Self::SECTION, row, "guarantorName", &self.guarantor_name);
        require_text(errors, Self::SECTION, row, "relationship", &self.relationship);
        require_text(errors, Self::SECTION, row, "guarantorContact", &self.guarantor_contact);
        require_text(errors, Self::SECTION, row, "guarantorIdNumber", &self.guarantor_id_number);
        require_positive(errors, Self::SECTION, row, "guaranteedAmount", self.guaranteed_amount);
    }
}

impl SectionEntry for NextOfKinEntry {
    const SECTION: Section = Section::NextOfKin;

    fn validate(&self, row: usize, errors: &mut ValidationErrors) {
        require_text(errors, Self::SECTION, row, "name", &self.name);
        require_text(errors, Self::SECTION, row, "relationship", &self.relationship);
        require_text(errors, Self::SECTION, row, "phone", &self.phone);
        let email = self.email.trim();
        if !email.is_empty() && !EMAIL_PATTERN.is_match(email) {
            errors.push(Self::SECTION, Some(row), "email", "must be a valid email address");
        }
    }
}

impl SectionEntry for CollateralItem {
    const SECTION: Section = Section::Collateral;

    fn validate(&self, row: usize, errors: &mut ValidationErrors) {
        require_text(errors, Self::SECTION, row, "type", &self.collateral_type);
        require_text(errors, Self::SECTION, row, "description", &self.description);
        require_positive(errors, Self::SECTION, row, "estimatedValue", self.estimated_value);
        require_text(errors, Self::SECTION, row, "ownerName", &self.owner_name);
        require_text(errors, Self::SECTION, row, "ownerContact", &self.owner_contact);
    }
}

/// Validate the scalar fields of an application against the selected product.
///
/// `product` is `None` when the selected identifier is not in the catalog.
/// Inactive products are only rejected when starting a new application.
pub fn validate_basic_info(basic: &BasicInfo, product: Option<&LoanProduct>, is_new: bool, errors: &mut ValidationErrors) {
    let section = Section::BasicInfo;
    match (basic.loan_product_id, product) {
        (None, _) => errors.push(section, None, "loanProductId", "is required"),
        (Some(_), None) => errors.push(section, None, "loanProductId", "is not an available loan product"),
        (Some(_), Some(product)) if is_new && !product.is_active => {
            errors.push(section, None, "loanProductId", "is not currently offered")
        }
        _ => {}
    }
    if basic.member_id.is_none() {
        errors.push(section, None, "memberId", "is required");
    }
    if basic.applicant_id_number.trim().is_empty() {
        errors.push(section, None, "applicantIdNumber", "is required");
    }

    if !basic.amount.is_finite() || basic.amount <= 0.0 {
        errors.push(section, None, "amount", "must be a positive number");
    } else if let Some(product) = product
        && !product.amount_in_range(basic.amount)
    {
        errors.push(
            section,
            None,
            "amount",
            format!("must be between {} and {}", product.min_amount, product.max_amount),
        );
    }

    if basic.term_days == 0 {
        errors.push(section, None, "termDays", "must be a positive number of days");
    } else if let Some(product) = product
        && !product.term_in_range(basic.term_days)
    {
        errors.push(
            section,
            None,
            "termDays",
            format!("must be between {} and {} days", product.min_term_days, product.max_term_days),
        );
    }
}

/// Record a section-wide error when `count` exceeds `max`.
pub fn validate_cardinality(section: Section, count: usize, max: Option<u32>, errors: &mut ValidationErrors) {
    if let Some(max) = max
        && count > max as usize
    {
        errors.push(section, None, "entries", format!("at most {} allowed, found {}", max, count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_guarantor() -> GuarantorEntry {
        GuarantorEntry {
            id: None,
            guarantor_name: "Jane Wanjiru".into(),
            relationship: "Sister".into(),
            guarantor_contact: "0712345678".into(),
            guarantor_id_number: "23456789".into(),
            guaranteed_amount: 2500.0,
        }
    }

    fn product() -> LoanProduct {
        serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "Development Loan",
            "minAmount": 1000.0,
            "maxAmount": 20000.0,
            "minTermDays": 30,
            "maxTermDays": 365
        }))
        .unwrap()
    }

    #[test]
    fn missing_guarantor_contact_is_attributed_to_row_and_field() {
        let mut guarantor = valid_guarantor();
        guarantor.guarantor_contact = "  ".into();
        let mut errors = ValidationErrors::new();
        guarantor.validate(1, &mut errors);

        assert_eq!(errors.len(), 1);
        let error = errors.find(Section::Guarantors, Some(1), "guarantorContact").unwrap();
        assert_eq!(error.message, "is required");
        assert_eq!(error.to_string(), "guarantors[1].guarantorContact: is required");
    }

    #[test]
    fn guaranteed_amount_must_be_positive() {
        let mut guarantor = valid_guarantor();
        guarantor.guaranteed_amount = 0.0;
        let mut errors = ValidationErrors::new();
        guarantor.validate(0, &mut errors);
        assert!(errors.find(Section::Guarantors, Some(0), "guaranteedAmount").is_some());

        guarantor.guaranteed_amount = f64::NAN;
        let mut errors = ValidationErrors::new();
        guarantor.validate(0, &mut errors);
        assert!(errors.find(Section::Guarantors, Some(0), "guaranteedAmount").is_some());
    }

    #[test]
    fn next_of_kin_email_is_optional_but_checked() {
        let mut kin = NextOfKinEntry {
            name: "Peter".into(),
            relationship: "Brother".into(),
            phone: "0700000000".into(),
            ..NextOfKinEntry::default()
        };
        let mut errors = ValidationErrors::new();
        kin.validate(0, &mut errors);
        assert!(errors.is_empty());

        kin.email = "peter.example.com".into();
        kin.validate(0, &mut errors);
        assert!(errors.find(Section::NextOfKin, Some(0), "email").is_some());
    }

    #[test]
    fn empty_collateral_reports_every_field() {
        let mut errors = ValidationErrors::new();
        CollateralItem::default().validate(2, &mut errors);
        let fields: Vec<&str> = errors.iter().map(|error| error.field.as_str()).collect();
        assert_eq!(fields, vec!["type", "description", "estimatedValue", "ownerName", "ownerContact"]);
        assert!(errors.iter().all(|error| error.row == Some(2)));
    }

    #[test]
    fn basic_info_checks_product_bounds() {
        let basic = BasicInfo {
            loan_product_id: Some(4),
            member_id: Some(1),
            applicant_id_number: "1234".into(),
            amount: 25000.0,
            term_days: 10,
        };
        let mut errors = ValidationErrors::new();
        validate_basic_info(&basic, Some(&product()), true, &mut errors);

        assert_eq!(
            errors.find(Section::BasicInfo, None, "amount").map(|error| error.message.as_str()),
            Some("must be between 1000 and 20000")
        );
        assert!(errors.find(Section::BasicInfo, None, "termDays").is_some());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn inactive_product_only_blocks_new_applications() {
        let mut inactive = product();
        inactive.is_active = false;
        let basic = BasicInfo {
            loan_product_id: Some(4),
            member_id: Some(1),
            applicant_id_number: "1234".into(),
            amount: 5000.0,
            term_days: 60,
        };

        let mut errors = ValidationErrors::new();
        validate_basic_info(&basic, Some(&inactive), true, &mut errors);
        assert!(errors.find(Section::BasicInfo, None, "loanProductId").is_some());

        let mut errors = ValidationErrors::new();
        validate_basic_info(&basic, Some(&inactive), false, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn cardinality_error_is_section_wide() {
        let mut errors = ValidationErrors::new();
        validate_cardinality(Section::Guarantors, 3, Some(2), &mut errors);
        validate_cardinality(Section::Collateral, 5, None, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors.find(Section::Guarantors, None, "entries").is_some());
        assert!(errors.clone().into_result().is_err());
    }
}

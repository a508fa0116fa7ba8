//! Loan products and loan applications.
//!
//! A [`LoanProduct`] is read-only from the client's perspective: its
//! requirement flags decide which sections of a [`LoanApplication`] can be
//! edited. The application owns three child collections which the backend
//! persists independently of the scalar [`BasicInfo`] fields.

pub mod validation;

use serde::{Deserialize, Serialize};

use crate::Section;

/// How interest accrues on a loan product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestMethod {
    #[default]
    #[serde(alias = "simple")]
    Simple,
    #[serde(alias = "compound")]
    Compound,
}

/// Who may apply under a loan product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicantType {
    #[default]
    #[serde(alias = "member")]
    Member,
    #[serde(alias = "group")]
    Group,
    #[serde(alias = "loanee")]
    Loanee,
}

impl ApplicantType {
    /// Wire representation, as used in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantType::Member => "MEMBER",
            ApplicantType::Group => "GROUP",
            ApplicantType::Loanee => "LOANEE",
        }
    }
}

impl std::str::FromStr for ApplicantType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MEMBER" => Ok(ApplicantType::Member),
            "GROUP" => Ok(ApplicantType::Group),
            "LOANEE" => Ok(ApplicantType::Loanee),
            other => Err(format!("unknown applicant type '{}'", other)),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Template of origination constraints and requirement flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanProduct {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub min_amount: f64,
    #[serde(default)]
    pub max_amount: f64,
    #[serde(default)]
    pub min_term_days: u32,
    #[serde(default)]
    pub max_term_days: u32,
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub interest_method: InterestMethod,
    #[serde(default)]
    pub requires_collateral: bool,
    #[serde(default)]
    pub requires_guarantor: bool,
    #[serde(default)]
    pub requires_next_of_kin: bool,
    #[serde(default)]
    pub allow_penalties: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub applicant_type: ApplicantType,
    #[serde(default)]
    pub max_guarantors: Option<u32>,
    #[serde(default)]
    pub max_collateral_items: Option<u32>,
}

impl LoanProduct {
    /// Whether this product makes `section` part of the application.
    ///
    /// Basic info is always part of an application.
    pub fn requires(&self, section: Section) -> bool {
        match section {
            Section::BasicInfo => true,
            Section::Guarantors => self.requires_guarantor,
            Section::NextOfKin => self.requires_next_of_kin,
            Section::Collateral => self.requires_collateral,
        }
    }

    /// Upper bound on the number of entries for a repeatable section, if any.
    pub fn max_entries(&self, section: Section) -> Option<u32> {
        match section {
            Section::Guarantors => self.max_guarantors,
            Section::Collateral => self.max_collateral_items,
            Section::BasicInfo | Section::NextOfKin => None,
        }
    }

    /// A zero upper bound means the backend did not configure one.
    pub fn amount_in_range(&self, amount: f64) -> bool {
        amount >= self.min_amount && (self.max_amount <= 0.0 || amount <= self.max_amount)
    }

    pub fn term_in_range(&self, term_days: u32) -> bool {
        term_days >= self.min_term_days && (self.max_term_days == 0 || term_days <= self.max_term_days)
    }
}

/// Scalar fields of a loan application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicInfo {
    pub loan_product_id: Option<u64>,
    pub member_id: Option<u64>,
    pub applicant_id_number: String,
    pub amount: f64,
    pub term_days: u32,
}

/// A third party guaranteeing part or all of the loan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuarantorEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub guarantor_name: String,
    pub relationship: String,
    pub guarantor_contact: String,
    pub guarantor_id_number: String,
    pub guaranteed_amount: f64,
}

/// Loan-scoped next-of-kin record, distinct from the member's standing record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NextOfKinEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// An asset pledged against the loan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollateralItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub collateral_type: String,
    pub description: String,
    pub estimated_value: f64,
    pub owner_name: String,
    pub owner_contact: String,
}

/// The aggregate edited by the application workflow.
///
/// `id` is absent until the backend assigns one on create.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub basic: BasicInfo,
    #[serde(default)]
    pub guarantors: Vec<GuarantorEntry>,
    #[serde(default)]
    pub next_of_kin: Vec<NextOfKinEntry>,
    #[serde(default)]
    pub collateral: Vec<CollateralItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl LoanApplication {
    /// Application carrying only scalar fields; used for basic-info updates.
    pub fn basic_only(id: Option<u64>, basic: BasicInfo) -> Self {
        Self {
            id,
            basic,
            ..Self::default()
        }
    }
}

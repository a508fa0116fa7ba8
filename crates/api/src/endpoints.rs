//! REST paths consumed by the portal client, relative to the configured base URL.
//!
//! Section paths are scoped by the application identifier so that a
//! replace-section call can only ever overwrite the intended application.

use sacco_types::Section;
use sacco_util::http_path_resolution::build_path;

pub const LOAN_PRODUCTS: &str = "/loan-products";
pub const MEMBERS: &str = "/members";
pub const LOAN_APPLICATIONS: &str = "/loan-applications";
pub const LOAN_APPLICATION: &str = "/loan-applications/{loanId}";
pub const LOAN_APPLICATION_GUARANTORS: &str = "/loan-applications/{loanId}/guarantors";
pub const LOAN_APPLICATION_NEXT_OF_KIN: &str = "/loan-applications/{loanId}/next-of-kin";
pub const LOAN_APPLICATION_COLLATERAL: &str = "/loan-applications/{loanId}/collateral";

pub const AUTH_LOGIN: &str = "/auth/login";

/// Path prefixes that never carry the bearer token.
pub const PUBLIC_PATH_PREFIXES: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/auth/verify-otp",
    "/auth/resend-otp",
    "/auth/forgot-password",
    "/auth/reset-password",
];

pub fn loan_application(loan_id: u64) -> String {
    build_path(LOAN_APPLICATION, &[("loanId", &loan_id.to_string())])
}

/// Path of a section's entry collection; basic info maps to the application itself.
pub fn section(loan_id: u64, section: Section) -> String {
    let template = match section {
        Section::BasicInfo => LOAN_APPLICATION,
        Section::Guarantors => LOAN_APPLICATION_GUARANTORS,
        Section::NextOfKin => LOAN_APPLICATION_NEXT_OF_KIN,
        Section::Collateral => LOAN_APPLICATION_COLLATERAL,
    };
    build_path(template, &[("loanId", &loan_id.to_string())])
}

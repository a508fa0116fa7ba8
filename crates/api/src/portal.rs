use async_trait::async_trait;
use reqwest::Method;
use sacco_types::{CollateralItem, GuarantorEntry, LoanApplication, LoanProduct, Member, NextOfKinEntry, Section};
use serde_json::Value;

use crate::endpoints;
use crate::{ApiError, SaccoClient};

/// Remote operations consumed by the loan application workflow.
///
/// Replace-section calls overwrite the server's whole collection for one
/// section of one application; there is no incremental add/remove.
#[async_trait]
pub trait LoanPortalApi: Send + Sync {
    async fn list_loan_products(&self) -> Result<Vec<LoanProduct>, ApiError>;

    async fn list_members(&self) -> Result<Vec<Member>, ApiError>;

    async fn get_loan_application(&self, loan_id: u64) -> Result<LoanApplication, ApiError>;

    /// Persist a new application with every section as submitted.
    ///
    /// Any 2xx answer counts as created. The returned application is the
    /// submitted one overlaid with whatever the server echoed back; `id` stays
    /// `None` when the response carries no identifier.
    async fn create_loan_application(&self, application: &LoanApplication) -> Result<LoanApplication, ApiError>;

    /// Persist scalar field changes only.
    async fn update_loan_application(&self, loan_id: u64, application: &LoanApplication) -> Result<(), ApiError>;

    async fn fetch_guarantors(&self, loan_id: u64) -> Result<Vec<GuarantorEntry>, ApiError>;

    async fn replace_guarantors(&self, loan_id: u64, entries: &[GuarantorEntry]) -> Result<(), ApiError>;

    async fn fetch_next_of_kin(&self, loan_id: u64) -> Result<Vec<NextOfKinEntry>, ApiError>;

    async fn replace_next_of_kin(&self, loan_id: u64, entries: &[NextOfKinEntry]) -> Result<(), ApiError>;

    async fn fetch_collateral(&self, loan_id: u64) -> Result<Vec<CollateralItem>, ApiError>;

    async fn replace_collateral(&self, loan_id: u64, entries: &[CollateralItem]) -> Result<(), ApiError>;
}

#[async_trait]
impl LoanPortalApi for SaccoClient {
    async fn list_loan_products(&self) -> Result<Vec<LoanProduct>, ApiError> {
        self.get(endpoints::LOAN_PRODUCTS).await
    }

    async fn list_members(&self) -> Result<Vec<Member>, ApiError> {
        self.get(endpoints::MEMBERS).await
    }

    async fn get_loan_application(&self, loan_id: u64) -> Result<LoanApplication, ApiError> {
        self.get(&endpoints::loan_application(loan_id)).await
    }

    async fn create_loan_application(&self, application: &LoanApplication) -> Result<LoanApplication, ApiError> {
        let response: Value = self.send(Method::POST, endpoints::LOAN_APPLICATIONS, application).await?;
        Ok(created_application(application, response))
    }

    async fn update_loan_application(&self, loan_id: u64, application: &LoanApplication) -> Result<(), ApiError> {
        let _: Value = self
            .send(Method::PUT, &endpoints::loan_application(loan_id), application)
            .await?;
        Ok(())
    }

    async fn fetch_guarantors(&self, loan_id: u64) -> Result<Vec<GuarantorEntry>, ApiError> {
        self.get(&endpoints::section(loan_id, Section::Guarantors)).await
    }

    async fn replace_guarantors(&self, loan_id: u64, entries: &[GuarantorEntry]) -> Result<(), ApiError> {
        let _: Value = self
            .send(Method::PUT, &endpoints::section(loan_id, Section::Guarantors), entries)
            .await?;
        Ok(())
    }

    async fn fetch_next_of_kin(&self, loan_id: u64) -> Result<Vec<NextOfKinEntry>, ApiError> {
        self.get(&endpoints::section(loan_id, Section::NextOfKin)).await
    }

    async fn replace_next_of_kin(&self, loan_id: u64, entries: &[NextOfKinEntry]) -> Result<(), ApiError> {
        let _: Value = self
            .send(Method::PUT, &endpoints::section(loan_id, Section::NextOfKin), entries)
            .await?;
        Ok(())
    }

    async fn fetch_collateral(&self, loan_id: u64) -> Result<Vec<CollateralItem>, ApiError> {
        self.get(&endpoints::section(loan_id, Section::Collateral)).await
    }

    async fn replace_collateral(&self, loan_id: u64, entries: &[CollateralItem]) -> Result<(), ApiError> {
        let _: Value = self
            .send(Method::PUT, &endpoints::section(loan_id, Section::Collateral), entries)
            .await?;
        Ok(())
    }
}

/// Interpret a create response: a stored application, a partial object, a bare
/// id, or nothing at all.
fn created_application(submitted: &LoanApplication, response: Value) -> LoanApplication {
    let with_id = |id: Option<u64>| LoanApplication {
        id,
        ..submitted.clone()
    };
    match response {
        Value::Object(fields) => {
            let id = fields.get("id").and_then(assigned_id);
            let Ok(Value::Object(mut merged)) = serde_json::to_value(submitted) else {
                return with_id(id);
            };
            merged.extend(fields);
            serde_json::from_value(Value::Object(merged)).unwrap_or_else(|_| with_id(id))
        }
        other => with_id(assigned_id(&other)),
    }
}

fn assigned_id(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sacco_types::BasicInfo;
    use serde_json::json;

    fn submitted() -> LoanApplication {
        LoanApplication {
            basic: BasicInfo {
                loan_product_id: Some(3),
                member_id: Some(12),
                applicant_id_number: "29876543".into(),
                amount: 50_000.0,
                term_days: 180,
            },
            guarantors: vec![GuarantorEntry {
                guarantor_name: "Wanjiru".into(),
                relationship: "Sister".into(),
                guarantor_contact: "0712345678".into(),
                guarantor_id_number: "11223344".into(),
                guaranteed_amount: 20_000.0,
                ..GuarantorEntry::default()
            }],
            ..LoanApplication::default()
        }
    }

    #[test]
    fn empty_response_keeps_submission_without_id() {
        let created = created_application(&submitted(), Value::Null);
        assert_eq!(created, submitted());
        assert_eq!(created.id, None);
    }

    #[test]
    fn bare_id_is_adopted() {
        assert_eq!(created_application(&submitted(), json!(41)).id, Some(41));
        assert_eq!(created_application(&submitted(), json!("42")).id, Some(42));
        assert_eq!(created_application(&submitted(), json!(true)).id, None);
    }

    #[test]
    fn partial_object_overlays_submission() {
        let created = created_application(&submitted(), json!({ "id": 7, "status": "PENDING" }));
        assert_eq!(created.id, Some(7));
        assert_eq!(created.status.as_deref(), Some("PENDING"));
        assert_eq!(created.basic, submitted().basic);
        assert_eq!(created.guarantors, submitted().guarantors);
    }

    #[test]
    fn stored_sections_replace_submitted_ones() {
        let created = created_application(
            &submitted(),
            json!({ "id": 8, "guarantors": [{ "id": 90, "guarantorName": "Wanjiru" }] }),
        );
        assert_eq!(created.id, Some(8));
        assert_eq!(created.guarantors.len(), 1);
        assert_eq!(created.guarantors[0].id, Some(90));
    }

    #[test]
    fn mistyped_fields_fall_back_to_submission() {
        let created = created_application(&submitted(), json!({ "id": "9", "amount": "lots" }));
        assert_eq!(created.id, Some(9));
        assert_eq!(created.basic.amount, 50_000.0);
    }
}

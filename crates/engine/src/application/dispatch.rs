//! Choosing and issuing the remote write for a submitted form.
//!
//! Whether an application already has a durable id is the only input to the
//! create-versus-update decision. An existing application is never written
//! as a whole: only the current section is sent.

use sacco_api::{ApiError, LoanPortalApi};
use sacco_types::{CollateralItem, GuarantorEntry, LoanApplication, NextOfKinEntry, Section, ValidationErrors};
use tracing::{debug, info};

use crate::application::form::{ApplicationForm, FormMode};

/// Data for a single-section update of an existing application.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionPayload {
    /// Scalar fields only; child collections are left empty.
    BasicInfo(LoanApplication),
    Guarantors(Vec<GuarantorEntry>),
    NextOfKin(Vec<NextOfKinEntry>),
    Collateral(Vec<CollateralItem>),
}

impl SectionPayload {
    pub fn section(&self) -> Section {
        match self {
            SectionPayload::BasicInfo(_) => Section::BasicInfo,
            SectionPayload::Guarantors(_) => Section::Guarantors,
            SectionPayload::NextOfKin(_) => Section::NextOfKin,
            SectionPayload::Collateral(_) => Section::Collateral,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    CreateWhole(LoanApplication),
    UpdateSection {
        application_id: u64,
        payload: SectionPayload,
    },
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchReceipt {
    Created(LoanApplication),
    SectionUpdated { application_id: u64, section: Section },
}

impl DispatchReceipt {
    /// User-facing confirmation naming what was persisted.
    pub fn message(&self) -> String {
        match self {
            DispatchReceipt::Created(application) => match application.id {
                Some(id) => format!("Loan application {} created", id),
                None => "Loan application created".to_string(),
            },
            DispatchReceipt::SectionUpdated { application_id, section } => {
                format!("{} updated for application {}", section.label(), application_id)
            }
        }
    }

    pub fn section(&self) -> Option<Section> {
        match self {
            DispatchReceipt::Created(_) => None,
            DispatchReceipt::SectionUpdated { section, .. } => Some(*section),
        }
    }
}

impl Submission {
    /// Validate `form` and pick the write that persists it.
    ///
    /// Nothing is sent when validation fails.
    pub fn plan(form: &ApplicationForm) -> Result<Self, ValidationErrors> {
        form.validate()?;
        Ok(Self::from_form(form))
    }

    fn from_form(form: &ApplicationForm) -> Self {
        match form.mode() {
            FormMode::Create => Submission::CreateWhole(form.to_application()),
            FormMode::Edit { application_id } => {
                let payload = match form.current_section() {
                    Section::BasicInfo => {
                        SectionPayload::BasicInfo(LoanApplication::basic_only(Some(application_id), form.basic().clone()))
                    }
                    Section::Guarantors => SectionPayload::Guarantors(form.entries()),
                    Section::NextOfKin => SectionPayload::NextOfKin(form.entries()),
                    Section::Collateral => SectionPayload::Collateral(form.entries()),
                };
                Submission::UpdateSection {
                    application_id,
                    payload,
                }
            }
        }
    }

    /// Section written by an update; `None` for a whole-application create.
    pub fn section(&self) -> Option<Section> {
        match self {
            Submission::CreateWhole(_) => None,
            Submission::UpdateSection { payload, .. } => Some(payload.section()),
        }
    }

    /// Issue exactly one remote write.
    pub async fn dispatch<A>(&self, api: &A) -> Result<DispatchReceipt, ApiError>
    where
        A: LoanPortalApi + ?Sized,
    {
        match self {
            Submission::CreateWhole(application) => {
                debug!(
                    guarantors = application.guarantors.len(),
                    next_of_kin = application.next_of_kin.len(),
                    collateral = application.collateral.len(),
                    "creating loan application"
                );
                let created = api.create_loan_application(application).await?;
                info!(application_id = ?created.id, "loan application created");
                Ok(DispatchReceipt::Created(created))
            }
            Submission::UpdateSection {
                application_id,
                payload,
            } => {
                let application_id = *application_id;
                let section = payload.section();
                debug!(application_id, section = %section, "updating section");
                match payload {
                    SectionPayload::BasicInfo(application) => {
                        api.update_loan_application(application_id, application).await?
                    }
                    SectionPayload::Guarantors(entries) => api.replace_guarantors(application_id, entries).await?,
                    SectionPayload::NextOfKin(entries) => api.replace_next_of_kin(application_id, entries).await?,
                    SectionPayload::Collateral(entries) => api.replace_collateral(application_id, entries).await?,
                }
                info!(application_id, section = %section, "section updated");
                Ok(DispatchReceipt::SectionUpdated {
                    application_id,
                    section,
                })
            }
        }
    }
}

//! One create or edit session over a loan application.
//!
//! The session plays the part of the editing dialog: it owns the form for its
//! whole lifetime, turns remote failures into notifications, and closes after
//! a successful submission.

use std::sync::Arc;

use sacco_api::LoanPortalApi;
use sacco_types::{LoanApplication, Section, ValidationErrors};
use tracing::{debug, warn};

use crate::WorkflowError;
use crate::application::dispatch::{DispatchReceipt, Submission};
use crate::application::form::ApplicationForm;
use crate::application::loader::{SectionLoad, hydrate_section};
use crate::catalog::{CatalogQuery, CatalogReader};
use crate::notify::Notification;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Persisted; the session is now closed.
    Closed(DispatchReceipt),
    /// The remote write failed; form state is unchanged and may be resubmitted.
    KeptOpen,
    /// Field errors; nothing was sent.
    Invalid(ValidationErrors),
}

pub struct ApplicationSession<A: ?Sized> {
    api: Arc<A>,
    form: ApplicationForm,
    notifications: Vec<Notification>,
    closed: bool,
}

impl<A: ?Sized> std::fmt::Debug for ApplicationSession<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationSession")
            .field("form", &self.form)
            .field("notifications", &self.notifications)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<A: LoanPortalApi + ?Sized> ApplicationSession<A> {
    pub fn new(api: Arc<A>, form: ApplicationForm) -> Self {
        Self {
            api,
            form,
            notifications: Vec::new(),
            closed: false,
        }
    }

    /// Start a new application; only active products are offered.
    pub async fn open_create(catalog: &CatalogReader<A>) -> Result<Self, WorkflowError> {
        let products = catalog.loan_products(CatalogQuery::active()).await?;
        let members = catalog.members().await?;
        Ok(Self::new(Arc::clone(catalog.api()), ApplicationForm::new_create(products, members)))
    }

    /// Edit an application already in hand.
    ///
    /// The full catalog is used so a product withdrawn since the application
    /// was created still resolves.
    pub async fn open_edit(catalog: &CatalogReader<A>, application: &LoanApplication) -> Result<Self, WorkflowError> {
        let products = catalog.loan_products(CatalogQuery::default()).await?;
        let members = catalog.members().await?;
        Ok(Self::new(
            Arc::clone(catalog.api()),
            ApplicationForm::for_existing(application, products, members),
        ))
    }

    /// Fetch an application by id and edit it.
    pub async fn open_edit_by_id(catalog: &CatalogReader<A>, application_id: u64) -> Result<Self, WorkflowError> {
        let application = catalog
            .api()
            .get_loan_application(application_id)
            .await
            .map_err(|error| WorkflowError::remote(Some(Section::BasicInfo), error))?;
        let application = LoanApplication {
            id: application.id.or(Some(application_id)),
            ..application
        };
        Self::open_edit(catalog, &application).await
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn form(&self) -> &ApplicationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ApplicationForm {
        &mut self.form
    }

    /// Notifications raised so far, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Dismiss the session without submitting.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Switch to `section`, loading its entries on the first visit in edit mode.
    ///
    /// A failed load is reported as a notification and [`SectionLoad::Failed`];
    /// the section stays current and keeps whatever entries it had.
    pub async fn navigate(&mut self, section: Section) -> Result<SectionLoad, WorkflowError> {
        if self.closed {
            return Err(WorkflowError::SessionClosed);
        }
        self.form.set_current_section(section)?;
        match hydrate_section(&*self.api, &mut self.form, section).await {
            Ok(load) => Ok(load),
            Err(error) => {
                self.notifications.push(Notification::error(
                    Some(section),
                    format!("Failed to load {}: {}", section.label().to_lowercase(), failure_detail(&error)),
                ));
                if error.is_session_expired() { Err(error) } else { Ok(SectionLoad::Failed) }
            }
        }
    }

    /// Validate and persist the form.
    ///
    /// A create sends the whole application; an edit sends only the current
    /// section. A remote failure other than session expiry keeps the session
    /// open with its form intact.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, WorkflowError> {
        if self.closed {
            return Err(WorkflowError::SessionClosed);
        }
        let submission = match Submission::plan(&self.form) {
            Ok(submission) => submission,
            Err(errors) => {
                debug!(error_count = errors.len(), "submission blocked by validation");
                return Ok(SubmitOutcome::Invalid(errors));
            }
        };

        match submission.dispatch(&*self.api).await {
            Ok(receipt) => {
                self.notifications
                    .push(Notification::success(receipt.section(), receipt.message()));
                self.closed = true;
                Ok(SubmitOutcome::Closed(receipt))
            }
            Err(error) => {
                let section = submission.section();
                let subject = match section {
                    Some(section) => format!("update {}", section.label().to_lowercase()),
                    None => "create loan application".to_string(),
                };
                self.notifications
                    .push(Notification::error(section, format!("Failed to {}: {}", subject, error)));
                let error = WorkflowError::remote(section, error);
                if error.is_session_expired() {
                    warn!("session expired during submission");
                    return Err(error);
                }
                Ok(SubmitOutcome::KeptOpen)
            }
        }
    }
}

fn failure_detail(error: &WorkflowError) -> String {
    match error {
        WorkflowError::Remote { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

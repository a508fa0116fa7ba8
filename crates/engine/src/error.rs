use sacco_api::ApiError;
use sacco_types::{Section, ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{} request failed: {source}", .section.as_ref().map(Section::label).unwrap_or("Loan portal"))]
    Remote {
        section: Option<Section>,
        #[source]
        source: ApiError,
    },

    #[error("Loan product {0} is not in the catalog")]
    UnknownProduct(u64),

    #[error("Section '{0}' is not available for the selected loan product")]
    SectionUnavailable(Section),

    #[error("Editing session is closed")]
    SessionClosed,
}

impl WorkflowError {
    pub fn remote(section: Option<Section>, source: ApiError) -> Self {
        Self::Remote { section, source }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, WorkflowError::Remote { source, .. } if source.is_session_expired())
    }
}

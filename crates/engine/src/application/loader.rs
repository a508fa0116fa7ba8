//! Lazy hydration of repeatable sections.
//!
//! Each repeatable section moves `NotLoaded -> Loading -> Loaded` at most once
//! per editing session. A failed fetch moves it back to `NotLoaded` and leaves
//! the in-memory entries untouched, so revisiting the section retries.

use sacco_api::LoanPortalApi;
use sacco_types::Section;
use tracing::{debug, info};

use crate::WorkflowError;
use crate::application::form::ApplicationForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
}

/// Per-section load flags for guarantors, next of kin and collateral.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionLoadStates {
    guarantors: LoadState,
    next_of_kin: LoadState,
    collateral: LoadState,
}

impl SectionLoadStates {
    /// `None` for basic info, which is never loaded separately.
    pub fn get(&self, section: Section) -> Option<LoadState> {
        match section {
            Section::BasicInfo => None,
            Section::Guarantors => Some(self.guarantors),
            Section::NextOfKin => Some(self.next_of_kin),
            Section::Collateral => Some(self.collateral),
        }
    }

    pub fn is_loaded(&self, section: Section) -> bool {
        self.get(section) == Some(LoadState::Loaded)
    }

    fn slot(&mut self, section: Section) -> Option<&mut LoadState> {
        match section {
            Section::BasicInfo => None,
            Section::Guarantors => Some(&mut self.guarantors),
            Section::NextOfKin => Some(&mut self.next_of_kin),
            Section::Collateral => Some(&mut self.collateral),
        }
    }

    fn set(&mut self, section: Section, state: LoadState) {
        if let Some(slot) = self.slot(section) {
            *slot = state;
        }
    }

    pub(crate) fn begin(&mut self, section: Section) {
        self.set(section, LoadState::Loading);
    }

    pub(crate) fn finish(&mut self, section: Section) {
        self.set(section, LoadState::Loaded);
    }

    pub(crate) fn fail(&mut self, section: Section) {
        self.set(section, LoadState::NotLoaded);
    }
}

/// What a navigation did about remote data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLoad {
    /// Create mode or basic info: nothing to fetch.
    NotNeeded,
    AlreadyLoaded,
    Loaded { count: usize },
    /// The fetch failed; the section stays retryable.
    Failed,
}

/// Fetch `section`'s entries once for an existing application.
///
/// On success the section's array is replaced by the fetched entries. On
/// failure the array is left as it was and the error is returned.
pub(crate) async fn hydrate_section<A>(
    api: &A,
    form: &mut ApplicationForm,
    section: Section,
) -> Result<SectionLoad, WorkflowError>
where
    A: LoanPortalApi + ?Sized,
{
    let Some(application_id) = form.application_id() else {
        return Ok(SectionLoad::NotNeeded);
    };
    match form.loads().get(section) {
        None => return Ok(SectionLoad::NotNeeded),
        Some(LoadState::Loaded) => {
            debug!(application_id, section = %section, "section already loaded");
            return Ok(SectionLoad::AlreadyLoaded);
        }
        // A `Loading` state seen here belongs to an attempt whose future was dropped.
        Some(LoadState::NotLoaded | LoadState::Loading) => {}
    }

    form.loads_mut().begin(section);
    debug!(application_id, section = %section, "loading section");
    let fetched = match section {
        Section::Guarantors => api
            .fetch_guarantors(application_id)
            .await
            .map(|entries| form.replace_section_entries(entries)),
        Section::NextOfKin => api
            .fetch_next_of_kin(application_id)
            .await
            .map(|entries| form.replace_section_entries(entries)),
        Section::Collateral => api
            .fetch_collateral(application_id)
            .await
            .map(|entries| form.replace_section_entries(entries)),
        Section::BasicInfo => Ok(0),
    };

    match fetched {
        Ok(count) => {
            form.loads_mut().finish(section);
            info!(application_id, section = %section, count, "section loaded");
            Ok(SectionLoad::Loaded { count })
        }
        Err(error) => {
            form.loads_mut().fail(section);
            Err(WorkflowError::remote(Some(section), error))
        }
    }
}

//! Authoritative form state for one loan application editing session.

use sacco_types::{
    BasicInfo, CollateralItem, GuarantorEntry, LoanApplication, LoanProduct, Member, NextOfKinEntry, Section,
    SectionEntry, ValidationErrors, validate_basic_info, validate_cardinality,
};
use tracing::debug;

use crate::WorkflowError;
use crate::application::field_array::FieldArray;
use crate::application::loader::SectionLoadStates;
use crate::application::sections::{reconcile_section, visible_sections};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// No durable application yet; submission creates the whole aggregate.
    Create,
    /// The application exists; submission updates only the current section.
    Edit { application_id: u64 },
}

/// Maps an entry type to the form array holding it.
pub(crate) trait FormEntry: SectionEntry {
    fn rows(form: &ApplicationForm) -> &FieldArray<Self>;
    fn rows_mut(form: &mut ApplicationForm) -> &mut FieldArray<Self>;
}

impl FormEntry for GuarantorEntry {
    fn rows(form: &ApplicationForm) -> &FieldArray<Self> {
        &form.guarantors
    }
    fn rows_mut(form: &mut ApplicationForm) -> &mut FieldArray<Self> {
        &mut form.guarantors
    }
}

impl FormEntry for NextOfKinEntry {
    fn rows(form: &ApplicationForm) -> &FieldArray<Self> {
        &form.next_of_kin
    }
    fn rows_mut(form: &mut ApplicationForm) -> &mut FieldArray<Self> {
        &mut form.next_of_kin
    }
}

impl FormEntry for CollateralItem {
    fn rows(form: &ApplicationForm) -> &FieldArray<Self> {
        &form.collateral
    }
    fn rows_mut(form: &mut ApplicationForm) -> &mut FieldArray<Self> {
        &mut form.collateral
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationForm {
    mode: FormMode,
    products: Vec<LoanProduct>,
    members: Vec<Member>,
    basic: BasicInfo,
    guarantors: FieldArray<GuarantorEntry>,
    next_of_kin: FieldArray<NextOfKinEntry>,
    collateral: FieldArray<CollateralItem>,
    status: Option<String>,
    current: Section,
    loads: SectionLoadStates,
}

impl ApplicationForm {
    /// Empty form for a new application.
    pub fn new_create(products: Vec<LoanProduct>, members: Vec<Member>) -> Self {
        Self {
            mode: FormMode::Create,
            products,
            members,
            basic: BasicInfo::default(),
            guarantors: FieldArray::new(),
            next_of_kin: FieldArray::new(),
            collateral: FieldArray::new(),
            status: None,
            current: Section::BasicInfo,
            loads: SectionLoadStates::default(),
        }
    }

    /// Form populated from an application already in hand.
    ///
    /// Every field and child collection is taken from `application` without
    /// network calls. Load flags still start unset, so the first visit to a
    /// repeatable section refreshes it from the backend. An application
    /// without an id is edited in create mode.
    pub fn for_existing(application: &LoanApplication, products: Vec<LoanProduct>, members: Vec<Member>) -> Self {
        let mode = match application.id {
            Some(application_id) => FormMode::Edit { application_id },
            None => FormMode::Create,
        };
        Self {
            mode,
            basic: application.basic.clone(),
            guarantors: FieldArray::from_entries(application.guarantors.iter().cloned()),
            next_of_kin: FieldArray::from_entries(application.next_of_kin.iter().cloned()),
            collateral: FieldArray::from_entries(application.collateral.iter().cloned()),
            status: application.status.clone(),
            ..Self::new_create(products, members)
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn is_new(&self) -> bool {
        self.mode == FormMode::Create
    }

    pub fn application_id(&self) -> Option<u64> {
        match self.mode {
            FormMode::Create => None,
            FormMode::Edit { application_id } => Some(application_id),
        }
    }

    pub fn products(&self) -> &[LoanProduct] {
        &self.products
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn basic(&self) -> &BasicInfo {
        &self.basic
    }

    /// Edit scalar fields. A product change made here is reconciled like
    /// [`ApplicationForm::select_product`], without the catalog check.
    pub fn edit_basic(&mut self, edit: impl FnOnce(&mut BasicInfo)) {
        edit(&mut self.basic);
        self.reconcile_current();
    }

    /// The catalog entry for the selected product, if any.
    pub fn selected_product(&self) -> Option<&LoanProduct> {
        let id = self.basic.loan_product_id?;
        self.products.iter().find(|product| product.id == id)
    }

    /// Select a catalog product, pruning sections it does not require.
    pub fn select_product(&mut self, product_id: u64) -> Result<(), WorkflowError> {
        if !self.products.iter().any(|product| product.id == product_id) {
            return Err(WorkflowError::UnknownProduct(product_id));
        }
        self.basic.loan_product_id = Some(product_id);
        self.reconcile_current();
        Ok(())
    }

    pub fn clear_product(&mut self) {
        self.basic.loan_product_id = None;
        self.reconcile_current();
    }

    pub fn visible_sections(&self) -> Vec<Section> {
        visible_sections(self.selected_product())
    }

    pub fn is_visible(&self, section: Section) -> bool {
        section == Section::BasicInfo || self.selected_product().is_some_and(|product| product.requires(section))
    }

    pub fn current_section(&self) -> Section {
        self.current
    }

    pub fn set_current_section(&mut self, section: Section) -> Result<(), WorkflowError> {
        if !self.is_visible(section) {
            return Err(WorkflowError::SectionUnavailable(section));
        }
        self.current = section;
        Ok(())
    }

    fn reconcile_current(&mut self) {
        let visible = self.visible_sections();
        let next = reconcile_section(self.current, &visible);
        if next != self.current {
            debug!(from = %self.current, to = %next, "current section no longer visible");
            self.current = next;
        }
    }

    pub fn guarantors(&self) -> &FieldArray<GuarantorEntry> {
        &self.guarantors
    }

    pub fn guarantors_mut(&mut self) -> &mut FieldArray<GuarantorEntry> {
        &mut self.guarantors
    }

    pub fn next_of_kin(&self) -> &FieldArray<NextOfKinEntry> {
        &self.next_of_kin
    }

    pub fn next_of_kin_mut(&mut self) -> &mut FieldArray<NextOfKinEntry> {
        &mut self.next_of_kin
    }

    pub fn collateral(&self) -> &FieldArray<CollateralItem> {
        &self.collateral
    }

    pub fn collateral_mut(&mut self) -> &mut FieldArray<CollateralItem> {
        &mut self.collateral
    }

    /// Number of rows held for a repeatable section; zero for basic info.
    pub fn entry_count(&self, section: Section) -> usize {
        match section {
            Section::BasicInfo => 0,
            Section::Guarantors => self.guarantors.len(),
            Section::NextOfKin => self.next_of_kin.len(),
            Section::Collateral => self.collateral.len(),
        }
    }

    pub(crate) fn entries<T: FormEntry>(&self) -> Vec<T> {
        T::rows(self).entries()
    }

    /// Replace a section's rows with fetched entries; returns the new row count.
    pub(crate) fn replace_section_entries<T: FormEntry>(&mut self, entries: Vec<T>) -> usize {
        let rows = T::rows_mut(self);
        rows.replace_all(entries);
        rows.len()
    }

    pub fn loads(&self) -> &SectionLoadStates {
        &self.loads
    }

    pub(crate) fn loads_mut(&mut self) -> &mut SectionLoadStates {
        &mut self.loads
    }

    /// Validate basic info and every visible section.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let product = self.selected_product();
        validate_basic_info(&self.basic, product, self.is_new(), &mut errors);
        if let Some(product) = product {
            for section in self.visible_sections().into_iter().filter(Section::is_repeatable) {
                match section {
                    Section::Guarantors => self.guarantors.validate(&mut errors),
                    Section::NextOfKin => self.next_of_kin.validate(&mut errors),
                    Section::Collateral => self.collateral.validate(&mut errors),
                    Section::BasicInfo => {}
                }
                validate_cardinality(section, self.entry_count(section), product.max_entries(section), &mut errors);
            }
        }
        errors.into_result()
    }

    /// Snapshot of the form as a wire aggregate.
    ///
    /// Sections hidden by the selected product are sent empty.
    pub fn to_application(&self) -> LoanApplication {
        LoanApplication {
            id: self.application_id(),
            basic: self.basic.clone(),
            guarantors: self.visible_entries::<GuarantorEntry>(),
            next_of_kin: self.visible_entries::<NextOfKinEntry>(),
            collateral: self.visible_entries::<CollateralItem>(),
            status: self.status.clone(),
        }
    }

    fn visible_entries<T: FormEntry>(&self) -> Vec<T> {
        if self.is_visible(T::SECTION) { self.entries() } else { Vec::new() }
    }
}

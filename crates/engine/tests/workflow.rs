use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sacco_api::{ApiError, LoanPortalApi};
use sacco_engine::{
    ApplicationSession, CatalogQuery, CatalogReader, DispatchReceipt, NotificationLevel, SectionLoad, SubmitOutcome,
    WorkflowError,
};
use sacco_types::{
    BasicInfo, CollateralItem, GuarantorEntry, LoanApplication, LoanProduct, Member, NextOfKinEntry, Section,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    ListProducts,
    ListMembers,
    GetApplication(u64),
    Create(LoanApplication),
    Update(u64, LoanApplication),
    FetchGuarantors(u64),
    ReplaceGuarantors(u64, Vec<GuarantorEntry>),
    FetchNextOfKin(u64),
    ReplaceNextOfKin(u64, Vec<NextOfKinEntry>),
    FetchCollateral(u64),
    ReplaceCollateral(u64, Vec<CollateralItem>),
}

impl Call {
    fn name(&self) -> &'static str {
        match self {
            Call::ListProducts => "list_products",
            Call::ListMembers => "list_members",
            Call::GetApplication(_) => "get_application",
            Call::Create(_) => "create",
            Call::Update(..) => "update",
            Call::FetchGuarantors(_) => "fetch_guarantors",
            Call::ReplaceGuarantors(..) => "replace_guarantors",
            Call::FetchNextOfKin(_) => "fetch_next_of_kin",
            Call::ReplaceNextOfKin(..) => "replace_next_of_kin",
            Call::FetchCollateral(_) => "fetch_collateral",
            Call::ReplaceCollateral(..) => "replace_collateral",
        }
    }
}

/// Call-recording portal with canned responses.
#[derive(Debug, Default)]
struct MockPortal {
    products: Vec<LoanProduct>,
    members: Vec<Member>,
    application: Option<LoanApplication>,
    guarantors: Vec<GuarantorEntry>,
    next_of_kin: Vec<NextOfKinEntry>,
    collateral: Vec<CollateralItem>,
    /// Operation name to HTTP status it fails with; 401 means session expiry.
    failures: Mutex<HashMap<&'static str, u16>>,
    calls: Mutex<Vec<Call>>,
}

impl MockPortal {
    fn new() -> Self {
        Self {
            products: catalog(),
            members: vec![serde_json::from_value(json!({
                "id": 9, "firstName": "Amina", "lastName": "Otieno", "idNumber": "12345678"
            }))
            .unwrap()],
            ..Self::default()
        }
    }

    fn fail(&self, operation: &'static str, status: u16) {
        self.failures.lock().unwrap().insert(operation, status);
    }

    fn recover(&self, operation: &'static str) {
        self.failures.lock().unwrap().remove(operation);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|call| call.name() == operation).count()
    }

    /// Calls other than catalog reads made while opening a session.
    fn writes_and_fetches(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::ListProducts | Call::ListMembers | Call::GetApplication(_)))
            .collect()
    }

    fn record<T>(&self, call: Call, value: T) -> Result<T, ApiError> {
        let operation = call.name();
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(operation) {
            Some(401) => Err(ApiError::SessionExpired),
            Some(status) => Err(ApiError::status(*status, "backend unavailable")),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl LoanPortalApi for MockPortal {
    async fn list_loan_products(&self) -> Result<Vec<LoanProduct>, ApiError> {
        self.record(Call::ListProducts, self.products.clone())
    }

    async fn list_members(&self) -> Result<Vec<Member>, ApiError> {
        self.record(Call::ListMembers, self.members.clone())
    }

    async fn get_loan_application(&self, loan_id: u64) -> Result<LoanApplication, ApiError> {
        let application = self.application.clone().unwrap_or_default();
        self.record(Call::GetApplication(loan_id), application)
    }

    async fn create_loan_application(&self, application: &LoanApplication) -> Result<LoanApplication, ApiError> {
        let created = LoanApplication {
            id: Some(101),
            ..application.clone()
        };
        self.record(Call::Create(application.clone()), created)
    }

    async fn update_loan_application(&self, loan_id: u64, application: &LoanApplication) -> Result<(), ApiError> {
        self.record(Call::Update(loan_id, application.clone()), ())
    }

    async fn fetch_guarantors(&self, loan_id: u64) -> Result<Vec<GuarantorEntry>, ApiError> {
        self.record(Call::FetchGuarantors(loan_id), self.guarantors.clone())
    }

    async fn replace_guarantors(&self, loan_id: u64, entries: &[GuarantorEntry]) -> Result<(), ApiError> {
        self.record(Call::ReplaceGuarantors(loan_id, entries.to_vec()), ())
    }

    async fn fetch_next_of_kin(&self, loan_id: u64) -> Result<Vec<NextOfKinEntry>, ApiError> {
        self.record(Call::FetchNextOfKin(loan_id), self.next_of_kin.clone())
    }

    async fn replace_next_of_kin(&self, loan_id: u64, entries: &[NextOfKinEntry]) -> Result<(), ApiError> {
        self.record(Call::ReplaceNextOfKin(loan_id, entries.to_vec()), ())
    }

    async fn fetch_collateral(&self, loan_id: u64) -> Result<Vec<CollateralItem>, ApiError> {
        self.record(Call::FetchCollateral(loan_id), self.collateral.clone())
    }

    async fn replace_collateral(&self, loan_id: u64, entries: &[CollateralItem]) -> Result<(), ApiError> {
        self.record(Call::ReplaceCollateral(loan_id, entries.to_vec()), ())
    }
}

const EMERGENCY_LOAN: u64 = 1;
const FAMILY_LOAN: u64 = 2;
const ASSET_LOAN: u64 = 3;

fn catalog() -> Vec<LoanProduct> {
    serde_json::from_value(json!([
        { "id": EMERGENCY_LOAN, "name": "Emergency Loan", "minAmount": 1000.0, "maxAmount": 50000.0,
          "minTermDays": 30, "maxTermDays": 180, "requiresGuarantor": true,
          "requiresCollateral": false, "requiresNextOfKin": false },
        { "id": FAMILY_LOAN, "name": "Family Loan", "requiresNextOfKin": true, "requiresGuarantor": true },
        { "id": ASSET_LOAN, "name": "Asset Loan", "requiresCollateral": true, "isActive": false }
    ]))
    .unwrap()
}

fn basic(product: u64) -> BasicInfo {
    BasicInfo {
        loan_product_id: Some(product),
        member_id: Some(9),
        applicant_id_number: "12345678".into(),
        amount: 5000.0,
        term_days: 90,
    }
}

fn guarantor(name: &str) -> GuarantorEntry {
    GuarantorEntry {
        id: None,
        guarantor_name: name.into(),
        relationship: "Colleague".into(),
        guarantor_contact: "0722000111".into(),
        guarantor_id_number: "33445566".into(),
        guaranteed_amount: 2500.0,
    }
}

fn kin(name: &str) -> NextOfKinEntry {
    NextOfKinEntry {
        id: Some(5),
        name: name.into(),
        relationship: "Spouse".into(),
        phone: "0733000222".into(),
        email: "kin@example.com".into(),
        address: "Nairobi".into(),
    }
}

fn existing(id: u64, product: u64) -> LoanApplication {
    LoanApplication {
        id: Some(id),
        basic: basic(product),
        status: Some("PENDING".into()),
        ..LoanApplication::default()
    }
}

fn reader(api: &Arc<MockPortal>) -> CatalogReader<MockPortal> {
    CatalogReader::new(Arc::clone(api), Duration::from_secs(300))
}

async fn create_session(api: &Arc<MockPortal>) -> ApplicationSession<MockPortal> {
    ApplicationSession::open_create(&reader(api)).await.unwrap()
}

async fn edit_session(api: &Arc<MockPortal>, application: &LoanApplication) -> ApplicationSession<MockPortal> {
    ApplicationSession::open_edit(&reader(api), application).await.unwrap()
}

#[tokio::test]
async fn scenario_a_emergency_loan_shows_basic_info_and_guarantors() {
    let api = Arc::new(MockPortal::new());
    let mut session = create_session(&api).await;
    session.form_mut().select_product(EMERGENCY_LOAN).unwrap();
    assert_eq!(session.form().visible_sections(), vec![Section::BasicInfo, Section::Guarantors]);
}

#[tokio::test]
async fn scenario_b_first_visit_fetches_next_of_kin_once() {
    let api = Arc::new(MockPortal {
        next_of_kin: vec![kin("Wanjiku")],
        ..MockPortal::new()
    });
    let mut session = edit_session(&api, &existing(42, FAMILY_LOAN)).await;

    let first = session.navigate(Section::NextOfKin).await.unwrap();
    assert_eq!(first, SectionLoad::Loaded { count: 1 });
    assert_eq!(session.form().next_of_kin().entries(), vec![kin("Wanjiku")]);

    session.navigate(Section::BasicInfo).await.unwrap();
    let again = session.navigate(Section::NextOfKin).await.unwrap();
    assert_eq!(again, SectionLoad::AlreadyLoaded);
    assert_eq!(api.writes_and_fetches(), vec![Call::FetchNextOfKin(42)]);
}

#[tokio::test]
async fn scenario_c_invalid_guarantor_blocks_network_call() {
    let api = Arc::new(MockPortal::new());
    let mut session = edit_session(&api, &existing(42, EMERGENCY_LOAN)).await;
    session.navigate(Section::Guarantors).await.unwrap();
    let before = api.writes_and_fetches();

    let mut incomplete = guarantor("Brian");
    incomplete.guarantor_contact.clear();
    session.form_mut().guarantors_mut().append(guarantor("Akinyi"));
    session.form_mut().guarantors_mut().append(incomplete);

    let outcome = session.submit().await.unwrap();
    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected field errors");
    };
    assert_eq!(errors.len(), 1);
    assert!(errors.find(Section::Guarantors, Some(1), "guarantorContact").is_some());
    assert_eq!(api.writes_and_fetches(), before);
    assert!(!session.is_closed());
}

#[tokio::test]
async fn scenario_d_valid_guarantors_issue_one_replace_call() {
    let api = Arc::new(MockPortal::new());
    let application = existing(42, EMERGENCY_LOAN);
    let mut session = edit_session(&api, &application).await;
    session.navigate(Section::Guarantors).await.unwrap();
    session.form_mut().guarantors_mut().append(guarantor("Akinyi"));
    session.form_mut().guarantors_mut().append(guarantor("Brian"));

    let outcome = session.submit().await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Closed(DispatchReceipt::SectionUpdated {
            application_id: 42,
            section: Section::Guarantors,
        })
    );
    assert_eq!(
        api.writes_and_fetches(),
        vec![
            Call::FetchGuarantors(42),
            Call::ReplaceGuarantors(42, vec![guarantor("Akinyi"), guarantor("Brian")]),
        ]
    );
    assert_eq!(api.count("update"), 0);

    let notification = session.last_notification().unwrap();
    assert_eq!(notification.level, NotificationLevel::Success);
    assert_eq!(notification.section, Some(Section::Guarantors));
    assert!(notification.message.to_lowercase().contains("guarantors"));
    assert_eq!(session.form().basic(), &application.basic);
    assert!(session.is_closed());
}

#[tokio::test]
async fn scenario_e_create_sends_one_whole_application() {
    let api = Arc::new(MockPortal::new());
    let mut session = create_session(&api).await;
    session.form_mut().select_product(EMERGENCY_LOAN).unwrap();
    session.form_mut().edit_basic(|info| *info = basic(EMERGENCY_LOAN));
    session.form_mut().guarantors_mut().append(guarantor("Akinyi"));

    let outcome = session.submit().await.unwrap();
    let SubmitOutcome::Closed(DispatchReceipt::Created(created)) = outcome else {
        panic!("expected a created application");
    };
    assert_eq!(created.id, Some(101));

    let writes = api.writes_and_fetches();
    assert_eq!(writes.len(), 1);
    let Call::Create(payload) = &writes[0] else {
        panic!("expected a create call, got {:?}", writes[0]);
    };
    assert_eq!(payload.id, None);
    assert_eq!(payload.guarantors, vec![guarantor("Akinyi")]);
    assert!(payload.next_of_kin.is_empty());
    assert!(payload.collateral.is_empty());

    let wire = serde_json::to_value(payload).unwrap();
    assert_eq!(wire["nextOfKin"], json!([]));
    assert_eq!(wire["collateral"], json!([]));
}

#[tokio::test]
async fn create_mode_never_fetches_sections() {
    let api = Arc::new(MockPortal::new());
    let mut session = create_session(&api).await;
    session.form_mut().select_product(FAMILY_LOAN).unwrap();
    for section in [Section::Guarantors, Section::NextOfKin, Section::Guarantors, Section::BasicInfo] {
        assert_eq!(session.navigate(section).await.unwrap(), SectionLoad::NotNeeded);
    }
    assert!(api.writes_and_fetches().is_empty());
}

#[tokio::test]
async fn failed_load_keeps_entries_and_retries_on_next_visit() {
    let api = Arc::new(MockPortal {
        guarantors: vec![guarantor("Server copy")],
        ..MockPortal::new()
    });
    let application = LoanApplication {
        guarantors: vec![guarantor("Local copy")],
        ..existing(42, EMERGENCY_LOAN)
    };
    let mut session = edit_session(&api, &application).await;
    api.fail("fetch_guarantors", 503);

    assert_eq!(session.navigate(Section::Guarantors).await.unwrap(), SectionLoad::Failed);
    assert_eq!(session.form().guarantors().entries(), vec![guarantor("Local copy")]);
    assert_eq!(session.form().current_section(), Section::Guarantors);
    let notification = session.last_notification().unwrap();
    assert!(notification.is_error());
    assert_eq!(notification.section, Some(Section::Guarantors));

    api.recover("fetch_guarantors");
    assert_eq!(
        session.navigate(Section::Guarantors).await.unwrap(),
        SectionLoad::Loaded { count: 1 }
    );
    assert_eq!(session.form().guarantors().entries(), vec![guarantor("Server copy")]);
    assert_eq!(api.count("fetch_guarantors"), 2);
}

#[tokio::test]
async fn failed_submission_preserves_form_and_names_section() {
    let api = Arc::new(MockPortal::new());
    let mut session = edit_session(&api, &existing(42, FAMILY_LOAN)).await;
    session.navigate(Section::NextOfKin).await.unwrap();
    session.form_mut().next_of_kin_mut().append(kin("Otieno"));
    api.fail("replace_next_of_kin", 500);

    assert_eq!(session.submit().await.unwrap(), SubmitOutcome::KeptOpen);
    assert!(!session.is_closed());
    assert_eq!(session.form().next_of_kin().entries(), vec![kin("Otieno")]);
    let notification = session.last_notification().unwrap();
    assert!(notification.is_error());
    assert!(notification.message.contains("next of kin"), "{}", notification.message);

    api.recover("replace_next_of_kin");
    assert!(matches!(session.submit().await.unwrap(), SubmitOutcome::Closed(_)));
    assert_eq!(api.count("replace_next_of_kin"), 2);
    assert!(matches!(session.submit().await, Err(WorkflowError::SessionClosed)));
}

#[tokio::test]
async fn session_expiry_is_returned_to_the_caller() {
    let api = Arc::new(MockPortal::new());
    let mut session = edit_session(&api, &existing(42, EMERGENCY_LOAN)).await;
    api.fail("update", 401);

    let error = session.submit().await.unwrap_err();
    assert!(error.is_session_expired());
    assert!(!session.is_closed());
}

#[tokio::test]
async fn basic_info_update_sends_scalars_only() {
    let api = Arc::new(MockPortal::new());
    let application = LoanApplication {
        guarantors: vec![guarantor("Akinyi")],
        ..existing(42, EMERGENCY_LOAN)
    };
    let mut session = edit_session(&api, &application).await;
    session.form_mut().edit_basic(|info| info.amount = 7500.0);

    assert!(matches!(session.submit().await.unwrap(), SubmitOutcome::Closed(_)));
    let writes = api.writes_and_fetches();
    let [Call::Update(42, sent)] = writes.as_slice() else {
        panic!("expected one basic-info update, got {:?}", writes);
    };
    assert_eq!(sent.basic.amount, 7500.0);
    assert!(sent.guarantors.is_empty());
}

#[tokio::test]
async fn switching_product_resets_only_removed_tabs() {
    let api = Arc::new(MockPortal::new());
    let mut session = create_session(&api).await;
    let form = session.form_mut();

    form.select_product(FAMILY_LOAN).unwrap();
    form.set_current_section(Section::Guarantors).unwrap();
    form.select_product(EMERGENCY_LOAN).unwrap();
    assert_eq!(form.current_section(), Section::Guarantors);

    form.set_current_section(Section::Guarantors).unwrap();
    form.select_product(FAMILY_LOAN).unwrap();
    form.set_current_section(Section::NextOfKin).unwrap();
    form.select_product(EMERGENCY_LOAN).unwrap();
    assert_eq!(form.current_section(), Section::BasicInfo);
}

#[tokio::test]
async fn edit_by_id_fetches_the_application_first() {
    let api = Arc::new(MockPortal {
        application: Some(existing(42, EMERGENCY_LOAN)),
        ..MockPortal::new()
    });
    let session = ApplicationSession::open_edit_by_id(&reader(&api), 42).await.unwrap();
    assert_eq!(session.form().application_id(), Some(42));
    assert_eq!(api.calls()[0], Call::GetApplication(42));
}

#[tokio::test]
async fn create_sessions_only_offer_active_products() {
    let api = Arc::new(MockPortal::new());
    let session = create_session(&api).await;
    let offered: Vec<u64> = session.form().products().iter().map(|product| product.id).collect();
    assert_eq!(offered, vec![EMERGENCY_LOAN, FAMILY_LOAN]);

    let edit = edit_session(&api, &existing(7, ASSET_LOAN)).await;
    assert_eq!(edit.form().visible_sections(), vec![Section::BasicInfo, Section::Collateral]);
}

#[tokio::test]
async fn catalog_reads_are_cached_by_query() {
    let api = Arc::new(MockPortal::new());
    let catalog = reader(&api);

    let all = catalog.loan_products(CatalogQuery::default()).await.unwrap();
    let active = catalog.loan_products(CatalogQuery::active()).await.unwrap();
    catalog.loan_products(CatalogQuery::active()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(active.len(), 2);
    assert_eq!(api.count("list_products"), 1);

    catalog.members().await.unwrap();
    catalog.members().await.unwrap();
    assert_eq!(api.count("list_members"), 1);

    catalog.invalidate();
    catalog.loan_products(CatalogQuery::active()).await.unwrap();
    assert_eq!(api.count("list_products"), 2);
}

#[tokio::test]
async fn catalog_failure_is_a_remote_error() {
    let api = Arc::new(MockPortal::new());
    api.fail("list_products", 502);
    let error = ApplicationSession::open_create(&reader(&api)).await.unwrap_err();
    assert!(matches!(error, WorkflowError::Remote { section: None, .. }));
}

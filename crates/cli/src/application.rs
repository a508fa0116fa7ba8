use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Method;
use sacco_api::{SaccoClient, endpoints};
use sacco_engine::{
    ApplicationSession, CatalogReader, DispatchReceipt, SectionLoad, SectionPayload, SubmitOutcome, Submission,
};
use sacco_types::{
    BasicInfo, CollateralItem, GuarantorEntry, LoanApplication, NextOfKinEntry, Section, ValidationErrors,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ApplicationCommand;

pub(crate) async fn run(catalog: &CatalogReader<SaccoClient>, command: ApplicationCommand) -> Result<()> {
    match command {
        ApplicationCommand::Create { file, dry_run } => {
            let draft: LoanApplication = read_json(&file)?;
            let mut session = ApplicationSession::open_create(catalog).await?;
            let form = session.form_mut();
            if let Some(product_id) = draft.basic.loan_product_id {
                form.select_product(product_id)?;
            }
            form.edit_basic(|basic| *basic = draft.basic.clone());
            form.guarantors_mut().extend(draft.guarantors);
            form.next_of_kin_mut().extend(draft.next_of_kin);
            form.collateral_mut().extend(draft.collateral);
            finish(session, dry_run).await
        }
        ApplicationCommand::Show { id, section } => {
            let mut session = ApplicationSession::open_edit_by_id(catalog, id).await?;
            let Some(section) = section else {
                return print_json(&session.form().to_application());
            };
            if session.navigate(section).await? == SectionLoad::Failed {
                bail!(last_message(&session));
            }
            let application = session.form().to_application();
            match section {
                Section::BasicInfo => print_json(&application.basic),
                Section::Guarantors => print_json(&application.guarantors),
                Section::NextOfKin => print_json(&application.next_of_kin),
                Section::Collateral => print_json(&application.collateral),
            }
        }
        ApplicationCommand::Edit {
            id,
            section,
            file,
            dry_run,
        } => {
            let mut session = ApplicationSession::open_edit_by_id(catalog, id).await?;
            if session.navigate(section).await? == SectionLoad::Failed {
                bail!(last_message(&session));
            }
            let form = session.form_mut();
            match section {
                Section::BasicInfo => {
                    let basic = merge_basic_info(form.basic(), read_json(&file)?)?;
                    form.edit_basic(|current| *current = basic);
                }
                Section::Guarantors => form.guarantors_mut().replace_all(read_json::<Vec<GuarantorEntry>>(&file)?),
                Section::NextOfKin => form.next_of_kin_mut().replace_all(read_json::<Vec<NextOfKinEntry>>(&file)?),
                Section::Collateral => form.collateral_mut().replace_all(read_json::<Vec<CollateralItem>>(&file)?),
            }
            // A basic-info edit may switch products and hide the section being edited.
            if form.current_section() != section {
                bail!("section '{}' is not available for the selected loan product", section);
            }
            finish(session, dry_run).await
        }
    }
}

async fn finish(mut session: ApplicationSession<SaccoClient>, dry_run: bool) -> Result<()> {
    if dry_run {
        let submission = match Submission::plan(session.form()) {
            Ok(submission) => submission,
            Err(errors) => return report_invalid(&errors),
        };
        debug!(section = %session.form().current_section(), "dry run; printing the planned request");
        return print_planned_request(session.api(), &submission);
    }

    match session.submit().await? {
        SubmitOutcome::Closed(receipt) => {
            info!(receipt = %receipt.message(), "submission accepted");
            if let Some(notification) = session.last_notification() {
                eprintln!("{}", notification);
            }
            if let DispatchReceipt::Created(application) = receipt {
                print_json(&application)?;
            }
            Ok(())
        }
        SubmitOutcome::KeptOpen => {
            warn!("submission failed; the form stays open");
            bail!(last_message(&session))
        }
        SubmitOutcome::Invalid(errors) => report_invalid(&errors),
    }
}

fn report_invalid(errors: &ValidationErrors) -> Result<()> {
    debug!(count = errors.len(), "validation blocked the submission");
    for error in errors.iter() {
        eprintln!("✗ {}", error);
    }
    bail!("{} field error(s); nothing was sent", errors.len())
}

fn last_message(session: &ApplicationSession<SaccoClient>) -> String {
    session
        .last_notification()
        .map(|notification| notification.message.clone())
        .unwrap_or_else(|| "request failed".to_string())
}

/// Print the request a submission would send, with secrets redacted.
fn print_planned_request(client: &SaccoClient, submission: &Submission) -> Result<()> {
    let (method, path, body) = match submission {
        Submission::CreateWhole(application) => {
            (Method::POST, endpoints::LOAN_APPLICATIONS.to_string(), serde_json::to_value(application)?)
        }
        Submission::UpdateSection {
            application_id,
            payload,
        } => {
            let body = match payload {
                SectionPayload::BasicInfo(application) => serde_json::to_value(application)?,
                SectionPayload::Guarantors(entries) => serde_json::to_value(entries)?,
                SectionPayload::NextOfKin(entries) => serde_json::to_value(entries)?,
                SectionPayload::Collateral(entries) => serde_json::to_value(entries)?,
            };
            let path = match payload.section() {
                Section::BasicInfo => endpoints::loan_application(*application_id),
                section => endpoints::section(*application_id, section),
            };
            (Method::PUT, path, body)
        }
    };

    let request = client.request(method, &path)?.json(&body).build()?;
    let mut headers = serde_json::Map::new();
    for (name, value) in request.headers() {
        let line = format!("{}: {}", name.as_str(), value.to_str().unwrap_or(""));
        let redacted = sacco_util::redact_sensitive(&line);
        let shown = redacted.split_once(':').map(|(_, value)| value.trim()).unwrap_or("");
        headers.insert(name.as_str().to_string(), Value::String(shown.to_string()));
    }
    print_json(&serde_json::json!({
        "method": request.method().as_str(),
        "url": request.url().as_str(),
        "headers": headers,
        "body": body,
    }))
}

/// Overlay the fields present in `patch` onto `current`; omitted fields keep
/// their loaded values and an explicit `null` clears an optional one.
fn merge_basic_info(current: &BasicInfo, patch: Value) -> Result<BasicInfo> {
    let Value::Object(fields) = patch else {
        bail!("a basic-info file must hold a JSON object");
    };
    let mut merged = match serde_json::to_value(current)? {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    merged.extend(fields);
    serde_json::from_value(Value::Object(merged)).context("applying basic-info changes")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).map_err(|error| anyhow!("parsing {}: {}", path.display(), error))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded() -> BasicInfo {
        BasicInfo {
            loan_product_id: Some(3),
            member_id: Some(12),
            applicant_id_number: "29876543".into(),
            amount: 50_000.0,
            term_days: 180,
        }
    }

    #[test]
    fn partial_basic_info_keeps_loaded_fields() {
        let merged = merge_basic_info(&loaded(), json!({ "amount": 75000.0 })).unwrap();
        assert_eq!(merged.amount, 75_000.0);
        assert_eq!(merged.loan_product_id, Some(3));
        assert_eq!(merged.member_id, Some(12));
        assert_eq!(merged.applicant_id_number, "29876543");
        assert_eq!(merged.term_days, 180);
    }

    #[test]
    fn explicit_null_clears_optional_field() {
        let merged = merge_basic_info(&loaded(), json!({ "memberId": null })).unwrap();
        assert_eq!(merged.member_id, None);
        assert_eq!(merged.loan_product_id, Some(3));
    }

    #[test]
    fn malformed_basic_info_is_rejected() {
        assert!(merge_basic_info(&loaded(), json!([1, 2])).is_err());
        assert!(merge_basic_info(&loaded(), json!({ "termDays": "long" })).is_err());
    }
}

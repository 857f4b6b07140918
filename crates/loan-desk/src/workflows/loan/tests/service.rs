use super::common::*;
use crate::workflows::loan::store::{KeyValueStore, DRAFT_KEY};
use crate::workflows::loan::{ApplicationServiceError, DraftField, DraftFields};

#[test]
fn quote_prices_a_catalog_facility() {
    let (service, _) = build_service();

    let loan = service
        .quote("standard", "100000000", "12")
        .expect("quote succeeds");

    assert_eq!(loan.monthly_payment, 9_167_999.0);
    assert_eq!(loan.total_payment, 110_015_991.0);
    assert_eq!(loan.annual_interest_rate, 18.0);
    assert_eq!(loan.late_fee, 5_000_000.0);
}

#[test]
fn quote_reports_unknown_facilities() {
    let (service, _) = build_service();

    match service.quote("gold-card", "1000", "6") {
        Err(ApplicationServiceError::UnknownFacility(id)) => assert_eq!(id, "gold-card"),
        other => panic!("expected unknown facility, got {other:?}"),
    }
}

#[test]
fn quote_validates_before_looking_up_the_facility() {
    let (service, _) = build_service();

    let error = service
        .quote("gold-card", "-5", "0")
        .expect_err("inputs are invalid");
    let errors = error.validation_errors().expect("validation failure");
    assert_eq!(
        errors.fields(),
        vec![DraftField::Amount, DraftField::RepaymentPeriod]
    );
}

#[test]
fn quote_does_not_touch_history() {
    let (service, _) = build_service();
    service.quote("standard", "5000000", "24").expect("quote");
    assert!(service.history().expect("history").is_empty());
}

#[test]
fn submit_records_and_returns_the_application() {
    let (service, _) = build_service();

    let application = service
        .submit_at(filled_fields(), submitted_at())
        .expect("submission succeeds");

    assert_eq!(application.draft.full_name(), "Sara Ahmadi");
    assert_eq!(
        application.calculated_loan.map(|loan| loan.monthly_payment),
        Some(9_167_999.0)
    );
    assert_eq!(service.history().expect("history"), vec![application]);
}

#[test]
fn submit_reports_every_failing_field_at_once() {
    let (service, _) = build_service();
    let mut fields = filled_fields();
    fields.surname.clear();
    fields.shaba_number = "IR06".to_string();
    fields.amount = "0".to_string();

    let error = service
        .submit_at(fields, submitted_at())
        .expect_err("fields are invalid");

    let errors = error.validation_errors().expect("validation failure");
    assert_eq!(
        errors.fields(),
        vec![DraftField::Surname, DraftField::ShabaNumber, DraftField::Amount]
    );
    assert!(service.history().expect("history").is_empty());
}

#[test]
fn submit_of_an_empty_form_flags_all_fields() {
    let (service, _) = build_service();

    let error = service
        .submit_at(DraftFields::default(), submitted_at())
        .expect_err("empty form");
    assert_eq!(
        error.validation_errors().map(|errors| errors.0.len()),
        Some(DraftField::all().len())
    );
}

#[test]
fn submit_leaves_an_unrelated_draft_untouched() {
    let (service, backend) = build_service();
    let mut in_progress = DraftFields {
        facility_type: "interest-free".to_string(),
        ..DraftFields::default()
    };
    in_progress.name = "Reza".to_string();
    service.store().save_draft(&in_progress).expect("seed draft");
    let before = backend.get(DRAFT_KEY).expect("read draft");

    let application = service
        .submit_at(filled_fields(), submitted_at())
        .expect("submission succeeds");

    assert_eq!(application.draft.name, "Sara");
    assert_eq!(backend.get(DRAFT_KEY).expect("read draft"), before);
    assert_eq!(
        service.store().load_draft().expect("draft"),
        Some(in_progress)
    );
    assert_eq!(service.history().expect("history").len(), 1);
}

#[test]
fn history_views_name_facilities_from_the_catalog() {
    let (service, _) = build_service();
    service
        .submit_at(filled_fields(), submitted_at())
        .expect("first submission");
    let mut retired = filled_fields();
    retired.facility_type = "retired".to_string();
    service
        .submit_at(retired, submitted_at())
        .expect("second submission");

    let views = service.history_views().expect("views");

    assert_eq!(views.len(), 2);
    assert_eq!(views[0].facility_name, "Standard facility");
    assert_eq!(views[0].monthly_payment, Some(9_167_999.0));
    assert_eq!(views[0].monthly_payment_fa.as_deref(), Some("۹٬۱۶۷٬۹۹۹"));
    assert_eq!(views[0].created_fa, "۱۴۰۳/۰۳/۱۲");
    assert_eq!(views[1].facility_name, "retired");
    assert!(views[1].monthly_payment.is_none());
}

#[test]
fn sessions_resume_the_saved_draft() {
    let (service, _) = build_service();
    service.store().save_draft(&filled_fields()).expect("seed draft");

    let session = service.start_session().expect("session starts");

    assert_eq!(session.fields(), &filled_fields());
    assert!(session.selected_facility().is_some());
}

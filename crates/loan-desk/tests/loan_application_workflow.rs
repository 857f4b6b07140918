use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use loan_desk::workflows::loan::{
    summarize, write_history_csv, ApplicationStep, DraftField, DraftFields, FacilityCatalog,
    FileStore, LoanApplicationService, StepperError,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "loan-desk-workflow-{name}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn applicant(facility: &str) -> DraftFields {
    DraftFields {
        facility_type: facility.to_string(),
        name: "Ali".to_string(),
        surname: "Karimi".to_string(),
        national_code: "0987654321".to_string(),
        date_of_birth: "1985-11-02".to_string(),
        contact_number: "09351112233".to_string(),
        account_number: "7788-1100".to_string(),
        shaba_number: "IR820540102680020817909002".chars().take(24).collect(),
        average_annual_balance: "0".to_string(),
        amount: "100000000".to_string(),
        repayment_period: "12".to_string(),
    }
}

#[test]
fn bundled_catalog_loads() {
    let catalog = FacilityCatalog::bundled().expect("bundled catalog is valid");

    assert!(!catalog.is_empty());
    for facility in catalog.facilities() {
        assert!(!facility.repayment_type.is_empty(), "{} has terms", facility.id.as_str());
        assert!((0.0..=100.0).contains(&facility.penalty_rate));
    }
    let home = catalog.find("home-equity").expect("home equity offered");
    assert_eq!(home.percentage_rate, None);
    assert_eq!(home.effective_rate(), 18.0);
}

#[test]
fn interest_rate_is_used_when_no_percentage_rate_is_set() {
    let catalog = Arc::new(FacilityCatalog::bundled().expect("bundled catalog"));
    let service =
        LoanApplicationService::new(catalog, Arc::new(FileStore::new(scratch_dir("quote"))));

    let loan = service
        .quote("home-equity", "100000000", "12")
        .expect("quote succeeds");

    assert_eq!(loan.monthly_payment, 9_167_999.0);
    assert_eq!(loan.total_payment, 110_015_991.0);
    assert_eq!(loan.total_interest, 10_015_991.0);
    assert_eq!(loan.late_fee, 5_000_000.0);
}

#[test]
fn interactive_session_survives_a_restart() {
    let dir = scratch_dir("restart");
    let catalog = Arc::new(FacilityCatalog::bundled().expect("bundled catalog"));
    let fields = applicant("personal-loan");

    {
        let service =
            LoanApplicationService::new(catalog.clone(), Arc::new(FileStore::new(&dir)));
        let mut session = service.start_session().expect("session starts");
        while session.step() != ApplicationStep::BankInfo {
            for field in session.step().fields() {
                session
                    .set_field(*field, fields.get(*field))
                    .expect("field belongs to step");
            }
            session.next().expect("step advances");
        }
    }

    let service = LoanApplicationService::new(catalog, Arc::new(FileStore::new(&dir)));
    let mut session = service.start_session().expect("session resumes");
    assert_eq!(session.step(), ApplicationStep::SelectFacility);
    assert_eq!(session.fields().national_code, "0987654321");
    assert_eq!(
        session.selected_facility().map(|facility| facility.id.as_str()),
        Some("personal-loan")
    );

    let now = Utc
        .with_ymd_and_hms(2025, 3, 21, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    while session.step() != ApplicationStep::Result {
        for field in session.step().fields() {
            if session.fields().get(*field).is_empty() {
                session
                    .set_field(*field, fields.get(*field))
                    .expect("field belongs to step");
            }
        }
        session.next_at(now).expect("step advances");
    }
    assert!(matches!(session.next_at(now), Err(StepperError::AlreadySubmitted)));

    let history = service.history().expect("history readable");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].draft.full_name(), "Ali Karimi");
    assert!(history[0].calculated_loan.is_some());
    assert!(service.store().load_draft().expect("draft readable").is_none());

    let views = summarize(&history, service.catalog());
    assert_eq!(views[0].created_fa, "۱۴۰۴/۰۱/۰۱");

    let mut csv = Vec::new();
    write_history_csv(&views, &mut csv).expect("csv written");
    let csv = String::from_utf8(csv).expect("utf-8 csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("created_date,facility_id,facility_name,full_name,amount,repayment_period,monthly_payment")
    );
    assert!(lines
        .next()
        .is_some_and(|row| row.contains("personal-loan") && row.contains("Ali Karimi")));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn submission_errors_name_every_failing_field() {
    let catalog = Arc::new(FacilityCatalog::bundled().expect("bundled catalog"));
    let service =
        LoanApplicationService::new(catalog, Arc::new(FileStore::new(scratch_dir("invalid"))));
    let mut fields = applicant("car-loan");
    fields.contact_number = "0912".to_string();
    fields.average_annual_balance = "-1".to_string();

    let error = service.submit(fields).expect_err("invalid submission");
    let errors = error.validation_errors().expect("validation failure");

    assert_eq!(
        errors.fields(),
        vec![DraftField::ContactNumber, DraftField::AverageAnnualBalance]
    );
    assert!(service.history().expect("history readable").is_empty());
}

use crate::infra::{load_catalog, open_service};
use clap::{Args, ValueEnum};
use loan_desk::config::AppConfig;
use loan_desk::error::AppError;
use loan_desk::locale::format_persian_number;
use loan_desk::workflows::loan::{
    write_history_csv, ApplicationStep, ApplicationSummaryView, CalculatedLoan, DraftField,
    FacilityView, KeyValueStore, LoanApplication, LoanApplicationService, StepperError,
    ValidationErrors,
};
use std::fmt::Write as _;
use std::io::Write as _;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Facility id from the catalog
    #[arg(long)]
    pub(crate) facility: String,
    /// Principal to borrow
    #[arg(long)]
    pub(crate) amount: String,
    /// Repayment term in months
    #[arg(long)]
    pub(crate) months: String,
}

/// One flag per form field. Flags left out keep the value from the saved draft.
#[derive(Args, Debug, Default)]
pub(crate) struct ApplyArgs {
    #[arg(long)]
    pub(crate) facility: Option<String>,
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) surname: Option<String>,
    #[arg(long)]
    pub(crate) national_code: Option<String>,
    #[arg(long)]
    pub(crate) date_of_birth: Option<String>,
    #[arg(long)]
    pub(crate) contact_number: Option<String>,
    #[arg(long)]
    pub(crate) account_number: Option<String>,
    #[arg(long)]
    pub(crate) shaba_number: Option<String>,
    #[arg(long)]
    pub(crate) average_annual_balance: Option<String>,
    #[arg(long)]
    pub(crate) amount: Option<String>,
    /// Repayment term in months
    #[arg(long)]
    pub(crate) months: Option<String>,
    /// Discard any saved draft before applying the flags
    #[arg(long)]
    pub(crate) fresh: bool,
}

impl ApplyArgs {
    fn value_for(&self, field: DraftField) -> Option<&str> {
        let value = match field {
            DraftField::FacilityType => &self.facility,
            DraftField::Name => &self.name,
            DraftField::Surname => &self.surname,
            DraftField::NationalCode => &self.national_code,
            DraftField::DateOfBirth => &self.date_of_birth,
            DraftField::ContactNumber => &self.contact_number,
            DraftField::AccountNumber => &self.account_number,
            DraftField::ShabaNumber => &self.shaba_number,
            DraftField::AverageAnnualBalance => &self.average_annual_balance,
            DraftField::Amount => &self.amount,
            DraftField::RepaymentPeriod => &self.months,
        };
        value.as_deref()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum HistoryFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Args, Debug)]
pub(crate) struct HistoryArgs {
    #[arg(long, value_enum, default_value_t = HistoryFormat::Table)]
    pub(crate) format: HistoryFormat,
}

pub(crate) fn run_facilities() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let catalog = load_catalog(&config.storage)?;
    let views: Vec<FacilityView> = catalog.facilities().iter().map(FacilityView::from).collect();
    print!("{}", render_facilities(&views));
    Ok(())
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = open_service(&config)?;

    match service.quote(&args.facility, &args.amount, &args.months) {
        Ok(loan) => {
            print!("{}", render_quote(&args.facility, &loan));
            Ok(())
        }
        Err(err) => {
            if let Some(errors) = err.validation_errors() {
                eprint!("{}", render_validation_errors(errors));
            }
            Err(err.into())
        }
    }
}

pub(crate) fn run_apply(args: ApplyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = open_service(&config)?;
    let application = apply(&service, &args)?;
    print!("{}", render_submission(&application, &service));
    Ok(())
}

/// Walk a session through every step, taking each field from the flags or the draft.
fn apply<S>(
    service: &LoanApplicationService<S>,
    args: &ApplyArgs,
) -> Result<LoanApplication, AppError>
where
    S: KeyValueStore + 'static,
{
    let mut session = service.start_session()?;
    if args.fresh {
        session.reset()?;
    }

    while session.step() != ApplicationStep::Result {
        for field in session.step().fields() {
            if let Some(value) = args.value_for(*field) {
                session.set_field(*field, value)?;
            }
        }

        if let Err(err) = session.next() {
            if let StepperError::Invalid(errors) = &err {
                eprintln!("{} step is incomplete:", session.step().label());
                eprint!("{}", render_validation_errors(errors));
            }
            return Err(err.into());
        }
    }

    session
        .result()
        .cloned()
        .ok_or_else(|| StepperError::AlreadySubmitted.into())
}

pub(crate) fn run_history(args: HistoryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = open_service(&config)?;
    let views = service.history_views()?;

    let stdout = std::io::stdout();
    match args.format {
        HistoryFormat::Table => print!("{}", render_history_table(&views)),
        HistoryFormat::Json => {
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &views).map_err(std::io::Error::from)?;
            writeln!(handle)?;
        }
        HistoryFormat::Csv => write_history_csv(&views, stdout.lock())?,
    }
    Ok(())
}

fn render_facilities(views: &[FacilityView]) -> String {
    let mut out = String::new();
    for view in views {
        let _ = writeln!(out, "{} | {}", view.id, view.name);
        let _ = writeln!(
            out,
            "  rate {} | penalty {}% | up to {}",
            view.annual_rate_fa, view.penalty_rate, view.amount_fa
        );
        let _ = writeln!(out, "  terms: {}", view.repayment_options.join(", "));
    }
    out
}

fn render_quote(facility: &str, loan: &CalculatedLoan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Quote for {facility} at {}% a year", loan.annual_interest_rate);
    for (label, value) in [
        ("monthly payment", loan.monthly_payment),
        ("total payment", loan.total_payment),
        ("total interest", loan.total_interest),
        ("late fee", loan.late_fee),
    ] {
        let _ = writeln!(out, "  {label:<16} {value:>16} ({})", format_persian_number(value));
    }
    out
}

fn render_submission<S>(
    application: &LoanApplication,
    service: &LoanApplicationService<S>,
) -> String
where
    S: KeyValueStore + 'static,
{
    let view = ApplicationSummaryView::from_application(application, service.catalog());
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Application submitted for {} ({})",
        view.full_name, view.facility_name
    );
    match &application.calculated_loan {
        Some(loan) => out.push_str(&render_quote(&view.facility_id, loan)),
        None => {
            let _ = writeln!(out, "  no quote: facility {} is not offered", view.facility_id);
        }
    }
    out
}

fn render_history_table(views: &[ApplicationSummaryView]) -> String {
    if views.is_empty() {
        return "No applications submitted yet.\n".to_string();
    }

    let mut out = String::new();
    for (index, view) in views.iter().enumerate() {
        let monthly = view.monthly_payment_fa.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "{}. {} | {} | {} | {} months | monthly {} | {}",
            index + 1,
            view.created_fa,
            view.facility_name,
            view.full_name,
            view.repayment_period,
            monthly,
            view.amount_fa
        );
    }
    out
}

fn render_validation_errors(errors: &ValidationErrors) -> String {
    let mut out = String::new();
    for error in &errors.0 {
        let _ = writeln!(out, "  - {}: {}", error.field.key(), error.message);
    }
    out
}

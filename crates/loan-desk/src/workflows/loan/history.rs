use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::catalog::FacilityCatalog;
use super::domain::{Facility, LoanApplication};
use crate::locale::{
    format_persian_date, format_persian_number, persian_date,
};

/// One row of the application history, ready for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummaryView {
    pub facility_id: String,
    pub facility_name: String,
    pub full_name: String,
    pub amount: f64,
    pub amount_fa: String,
    pub repayment_period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_payment_fa: Option<String>,
    pub created_date: DateTime<Utc>,
    pub created_fa: String,
}

impl ApplicationSummaryView {
    pub fn from_application(application: &LoanApplication, catalog: &FacilityCatalog) -> Self {
        let draft = &application.draft;
        let facility_name = catalog
            .get(&draft.facility_type)
            .map(|facility| facility.name.clone())
            .unwrap_or_else(|| draft.facility_type.0.clone());
        let monthly_payment = application
            .calculated_loan
            .as_ref()
            .map(|loan| loan.monthly_payment);

        Self {
            facility_id: draft.facility_type.0.clone(),
            facility_name,
            full_name: draft.full_name(),
            amount: draft.amount,
            amount_fa: format_persian_number(draft.amount),
            repayment_period: draft.repayment_period.get(),
            monthly_payment,
            monthly_payment_fa: monthly_payment.map(format_persian_number),
            created_date: application.created_date,
            created_fa: persian_date(application.created_date.date_naive()),
        }
    }
}

/// Catalog entry rendered for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityView {
    pub id: String,
    pub name: String,
    pub annual_rate: f64,
    pub annual_rate_fa: String,
    pub penalty_rate: f64,
    pub amount: f64,
    pub amount_fa: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_fa: Option<String>,
    pub repayment_options: Vec<String>,
}

impl From<&Facility> for FacilityView {
    fn from(facility: &Facility) -> Self {
        Self {
            id: facility.id.0.clone(),
            name: facility.name.clone(),
            annual_rate: facility.effective_rate(),
            annual_rate_fa: format!("{}%", format_persian_number(facility.effective_rate())),
            penalty_rate: facility.penalty_rate,
            amount: facility.amount,
            amount_fa: format_persian_number(facility.amount),
            created_fa: format_persian_date(&facility.created_date),
            repayment_options: facility
                .repayment_type
                .iter()
                .map(|option| option.name.clone())
                .collect(),
        }
    }
}

pub fn summarize(
    applications: &[LoanApplication],
    catalog: &FacilityCatalog,
) -> Vec<ApplicationSummaryView> {
    applications
        .iter()
        .map(|application| ApplicationSummaryView::from_application(application, catalog))
        .collect()
}

#[derive(Serialize)]
struct HistoryCsvRow<'a> {
    created_date: String,
    facility_id: &'a str,
    facility_name: &'a str,
    full_name: &'a str,
    amount: f64,
    repayment_period: u32,
    monthly_payment: Option<f64>,
}

/// Write the history as CSV with a header row.
pub fn write_history_csv<W: Write>(
    views: &[ApplicationSummaryView],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for view in views {
        csv_writer.serialize(HistoryCsvRow {
            created_date: view.created_date.to_rfc3339(),
            facility_id: &view.facility_id,
            facility_name: &view.facility_name,
            full_name: &view.full_name,
            amount: view.amount,
            repayment_period: view.repayment_period,
            monthly_payment: view.monthly_payment,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

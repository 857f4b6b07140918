//! Loan application intake: catalog, field rules, amortized quotes, the multi-step
//! form controller and the persisted application history.

pub mod amortization;
pub mod catalog;
pub mod domain;
pub mod history;
pub mod router;
pub mod service;
pub mod stepper;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use amortization::AmortizationCalculator;
pub use catalog::{CatalogError, FacilityCatalog};
pub use domain::{
    ApplicationDraft, ApplicationStep, CalculatedLoan, DraftField, DraftFields, Facility,
    FacilityId, LoanApplication, RepaymentOption,
};
pub use history::{summarize, write_history_csv, ApplicationSummaryView, FacilityView};
pub use router::{loan_router, QuoteRequest};
pub use service::{ApplicationServiceError, LoanApplicationService};
pub use stepper::{ApplicationStepper, StepperError};
pub use store::{
    ApplicationStore, FileStore, KeyValueStore, MemoryStore, StoreError, APPLICATIONS_KEY,
    DRAFT_KEY,
};
pub use validation::{ApplicationValidator, ValidationError, ValidationErrors};

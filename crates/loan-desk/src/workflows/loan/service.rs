use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::amortization::AmortizationCalculator;
use super::catalog::FacilityCatalog;
use super::domain::{
    ApplicationStep, CalculatedLoan, DraftField, DraftFields, Facility, LoanApplication,
};
use super::history::{summarize, ApplicationSummaryView};
use super::stepper::{ApplicationStepper, StepperError};
use super::store::{ApplicationStore, KeyValueStore, StoreError};
use super::validation::{parse_decimal, parse_months, ApplicationValidator, ValidationErrors};

/// Service composing the catalog, calculator, form controller and history store.
pub struct LoanApplicationService<S> {
    catalog: Arc<FacilityCatalog>,
    store: Arc<ApplicationStore<S>>,
    validator: ApplicationValidator,
    calculator: AmortizationCalculator,
}

impl<S> LoanApplicationService<S>
where
    S: KeyValueStore + 'static,
{
    pub fn new(catalog: Arc<FacilityCatalog>, backend: Arc<S>) -> Self {
        Self {
            catalog,
            store: Arc::new(ApplicationStore::new(backend)),
            validator: ApplicationValidator,
            calculator: AmortizationCalculator,
        }
    }

    pub fn catalog(&self) -> &Arc<FacilityCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<ApplicationStore<S>> {
        &self.store
    }

    pub fn facilities(&self) -> &[Facility] {
        self.catalog.facilities()
    }

    /// Open an interactive session, resuming any saved draft.
    pub fn start_session(&self) -> Result<ApplicationStepper<S>, StepperError> {
        ApplicationStepper::new(self.catalog.clone(), self.store.clone())
    }

    /// Price a loan without recording an application.
    pub fn quote(
        &self,
        facility_id: &str,
        amount: &str,
        repayment_period: &str,
    ) -> Result<CalculatedLoan, ApplicationServiceError> {
        let errors = ValidationErrors(
            [
                (DraftField::Amount, amount),
                (DraftField::RepaymentPeriod, repayment_period),
            ]
            .into_iter()
            .filter_map(|(field, raw)| self.validator.validate_field(field, raw).err())
            .collect(),
        );
        let (true, Some(principal), Some(months)) = (
            errors.is_empty(),
            parse_decimal(amount),
            parse_months(repayment_period),
        ) else {
            return Err(errors.into());
        };

        let facility = self
            .catalog
            .find(facility_id)
            .ok_or_else(|| ApplicationServiceError::UnknownFacility(facility_id.to_string()))?;

        Ok(self.calculator.for_facility(facility, principal, months))
    }

    pub fn submit(&self, fields: DraftFields) -> Result<LoanApplication, ApplicationServiceError> {
        self.submit_at(fields, Utc::now())
    }

    /// Submit a complete set of fields in one call by walking a detached form through
    /// every step. All failing fields are reported together, and any saved draft is
    /// left as it was.
    pub fn submit_at(
        &self,
        fields: DraftFields,
        now: DateTime<Utc>,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        let errors = self.validator.validate_all(&fields);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let mut stepper = ApplicationStepper::detached(self.catalog.clone(), self.store.clone());
        while stepper.step() != ApplicationStep::Result {
            for field in stepper.step().fields() {
                stepper.set_field(*field, fields.get(*field))?;
            }
            stepper.next_at(now)?;
        }

        stepper
            .result()
            .cloned()
            .ok_or(ApplicationServiceError::Stepper(StepperError::AlreadySubmitted))
    }

    pub fn history(&self) -> Result<Vec<LoanApplication>, ApplicationServiceError> {
        Ok(self.store.list()?)
    }

    pub fn history_views(&self) -> Result<Vec<ApplicationSummaryView>, ApplicationServiceError> {
        let applications = self.history()?;
        Ok(summarize(&applications, &self.catalog))
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("facility {0} is not offered")]
    UnknownFacility(String),
    #[error(transparent)]
    Stepper(#[from] StepperError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApplicationServiceError {
    /// Field failures, whether reported directly or by the form controller.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) | Self::Stepper(StepperError::Invalid(errors)) => Some(errors),
            _ => None,
        }
    }
}

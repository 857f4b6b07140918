use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::amortization::AmortizationCalculator;
use super::catalog::FacilityCatalog;
use super::domain::{ApplicationStep, DraftField, DraftFields, Facility, LoanApplication};
use super::store::{ApplicationStore, KeyValueStore, StoreError};
use super::validation::{ApplicationValidator, ValidationErrors};

/// Error raised by a rejected transition or edit.
#[derive(Debug, thiserror::Error)]
pub enum StepperError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("{} is not collected during the {} step", .field.key(), .step.label())]
    FieldNotInStep {
        field: DraftField,
        step: ApplicationStep,
    },
    #[error("the application has already been submitted")]
    AlreadySubmitted,
    #[error("already at the first step")]
    AtFirstStep,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Form controller walking an application through its steps.
///
/// Steps only move one at a time. `next` refuses to leave a step while any of its
/// fields fails validation, and leaving `LoanDetails` submits the application.
pub struct ApplicationStepper<S> {
    catalog: Arc<FacilityCatalog>,
    store: Arc<ApplicationStore<S>>,
    validator: ApplicationValidator,
    calculator: AmortizationCalculator,
    step: ApplicationStep,
    fields: DraftFields,
    selected: Option<Facility>,
    submitted: Option<LoanApplication>,
    persist_draft: bool,
}

impl<S> ApplicationStepper<S>
where
    S: KeyValueStore,
{
    /// Start a session, pre-populating fields from a saved draft snapshot if one exists.
    pub fn new(
        catalog: Arc<FacilityCatalog>,
        store: Arc<ApplicationStore<S>>,
    ) -> Result<Self, StepperError> {
        let restored = store.load_draft()?;
        let mut stepper = Self::fresh(catalog, store);

        if let Some(fields) = restored {
            debug!(facility = %fields.facility_type, "restored draft snapshot");
            stepper.selected = stepper.catalog.find(&fields.facility_type).cloned();
            stepper.fields = fields;
        }

        Ok(stepper)
    }

    /// Start a session with empty fields, ignoring any saved snapshot.
    pub fn fresh(catalog: Arc<FacilityCatalog>, store: Arc<ApplicationStore<S>>) -> Self {
        Self {
            catalog,
            store,
            validator: ApplicationValidator,
            calculator: AmortizationCalculator,
            step: ApplicationStep::SelectFacility,
            fields: DraftFields::default(),
            selected: None,
            submitted: None,
            persist_draft: true,
        }
    }

    /// Start a session that never reads, writes or clears the draft snapshot.
    /// Submissions are still appended to the history.
    pub fn detached(catalog: Arc<FacilityCatalog>, store: Arc<ApplicationStore<S>>) -> Self {
        Self {
            persist_draft: false,
            ..Self::fresh(catalog, store)
        }
    }

    pub fn step(&self) -> ApplicationStep {
        self.step
    }

    pub fn fields(&self) -> &DraftFields {
        &self.fields
    }

    pub fn selected_facility(&self) -> Option<&Facility> {
        self.selected.as_ref()
    }

    /// The stored record, once the form reached `Result`.
    pub fn result(&self) -> Option<&LoanApplication> {
        self.submitted.as_ref()
    }

    pub fn set_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), StepperError> {
        if field.step() != self.step {
            return Err(StepperError::FieldNotInStep {
                field,
                step: self.step,
            });
        }

        if field == DraftField::FacilityType {
            self.select_facility(&value.into())?;
        } else {
            self.fields.set(field, value);
        }
        Ok(())
    }

    /// Choose a facility by id and cache it for the loan details and result steps.
    ///
    /// Terms already entered are not re-checked against the new facility.
    pub fn select_facility(&mut self, id: &str) -> Result<Option<&Facility>, StepperError> {
        if self.step != ApplicationStep::SelectFacility {
            return Err(StepperError::FieldNotInStep {
                field: DraftField::FacilityType,
                step: self.step,
            });
        }

        self.fields.set(DraftField::FacilityType, id);
        self.selected = self.catalog.find(id).cloned();
        if self.selected.is_none() && !id.is_empty() {
            warn!(facility = id, "selected facility is not in the catalog");
        }
        Ok(self.selected.as_ref())
    }

    pub fn validate_step(&self) -> ValidationErrors {
        self.validator.validate_step(self.step, &self.fields)
    }

    pub fn next(&mut self) -> Result<ApplicationStep, StepperError> {
        self.next_at(Utc::now())
    }

    /// Advance one step, stamping a submission with `now` when leaving `LoanDetails`.
    pub fn next_at(&mut self, now: DateTime<Utc>) -> Result<ApplicationStep, StepperError> {
        let Some(target) = self.step.following() else {
            return Err(StepperError::AlreadySubmitted);
        };

        let errors = self.validate_step();
        if !errors.is_empty() {
            return Err(errors.into());
        }

        if self.step == ApplicationStep::LoanDetails {
            let application = self.submit(now)?;
            self.submitted = Some(application);
        } else if self.persist_draft {
            if let Err(err) = self.store.save_draft(&self.fields) {
                warn!(error = %err, "unable to save draft snapshot");
            }
        }

        debug!(from = ?self.step, to = ?target, "application step advanced");
        self.step = target;
        Ok(target)
    }

    /// Move back one step. Field values are kept.
    pub fn back(&mut self) -> Result<ApplicationStep, StepperError> {
        let target = self.step.preceding().ok_or(StepperError::AtFirstStep)?;
        debug!(from = ?self.step, to = ?target, "application step reverted");
        self.step = target;
        Ok(target)
    }

    /// Drop the in-progress draft, both in memory and in the store.
    pub fn reset(&mut self) -> Result<(), StepperError> {
        self.step = ApplicationStep::SelectFacility;
        self.fields = DraftFields::default();
        self.selected = None;
        self.submitted = None;
        if self.persist_draft {
            self.store.clear_draft()?;
        }
        Ok(())
    }

    fn submit(&self, now: DateTime<Utc>) -> Result<LoanApplication, StepperError> {
        let draft = self.validator.coerce(&self.fields)?;

        let calculated_loan = match &self.selected {
            Some(facility) => Some(self.calculator.for_facility(
                facility,
                draft.amount,
                draft.repayment_period,
            )),
            None => {
                warn!(
                    facility = %draft.facility_type.as_str(),
                    "no catalog facility resolved, storing application without a quote"
                );
                None
            }
        };

        let application = LoanApplication {
            draft,
            created_date: now,
            calculated_loan,
        };

        let count = self.store.append(&application)?;
        if self.persist_draft {
            if let Err(err) = self.store.clear_draft() {
                warn!(error = %err, "unable to clear draft snapshot");
            }
        }

        info!(
            facility = %application.draft.facility_type.as_str(),
            amount = application.draft.amount,
            months = application.draft.repayment_period.get(),
            quoted = application.calculated_loan.is_some(),
            history = count,
            "loan application submitted"
        );

        Ok(application)
    }
}

use std::fmt;
use std::num::NonZeroU32;

use serde::Serialize;

use super::domain::{ApplicationDraft, ApplicationStep, DraftField, DraftFields, FacilityId};

const NATIONAL_CODE_LENGTH: usize = 10;
const CONTACT_NUMBER_MIN_LENGTH: usize = 10;
const SHABA_NUMBER_LENGTH: usize = 24;

/// A single field failing its rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field:?}: {message}")]
pub struct ValidationError {
    pub field: DraftField,
    pub message_key: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    fn for_field(field: DraftField) -> Self {
        let (message_key, message) = rule_text(field);
        Self {
            field,
            message_key,
            message,
        }
    }
}

/// All failures collected for a step or a full draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> Vec<DraftField> {
        self.0.iter().map(|error| error.field).collect()
    }

    pub fn contains(&self, field: DraftField) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.0.iter().map(|error| error.field.key()).collect();
        write!(f, "invalid fields: {}", keys.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

fn rule_text(field: DraftField) -> (&'static str, &'static str) {
    match field {
        DraftField::FacilityType => (
            "loan_form.error.facility_type",
            "please select a facility type",
        ),
        DraftField::Name => ("loan_form.error.name", "name is required"),
        DraftField::Surname => ("loan_form.error.surname", "surname is required"),
        DraftField::NationalCode => (
            "loan_form.error.national_code",
            "national code must be 10 digits",
        ),
        DraftField::DateOfBirth => (
            "loan_form.error.date_of_birth",
            "date of birth is required",
        ),
        DraftField::ContactNumber => (
            "loan_form.error.contact_number",
            "contact number must be at least 10 digits",
        ),
        DraftField::AccountNumber => (
            "loan_form.error.account_number",
            "account number is required",
        ),
        DraftField::ShabaNumber => (
            "loan_form.error.shaba_number",
            "shaba number must be 24 characters",
        ),
        DraftField::AverageAnnualBalance => (
            "loan_form.error.average_annual_balance",
            "average annual balance must be a non-negative number",
        ),
        DraftField::Amount => (
            "loan_form.error.amount",
            "loan amount must be greater than zero",
        ),
        DraftField::RepaymentPeriod => (
            "loan_form.error.repayment_period",
            "repayment period must be greater than zero",
        ),
    }
}

/// Parses a decimal amount. Shared by validation and coercion so both agree on
/// what a numeric field accepts.
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) fn parse_months(raw: &str) -> Option<NonZeroU32> {
    raw.parse::<NonZeroU32>().ok()
}

fn passes(field: DraftField, raw: &str) -> bool {
    match field {
        DraftField::FacilityType
        | DraftField::Name
        | DraftField::Surname
        | DraftField::DateOfBirth
        | DraftField::AccountNumber => !raw.is_empty(),
        // Length only; digit content is not checked.
        DraftField::NationalCode => raw.chars().count() == NATIONAL_CODE_LENGTH,
        DraftField::ContactNumber => raw.chars().count() >= CONTACT_NUMBER_MIN_LENGTH,
        DraftField::ShabaNumber => raw.chars().count() == SHABA_NUMBER_LENGTH,
        DraftField::AverageAnnualBalance => parse_decimal(raw).is_some_and(|value| value >= 0.0),
        DraftField::Amount => parse_decimal(raw).is_some_and(|value| value > 0.0),
        DraftField::RepaymentPeriod => parse_months(raw).is_some(),
    }
}

/// Field rules for the application form, independent of any presentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationValidator;

impl ApplicationValidator {
    pub fn validate_field(&self, field: DraftField, raw: &str) -> Result<(), ValidationError> {
        if passes(field, raw) {
            Ok(())
        } else {
            Err(ValidationError::for_field(field))
        }
    }

    pub fn validate_step(&self, step: ApplicationStep, fields: &DraftFields) -> ValidationErrors {
        self.collect(step.fields().iter().copied(), fields)
    }

    pub fn validate_all(&self, fields: &DraftFields) -> ValidationErrors {
        self.collect(DraftField::all(), fields)
    }

    /// Converts raw text into a typed draft, failing with every rule that does not hold.
    pub fn coerce(&self, fields: &DraftFields) -> Result<ApplicationDraft, ValidationErrors> {
        let errors = self.validate_all(fields);
        if !errors.is_empty() {
            return Err(errors);
        }

        let number = |field: DraftField| {
            parse_decimal(fields.get(field)).ok_or_else(|| single(field))
        };

        Ok(ApplicationDraft {
            facility_type: FacilityId(fields.facility_type.clone()),
            name: fields.name.clone(),
            surname: fields.surname.clone(),
            national_code: fields.national_code.clone(),
            date_of_birth: fields.date_of_birth.clone(),
            contact_number: fields.contact_number.clone(),
            account_number: fields.account_number.clone(),
            shaba_number: fields.shaba_number.clone(),
            average_annual_balance: number(DraftField::AverageAnnualBalance)?,
            amount: number(DraftField::Amount)?,
            repayment_period: parse_months(&fields.repayment_period)
                .ok_or_else(|| single(DraftField::RepaymentPeriod))?,
        })
    }

    fn collect(
        &self,
        fields_to_check: impl IntoIterator<Item = DraftField>,
        fields: &DraftFields,
    ) -> ValidationErrors {
        ValidationErrors(
            fields_to_check
                .into_iter()
                .filter_map(|field| self.validate_field(field, fields.get(field)).err())
                .collect(),
        )
    }
}

fn single(field: DraftField) -> ValidationErrors {
    ValidationErrors(vec![ValidationError::for_field(field)])
}

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for catalog facilities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(pub String);

impl FacilityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Loan product offered to applicants, loaded once from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    pub created_date: String,
    /// Advertised ceiling. Informational only, never enforced against requests.
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    pub penalty_rate: f64,
    pub repayment_type: Vec<RepaymentOption>,
}

impl Facility {
    /// Annual rate in percent: `percentageRate`, then `interestRate`, then zero.
    pub fn effective_rate(&self) -> f64 {
        self.percentage_rate.or(self.interest_rate).unwrap_or(0.0)
    }

    pub fn offers_term(&self, months: u32) -> bool {
        self.repayment_type
            .iter()
            .any(|option| option.value == months)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentOption {
    pub name: String,
    /// Term length in months.
    pub value: u32,
}

/// Ordered states of the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStep {
    SelectFacility,
    PersonalInfo,
    BankInfo,
    LoanDetails,
    Result,
}

impl ApplicationStep {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::SelectFacility,
            Self::PersonalInfo,
            Self::BankInfo,
            Self::LoanDetails,
            Self::Result,
        ]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::SelectFacility => 0,
            Self::PersonalInfo => 1,
            Self::BankInfo => 2,
            Self::LoanDetails => 3,
            Self::Result => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SelectFacility => "Select facility",
            Self::PersonalInfo => "Personal information",
            Self::BankInfo => "Bank information",
            Self::LoanDetails => "Loan details",
            Self::Result => "Result",
        }
    }

    pub const fn following(self) -> Option<Self> {
        match self {
            Self::SelectFacility => Some(Self::PersonalInfo),
            Self::PersonalInfo => Some(Self::BankInfo),
            Self::BankInfo => Some(Self::LoanDetails),
            Self::LoanDetails => Some(Self::Result),
            Self::Result => None,
        }
    }

    pub const fn preceding(self) -> Option<Self> {
        match self {
            Self::SelectFacility => None,
            Self::PersonalInfo => Some(Self::SelectFacility),
            Self::BankInfo => Some(Self::PersonalInfo),
            Self::LoanDetails => Some(Self::BankInfo),
            Self::Result => Some(Self::LoanDetails),
        }
    }

    /// Fields collected while the form sits in this step.
    pub const fn fields(self) -> &'static [DraftField] {
        match self {
            Self::SelectFacility => &[DraftField::FacilityType],
            Self::PersonalInfo => &[
                DraftField::Name,
                DraftField::Surname,
                DraftField::NationalCode,
                DraftField::DateOfBirth,
                DraftField::ContactNumber,
            ],
            Self::BankInfo => &[
                DraftField::AccountNumber,
                DraftField::ShabaNumber,
                DraftField::AverageAnnualBalance,
            ],
            Self::LoanDetails => &[DraftField::Amount, DraftField::RepaymentPeriod],
            Self::Result => &[],
        }
    }
}

/// Every input the form collects, in the order the steps present them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    FacilityType,
    Name,
    Surname,
    NationalCode,
    DateOfBirth,
    ContactNumber,
    AccountNumber,
    ShabaNumber,
    AverageAnnualBalance,
    Amount,
    RepaymentPeriod,
}

impl DraftField {
    pub const fn all() -> [Self; 11] {
        [
            Self::FacilityType,
            Self::Name,
            Self::Surname,
            Self::NationalCode,
            Self::DateOfBirth,
            Self::ContactNumber,
            Self::AccountNumber,
            Self::ShabaNumber,
            Self::AverageAnnualBalance,
            Self::Amount,
            Self::RepaymentPeriod,
        ]
    }

    /// Key used in persisted snapshots and JSON payloads.
    pub const fn key(self) -> &'static str {
        match self {
            Self::FacilityType => "facilityType",
            Self::Name => "name",
            Self::Surname => "surname",
            Self::NationalCode => "nationalCode",
            Self::DateOfBirth => "dateOfBirth",
            Self::ContactNumber => "contactNumber",
            Self::AccountNumber => "accountNumber",
            Self::ShabaNumber => "shabaNumber",
            Self::AverageAnnualBalance => "averageAnnualBalance",
            Self::Amount => "amount",
            Self::RepaymentPeriod => "repaymentPeriod",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|field| field.key() == key)
    }

    pub const fn step(self) -> ApplicationStep {
        match self {
            Self::FacilityType => ApplicationStep::SelectFacility,
            Self::Name
            | Self::Surname
            | Self::NationalCode
            | Self::DateOfBirth
            | Self::ContactNumber => ApplicationStep::PersonalInfo,
            Self::AccountNumber | Self::ShabaNumber | Self::AverageAnnualBalance => {
                ApplicationStep::BankInfo
            }
            Self::Amount | Self::RepaymentPeriod => ApplicationStep::LoanDetails,
        }
    }
}

/// Raw text of an in-progress application, exactly as typed.
///
/// Snapshots written by older clients may carry numbers instead of strings for the
/// numeric fields, so every field accepts either on the way in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftFields {
    #[serde(deserialize_with = "text_or_number")]
    pub facility_type: String,
    #[serde(deserialize_with = "text_or_number")]
    pub name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub surname: String,
    #[serde(deserialize_with = "text_or_number")]
    pub national_code: String,
    #[serde(deserialize_with = "text_or_number")]
    pub date_of_birth: String,
    #[serde(deserialize_with = "text_or_number")]
    pub contact_number: String,
    #[serde(deserialize_with = "text_or_number")]
    pub account_number: String,
    #[serde(deserialize_with = "text_or_number")]
    pub shaba_number: String,
    #[serde(deserialize_with = "text_or_number")]
    pub average_annual_balance: String,
    #[serde(deserialize_with = "text_or_number")]
    pub amount: String,
    #[serde(deserialize_with = "text_or_number")]
    pub repayment_period: String,
}

impl DraftFields {
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::FacilityType => &self.facility_type,
            DraftField::Name => &self.name,
            DraftField::Surname => &self.surname,
            DraftField::NationalCode => &self.national_code,
            DraftField::DateOfBirth => &self.date_of_birth,
            DraftField::ContactNumber => &self.contact_number,
            DraftField::AccountNumber => &self.account_number,
            DraftField::ShabaNumber => &self.shaba_number,
            DraftField::AverageAnnualBalance => &self.average_annual_balance,
            DraftField::Amount => &self.amount,
            DraftField::RepaymentPeriod => &self.repayment_period,
        }
    }

    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::FacilityType => &mut self.facility_type,
            DraftField::Name => &mut self.name,
            DraftField::Surname => &mut self.surname,
            DraftField::NationalCode => &mut self.national_code,
            DraftField::DateOfBirth => &mut self.date_of_birth,
            DraftField::ContactNumber => &mut self.contact_number,
            DraftField::AccountNumber => &mut self.account_number,
            DraftField::ShabaNumber => &mut self.shaba_number,
            DraftField::AverageAnnualBalance => &mut self.average_annual_balance,
            DraftField::Amount => &mut self.amount,
            DraftField::RepaymentPeriod => &mut self.repayment_period,
        };
        *slot = value.into();
    }

    pub fn is_empty(&self) -> bool {
        DraftField::all()
            .into_iter()
            .all(|field| self.get(field).is_empty())
    }
}

pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Decimal(f64),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Integer(value) => value.to_string(),
        Raw::Decimal(value) => value.to_string(),
        Raw::Missing(()) => String::new(),
    })
}

/// Strictly typed application produced once every field passes validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub facility_type: FacilityId,
    pub name: String,
    pub surname: String,
    pub national_code: String,
    pub date_of_birth: String,
    pub contact_number: String,
    pub account_number: String,
    pub shaba_number: String,
    pub average_annual_balance: f64,
    pub amount: f64,
    pub repayment_period: NonZeroU32,
}

impl ApplicationDraft {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// Amortized cost summary. Monetary values are rounded to whole currency units but
/// kept as `f64`, so principals of any validated size stay representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedLoan {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    /// Annual rate in percent, as configured on the facility.
    pub annual_interest_rate: f64,
    pub late_fee: f64,
}

/// Submitted application as persisted in the history collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    #[serde(flatten)]
    pub draft: ApplicationDraft,
    pub created_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_loan: Option<CalculatedLoan>,
}

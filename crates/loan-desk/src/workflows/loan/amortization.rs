use std::num::NonZeroU32;

use super::domain::{CalculatedLoan, Facility};

/// Fixed-rate amortization over equal monthly installments.
///
/// Each monetary output is rounded on its own, so `monthly_payment * term` can differ
/// from `total_payment` by up to half a unit per month. Stored records depend on this
/// rounding, keep it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizationCalculator;

impl AmortizationCalculator {
    pub fn calculate(
        &self,
        annual_rate_percent: f64,
        principal: f64,
        term_months: NonZeroU32,
        penalty_rate_percent: f64,
    ) -> CalculatedLoan {
        let months = f64::from(term_months.get());
        let monthly_rate = annual_rate_percent / 12.0 / 100.0;

        let monthly_payment = if monthly_rate == 0.0 {
            principal / months
        } else {
            let growth = (1.0 + monthly_rate).powf(months);
            principal * monthly_rate * growth / (growth - 1.0)
        };
        let total_payment = monthly_payment * months;
        let total_interest = total_payment - principal;
        let late_fee = principal * penalty_rate_percent / 100.0;

        CalculatedLoan {
            monthly_payment: monthly_payment.round(),
            total_payment: total_payment.round(),
            total_interest: total_interest.round(),
            annual_interest_rate: annual_rate_percent,
            late_fee: late_fee.round(),
        }
    }

    /// Quote for a catalog facility using its effective and penalty rates.
    pub fn for_facility(
        &self,
        facility: &Facility,
        principal: f64,
        term_months: NonZeroU32,
    ) -> CalculatedLoan {
        self.calculate(
            facility.effective_rate(),
            principal,
            term_months,
            facility.penalty_rate,
        )
    }
}

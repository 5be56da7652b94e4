use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Percentage};
use crate::errors::{LedgerError, Result};
use crate::ledger::Installment;
use crate::schedule::full_months_between;

/// late fee policy: a percentage of outstanding principal per full overdue month
///
/// Each elapsed month is charged at most once. The count of months already
/// charged lives on the installment, so re-running the policy for the same
/// date (after a crash, or a second sweep) adds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LateFeePolicy {
    /// days after the due date before the first month starts counting
    pub grace_period_days: u32,
}

/// result of running the policy against one installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateFeeAccrual {
    /// fee to add now
    pub increment: Money,
    /// fee charged for each newly elapsed month
    pub per_period: Money,
    /// months charged by this accrual
    pub new_periods: u32,
    /// months charged in total once this accrual is applied
    pub periods_charged: u32,
}

impl LateFeeAccrual {
    fn none(periods_charged: u32) -> Self {
        Self {
            increment: Money::ZERO,
            per_period: Money::ZERO,
            new_periods: 0,
            periods_charged,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.new_periods == 0
    }
}

impl LateFeePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grace_period_days(mut self, days: u32) -> Self {
        self.grace_period_days = days;
        self
    }

    /// full months elapsed since the due date (after grace) as of `as_of`
    pub fn periods_elapsed(&self, due_date: NaiveDate, as_of: NaiveDate) -> u32 {
        match due_date.checked_add_days(Days::new(u64::from(self.grace_period_days))) {
            Some(start) => full_months_between(start, as_of),
            None => 0,
        }
    }

    /// compute the fee owed for months not yet charged
    pub fn accrue(
        &self,
        installment: &Installment,
        as_of: NaiveDate,
        late_fee_percentage: Percentage,
    ) -> Result<LateFeeAccrual> {
        let already = installment.fee_periods_charged;

        if !installment.is_past_due(as_of) || late_fee_percentage.is_zero() {
            return Ok(LateFeeAccrual::none(already));
        }

        let elapsed = self.periods_elapsed(installment.due_date, as_of);
        let new_periods = elapsed.saturating_sub(already);
        if new_periods == 0 {
            return Ok(LateFeeAccrual::none(already));
        }

        let overflow = || LedgerError::ArithmeticOverflow {
            context: format!("late fee on installment {}", installment.sequence_number),
        };

        let per_period = installment
            .outstanding_principal()
            .checked_percentage(late_fee_percentage)
            .ok_or_else(overflow)?;
        let increment = per_period.checked_mul(new_periods).ok_or_else(overflow)?;

        Ok(LateFeeAccrual {
            increment,
            per_period,
            new_periods,
            periods_charged: elapsed,
        })
    }
}

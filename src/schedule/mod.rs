pub mod cadence;
pub mod calendar;

#[cfg(test)]
mod generator_props;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::Money;
use crate::errors::ScheduleError;
use crate::plan::PaymentPlanTemplate;
use crate::types::InstallmentType;

pub use cadence::{select_cadence, CADENCE_PRIORITY};
pub use calendar::{add_months, full_months_between};

/// one dated line of a generated schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    /// 1-based, chronological
    pub sequence_number: u32,
    pub installment_type: InstallmentType,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub description: String,
}

/// generator output for one booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub principal: Money,
    pub down_payment: Money,
    /// part of the down payment already paid when the booking was made
    pub collected_at_booking: Money,
    pub financed_amount: Money,
    pub start_date: NaiveDate,
    pub installments: Vec<ScheduledInstallment>,
}

impl Schedule {
    /// sum of every scheduled amount, down-payment balance included
    pub fn total_scheduled(&self) -> Money {
        self.installments.iter().map(|i| i.amount).sum()
    }

    pub fn get(&self, sequence_number: u32) -> Option<&ScheduledInstallment> {
        sequence_number
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }

    /// installments after the down-payment balance
    pub fn periodic(&self) -> &[ScheduledInstallment] {
        self.installments.get(1..).unwrap_or(&[])
    }

    pub fn last_due_date(&self) -> NaiveDate {
        self.installments
            .last()
            .map(|i| i.due_date)
            .unwrap_or(self.start_date)
    }
}

/// turns a plan template and a principal into a dated installment sequence
///
/// Pure and deterministic: identical inputs always produce identical
/// schedules, so it is safe to call from any thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleGenerator;

impl ScheduleGenerator {
    pub fn generate(
        template: &PaymentPlanTemplate,
        principal: Money,
        start_date: NaiveDate,
    ) -> Result<Schedule, ScheduleError> {
        Self::generate_with_collected(template, principal, start_date, Money::ZERO)
    }

    /// generate when part of the down payment was collected at booking time;
    /// installment #1 then carries only the remainder
    pub fn generate_with_collected(
        template: &PaymentPlanTemplate,
        principal: Money,
        start_date: NaiveDate,
        collected_at_booking: Money,
    ) -> Result<Schedule, ScheduleError> {
        template.validate()?;

        if !principal.is_positive() {
            return Err(ScheduleError::invalid(format!(
                "principal must be positive, got {principal}"
            )));
        }

        if collected_at_booking.is_negative() {
            return Err(ScheduleError::invalid(format!(
                "collected amount must not be negative, got {collected_at_booking}"
            )));
        }

        let down_payment = template.resolve_down_payment(principal)?;
        if collected_at_booking > down_payment {
            return Err(ScheduleError::invalid(format!(
                "collected amount {collected_at_booking} exceeds down payment {down_payment}"
            )));
        }

        let financed_amount = principal - down_payment;
        let tenure = template.tenure_months;

        if tenure == 0 && !financed_amount.is_zero() {
            return Err(ScheduleError::invalid(format!(
                "zero tenure leaves {financed_amount} unfinanced"
            )));
        }

        let mut lines: Vec<(InstallmentType, Money, NaiveDate)> = Vec::new();
        lines.push((
            InstallmentType::DownPaymentBalance,
            down_payment - collected_at_booking,
            start_date,
        ));

        let mut periodic_total = Money::ZERO;
        for period in 1..=tenure {
            let (cadence, amount) = select_cadence(template, period);
            let due_date = add_months(start_date, period).ok_or_else(|| {
                ScheduleError::invalid(format!(
                    "due date out of range: {period} months after {start_date}"
                ))
            })?;
            periodic_total = periodic_total
                .checked_add(amount)
                .ok_or_else(|| ScheduleError::invalid("installment total overflows"))?;
            lines.push((cadence, amount, due_date));
        }

        if tenure > 0 {
            let residual = financed_amount - periodic_total;
            if let Some(last) = lines.last_mut() {
                last.1 = last
                    .1
                    .checked_add(residual)
                    .ok_or_else(|| ScheduleError::invalid("residual overflows"))?;
                if !last.1.is_positive() {
                    return Err(ScheduleError::invalid(format!(
                        "plan amounts total {periodic_total}, more than the financed {financed_amount}"
                    )));
                }
            }

            debug!(
                financed = %financed_amount,
                periodic = %periodic_total,
                residual = %residual,
                "absorbed rounding residual into final installment"
            );
        }

        let installments = describe(lines);

        debug!(
            plan = %template.name,
            principal = %principal,
            down_payment = %down_payment,
            installments = installments.len(),
            "generated payment schedule"
        );

        Ok(Schedule {
            principal,
            down_payment,
            collected_at_booking,
            financed_amount,
            start_date,
            installments,
        })
    }
}

/// number the lines and label each as "<cadence> n of m"
fn describe(lines: Vec<(InstallmentType, Money, NaiveDate)>) -> Vec<ScheduledInstallment> {
    let mut totals: HashMap<InstallmentType, u32> = HashMap::new();
    for (cadence, _, _) in &lines {
        *totals.entry(*cadence).or_default() += 1;
    }

    let mut seen: HashMap<InstallmentType, u32> = HashMap::new();
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, (cadence, amount, due_date))| {
            let description = match cadence {
                InstallmentType::DownPaymentBalance => cadence.label().to_string(),
                _ => {
                    let nth = seen.entry(cadence).or_default();
                    *nth += 1;
                    let of = totals.get(&cadence).copied().unwrap_or(*nth);
                    format!("{} {} of {}", cadence.label(), nth, of)
                }
            };

            ScheduledInstallment {
                sequence_number: idx as u32 + 1,
                installment_type: cadence,
                amount,
                due_date,
                description,
            }
        })
        .collect()
}

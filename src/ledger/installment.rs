use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::schedule::ScheduledInstallment;
use crate::types::{InstallmentId, InstallmentStatus, InstallmentType};

/// ledger-tracked instance of a scheduled installment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub sequence_number: u32,
    pub installment_type: InstallmentType,
    pub description: String,
    pub amount: Money,
    pub due_date: NaiveDate,

    pub status: InstallmentStatus,
    /// everything received, late fee portion included
    pub paid_amount: Money,
    /// date of the latest payment
    pub paid_date: Option<NaiveDate>,
    /// accrued late fee, only grows except through a waiver
    pub late_fee: Money,
    /// portion of `paid_amount` that settled late fees
    pub late_fee_paid: Money,
    /// overdue months already charged, guards against double accrual
    pub fee_periods_charged: u32,
}

impl Installment {
    pub fn from_scheduled(scheduled: &ScheduledInstallment) -> Self {
        // a fully collected down payment leaves nothing to pay
        let status = if scheduled.amount.is_zero() {
            InstallmentStatus::Paid
        } else {
            InstallmentStatus::Pending
        };

        Self {
            id: Uuid::new_v4(),
            sequence_number: scheduled.sequence_number,
            installment_type: scheduled.installment_type,
            description: scheduled.description.clone(),
            amount: scheduled.amount,
            due_date: scheduled.due_date,
            status,
            paid_amount: Money::ZERO,
            paid_date: None,
            late_fee: Money::ZERO,
            late_fee_paid: Money::ZERO,
            fee_periods_charged: 0,
        }
    }

    pub fn principal_paid(&self) -> Money {
        self.paid_amount.saturating_sub(self.late_fee_paid)
    }

    /// principal still owed, zero once waived
    pub fn outstanding_principal(&self) -> Money {
        if self.status == InstallmentStatus::Waived {
            return Money::ZERO;
        }
        self.amount.saturating_sub(self.principal_paid())
    }

    pub fn outstanding_late_fee(&self) -> Money {
        self.late_fee.saturating_sub(self.late_fee_paid)
    }

    /// the most a further payment may be
    pub fn outstanding(&self) -> Money {
        self.outstanding_principal()
            .saturating_add(self.outstanding_late_fee())
    }

    /// exact outstanding principal, `None` when the stored amounts overflow
    pub(crate) fn checked_outstanding_principal(&self) -> Option<Money> {
        if self.status == InstallmentStatus::Waived {
            return Some(Money::ZERO);
        }
        let principal_paid = self.paid_amount.checked_sub(self.late_fee_paid)?;
        self.amount.checked_sub(principal_paid)
    }

    /// past due with a balance, regardless of whether reconcile ran yet
    pub fn is_past_due(&self, as_of: NaiveDate) -> bool {
        self.due_date < as_of && self.status.is_open()
    }

    /// status after money arrived
    pub(crate) fn settle_status(&mut self) {
        self.status = if self.outstanding().is_zero() {
            InstallmentStatus::Paid
        } else {
            InstallmentStatus::PartiallyPaid
        };
    }
}

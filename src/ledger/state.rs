use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::LedgerTotals;
use crate::types::{BookingStatus, InstallmentId, InstallmentStatus};

use super::audit::AuditLog;
use super::installment::Installment;

/// the mutable half of a booking ledger; cloned into a draft for every mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LedgerState {
    /// plan principal as originally contracted
    pub contract_amount: Money,
    /// contract amount less waived principal
    pub total_amount: Money,
    pub paid_amount: Money,
    pub pending_amount: Money,
    pub waived_amount: Money,
    pub late_fees_accrued: Money,
    pub late_fees_collected: Money,
    pub status: BookingStatus,
    pub installments: Vec<Installment>,
    pub audit: AuditLog,
}

impl LedgerState {
    pub fn totals(&self) -> LedgerTotals {
        LedgerTotals {
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
            pending_amount: self.pending_amount,
            waived_amount: self.waived_amount,
            late_fees_accrued: self.late_fees_accrued,
            late_fees_collected: self.late_fees_collected,
        }
    }

    pub fn position(&self, id: InstallmentId) -> Result<usize> {
        self.installments
            .iter()
            .position(|i| i.id == id)
            .ok_or(LedgerError::NotFound { id })
    }

    /// booking status implied by the installments
    pub fn derive_status(&self) -> BookingStatus {
        if self.installments.iter().all(|i| i.status.is_settled()) {
            BookingStatus::Completed
        } else if self
            .installments
            .iter()
            .any(|i| i.status == InstallmentStatus::Overdue)
        {
            BookingStatus::Overdue
        } else {
            BookingStatus::Active
        }
    }

    /// `paid + pending == total`, plus agreement between totals and installments
    pub fn check_invariant(&self) -> Result<()> {
        let identity = self
            .paid_amount
            .checked_add(self.pending_amount)
            .map(|sum| sum == self.total_amount)
            .unwrap_or(false);
        if !identity {
            return Err(LedgerError::InvariantViolation {
                paid: self.paid_amount,
                pending: self.pending_amount,
                total: self.total_amount,
            });
        }

        if self.pending_amount.is_negative() || self.paid_amount.is_negative() {
            return Err(LedgerError::Inconsistent {
                detail: format!(
                    "negative balance: paid {}, pending {}",
                    self.paid_amount, self.pending_amount
                ),
            });
        }

        let outstanding = self.installments.iter().try_fold(Money::ZERO, |acc, i| {
            let owed = i
                .checked_outstanding_principal()
                .ok_or_else(|| overflow(format!("installment {} outstanding", i.sequence_number)))?;
            checked_add(acc, owed, "outstanding principal")
        })?;
        if outstanding != self.pending_amount {
            return Err(LedgerError::Inconsistent {
                detail: format!(
                    "pending {} but installments owe {}",
                    self.pending_amount, outstanding
                ),
            });
        }

        if checked_add(self.total_amount, self.waived_amount, "total plus waived")? != self.contract_amount {
            return Err(LedgerError::Inconsistent {
                detail: format!(
                    "total {} plus waived {} differs from contract {}",
                    self.total_amount, self.waived_amount, self.contract_amount
                ),
            });
        }

        let (fees, fees_paid) = self.installments.iter().try_fold(
            (Money::ZERO, Money::ZERO),
            |(fees, paid), i| -> Result<(Money, Money)> {
                Ok((
                    checked_add(fees, i.late_fee, "late fee sum")?,
                    checked_add(paid, i.late_fee_paid, "late fee paid sum")?,
                ))
            },
        )?;
        if fees != self.late_fees_accrued || fees_paid != self.late_fees_collected {
            return Err(LedgerError::Inconsistent {
                detail: format!(
                    "late fees {}/{} but installments carry {}/{}",
                    self.late_fees_accrued, self.late_fees_collected, fees, fees_paid
                ),
            });
        }

        for i in &self.installments {
            let ceiling = checked_add(i.amount, i.late_fee, "installment ceiling")?;
            if i.paid_amount > ceiling {
                return Err(LedgerError::Inconsistent {
                    detail: format!(
                        "installment {} paid {} above amount {} plus fee {}",
                        i.sequence_number, i.paid_amount, i.amount, i.late_fee
                    ),
                });
            }
        }

        Ok(())
    }
}

fn overflow(context: impl Into<String>) -> LedgerError {
    LedgerError::ArithmeticOverflow {
        context: context.into(),
    }
}

pub(crate) fn checked_add(a: Money, b: Money, context: &str) -> Result<Money> {
    a.checked_add(b).ok_or_else(|| overflow(context))
}

pub(crate) fn checked_sub(a: Money, b: Money, context: &str) -> Result<Money> {
    a.checked_sub(b).ok_or_else(|| overflow(context))
}

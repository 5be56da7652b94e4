use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InstallmentId, PaymentAllocation};

/// one append-only audit line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEntry {
    Payment {
        installment_id: InstallmentId,
        amount: Money,
        allocation: PaymentAllocation,
        payment_date: NaiveDate,
    },
    LateFee {
        installment_id: InstallmentId,
        fee_amount: Money,
        periods_charged: u32,
        as_of: NaiveDate,
    },
    Waiver {
        installment_id: InstallmentId,
        waived_principal: Money,
        waived_late_fee: Money,
        reason: String,
    },
}

impl AuditEntry {
    pub fn installment_id(&self) -> InstallmentId {
        match self {
            AuditEntry::Payment { installment_id, .. }
            | AuditEntry::LateFee { installment_id, .. }
            | AuditEntry::Waiver { installment_id, .. } => *installment_id,
        }
    }
}

/// audit trail of every ledger mutation; entries are never edited or removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn for_installment(&self, id: InstallmentId) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |e| e.installment_id() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

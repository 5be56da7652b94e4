use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a booking
pub type BookingId = Uuid;

/// unique identifier for a ledger-tracked installment
pub type InstallmentId = Uuid;

/// what an installment pays for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentType {
    /// unpaid remainder of the down payment, always installment #1
    DownPaymentBalance,
    /// every 4th month
    Triannual,
    /// every 6th month
    BiYearly,
    /// every 3rd month
    Quarterly,
    /// fallback cadence for every other month
    Monthly,
}

impl InstallmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentType::DownPaymentBalance => "down_payment_balance",
            InstallmentType::Triannual => "triannual",
            InstallmentType::BiYearly => "bi_yearly",
            InstallmentType::Quarterly => "quarterly",
            InstallmentType::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "down_payment_balance" => Some(InstallmentType::DownPaymentBalance),
            "triannual" => Some(InstallmentType::Triannual),
            "bi_yearly" => Some(InstallmentType::BiYearly),
            "quarterly" => Some(InstallmentType::Quarterly),
            "monthly" => Some(InstallmentType::Monthly),
            _ => None,
        }
    }

    /// human label used in installment descriptions
    pub fn label(&self) -> &'static str {
        match self {
            InstallmentType::DownPaymentBalance => "Down payment balance",
            InstallmentType::Triannual => "Triannual installment",
            InstallmentType::BiYearly => "Bi-yearly installment",
            InstallmentType::Quarterly => "Quarterly installment",
            InstallmentType::Monthly => "Monthly installment",
        }
    }
}

impl fmt::Display for InstallmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// nothing paid, not yet past due
    Pending,
    /// principal and late fee fully covered
    Paid,
    /// some money received, balance outstanding
    PartiallyPaid,
    /// past due date with a balance outstanding
    Overdue,
    /// forgiven, excluded from the pending balance
    Waived,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::PartiallyPaid => "partially_paid",
            InstallmentStatus::Overdue => "overdue",
            InstallmentStatus::Waived => "waived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InstallmentStatus::Pending),
            "paid" => Some(InstallmentStatus::Paid),
            "partially_paid" => Some(InstallmentStatus::PartiallyPaid),
            "overdue" => Some(InstallmentStatus::Overdue),
            "waived" => Some(InstallmentStatus::Waived),
            _ => None,
        }
    }

    /// paid and waived installments are closed to payments and fees
    pub fn is_settled(&self) -> bool {
        matches!(self, InstallmentStatus::Paid | InstallmentStatus::Waived)
    }

    /// still carries a balance the buyer owes
    pub fn is_open(&self) -> bool {
        !self.is_settled()
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// booking status derived from its ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// payments on track
    Active,
    /// at least one installment overdue
    Overdue,
    /// nothing left pending
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Overdue => "overdue",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(BookingStatus::Active),
            "overdue" => Some(BookingStatus::Overdue),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// how a single payment was split across an installment's balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentAllocation {
    pub to_late_fee: Money,
    pub to_principal: Money,
}

impl PaymentAllocation {
    pub fn total_applied(&self) -> Money {
        self.to_late_fee + self.to_principal
    }
}

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::PaymentAllocation;

use super::installment::Installment;

/// order in which a payment settles an installment's balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentWaterfall {
    /// late fee first, then principal
    #[default]
    LateFeeFirst,
    /// principal first, late fee with whatever remains
    PrincipalFirst,
}

impl PaymentWaterfall {
    /// split `amount` across the installment's outstanding balances
    ///
    /// The caller has already checked `amount <= installment.outstanding()`,
    /// so nothing is left over.
    pub fn allocate(&self, installment: &Installment, amount: Money) -> PaymentAllocation {
        let fee_due = installment.outstanding_late_fee();
        let principal_due = installment.outstanding_principal();

        match self {
            PaymentWaterfall::LateFeeFirst => {
                let to_late_fee = amount.min(fee_due);
                PaymentAllocation {
                    to_late_fee,
                    to_principal: (amount - to_late_fee).min(principal_due),
                }
            }
            PaymentWaterfall::PrincipalFirst => {
                let to_principal = amount.min(principal_due);
                PaymentAllocation {
                    to_late_fee: (amount - to_principal).min(fee_due),
                    to_principal,
                }
            }
        }
    }
}

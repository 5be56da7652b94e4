use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Percentage};
use crate::errors::ScheduleError;
use crate::types::InstallmentType;

/// how the down payment is derived from the principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownPaymentRule {
    Fixed(Money),
    Percentage(Percentage),
}

/// longest tenure a plan may carry, one hundred years of monthly installments
pub const MAX_TENURE_MONTHS: u32 = 1_200;

/// payment plan template shared read-only by every booking that selects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPlanTemplate {
    pub name: String,
    /// plot price being financed
    pub principal: Money,
    pub down_payment: DownPaymentRule,
    pub tenure_months: u32,
    /// base recurring amount, fallback cadence
    pub monthly: Money,
    /// due every 3rd month
    pub quarterly: Option<Money>,
    /// due every 6th month
    pub bi_yearly: Option<Money>,
    /// due every 4th month
    pub triannual: Option<Money>,
    /// charged per full overdue month on outstanding principal
    pub late_fee_percentage: Percentage,
}

impl PaymentPlanTemplate {
    pub fn builder() -> PaymentPlanBuilder {
        PaymentPlanBuilder::new()
    }

    /// structural checks that do not depend on the financed principal
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.tenure_months > MAX_TENURE_MONTHS {
            return Err(ScheduleError::invalid(format!(
                "tenure of {} months exceeds the {MAX_TENURE_MONTHS}-month limit",
                self.tenure_months
            )));
        }

        if !self.monthly.is_positive() {
            return Err(ScheduleError::invalid(format!(
                "monthly amount must be positive, got {}",
                self.monthly
            )));
        }

        if self.late_fee_percentage.is_negative() {
            return Err(ScheduleError::invalid(format!(
                "late fee percentage must not be negative, got {}",
                self.late_fee_percentage
            )));
        }

        for (name, amount) in [
            ("quarterly", self.quarterly),
            ("bi_yearly", self.bi_yearly),
            ("triannual", self.triannual),
        ] {
            if let Some(amount) = amount {
                if amount.is_negative() {
                    return Err(ScheduleError::invalid(format!(
                        "{name} amount must not be negative, got {amount}"
                    )));
                }
            }
        }

        match self.down_payment {
            DownPaymentRule::Fixed(amount) if amount.is_negative() => Err(ScheduleError::invalid(
                format!("down payment must not be negative, got {amount}"),
            )),
            DownPaymentRule::Percentage(pct) if pct.is_negative() || pct > Percentage::HUNDRED => {
                Err(ScheduleError::invalid(format!(
                    "down payment percentage must be within 0..=100, got {pct}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// resolve the down payment against a principal
    pub fn resolve_down_payment(&self, principal: Money) -> Result<Money, ScheduleError> {
        let down_payment = match self.down_payment {
            DownPaymentRule::Fixed(amount) => amount,
            DownPaymentRule::Percentage(pct) => principal
                .checked_percentage(pct)
                .ok_or_else(|| ScheduleError::invalid("down payment percentage overflows"))?,
        };

        if down_payment > principal {
            return Err(ScheduleError::invalid(format!(
                "down payment {down_payment} exceeds principal {principal}"
            )));
        }

        Ok(down_payment)
    }

    /// configured amount for a cadence, `None` when undefined or zero
    pub fn cadence_amount(&self, cadence: InstallmentType) -> Option<Money> {
        let amount = match cadence {
            InstallmentType::Monthly => Some(self.monthly),
            InstallmentType::Quarterly => self.quarterly,
            InstallmentType::BiYearly => self.bi_yearly,
            InstallmentType::Triannual => self.triannual,
            InstallmentType::DownPaymentBalance => None,
        };
        amount.filter(|a| a.is_positive())
    }
}

/// builder for payment plan templates
#[derive(Debug, Default)]
pub struct PaymentPlanBuilder {
    name: Option<String>,
    principal: Option<Money>,
    down_payment: Option<DownPaymentRule>,
    tenure_months: Option<u32>,
    monthly: Option<Money>,
    quarterly: Option<Money>,
    bi_yearly: Option<Money>,
    triannual: Option<Money>,
    late_fee_percentage: Option<Percentage>,
}

impl PaymentPlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn down_payment_fixed(mut self, amount: Money) -> Self {
        self.down_payment = Some(DownPaymentRule::Fixed(amount));
        self
    }

    pub fn down_payment_percentage(mut self, pct: Percentage) -> Self {
        self.down_payment = Some(DownPaymentRule::Percentage(pct));
        self
    }

    pub fn tenure_months(mut self, months: u32) -> Self {
        self.tenure_months = Some(months);
        self
    }

    pub fn monthly(mut self, amount: Money) -> Self {
        self.monthly = Some(amount);
        self
    }

    pub fn quarterly(mut self, amount: Money) -> Self {
        self.quarterly = Some(amount);
        self
    }

    pub fn bi_yearly(mut self, amount: Money) -> Self {
        self.bi_yearly = Some(amount);
        self
    }

    pub fn triannual(mut self, amount: Money) -> Self {
        self.triannual = Some(amount);
        self
    }

    pub fn late_fee_percentage(mut self, pct: Percentage) -> Self {
        self.late_fee_percentage = Some(pct);
        self
    }

    pub fn build(self) -> Result<PaymentPlanTemplate, ScheduleError> {
        let principal = self
            .principal
            .ok_or_else(|| ScheduleError::invalid("principal required"))?;
        let down_payment = self
            .down_payment
            .ok_or_else(|| ScheduleError::invalid("down payment rule required"))?;
        let tenure_months = self
            .tenure_months
            .ok_or_else(|| ScheduleError::invalid("tenure required"))?;
        let monthly = self
            .monthly
            .ok_or_else(|| ScheduleError::invalid("monthly amount required"))?;
        let late_fee_percentage = self
            .late_fee_percentage
            .ok_or_else(|| ScheduleError::invalid("late fee percentage required"))?;

        let template = PaymentPlanTemplate {
            name: self
                .name
                .unwrap_or_else(|| format!("{tenure_months}-month plan")),
            principal,
            down_payment,
            tenure_months,
            monthly,
            quarterly: self.quarterly,
            bi_yearly: self.bi_yearly,
            triannual: self.triannual,
            late_fee_percentage,
        };
        template.validate()?;
        Ok(template)
    }
}

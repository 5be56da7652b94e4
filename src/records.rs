//! Persisted row shapes and their conversions.
//!
//! Column names are camelCase and amounts are decimal display units, as
//! shared with the other services reading these tables.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Percentage};
use crate::errors::RecordError;
use crate::ledger::{AuditLog, BookingLedger, Installment, LedgerState};
use crate::plan::{DownPaymentRule, PaymentPlanTemplate};
use crate::reclassify::{LegacyInstallment, MatchKind, ReclassificationTool};
use crate::types::{BookingId, BookingStatus, InstallmentId, InstallmentStatus, InstallmentType};

/// `payment_plans` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlanRecord {
    #[serde(default)]
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub plot_price: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub down_payment_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub down_payment_percentage: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub monthly_payment: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub quarterly_payment: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub bi_yearly_payment: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub triannual_payment: Option<Decimal>,
    pub tenure_months: u32,
    /// absent on rows written before late fees existed; such rows are rejected
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub late_fee_percentage: Option<Decimal>,
}

/// `installments` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentRecord {
    pub id: InstallmentId,
    pub booking_id: BookingId,
    pub sequence_number: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub paid_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub late_fee: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub late_fee_paid: Decimal,
    #[serde(default)]
    pub fee_periods_charged: u32,
    /// missing on legacy rows
    #[serde(default)]
    pub installment_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `bookings` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: BookingId,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub paid_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub pending_amount: Decimal,
    pub status: String,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub waived_amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub late_fees_accrued: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub late_fees_collected: Decimal,
}

/// a ledger flattened into its rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecords {
    pub booking: BookingRecord,
    pub installments: Vec<InstallmentRecord>,
}

fn money(column: &'static str, value: Decimal) -> Result<Money, RecordError> {
    Money::try_from_decimal(value).ok_or_else(|| {
        RecordError::column(column, format!("{value} is not a whole number of minor units"))
    })
}

fn optional_money(column: &'static str, value: Option<Decimal>) -> Result<Option<Money>, RecordError> {
    value.map(|v| money(column, v)).transpose()
}

impl TryFrom<PaymentPlanRecord> for PaymentPlanTemplate {
    type Error = RecordError;

    fn try_from(record: PaymentPlanRecord) -> Result<Self, Self::Error> {
        let down_payment = match (record.down_payment_amount, record.down_payment_percentage) {
            (Some(amount), None) => DownPaymentRule::Fixed(money("downPaymentAmount", amount)?),
            (None, Some(pct)) => DownPaymentRule::Percentage(Percentage::from_decimal(pct)),
            (Some(_), Some(_)) => {
                return Err(RecordError::column(
                    "downPaymentAmount",
                    "both downPaymentAmount and downPaymentPercentage are set",
                ))
            }
            (None, None) => {
                return Err(RecordError::column(
                    "downPaymentAmount",
                    "one of downPaymentAmount or downPaymentPercentage is required",
                ))
            }
        };

        let late_fee_percentage = record
            .late_fee_percentage
            .map(Percentage::from_decimal)
            .ok_or_else(|| RecordError::column("lateFeePercentage", "required"))?;

        let tenure_months = record.tenure_months;
        let template = PaymentPlanTemplate {
            name: if record.name.is_empty() {
                format!("{tenure_months}-month plan")
            } else {
                record.name
            },
            principal: money("plotPrice", record.plot_price)?,
            down_payment,
            tenure_months,
            monthly: money("monthlyPayment", record.monthly_payment)?,
            quarterly: optional_money("quarterlyPayment", record.quarterly_payment)?,
            bi_yearly: optional_money("biYearlyPayment", record.bi_yearly_payment)?,
            triannual: optional_money("triannualPayment", record.triannual_payment)?,
            late_fee_percentage,
        };
        template.validate()?;
        Ok(template)
    }
}

impl From<&PaymentPlanTemplate> for PaymentPlanRecord {
    fn from(plan: &PaymentPlanTemplate) -> Self {
        let (down_payment_amount, down_payment_percentage) = match plan.down_payment {
            DownPaymentRule::Fixed(amount) => (Some(amount.to_decimal()), None),
            DownPaymentRule::Percentage(pct) => (None, Some(pct.as_decimal())),
        };

        Self {
            name: plan.name.clone(),
            plot_price: plan.principal.to_decimal(),
            down_payment_amount,
            down_payment_percentage,
            monthly_payment: plan.monthly.to_decimal(),
            quarterly_payment: plan.quarterly.map(|m| m.to_decimal()),
            bi_yearly_payment: plan.bi_yearly.map(|m| m.to_decimal()),
            triannual_payment: plan.triannual.map(|m| m.to_decimal()),
            tenure_months: plan.tenure_months,
            late_fee_percentage: Some(plan.late_fee_percentage.as_decimal()),
        }
    }
}

impl InstallmentRecord {
    pub fn from_installment(booking_id: BookingId, installment: &Installment) -> Self {
        Self {
            id: installment.id,
            booking_id,
            sequence_number: installment.sequence_number,
            amount: installment.amount.to_decimal(),
            due_date: installment.due_date,
            paid_date: installment.paid_date,
            status: installment.status.as_str().to_string(),
            paid_amount: installment.paid_amount.to_decimal(),
            late_fee: installment.late_fee.to_decimal(),
            late_fee_paid: installment.late_fee_paid.to_decimal(),
            fee_periods_charged: installment.fee_periods_charged,
            installment_type: Some(installment.installment_type.as_str().to_string()),
            description: Some(installment.description.clone()),
        }
    }

    fn to_installment(&self) -> Result<Installment, RecordError> {
        let installment_type = self
            .installment_type
            .as_deref()
            .ok_or_else(|| RecordError::column("installmentType", "missing, reclassify legacy rows first"))?;
        let installment_type = InstallmentType::parse(installment_type).ok_or_else(|| {
            RecordError::column("installmentType", format!("unknown type {installment_type:?}"))
        })?;
        let status = InstallmentStatus::parse(&self.status)
            .ok_or_else(|| RecordError::column("status", format!("unknown status {:?}", self.status)))?;

        Ok(Installment {
            id: self.id,
            sequence_number: self.sequence_number,
            installment_type,
            description: self
                .description
                .clone()
                .unwrap_or_else(|| installment_type.label().to_string()),
            amount: money("amount", self.amount)?,
            due_date: self.due_date,
            status,
            paid_amount: money("paidAmount", self.paid_amount)?,
            paid_date: self.paid_date,
            late_fee: money("lateFee", self.late_fee)?,
            late_fee_paid: money("lateFeePaid", self.late_fee_paid)?,
            fee_periods_charged: self.fee_periods_charged,
        })
    }
}

impl BookingRecord {
    pub fn from_ledger(ledger: &BookingLedger) -> Self {
        let totals = ledger.totals();
        Self {
            id: ledger.booking_id(),
            total_amount: totals.total_amount.to_decimal(),
            paid_amount: totals.paid_amount.to_decimal(),
            pending_amount: totals.pending_amount.to_decimal(),
            status: ledger.status().as_str().to_string(),
            waived_amount: totals.waived_amount.to_decimal(),
            late_fees_accrued: totals.late_fees_accrued.to_decimal(),
            late_fees_collected: totals.late_fees_collected.to_decimal(),
        }
    }
}

impl LedgerRecords {
    pub fn from_ledger(ledger: &BookingLedger) -> Self {
        Self {
            booking: BookingRecord::from_ledger(ledger),
            installments: ledger
                .installments()
                .iter()
                .map(|i| InstallmentRecord::from_installment(ledger.booking_id(), i))
                .collect(),
        }
    }

    /// rebuild a ledger; rows must belong to the booking and agree with its totals
    pub fn restore(&self) -> Result<BookingLedger, RecordError> {
        let booking = &self.booking;

        let installments = self
            .installments
            .iter()
            .map(|row| {
                if row.booking_id != booking.id {
                    return Err(RecordError::column(
                        "bookingId",
                        format!("installment {} belongs to booking {}", row.id, row.booking_id),
                    ));
                }
                row.to_installment()
            })
            .collect::<Result<Vec<_>, _>>()?;

        // stored status is informational, the ledger derives its own
        BookingStatus::parse(&booking.status)
            .ok_or_else(|| RecordError::column("status", format!("unknown status {:?}", booking.status)))?;

        let total_amount = money("totalAmount", booking.total_amount)?;
        let waived_amount = money("waivedAmount", booking.waived_amount)?;
        let contract_amount = total_amount
            .checked_add(waived_amount)
            .ok_or_else(|| RecordError::column("totalAmount", "total plus waived overflows"))?;
        let state = LedgerState {
            contract_amount,
            total_amount,
            paid_amount: money("paidAmount", booking.paid_amount)?,
            pending_amount: money("pendingAmount", booking.pending_amount)?,
            waived_amount,
            late_fees_accrued: money("lateFeesAccrued", booking.late_fees_accrued)?,
            late_fees_collected: money("lateFeesCollected", booking.late_fees_collected)?,
            status: BookingStatus::Active,
            installments,
            audit: AuditLog::default(),
        };

        BookingLedger::from_parts(booking.id, state).map_err(RecordError::from)
    }
}

/// tag legacy rows that lack `installmentType`; returns each tagged id with how it matched
///
/// Only the type and description columns are written. Rows that already
/// carry a type are left alone.
pub fn tag_legacy_rows(
    tool: &ReclassificationTool,
    plan: &PaymentPlanTemplate,
    rows: &mut [InstallmentRecord],
) -> Result<Vec<(InstallmentId, MatchKind)>, RecordError> {
    let untagged: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.installment_type.is_none())
        .map(|(i, _)| i)
        .collect();

    let legacy = untagged
        .iter()
        .map(|&i| {
            Ok(LegacyInstallment {
                amount: money("amount", rows[i].amount)?,
                due_date: rows[i].due_date,
            })
        })
        .collect::<Result<Vec<_>, RecordError>>()?;

    let suggestions = tool.classify_all(plan, &legacy);

    let mut tagged = Vec::with_capacity(untagged.len());
    for (&idx, suggestion) in untagged.iter().zip(suggestions) {
        let row = &mut rows[idx];
        row.installment_type = Some(suggestion.installment_type.as_str().to_string());
        if row.description.is_none() {
            row.description = Some(suggestion.description);
        }
        tagged.push((row.id, suggestion.match_kind));
    }

    Ok(tagged)
}

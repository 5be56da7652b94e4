pub mod allocation;
pub mod audit;
pub mod installment;
pub(crate) mod state;

#[cfg(test)]
mod ledger_props;

pub use allocation::PaymentWaterfall;
pub use audit::{AuditEntry, AuditLog};
pub use installment::Installment;
pub(crate) use state::LedgerState;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::decimal::{Money, Percentage};
use crate::errors::{LedgerError, Result};
use crate::events::{EventStore, LedgerEvent, LedgerTotals};
use crate::late_fee::LateFeePolicy;
use crate::schedule::Schedule;
use crate::types::{
    BookingId, BookingStatus, InstallmentId, InstallmentStatus, PaymentAllocation,
};

use state::{checked_add, checked_sub};

/// outcome of a recorded payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub installment_id: InstallmentId,
    pub sequence_number: u32,
    pub amount: Money,
    pub allocation: PaymentAllocation,
    pub status: InstallmentStatus,
    pub totals: LedgerTotals,
}

/// per-booking ledger of installments and running totals
///
/// Every mutation runs against a draft copy of the state. The draft is
/// committed only when `paid_amount + pending_amount == total_amount` still
/// holds and the totals agree with the installments; otherwise the error is
/// returned and the ledger is left exactly as it was.
#[derive(Debug, Clone, Serialize)]
pub struct BookingLedger {
    booking_id: BookingId,
    #[serde(flatten)]
    state: LedgerState,
    waterfall: PaymentWaterfall,
    #[serde(skip)]
    events: EventStore,
}

impl BookingLedger {
    /// build a ledger from a generated schedule
    pub fn initialize(booking_id: BookingId, schedule: &Schedule) -> Result<Self> {
        let installments: Vec<Installment> = schedule
            .installments
            .iter()
            .map(Installment::from_scheduled)
            .collect();

        let pending_amount = installments
            .iter()
            .try_fold(Money::ZERO, |acc, i| checked_add(acc, i.amount, "initial pending"))?;

        let mut state = LedgerState {
            contract_amount: schedule.principal,
            total_amount: schedule.principal,
            paid_amount: schedule.collected_at_booking,
            pending_amount,
            waived_amount: Money::ZERO,
            late_fees_accrued: Money::ZERO,
            late_fees_collected: Money::ZERO,
            status: BookingStatus::Active,
            installments,
            audit: AuditLog::default(),
        };
        state.status = state.derive_status();
        state.check_invariant()?;

        let mut ledger = Self::from_state(booking_id, state);
        ledger.events.emit(LedgerEvent::LedgerInitialized {
            booking_id,
            installments: ledger.state.installments.len(),
            totals: ledger.totals(),
        });

        info!(
            booking_id = %booking_id,
            installments = ledger.state.installments.len(),
            total = %ledger.state.total_amount,
            paid = %ledger.state.paid_amount,
            "ledger initialized"
        );

        Ok(ledger)
    }

    fn from_state(booking_id: BookingId, state: LedgerState) -> Self {
        Self {
            booking_id,
            state,
            waterfall: PaymentWaterfall::default(),
            events: EventStore::new(),
        }
    }

    /// restore a persisted ledger, rejecting state that breaks the invariant
    pub(crate) fn from_parts(booking_id: BookingId, mut state: LedgerState) -> Result<Self> {
        state.installments.sort_by_key(|i| i.sequence_number);
        state.check_invariant()?;
        state.status = state.derive_status();
        Ok(Self::from_state(booking_id, state))
    }

    pub fn with_waterfall(mut self, waterfall: PaymentWaterfall) -> Self {
        self.waterfall = waterfall;
        self
    }

    /// run a mutation against a draft and commit it only if the ledger stays consistent
    fn transact<T>(
        &mut self,
        operation: &'static str,
        mutate: impl FnOnce(&mut LedgerState, &mut Vec<LedgerEvent>) -> Result<T>,
    ) -> Result<T> {
        let mut draft = self.state.clone();
        let mut staged = Vec::new();
        let out = mutate(&mut draft, &mut staged)?;

        let new_status = draft.derive_status();
        if new_status != draft.status {
            staged.push(LedgerEvent::BookingStatusChanged {
                booking_id: self.booking_id,
                old_status: draft.status,
                new_status,
            });
            draft.status = new_status;
            if new_status == BookingStatus::Completed {
                staged.push(LedgerEvent::BookingCompleted {
                    booking_id: self.booking_id,
                    totals: draft.totals(),
                });
            }
        }

        if let Err(err) = draft.check_invariant() {
            error!(
                booking_id = %self.booking_id,
                operation,
                error = %err,
                "ledger invariant violated, mutation discarded"
            );
            return Err(err);
        }

        self.state = draft;
        self.events.extend(staged);
        Ok(out)
    }

    /// apply a payment to one installment, late fee first by default
    pub fn record_payment(
        &mut self,
        installment_id: InstallmentId,
        amount: Money,
        payment_date: NaiveDate,
    ) -> Result<PaymentReceipt> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidPaymentAmount { amount });
        }

        let booking_id = self.booking_id;
        let waterfall = self.waterfall;

        let receipt = self.transact("record_payment", |state, staged| {
            let idx = state.position(installment_id)?;
            let installment = &state.installments[idx];

            if installment.status == InstallmentStatus::Waived {
                return Err(LedgerError::InstallmentNotPayable {
                    id: installment_id,
                    status: installment.status,
                });
            }

            let outstanding = installment.outstanding();
            if amount > outstanding {
                return Err(LedgerError::OverPayment {
                    id: installment_id,
                    outstanding,
                    attempted: amount,
                });
            }

            let allocation = waterfall.allocate(installment, amount);

            let installment = &mut state.installments[idx];
            installment.paid_amount = checked_add(installment.paid_amount, amount, "installment paid")?;
            installment.late_fee_paid =
                checked_add(installment.late_fee_paid, allocation.to_late_fee, "installment fee paid")?;
            installment.paid_date = Some(
                installment
                    .paid_date
                    .map_or(payment_date, |prev| prev.max(payment_date)),
            );
            installment.settle_status();
            let sequence_number = installment.sequence_number;
            let status = installment.status;

            state.paid_amount = checked_add(state.paid_amount, allocation.to_principal, "ledger paid")?;
            state.pending_amount =
                checked_sub(state.pending_amount, allocation.to_principal, "ledger pending")?;
            state.late_fees_collected =
                checked_add(state.late_fees_collected, allocation.to_late_fee, "fees collected")?;

            state.audit.append(AuditEntry::Payment {
                installment_id,
                amount,
                allocation,
                payment_date,
            });

            let totals = state.totals();
            staged.push(LedgerEvent::PaymentRecorded {
                booking_id,
                installment_id,
                sequence_number,
                amount,
                to_late_fee: allocation.to_late_fee,
                to_principal: allocation.to_principal,
                status,
                payment_date,
                totals,
            });

            Ok(PaymentReceipt {
                installment_id,
                sequence_number,
                amount,
                allocation,
                status,
                totals,
            })
        })?;

        info!(
            booking_id = %booking_id,
            sequence = receipt.sequence_number,
            amount = %amount,
            to_late_fee = %receipt.allocation.to_late_fee,
            to_principal = %receipt.allocation.to_principal,
            status = %receipt.status,
            "payment recorded"
        );

        Ok(receipt)
    }

    /// mark past-due open installments overdue; returns every past-due id in sequence order
    pub fn reconcile(&mut self, as_of: NaiveDate) -> Result<Vec<InstallmentId>> {
        let booking_id = self.booking_id;

        let overdue = self.transact("reconcile", |state, staged| {
            Ok(mark_overdue(state, booking_id, as_of, staged))
        })?;

        debug!(
            booking_id = %booking_id,
            as_of = %as_of,
            overdue = overdue.len(),
            "reconciled"
        );

        Ok(overdue)
    }

    /// reconcile and charge late fees on every overdue installment as one mutation
    ///
    /// Either every overdue marking and fee lands, or none does.
    pub fn reconcile_and_accrue(
        &mut self,
        as_of: NaiveDate,
        policy: &LateFeePolicy,
        late_fee_percentage: Percentage,
    ) -> Result<(Vec<InstallmentId>, Money)> {
        let booking_id = self.booking_id;

        let (overdue, fees_charged) = self.transact("reconcile_and_accrue", |state, staged| {
            let overdue = mark_overdue(state, booking_id, as_of, staged);
            let mut fees_charged = Money::ZERO;
            for id in &overdue {
                let idx = state.position(*id)?;
                let charged = accrue_late_fee(
                    state,
                    booking_id,
                    idx,
                    as_of,
                    policy,
                    late_fee_percentage,
                    staged,
                )?;
                fees_charged = checked_add(fees_charged, charged, "fees charged")?;
            }
            Ok((overdue, fees_charged))
        })?;

        debug!(
            booking_id = %booking_id,
            as_of = %as_of,
            overdue = overdue.len(),
            fees = %fees_charged,
            "reconciled and accrued"
        );

        Ok((overdue, fees_charged))
    }

    /// forgive an installment's outstanding principal and unpaid late fee
    pub fn waive(&mut self, installment_id: InstallmentId, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(LedgerError::MissingWaiverReason { id: installment_id });
        }

        let booking_id = self.booking_id;

        let (sequence_number, waived_principal) = self.transact("waive", |state, staged| {
            let idx = state.position(installment_id)?;
            let installment = &mut state.installments[idx];

            if installment.status.is_settled() {
                return Err(LedgerError::InstallmentNotWaivable {
                    id: installment_id,
                    status: installment.status,
                });
            }

            let waived_principal = installment.outstanding_principal();
            let waived_late_fee = installment.outstanding_late_fee();
            installment.status = InstallmentStatus::Waived;
            installment.late_fee = installment.late_fee_paid;
            let sequence_number = installment.sequence_number;

            state.pending_amount = checked_sub(state.pending_amount, waived_principal, "waive pending")?;
            state.total_amount = checked_sub(state.total_amount, waived_principal, "waive total")?;
            state.waived_amount = checked_add(state.waived_amount, waived_principal, "waived")?;
            state.late_fees_accrued =
                checked_sub(state.late_fees_accrued, waived_late_fee, "waive late fee")?;

            state.audit.append(AuditEntry::Waiver {
                installment_id,
                waived_principal,
                waived_late_fee,
                reason: reason.clone(),
            });

            staged.push(LedgerEvent::InstallmentWaived {
                booking_id,
                installment_id,
                sequence_number,
                waived_principal,
                waived_late_fee,
                reason: reason.clone(),
                totals: state.totals(),
            });

            Ok((sequence_number, waived_principal))
        })?;

        info!(
            booking_id = %booking_id,
            sequence = sequence_number,
            waived = %waived_principal,
            reason = %reason,
            "installment waived"
        );

        Ok(())
    }

    /// charge late fee for overdue months not yet charged; returns the increment
    pub fn apply_late_fee(
        &mut self,
        installment_id: InstallmentId,
        as_of: NaiveDate,
        policy: &LateFeePolicy,
        late_fee_percentage: Percentage,
    ) -> Result<Money> {
        let booking_id = self.booking_id;

        let charged = self.transact("apply_late_fee", |state, staged| {
            let idx = state.position(installment_id)?;
            accrue_late_fee(state, booking_id, idx, as_of, policy, late_fee_percentage, staged)
        })?;

        if charged.is_positive() {
            info!(
                booking_id = %booking_id,
                installment_id = %installment_id,
                fee = %charged,
                "late fee accrued"
            );
        }

        Ok(charged)
    }

    pub fn booking_id(&self) -> BookingId {
        self.booking_id
    }

    pub fn waterfall(&self) -> PaymentWaterfall {
        self.waterfall
    }

    pub fn status(&self) -> BookingStatus {
        self.state.status
    }

    pub fn totals(&self) -> LedgerTotals {
        self.state.totals()
    }

    /// original principal, before waivers
    pub fn contract_amount(&self) -> Money {
        self.state.contract_amount
    }

    /// installments in sequence order
    pub fn installments(&self) -> &[Installment] {
        &self.state.installments
    }

    pub fn installment(&self, id: InstallmentId) -> Option<&Installment> {
        self.state.installments.iter().find(|i| i.id == id)
    }

    pub fn installment_by_sequence(&self, sequence_number: u32) -> Option<&Installment> {
        self.state
            .installments
            .iter()
            .find(|i| i.sequence_number == sequence_number)
    }

    /// earliest installment still owing money
    pub fn next_due(&self) -> Option<&Installment> {
        self.state.installments.iter().find(|i| i.status.is_open())
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.state.audit
    }

    pub fn events(&self) -> &[LedgerEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.events.take_events()
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn state(&self) -> &LedgerState {
        &self.state
    }
}

fn mark_overdue(
    state: &mut LedgerState,
    booking_id: BookingId,
    as_of: NaiveDate,
    staged: &mut Vec<LedgerEvent>,
) -> Vec<InstallmentId> {
    let mut ids = Vec::new();
    for installment in state.installments.iter_mut() {
        if !installment.is_past_due(as_of) {
            continue;
        }
        if installment.status != InstallmentStatus::Overdue {
            installment.status = InstallmentStatus::Overdue;
            staged.push(LedgerEvent::InstallmentOverdue {
                booking_id,
                installment_id: installment.id,
                sequence_number: installment.sequence_number,
                due_date: installment.due_date,
                outstanding: installment.outstanding(),
            });
        }
        ids.push(installment.id);
    }
    ids
}

fn accrue_late_fee(
    state: &mut LedgerState,
    booking_id: BookingId,
    idx: usize,
    as_of: NaiveDate,
    policy: &LateFeePolicy,
    late_fee_percentage: Percentage,
    staged: &mut Vec<LedgerEvent>,
) -> Result<Money> {
    let accrual = policy.accrue(&state.installments[idx], as_of, late_fee_percentage)?;
    if accrual.is_empty() {
        return Ok(Money::ZERO);
    }

    let installment = &mut state.installments[idx];
    installment.late_fee = checked_add(installment.late_fee, accrual.increment, "late fee")?;
    installment.fee_periods_charged = accrual.periods_charged;
    let installment_id = installment.id;
    let sequence_number = installment.sequence_number;

    if accrual.increment.is_zero() {
        return Ok(Money::ZERO);
    }

    state.late_fees_accrued = checked_add(state.late_fees_accrued, accrual.increment, "fees accrued")?;

    state.audit.append(AuditEntry::LateFee {
        installment_id,
        fee_amount: accrual.increment,
        periods_charged: accrual.periods_charged,
        as_of,
    });

    staged.push(LedgerEvent::LateFeeAccrued {
        booking_id,
        installment_id,
        sequence_number,
        fee_amount: accrual.increment,
        periods_charged: accrual.periods_charged,
        as_of,
        totals: state.totals(),
    });

    Ok(accrual.increment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PaymentPlanTemplate;
    use crate::schedule::ScheduleGenerator;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn small_plan() -> PaymentPlanTemplate {
        PaymentPlanTemplate::builder()
            .principal(Money::from_major(400_000))
            .down_payment_fixed(Money::from_major(100_000))
            .tenure_months(3)
            .monthly(Money::from_major(100_000))
            .late_fee_percentage(Percentage::from_whole(2))
            .build()
            .unwrap()
    }

    fn ledger() -> BookingLedger {
        let plan = small_plan();
        let schedule = ScheduleGenerator::generate(&plan, plan.principal, date(2024, 1, 15)).unwrap();
        BookingLedger::initialize(Uuid::new_v4(), &schedule).unwrap()
    }

    fn id_of(ledger: &BookingLedger, seq: u32) -> InstallmentId {
        ledger.installment_by_sequence(seq).unwrap().id
    }

    #[test]
    fn test_initialize_totals() {
        let ledger = ledger();
        let totals = ledger.totals();
        assert_eq!(totals.total_amount, Money::from_major(400_000));
        assert_eq!(totals.paid_amount, Money::ZERO);
        assert_eq!(totals.pending_amount, Money::from_major(400_000));
        assert_eq!(ledger.status(), BookingStatus::Active);
        assert_eq!(ledger.installments().len(), 4);
        assert!(matches!(ledger.events()[0], LedgerEvent::LedgerInitialized { installments: 4, .. }));
    }

    #[test]
    fn test_collected_at_booking_counts_as_paid() {
        let plan = small_plan();
        let schedule = ScheduleGenerator::generate_with_collected(
            &plan,
            plan.principal,
            date(2024, 1, 15),
            Money::from_major(100_000),
        )
        .unwrap();
        let ledger = BookingLedger::initialize(Uuid::new_v4(), &schedule).unwrap();

        assert_eq!(ledger.totals().paid_amount, Money::from_major(100_000));
        assert_eq!(ledger.totals().pending_amount, Money::from_major(300_000));
        assert_eq!(ledger.installments()[0].status, InstallmentStatus::Paid);
        assert_eq!(ledger.next_due().unwrap().sequence_number, 2);
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut ledger = ledger();
        let id = id_of(&ledger, 2);

        let receipt = ledger
            .record_payment(id, Money::from_major(40_000), date(2024, 2, 10))
            .unwrap();
        assert_eq!(receipt.status, InstallmentStatus::PartiallyPaid);
        assert_eq!(receipt.totals.paid_amount, Money::from_major(40_000));

        let receipt = ledger
            .record_payment(id, Money::from_major(60_000), date(2024, 2, 12))
            .unwrap();
        assert_eq!(receipt.status, InstallmentStatus::Paid);

        let installment = ledger.installment(id).unwrap();
        assert_eq!(installment.paid_date, Some(date(2024, 2, 12)));
        assert_eq!(ledger.totals().pending_amount, Money::from_major(300_000));
        assert_eq!(ledger.audit_log().for_installment(id).count(), 2);
    }

    #[test]
    fn test_overpayment_rejected_without_change() {
        let mut ledger = ledger();
        let id = id_of(&ledger, 2);
        let before = ledger.totals();
        let events_before = ledger.events().len();

        let err = ledger
            .record_payment(id, Money::from_major(100_001), date(2024, 2, 10))
            .unwrap_err();
        assert!(matches!(err, LedgerError::OverPayment { .. }));
        assert!(err.is_retryable());
        assert_eq!(ledger.totals(), before);
        assert_eq!(ledger.events().len(), events_before);
        assert!(ledger.audit_log().is_empty());
    }

    #[test]
    fn test_invalid_amount_and_unknown_installment() {
        let mut ledger = ledger();
        let id = id_of(&ledger, 2);

        assert!(matches!(
            ledger.record_payment(id, Money::ZERO, date(2024, 2, 10)),
            Err(LedgerError::InvalidPaymentAmount { .. })
        ));
        assert!(matches!(
            ledger.record_payment(Uuid::new_v4(), Money::from_major(1), date(2024, 2, 10)),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut ledger = ledger();
        ledger.take_events();

        let first = ledger.reconcile(date(2024, 3, 1)).unwrap();
        assert_eq!(first, vec![id_of(&ledger, 1), id_of(&ledger, 2)]);
        assert_eq!(ledger.status(), BookingStatus::Overdue);
        let overdue_events = ledger
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, LedgerEvent::InstallmentOverdue { .. }))
            .count();
        assert_eq!(overdue_events, 2);

        let snapshot = ledger.installments().to_vec();
        let second = ledger.reconcile(date(2024, 3, 1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.installments(), snapshot.as_slice());
        assert!(ledger.take_events().is_empty());
    }

    #[test]
    fn test_reconcile_skips_paid_and_waived() {
        let mut ledger = ledger();
        let first = id_of(&ledger, 1);
        let second = id_of(&ledger, 2);
        ledger
            .record_payment(first, Money::from_major(100_000), date(2024, 1, 15))
            .unwrap();
        ledger.waive(second, "goodwill after site delay").unwrap();

        let overdue = ledger.reconcile(date(2024, 3, 1)).unwrap();
        assert!(overdue.is_empty());
        assert_eq!(ledger.installment(first).unwrap().status, InstallmentStatus::Paid);
        assert_eq!(ledger.installment(second).unwrap().status, InstallmentStatus::Waived);
    }

    #[test]
    fn test_part_payment_on_overdue_is_partially_paid() {
        let mut ledger = ledger();
        let id = id_of(&ledger, 2);
        ledger.reconcile(date(2024, 3, 1)).unwrap();
        assert_eq!(ledger.installment(id).unwrap().status, InstallmentStatus::Overdue);

        let receipt = ledger
            .record_payment(id, Money::from_major(10_000), date(2024, 3, 2))
            .unwrap();
        assert_eq!(receipt.status, InstallmentStatus::PartiallyPaid);

        // the next reconcile past the due date marks it overdue again
        let overdue = ledger.reconcile(date(2024, 3, 3)).unwrap();
        assert!(overdue.contains(&id));
        assert_eq!(ledger.installment(id).unwrap().status, InstallmentStatus::Overdue);
    }

    #[test]
    fn test_reconcile_and_accrue_is_all_or_nothing() {
        let small = Money::from_minor(1_000_000);
        let huge = Money::from_minor(5_000_000_000_000_000_000);
        let schedule = Schedule {
            principal: small + huge,
            down_payment: small,
            collected_at_booking: Money::ZERO,
            financed_amount: huge,
            start_date: date(2024, 1, 15),
            installments: vec![
                crate::schedule::ScheduledInstallment {
                    sequence_number: 1,
                    installment_type: crate::types::InstallmentType::DownPaymentBalance,
                    amount: small,
                    due_date: date(2024, 1, 15),
                    description: "Down payment balance".to_string(),
                },
                crate::schedule::ScheduledInstallment {
                    sequence_number: 2,
                    installment_type: crate::types::InstallmentType::Monthly,
                    amount: huge,
                    due_date: date(2024, 2, 15),
                    description: "Monthly installment 1 of 1".to_string(),
                },
            ],
        };
        let mut ledger = BookingLedger::initialize(Uuid::new_v4(), &schedule).unwrap();
        ledger.take_events();
        let before = ledger.state.clone();

        let err = ledger
            .reconcile_and_accrue(date(2024, 4, 16), &LateFeePolicy::new(), Percentage::HUNDRED)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ArithmeticOverflow { .. }));
        assert_eq!(ledger.state, before);
        assert_eq!(ledger.status(), BookingStatus::Active);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_reconcile_and_accrue_commits_marking_and_fees_together() {
        let mut ledger = ledger();
        ledger.take_events();
        let policy = LateFeePolicy::new();

        let (overdue, fees) = ledger
            .reconcile_and_accrue(date(2024, 3, 20), &policy, Percentage::from_whole(2))
            .unwrap();
        assert_eq!(overdue, vec![id_of(&ledger, 1), id_of(&ledger, 2)]);
        // #1 two months, #2 one month, 2,000 each
        assert_eq!(fees, Money::from_major(6_000));
        assert_eq!(ledger.totals().late_fees_accrued, fees);

        let events = ledger.take_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, LedgerEvent::LateFeeAccrued { .. }))
                .count(),
            2
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, LedgerEvent::BookingStatusChanged { new_status: BookingStatus::Overdue, .. })));
    }

    #[test]
    fn test_late_fee_then_payment_settles_fee_first() {
        let mut ledger = ledger();
        let id = id_of(&ledger, 2);
        let policy = LateFeePolicy::new();

        ledger.reconcile(date(2024, 5, 20)).unwrap();
        let fee = ledger
            .apply_late_fee(id, date(2024, 5, 20), &policy, Percentage::from_whole(2))
            .unwrap();
        assert_eq!(fee, Money::from_major(6_000));
        assert_eq!(
            ledger
                .apply_late_fee(id, date(2024, 5, 20), &policy, Percentage::from_whole(2))
                .unwrap(),
            Money::ZERO
        );
        assert_eq!(ledger.totals().late_fees_accrued, Money::from_major(6_000));

        let receipt = ledger
            .record_payment(id, Money::from_major(10_000), date(2024, 5, 21))
            .unwrap();
        assert_eq!(receipt.allocation.to_late_fee, Money::from_major(6_000));
        assert_eq!(receipt.allocation.to_principal, Money::from_major(4_000));
        assert_eq!(ledger.totals().paid_amount, Money::from_major(4_000));
        assert_eq!(ledger.totals().late_fees_collected, Money::from_major(6_000));

        let receipt = ledger
            .record_payment(id, Money::from_major(96_000), date(2024, 5, 22))
            .unwrap();
        assert_eq!(receipt.status, InstallmentStatus::Paid);
        let installment = ledger.installment(id).unwrap();
        assert_eq!(installment.paid_amount, Money::from_major(106_000));
    }

    #[test]
    fn test_waive_moves_principal_out_of_pending() {
        let mut ledger = ledger();
        let id = id_of(&ledger, 3);
        ledger
            .record_payment(id, Money::from_major(30_000), date(2024, 3, 10))
            .unwrap();

        ledger.waive(id, "developer concession").unwrap();
        let totals = ledger.totals();
        assert_eq!(totals.waived_amount, Money::from_major(70_000));
        assert_eq!(totals.total_amount, Money::from_major(330_000));
        assert_eq!(totals.paid_amount + totals.pending_amount, totals.total_amount);
        assert_eq!(ledger.contract_amount(), Money::from_major(400_000));

        assert!(matches!(
            ledger.waive(id, "again"),
            Err(LedgerError::InstallmentNotWaivable { .. })
        ));
        assert!(matches!(
            ledger.record_payment(id, Money::from_major(1), date(2024, 3, 11)),
            Err(LedgerError::InstallmentNotPayable { .. })
        ));
        assert!(matches!(
            ledger.audit_log().entries().last(),
            Some(AuditEntry::Waiver { reason, .. }) if reason == "developer concession"
        ));
    }

    #[test]
    fn test_waive_requires_reason() {
        let mut ledger = ledger();
        let id = id_of(&ledger, 2);
        assert!(matches!(
            ledger.waive(id, "  "),
            Err(LedgerError::MissingWaiverReason { .. })
        ));
        assert_eq!(ledger.installment(id).unwrap().status, InstallmentStatus::Pending);
    }

    #[test]
    fn test_waive_forgives_unpaid_fee() {
        let mut ledger = ledger();
        let id = id_of(&ledger, 2);
        ledger
            .apply_late_fee(id, date(2024, 4, 20), &LateFeePolicy::new(), Percentage::from_whole(2))
            .unwrap();
        assert!(ledger.totals().late_fees_accrued.is_positive());

        ledger.waive(id, "hardship").unwrap();
        assert_eq!(ledger.totals().late_fees_accrued, Money::ZERO);
        assert_eq!(ledger.installment(id).unwrap().outstanding(), Money::ZERO);
    }

    #[test]
    fn test_paying_everything_completes_booking() {
        let mut ledger = ledger();
        ledger.take_events();
        let ids: Vec<_> = ledger.installments().iter().map(|i| (i.id, i.amount)).collect();
        for (id, amount) in ids {
            ledger.record_payment(id, amount, date(2024, 1, 15)).unwrap();
        }

        assert_eq!(ledger.status(), BookingStatus::Completed);
        assert!(ledger.totals().pending_amount.is_zero());
        assert!(ledger.next_due().is_none());
        assert!(ledger
            .take_events()
            .iter()
            .any(|e| matches!(e, LedgerEvent::BookingCompleted { .. })));
    }

    #[test]
    fn test_corrupted_state_is_rejected_and_untouched() {
        let mut ledger = ledger();
        ledger.state.pending_amount = ledger.state.pending_amount + Money::from_minor(1);
        let corrupted = ledger.state.clone();

        let err = ledger
            .record_payment(id_of(&ledger, 2), Money::from_major(1), date(2024, 2, 1))
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(ledger.state, corrupted);
    }

    #[test]
    fn test_principal_first_waterfall() {
        let mut ledger = ledger().with_waterfall(PaymentWaterfall::PrincipalFirst);
        let id = id_of(&ledger, 2);
        ledger
            .apply_late_fee(id, date(2024, 3, 20), &LateFeePolicy::new(), Percentage::from_whole(2))
            .unwrap();

        let receipt = ledger
            .record_payment(id, Money::from_major(100_000), date(2024, 3, 21))
            .unwrap();
        assert_eq!(receipt.allocation.to_principal, Money::from_major(100_000));
        assert_eq!(receipt.allocation.to_late_fee, Money::ZERO);
        assert_eq!(receipt.status, InstallmentStatus::PartiallyPaid);
    }

    #[test]
    fn test_serializes_without_events() {
        let ledger = ledger();
        let json = ledger.to_json_pretty().unwrap();
        assert!(json.contains("\"pending_amount\""));
        assert!(!json.contains("LedgerInitialized"));
    }
}

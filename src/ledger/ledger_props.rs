//! Property-based tests for ledger mutations.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use uuid::Uuid;

use super::BookingLedger;
use crate::decimal::{Money, Percentage};
use crate::errors::LedgerError;
use crate::late_fee::LateFeePolicy;
use crate::plan::PaymentPlanTemplate;
use crate::schedule::ScheduleGenerator;
use crate::types::InstallmentStatus;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
}

fn ledger(tenure: u32, monthly_minor: i64) -> BookingLedger {
    let monthly = Money::from_minor(monthly_minor);
    let principal = Money::from_minor(monthly_minor * i64::from(tenure) + 50_000);
    let template = PaymentPlanTemplate::builder()
        .principal(principal)
        .down_payment_fixed(Money::from_minor(50_000))
        .tenure_months(tenure)
        .monthly(monthly)
        .late_fee_percentage(Percentage::from_whole(2))
        .build()
        .unwrap();
    let schedule = ScheduleGenerator::generate(&template, principal, start()).unwrap();
    BookingLedger::initialize(Uuid::new_v4(), &schedule).unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Pay { slot: usize, minor: i64 },
    Reconcile { days: u64 },
    LateFee { slot: usize, days: u64 },
    Waive { slot: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0usize..32, 1i64..3_000_000).prop_map(|(slot, minor)| Op::Pay { slot, minor }),
        2 => (0u64..900).prop_map(|days| Op::Reconcile { days }),
        2 => (0usize..32, 0u64..900).prop_map(|(slot, days)| Op::LateFee { slot, days }),
        1 => (0usize..32).prop_map(|slot| Op::Waive { slot }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(150))]

    /// paid + pending == total after every call, whether it succeeded or not
    #[test]
    fn prop_identity_holds_after_every_call(
        tenure in 1u32..=24,
        monthly_minor in 10_000i64..2_000_000,
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let mut ledger = ledger(tenure, monthly_minor);
        let policy = LateFeePolicy::new();
        let count = ledger.installments().len();

        for op in ops {
            match op {
                Op::Pay { slot, minor } => {
                    let id = ledger.installments()[slot % count].id;
                    let _ = ledger.record_payment(id, Money::from_minor(minor), start());
                }
                Op::Reconcile { days } => {
                    let _ = ledger.reconcile(start() + Days::new(days));
                }
                Op::LateFee { slot, days } => {
                    let id = ledger.installments()[slot % count].id;
                    let _ = ledger.apply_late_fee(
                        id,
                        start() + Days::new(days),
                        &policy,
                        Percentage::from_whole(2),
                    );
                }
                Op::Waive { slot } => {
                    let id = ledger.installments()[slot % count].id;
                    let _ = ledger.waive(id, "property test");
                }
            }

            let totals = ledger.totals();
            prop_assert_eq!(totals.paid_amount + totals.pending_amount, totals.total_amount);
            prop_assert!(ledger.state().check_invariant().is_ok());
            for installment in ledger.installments() {
                prop_assert!(installment.paid_amount <= installment.amount + installment.late_fee);
            }
        }
    }

    /// payments summing to amount plus accrued late fee settle the installment
    #[test]
    fn prop_full_payment_settles(
        tenure in 1u32..=24,
        monthly_minor in 10_000i64..2_000_000,
        split in 1i64..100,
        overdue_days in prop::option::of(1u64..400),
    ) {
        let mut ledger = ledger(tenure, monthly_minor);
        let id = ledger.installments()[1].id;
        let due = ledger.installments()[1].due_date;

        let paid_on = match overdue_days {
            Some(days) => {
                let as_of = due + Days::new(days);
                ledger
                    .apply_late_fee(id, as_of, &LateFeePolicy::new(), Percentage::from_whole(2))
                    .unwrap();
                as_of
            }
            None => start(),
        };

        let installment = ledger.installment(id).unwrap().clone();
        let owed = installment.amount + installment.late_fee;
        prop_assert_eq!(installment.outstanding(), owed);

        let first = Money::from_minor(owed.minor_units() * split / 100).max(Money::from_minor(1));
        let rest = owed - first;
        ledger.record_payment(id, first, paid_on).unwrap();
        if rest.is_positive() {
            ledger.record_payment(id, rest, paid_on).unwrap();
        }

        let settled = ledger.installment(id).unwrap();
        prop_assert_eq!(settled.status, InstallmentStatus::Paid);
        prop_assert_eq!(settled.late_fee_paid, settled.late_fee);
        prop_assert_eq!(settled.paid_amount, owed);
    }

    /// an overpayment changes nothing
    #[test]
    fn prop_overpayment_leaves_totals_unchanged(
        tenure in 1u32..=24,
        monthly_minor in 10_000i64..2_000_000,
        excess in 1i64..1_000_000,
    ) {
        let mut ledger = ledger(tenure, monthly_minor);
        let installment = ledger.installments()[1].clone();
        let before = ledger.totals();
        let audit_before = ledger.audit_log().len();

        let result = ledger.record_payment(
            installment.id,
            installment.outstanding() + Money::from_minor(excess),
            start(),
        );
        let is_overpayment = matches!(result, Err(LedgerError::OverPayment { .. }));
        prop_assert!(is_overpayment);
        prop_assert_eq!(ledger.totals(), before);
        prop_assert_eq!(ledger.audit_log().len(), audit_before);
        prop_assert_eq!(ledger.installment(installment.id).unwrap(), &installment);
    }

    /// reconcile twice for the same date gives the same answer and state
    #[test]
    fn prop_reconcile_idempotent(
        tenure in 1u32..=24,
        monthly_minor in 10_000i64..2_000_000,
        paid_slots in prop::collection::vec(0usize..32, 0..8),
        days in 0u64..900,
    ) {
        let mut ledger = ledger(tenure, monthly_minor);
        let count = ledger.installments().len();
        for slot in paid_slots {
            let installment = ledger.installments()[slot % count].clone();
            if installment.outstanding().is_positive() {
                ledger.record_payment(installment.id, installment.outstanding(), start()).unwrap();
            }
        }

        let as_of = start() + Days::new(days);
        let first = ledger.reconcile(as_of).unwrap();
        let snapshot = ledger.installments().to_vec();
        let second = ledger.reconcile(as_of).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(ledger.installments(), snapshot.as_slice());
        for installment in ledger.installments() {
            if installment.amount.is_positive() && installment.paid_amount == installment.amount {
                prop_assert_eq!(installment.status, InstallmentStatus::Paid);
            }
        }
    }
}

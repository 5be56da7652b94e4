//! Property-based tests for schedule generation.

use chrono::NaiveDate;
use proptest::prelude::*;

use super::ScheduleGenerator;
use crate::decimal::{Money, Percentage};
use crate::plan::{DownPaymentRule, PaymentPlanTemplate};
use crate::types::InstallmentType;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
}

/// optional bonus amount between 1 and 200,000.00, or undefined
fn bonus() -> impl Strategy<Value = Option<Money>> {
    prop_oneof![Just(None), (100i64..20_000_000i64).prop_map(|m| Some(Money::from_minor(m)))]
}

/// templates whose periodic amounts never exceed the financed amount
fn template_and_principal() -> impl Strategy<Value = (PaymentPlanTemplate, Money)> {
    (
        1u32..=60,
        100i64..5_000_000i64,
        bonus(),
        bonus(),
        bonus(),
        0u32..=100,
    )
        .prop_map(|(tenure, monthly_minor, quarterly, bi_yearly, triannual, pct)| {
            let monthly = Money::from_minor(monthly_minor);
            let bonus_ceiling: Money = [quarterly, bi_yearly, triannual]
                .iter()
                .flatten()
                .copied()
                .sum();
            // leave headroom so the final installment stays positive
            let financed = Money::from_minor(
                (monthly.minor_units() + bonus_ceiling.minor_units()) * i64::from(tenure) + 1,
            );
            let principal = if pct == 100 {
                financed
            } else {
                // principal such that principal - round(principal * pct%) >= financed
                Money::from_minor(financed.minor_units() * 100 / i64::from(100 - pct) + 100)
            };
            let template = PaymentPlanTemplate {
                name: "prop".to_string(),
                principal,
                down_payment: if pct == 100 {
                    DownPaymentRule::Fixed(Money::ZERO)
                } else {
                    DownPaymentRule::Percentage(Percentage::from_whole(pct))
                },
                tenure_months: tenure,
                monthly,
                quarterly,
                bi_yearly,
                triannual,
                late_fee_percentage: Percentage::from_whole(2),
            };
            (template, principal)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// scheduled amounts always add back up to the principal, to the minor unit
    #[test]
    fn prop_schedule_sums_to_principal((template, principal) in template_and_principal()) {
        let schedule = ScheduleGenerator::generate(&template, principal, start()).unwrap();
        prop_assert_eq!(schedule.total_scheduled(), principal);
        prop_assert_eq!(
            schedule.periodic().iter().map(|i| i.amount).sum::<Money>(),
            schedule.financed_amount
        );
        prop_assert_eq!(schedule.installments.len() as u32, template.tenure_months + 1);
    }

    /// only the final installment may deviate from its cadence amount
    #[test]
    fn prop_residual_only_in_last((template, principal) in template_and_principal()) {
        let schedule = ScheduleGenerator::generate(&template, principal, start()).unwrap();
        let periodic = schedule.periodic();
        for installment in &periodic[..periodic.len() - 1] {
            let expected = template.cadence_amount(installment.installment_type).unwrap();
            prop_assert_eq!(installment.amount, expected);
        }
        prop_assert!(periodic.iter().all(|i| i.amount.is_positive()));
    }

    /// every period is billed exactly once and in chronological order
    #[test]
    fn prop_one_cadence_per_period((template, principal) in template_and_principal()) {
        let schedule = ScheduleGenerator::generate(&template, principal, start()).unwrap();
        for (idx, installment) in schedule.installments.iter().enumerate() {
            prop_assert_eq!(installment.sequence_number, idx as u32 + 1);
        }
        for pair in schedule.installments.windows(2) {
            prop_assert!(pair[0].due_date < pair[1].due_date);
        }

        for installment in schedule.periodic() {
            let period = installment.sequence_number - 1;
            let expected = if period % 4 == 0 && template.triannual.is_some() {
                InstallmentType::Triannual
            } else if period % 6 == 0 && template.bi_yearly.is_some() {
                InstallmentType::BiYearly
            } else if period % 3 == 0 && template.quarterly.is_some() {
                InstallmentType::Quarterly
            } else {
                InstallmentType::Monthly
            };
            prop_assert_eq!(installment.installment_type, expected);
        }
    }
}

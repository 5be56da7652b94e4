use crate::decimal::Money;
use crate::plan::PaymentPlanTemplate;
use crate::types::InstallmentType;

/// bonus cadences in strict priority order with their length in months
///
/// Least frequent first: when a period qualifies for several cadences the
/// larger, rarer amount wins and the month is billed exactly once.
pub const CADENCE_PRIORITY: [(InstallmentType, u32); 3] = [
    (InstallmentType::Triannual, 4),
    (InstallmentType::BiYearly, 6),
    (InstallmentType::Quarterly, 3),
];

/// pick the single cadence that bills `period` (1-based) and its amount
pub fn select_cadence(template: &PaymentPlanTemplate, period: u32) -> (InstallmentType, Money) {
    CADENCE_PRIORITY
        .iter()
        .filter(|(_, length)| period % length == 0)
        .find_map(|&(cadence, _)| template.cadence_amount(cadence).map(|amount| (cadence, amount)))
        .unwrap_or((InstallmentType::Monthly, template.monthly))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Percentage;

    fn template(
        quarterly: Option<i64>,
        bi_yearly: Option<i64>,
        triannual: Option<i64>,
    ) -> PaymentPlanTemplate {
        PaymentPlanTemplate {
            name: "test".to_string(),
            principal: Money::from_major(1_000_000),
            down_payment: crate::plan::DownPaymentRule::Fixed(Money::ZERO),
            tenure_months: 24,
            monthly: Money::from_major(10_000),
            quarterly: quarterly.map(Money::from_major),
            bi_yearly: bi_yearly.map(Money::from_major),
            triannual: triannual.map(Money::from_major),
            late_fee_percentage: Percentage::ZERO,
        }
    }

    #[test]
    fn test_monthly_only() {
        let plan = template(None, None, None);
        for period in 1..=24 {
            assert_eq!(select_cadence(&plan, period).0, InstallmentType::Monthly);
        }
    }

    #[test]
    fn test_month_twelve_prefers_triannual() {
        let plan = template(Some(30_000), Some(60_000), Some(40_000));
        assert_eq!(
            select_cadence(&plan, 12),
            (InstallmentType::Triannual, Money::from_major(40_000))
        );
        // 6 is not a multiple of 4, bi-yearly beats quarterly
        assert_eq!(
            select_cadence(&plan, 6),
            (InstallmentType::BiYearly, Money::from_major(60_000))
        );
        assert_eq!(select_cadence(&plan, 3).0, InstallmentType::Quarterly);
        assert_eq!(select_cadence(&plan, 8).0, InstallmentType::Triannual);
        assert_eq!(select_cadence(&plan, 5).0, InstallmentType::Monthly);
    }

    #[test]
    fn test_undefined_bonus_falls_through() {
        let plan = template(Some(30_000), Some(60_000), None);
        assert_eq!(select_cadence(&plan, 12).0, InstallmentType::BiYearly);

        let plan = template(Some(30_000), Some(0), None);
        assert_eq!(select_cadence(&plan, 12).0, InstallmentType::Quarterly);
        assert_eq!(select_cadence(&plan, 4).0, InstallmentType::Monthly);
    }
}

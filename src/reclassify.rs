//! Best-effort type tagging for installment rows created before
//! `installment_type` was stored.
//!
//! Suggestions are advisory. Nothing here touches amounts, due dates or
//! ledger state, and it must not be used to check newly generated schedules:
//! two plans can produce the same amount by coincidence.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::plan::PaymentPlanTemplate;
use crate::types::InstallmentType;

/// how a suggestion was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    WithinTolerance,
    /// nothing matched, tagged monthly
    Fallback,
}

/// legacy row as read from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyInstallment {
    pub amount: Money,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reclassification {
    pub installment_type: InstallmentType,
    pub description: String,
    pub match_kind: MatchKind,
    /// plan amount the row was matched against
    pub matched_amount: Option<Money>,
}

/// check order; earlier entries win ties
const CANDIDATE_ORDER: [InstallmentType; 5] = [
    InstallmentType::DownPaymentBalance,
    InstallmentType::Triannual,
    InstallmentType::BiYearly,
    InstallmentType::Quarterly,
    InstallmentType::Monthly,
];

#[derive(Debug, Clone)]
pub struct ReclassificationTool {
    tolerance: Money,
}

impl Default for ReclassificationTool {
    fn default() -> Self {
        Self {
            tolerance: Money::from_major(1),
        }
    }
}

impl ReclassificationTool {
    pub fn new(tolerance: Money) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        config.tolerance().map(Self::new).unwrap_or_default()
    }

    pub fn tolerance(&self) -> Money {
        self.tolerance
    }

    fn candidates(&self, plan: &PaymentPlanTemplate) -> Vec<(InstallmentType, Money)> {
        CANDIDATE_ORDER
            .iter()
            .filter_map(|&kind| {
                let amount = match kind {
                    InstallmentType::DownPaymentBalance => {
                        plan.resolve_down_payment(plan.principal).ok()
                    }
                    other => plan.cadence_amount(other),
                };
                amount.filter(|a| a.is_positive()).map(|a| (kind, a))
            })
            .collect()
    }

    /// type suggestion for a single amount
    pub fn classify(&self, plan: &PaymentPlanTemplate, amount: Money) -> Reclassification {
        let candidates = self.candidates(plan);

        if let Some(&(kind, matched)) = candidates.iter().find(|(_, a)| *a == amount) {
            return Self::suggestion(kind, MatchKind::Exact, Some(matched));
        }

        let nearest = candidates
            .iter()
            .filter(|(_, a)| a.distance(amount) <= self.tolerance)
            .min_by_key(|(_, a)| a.distance(amount));

        match nearest {
            Some(&(kind, matched)) => Self::suggestion(kind, MatchKind::WithinTolerance, Some(matched)),
            None => Self::suggestion(InstallmentType::Monthly, MatchKind::Fallback, None),
        }
    }

    fn suggestion(
        installment_type: InstallmentType,
        match_kind: MatchKind,
        matched_amount: Option<Money>,
    ) -> Reclassification {
        Reclassification {
            installment_type,
            description: installment_type.label().to_string(),
            match_kind,
            matched_amount,
        }
    }

    /// classify a booking's legacy rows, numbering descriptions per cadence in due-date order
    ///
    /// Output is index-aligned with `rows`.
    pub fn classify_all(
        &self,
        plan: &PaymentPlanTemplate,
        rows: &[LegacyInstallment],
    ) -> Vec<Reclassification> {
        let mut suggestions: Vec<Reclassification> =
            rows.iter().map(|row| self.classify(plan, row.amount)).collect();

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by_key(|&i| rows[i].due_date);

        let mut totals: HashMap<InstallmentType, u32> = HashMap::new();
        for s in &suggestions {
            *totals.entry(s.installment_type).or_default() += 1;
        }

        let mut seen: HashMap<InstallmentType, u32> = HashMap::new();
        for idx in order {
            let suggestion = &mut suggestions[idx];
            let kind = suggestion.installment_type;
            if kind == InstallmentType::DownPaymentBalance {
                continue;
            }
            let nth = seen.entry(kind).or_default();
            *nth += 1;
            let of = totals.get(&kind).copied().unwrap_or(*nth);
            suggestion.description = format!("{} {} of {}", kind.label(), nth, of);
        }

        let fallbacks = suggestions
            .iter()
            .filter(|s| s.match_kind == MatchKind::Fallback)
            .count();
        debug!(
            plan = %plan.name,
            rows = rows.len(),
            fallbacks,
            "reclassified legacy installments"
        );

        suggestions
    }
}

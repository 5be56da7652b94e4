use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{EngineError, LedgerError};
use crate::events::LedgerEvent;
use crate::late_fee::LateFeePolicy;
use crate::ledger::{BookingLedger, PaymentReceipt};
use crate::plan::PaymentPlanTemplate;
use crate::schedule::{Schedule, ScheduleGenerator};
use crate::types::{BookingId, InstallmentId};

/// a booking behind its own lock; the unit of mutual exclusion
pub type SharedLedger = Arc<Mutex<Booking>>;

/// result of one reconcile-and-accrue pass over a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualOutcome {
    pub booking_id: BookingId,
    pub overdue: Vec<InstallmentId>,
    pub fees_charged: Money,
}

/// a plot booking: the plan it was sold on and the ledger it owns
#[derive(Debug, Clone)]
pub struct Booking {
    id: BookingId,
    plan: Arc<PaymentPlanTemplate>,
    ledger: BookingLedger,
}

impl Booking {
    /// create a booking starting on `start_date`, with `collected_at_booking`
    /// already taken against the down payment
    pub fn create(
        plan: Arc<PaymentPlanTemplate>,
        start_date: NaiveDate,
        collected_at_booking: Money,
    ) -> Result<Self, EngineError> {
        let schedule = ScheduleGenerator::generate_with_collected(
            &plan,
            plan.principal,
            start_date,
            collected_at_booking,
        )?;
        Self::from_schedule(plan, &schedule)
    }

    /// create a booking dated today according to `time_provider`
    pub fn create_now(
        plan: Arc<PaymentPlanTemplate>,
        collected_at_booking: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self, EngineError> {
        Self::create(plan, time_provider.now().date_naive(), collected_at_booking)
    }

    /// open a ledger over an already generated schedule
    pub fn from_schedule(
        plan: Arc<PaymentPlanTemplate>,
        schedule: &Schedule,
    ) -> Result<Self, EngineError> {
        let id = Uuid::new_v4();
        let ledger = BookingLedger::initialize(id, schedule)?;

        info!(
            booking_id = %id,
            plan = %plan.name,
            principal = %schedule.principal,
            installments = schedule.installments.len(),
            "booking created"
        );

        Ok(Self { id, plan, ledger })
    }

    /// reattach a restored ledger to its plan
    pub fn restore(plan: Arc<PaymentPlanTemplate>, ledger: BookingLedger) -> Self {
        Self {
            id: ledger.booking_id(),
            plan,
            ledger,
        }
    }

    /// apply engine config to this booking's ledger
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.ledger = self.ledger.with_waterfall(config.payment_waterfall);
        self
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn plan(&self) -> &PaymentPlanTemplate {
        &self.plan
    }

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut BookingLedger {
        &mut self.ledger
    }

    pub fn record_payment(
        &mut self,
        installment_id: InstallmentId,
        amount: Money,
        payment_date: NaiveDate,
    ) -> Result<PaymentReceipt, LedgerError> {
        self.ledger.record_payment(installment_id, amount, payment_date)
    }

    pub fn waive(
        &mut self,
        installment_id: InstallmentId,
        reason: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.ledger.waive(installment_id, reason)
    }

    /// charge the plan's late fee on one installment
    pub fn apply_late_fee(
        &mut self,
        installment_id: InstallmentId,
        as_of: NaiveDate,
        policy: &LateFeePolicy,
    ) -> Result<Money, LedgerError> {
        self.ledger
            .apply_late_fee(installment_id, as_of, policy, self.plan.late_fee_percentage)
    }

    /// mark overdue installments and charge late fees on each of them
    ///
    /// Safe to repeat for the same date: reconcile is idempotent and every
    /// overdue month is charged at most once. A failure leaves the ledger
    /// untouched.
    pub fn reconcile_and_accrue(
        &mut self,
        as_of: NaiveDate,
        policy: &LateFeePolicy,
    ) -> Result<AccrualOutcome, LedgerError> {
        let (overdue, fees_charged) =
            self.ledger
                .reconcile_and_accrue(as_of, policy, self.plan.late_fee_percentage)?;

        Ok(AccrualOutcome {
            booking_id: self.id,
            overdue,
            fees_charged,
        })
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.ledger.take_events()
    }

    /// wrap in the shared handle used by the sweep and payment capture
    pub fn shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }
}

/// run `f` on a shared booking under its lock; a poisoned lock is reported, not unwrapped
pub fn with_booking<T>(
    shared: &SharedLedger,
    f: impl FnOnce(&mut Booking) -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    let mut guard = shared.lock().map_err(|poisoned| EngineError::LockPoisoned {
        booking: poisoned.get_ref().id().to_string(),
    })?;
    f(&mut guard)
}

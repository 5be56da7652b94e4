use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::{field, info, instrument, warn, Span};

use crate::booking::{AccrualOutcome, SharedLedger};
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::events::LedgerEvent;
use crate::late_fee::LateFeePolicy;
use crate::types::BookingId;

/// shared flag checked between bookings
#[derive(Debug, Clone, Default)]
pub struct SweepCancellation(Arc<AtomicBool>);

impl SweepCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// a booking the sweep could not process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBooking {
    pub booking_id: BookingId,
    pub reason: String,
}

/// summary of one sweep run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub as_of: Option<NaiveDate>,
    pub outcomes: Vec<AccrualOutcome>,
    pub skipped: Vec<SkippedBooking>,
    /// bookings left untouched because the sweep was cancelled
    pub not_visited: usize,
    pub overdue_installments: usize,
    pub fees_charged: Money,
    /// events drained from processed bookings, for the notification side
    #[serde(skip)]
    pub events: Vec<LedgerEvent>,
}

impl SweepReport {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// every booking was visited and none failed
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.not_visited == 0
    }
}

enum Visit {
    Done(AccrualOutcome, Vec<LedgerEvent>),
    Skipped(SkippedBooking),
    NotVisited,
}

/// periodic pass that marks overdue installments and accrues late fees
///
/// Runs to completion per booking and in parallel across bookings. Each
/// booking is locked for the duration of its own update only, so payment
/// capture on other bookings proceeds. Re-running for the same date is a
/// no-op: reconcile is idempotent and overdue months are charged once.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationSweep {
    policy: LateFeePolicy,
    config: EngineConfig,
}

impl ReconciliationSweep {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            policy: config.late_fee_policy(),
            config,
        }
    }

    pub fn policy(&self) -> &LateFeePolicy {
        &self.policy
    }

    /// sweep every booking as of today according to `time_provider`
    #[instrument(skip_all, fields(bookings = bookings.len()))]
    pub fn run(
        &self,
        bookings: &[SharedLedger],
        time_provider: &SafeTimeProvider,
        cancellation: &SweepCancellation,
    ) -> SweepReport {
        let as_of = time_provider.now().date_naive();
        let visit_all = || -> Vec<Visit> {
            bookings
                .par_iter()
                .map(|booking| self.visit(booking, as_of, cancellation))
                .collect()
        };

        let visits = match self.config.sweep_max_threads {
            Some(threads) => match ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(visit_all),
                Err(err) => {
                    warn!(threads, error = %err, "sweep pool unavailable, using global pool");
                    visit_all()
                }
            },
            None => visit_all(),
        };

        let mut report = SweepReport {
            as_of: Some(as_of),
            ..SweepReport::default()
        };
        for visit in visits {
            match visit {
                Visit::Done(outcome, events) => {
                    report.overdue_installments += outcome.overdue.len();
                    report.fees_charged += outcome.fees_charged;
                    report.outcomes.push(outcome);
                    report.events.extend(events);
                }
                Visit::Skipped(skipped) => report.skipped.push(skipped),
                Visit::NotVisited => report.not_visited += 1,
            }
        }

        info!(
            as_of = %as_of,
            processed = report.processed(),
            skipped = report.skipped.len(),
            not_visited = report.not_visited,
            overdue = report.overdue_installments,
            fees = %report.fees_charged,
            "sweep finished"
        );

        report
    }

    #[instrument(skip_all, fields(booking_id = field::Empty))]
    fn visit(
        &self,
        booking: &SharedLedger,
        as_of: NaiveDate,
        cancellation: &SweepCancellation,
    ) -> Visit {
        if cancellation.is_cancelled() {
            return Visit::NotVisited;
        }

        let mut guard = match booking.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let booking_id = poisoned.get_ref().id();
                Span::current().record("booking_id", field::display(booking_id));
                warn!("booking lock poisoned, skipping");
                return Visit::Skipped(SkippedBooking {
                    booking_id,
                    reason: "lock poisoned".to_string(),
                });
            }
        };
        Span::current().record("booking_id", field::display(guard.id()));

        match guard.reconcile_and_accrue(as_of, &self.policy) {
            Ok(outcome) => {
                let events = guard.take_events();
                Visit::Done(outcome, events)
            }
            Err(err) => {
                warn!(error = %err, fatal = err.is_fatal(), "booking sweep failed, skipping");
                Visit::Skipped(SkippedBooking {
                    booking_id: guard.id(),
                    reason: err.to_string(),
                })
            }
        }
    }
}

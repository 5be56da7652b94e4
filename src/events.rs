use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BookingId, BookingStatus, InstallmentId, InstallmentStatus};

/// running totals carried on every ledger-changed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_amount: Money,
    pub paid_amount: Money,
    pub pending_amount: Money,
    pub waived_amount: Money,
    pub late_fees_accrued: Money,
    pub late_fees_collected: Money,
}

/// events a booking ledger emits for notification and dashboard collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    LedgerInitialized {
        booking_id: BookingId,
        installments: usize,
        totals: LedgerTotals,
    },
    PaymentRecorded {
        booking_id: BookingId,
        installment_id: InstallmentId,
        sequence_number: u32,
        amount: Money,
        to_late_fee: Money,
        to_principal: Money,
        status: InstallmentStatus,
        payment_date: NaiveDate,
        totals: LedgerTotals,
    },
    InstallmentOverdue {
        booking_id: BookingId,
        installment_id: InstallmentId,
        sequence_number: u32,
        due_date: NaiveDate,
        outstanding: Money,
    },
    LateFeeAccrued {
        booking_id: BookingId,
        installment_id: InstallmentId,
        sequence_number: u32,
        fee_amount: Money,
        periods_charged: u32,
        as_of: NaiveDate,
        totals: LedgerTotals,
    },
    InstallmentWaived {
        booking_id: BookingId,
        installment_id: InstallmentId,
        sequence_number: u32,
        waived_principal: Money,
        waived_late_fee: Money,
        reason: String,
        totals: LedgerTotals,
    },
    BookingStatusChanged {
        booking_id: BookingId,
        old_status: BookingStatus,
        new_status: BookingStatus,
    },
    BookingCompleted {
        booking_id: BookingId,
        totals: LedgerTotals,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    events: Vec<LedgerEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = LedgerEvent>) {
        self.events.extend(events);
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

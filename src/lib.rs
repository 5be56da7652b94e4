pub mod booking;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod late_fee;
pub mod ledger;
pub mod plan;
pub mod reclassify;
pub mod records;
pub mod schedule;
pub mod sweep;
pub mod types;

// re-export key types
pub use booking::{with_booking, AccrualOutcome, Booking, SharedLedger};
pub use config::EngineConfig;
pub use decimal::{Money, Percentage};
pub use errors::{ConfigError, EngineError, LedgerError, RecordError, Result, ScheduleError};
pub use events::{EventStore, LedgerEvent, LedgerTotals};
pub use late_fee::{LateFeeAccrual, LateFeePolicy};
pub use ledger::{AuditEntry, AuditLog, BookingLedger, Installment, PaymentReceipt, PaymentWaterfall};
pub use plan::{DownPaymentRule, PaymentPlanBuilder, PaymentPlanTemplate};
pub use reclassify::{LegacyInstallment, MatchKind, Reclassification, ReclassificationTool};
pub use records::{BookingRecord, InstallmentRecord, LedgerRecords, PaymentPlanRecord};
pub use schedule::{Schedule, ScheduleGenerator, ScheduledInstallment};
pub use sweep::{ReconciliationSweep, SkippedBooking, SweepCancellation, SweepReport};
pub use types::{
    BookingId, BookingStatus, InstallmentId, InstallmentStatus, InstallmentType, PaymentAllocation,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

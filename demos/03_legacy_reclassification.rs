/// legacy reclassification - tag untyped installment rows, then restore the ledger
use std::sync::Arc;

use booking_ledger_rs::records::tag_legacy_rows;
use booking_ledger_rs::{
    Booking, EngineConfig, LedgerRecords, MatchKind, PaymentPlanRecord, PaymentPlanTemplate,
    ReclassificationTool,
};
use tracing_subscriber::EnvFilter;

const PLAN: &str = r#"{
    "name": "Legacy 6-month",
    "plotPrice": "900000.00",
    "downPaymentPercentage": "20",
    "monthlyPayment": "100000",
    "quarterlyPayment": "160000",
    "tenureMonths": 6,
    "lateFeePercentage": "2"
}"#;

const LEDGER: &str = r#"{
    "booking": {
        "id": "6f1c1f7e-8f6c-4c1e-9a55-2f1d9c3b7a10",
        "totalAmount": "900000.00",
        "paidAmount": "280000.00",
        "pendingAmount": "620000.00",
        "status": "active"
    },
    "installments": [
        { "id": "0b7f6a52-1c1a-4c4e-8d0e-000000000001", "bookingId": "6f1c1f7e-8f6c-4c1e-9a55-2f1d9c3b7a10",
          "sequenceNumber": 1, "amount": "180000.00", "dueDate": "2023-07-01", "paidDate": "2023-07-01",
          "status": "paid", "paidAmount": "180000.00", "lateFee": "0" },
        { "id": "0b7f6a52-1c1a-4c4e-8d0e-000000000002", "bookingId": "6f1c1f7e-8f6c-4c1e-9a55-2f1d9c3b7a10",
          "sequenceNumber": 2, "amount": "100000.00", "dueDate": "2023-08-01", "paidDate": "2023-08-03",
          "status": "paid", "paidAmount": "100000.00", "lateFee": "0" },
        { "id": "0b7f6a52-1c1a-4c4e-8d0e-000000000003", "bookingId": "6f1c1f7e-8f6c-4c1e-9a55-2f1d9c3b7a10",
          "sequenceNumber": 3, "amount": "100000.00", "dueDate": "2023-09-01", "paidDate": null,
          "status": "pending", "paidAmount": "0", "lateFee": "0" },
        { "id": "0b7f6a52-1c1a-4c4e-8d0e-000000000004", "bookingId": "6f1c1f7e-8f6c-4c1e-9a55-2f1d9c3b7a10",
          "sequenceNumber": 4, "amount": "159999.50", "dueDate": "2023-10-01", "paidDate": null,
          "status": "pending", "paidAmount": "0", "lateFee": "0" },
        { "id": "0b7f6a52-1c1a-4c4e-8d0e-000000000005", "bookingId": "6f1c1f7e-8f6c-4c1e-9a55-2f1d9c3b7a10",
          "sequenceNumber": 5, "amount": "100000.00", "dueDate": "2023-11-01", "paidDate": null,
          "status": "pending", "paidAmount": "0", "lateFee": "0" },
        { "id": "0b7f6a52-1c1a-4c4e-8d0e-000000000006", "bookingId": "6f1c1f7e-8f6c-4c1e-9a55-2f1d9c3b7a10",
          "sequenceNumber": 6, "amount": "100000.00", "dueDate": "2023-12-01", "paidDate": null,
          "status": "pending", "paidAmount": "0", "lateFee": "0" },
        { "id": "0b7f6a52-1c1a-4c4e-8d0e-000000000007", "bookingId": "6f1c1f7e-8f6c-4c1e-9a55-2f1d9c3b7a10",
          "sequenceNumber": 7, "amount": "160000.50", "dueDate": "2024-01-01", "paidDate": null,
          "status": "pending", "paidAmount": "0", "lateFee": "0" }
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_target(false)
        .compact()
        .init();

    println!("=== legacy reclassification ===\n");

    let plan = PaymentPlanTemplate::try_from(serde_json::from_str::<PaymentPlanRecord>(PLAN)?)?;
    let mut records: LedgerRecords = serde_json::from_str(LEDGER)?;

    // untyped rows cannot be loaded as-is
    if let Err(err) = records.restore() {
        println!("restore before tagging: {}\n", err);
    }

    let tool = ReclassificationTool::from_config(&EngineConfig::default());
    let tagged = tag_legacy_rows(&tool, &plan, &mut records.installments)?;

    for (row, (_, kind)) in records.installments.iter().zip(&tagged) {
        let marker = match kind {
            MatchKind::Exact => "exact",
            MatchKind::WithinTolerance => "~tolerance",
            MatchKind::Fallback => "FALLBACK",
        };
        println!(
            "  #{} {:>10}  {:<24} {}",
            row.sequence_number,
            row.amount,
            row.description.as_deref().unwrap_or(""),
            marker
        );
    }

    let booking = Booking::restore(Arc::new(plan), records.restore()?);
    let ledger = booking.ledger();
    let totals = ledger.totals();
    println!(
        "\nrestored: paid {} + pending {} = total {} ({})",
        totals.paid_amount,
        totals.pending_amount,
        totals.total_amount,
        ledger.status()
    );

    Ok(())
}

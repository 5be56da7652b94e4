/// late payments - overdue marking, late fees, fee-first settlement, waivers
use std::sync::Arc;

use booking_ledger_rs::chrono::NaiveDate;
use booking_ledger_rs::{
    Booking, LateFeePolicy, LedgerError, Money, PaymentPlanTemplate, Percentage,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    println!("=== late payments ===\n");

    let plan = Arc::new(
        PaymentPlanTemplate::builder()
            .principal(Money::from_major(1_000_000))
            .down_payment_fixed(Money::from_major(100_000))
            .tenure_months(6)
            .monthly(Money::from_major(100_000))
            .quarterly(Money::from_major(250_000))
            .late_fee_percentage(Percentage::from_whole(2))
            .build()?,
    );

    let start = NaiveDate::from_ymd_opt(2024, 1, 15).ok_or("bad date")?;
    let mut booking = Booking::create(plan, start, Money::from_major(100_000))?;
    let policy = LateFeePolicy::new();

    // nothing paid for three months
    let as_of = NaiveDate::from_ymd_opt(2024, 5, 20).ok_or("bad date")?;
    let outcome = booking.reconcile_and_accrue(as_of, &policy)?;
    println!("overdue on {}: {} installments", as_of, outcome.overdue.len());
    println!("late fees charged: {}", outcome.fees_charged);

    // running it again the same day is harmless
    let again = booking.reconcile_and_accrue(as_of, &policy)?;
    println!("re-run charged: {}", again.fees_charged);

    // a payment settles the fee before principal
    let second = booking.ledger().installments()[1].clone();
    println!(
        "\n#{} owes {} principal + {} late fee",
        second.sequence_number,
        second.outstanding_principal(),
        second.outstanding_late_fee()
    );
    let receipt = booking.record_payment(second.id, Money::from_major(10_000), as_of)?;
    println!(
        "paid 10,000 -> fee {} / principal {} ({})",
        receipt.allocation.to_late_fee, receipt.allocation.to_principal, receipt.status
    );

    // overpaying is rejected and changes nothing
    let before = booking.ledger().totals();
    match booking.record_payment(second.id, Money::from_major(1_000_000), as_of) {
        Err(err @ LedgerError::OverPayment { .. }) => {
            println!("\nrejected: {} (retryable: {})", err, err.is_retryable())
        }
        other => println!("\nunexpected: {:?}", other),
    }
    assert_eq!(before, booking.ledger().totals());

    // waive the quarterly installment
    let third = booking.ledger().installments()[3].id;
    booking.waive(third, "compensation for delayed possession")?;

    let totals = booking.ledger().totals();
    println!("\nafter waiver:");
    println!("  total {} (contract {})", totals.total_amount, booking.ledger().contract_amount());
    println!("  paid {} + pending {}", totals.paid_amount, totals.pending_amount);
    println!("  waived {}", totals.waived_amount);
    println!("  fees accrued {} / collected {}", totals.late_fees_accrued, totals.late_fees_collected);
    println!("  status {}", booking.ledger().status());

    println!("\naudit trail:");
    for entry in booking.ledger().audit_log().entries() {
        println!("  {}", serde_json::to_string(entry)?);
    }

    Ok(())
}

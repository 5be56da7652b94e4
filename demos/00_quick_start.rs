/// quick start - build a plan, book a plot, take payments
use std::sync::Arc;

use booking_ledger_rs::chrono::NaiveDate;
use booking_ledger_rs::{Booking, Money, PaymentPlanTemplate, Percentage};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    println!("=== quick start ===\n");

    // 2.5m plot, 25% down, 24 monthly installments of 78,000
    let plan = Arc::new(
        PaymentPlanTemplate::builder()
            .name("Phase II residential")
            .principal(Money::from_major(2_500_000))
            .down_payment_percentage(Percentage::from_whole(25))
            .tenure_months(24)
            .monthly(Money::from_major(78_000))
            .late_fee_percentage(Percentage::from_whole(2))
            .build()?,
    );

    let start = NaiveDate::from_ymd_opt(2024, 1, 15).ok_or("bad date")?;
    let mut booking = Booking::create(Arc::clone(&plan), start, Money::ZERO)?;

    println!("schedule for {}:", plan.name);
    for installment in booking.ledger().installments() {
        println!(
            "  #{:<2} {}  {:>12}  {}",
            installment.sequence_number, installment.due_date, installment.amount, installment.description
        );
    }

    // pay the down payment and the first monthly installment
    let ids: Vec<_> = booking.ledger().installments().iter().take(2).map(|i| (i.id, i.amount)).collect();
    for (id, amount) in ids {
        let receipt = booking.record_payment(id, amount, start)?;
        println!("\npaid #{} -> {}", receipt.sequence_number, receipt.status);
    }

    let totals = booking.ledger().totals();
    println!("\ntotal:   {}", totals.total_amount);
    println!("paid:    {}", totals.paid_amount);
    println!("pending: {}", totals.pending_amount);

    if let Some(next) = booking.ledger().next_due() {
        println!("next due: #{} on {} ({})", next.sequence_number, next.due_date, next.amount);
    }

    println!("\nevents emitted: {}", booking.take_events().len());
    Ok(())
}

/// daily sweep - parallel reconciliation across bookings with a controlled clock
use std::sync::Arc;

use booking_ledger_rs::{
    with_booking, Booking, EngineConfig, Money, PaymentPlanTemplate, Percentage, ReconciliationSweep,
    SafeTimeProvider, SweepCancellation, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    println!("=== daily sweep ===\n");

    let config = EngineConfig::from_json_str(
        r#"{ "late_fee_grace_days": 5, "sweep_max_threads": 4 }"#,
    )?;

    let plan = Arc::new(
        PaymentPlanTemplate::builder()
            .principal(Money::from_major(1_800_000))
            .down_payment_percentage(Percentage::from_whole(10))
            .tenure_months(12)
            .monthly(Money::from_major(120_000))
            .triannual(Money::from_major(180_000))
            .late_fee_percentage(Percentage::from_whole(1))
            .build()?,
    );

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 10, 1, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let bookings = (0..25)
        .map(|_| {
            Booking::create_now(Arc::clone(&plan), Money::from_major(180_000), &time)
                .map(|b| b.with_config(&config).shared())
        })
        .collect::<Result<Vec<_>, _>>()?;

    // half the buyers pay their first monthly installment on time
    let paid_on = time.now().date_naive() + Duration::days(30);
    for shared in bookings.iter().step_by(2) {
        with_booking(shared, |booking| {
            let first = &booking.ledger().installments()[1];
            let (id, amount) = (first.id, first.amount);
            Ok(booking.record_payment(id, amount, paid_on)?)
        })?;
    }

    let sweep = ReconciliationSweep::new(config);
    let cancellation = SweepCancellation::new();

    for _ in 0..4 {
        controller.advance(Duration::days(30));
        let report = sweep.run(&bookings, &time, &cancellation);
        println!(
            "{}: processed {}, overdue {}, fees {}, events {}",
            time.now().format("%Y-%m-%d"),
            report.processed(),
            report.overdue_installments,
            report.fees_charged,
            report.events.len()
        );
    }

    // a cancelled sweep leaves every ledger as it was
    cancellation.cancel();
    let report = sweep.run(&bookings, &time, &cancellation);
    println!("\ncancelled sweep visited {} of {}", report.processed(), bookings.len());

    Ok(())
}

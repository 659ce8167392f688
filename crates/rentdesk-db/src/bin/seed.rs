//! # Seed Data Generator
//!
//! Populates the database with demo bookings for development.
//!
//! ## Usage
//! ```bash
//! # Generate 20 bookings (default)
//! cargo run -p rentdesk-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p rentdesk-db --bin seed -- --count 50
//!
//! # Specify database path
//! cargo run -p rentdesk-db --bin seed -- --db ./data/rentals.db
//! ```
//!
//! ## Generated Bookings
//! Creates bookings spread across the lifecycle so every desk screen has
//! something to show:
//! - Confirmed bookings with a part-advance on the ledger
//! - In-use rentals, some fully paid, some carrying a balance with a
//!   promised next payment date
//! - Completed rentals, a few with damage charges billed at return
//! - The odd cancelled booking
//!
//! All data is derived from the booking index, so repeated runs against a
//! fresh database produce the same fixtures.

use chrono::{Duration, NaiveTime, Utc};
use std::env;

use rentdesk_core::lifecycle::{plan_completion, plan_payment};
use rentdesk_core::types::ist_date_of;
use rentdesk_core::{
    Booking, BookingStatus, CompletionRequest, DamageRecord, Payment, PaymentMode, PaymentStatus,
    RentalPurpose,
};
use rentdesk_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Customer pool for demo bookings.
const CUSTOMERS: &[&str] = &[
    "cust-ravi-kumar",
    "cust-priya-sharma",
    "cust-arjun-mehta",
    "cust-sneha-patil",
    "cust-vikram-singh",
    "cust-anita-desai",
    "cust-rahul-nair",
    "cust-kavita-iyer",
];

/// Vehicle pool: registration-style ids.
const VEHICLES: &[&str] = &[
    "veh-KA01AB1234",
    "veh-KA05CD5678",
    "veh-KA03EF9012",
    "veh-KA51GH3456",
    "veh-KA02JK7890",
    "veh-KA41MN2345",
];

/// Outstation destinations, paired with an estimated distance in km.
const DESTINATIONS: &[(&str, i64)] = &[
    ("Mysore", 150),
    ("Coorg", 270),
    ("Ooty", 290),
    ("Hampi", 340),
    ("Chikmagalur", 245),
];

const PAYMENT_MODES: &[PaymentMode] = &[
    PaymentMode::Cash,
    PaymentMode::Upi,
    PaymentMode::Card,
    PaymentMode::BankTransfer,
];

/// Wires up the log subscriber for the seed run.
///
/// Progress goes to stdout via `println!`; tracing carries the pool and
/// migration internals. `RUST_LOG=debug` surfaces every sqlx query.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 20;
    let mut db_path = String::from("./rentdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("RentDesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of bookings to generate (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./rentdesk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 RentDesk Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Bookings: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing bookings
    let existing = db.bookings().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} bookings", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate bookings
    println!();
    println!("Generating bookings...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    for seed in 0..count {
        if let Err(e) = seed_booking(&db, seed).await {
            eprintln!("Failed to seed booking #{}: {}", seed, e);
            continue;
        }

        generated += 1;

        if generated % 10 == 0 {
            println!("  Generated {} bookings...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} bookings in {:?}", generated, elapsed);

    // Verify the ledger agrees with the projections
    println!();
    println!("Verifying ledger...");
    let ledger_rows = db.ledger().count().await?;
    println!("  Ledger rows: {}", ledger_rows);

    let in_use = db.bookings().list(Some(BookingStatus::InUse)).await?;
    println!("  In-use rentals: {}", in_use.len());
    let completed = db.bookings().list(Some(BookingStatus::Completed)).await?;
    println!("  Completed rentals: {}", completed.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Creates one booking in a lifecycle stage picked by its index.
async fn seed_booking(db: &Database, seed: usize) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let today = ist_date_of(now);

    let duration_days = 2 + (seed % 5) as i64;
    let daily_rate_paise = 120_000 + (seed % 6) as i64 * 30_000; // ₹1,200 - ₹2,700/day
    let booking_amount = daily_rate_paise * duration_days;

    let outstation = seed % 3 == 2;
    let deposit = if outstation { 300_000 } else { 100_000 };
    let mode = PAYMENT_MODES[seed % PAYMENT_MODES.len()];

    // Lifecycle bucket: 0 = confirmed + advance, 1 = in-use fully paid,
    // 2 = in-use on credit, 3 = completed, and every 10th gets cancelled.
    let bucket = seed % 4;
    let cancelled = seed % 10 == 9;

    // Upcoming bookings start a few days out; running/finished ones started
    // in the past so their dates read sensibly at the desk.
    let start_date = match bucket {
        0 => today + Duration::days(1 + (seed % 3) as i64),
        3 => today - Duration::days(duration_days + 2),
        _ => today - Duration::days((seed % duration_days as usize) as i64),
    };
    let end_date = start_date + Duration::days(duration_days);

    let mut booking = Booking {
        id: Uuid::new_v4().to_string(),
        booking_code: String::new(), // assigned by create()
        customer_id: CUSTOMERS[seed % CUSTOMERS.len()].to_string(),
        vehicle_id: VEHICLES[seed % VEHICLES.len()].to_string(),
        start_date,
        end_date,
        pickup_time: NaiveTime::from_hms_opt(9 + (seed % 3) as u32, 0, 0).unwrap_or_default(),
        dropoff_time: NaiveTime::from_hms_opt(17 + (seed % 4) as u32, 0, 0).unwrap_or_default(),
        booking_amount_paise: booking_amount,
        security_deposit_paise: deposit,
        damage_charges_paise: 0,
        late_fee_paise: 0,
        extension_fee_paise: 0,
        total_amount_paise: 0,
        paid_amount_paise: 0,
        payment_status: PaymentStatus::Pending,
        status: match bucket {
            0 => BookingStatus::Confirmed,
            _ => BookingStatus::InUse,
        },
        rental_purpose: if outstation {
            RentalPurpose::Outstation
        } else {
            RentalPurpose::Local
        },
        destination: outstation.then(|| DESTINATIONS[seed % DESTINATIONS.len()].0.to_string()),
        estimated_distance_km: outstation.then(|| DESTINATIONS[seed % DESTINATIONS.len()].1),
        start_odometer: outstation.then(|| 20_000 + (seed as i64) * 137),
        end_odometer: None,
        fuel_level: outstation.then(|| "full".to_string()),
        next_payment_date: None,
        created_by: "seed".to_string(),
        updated_by: "seed".to_string(),
        created_at: now,
        updated_at: now,
        completed_at: None,
        row_version: 0,
    };

    // Advance collected at creation: 30% for confirmed, full for bucket 1.
    let advance_paise = match bucket {
        0 => booking_amount * 30 / 100,
        1 => booking_amount + deposit,
        2 => booking_amount / 2,
        _ => booking_amount + deposit,
    };
    booking.paid_amount_paise = advance_paise;
    if bucket == 2 {
        booking.next_payment_date = Some(today + Duration::days(2));
    }
    booking.recompute_derived();

    let advance = Payment {
        id: Uuid::new_v4().to_string(),
        booking_id: booking.id.clone(),
        mode,
        amount_paise: advance_paise,
        note: Some("Advance at booking".to_string()),
        created_by: "seed".to_string(),
        created_at: now,
    };

    let stored = db.bookings().create(&booking, Some(&advance)).await?;

    if cancelled {
        let mut cancel = stored.clone();
        cancel.status = BookingStatus::Cancelled;
        db.bookings().update(&cancel).await?;
        return Ok(());
    }

    match bucket {
        // A second instalment lands on some credit rentals
        2 if seed % 2 == 0 => {
            let amount = booking_amount / 4;
            let plan = plan_payment(&stored, amount)?;
            let payment = Payment {
                id: Uuid::new_v4().to_string(),
                booking_id: stored.id.clone(),
                mode,
                amount_paise: amount,
                note: Some("Instalment".to_string()),
                created_by: "seed".to_string(),
                created_at: now,
            };
            db.bookings().record_payment(&stored, &payment, &plan).await?;
        }
        // Finished rentals get returned, a few with damage billed
        3 => {
            let with_damage = seed % 8 == 3;
            let request = CompletionRequest {
                damage_charges_paise: if with_damage { 75_000 } else { 0 },
                damage_description: with_damage.then(|| "Scratch on left door".to_string()),
                late_fee_paise: 0,
                extension_fee_paise: 0,
                final_payment_mode: Some(mode),
                odometer_reading: stored
                    .start_odometer
                    .map(|odo| odo + stored.estimated_distance_km.unwrap_or(200) * 2),
                fuel_level: outstation.then(|| "three-quarters".to_string()),
            };
            let plan = plan_completion(&stored, &request)?;

            let settlement = (plan.settlement_paise > 0).then(|| Payment {
                id: Uuid::new_v4().to_string(),
                booking_id: stored.id.clone(),
                mode,
                amount_paise: plan.settlement_paise,
                note: Some("Settlement at return".to_string()),
                created_by: "seed".to_string(),
                created_at: now,
            });
            let damage = plan.damage_record.as_ref().map(|draft| DamageRecord {
                id: Uuid::new_v4().to_string(),
                booking_id: stored.id.clone(),
                description: draft.description.clone(),
                charges_paise: draft.charges_paise,
                created_by: "seed".to_string(),
                created_at: now,
            });

            db.bookings()
                .apply_completion(&stored, &plan, settlement.as_ref(), damage.as_ref(), "seed", now)
                .await?;
        }
        _ => {}
    }

    Ok(())
}

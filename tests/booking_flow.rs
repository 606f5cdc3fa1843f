//! Database-backed booking and payment flow tests
//!
//! Run with a PostgreSQL server available:
//! DATABASE_URL=postgres://... cargo test --test booking_flow -- --ignored

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use mockall::mock;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio_test::{assert_err, assert_ok};

use triplan_server::{
    error::{AppError, AppResult},
    models::{
        booking::{AvailabilityRequest, CreateBooking},
        tour::CreateTour,
        payment::{CallbackQuery, PaymentOutcome},
        user::{Role, UserClaims},
        BookingStatus, PaymentStatus,
    },
    repository::Repository,
    services::{
        availability::OUTSIDE_TOUR_DATES,
        gateway::{PaymentGateway, PaymentInitRequest, PaymentSession},
        Services,
    },
};

mock! {
    pub Gateway {}

    #[async_trait]
    impl PaymentGateway for Gateway {
        async fn init_session(&self, request: &PaymentInitRequest) -> AppResult<PaymentSession>;
        async fn is_paid(&self, transaction_id: &str, amount: Decimal) -> AppResult<bool>;
    }
}

const PAGE_URL: &str = "https://sandbox.sslcommerz.com/EasyCheckOut/test";

fn accepting_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_init_session().returning(|_| {
        Ok(PaymentSession {
            redirect_url: PAGE_URL.to_string(),
        })
    });
    gateway.expect_is_paid().returning(|_, _| Ok(true));
    gateway
}

fn services(pool: &PgPool, gateway: MockGateway) -> Services {
    Services::new(Repository::new(pool.clone()), Arc::new(gateway))
}

async fn insert_user(pool: &PgPool, email: &str, with_contact: bool) -> i32 {
    let (phone, address) = if with_contact {
        (Some("01711111111"), Some("Dhaka"))
    } else {
        (None, None)
    };
    sqlx::query_scalar("INSERT INTO users (name, email, phone, address) VALUES ($1, $2, $3, $4) RETURNING id")
        .bind("Tanvir Ahmed")
        .bind(email)
        .bind(phone)
        .bind(address)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Tour with 10 seats at 1500.00, bookable through November 2026
async fn insert_tour(pool: &PgPool) -> i32 {
    sqlx::query_scalar(
        r#"
        INSERT INTO tours (title, cost_from, max_guest, start_date, end_date)
        VALUES ('Sundarbans Boat Safari', 1500.00, 10, '2026-11-01', '2026-11-30')
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_booking(pool: &PgPool, user_id: i32, tour_id: i32, date: &str, guests: i32, status: &str) {
    sqlx::query("INSERT INTO bookings (user_id, tour_id, date, guest_count, status) VALUES ($1, $2, $3, $4, $5)")
        .bind(user_id)
        .bind(tour_id)
        .bind(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap())
        .bind(guests)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

fn claims(user_id: i32) -> UserClaims {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: format!("user-{}", user_id),
        user_id,
        role: Role::User,
        exp: now + 3600,
        iat: now,
    }
}

fn callback(transaction_id: &str) -> CallbackQuery {
    CallbackQuery {
        transaction_id: transaction_id.to_string(),
        amount: None,
        status: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn booking_creates_pending_booking_and_unpaid_payment(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour = insert_tour(&pool).await;
    let services = services(&pool, accepting_gateway());

    let created = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-15".to_string(),
                guest_count: 5,
            },
            user,
        )
        .await
        .unwrap();

    assert_eq!(created.payment_url, PAGE_URL);
    assert_eq!(created.booking.status, BookingStatus::Pending);
    assert_eq!(created.booking.user.id, user);
    assert_eq!(created.booking.tour.id, tour);

    let payment = created.booking.payment.expect("payment is linked");
    assert_eq!(payment.status, PaymentStatus::Unpaid);
    assert_eq!(payment.amount, Decimal::new(750000, 2));
    assert!(payment.transaction_id.starts_with("tran_"));

    let availability = services
        .availability
        .check(&AvailabilityRequest {
            tour,
            date: "2026-11-15".to_string(),
            guest_count: 5,
        })
        .await
        .unwrap();
    assert!(availability.available);
    assert_eq!(availability.remaining_seats, 5);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn confirmed_guests_limit_availability_and_booking(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour = insert_tour(&pool).await;
    insert_booking(&pool, user, tour, "2026-11-15", 8, "CONFIRM").await;
    // Failed and cancelled bookings hold no seats
    insert_booking(&pool, user, tour, "2026-11-15", 4, "FAILED").await;
    insert_booking(&pool, user, tour, "2026-11-15", 4, "CANCELLED").await;

    let services = services(&pool, MockGateway::new());

    let availability = services
        .availability
        .check(&AvailabilityRequest {
            tour,
            date: "2026-11-15".to_string(),
            guest_count: 5,
        })
        .await
        .unwrap();
    assert!(!availability.available);
    assert_eq!(availability.remaining_seats, 2);

    let result = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-15".to_string(),
                guest_count: 5,
            },
            user,
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(count(&pool, "bookings").await, 3);
    assert_eq!(count(&pool, "payments").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn dates_outside_the_tour_window(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour = insert_tour(&pool).await;
    let services = services(&pool, MockGateway::new());

    let availability = services
        .availability
        .check(&AvailabilityRequest {
            tour,
            date: "2026-12-05".to_string(),
            guest_count: 1,
        })
        .await
        .unwrap();
    assert!(!availability.available);
    assert_eq!(availability.message, OUTSIDE_TOUR_DATES);

    let result = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-12-05".to_string(),
                guest_count: 1,
            },
            user,
        )
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(count(&pool, "bookings").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn gateway_failure_leaves_no_trace(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour = insert_tour(&pool).await;

    let mut gateway = MockGateway::new();
    gateway
        .expect_init_session()
        .times(1)
        .returning(|_| Err(AppError::Gateway("Payment gateway timed out".to_string())));
    let services = services(&pool, gateway);

    let result = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-15".to_string(),
                guest_count: 2,
            },
            user,
        )
        .await;

    assert!(matches!(result, Err(AppError::Gateway(_))));
    assert_eq!(count(&pool, "bookings").await, 0);
    assert_eq!(count(&pool, "payments").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn incomplete_profile_is_rejected_before_any_write(pool: PgPool) {
    let user = insert_user(&pool, "noaddress@example.com", false).await;
    let tour = insert_tour(&pool).await;
    let services = services(&pool, MockGateway::new());

    let result = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-15".to_string(),
                guest_count: 1,
            },
            user,
        )
        .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(count(&pool, "bookings").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn success_callback_is_idempotent(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour = insert_tour(&pool).await;
    let services = services(&pool, accepting_gateway());

    let created = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-20".to_string(),
                guest_count: 3,
            },
            user,
        )
        .await
        .unwrap();
    let transaction_id = created.booking.payment.unwrap().transaction_id;

    let first = assert_ok!(
        services
            .payments
            .handle_callback(PaymentOutcome::Success, &callback(&transaction_id))
            .await
    );
    assert!(first.changed);
    assert_eq!(first.amount, Decimal::new(450000, 2));

    let replay = assert_ok!(
        services
            .payments
            .handle_callback(PaymentOutcome::Success, &callback(&transaction_id))
            .await
    );
    assert!(!replay.changed);

    let booking = services.bookings.get_booking(created.booking.id, &claims(user)).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirm);
    let payment = booking.payment.unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert!(payment.gateway_data.is_some());

    // A settled payment cannot be failed afterwards
    let late_failure = services
        .payments
        .handle_callback(PaymentOutcome::Fail, &callback(&transaction_id))
        .await;
    assert!(matches!(late_failure, Err(AppError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn success_callback_needs_the_gateway_to_confirm_payment(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour = insert_tour(&pool).await;

    let mut gateway = MockGateway::new();
    gateway.expect_init_session().times(1).returning(|_| {
        Ok(PaymentSession {
            redirect_url: PAGE_URL.to_string(),
        })
    });
    gateway
        .expect_is_paid()
        .withf(|_, amount| *amount == Decimal::new(300000, 2))
        .times(1)
        .returning(|_, _| Ok(false));
    let services = services(&pool, gateway);

    let created = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-20".to_string(),
                guest_count: 2,
            },
            user,
        )
        .await
        .unwrap();
    let transaction_id = created.booking.payment.unwrap().transaction_id;

    // The owner knows the transaction id but has not paid
    let forged = services
        .payments
        .handle_callback(PaymentOutcome::Success, &callback(&transaction_id))
        .await;
    assert!(matches!(forged, Err(AppError::BadRequest(_))));

    let booking = services.bookings.get_booking(created.booking.id, &claims(user)).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment.unwrap().status, PaymentStatus::Unpaid);

    // Failure and cancellation need no confirmation
    assert_ok!(
        services
            .payments
            .handle_callback(PaymentOutcome::Cancel, &callback(&transaction_id))
            .await
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn failed_payment_releases_seats(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour = insert_tour(&pool).await;
    let services = services(&pool, accepting_gateway());

    let created = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-20".to_string(),
                guest_count: 10,
            },
            user,
        )
        .await
        .unwrap();
    let transaction_id = created.booking.payment.unwrap().transaction_id;

    assert_ok!(
        services
            .payments
            .handle_callback(PaymentOutcome::Fail, &callback(&transaction_id))
            .await
    );

    let availability = services
        .availability
        .check(&AvailabilityRequest {
            tour,
            date: "2026-11-20".to_string(),
            guest_count: 10,
        })
        .await
        .unwrap();
    assert!(availability.available);
    assert_eq!(availability.remaining_seats, 10);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unknown_transaction_id_changes_nothing(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour = insert_tour(&pool).await;
    let services = services(&pool, accepting_gateway());

    let created = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-20".to_string(),
                guest_count: 1,
            },
            user,
        )
        .await
        .unwrap();

    let result = assert_err!(
        services
            .payments
            .handle_callback(PaymentOutcome::Success, &callback("tran_does_not_exist"))
            .await
    );
    assert!(matches!(result, AppError::NotFound(_)));

    let booking = services.bookings.get_booking(created.booking.id, &claims(user)).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment.unwrap().status, PaymentStatus::Unpaid);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn cancelling_a_booking_cancels_its_payment(pool: PgPool) {
    let owner = insert_user(&pool, "owner@example.com", true).await;
    let other = insert_user(&pool, "other@example.com", true).await;
    let tour = insert_tour(&pool).await;
    let services = services(&pool, accepting_gateway());

    let created = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-10".to_string(),
                guest_count: 2,
            },
            owner,
        )
        .await
        .unwrap();

    let forbidden = services.bookings.cancel_booking(created.booking.id, &claims(other)).await;
    assert!(matches!(forbidden, Err(AppError::Authorization(_))));

    let cancelled = services
        .bookings
        .cancel_booking(created.booking.id, &claims(owner))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.payment.unwrap().status, PaymentStatus::Cancelled);

    // The payment can no longer be reopened or confirmed
    let reopen = services.payments.reinitiate(created.booking.id, &claims(owner)).await;
    assert!(matches!(reopen, Err(AppError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_bookings_never_exceed_capacity(pool: PgPool) {
    let tour = insert_tour(&pool).await;
    let mut users = Vec::new();
    for i in 0..4 {
        users.push(insert_user(&pool, &format!("guest{}@example.com", i), true).await);
    }
    let services = Arc::new(services(&pool, accepting_gateway()));

    // 4 x 3 guests against 10 seats: exactly one attempt must lose
    let handles: Vec<_> = users
        .into_iter()
        .map(|user| {
            let services = services.clone();
            tokio::spawn(async move {
                services
                    .bookings
                    .create_booking(
                        &CreateBooking {
                            tour,
                            date: "2026-11-25".to_string(),
                            guest_count: 3,
                        },
                        user,
                    )
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(succeeded, 3);
    assert_eq!(conflicts, 1);

    let held: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(guest_count), 0)::bigint FROM bookings WHERE tour_id = $1 AND status IN ('PENDING', 'CONFIRM')",
    )
    .bind(tour)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(held <= 10);
}

fn river_cruise() -> CreateTour {
    CreateTour {
        title: "Padma River Cruise".to_string(),
        description: None,
        cost_from: Some(Decimal::new(2000, 0)),
        max_guest: 20,
        start_date: NaiveDate::from_ymd_opt(2026, 12, 1),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_tour_titles_conflict_even_when_racing(pool: PgPool) {
    let services = services(&pool, MockGateway::new());
    let (first, second) = (river_cruise(), river_cruise());

    let (a, b) = tokio::join!(services.tours.create(&first), services.tours.create(&second));
    let results = [a, b];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(r, Err(AppError::Conflict(_)))));

    let again = services.tours.create(&river_cruise()).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(count(&pool, "tours").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unpayable_totals_are_rejected_before_any_write(pool: PgPool) {
    let user = insert_user(&pool, "tanvir@example.com", true).await;
    let tour: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO tours (title, cost_from, max_guest, start_date, end_date)
        VALUES ('Private Island Charter', 9000000000.00, 50, '2026-11-01', '2026-11-30')
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    let services = services(&pool, MockGateway::new());

    let result = services
        .bookings
        .create_booking(
            &CreateBooking {
                tour,
                date: "2026-11-15".to_string(),
                guest_count: 2,
            },
            user,
        )
        .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(count(&pool, "bookings").await, 0);
    assert_eq!(count(&pool, "payments").await, 0);
}

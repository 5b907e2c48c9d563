//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful failure
//! messages than bare `assert!`.

use core_kernel::{Classify, ErrorKind, Money};
use domain_booking::{Booking, BookingStatus};
use domain_catalog::BookableResource;
use domain_payment::{Payment, PaymentStatus};
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {}",
        money
    );
}

/// Asserts that a result failed with the given classification
pub fn assert_error_kind<T: std::fmt::Debug, E: Classify + std::fmt::Debug>(
    result: &Result<T, E>,
    expected: ErrorKind,
) {
    match result {
        Ok(value) => panic!("Expected {} error, got Ok({:?})", expected, value),
        Err(err) => assert_eq!(
            err.kind(),
            expected,
            "Expected {} error, got {:?}",
            expected,
            err
        ),
    }
}

pub fn assert_booking_status(booking: &Booking, expected: BookingStatus) {
    assert_eq!(
        booking.status, expected,
        "Booking {} is {}, expected {}",
        booking.id, booking.status, expected
    );
}

pub fn assert_payment_status(payment: &Payment, expected: PaymentStatus) {
    assert_eq!(
        payment.status, expected,
        "Payment {} is {}, expected {}",
        payment.id, payment.status, expected
    );
}

/// Asserts `capacity - available` equals the units held by the resource's
/// PENDING and CONFIRMED bookings
pub fn assert_inventory_balanced(resource: &BookableResource, bookings: &[Booking]) {
    let reference = resource.resource_ref();
    let held: u64 = bookings
        .iter()
        .filter(|b| b.resource == reference && b.status.holds_inventory())
        .map(|b| u64::from(b.quantity))
        .sum();
    let deducted = u64::from(resource.capacity()) - u64::from(resource.available());
    assert_eq!(
        deducted, held,
        "Inventory drift on {}: {} units deducted but {} held by bookings",
        reference, deducted, held
    );
}

//! Payment entity and error classification tests

use chrono::Utc;
use rust_decimal_macros::dec;

use core_kernel::{BookingId, Classify, Currency, ErrorKind, Money, PaymentId, PortError};
use domain_booking::{BookingError, BookingStatus};
use domain_payment::{Payment, PaymentError, PaymentMethod, PaymentStatus};

fn payment() -> Payment {
    Payment::new(
        BookingId::new(),
        Money::new(dec!(420), Currency::USD),
        PaymentMethod::Card,
        Utc::now(),
    )
}

#[test]
fn test_new_payment_is_pending() {
    let p = payment();
    assert_eq!(p.status, PaymentStatus::Pending);
    assert_eq!(p.version, 1);
    assert!(p.completed_at.is_none());
}

#[test]
fn test_payment_serializes_status_and_method_uppercase() {
    let mut p = payment();
    p.method = PaymentMethod::BankTransfer;
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["method"], "BANK_TRANSFER");
}

#[test]
fn test_status_parse_round_trips_display() {
    for status in [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ] {
        assert_eq!(status.to_string().parse::<PaymentStatus>().unwrap(), status);
    }
}

#[test]
fn test_settlement_failure_takes_booking_error_kind() {
    let booking_id = BookingId::new();
    let err = PaymentError::SettlementFailed {
        payment_id: PaymentId::new(),
        source: Box::new(BookingError::InvalidTransition {
            booking_id,
            from: BookingStatus::Cancelled,
            to: BookingStatus::Confirmed,
        }),
    };
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[test]
fn test_error_kinds() {
    let id = PaymentId::new();
    assert_eq!(PaymentError::PaymentNotFound(id).kind(), ErrorKind::NotFound);
    assert_eq!(
        PaymentError::RefundNotAllowed { payment_id: id, status: PaymentStatus::Pending }.kind(),
        ErrorKind::RefundNotAllowed
    );
    assert_eq!(
        PaymentError::Port(PortError::connection("down")).kind(),
        ErrorKind::Unavailable
    );
    assert_eq!(
        PaymentError::DuplicateTransaction("TXN-1".into()).kind(),
        ErrorKind::Duplicate
    );
}

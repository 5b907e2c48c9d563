//! Property-Based Test Generators
//!
//! Proptest strategies for money, quantities and random sequences of
//! booking operations.

use core_kernel::{Currency, Money};
use proptest::prelude::*;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
        Just(Currency::PKR),
        Just(Currency::AED),
    ]
}

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for generating Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating USD unit prices
pub fn usd_price_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Resource capacities
pub fn capacity_strategy() -> impl Strategy<Value = i64> {
    1i64..=50i64
}

/// Requested quantities, sometimes larger than any capacity
pub fn quantity_strategy() -> impl Strategy<Value = i64> {
    1i64..=60i64
}

/// One step applied to a shared resource. Indices pick an existing booking
/// modulo the number created so far.
#[derive(Debug, Clone)]
pub enum BookingOp {
    Book(i64),
    Confirm(usize),
    Cancel(usize),
    Resize(usize, i64),
}

pub fn booking_op_strategy() -> impl Strategy<Value = BookingOp> {
    prop_oneof![
        3 => quantity_strategy().prop_map(BookingOp::Book),
        1 => any::<usize>().prop_map(BookingOp::Confirm),
        2 => any::<usize>().prop_map(BookingOp::Cancel),
        1 => (any::<usize>(), quantity_strategy()).prop_map(|(i, q)| BookingOp::Resize(i, q)),
    ]
}

pub fn booking_ops_strategy() -> impl Strategy<Value = Vec<BookingOp>> {
    prop::collection::vec(booking_op_strategy(), 1..30)
}

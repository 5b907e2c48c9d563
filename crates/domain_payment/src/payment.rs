//! Payment entity and its status machine
//!
//! ```text
//! PENDING ──process──▶ COMPLETED ──refund──▶ REFUNDED
//!    │
//!    └──fail──▶ FAILED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{BookingId, Money, PaymentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "FAILED" => Ok(PaymentStatus::Failed),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Paypal,
    Cash,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Paypal => "PAYPAL",
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Wallet => "WALLET",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "CARD" | "CREDIT_CARD" | "DEBIT_CARD" => Ok(PaymentMethod::Card),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "PAYPAL" => Ok(PaymentMethod::Paypal),
            "CASH" => Ok(PaymentMethod::Cash),
            "WALLET" => Ok(PaymentMethod::Wallet),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// A payment against one booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Unique reference handed to the payer
    pub transaction_id: String,
    pub payment_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Payment {
    pub fn new(booking_id: BookingId, amount: Money, method: PaymentMethod, now: DateTime<Utc>) -> Self {
        Self {
            id: PaymentId::new_v7(),
            booking_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: generate_transaction_id(),
            payment_date: now,
            completed_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = PaymentStatus::Completed;
        self.payment_date = at;
        self.completed_at = Some(at);
        self.failure_reason = None;
        self.updated_at = at;
    }

    pub fn fail(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.updated_at = at;
    }

    pub fn refund(&mut self, at: DateTime<Utc>) {
        self.status = PaymentStatus::Refunded;
        self.updated_at = at;
    }
}

/// `TXN-` followed by a time-ordered uuid
pub fn generate_transaction_id() -> String {
    format!("TXN-{}", Uuid::now_v7().simple()).to_ascii_uppercase()
}

/// Input for creating a payment
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub booking_id: BookingId,
    pub amount: Money,
    /// One of CARD, BANK_TRANSFER, PAYPAL, CASH, WALLET
    pub method: String,
}

/// Input for amending a pending payment
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub amount: Money,
    pub method: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transaction_ids_are_unique_and_prefixed() {
        let a = generate_transaction_id();
        let b = generate_transaction_id();
        assert!(a.starts_with("TXN-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("credit card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("bank-transfer".parse::<PaymentMethod>().unwrap(), PaymentMethod::BankTransfer);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_complete_clears_failure() {
        let mut p = Payment::new(
            BookingId::new(),
            Money::new(dec!(50), Currency::USD),
            PaymentMethod::Cash,
            Utc::now(),
        );
        p.fail("card declined", Utc::now());
        p.complete(Utc::now());
        assert_eq!(p.status, PaymentStatus::Completed);
        assert!(p.failure_reason.is_none());
        assert!(p.completed_at.is_some());
    }
}

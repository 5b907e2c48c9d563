//! Payment DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BookingId, Currency, Money};
use domain_payment::{PaymentRequest, PaymentUpdate};

use super::money_in;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub booking_id: BookingId,
    pub amount: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub method: String,
}

impl CreatePaymentRequest {
    pub fn into_request(self, default: Currency) -> Result<PaymentRequest, ApiError> {
        Ok(PaymentRequest {
            booking_id: self.booking_id,
            amount: money_in(self.amount, self.currency.as_deref(), default)?,
            method: self.method,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    pub amount: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub method: String,
}

impl UpdatePaymentRequest {
    pub fn into_update(self, default: Currency) -> Result<PaymentUpdate, ApiError> {
        Ok(PaymentUpdate {
            amount: money_in(self.amount, self.currency.as_deref(), default)?,
            method: self.method,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct FailPaymentRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    pub status: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentSummary {
    pub total_revenue: Money,
    pub pending_amount: Money,
    pub count: usize,
}

//! Data Transfer Objects
//!
//! Request bodies and query strings. Each type validates its own shape with
//! `validator` and converts into the domain input it stands for; business
//! rules stay in the services.

pub mod booking;
pub mod catalog;
pub mod payment;
pub mod user;

use serde::Serialize;

use core_kernel::{Currency, Money};

use crate::error::ApiError;

/// Resolves an optional currency code against the configured default
pub(crate) fn money_in(
    amount: rust_decimal::Decimal,
    currency: Option<&str>,
    default: Currency,
) -> Result<Money, ApiError> {
    let currency = match currency {
        Some(code) => code
            .parse::<Currency>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => default,
    };
    Ok(Money::new(amount, currency))
}

/// Parses a query-string enum such as `status=PENDING`
pub(crate) fn parse_param<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, ApiError> {
    value.parse().map_err(ApiError::BadRequest)
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_in_defaults_currency() {
        let money = money_in(dec!(12.5), None, Currency::PKR).unwrap();
        assert_eq!(money.currency(), Currency::PKR);

        let money = money_in(dec!(12.5), Some("eur"), Currency::PKR).unwrap();
        assert_eq!(money.currency(), Currency::EUR);

        assert!(money_in(dec!(1), Some("zzz"), Currency::USD).is_err());
    }
}

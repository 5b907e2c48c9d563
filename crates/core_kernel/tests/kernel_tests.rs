//! Integration tests for the core kernel's public surface

use core_kernel::{
    validation, BookingId, Classify, Currency, ErrorKind, Money, PaymentId, PortError, TourId,
    ValidationError,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

mod identifier_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(BookingId::new(), BookingId::new());
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = PaymentId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = PaymentId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_display_and_parse_roundtrip() {
        let id = TourId::new();
        let parsed: TourId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!(id.to_string().starts_with("TOUR-"));
    }

    #[test]
    fn test_serde_is_transparent() {
        let uuid = Uuid::new_v4();
        let id = BookingId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}

mod money_tests {
    use super::*;

    #[test]
    fn test_booking_total() {
        let unit = Money::new(dec!(120.00), Currency::USD);
        assert_eq!(unit.times(3).unwrap(), Money::new(dec!(360.00), Currency::USD));
    }

    #[test]
    fn test_revenue_sum() {
        let totals = vec![
            Money::new(dec!(100.00), Currency::USD),
            Money::new(dec!(250.50), Currency::USD),
        ];
        let sum = Money::sum(Currency::USD, totals.iter()).unwrap();
        assert_eq!(sum.amount(), dec!(350.50));
    }

    #[test]
    fn test_display_uses_minor_units() {
        let m = Money::new(dec!(1234.5), Currency::USD);
        assert_eq!(m.to_string(), "$ 1234.50");
    }

    #[test]
    fn test_serde_shape() {
        let m = Money::new(dec!(10.5), Currency::EUR);
        let value = serde_json::to_value(m).unwrap();
        assert_eq!(value["currency"], "EUR");
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_validation_classifies_as_invalid_input() {
        let err = validation::non_blank("name", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_port_errors_classify() {
        assert_eq!(PortError::duplicate("email").kind(), ErrorKind::Duplicate);
        assert_eq!(PortError::connection("down").kind(), ErrorKind::Unavailable);
        assert_eq!(PortError::internal("boom").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_validation_error_fields() {
        let err = ValidationError::new("rating", "must be between 0 and 5");
        assert_eq!(err.field, "rating");
        assert!(err.to_string().contains("rating"));
    }
}

//! Payment Domain Ports

use async_trait::async_trait;
use std::sync::Arc;

use core_kernel::{BookingId, DomainPort, HealthCheckable, PaymentId, PortError};
use domain_booking::BookingPayments;

use crate::payment::{Payment, PaymentMethod, PaymentStatus};

#[async_trait]
pub trait PaymentPort: DomainPort + HealthCheckable {
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    /// All payments, oldest first
    async fn list_payments(&self) -> Result<Vec<Payment>, PortError>;

    /// Payments recorded against a booking, oldest first
    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Vec<Payment>, PortError>;

    async fn find_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, PortError>;

    async fn find_by_method(&self, method: PaymentMethod) -> Result<Vec<Payment>, PortError>;

    async fn exists_by_transaction_id(&self, transaction_id: &str) -> Result<bool, PortError>;

    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, PortError>;

    /// Compare-and-set on `payment.version`
    async fn update_payment(&self, payment: &Payment) -> Result<Payment, PortError>;

    async fn delete_payment(&self, id: PaymentId, version: i64) -> Result<(), PortError>;
}

/// Payment records per booking, as seen by the booking service
pub struct PaymentRecords {
    port: Arc<dyn PaymentPort>,
}

impl PaymentRecords {
    pub fn new(port: Arc<dyn PaymentPort>) -> Self {
        Self { port }
    }
}

#[async_trait]
impl BookingPayments for PaymentRecords {
    async fn has_payments(&self, booking_id: BookingId) -> Result<bool, PortError> {
        Ok(!self.port.find_by_booking(booking_id).await?.is_empty())
    }
}

/// Mock implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory mock implementation of PaymentPort
    #[derive(Debug, Default)]
    pub struct MockPaymentPort {
        payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
        failures: AtomicUsize,
    }

    impl MockPaymentPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// The next insert, update or delete fails with a connection error
        pub fn fail_next_save(&self) {
            self.fail_next_saves(1);
        }

        /// The next `count` writes fail with a connection error
        pub fn fail_next_saves(&self, count: usize) {
            self.failures.store(count, Ordering::SeqCst);
        }

        fn injected_failure(&self) -> Result<(), PortError> {
            let pending = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if pending.is_ok() {
                return Err(PortError::connection("injected save failure"));
            }
            Ok(())
        }

        async fn filtered(&self, predicate: impl Fn(&Payment) -> bool) -> Vec<Payment> {
            let mut found: Vec<_> = self
                .payments
                .read()
                .await
                .values()
                .filter(|p| predicate(p))
                .cloned()
                .collect();
            found.sort_by_key(|p| (p.created_at, *p.id.as_uuid()));
            found
        }
    }

    impl DomainPort for MockPaymentPort {}

    #[async_trait]
    impl HealthCheckable for MockPaymentPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-payment-port", 0)
        }
    }

    #[async_trait]
    impl PaymentPort for MockPaymentPort {
        async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
            self.payments
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Payment", id))
        }

        async fn list_payments(&self) -> Result<Vec<Payment>, PortError> {
            Ok(self.filtered(|_| true).await)
        }

        async fn find_by_booking(&self, booking_id: BookingId) -> Result<Vec<Payment>, PortError> {
            Ok(self.filtered(|p| p.booking_id == booking_id).await)
        }

        async fn find_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, PortError> {
            Ok(self.filtered(|p| p.status == status).await)
        }

        async fn find_by_method(&self, method: PaymentMethod) -> Result<Vec<Payment>, PortError> {
            Ok(self.filtered(|p| p.method == method).await)
        }

        async fn exists_by_transaction_id(&self, transaction_id: &str) -> Result<bool, PortError> {
            Ok(self
                .payments
                .read()
                .await
                .values()
                .any(|p| p.transaction_id == transaction_id))
        }

        async fn insert_payment(&self, payment: &Payment) -> Result<Payment, PortError> {
            self.injected_failure()?;
            let mut payments = self.payments.write().await;
            if payments.contains_key(&payment.id)
                || payments.values().any(|p| p.transaction_id == payment.transaction_id)
            {
                return Err(PortError::duplicate(format!("payment {}", payment.transaction_id)));
            }
            payments.insert(payment.id, payment.clone());
            Ok(payment.clone())
        }

        async fn update_payment(&self, payment: &Payment) -> Result<Payment, PortError> {
            self.injected_failure()?;
            let mut payments = self.payments.write().await;
            let stored = payments
                .get(&payment.id)
                .ok_or_else(|| PortError::not_found("Payment", payment.id))?;
            if stored.version != payment.version {
                return Err(PortError::conflict("Payment", payment.id, payment.version));
            }
            let mut saved = payment.clone();
            saved.version += 1;
            payments.insert(saved.id, saved.clone());
            Ok(saved)
        }

        async fn delete_payment(&self, id: PaymentId, version: i64) -> Result<(), PortError> {
            self.injected_failure()?;
            let mut payments = self.payments.write().await;
            let stored = payments
                .get(&id)
                .ok_or_else(|| PortError::not_found("Payment", id))?;
            if stored.version != version {
                return Err(PortError::conflict("Payment", id, version));
            }
            payments.remove(&id);
            Ok(())
        }
    }
}

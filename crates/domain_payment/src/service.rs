//! Payment Service
//!
//! Settlement couples two state machines: completing a payment confirms its
//! booking and refunding it cancels the booking. Operations that touch the
//! same booking are serialized, and the payment record is only written as
//! COMPLETED once the booking is CONFIRMED, so a stored COMPLETED payment
//! never points at a booking in any other state.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use core_kernel::{
    validation, BookingId, Clock, Currency, KeyedLocks, Money, PaymentId,
    ValidationError,
};
use domain_booking::{BookingError, BookingService, BookingStatus};

use crate::error::PaymentError;
use crate::payment::{Payment, PaymentMethod, PaymentRequest, PaymentStatus, PaymentUpdate};
use crate::ports::PaymentPort;

const DEFAULT_FAILURE_REASON: &str = "Marked as failed";

pub struct PaymentService {
    port: Arc<dyn PaymentPort>,
    bookings: Arc<BookingService>,
    clock: Arc<dyn Clock>,
    currency: Currency,
    locks: KeyedLocks<BookingId>,
}

impl PaymentService {
    pub fn new(
        port: Arc<dyn PaymentPort>,
        bookings: Arc<BookingService>,
        clock: Arc<dyn Clock>,
        currency: Currency,
    ) -> Self {
        Self {
            port,
            bookings,
            clock,
            currency,
            locks: KeyedLocks::new(),
        }
    }

    /// Records a PENDING payment against an open booking
    #[instrument(skip(self, request), fields(booking_id = %request.booking_id))]
    pub async fn create(&self, request: PaymentRequest) -> Result<Payment, PaymentError> {
        validation::positive_money("amount", &request.amount)?;
        let method = parse_method(&request.method)?;
        let booking_id = request.booking_id;
        let _guard = self.locks.lock(&booking_id).await;

        // Holding the booking's own lock keeps a concurrent booking delete
        // from slipping in between the status check and the insert
        self.bookings
            .exclusive(booking_id, || async move {
                let booking = self.bookings.get(booking_id).await?;
                if booking.status == BookingStatus::Cancelled {
                    return Err(PaymentError::PaymentNotAllowed { booking_id });
                }
                if self.completed_for(booking_id, None).await?.is_some() {
                    return Err(PaymentError::PaymentAlreadyExists { booking_id });
                }

                let payment = Payment::new(booking_id, request.amount, method, self.clock.now());
                if self
                    .port
                    .exists_by_transaction_id(&payment.transaction_id)
                    .await?
                {
                    return Err(PaymentError::DuplicateTransaction(payment.transaction_id));
                }

                let saved = self.port.insert_payment(&payment).await?;
                info!(
                    payment_id = %saved.id,
                    amount = %saved.amount,
                    method = %saved.method,
                    "Payment created"
                );
                Ok(saved)
            })
            .await
    }

    /// Settles a PENDING payment and confirms its booking.
    ///
    /// If the booking cannot be confirmed, for any reason, the payment is
    /// marked FAILED and `SettlementFailed` is returned. Only a failed write
    /// of the COMPLETED payment after a successful confirm leaves it PENDING;
    /// a retry then finds the booking confirmed and completes.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn process(&self, id: PaymentId) -> Result<Payment, PaymentError> {
        let booking_id = self.load(id).await?.booking_id;
        let _guard = self.locks.lock(&booking_id).await;

        let mut payment = self.load(id).await?;
        match payment.status {
            PaymentStatus::Pending => {}
            PaymentStatus::Completed | PaymentStatus::Refunded => {
                return Err(PaymentError::AlreadyProcessed {
                    payment_id: id,
                    status: payment.status,
                })
            }
            PaymentStatus::Failed => return Err(PaymentError::Unprocessable { payment_id: id }),
        }
        if self.completed_for(booking_id, Some(id)).await?.is_some() {
            return Err(PaymentError::PaymentAlreadyExists { booking_id });
        }

        if let Err(e) = self.confirm_booking(booking_id).await {
            payment.fail(e.to_string(), self.clock.now());
            if let Err(save_err) = self.port.update_payment(&payment).await {
                error!(error = %save_err, "Failed to record payment failure");
            }
            warn!(reason = %e, "Payment failed during settlement");
            return Err(PaymentError::SettlementFailed {
                payment_id: id,
                source: Box::new(e),
            });
        }

        payment.complete(self.clock.now());
        let saved = self.port.update_payment(&payment).await.map_err(|e| {
            // The booking stays CONFIRMED; a retry finds it confirmed and completes
            warn!(error = %e, "Booking confirmed but payment write failed");
            PaymentError::from(e)
        })?;
        info!(booking_id = %booking_id, amount = %saved.amount, "Payment processed");
        Ok(saved)
    }

    /// COMPLETED → REFUNDED, cancelling the booking.
    ///
    /// If the booking cannot be cancelled the payment is restored to
    /// COMPLETED and the booking error is returned.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn refund(&self, id: PaymentId) -> Result<Payment, PaymentError> {
        let booking_id = self.load(id).await?.booking_id;
        let _guard = self.locks.lock(&booking_id).await;

        let mut payment = self.load(id).await?;
        if payment.status != PaymentStatus::Completed {
            return Err(PaymentError::RefundNotAllowed {
                payment_id: id,
                status: payment.status,
            });
        }

        payment.refund(self.clock.now());
        let refunded = self.port.update_payment(&payment).await?;

        if let Err(e) = self.cancel_booking(booking_id).await {
            let mut restored = refunded.clone();
            restored.status = PaymentStatus::Completed;
            restored.updated_at = self.clock.now();
            if let Err(save_err) = self.port.update_payment(&restored).await {
                error!(error = %save_err, "Failed to restore payment after aborted refund");
            }
            return Err(e.into());
        }

        info!(booking_id = %booking_id, amount = %refunded.amount, "Payment refunded");
        Ok(refunded)
    }

    /// Amends amount and method of a PENDING payment
    #[instrument(skip(self, changes), fields(payment_id = %id))]
    pub async fn update(&self, id: PaymentId, changes: PaymentUpdate) -> Result<Payment, PaymentError> {
        validation::positive_money("amount", &changes.amount)?;
        let method = parse_method(&changes.method)?;
        let booking_id = self.load(id).await?.booking_id;
        let _guard = self.locks.lock(&booking_id).await;

        let mut payment = self.load(id).await?;
        if payment.status != PaymentStatus::Pending {
            return Err(PaymentError::UpdateNotAllowed {
                payment_id: id,
                status: payment.status,
            });
        }

        payment.amount = changes.amount;
        payment.method = method;
        payment.updated_at = self.clock.now();
        let saved = self.port.update_payment(&payment).await?;
        info!(amount = %saved.amount, method = %saved.method, "Payment updated");
        Ok(saved)
    }

    /// Marks a payment FAILED; settled payments cannot fail afterwards
    #[instrument(skip(self, reason), fields(payment_id = %id))]
    pub async fn mark_failed(&self, id: PaymentId, reason: Option<String>) -> Result<Payment, PaymentError> {
        let booking_id = self.load(id).await?.booking_id;
        let _guard = self.locks.lock(&booking_id).await;

        let mut payment = self.load(id).await?;
        if matches!(payment.status, PaymentStatus::Completed | PaymentStatus::Refunded) {
            return Err(PaymentError::UpdateNotAllowed {
                payment_id: id,
                status: payment.status,
            });
        }

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string());
        payment.fail(reason, self.clock.now());
        let saved = self.port.update_payment(&payment).await?;
        info!(reason = saved.failure_reason.as_deref().unwrap_or_default(), "Payment marked failed");
        Ok(saved)
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn delete(&self, id: PaymentId) -> Result<(), PaymentError> {
        let booking_id = self.load(id).await?.booking_id;
        let _guard = self.locks.lock(&booking_id).await;

        let payment = self.load(id).await?;
        if payment.status == PaymentStatus::Completed {
            return Err(PaymentError::DeletionNotAllowed {
                payment_id: id,
                status: payment.status,
            });
        }

        self.port.delete_payment(id, payment.version).await?;
        info!(status = %payment.status, "Payment deleted");
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get(&self, id: PaymentId) -> Result<Payment, PaymentError> {
        self.load(id).await
    }

    pub async fn list(&self) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.port.list_payments().await?)
    }

    /// Every payment recorded against the booking, oldest first
    pub async fn list_by_booking(&self, booking_id: BookingId) -> Result<Vec<Payment>, PaymentError> {
        self.bookings.get(booking_id).await?;
        Ok(self.port.find_by_booking(booking_id).await?)
    }

    /// The most recent payment for the booking
    pub async fn get_by_booking(&self, booking_id: BookingId) -> Result<Payment, PaymentError> {
        self.list_by_booking(booking_id)
            .await?
            .pop()
            .ok_or(PaymentError::NoPaymentForBooking(booking_id))
    }

    pub async fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.port.find_by_status(status).await?)
    }

    pub async fn list_by_method(&self, method: PaymentMethod) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.port.find_by_method(method).await?)
    }

    pub async fn pending(&self) -> Result<Vec<Payment>, PaymentError> {
        self.list_by_status(PaymentStatus::Pending).await
    }

    pub async fn completed(&self) -> Result<Vec<Payment>, PaymentError> {
        self.list_by_status(PaymentStatus::Completed).await
    }

    /// Sum of COMPLETED payments
    pub async fn total_revenue(&self) -> Result<Money, PaymentError> {
        let completed = self.completed().await?;
        Ok(Money::sum(self.currency, completed.iter().map(|p| &p.amount))?)
    }

    /// Sum of PENDING payments
    pub async fn pending_amount(&self) -> Result<Money, PaymentError> {
        let pending = self.pending().await?;
        Ok(Money::sum(self.currency, pending.iter().map(|p| &p.amount))?)
    }

    pub async fn count(&self) -> Result<usize, PaymentError> {
        Ok(self.list().await?.len())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn load(&self, id: PaymentId) -> Result<Payment, PaymentError> {
        self.port
            .get_payment(id)
            .await
            .map_err(|e| PaymentError::from_lookup(id, e))
    }

    /// A COMPLETED payment for the booking other than `except`
    async fn completed_for(
        &self,
        booking_id: BookingId,
        except: Option<PaymentId>,
    ) -> Result<Option<Payment>, PaymentError> {
        Ok(self
            .port
            .find_by_booking(booking_id)
            .await?
            .into_iter()
            .find(|p| p.status == PaymentStatus::Completed && Some(p.id) != except))
    }

    /// Confirms the booking unless an earlier attempt already did
    async fn confirm_booking(&self, booking_id: BookingId) -> Result<(), BookingError> {
        let booking = self.bookings.get(booking_id).await?;
        if booking.status != BookingStatus::Confirmed {
            self.bookings.confirm(booking_id).await?;
        }
        Ok(())
    }

    /// Cancels the booking unless it is already cancelled
    async fn cancel_booking(&self, booking_id: BookingId) -> Result<(), BookingError> {
        let booking = self.bookings.get(booking_id).await?;
        if booking.status != BookingStatus::Cancelled {
            self.bookings.cancel(booking_id).await?;
        }
        Ok(())
    }
}

fn parse_method(raw: &str) -> Result<PaymentMethod, ValidationError> {
    let raw = validation::non_blank("method", raw)?;
    raw.parse()
        .map_err(|e: String| ValidationError::new("method", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockPaymentPort;
    use crate::ports::PaymentRecords;
    use chrono::{NaiveDate, Utc};
    use core_kernel::{Classify, ErrorKind, FixedClock, TourId, UserId};
    use domain_booking::{Booking, BookingRequest, MockBookingPort};
    use domain_catalog::{BookableResource, CatalogPort, InventoryLedger, MockCatalogPort, ResourceRef, Tour};
    use domain_user::{MockUserPort, User, UserRole};
    use rust_decimal_macros::dec;

    struct Fixture {
        service: PaymentService,
        payments: Arc<MockPaymentPort>,
        booking_port: Arc<MockBookingPort>,
        bookings: Arc<BookingService>,
        catalog: Arc<MockCatalogPort>,
        clock: Arc<FixedClock>,
        user_id: UserId,
        tour: ResourceRef,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    async fn fixture() -> Fixture {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: "Sana".to_string(),
            email: "sana@example.com".to_string(),
            phone: None,
            address: None,
            role: UserRole::Customer,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        let tour = Tour {
            id: TourId::new(),
            name: "Fairy Meadows Trek".to_string(),
            description: None,
            location_id: None,
            duration_days: 4,
            price: Money::new(dec!(150), Currency::USD),
            capacity: 10,
            available: 10,
            start_date: today() + chrono::Duration::days(14),
            end_date: today() + chrono::Duration::days(18),
            guide: None,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        let tour_ref = ResourceRef::Tour(tour.id);

        let fixed = Arc::new(FixedClock::at_date(today()));
        let clock: Arc<dyn Clock> = fixed.clone();
        let catalog = Arc::new(MockCatalogPort::with_resources(vec![BookableResource::Tour(tour)]).await);
        let users = Arc::new(MockUserPort::with_users(vec![user.clone()]).await);
        let ledger = Arc::new(InventoryLedger::new(catalog.clone(), clock.clone()));
        let booking_port = Arc::new(MockBookingPort::new());
        let payments = Arc::new(MockPaymentPort::new());
        let bookings = Arc::new(BookingService::new(
            booking_port.clone(),
            users,
            ledger,
            Arc::new(PaymentRecords::new(payments.clone())),
            clock.clone(),
            Currency::USD,
        ));

        Fixture {
            service: PaymentService::new(payments.clone(), bookings.clone(), clock, Currency::USD),
            payments,
            booking_port,
            bookings,
            catalog,
            clock: fixed,
            user_id: user.id,
            tour: tour_ref,
        }
    }

    impl Fixture {
        async fn book(&self, quantity: i64) -> Booking {
            self.bookings
                .create(BookingRequest {
                    user_id: self.user_id,
                    resource: self.tour,
                    quantity,
                    special_requests: None,
                })
                .await
                .unwrap()
        }

        fn request(&self, booking: &Booking, method: &str) -> PaymentRequest {
            PaymentRequest {
                booking_id: booking.id,
                amount: booking.total_amount,
                method: method.to_string(),
            }
        }

        async fn available(&self) -> u32 {
            self.catalog.get_resource(self.tour).await.unwrap().available()
        }

        async fn booking_status(&self, id: BookingId) -> BookingStatus {
            self.bookings.get(id).await.unwrap().status
        }
    }

    #[tokio::test]
    async fn test_process_confirms_booking_and_refund_cancels_it() {
        let f = fixture().await;
        let booking = f.book(2).await;

        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.transaction_id.starts_with("TXN-"));

        let processed = f.service.process(payment.id).await.unwrap();
        assert_eq!(processed.status, PaymentStatus::Completed);
        assert!(processed.completed_at.is_some());
        assert_eq!(f.booking_status(booking.id).await, BookingStatus::Confirmed);
        assert_eq!(f.available().await, 8);

        let refunded = f.service.refund(payment.id).await.unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
        assert_eq!(f.booking_status(booking.id).await, BookingStatus::Cancelled);
        assert_eq!(f.available().await, 10);
    }

    #[tokio::test]
    async fn test_process_against_cancelled_booking_fails_payment() {
        let f = fixture().await;
        let booking = f.book(3).await;
        let payment = f.service.create(f.request(&booking, "PAYPAL")).await.unwrap();
        f.bookings.cancel(booking.id).await.unwrap();

        let err = f.service.process(payment.id).await.unwrap_err();
        assert!(matches!(err, PaymentError::SettlementFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let stored = f.service.get(payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);
        assert!(stored.failure_reason.is_some());
        assert_eq!(f.booking_status(booking.id).await, BookingStatus::Cancelled);

        let err = f.service.process(payment.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unprocessable);
    }

    #[tokio::test]
    async fn test_process_twice_is_already_processed() {
        let f = fixture().await;
        let booking = f.book(1).await;
        let payment = f.service.create(f.request(&booking, "CASH")).await.unwrap();
        f.service.process(payment.id).await.unwrap();

        let err = f.service.process(payment.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyProcessed);
    }

    #[tokio::test]
    async fn test_create_rejects_cancelled_booking() {
        let f = fixture().await;
        let booking = f.book(1).await;
        f.bookings.cancel(booking.id).await.unwrap();

        let err = f.service.create(f.request(&booking, "CARD")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaymentNotAllowed);
        assert_eq!(f.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_second_payment_after_completion_is_rejected() {
        let f = fixture().await;
        let booking = f.book(1).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();
        f.service.process(payment.id).await.unwrap();

        let err = f.service.create(f.request(&booking, "WALLET")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaymentAlreadyExists);
    }

    #[tokio::test]
    async fn test_only_one_of_two_pending_payments_settles() {
        let f = fixture().await;
        let booking = f.book(1).await;
        let first = f.service.create(f.request(&booking, "CARD")).await.unwrap();
        let second = f.service.create(f.request(&booking, "CASH")).await.unwrap();

        f.service.process(first.id).await.unwrap();
        let err = f.service.process(second.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaymentAlreadyExists);
        assert_eq!(f.service.get(second.id).await.unwrap().status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_validates_amount_and_method() {
        let f = fixture().await;
        let booking = f.book(1).await;

        let mut zero = f.request(&booking, "CARD");
        zero.amount = Money::zero(Currency::USD);
        let err = f.service.create(zero).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        for method in ["", "  ", "cheque"] {
            let err = f.service.create(f.request(&booking, method)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[tokio::test]
    async fn test_create_requires_existing_booking() {
        let f = fixture().await;
        let request = PaymentRequest {
            booking_id: BookingId::new(),
            amount: Money::new(dec!(10), Currency::USD),
            method: "CARD".to_string(),
        };

        let err = f.service.create(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_refund_requires_completed_payment() {
        let f = fixture().await;
        let booking = f.book(1).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();

        let err = f.service.refund(payment.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RefundNotAllowed);
        assert_eq!(f.booking_status(booking.id).await, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_completed_payment_cannot_be_changed() {
        let f = fixture().await;
        let booking = f.book(1).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();
        f.service.process(payment.id).await.unwrap();

        let update = PaymentUpdate {
            amount: Money::new(dec!(1), Currency::USD),
            method: "CASH".to_string(),
        };
        let err = f.service.update(payment.id, update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpdateNotAllowed);

        let err = f.service.delete(payment.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeletionNotAllowed);

        let err = f.service.mark_failed(payment.id, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpdateNotAllowed);
    }

    #[tokio::test]
    async fn test_update_and_delete_pending_payment() {
        let f = fixture().await;
        let booking = f.book(1).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();

        let updated = f
            .service
            .update(
                payment.id,
                PaymentUpdate {
                    amount: Money::new(dec!(120), Currency::USD),
                    method: "bank transfer".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.method, PaymentMethod::BankTransfer);
        assert_eq!(updated.amount.amount(), dec!(120));

        f.service.delete(payment.id).await.unwrap();
        assert_eq!(f.service.get(payment.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_mark_failed_uses_default_reason() {
        let f = fixture().await;
        let booking = f.book(1).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();

        let failed = f.service.mark_failed(payment.id, Some("   ".into())).await.unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some(DEFAULT_FAILURE_REASON));
    }

    #[tokio::test]
    async fn test_payment_write_failure_after_confirm_is_retryable() {
        let f = fixture().await;
        let booking = f.book(2).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();

        f.payments.fail_next_save();
        let err = f.service.process(payment.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(f.service.get(payment.id).await.unwrap().status, PaymentStatus::Pending);
        assert_eq!(f.booking_status(booking.id).await, BookingStatus::Confirmed);

        let processed = f.service.process(payment.id).await.unwrap();
        assert_eq!(processed.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_booking_write_failure_during_settlement_fails_payment() {
        let f = fixture().await;
        let booking = f.book(2).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();

        f.booking_port.fail_next_save();
        let err = f.service.process(payment.id).await.unwrap_err();
        assert!(matches!(err, PaymentError::SettlementFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::Unavailable);

        let stored = f.service.get(payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);
        assert!(stored.failure_reason.is_some());
        assert_eq!(f.booking_status(booking.id).await, BookingStatus::Pending);
        assert_eq!(f.available().await, 8);

        // A fresh payment settles the still-pending booking
        let retry = f.service.create(f.request(&booking, "CARD")).await.unwrap();
        assert_eq!(f.service.process(retry.id).await.unwrap().status, PaymentStatus::Completed);
        assert_eq!(f.booking_status(booking.id).await, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_booking_with_settled_payment_cannot_be_deleted() {
        let f = fixture().await;
        let booking = f.book(2).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();
        f.service.process(payment.id).await.unwrap();
        f.bookings.cancel(booking.id).await.unwrap();

        let err = f.bookings.delete(booking.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeletionNotAllowed);
        assert_eq!(f.service.get(payment.id).await.unwrap().status, PaymentStatus::Completed);
        assert!(f.bookings.get(booking.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_refund_restores_payment_when_cancel_fails() {
        let f = fixture().await;
        let booking = f.book(2).await;
        let payment = f.service.create(f.request(&booking, "CARD")).await.unwrap();
        f.service.process(payment.id).await.unwrap();

        f.booking_port.fail_next_save();
        let err = f.service.refund(payment.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);

        assert_eq!(f.service.get(payment.id).await.unwrap().status, PaymentStatus::Completed);
        assert_eq!(f.booking_status(booking.id).await, BookingStatus::Confirmed);
        assert_eq!(f.available().await, 8);
    }

    #[tokio::test]
    async fn test_revenue_and_pending_amount() {
        let f = fixture().await;
        let settled = f.book(2).await;
        let open = f.book(1).await;

        let paid = f.service.create(f.request(&settled, "CARD")).await.unwrap();
        f.service.process(paid.id).await.unwrap();
        f.service.create(f.request(&open, "CASH")).await.unwrap();

        assert_eq!(f.service.total_revenue().await.unwrap().amount(), dec!(300));
        assert_eq!(f.service.pending_amount().await.unwrap().amount(), dec!(150));
        assert_eq!(f.service.completed().await.unwrap().len(), 1);
        assert_eq!(f.service.list_by_method(PaymentMethod::Cash).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_booking_returns_latest() {
        let f = fixture().await;
        let booking = f.book(1).await;

        let err = f.service.get_by_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, PaymentError::NoPaymentForBooking(_)));

        f.service.create(f.request(&booking, "CARD")).await.unwrap();
        f.clock.advance(chrono::Duration::minutes(5));
        let latest = f.service.create(f.request(&booking, "CASH")).await.unwrap();
        assert_eq!(f.service.get_by_booking(booking.id).await.unwrap().id, latest.id);

        let err = f.service.get_by_booking(BookingId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

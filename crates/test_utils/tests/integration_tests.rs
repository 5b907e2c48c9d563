//! Integration Tests for the travel booking core
//!
//! These tests verify cross-domain workflows that involve the catalog,
//! booking and payment services working together over shared inventory.

use chrono::Duration;
use core_kernel::ErrorKind;
use domain_booking::{BookingStatus, BookingUpdate};
use domain_catalog::ResourceRef;
use domain_payment::PaymentStatus;
use test_utils::*;

mod booking_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_create_then_confirm_keeps_units_reserved() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;

        let booking = world.book(&user, tour.id, 4).await.unwrap();
        assert_booking_status(&booking, BookingStatus::Pending);
        assert_eq!(world.available(tour.id).await, 6);

        let confirmed = world.bookings.confirm(booking.id).await.unwrap();
        assert_booking_status(&confirmed, BookingStatus::Confirmed);
        assert_eq!(world.available(tour.id).await, 6);
    }

    #[tokio::test]
    async fn test_overbooking_leaves_inventory_untouched() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;
        world.book(&user, tour.id, 4).await.unwrap();

        let result = world.book(&user, tour.id, 8).await;
        assert_error_kind(&result, ErrorKind::InsufficientCapacity);
        assert_eq!(world.available(tour.id).await, 6);
        assert_eq!(world.bookings.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cancel_releases_exactly_once() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;
        let booking = world.book(&user, tour.id, 4).await.unwrap();

        let cancelled = world.bookings.cancel(booking.id).await.unwrap();
        assert_booking_status(&cancelled, BookingStatus::Cancelled);
        assert_eq!(world.available(tour.id).await, 10);

        let again = world.bookings.cancel(booking.id).await;
        assert_error_kind(&again, ErrorKind::InvalidTransition);
        assert_eq!(world.available(tour.id).await, 10);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected_before_inventory() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let lodge = world.lodge(5).await;
        let booking = world.book(&user, lodge.id, 2).await.unwrap();

        for quantity in [0, -3] {
            let result = world
                .bookings
                .update(
                    booking.id,
                    BookingUpdate {
                        quantity,
                        special_requests: None,
                    },
                )
                .await;
            assert_error_kind(&result, ErrorKind::InvalidInput);
        }
        assert_eq!(world.available(lodge.id).await, 3);
    }

    #[tokio::test]
    async fn test_delete_pending_returns_units_but_confirmed_is_refused() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let transport = world.transport(40).await;

        let pending = world.book(&user, transport.id, 5).await.unwrap();
        world.bookings.delete(pending.id).await.unwrap();
        assert_eq!(world.available(transport.id).await, 40);

        let confirmed = world.book(&user, transport.id, 5).await.unwrap();
        world.bookings.confirm(confirmed.id).await.unwrap();
        let result = world.bookings.delete(confirmed.id).await;
        assert_error_kind(&result, ErrorKind::DeletionNotAllowed);
        assert_eq!(world.available(transport.id).await, 35);
    }

    #[tokio::test]
    async fn test_failed_booking_write_releases_reservation() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;

        world.booking_port.fail_next_save();
        let result = world.book(&user, tour.id, 3).await;
        assert_error_kind(&result, ErrorKind::Unavailable);
        assert_eq!(world.available(tour.id).await, 10);
    }

    #[tokio::test]
    async fn test_resource_with_live_bookings_cannot_be_deleted() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;
        let booking = world.book(&user, tour.id, 4).await.unwrap();

        let result = world.catalog.delete_resource(tour.id.into()).await;
        assert_error_kind(&result, ErrorKind::DeletionNotAllowed);

        world.bookings.confirm(booking.id).await.unwrap();
        let result = world.catalog.delete_resource(tour.id.into()).await;
        assert_error_kind(&result, ErrorKind::DeletionNotAllowed);

        // The booking stays serviceable and returns its units
        world.bookings.cancel(booking.id).await.unwrap();
        assert_eq!(world.available(tour.id).await, 10);

        world.catalog.delete_resource(tour.id.into()).await.unwrap();
        world.bookings.delete(booking.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_user_bookings_are_listed_oldest_first() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let lodge = world.lodge(10).await;

        let mut created = Vec::new();
        for _ in 0..3 {
            created.push(world.book(&user, lodge.id, 1).await.unwrap().id);
            world.clock.advance(Duration::minutes(5));
        }

        let listed: Vec<_> = world
            .bookings
            .list_by_user(user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(listed, created);
    }
}

mod expiry_policy {
    use super::*;

    #[tokio::test]
    async fn test_departed_tour_cannot_be_booked() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;

        world.clock.advance(Duration::days(31));

        let result = world.book(&user, tour.id, 1).await;
        assert_error_kind(&result, ErrorKind::Expired);
        assert!(!world.ledger.is_available(ResourceRef::Tour(tour.id), 1).await.unwrap());
    }

    /// Lodges and transports have no departure date and never expire
    #[tokio::test]
    async fn test_lodges_and_transports_do_not_expire() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let lodge = world.lodge(5).await;
        let transport = world.transport(5).await;

        world.clock.advance(Duration::days(365));

        assert!(world.book(&user, lodge.id, 1).await.is_ok());
        assert!(world.book(&user, transport.id, 1).await.is_ok());
    }
}

mod payment_settlement {
    use super::*;

    #[tokio::test]
    async fn test_process_confirms_booking_and_rejects_second_attempt() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;
        let booking = world.book(&user, tour.id, 4).await.unwrap();

        let payment = world.pay(&booking).await.unwrap();
        let processed = world.payments.process(payment.id).await.unwrap();
        assert_payment_status(&processed, PaymentStatus::Completed);
        assert_booking_status(
            &world.bookings.get(booking.id).await.unwrap(),
            BookingStatus::Confirmed,
        );

        let again = world.payments.process(payment.id).await;
        assert_error_kind(&again, ErrorKind::AlreadyProcessed);
    }

    #[tokio::test]
    async fn test_refund_cancels_booking_and_releases_once() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;
        let booking = world.book(&user, tour.id, 4).await.unwrap();
        let payment = world.pay(&booking).await.unwrap();
        world.payments.process(payment.id).await.unwrap();
        assert_eq!(world.available(tour.id).await, 6);

        let refunded = world.payments.refund(payment.id).await.unwrap();
        assert_payment_status(&refunded, PaymentStatus::Refunded);
        assert_booking_status(
            &world.bookings.get(booking.id).await.unwrap(),
            BookingStatus::Cancelled,
        );
        assert_eq!(world.available(tour.id).await, 10);

        let again = world.payments.refund(payment.id).await;
        assert_error_kind(&again, ErrorKind::RefundNotAllowed);
        assert_eq!(world.available(tour.id).await, 10);
    }

    #[tokio::test]
    async fn test_settlement_against_cancelled_booking_fails_the_payment() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let lodge = world.lodge(8).await;
        let booking = world.book(&user, lodge.id, 2).await.unwrap();
        let payment = world.pay(&booking).await.unwrap();

        world.bookings.cancel(booking.id).await.unwrap();

        let result = world.payments.process(payment.id).await;
        assert_error_kind(&result, ErrorKind::InvalidTransition);

        let stored = world.payments.get(payment.id).await.unwrap();
        assert_payment_status(&stored, PaymentStatus::Failed);
        assert_error_kind(&world.payments.process(payment.id).await, ErrorKind::Unprocessable);
    }

    #[tokio::test]
    async fn test_no_payment_for_cancelled_booking() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;
        let booking = world.book(&user, tour.id, 1).await.unwrap();
        world.bookings.cancel(booking.id).await.unwrap();

        assert_error_kind(&world.pay(&booking).await, ErrorKind::PaymentNotAllowed);
    }

    #[tokio::test]
    async fn test_revenue_counts_completed_payments_only() {
        let world = TestWorld::new();
        let user = world.customer().await;
        let tour = world.tour(10).await;

        let paid = world.book(&user, tour.id, 2).await.unwrap();
        let payment = world.pay(&paid).await.unwrap();
        world.payments.process(payment.id).await.unwrap();

        let unpaid = world.book(&user, tour.id, 1).await.unwrap();
        world.pay(&unpaid).await.unwrap();

        assert_eq!(world.payments.total_revenue().await.unwrap(), paid.total_amount);
        assert_eq!(world.payments.pending_amount().await.unwrap(), unpaid.total_amount);
        assert_money_positive(&world.bookings.total_revenue().await.unwrap());
    }
}

mod concurrency {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_reservations_never_oversell() {
        let world = Arc::new(TestWorld::new());
        let tour = world.tour(10).await;

        let mut handles = Vec::new();
        for _ in 0..25 {
            let world = world.clone();
            let user = world.customer().await;
            handles.push(tokio::spawn(async move {
                world.book(&user, tour.id, 1).await.is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(world.available(tour.id).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_racing_bookings_never_strands_a_booking() {
        let world = Arc::new(TestWorld::new());
        let lodge = world.lodge(20).await;
        let resource = ResourceRef::Lodge(lodge.id);

        let mut bookers = Vec::new();
        for _ in 0..10 {
            let world = world.clone();
            let user = world.customer().await;
            bookers.push(tokio::spawn(async move { world.book(&user, lodge.id, 1).await }));
        }
        let deleter = {
            let world = world.clone();
            tokio::spawn(async move { world.catalog.delete_resource(resource).await.is_ok() })
        };

        let mut booked = Vec::new();
        for handle in bookers {
            if let Ok(booking) = handle.await.unwrap() {
                booked.push(booking);
            }
        }
        let deleted = deleter.await.unwrap();

        // Either the lodge was removed before any booking landed, or every
        // booking still finds it and can be cancelled
        if deleted {
            assert!(booked.is_empty());
        } else {
            for booking in booked {
                world.bookings.cancel(booking.id).await.unwrap();
            }
            assert_eq!(world.available(lodge.id).await, 20);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_cancels_release_once() {
        let world = Arc::new(TestWorld::new());
        let user = world.customer().await;
        let tour = world.tour(10).await;
        let booking_id = world.book(&user, tour.id, 4).await.unwrap().id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let world = world.clone();
                tokio::spawn(async move { world.bookings.cancel(booking_id).await.is_ok() })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(world.available(tour.id).await, 10);
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn run_ops(capacity: i64, ops: Vec<BookingOp>) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let world = TestWorld::new();
            let user = world.customer().await;
            let tour = world.tour(capacity).await;
            let mut ids = Vec::new();

            for op in ops {
                match op {
                    BookingOp::Book(quantity) => {
                        if let Ok(booking) = world.book(&user, tour.id, quantity).await {
                            ids.push(booking.id);
                        }
                    }
                    BookingOp::Confirm(i) if !ids.is_empty() => {
                        let _ = world.bookings.confirm(ids[i % ids.len()]).await;
                    }
                    BookingOp::Cancel(i) if !ids.is_empty() => {
                        let _ = world.bookings.cancel(ids[i % ids.len()]).await;
                    }
                    BookingOp::Resize(i, quantity) if !ids.is_empty() => {
                        let _ = world
                            .bookings
                            .update(
                                ids[i % ids.len()],
                                BookingUpdate {
                                    quantity,
                                    special_requests: None,
                                },
                            )
                            .await;
                    }
                    _ => {}
                }

                let resource = world.ledger.get(ResourceRef::Tour(tour.id)).await.unwrap();
                assert!(resource.available() <= resource.capacity());
                let bookings = world.bookings.list().await.unwrap();
                assert_inventory_balanced(&resource, &bookings);
            }
        });
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn inventory_stays_balanced(capacity in capacity_strategy(), ops in booking_ops_strategy()) {
            run_ops(capacity, ops);
        }

        #[test]
        fn reserve_then_release_restores_available(
            capacity in capacity_strategy(),
            quantity in quantity_strategy()
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let world = TestWorld::new();
                let tour = world.tour(capacity).await;
                let resource = ResourceRef::Tour(tour.id);
                let before = world.available(tour.id).await;

                if world.ledger.reserve(resource, quantity).await.is_ok() {
                    world.ledger.release(resource, quantity).await.unwrap();
                }
                assert_eq!(world.available(tour.id).await, before);
            });
        }
    }
}

//! A complete in-memory deployment for scenario tests
//!
//! [`TestWorld`] wires every service the way the API server does, but over
//! the mock ports and a [`FixedClock`]. Tests keep handles to the ports so
//! they can inject storage failures or inspect raw state.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{Clock, Currency, FixedClock};
use domain_booking::{Booking, BookingError, BookingRequest, BookingService, LiveBookings, MockBookingPort};
use domain_catalog::{
    CatalogService, InventoryLedger, Lodge, MockCatalogPort, ResourceRef, Tour, Transport,
};
use domain_payment::{MockPaymentPort, Payment, PaymentError, PaymentRecords, PaymentRequest, PaymentService};
use domain_user::{MockUserPort, User, UserService};

use crate::builders::{LodgeBuilder, TourBuilder, TransportBuilder, UserBuilder};
use crate::fixtures::TemporalFixtures;

pub struct TestWorld {
    pub clock: Arc<FixedClock>,
    pub user_port: Arc<MockUserPort>,
    pub catalog_port: Arc<MockCatalogPort>,
    pub booking_port: Arc<MockBookingPort>,
    pub payment_port: Arc<MockPaymentPort>,
    pub users: Arc<UserService>,
    pub ledger: Arc<InventoryLedger>,
    pub catalog: Arc<CatalogService>,
    pub bookings: Arc<BookingService>,
    pub payments: Arc<PaymentService>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// A world whose clock reads [`TemporalFixtures::today`]
    pub fn new() -> Self {
        Self::at(TemporalFixtures::today())
    }

    pub fn at(today: NaiveDate) -> Self {
        let fixed = Arc::new(FixedClock::at_date(today));
        let clock: Arc<dyn Clock> = fixed.clone();
        let currency = Currency::USD;

        let user_port = Arc::new(MockUserPort::new());
        let catalog_port = Arc::new(MockCatalogPort::new());
        let booking_port = Arc::new(MockBookingPort::new());
        let payment_port = Arc::new(MockPaymentPort::new());

        let users = Arc::new(UserService::new(user_port.clone(), clock.clone()));
        let ledger = Arc::new(InventoryLedger::new(catalog_port.clone(), clock.clone()));
        let catalog = Arc::new(CatalogService::new(
            catalog_port.clone(),
            ledger.clone(),
            Arc::new(LiveBookings::new(booking_port.clone())),
            clock.clone(),
            currency,
        ));
        let bookings = Arc::new(BookingService::new(
            booking_port.clone(),
            user_port.clone(),
            ledger.clone(),
            Arc::new(PaymentRecords::new(payment_port.clone())),
            clock.clone(),
            currency,
        ));
        let payments = Arc::new(PaymentService::new(
            payment_port.clone(),
            bookings.clone(),
            clock,
            currency,
        ));

        Self {
            clock: fixed,
            user_port,
            catalog_port,
            booking_port,
            payment_port,
            users,
            ledger,
            catalog,
            bookings,
            payments,
        }
    }

    /// Registers a customer with a unique email
    pub async fn customer(&self) -> User {
        self.users
            .register(UserBuilder::new().build())
            .await
            .expect("register customer")
    }

    /// Creates a tour departing on [`TemporalFixtures::tour_start`]
    pub async fn tour(&self, capacity: i64) -> Tour {
        self.catalog
            .create_tour(TourBuilder::new().capacity(capacity).build())
            .await
            .expect("create tour")
    }

    pub async fn lodge(&self, rooms: i64) -> Lodge {
        self.catalog
            .create_lodge(LodgeBuilder::new().rooms(rooms).build())
            .await
            .expect("create lodge")
    }

    pub async fn transport(&self, seats: i64) -> Transport {
        self.catalog
            .create_transport(TransportBuilder::new().seats(seats).build())
            .await
            .expect("create transport")
    }

    pub async fn book(
        &self,
        user: &User,
        resource: impl Into<ResourceRef>,
        quantity: i64,
    ) -> Result<Booking, BookingError> {
        self.bookings
            .create(BookingRequest {
                user_id: user.id,
                resource: resource.into(),
                quantity,
                special_requests: None,
            })
            .await
    }

    /// Records a card payment for the booking's full total
    pub async fn pay(&self, booking: &Booking) -> Result<Payment, PaymentError> {
        self.payments
            .create(PaymentRequest {
                booking_id: booking.id,
                amount: booking.total_amount,
                method: "CARD".to_string(),
            })
            .await
    }

    /// Remaining units of a resource
    pub async fn available(&self, resource: impl Into<ResourceRef>) -> u32 {
        self.ledger
            .get(resource.into())
            .await
            .expect("load resource")
            .available()
    }
}

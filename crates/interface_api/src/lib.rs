//! HTTP API Layer
//!
//! This crate provides the REST API for the travel booking backend using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for each domain
//! - **Middleware**: Authentication, tracing, audit logging
//! - **DTOs**: Request bodies and query strings, validated before they reach a service
//! - **Error Handling**: Every domain error maps to a status through its `ErrorKind`
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState, Ports};
//!
//! let state = AppState::new(ports, Arc::new(SystemClock), config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{Clock, Currency, MoneyError};
use domain_booking::{BookingPort, BookingService, LiveBookings};
use domain_catalog::{CatalogPort, CatalogService, InventoryLedger};
use domain_payment::{PaymentPort, PaymentRecords, PaymentService};
use domain_user::{UserPort, UserService};

use crate::config::ApiConfig;
use crate::handlers::{bookings, health, inventory, locations, lodges, payments, tours, transports, users};
use crate::middleware::{audit_middleware, auth_middleware};

/// Storage adapters backing the services
#[derive(Clone)]
pub struct Ports {
    pub users: Arc<dyn UserPort>,
    pub catalog: Arc<dyn CatalogPort>,
    pub bookings: Arc<dyn BookingPort>,
    pub payments: Arc<dyn PaymentPort>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ports: Ports,
    pub users: Arc<UserService>,
    pub catalog: Arc<CatalogService>,
    pub ledger: Arc<InventoryLedger>,
    pub bookings: Arc<BookingService>,
    pub payments: Arc<PaymentService>,
    /// Currency applied to prices and amounts submitted without one
    pub currency: Currency,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services over `ports`. One ledger is shared by the catalog
    /// and booking services so both take the same per-resource locks.
    pub fn new(ports: Ports, clock: Arc<dyn Clock>, config: ApiConfig) -> Result<Self, MoneyError> {
        let currency = config.currency()?;

        let ledger = Arc::new(InventoryLedger::new(ports.catalog.clone(), clock.clone()));
        let users = Arc::new(UserService::new(ports.users.clone(), clock.clone()));
        let catalog = Arc::new(CatalogService::new(
            ports.catalog.clone(),
            ledger.clone(),
            Arc::new(LiveBookings::new(ports.bookings.clone())),
            clock.clone(),
            currency,
        ));
        let bookings = Arc::new(BookingService::new(
            ports.bookings.clone(),
            ports.users.clone(),
            ledger.clone(),
            Arc::new(PaymentRecords::new(ports.payments.clone())),
            clock.clone(),
            currency,
        ));
        let payments = Arc::new(PaymentService::new(
            ports.payments.clone(),
            bookings.clone(),
            clock,
            currency,
        ));

        Ok(Self {
            ports,
            users,
            catalog,
            ledger,
            bookings,
            payments,
            currency,
            config,
        })
    }
}

/// Creates the main API router
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let user_routes = Router::new()
        .route("/", post(users::register_user).get(users::list_users))
        .route("/me", get(users::get_me))
        .route(
            "/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        );

    let location_routes = Router::new()
        .route("/", post(locations::create_location).get(locations::list_locations))
        .route(
            "/:id",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        .route("/:id/average-lodge-price", get(locations::average_lodge_price));

    let tour_routes = Router::new()
        .route("/", post(tours::create_tour).get(tours::search_tours))
        .route(
            "/:id",
            get(tours::get_tour).put(tours::update_tour).delete(tours::delete_tour),
        );

    let lodge_routes = Router::new()
        .route("/", post(lodges::create_lodge).get(lodges::search_lodges))
        .route("/top-rated", get(lodges::top_rated_lodges))
        .route(
            "/:id",
            get(lodges::get_lodge).put(lodges::update_lodge).delete(lodges::delete_lodge),
        );

    let transport_routes = Router::new()
        .route("/", post(transports::create_transport).get(transports::search_transports))
        .route(
            "/:id",
            get(transports::get_transport)
                .put(transports::update_transport)
                .delete(transports::delete_transport),
        );

    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking).get(bookings::list_bookings))
        .route("/me", get(bookings::my_bookings))
        .route("/revenue", get(bookings::booking_revenue))
        .route(
            "/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/:id/confirm", post(bookings::confirm_booking))
        .route("/:id/cancel", post(bookings::cancel_booking));

    let payment_routes = Router::new()
        .route("/", post(payments::create_payment).get(payments::list_payments))
        .route("/summary", get(payments::payment_summary))
        .route("/booking/:booking_id", get(payments::payments_for_booking))
        .route(
            "/:id",
            get(payments::get_payment)
                .put(payments::update_payment)
                .delete(payments::delete_payment),
        )
        .route("/:id/process", post(payments::process_payment))
        .route("/:id/refund", post(payments::refund_payment))
        .route("/:id/fail", post(payments::fail_payment));

    let inventory_routes = Router::new()
        .route("/:kind/:id/availability", get(inventory::availability));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/locations", location_routes)
        .nest("/tours", tour_routes)
        .nest("/lodges", lodge_routes)
        .nest("/transports", transport_routes)
        .nest("/bookings", booking_routes)
        .nest("/payments", payment_routes)
        .nest("/inventory", inventory_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

//! Booking DTOs

use serde::Deserialize;
use validator::Validate;

use core_kernel::UserId;
use domain_booking::BookingUpdate;
use domain_catalog::ResourceRef;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    /// Admins may book on behalf of a user; everyone else books for themselves
    pub user_id: Option<UserId>,
    /// `{"kind": "TOUR", "id": "..."}`
    pub resource: ResourceRef,
    pub quantity: i64,
    #[validate(length(max = 1000))]
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookingRequest {
    pub quantity: i64,
    #[validate(length(max = 1000))]
    pub special_requests: Option<String>,
}

impl From<UpdateBookingRequest> for BookingUpdate {
    fn from(req: UpdateBookingRequest) -> Self {
        BookingUpdate {
            quantity: req.quantity,
            special_requests: req.special_requests,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    pub status: Option<String>,
    pub user_id: Option<UserId>,
    pub resource_kind: Option<String>,
    pub resource_id: Option<uuid::Uuid>,
}

#[derive(Debug, serde::Serialize)]
pub struct BookingStats {
    /// Sum of CONFIRMED booking totals
    pub total_revenue: core_kernel::Money,
    pub count: usize,
}

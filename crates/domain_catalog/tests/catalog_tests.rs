//! Resource model and query filter tests

use chrono::{NaiveDate, Utc};
use core_kernel::{Classify, Currency, ErrorKind, LocationId, LodgeId, Money, TourId, TransportId};
use domain_catalog::{
    BookableResource, CatalogError, Lodge, ResourceKind, ResourceQuery, ResourceRef, Tour,
    Transport,
};
use rust_decimal_macros::dec;

fn tour(location_id: Option<LocationId>, start_date: NaiveDate, available: u32) -> BookableResource {
    Tour {
        id: TourId::new(),
        name: "Swat Valley Explorer".to_string(),
        description: Some("Five days in the Switzerland of the East".to_string()),
        location_id,
        duration_days: 5,
        price: Money::new(dec!(300), Currency::USD),
        capacity: 20,
        available,
        start_date,
        end_date: start_date + chrono::Duration::days(5),
        guide: Some("Imran".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        version: 1,
    }
    .into()
}

fn lodge(rating: Option<rust_decimal::Decimal>) -> BookableResource {
    Lodge {
        id: LodgeId::new(),
        name: "Shangrila Resort".to_string(),
        lodge_type: "RESORT".to_string(),
        address: None,
        contact_number: None,
        location_id: None,
        price_per_night: Money::new(dec!(180), Currency::USD),
        total_rooms: 40,
        available_rooms: 12,
        amenities: vec!["lake view".to_string()],
        rating,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        version: 1,
    }
    .into()
}

fn transport(from: LocationId, to: LocationId) -> BookableResource {
    Transport {
        id: TransportId::new(),
        transport_type: "BUS".to_string(),
        provider: "Faisal Movers".to_string(),
        vehicle_number: None,
        from_location_id: Some(from),
        to_location_id: Some(to),
        cost: Money::new(dec!(25), Currency::USD),
        capacity: 45,
        available_seats: 45,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        version: 1,
    }
    .into()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_query_kind_and_availability() {
    let sold_out = tour(None, date(2025, 7, 1), 0);
    assert!(ResourceQuery::of_kind(ResourceKind::Tour).matches(&sold_out));
    assert!(!ResourceQuery::of_kind(ResourceKind::Lodge).matches(&sold_out));
    assert!(!ResourceQuery::of_kind(ResourceKind::Tour).available().matches(&sold_out));
}

#[test]
fn test_query_transport_location_matches_either_end() {
    let (a, b) = (LocationId::new(), LocationId::new());
    let t = transport(a, b);
    assert!(ResourceQuery::default().at_location(a).matches(&t));
    assert!(ResourceQuery::default().at_location(b).matches(&t));
    assert!(!ResourceQuery::default().at_location(LocationId::new()).matches(&t));
}

#[test]
fn test_query_route_is_directional() {
    let (a, b) = (LocationId::new(), LocationId::new());
    let t = transport(a, b);
    let forward = ResourceQuery {
        from_location_id: Some(a),
        to_location_id: Some(b),
        ..Default::default()
    };
    let backward = ResourceQuery {
        from_location_id: Some(b),
        to_location_id: Some(a),
        ..Default::default()
    };
    assert!(forward.matches(&t));
    assert!(!backward.matches(&t));
}

#[test]
fn test_query_rating_excludes_unrated() {
    let query = ResourceQuery {
        min_rating: Some(dec!(4)),
        ..ResourceQuery::of_kind(ResourceKind::Lodge)
    };
    assert!(query.matches(&lodge(Some(dec!(4.2)))));
    assert!(!query.matches(&lodge(Some(dec!(3.9)))));
    assert!(!query.matches(&lodge(None)));
}

#[test]
fn test_query_price_and_name() {
    let t = tour(None, date(2025, 7, 1), 5);
    assert!(ResourceQuery::default().priced_between(dec!(300), dec!(300)).matches(&t));
    assert!(!ResourceQuery::default().priced_between(dec!(0), dec!(299.99)).matches(&t));
    assert!(ResourceQuery::default().named("SWAT").matches(&t));
}

#[test]
fn test_query_start_range() {
    let t = tour(None, date(2025, 7, 1), 5);
    let query = ResourceQuery {
        start_from: Some(date(2025, 6, 1)),
        start_to: Some(date(2025, 6, 30)),
        ..Default::default()
    };
    assert!(!query.matches(&t));
}

#[test]
fn test_unit_price_and_counters_per_kind() {
    let l = lodge(None);
    assert_eq!(l.capacity(), 40);
    assert_eq!(l.available(), 12);
    assert_eq!(l.unit_price().amount(), dec!(180));
    assert_eq!(l.name(), "Shangrila Resort");

    let t = transport(LocationId::new(), LocationId::new());
    assert_eq!(t.name(), "Faisal Movers");
}

#[test]
fn test_error_kinds() {
    let resource = ResourceRef::Tour(TourId::new());
    let insufficient = CatalogError::InsufficientCapacity {
        resource,
        requested: 8,
        available: 6,
    };
    assert_eq!(insufficient.kind(), ErrorKind::InsufficientCapacity);
    assert!(insufficient.to_string().contains("requested 8"));

    let expired = CatalogError::Expired {
        resource,
        start_date: date(2024, 1, 1),
    };
    assert_eq!(expired.kind(), ErrorKind::Expired);
    assert_eq!(CatalogError::ResourceNotFound(resource).kind(), ErrorKind::NotFound);
}

#[test]
fn test_bookable_resource_serde_is_tagged() {
    let value = serde_json::to_value(lodge(None)).unwrap();
    assert_eq!(value["kind"], "LODGE");
    assert_eq!(value["total_rooms"], 40);
}

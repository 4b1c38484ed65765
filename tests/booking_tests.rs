// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Booking/search service against a mock REST API.

use braidbook::db::LocalDb;
use braidbook::error::AppError;
use braidbook::models::{
    AppointmentLocation, AppointmentStatus, Coordinates, CreateBookingRequest, LocationResult,
    LocationSource, SearchFilters, SortBy,
};
use braidbook::services::{ApiClient, BookingService};
use chrono::NaiveDate;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::stylist_json;

fn service(server: &MockServer) -> BookingService {
    let api = ApiClient::new(&server.uri(), LocalDb::in_memory(), Duration::from_secs(5)).unwrap();
    BookingService::new(api)
}

fn appointment_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "customerId": "user-1",
        "stylistId": "s-1",
        "serviceId": "svc-1",
        "appointmentDate": "2026-11-02",
        "startTime": "10:00",
        "endTime": "14:00",
        "duration": 240,
        "status": status,
        "totalPrice": 220.0
    })
}

fn booking_request() -> CreateBookingRequest {
    CreateBookingRequest {
        stylist_id: "s-1".to_string(),
        service_id: "svc-1".to_string(),
        appointment_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        start_time: "10:00".to_string(),
        add_ons: vec!["addon-beads".to_string()],
        location: AppointmentLocation {
            address: "1 Main St, New York, NY".to_string(),
            coordinates: Some(Coordinates::new(40.72, -74.0)),
            location_type: Some("salon".to_string()),
        },
        contact_number: "5551234567".to_string(),
        special_requests: None,
    }
}

#[tokio::test]
async fn test_search_returns_all_stylists_in_server_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stylists/search"))
        .and(query_param("latitude", "40.71"))
        .and(query_param("longitude", "-74"))
        .and(query_param("radius", "10"))
        .and(query_param("sortBy", "distance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                stylist_json("s-1", "Crown Braids", 40.715, -74.002, 0.4),
                stylist_json("s-2", "Knotless by Nia", 40.73, -73.99, 1.6),
                stylist_json("s-3", "Harlem Twists", 40.81, -73.95, 7.3)
            ],
            "pagination": {"page": 1, "limit": 20, "total": 3, "totalPages": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filters = SearchFilters::near(40.71, -74.00, 10.0).sorted_by(SortBy::Distance);
    let response = service(&server).search_stylists(&filters).await.unwrap();

    let ids: Vec<&str> = response.data.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s-1", "s-2", "s-3"]);
    assert_eq!(response.data[2].distance, Some(7.3));
    assert_eq!(response.pagination.map(|p| p.total), Some(3));
}

#[tokio::test]
async fn test_invalid_filters_never_reach_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let filters = SearchFilters {
        min_price: Some(300.0),
        max_price: Some(100.0),
        ..Default::default()
    };
    let err = service(&server).search_stylists(&filters).await.unwrap_err();

    assert!(
        matches!(err, AppError::Validation(ref m) if m.contains("minimum price")),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_nearby_search_uses_location_and_distance_sort() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stylists/search"))
        .and(query_param("latitude", "40.7128"))
        .and(query_param("longitude", "-74.006"))
        .and(query_param("radius", "5"))
        .and(query_param("sortBy", "distance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let location = LocationResult {
        coordinates: Coordinates::new(40.7128, -74.006),
        address: None,
        timestamp: chrono::Utc::now(),
        source: LocationSource::Fallback,
    };
    let response = service(&server)
        .get_nearby_stylists(&location, 5.0)
        .await
        .unwrap();
    assert!(response.data.is_empty());
}

#[tokio::test]
async fn test_stylist_detail_services_and_slots() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stylists/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": stylist_json("s-1", "Crown Braids", 40.72, -74.0, 0.7)
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stylists/s-1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "svc-1",
                "stylistId": "s-1",
                "name": "Knotless Braids",
                "category": "braids",
                "price": 180.0,
                "duration": "4-5 hours",
                "durationMinutes": 270,
                "addOns": [{"id": "addon-beads", "name": "Beads", "price": 20.0}]
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stylists/s-1/availability"))
        .and(query_param("serviceId", "svc-1"))
        .and(query_param("date", "2026-11-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"startTime": "09:00", "endTime": "13:30", "isAvailable": false},
                {"startTime": "14:00", "endTime": "18:30", "isAvailable": true}
            ]
        })))
        .mount(&server)
        .await;

    let bookings = service(&server);

    let stylist = bookings.get_stylist("s-1").await.unwrap().into_data();
    assert_eq!(stylist.display_name(), "Crown Braids");

    let services = bookings.get_stylist_services("s-1").await.unwrap().into_data();
    assert_eq!(services.len(), 1);
    assert!(services[0].is_active);
    assert_eq!(services[0].add_ons[0].price, 20.0);

    let slots = bookings
        .get_available_slots("s-1", "svc-1", NaiveDate::from_ymd_opt(2026, 11, 2).unwrap())
        .await
        .unwrap()
        .into_data();
    let open: Vec<&str> = slots
        .iter()
        .filter(|s| s.is_available)
        .map(|s| s.start_time.as_str())
        .collect();
    assert_eq!(open, vec!["14:00"]);
}

#[tokio::test]
async fn test_create_booking_posts_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .and(body_json(json!({
            "stylistId": "s-1",
            "serviceId": "svc-1",
            "appointmentDate": "2026-11-02",
            "startTime": "10:00",
            "addOns": ["addon-beads"],
            "location": {
                "address": "1 Main St, New York, NY",
                "coordinates": {"latitude": 40.72, "longitude": -74.0},
                "locationType": "salon"
            },
            "contactNumber": "5551234567"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": appointment_json("apt-1", "pending"),
            "message": "Booking created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = service(&server).create_booking(&booking_request()).await.unwrap();
    assert_eq!(response.data.id, "apt-1");
    assert_eq!(response.data.status, AppointmentStatus::Pending);
    assert_eq!(response.message.as_deref(), Some("Booking created"));
}

#[tokio::test]
async fn test_slot_conflict_reported_by_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false,
            "message": "That time slot is no longer available"
        })))
        .mount(&server)
        .await;

    let err = service(&server)
        .create_booking(&booking_request())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.to_string(), "That time slot is no longer available");
}

#[tokio::test]
async fn test_my_bookings_status_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/my-bookings"))
        .and(query_param("status", "confirmed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [appointment_json("apt-2", "confirmed")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bookings = service(&server)
        .get_my_bookings(Some(AppointmentStatus::Confirmed))
        .await
        .unwrap()
        .into_data();
    assert_eq!(bookings.len(), 1);
    assert!(bookings[0].cancellation().is_none());
}

#[tokio::test]
async fn test_status_update_and_cancel() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/bookings/apt-1/status"))
        .and(body_json(json!({"status": "confirmed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": appointment_json("apt-1", "confirmed")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cancelled = appointment_json("apt-1", "cancelled");
    cancelled["cancellationReason"] = json!("Running late");
    cancelled["cancelledBy"] = json!("customer");
    Mock::given(method("PATCH"))
        .and(path("/bookings/apt-1/cancel"))
        .and(body_json(json!({"reason": "Running late"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": cancelled })))
        .expect(1)
        .mount(&server)
        .await;

    let bookings = service(&server);

    let updated = bookings
        .update_booking_status("apt-1", AppointmentStatus::Confirmed)
        .await
        .unwrap()
        .into_data();
    assert_eq!(updated.status, AppointmentStatus::Confirmed);

    let cancelled = bookings
        .cancel_booking("apt-1", Some("  Running late "))
        .await
        .unwrap()
        .into_data();
    let details = cancelled.cancellation().expect("cancelled");
    assert_eq!(details.reason, Some("Running late"));
}

#[tokio::test]
async fn test_get_booking_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Booking not found"})))
        .mount(&server)
        .await;

    let err = service(&server).get_booking("missing").await.unwrap_err();
    assert!(matches!(err, AppError::Api { status: 404, ref message } if message == "Booking not found"));
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Booking and search service.
//!
//! Thin typed layer over [`ApiClient`]. Ordering, paging, slot conflicts and
//! status transitions are all decided by the server.

use chrono::NaiveDate;
use serde::Serialize;
use validator::Validate;

use crate::error::Result;
use crate::models::{
    Appointment, AppointmentStatus, CreateBookingRequest, LocationResult, SearchFilters, Service,
    SortBy, Stylist, TimeSlot,
};
use crate::services::api::{ApiClient, ApiResponse};

#[derive(Serialize)]
struct StatusUpdate {
    status: AppointmentStatus,
}

#[derive(Serialize)]
struct CancelRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Clone)]
pub struct BookingService {
    api: ApiClient,
}

impl BookingService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    // ─── Stylists ────────────────────────────────────────────────────────────

    /// Search stylists. Results come back in server order.
    pub async fn search_stylists(&self, filters: &SearchFilters) -> Result<ApiResponse<Vec<Stylist>>> {
        filters.validate()?;
        let response: ApiResponse<Vec<Stylist>> = self
            .api
            .get_with_query("/stylists/search", &filters.to_query())
            .await?;
        tracing::debug!(count = response.data.len(), "Stylist search finished");
        Ok(response)
    }

    /// Distance-sorted search around a resolved location. `radius` is in miles.
    pub async fn get_nearby_stylists(
        &self,
        location: &LocationResult,
        radius: f64,
    ) -> Result<ApiResponse<Vec<Stylist>>> {
        let filters = SearchFilters::near(
            location.coordinates.latitude,
            location.coordinates.longitude,
            radius,
        )
        .sorted_by(SortBy::Distance);
        self.search_stylists(&filters).await
    }

    pub async fn get_stylist(&self, stylist_id: &str) -> Result<ApiResponse<Stylist>> {
        self.api
            .get(&format!("/stylists/{}", urlencoding::encode(stylist_id)))
            .await
    }

    pub async fn get_stylist_services(&self, stylist_id: &str) -> Result<ApiResponse<Vec<Service>>> {
        self.api
            .get(&format!("/stylists/{}/services", urlencoding::encode(stylist_id)))
            .await
    }

    /// Open slots for a service on a given day.
    pub async fn get_available_slots(
        &self,
        stylist_id: &str,
        service_id: &str,
        date: NaiveDate,
    ) -> Result<ApiResponse<Vec<TimeSlot>>> {
        let query = [
            ("serviceId", service_id.to_string()),
            ("date", date.format("%Y-%m-%d").to_string()),
        ];
        self.api
            .get_with_query(
                &format!("/stylists/{}/availability", urlencoding::encode(stylist_id)),
                &query,
            )
            .await
    }

    // ─── Bookings ────────────────────────────────────────────────────────────

    /// Create a booking. The server rejects conflicting slots.
    pub async fn create_booking(&self, request: &CreateBookingRequest) -> Result<ApiResponse<Appointment>> {
        request.validate()?;
        let response: ApiResponse<Appointment> = self.api.post("/bookings", request).await?;
        tracing::info!(
            appointment_id = %response.data.id,
            stylist_id = %request.stylist_id,
            date = %request.appointment_date,
            "Booking created"
        );
        Ok(response)
    }

    /// The signed-in user's bookings, optionally filtered by status.
    pub async fn get_my_bookings(
        &self,
        status: Option<AppointmentStatus>,
    ) -> Result<ApiResponse<Vec<Appointment>>> {
        let query: Vec<(&str, String)> = status
            .map(|s| vec![("status", s.as_str().to_string())])
            .unwrap_or_default();
        self.api.get_with_query("/bookings/my-bookings", &query).await
    }

    pub async fn get_booking(&self, booking_id: &str) -> Result<ApiResponse<Appointment>> {
        self.api
            .get(&format!("/bookings/{}", urlencoding::encode(booking_id)))
            .await
    }

    /// Request a status change. Whether the transition is allowed is up to the server.
    pub async fn update_booking_status(
        &self,
        booking_id: &str,
        status: AppointmentStatus,
    ) -> Result<ApiResponse<Appointment>> {
        let response = self
            .api
            .patch(
                &format!("/bookings/{}/status", urlencoding::encode(booking_id)),
                &StatusUpdate { status },
            )
            .await?;
        tracing::info!(booking_id, %status, "Booking status updated");
        Ok(response)
    }

    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        reason: Option<&str>,
    ) -> Result<ApiResponse<Appointment>> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let response = self
            .api
            .patch(
                &format!("/bookings/{}/cancel", urlencoding::encode(booking_id)),
                &CancelRequest { reason },
            )
            .await?;
        tracing::info!(booking_id, "Booking cancelled");
        Ok(response)
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment (booking) models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::location::Coordinates;
use super::stylist::AddOn;

/// Appointment lifecycle status.
///
/// Forward-only (`pending -> confirmed -> in-progress -> completed`), except
/// that any non-terminal status may become `cancelled` or `no-show`. The
/// server enforces transitions; the client only reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Query/body value, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who cancelled an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    Customer,
    Stylist,
    System,
}

/// Where the appointment takes place, captured at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentLocation {
    pub address: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// "salon" or "mobile"
    #[serde(default)]
    pub location_type: Option<String>,
}

/// Cancellation details, present only for cancelled appointments.
#[derive(Debug, Clone, PartialEq)]
pub struct Cancellation<'a> {
    pub reason: Option<&'a str>,
    pub cancelled_by: Option<CancelledBy>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// A booking between a customer and a stylist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub customer_id: String,
    pub stylist_id: String,
    pub service_id: String,
    pub appointment_date: NaiveDate,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    #[serde(default)]
    pub end_time: Option<String>,
    /// Minutes
    #[serde(default)]
    pub duration: u32,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub location: Option<AppointmentLocation>,
    #[serde(default)]
    pub contact_number: Option<String>,
    pub total_price: f64,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub cancelled_by: Option<CancelledBy>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_sent: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Cancellation metadata. `None` unless the status is `cancelled`, even if
    /// the server left stale fields behind.
    pub fn cancellation(&self) -> Option<Cancellation<'_>> {
        if self.status != AppointmentStatus::Cancelled {
            return None;
        }
        Some(Cancellation {
            reason: self.cancellation_reason.as_deref(),
            cancelled_by: self.cancelled_by,
            cancelled_at: self.cancelled_at,
        })
    }
}

/// Request body for creating a booking.
///
/// Slot conflicts are detected by the server only.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub stylist_id: String,
    #[validate(length(min = 1, message = "is required"))]
    pub service_id: String,
    pub appointment_date: NaiveDate,
    /// "HH:MM"
    #[validate(custom(function = "validate_time_of_day"))]
    pub start_time: String,
    /// Selected add-on IDs
    #[serde(default)]
    pub add_ons: Vec<String>,
    pub location: AppointmentLocation,
    #[validate(length(min = 7, message = "must be a valid phone number"))]
    pub contact_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub special_requests: Option<String>,
}

fn validate_time_of_day(value: &str) -> Result<(), validator::ValidationError> {
    chrono::NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| {
            let mut err = validator::ValidationError::new("time_of_day");
            err.message = Some("must be a time in HH:MM format".into());
            err
        })
}

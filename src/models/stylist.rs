// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stylist and service models (read-only from the client's perspective).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::location::Coordinates;

/// Stylist's business location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylistLocation {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub coordinates: Coordinates,
}

/// Working hours for one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    /// "HH:MM"
    pub start: String,
    /// "HH:MM"
    pub end: String,
    pub is_working: bool,
}

/// Service-provider profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stylist {
    pub id: String,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    /// Experience label (e.g. "5+ years")
    #[serde(default)]
    pub experience: String,
    pub location: StylistLocation,
    /// Service radius in miles
    #[serde(default)]
    pub service_radius: f64,
    /// Ordered portfolio image URIs
    #[serde(default)]
    pub portfolio_images: Vec<String>,
    /// Aggregate rating (0-5)
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_available: bool,
    /// Day name ("monday", ...) -> hours
    #[serde(default)]
    pub working_hours: BTreeMap<String, DayHours>,
    /// Response-time label (e.g. "within 1 hour")
    #[serde(default)]
    pub response_time: Option<String>,
    /// Distance from the search center in miles, when the server computed one
    #[serde(default)]
    pub distance: Option<f64>,
}

impl Stylist {
    /// Name to show in listings: business name, else the owner's name.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.business_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }
}

/// Optional extra attached to a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
}

/// Offering owned by a stylist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub stylist_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    /// Display duration (e.g. "4-5 hours")
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub booking_count: u32,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Bookable slot returned by the availability endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylist_deserializes_with_sparse_fields() {
        let json = serde_json::json!({
            "id": "s-1",
            "firstName": "Ama",
            "lastName": "Mensah",
            "location": {
                "address": "12 Fulton St",
                "coordinates": { "latitude": 40.71, "longitude": -74.0 }
            },
            "rating": 4.8,
            "workingHours": {
                "monday": { "start": "09:00", "end": "17:00", "isWorking": true }
            }
        });

        let stylist: Stylist = serde_json::from_value(json).unwrap();
        assert_eq!(stylist.display_name(), "Ama Mensah");
        assert!(stylist.specialties.is_empty());
        assert_eq!(stylist.review_count, 0);
        assert!(stylist.working_hours["monday"].is_working);
    }

    #[test]
    fn test_business_name_preferred() {
        let json = serde_json::json!({
            "id": "s-2",
            "businessName": "Crown Braids",
            "firstName": "Ama",
            "location": { "coordinates": { "latitude": 0.0, "longitude": 0.0 } }
        });
        let stylist: Stylist = serde_json::from_value(json).unwrap();
        assert_eq!(stylist.display_name(), "Crown Braids");
    }

    #[test]
    fn test_service_defaults_active() {
        let json = serde_json::json!({
            "id": "svc-1",
            "name": "Knotless braids",
            "price": 180.0,
            "addOns": [{ "id": "a-1", "name": "Beads", "price": 15.0 }]
        });
        let service: Service = serde_json::from_value(json).unwrap();
        assert!(service.is_active);
        assert_eq!(service.add_ons.len(), 1);
    }
}

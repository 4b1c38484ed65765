// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stylist search filters and pagination.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Server-side sort key for stylist search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Distance,
    Rating,
    Price,
    Experience,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Distance => "distance",
            SortBy::Rating => "rating",
            SortBy::Price => "price",
            SortBy::Experience => "experience",
        }
    }
}

/// Filters for `GET /stylists/search`.
///
/// Only set fields are sent; ordering and paging are the server's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_price_bounds"))]
pub struct SearchFilters {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    /// Miles
    #[validate(range(exclusive_min = 0.0, message = "must be positive"))]
    pub radius: Option<f64>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub max_price: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0, message = "must be between 0 and 5"))]
    pub min_rating: Option<f64>,
    /// Only stylists with an open slot today
    #[serde(default)]
    pub available_today: bool,
    pub sort_by: Option<SortBy>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

fn validate_price_bounds(filters: &SearchFilters) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
        if min > max {
            let mut err = ValidationError::new("price_bounds");
            err.message = Some("minimum price must not exceed maximum price".into());
            return Err(err);
        }
    }
    Ok(())
}

impl SearchFilters {
    /// Filters centered on a point with a radius in miles.
    pub fn near(latitude: f64, longitude: f64, radius: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            radius: Some(radius),
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    /// Query-string pairs for the set fields.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(v) = self.latitude {
            query.push(("latitude", v.to_string()));
        }
        if let Some(v) = self.longitude {
            query.push(("longitude", v.to_string()));
        }
        if let Some(v) = self.radius {
            query.push(("radius", v.to_string()));
        }
        if !self.specialties.is_empty() {
            query.push(("specialties", self.specialties.join(",")));
        }
        if let Some(v) = self.min_price {
            query.push(("minPrice", v.to_string()));
        }
        if let Some(v) = self.max_price {
            query.push(("maxPrice", v.to_string()));
        }
        if let Some(v) = self.min_rating {
            query.push(("minRating", v.to_string()));
        }
        if self.available_today {
            query.push(("availableToday", "true".to_string()));
        }
        if let Some(v) = self.sort_by {
            query.push(("sortBy", v.as_str().to_string()));
        }
        if let Some(v) = self.page {
            query.push(("page", v.to_string()));
        }
        if let Some(v) = self.limit {
            query.push(("limit", v.to_string()));
        }
        query
    }
}

/// Pagination block returned alongside list payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

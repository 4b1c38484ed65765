// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session and data-access layer.

pub mod api;
pub mod auth;
pub mod baas;
pub mod booking;
pub mod favorites;
pub mod identity;
pub mod location;
pub mod session;

pub use api::{ApiClient, ApiResponse};
pub use auth::{AuthManager, AuthState};
pub use baas::BaasClient;
pub use booking::BookingService;
pub use favorites::FavoritesService;
pub use identity::{
    AuthEvent, AuthEventKind, IdentityProvider, ProfileRepository, SignUpCredentials,
    SignUpOutcome,
};
pub use location::{
    distance_miles, format_distance, is_within_radius, LocationProvider, LocationService,
    PermissionStatus, UnavailableLocationProvider,
};
pub use session::SessionStore;

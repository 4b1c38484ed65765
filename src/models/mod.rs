// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod appointment;
pub mod location;
pub mod search;
pub mod stylist;
pub mod user;

pub use appointment::{
    Appointment, AppointmentLocation, AppointmentStatus, CancelledBy, CreateBookingRequest,
};
pub use location::{Address, Coordinates, LocationResult, LocationSource};
pub use search::{Pagination, SearchFilters, SortBy};
pub use stylist::{AddOn, DayHours, Service, Stylist, StylistLocation, TimeSlot};
pub use user::{
    AuthenticatedUser, IdentityUser, NewUserProfile, Role, SessionTokens, SignUpRequest,
    UserProfile,
};

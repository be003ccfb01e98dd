//! Route Handlers

pub mod events;
pub mod forecast;
pub mod health;
pub mod storms;

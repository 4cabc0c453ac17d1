//! # PuppyLove server
//! This crate hosts the HTTP surface of the PuppyLove heart exchange. It is responsible for:
//! * Exposing the engine's heart, profile and admin APIs over HTTP.
//! * Gating the user routes on the current PuppyLove phase (see [`middleware`]).
//! * Starting the moderation, mail and profile-action workers (see [`workers`]).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/puppylove/stats`: Registration and match statistics, once results are published.
//! * `/api/puppylove/users/...`: The heart exchange. Identity comes from the `X-Roll-No` header.
//! * `/api/puppylove/admin/...`: Phase control. Requires the `X-Admin-Token` header.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;

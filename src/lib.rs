//! Service registration and discovery over a TTL-based coordination store.
//!
//! A [`Registrar`](services::Registrar) publishes `<service>/<instance>` with a TTL and keeps it
//! alive from a background task; a [`Resolver`](services::Resolver) lists the live instances of a
//! service.

pub mod config;
pub mod services;

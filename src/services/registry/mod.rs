//! Registry module
//!
//! - `types`: identity, wire entry and timing constants
//! - `registrar`: registration lifecycle and keep-alive task
//! - `resolver`: discovery query
//! - `client`: `RegistryClient` facade built from configuration

pub mod client;
pub mod error;
pub mod registrar;
pub mod resolver;
pub mod types;

pub use client::{DiscoveryClient, RegistryClient};
pub use error::RegistryError;
pub use registrar::Registrar;
pub use resolver::Resolver;
pub use types::{
    KEEP_ALIVE_PERIOD, KEEP_ALIVE_RETRY_DELAY, RegistrationEntry, RegistrationIdentity, TTL,
    build_key,
};

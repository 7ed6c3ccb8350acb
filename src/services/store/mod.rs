//! Coordination store module
//!
//! - `types`: the `StoreClient` capability and its node type
//! - `error`: store error taxonomy
//! - `etcd`: etcd v3 adapter (leases for TTL)
//! - `memory`: in-process TTL store

pub mod error;
pub mod etcd;
pub mod memory;
pub mod types;

pub use error::StoreError;
pub use etcd::{CONNECT_TIMEOUT, EtcdStore, HEADER_TIMEOUT_PER_REQUEST};
pub use memory::MemoryStore;
pub use types::{StoreClient, StoreNode};

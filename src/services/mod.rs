pub mod registry;
pub mod store;

pub use registry::{
    DiscoveryClient, Registrar, RegistrationEntry, RegistrationIdentity, RegistryClient,
    RegistryError, Resolver,
};
pub use store::{EtcdStore, MemoryStore, StoreClient, StoreError, StoreNode};

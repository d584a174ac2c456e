//! Memoization for ordered service discovery.
//!
//! Discovering, instantiating, and ordering service providers is expensive.
//! [`OrderedServicesCache`] remembers each result under its capability and
//! discriminator types, and may lose everything at any moment to
//! [reclamation](ReclaimableStore::reclaim) without breaking callers: a lost
//! entry is just a miss.
//!
//! # Modules
//!
//! - [`key`] - Type identities and composite cache keys
//! - [`reclaim`] - Holder whose value may be discarded out-of-band
//! - [`cache`] - The `find` / `store` / `clear` surface
//! - [`ordered`] - Loader that runs discovery on a miss and memoizes the result
//! - [`config`] - Backing map sizing

pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod ordered;
pub mod reclaim;

pub use cache::{CacheStore, OrderedServicesCache, ServiceTable};
pub use config::CacheConfig;
pub use error::{CacheError, ConfigError};
pub use key::{KeyRef, KeyView, ServiceKey, TypeKey};
pub use ordered::{OrderedService, OrderedServiceLoader, OrderedServices, ServiceSource};
pub use reclaim::{ReclaimHandle, ReclaimableStore};

//! Memoized ordered-service tables.
//!
//! # Role
//!
//! Remembers the result of service discovery per `(capability, discriminators)`
//! so callers skip discovery on a hit. The backing map lives in a
//! [`ReclaimableStore`] and may vanish at any time; every access tolerates that.
//!
//! # Invariants
//!
//! - Reads never materialize a backing map.
//! - `clear` empties the live map in place and never creates one.
//! - Each operation works on one `Arc` snapshot of the map from start to finish.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::config::CacheConfig;
use crate::error::{CacheError, ConfigError};
use crate::key::{KeyRef, KeyView, ServiceKey, TypeKey};
use crate::reclaim::{ReclaimHandle, ReclaimableStore};

/// Opaque cached payload. The cache never inspects it.
pub type ServiceTable = Arc<dyn Any + Send + Sync>;

/// Backing map from key to table.
pub type CacheStore = DashMap<ServiceKey, ServiceTable, FxBuildHasher>;

static GLOBAL: OnceLock<OrderedServicesCache> = OnceLock::new();

pub struct OrderedServicesCache {
	store: Arc<ReclaimableStore<CacheStore>>,
	config: CacheConfig,
}

impl Default for OrderedServicesCache {
	fn default() -> Self {
		Self::with_valid_config(CacheConfig::default())
	}
}

impl OrderedServicesCache {
	/// Creates an isolated cache. No backing map exists until the first store.
	///
	/// Rejects configs the backing map cannot be built from, so `store` never fails later.
	pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok(Self::with_valid_config(config))
	}

	fn with_valid_config(config: CacheConfig) -> Self {
		Self {
			store: Arc::new(ReclaimableStore::new()),
			config,
		}
	}

	/// Returns the process-wide cache, creating it with defaults on first access.
	pub fn global() -> &'static Self {
		GLOBAL.get_or_init(Self::default)
	}

	/// Installs the process-wide cache with `config`.
	///
	/// Must run before the first [`Self::global`] call.
	pub fn init_global(config: CacheConfig) -> Result<&'static Self, CacheError> {
		let mut fresh = Some(Self::new(config)?);
		let installed = GLOBAL.get_or_init(|| fresh.take().unwrap_or_default());
		match fresh {
			None => Ok(installed),
			Some(_) => Err(CacheError::AlreadyInitialized),
		}
	}

	pub fn config(&self) -> &CacheConfig {
		&self.config
	}

	/// Looks up the table cached for `capability` and `discriminators`.
	///
	/// Looks up through a borrowed key; a hit allocates nothing.
	pub fn find(&self, capability: TypeKey, discriminators: &[TypeKey]) -> Option<ServiceTable> {
		let map = self.store.peek()?;
		let key = KeyRef::new(capability, discriminators);
		map.get(&key as &dyn KeyView).map(|entry| Arc::clone(entry.value()))
	}

	/// Like [`Self::find`], downcast to `T`. A table of another type reads as a miss.
	pub fn find_typed<T: Any + Send + Sync>(&self, capability: TypeKey, discriminators: &[TypeKey]) -> Option<Arc<T>> {
		self.find(capability, discriminators)?.downcast::<T>().ok()
	}

	/// Caches `table`, replacing any previous entry for the same key.
	pub fn store(&self, capability: TypeKey, discriminators: &[TypeKey], table: ServiceTable) {
		let map = self.store.get_or_create(|| self.create_map());
		map.insert(ServiceKey::new(capability, discriminators), table);
	}

	pub fn store_typed<T: Any + Send + Sync>(&self, capability: TypeKey, discriminators: &[TypeKey], table: Arc<T>) {
		self.store(capability, discriminators, table);
	}

	/// Empties the live backing map, if there is one.
	pub fn clear(&self) {
		let Some(map) = self.store.peek() else {
			return;
		};
		let dropped = map.len();
		map.clear();
		tracing::debug!(dropped, "Cleared ordered services cache");
	}

	/// Entries in the live backing map; 0 when none is live.
	pub fn len(&self) -> usize {
		self.store.peek().map_or(0, |map| map.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Discards the backing map, as a memory-pressure signal would.
	pub fn reclaim(&self) -> bool {
		self.store.reclaim()
	}

	pub fn reclaim_handle(&self) -> ReclaimHandle<CacheStore> {
		ReclaimHandle::new(Arc::clone(&self.store))
	}

	/// Whether a backing map currently exists.
	pub fn is_live(&self) -> bool {
		self.store.is_live()
	}

	/// Number of backing maps created so far.
	pub fn generation(&self) -> u64 {
		self.store.generation()
	}

	fn create_map(&self) -> CacheStore {
		let capacity = self.config.initial_capacity;
		match self.config.shard_amount {
			Some(shards) => DashMap::with_capacity_and_hasher_and_shard_amount(capacity, FxBuildHasher, shards),
			None => DashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
		}
	}
}

impl std::fmt::Debug for OrderedServicesCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OrderedServicesCache")
			.field("store", &self.store)
			.field("len", &self.len())
			.finish()
	}
}

#[cfg(test)]
mod tests;

//! Process-wide registry of named data source handles and table owners.
//!
//! Plain concurrent maps: entries live until replaced or until the process
//! exits. There is no eviction and no ordering.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// A live connection handle stored in the global registry.
pub trait DataSource: Any + Send + Sync + fmt::Debug {
	fn as_any(&self) -> &dyn Any;
}

/// Registry used process-wide. See [`DataSourceRegistry::global`].
pub type GlobalDataSourceRegistry = DataSourceRegistry<dyn DataSource>;

static GLOBAL: OnceLock<GlobalDataSourceRegistry> = OnceLock::new();

/// Named connection handles and the data source owning each table.
pub struct DataSourceRegistry<H: ?Sized> {
	connections: DashMap<String, Arc<H>>,
	table_owners: DashMap<String, String>,
}

impl<H: ?Sized> Default for DataSourceRegistry<H> {
	fn default() -> Self {
		Self::new()
	}
}

impl DataSourceRegistry<dyn DataSource> {
	/// Returns the process-wide registry, created empty on first access.
	pub fn global() -> &'static Self {
		GLOBAL.get_or_init(Self::new)
	}
}

impl<H: ?Sized> DataSourceRegistry<H> {
	pub fn new() -> Self {
		Self {
			connections: DashMap::new(),
			table_owners: DashMap::new(),
		}
	}

	/// Returns the handle registered under `name`, creating it with `connect` if absent.
	///
	/// `connect` runs at most once per name even under contention, while the
	/// name's shard is locked; it must not call back into this registry. A
	/// failed `connect` registers nothing.
	pub fn get_or_register_connection<E>(&self, name: &str, connect: impl FnOnce() -> Result<Arc<H>, E>) -> Result<Arc<H>, E> {
		if let Some(existing) = self.connections.get(name) {
			return Ok(Arc::clone(existing.value()));
		}
		match self.connections.entry(name.to_owned()) {
			Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
			Entry::Vacant(entry) => {
				let handle = connect()?;
				debug!(name, "Registered data source");
				Ok(Arc::clone(entry.insert(handle).value()))
			}
		}
	}

	pub fn connection(&self, name: &str) -> Option<Arc<H>> {
		self.connections.get(name).map(|entry| Arc::clone(entry.value()))
	}

	/// Registers `handle` under `name`, returning the handle it replaced.
	pub fn register_connection(&self, name: impl Into<String>, handle: Arc<H>) -> Option<Arc<H>> {
		self.connections.insert(name.into(), handle)
	}

	/// Registered connection names, sorted.
	pub fn connection_names(&self) -> Vec<String> {
		let mut names: Vec<_> = self.connections.iter().map(|entry| entry.key().clone()).collect();
		names.sort();
		names
	}

	pub fn table_owner(&self, table: &str) -> Option<String> {
		self.table_owners.get(table).map(|entry| entry.value().clone())
	}

	/// Records `owner` as the data source holding `table`. Returns the previous owner.
	pub fn set_table_owner(&self, table: impl Into<String>, owner: impl Into<String>) -> Option<String> {
		self.table_owners.insert(table.into(), owner.into())
	}

	/// Tables with a recorded owner, sorted.
	pub fn table_names(&self) -> Vec<String> {
		let mut names: Vec<_> = self.table_owners.iter().map(|entry| entry.key().clone()).collect();
		names.sort();
		names
	}
}

impl<H: ?Sized> fmt::Debug for DataSourceRegistry<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DataSourceRegistry")
			.field("connections", &self.connection_names())
			.field("tables", &self.table_owners.len())
			.finish()
	}
}

//! Cache sizing configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Sizing for each backing map the cache materializes.
///
/// Applied every time a store is (re)created after reclamation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
	/// Capacity reserved when a backing map is created.
	pub initial_capacity: usize,
	/// Number of lock shards in the backing map. `None` lets the map pick.
	pub shard_amount: Option<usize>,
}

fn default_initial_capacity() -> usize {
	128
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			initial_capacity: default_initial_capacity(),
			shard_amount: None,
		}
	}
}

impl CacheConfig {
	/// Parses and validates a TOML document.
	///
	/// Missing fields take their defaults; an empty document is valid.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.shard_amount {
			Some(n) if n <= 1 || !n.is_power_of_two() => Err(ConfigError::InvalidShardAmount(n)),
			_ => Ok(()),
		}
	}
}

/// Cache configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid cache config: {0}")]
	Parse(#[from] toml::de::Error),

	/// Shard counts must be a power of two greater than one.
	#[error("shard_amount must be a power of two greater than 1, got {0}")]
	InvalidShardAmount(usize),
}

/// Errors raised while setting up the process-wide cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
	#[error("global ordered services cache already initialized")]
	AlreadyInitialized,

	#[error(transparent)]
	Config(#[from] ConfigError),
}

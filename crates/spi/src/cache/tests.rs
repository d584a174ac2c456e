use std::sync::Arc;

use proptest::prelude::*;
use serial_test::serial;

use super::*;

trait Codec {}
struct Json;
struct Yaml;
struct Toml;

fn codec() -> TypeKey {
	TypeKey::of::<dyn Codec>()
}

fn table(tag: &'static str) -> ServiceTable {
	Arc::new(tag)
}

fn tag_of(table: &ServiceTable) -> &'static str {
	*table.downcast_ref::<&'static str>().expect("table holds a tag")
}

#[test]
fn find_on_fresh_cache_misses_without_creating() {
	let cache = OrderedServicesCache::default();
	assert!(cache.find(codec(), &[]).is_none());
	assert!(!cache.is_live());
	assert_eq!(cache.generation(), 0);
}

#[test]
fn store_then_find_returns_table() {
	let cache = OrderedServicesCache::default();
	let stored = table("t1");
	cache.store(codec(), &[], Arc::clone(&stored));

	let found = cache.find(codec(), &[]).expect("hit");
	assert!(Arc::ptr_eq(&found, &stored));
	assert!(cache.is_live());
}

#[test]
fn store_find_clear_scenario() {
	let cache = OrderedServicesCache::default();
	cache.store(codec(), &[], table("t1"));

	assert_eq!(tag_of(&cache.find(codec(), &[]).unwrap()), "t1");
	assert!(cache.find(codec(), &[TypeKey::of::<Json>()]).is_none());

	cache.clear();
	assert!(cache.find(codec(), &[]).is_none());
}

#[test]
fn clear_keeps_the_same_backing_map() {
	let cache = OrderedServicesCache::default();
	cache.store(codec(), &[], table("t1"));
	cache.clear();

	assert!(cache.is_live());
	assert!(cache.is_empty());
	cache.store(codec(), &[], table("t2"));
	assert_eq!(cache.generation(), 1, "clear must not force recreation");
}

#[test]
fn clear_on_fresh_cache_is_noop() {
	let cache = OrderedServicesCache::default();
	cache.clear();
	assert!(!cache.is_live());
	assert!(cache.find(codec(), &[]).is_none());
	assert!(!cache.is_live());
}

#[test]
fn last_store_wins() {
	let cache = OrderedServicesCache::default();
	cache.store(codec(), &[TypeKey::of::<Json>()], table("old"));
	cache.store(codec(), &[TypeKey::of::<Json>()], table("new"));

	assert_eq!(tag_of(&cache.find(codec(), &[TypeKey::of::<Json>()]).unwrap()), "new");
	assert_eq!(cache.len(), 1);
}

#[test]
fn permuted_discriminators_are_distinct_entries() {
	let cache = OrderedServicesCache::default();
	let json = TypeKey::of::<Json>();
	let yaml = TypeKey::of::<Yaml>();
	cache.store(codec(), &[json, yaml], table("json-yaml"));

	assert!(cache.find(codec(), &[yaml, json]).is_none());
	assert_eq!(tag_of(&cache.find(codec(), &[json, yaml]).unwrap()), "json-yaml");
}

#[test]
fn reclaim_loses_entries_and_store_recreates() {
	let cache = OrderedServicesCache::default();
	cache.store(codec(), &[], table("t1"));

	assert!(cache.reclaim());
	assert!(!cache.is_live());
	assert!(cache.find(codec(), &[]).is_none());

	cache.store(codec(), &[TypeKey::of::<Toml>()], table("t2"));
	assert_eq!(tag_of(&cache.find(codec(), &[TypeKey::of::<Toml>()]).unwrap()), "t2");
	assert!(cache.find(codec(), &[]).is_none());
	assert_eq!(cache.generation(), 2);
}

#[test]
fn reclaim_handle_discards_cache_contents() {
	let cache = OrderedServicesCache::default();
	let handle = cache.reclaim_handle();
	cache.store(codec(), &[], table("t1"));

	assert!(handle.reclaim());
	assert!(cache.find(codec(), &[]).is_none());
	assert_eq!(cache.len(), 0);
}

#[test]
fn typed_helpers_downcast() {
	let cache = OrderedServicesCache::default();
	cache.store_typed(codec(), &[], Arc::new(vec![1u32, 2, 3]));

	let hit: Arc<Vec<u32>> = cache.find_typed(codec(), &[]).expect("hit");
	assert_eq!(*hit, vec![1, 2, 3]);
	assert!(cache.find_typed::<String>(codec(), &[]).is_none(), "type mismatch reads as a miss");
}

#[test]
fn sharded_config_is_applied() {
	let config = CacheConfig {
		initial_capacity: 4,
		shard_amount: Some(4),
	};
	let cache = OrderedServicesCache::new(config.clone()).unwrap();
	cache.store(codec(), &[], table("t1"));
	assert_eq!(cache.config(), &config);
	assert_eq!(cache.len(), 1);
}

#[test]
fn new_rejects_unbuildable_shard_amount() {
	let config = CacheConfig {
		initial_capacity: 4,
		shard_amount: Some(3),
	};
	assert!(matches!(OrderedServicesCache::new(config), Err(ConfigError::InvalidShardAmount(3))));
}

/// Every config `new` accepts yields a cache whose first store succeeds.
#[test]
fn accepted_configs_store_without_panicking() {
	for shard_amount in [None, Some(2), Some(8), Some(64)] {
		let cache = OrderedServicesCache::new(CacheConfig {
			initial_capacity: 0,
			shard_amount,
		})
		.expect("valid config");
		cache.store(codec(), &[], table("t1"));
		assert_eq!(tag_of(&cache.find(codec(), &[]).unwrap()), "t1");
	}
}

#[test]
#[serial]
fn init_global_rejects_invalid_config() {
	let config = CacheConfig {
		initial_capacity: 4,
		shard_amount: Some(3),
	};
	assert!(matches!(
		OrderedServicesCache::init_global(config),
		Err(CacheError::Config(ConfigError::InvalidShardAmount(3)))
	));
}

#[test]
#[serial]
fn global_is_a_single_instance() {
	let a = OrderedServicesCache::global();
	let b = OrderedServicesCache::global();
	assert!(std::ptr::eq(a, b));
	assert!(matches!(
		OrderedServicesCache::init_global(CacheConfig::default()),
		Err(CacheError::AlreadyInitialized)
	));
}

fn discriminator_pool() -> Vec<TypeKey> {
	vec![
		TypeKey::of::<Json>(),
		TypeKey::of::<Yaml>(),
		TypeKey::of::<Toml>(),
		TypeKey::of::<u8>(),
		TypeKey::of::<String>(),
	]
}

fn arb_discriminators() -> impl Strategy<Value = Vec<TypeKey>> {
	proptest::collection::vec(proptest::sample::select(discriminator_pool()), 0..4)
}

proptest! {
	/// Storing under one discriminator set never shows up under another.
	#[test]
	fn prop_key_independence(d1 in arb_discriminators(), d2 in arb_discriminators()) {
		prop_assume!(d1 != d2);
		let cache = OrderedServicesCache::default();
		cache.store(codec(), &d1, table("d1"));

		prop_assert!(cache.find(codec(), &d2).is_none());
		prop_assert_eq!(tag_of(&cache.find(codec(), &d1).unwrap()), "d1");
	}

	/// Every stored key is retrievable until the cache is cleared.
	#[test]
	fn prop_store_then_find(sets in proptest::collection::vec(arb_discriminators(), 1..8)) {
		let cache = OrderedServicesCache::default();
		for (i, set) in sets.iter().enumerate() {
			cache.store_typed(codec(), set, Arc::new(i));
		}
		for set in &sets {
			let last = sets.iter().rposition(|s| s == set).unwrap();
			prop_assert_eq!(*cache.find_typed::<usize>(codec(), set).unwrap(), last);
		}
		cache.clear();
		for set in &sets {
			prop_assert!(cache.find(codec(), set).is_none());
		}
	}
}

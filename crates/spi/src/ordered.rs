//! Ordered service loading on top of [`OrderedServicesCache`].
//!
//! Discovery itself is delegated to a [`ServiceSource`]. The loader only runs
//! it on a cache miss, arranges the result by each provider's declared
//! [`OrderedService::order`], and memoizes the table.

use std::sync::Arc;

use crate::cache::OrderedServicesCache;
use crate::key::TypeKey;

/// A provider that declares its position and the type it serves.
pub trait OrderedService: Send + Sync + 'static {
	/// Lower values sort first.
	fn order(&self) -> i32;

	/// The discriminator type this provider handles.
	fn target(&self) -> TypeKey;
}

/// External discovery mechanism producing every provider of `S`.
pub trait ServiceSource<S: ?Sized> {
	fn discover(&self) -> Vec<Arc<S>>;
}

impl<S: ?Sized, F> ServiceSource<S> for F
where
	F: Fn() -> Vec<Arc<S>>,
{
	fn discover(&self) -> Vec<Arc<S>> {
		self()
	}
}

/// Providers of one capability, already in order.
pub struct OrderedServices<S: ?Sized> {
	entries: Vec<(TypeKey, Arc<S>)>,
}

impl<S: ?Sized> OrderedServices<S> {
	pub fn get(&self, target: TypeKey) -> Option<&Arc<S>> {
		self.entries.iter().find(|(key, _)| *key == target).map(|(_, service)| service)
	}

	pub fn iter(&self) -> impl Iterator<Item = (TypeKey, &Arc<S>)> {
		self.entries.iter().map(|(key, service)| (*key, service))
	}

	pub fn services(&self) -> impl Iterator<Item = &Arc<S>> {
		self.entries.iter().map(|(_, service)| service)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<S: ?Sized> std::fmt::Debug for OrderedServices<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.entries.iter().map(|(key, _)| key)).finish()
	}
}

/// Discriminator marking the unfiltered provider list.
struct AllProviders;

/// Resolves ordered providers through a cache.
#[derive(Debug, Clone, Copy)]
pub struct OrderedServiceLoader<'a> {
	cache: &'a OrderedServicesCache,
}

impl Default for OrderedServiceLoader<'static> {
	fn default() -> Self {
		Self::new(OrderedServicesCache::global())
	}
}

impl<'a> OrderedServiceLoader<'a> {
	pub fn new(cache: &'a OrderedServicesCache) -> Self {
		Self { cache }
	}

	/// Providers of `S` for each of `discriminators`, ordered by provider order.
	///
	/// Each discriminator maps to the lowest-order provider targeting it;
	/// discriminators without a provider are omitted. Ties keep the
	/// discriminator order given by the caller.
	pub fn services<S>(&self, source: &impl ServiceSource<S>, discriminators: &[TypeKey]) -> Arc<OrderedServices<S>>
	where
		S: OrderedService + ?Sized,
	{
		let capability = TypeKey::of::<S>();
		if let Some(hit) = self.cache.find_typed::<OrderedServices<S>>(capability, discriminators) {
			tracing::trace!(%capability, ?discriminators, "Ordered services cache hit");
			return hit;
		}

		let discovered = source.discover();
		tracing::debug!(%capability, ?discriminators, discovered = discovered.len(), "Discovered ordered services");

		let mut picked: Vec<(usize, TypeKey, Arc<S>)> = Vec::with_capacity(discriminators.len());
		for (position, target) in discriminators.iter().enumerate() {
			if picked.iter().any(|(_, key, _)| key == target) {
				continue;
			}
			let best = discovered.iter().filter(|s| s.target() == *target).min_by_key(|s| s.order());
			if let Some(service) = best {
				picked.push((position, *target, Arc::clone(service)));
			}
		}
		picked.sort_by_key(|(position, _, service)| (service.order(), *position));

		let table = Arc::new(OrderedServices {
			entries: picked.into_iter().map(|(_, key, service)| (key, service)).collect(),
		});
		self.cache.store_typed(capability, discriminators, Arc::clone(&table));
		table
	}

	/// Every provider of `S`, ordered by provider order.
	///
	/// Equal orders keep discovery order. Cached apart from [`Self::services`]
	/// so an empty discriminator list there does not alias this table.
	pub fn services_by_order<S>(&self, source: &impl ServiceSource<S>) -> Arc<OrderedServices<S>>
	where
		S: OrderedService + ?Sized,
	{
		let capability = TypeKey::of::<S>();
		let all = [TypeKey::of::<AllProviders>()];
		if let Some(hit) = self.cache.find_typed::<OrderedServices<S>>(capability, &all) {
			tracing::trace!(%capability, "Ordered services cache hit");
			return hit;
		}

		let mut discovered = source.discover();
		tracing::debug!(%capability, discovered = discovered.len(), "Discovered ordered services");
		discovered.sort_by_key(|s| s.order());

		let table = Arc::new(OrderedServices {
			entries: discovered.into_iter().map(|service| (service.target(), service)).collect(),
		});
		self.cache.store_typed(capability, &all, Arc::clone(&table));
		table
	}
}

//! Holder for a value that may be discarded out-of-band.
//!
//! # Role
//!
//! Stands in for a memory-pressure-cleared reference. Whoever holds a
//! [`ReclaimHandle`] may drop the held value at any instant; readers see either
//! the live value or nothing.
//!
//! # Invariants
//!
//! - At most one value is published at a time.
//! - Racing [`ReclaimableStore::get_or_create`] callers all receive the same
//!   newly created value (see `tests::concurrent_first_use_creates_once`).
//! - Reclamation never invalidates an `Arc` a caller already obtained.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

pub struct ReclaimableStore<T> {
	slot: ArcSwapOption<T>,
	create_lock: Mutex<()>,
	generation: AtomicU64,
}

impl<T> Default for ReclaimableStore<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> ReclaimableStore<T> {
	/// Creates an empty holder. Nothing is allocated until first use.
	pub fn new() -> Self {
		Self {
			slot: ArcSwapOption::empty(),
			create_lock: Mutex::new(()),
			generation: AtomicU64::new(0),
		}
	}

	/// Returns the live value, if any. Never blocks and never allocates.
	#[inline]
	pub fn peek(&self) -> Option<Arc<T>> {
		self.slot.load_full()
	}

	/// Returns the live value, creating and publishing one with `init` if absent.
	pub fn get_or_create(&self, init: impl FnOnce() -> T) -> Arc<T> {
		if let Some(live) = self.slot.load_full() {
			return live;
		}

		let _guard = self.create_lock.lock();
		if let Some(live) = self.slot.load_full() {
			return live;
		}

		let fresh = Arc::new(init());
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		self.slot.store(Some(Arc::clone(&fresh)));
		tracing::debug!(generation, "Created backing store");
		fresh
	}

	/// Drops the published value. Returns true if one was live.
	pub fn reclaim(&self) -> bool {
		let dropped = self.slot.swap(None).is_some();
		if dropped {
			tracing::debug!(generation = self.generation(), "Reclaimed backing store");
		}
		dropped
	}

	pub fn is_live(&self) -> bool {
		self.slot.load().is_some()
	}

	/// Number of values ever created by this holder.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}
}

impl<T> fmt::Debug for ReclaimableStore<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReclaimableStore")
			.field("live", &self.is_live())
			.field("generation", &self.generation())
			.finish()
	}
}

/// Trigger that can discard a [`ReclaimableStore`]'s value without reading it.
///
/// Hand this to whatever observes memory pressure.
pub struct ReclaimHandle<T> {
	store: Arc<ReclaimableStore<T>>,
}

impl<T> ReclaimHandle<T> {
	pub(crate) fn new(store: Arc<ReclaimableStore<T>>) -> Self {
		Self { store }
	}

	/// See [`ReclaimableStore::reclaim`].
	pub fn reclaim(&self) -> bool {
		self.store.reclaim()
	}
}

impl<T> Clone for ReclaimHandle<T> {
	fn clone(&self) -> Self {
		Self {
			store: Arc::clone(&self.store),
		}
	}
}

impl<T> fmt::Debug for ReclaimHandle<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ReclaimHandle").field(&self.store).finish()
	}
}

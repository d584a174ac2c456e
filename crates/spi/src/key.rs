//! Composite cache keys.
//!
//! # Invariants
//!
//! - Equality is structural over the capability and the discriminator sequence.
//! - Discriminator order is significant: `(C, [A, B])` and `(C, [B, A])` are
//!   distinct keys.
//! - The hash is computed once at construction and never changes.

use std::any::{TypeId, type_name};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

/// Identity of a Rust type, used for both capabilities and discriminators.
///
/// Compares and hashes by [`TypeId`] only; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	/// Returns the key for `T`. Trait objects are allowed (`TypeKey::of::<dyn Codec>()`).
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: type_name::<T>(),
		}
	}

	pub fn type_id(&self) -> TypeId {
		self.id
	}

	/// Fully qualified type name, as reported by [`std::any::type_name`].
	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Cache key combining a capability with its discriminator sequence.
#[derive(Clone)]
pub struct ServiceKey {
	capability: TypeKey,
	discriminators: Arc<[TypeKey]>,
	hash: u64,
}

impl ServiceKey {
	pub fn new(capability: TypeKey, discriminators: impl Into<Arc<[TypeKey]>>) -> Self {
		let discriminators = discriminators.into();
		Self {
			capability,
			hash: key_hash(capability, &discriminators),
			discriminators,
		}
	}

	pub fn capability(&self) -> TypeKey {
		self.capability
	}

	pub fn discriminators(&self) -> &[TypeKey] {
		&self.discriminators
	}
}

impl PartialEq for ServiceKey {
	fn eq(&self, other: &Self) -> bool {
		KeyView::eq_view(self, other)
	}
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_u64(self.hash);
	}
}

fn key_hash(capability: TypeKey, discriminators: &[TypeKey]) -> u64 {
	let mut hasher = FxHasher::default();
	capability.hash(&mut hasher);
	discriminators.hash(&mut hasher);
	hasher.finish()
}

/// Common view of owned and borrowed keys, so map lookups need no allocation.
///
/// Owned [`ServiceKey`]s borrow as `dyn KeyView`; equality and hash agree across both forms.
pub trait KeyView {
	fn capability(&self) -> TypeKey;
	fn discriminators(&self) -> &[TypeKey];
	fn precomputed_hash(&self) -> u64;

	fn eq_view(&self, other: &dyn KeyView) -> bool {
		self.precomputed_hash() == other.precomputed_hash()
			&& self.capability() == other.capability()
			&& self.discriminators() == other.discriminators()
	}
}

impl KeyView for ServiceKey {
	fn capability(&self) -> TypeKey {
		self.capability
	}

	fn discriminators(&self) -> &[TypeKey] {
		&self.discriminators
	}

	fn precomputed_hash(&self) -> u64 {
		self.hash
	}
}

impl<'a> Borrow<dyn KeyView + 'a> for ServiceKey {
	fn borrow(&self) -> &(dyn KeyView + 'a) {
		self
	}
}

impl PartialEq for dyn KeyView + '_ {
	fn eq(&self, other: &Self) -> bool {
		self.eq_view(other)
	}
}

impl Eq for dyn KeyView + '_ {}

impl Hash for dyn KeyView + '_ {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_u64(self.precomputed_hash());
	}
}

/// Lookup key borrowing the caller's discriminators.
pub struct KeyRef<'a> {
	capability: TypeKey,
	discriminators: &'a [TypeKey],
	hash: u64,
}

impl<'a> KeyRef<'a> {
	pub fn new(capability: TypeKey, discriminators: &'a [TypeKey]) -> Self {
		Self {
			capability,
			discriminators,
			hash: key_hash(capability, discriminators),
		}
	}
}

impl KeyView for KeyRef<'_> {
	fn capability(&self) -> TypeKey {
		self.capability
	}

	fn discriminators(&self) -> &[TypeKey] {
		self.discriminators
	}

	fn precomputed_hash(&self) -> u64 {
		self.hash
	}
}

impl fmt::Debug for ServiceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServiceKey")
			.field("capability", &self.capability)
			.field("discriminators", &&*self.discriminators)
			.finish()
	}
}

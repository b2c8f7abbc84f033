// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Process-wide codec cache.
//!
//! [`Described::codec`](crate::Described::codec) implementations funnel
//! through [`register_codec`], so each concrete Rust type builds its codec
//! exactly once and every later caller shares the same [`Arc`]. The cache is
//! also what makes recursive types tractable: a type whose fields mention
//! itself registers an eager codec while its self-referential positions hold
//! a [`recursive_codec`] that resolves against the cache on first use.

use std::{
	any::{Any, TypeId, type_name},
	collections::{HashMap, HashSet},
	sync::Arc,
};

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{Mutex, RwLock};

use crate::{algebraic::AlgebraicType, codec::Codec};

static CODECS: Lazy<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>> =
	Lazy::new(|| RwLock::new(HashMap::new()));

static IN_PROGRESS: Lazy<Mutex<HashSet<TypeId>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Looks up the cached codec for `T` without building anything.
pub fn registered_codec<T: 'static>() -> Option<Arc<Codec<T>>> {
	CODECS.read().get(&TypeId::of::<T>()).and_then(|any| any.downcast_ref::<Arc<Codec<T>>>()).cloned()
}

/// Returns the shared codec for `T`, building it with `build` on the first
/// call.
///
/// `build` runs without any registry lock held, so it may freely register
/// codecs for other types. What it must not do is re-enter registration for
/// `T` itself: that means the type is recursive, and the self-referential
/// position has to be a [`recursive_codec`] instead of an eager child build.
pub fn register_codec<T: 'static>(build: impl FnOnce() -> Codec<T>) -> Arc<Codec<T>> {
	if let Some(codec) = registered_codec::<T>() {
		return codec;
	}

	let type_id = TypeId::of::<T>();
	{
		let mut in_progress = IN_PROGRESS.lock();
		if !in_progress.insert(type_id) {
			panic!(
				"codec for {} depends on itself; break the cycle with recursive_codec",
				type_name::<T>()
			);
		}
	}
	let guard = InProgressGuard(type_id);

	let codec = Arc::new(build());

	let mut codecs = CODECS.write();
	drop(guard);
	let entry = codecs.entry(type_id).or_insert_with(|| {
		tracing::debug!(ty = type_name::<T>(), "registered codec");
		Box::new(Arc::clone(&codec))
	});
	entry.downcast_ref::<Arc<Codec<T>>>().cloned().unwrap_or(codec)
}

struct InProgressGuard(TypeId);

impl Drop for InProgressGuard {
	fn drop(&mut self) {
		IN_PROGRESS.lock().remove(&self.0);
	}
}

/// A codec placeholder for self-referential positions inside a recursive
/// type's eager codec.
///
/// It carries the given descriptor (usually a [`TypeRef`] into a typespace)
/// and defers to the registered codec for `T`, resolved lazily on the first
/// encode or decode. Using it before `T` finishes registering is a
/// programmer error.
///
/// [`TypeRef`]: crate::TypeRef
pub fn recursive_codec<T: 'static>(algebraic_type: AlgebraicType) -> Codec<T> {
	let cell: Arc<OnceCell<Arc<Codec<T>>>> = Arc::new(OnceCell::new());
	let read_cell = Arc::clone(&cell);
	let write_cell = Arc::clone(&cell);
	Codec::new(
		algebraic_type,
		move |reader| resolve(&read_cell).read(reader),
		move |writer, value| resolve(&write_cell).write(writer, value),
	)
}

fn resolve<T: 'static>(cell: &OnceCell<Arc<Codec<T>>>) -> &Arc<Codec<T>> {
	cell.get_or_init(|| {
		registered_codec::<T>()
			.unwrap_or_else(|| panic!("recursive codec for {} used before registration completed", type_name::<T>()))
	})
}

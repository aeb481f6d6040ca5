use std::sync::{Arc, Mutex};

use crate::{Dict, Error, Result};

/// Default minimum buffer reservation for a fresh dictionary.
const MIN_SIZE: usize = 128;

/// Default extra headroom added whenever a buffer has to grow.
const EXTRA_SIZE: usize = 64;

/// Allocates dictionaries through a LIFO pool of reusable buffers, keeping
/// allocator traffic off the per-frame path.
///
/// Handles are cheap clones of the same pool. The pool is destroyed once the
/// last handle drops, which cannot happen before the last outstanding
/// [Dict]: every dictionary holds a handle back to its pool.
#[derive(Clone)]
pub struct DictPool {
	inner: Arc<Inner>,
}

struct Inner {
	depth: usize,
	min_size: usize,
	extra_size: usize,
	shells: Mutex<Vec<Vec<u8>>>,
}

impl DictPool {
	/// A pool keeping at most `depth` buffers around for reuse.
	pub fn new(depth: usize) -> Self {
		Self::with_sizes(depth, MIN_SIZE, EXTRA_SIZE)
	}

	/// Override the minimum reservation and the grow headroom.
	pub fn with_sizes(depth: usize, min_size: usize, extra_size: usize) -> Self {
		Self {
			inner: Arc::new(Inner {
				depth,
				min_size,
				extra_size,
				shells: Mutex::new(Vec::with_capacity(depth)),
			}),
		}
	}

	/// Pop a pooled buffer or allocate a fresh one, reserve at least
	/// `max(hint, min_size)` bytes, and seed it with the terminator.
	pub fn alloc(&self, hint: usize) -> Result<Dict> {
		let mut buf = self.inner.shells.lock().unwrap().pop().unwrap_or_default();
		if buf.try_reserve(hint.max(self.inner.min_size)).is_err() {
			// The shell itself is still good; keep it for the next caller.
			self.recycle(buf);
			return Err(Error::Alloc);
		}
		buf.push(0);
		Ok(Dict::from_parts(self.clone(), buf))
	}

	/// Drop every pooled buffer.
	pub fn vacuum(&self) {
		let mut shells = self.inner.shells.lock().unwrap();
		tracing::trace!(count = shells.len(), "vacuuming dictionary pool");
		shells.clear();
	}

	/// How many buffers are currently pooled.
	pub fn pooled(&self) -> usize {
		self.inner.shells.lock().unwrap().len()
	}

	pub(crate) fn extra_size(&self) -> usize {
		self.inner.extra_size
	}

	pub(crate) fn recycle(&self, mut buf: Vec<u8>) {
		let mut shells = self.inner.shells.lock().unwrap();
		if shells.len() < self.inner.depth {
			buf.clear();
			shells.push(buf);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_alloc_reserves_minimum() {
		let pool = DictPool::new(2);
		let dict = pool.alloc(0).unwrap();
		assert_eq!(dict.size(), 1);
	}

	#[test]
	fn test_shells_are_reused_lifo() {
		let pool = DictPool::new(2);
		let first = pool.alloc(0).unwrap();
		let second = pool.alloc(0).unwrap();
		assert_eq!(pool.pooled(), 0);

		drop(first);
		drop(second);
		assert_eq!(pool.pooled(), 2);

		let _again = pool.alloc(0).unwrap();
		assert_eq!(pool.pooled(), 1);
	}

	#[test]
	fn test_depth_bounds_the_pool() {
		let pool = DictPool::new(1);
		let first = pool.alloc(0).unwrap();
		let second = pool.alloc(0).unwrap();
		drop(first);
		drop(second);
		assert_eq!(pool.pooled(), 1);
	}

	#[test]
	fn test_vacuum_drains() {
		let pool = DictPool::new(4);
		drop(pool.alloc(0).unwrap());
		assert_eq!(pool.pooled(), 1);
		pool.vacuum();
		assert_eq!(pool.pooled(), 0);
	}
}

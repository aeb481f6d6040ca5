use std::collections::VecDeque;

use buf_list::BufList;
use bytes::{Buf, Bytes, BytesMut};
use uref::Uref;

/// Accumulates input carriers into one logical byte stream.
///
/// Payload chunks are queued in arrival order while each carrier's
/// attributes are retained, so the owner can recover timestamps and flags as
/// the stream front advances into a new buffer. Consumption is monotonic.
pub struct Accumulator {
	chunks: VecDeque<Bytes>,
	len: usize,
	/// The carrier whose payload is at the stream front.
	head: Option<Uref>,
	/// Bytes of the head's own payload still unconsumed.
	head_remaining: usize,
	queue: VecDeque<(Uref, usize)>,
}

impl Accumulator {
	pub fn new() -> Self {
		Self {
			chunks: VecDeque::new(),
			len: 0,
			head: None,
			head_remaining: 0,
			queue: VecDeque::new(),
		}
	}

	/// Total unconsumed bytes.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn head(&self) -> Option<&Uref> {
		self.head.as_ref()
	}

	pub fn head_mut(&mut self) -> Option<&mut Uref> {
		self.head.as_mut()
	}

	/// Enqueue a carrier's payload; returns true when it became the head.
	pub fn append(&mut self, mut uref: Uref) -> bool {
		let payload = uref.payload.take().unwrap_or_default();
		let size = payload.num_bytes();
		for chunk in &payload {
			if !chunk.is_empty() {
				self.chunks.push_back(chunk.clone());
			}
		}
		self.len += size;

		if self.head.is_none() || (self.head_remaining == 0 && self.queue.is_empty()) {
			self.head = Some(uref);
			self.head_remaining = size;
			true
		} else {
			self.queue.push_back((uref, size));
			false
		}
	}

	/// Drop the first `size` bytes. Each time the stream front crosses into
	/// a queued carrier, that carrier becomes the head and `on_promote`
	/// fires with it so the owner can refresh its pending timestamps.
	pub fn consume(&mut self, size: usize, mut on_promote: impl FnMut(&Uref)) {
		assert!(size <= self.len, "consuming past the end of the stream");
		self.len -= size;

		let mut left = size;
		while left > 0 {
			let chunk = self.chunks.front_mut().expect("chunk accounting");
			if chunk.len() <= left {
				left -= chunk.len();
				self.chunks.pop_front();
			} else {
				chunk.advance(left);
				left = 0;
			}
		}

		let mut left = size;
		loop {
			if self.head_remaining == 0 {
				match self.queue.pop_front() {
					Some((uref, len)) => {
						self.head = Some(uref);
						self.head_remaining = len;
						on_promote(self.head.as_ref().unwrap());
					}
					// The head is spent and nothing is queued behind it.
					None => break,
				}
				continue;
			}
			if left == 0 {
				break;
			}
			let take = left.min(self.head_remaining);
			self.head_remaining -= take;
			left -= take;
		}
	}

	/// Discard everything, attributes included.
	pub fn clear(&mut self) {
		self.chunks.clear();
		self.len = 0;
		self.head = None;
		self.head_remaining = 0;
		self.queue.clear();
	}

	pub fn byte_at(&self, offset: usize) -> Option<u8> {
		let (index, within) = self.locate(offset)?;
		Some(self.chunks[index][within])
	}

	/// Find the next occurrence of `pattern` at or after `offset`.
	pub fn find(&self, pattern: &[u8], offset: usize) -> Option<usize> {
		debug_assert!(!pattern.is_empty());
		let (mut index, mut within) = self.locate(offset)?;
		let mut at = offset;
		loop {
			let chunk = &self.chunks[index];
			match chunk[within..].iter().position(|&b| b == pattern[0]) {
				Some(hit) => {
					let start = at + hit;
					if start + pattern.len() > self.len {
						return None;
					}
					if self.matches(index, within + hit, pattern) {
						return Some(start);
					}
					at = start + 1;
					within += hit + 1;
					if within == chunk.len() {
						index += 1;
						within = 0;
					}
				}
				None => {
					at += chunk.len() - within;
					index += 1;
					within = 0;
					if index == self.chunks.len() {
						return None;
					}
				}
			}
		}
	}

	// Compare the stream against `pattern` starting inside chunk `index`.
	// The caller has checked the stream is long enough.
	fn matches(&self, mut index: usize, mut within: usize, pattern: &[u8]) -> bool {
		for &byte in pattern {
			while within == self.chunks[index].len() {
				index += 1;
				within = 0;
			}
			if self.chunks[index][within] != byte {
				return false;
			}
			within += 1;
		}
		true
	}

	/// Borrow `size` bytes at `offset` as one contiguous block, copying only
	/// when the range spans chunks.
	pub fn peek(&self, offset: usize, size: usize) -> Option<Bytes> {
		if size == 0 || offset + size > self.len {
			return None;
		}
		let (index, within) = self.locate(offset)?;
		let chunk = &self.chunks[index];
		if within + size <= chunk.len() {
			return Some(chunk.slice(within..within + size));
		}

		let mut copy = BytesMut::with_capacity(size);
		let mut index = index;
		let mut within = within;
		let mut left = size;
		while left > 0 {
			let chunk = &self.chunks[index];
			let take = left.min(chunk.len() - within);
			copy.extend_from_slice(&chunk[within..within + take]);
			left -= take;
			index += 1;
			within = 0;
		}
		Some(copy.freeze())
	}

	/// Slice out `size` bytes at `offset` without copying.
	pub fn extract(&self, offset: usize, size: usize) -> Option<BufList> {
		if offset + size > self.len {
			return None;
		}
		let mut list = BufList::new();
		if size == 0 {
			return Some(list);
		}
		let (mut index, mut within) = self.locate(offset)?;
		let mut left = size;
		while left > 0 {
			let chunk = &self.chunks[index];
			let take = left.min(chunk.len() - within);
			list.push_chunk(chunk.slice(within..within + take));
			left -= take;
			index += 1;
			within = 0;
		}
		Some(list)
	}

	fn locate(&self, offset: usize) -> Option<(usize, usize)> {
		if offset >= self.len {
			return None;
		}
		let mut skip = offset;
		for (index, chunk) in self.chunks.iter().enumerate() {
			if skip < chunk.len() {
				return Some((index, skip));
			}
			skip -= chunk.len();
		}
		None
	}
}

impl Default for Accumulator {
	fn default() -> Self {
		Self::new()
	}
}

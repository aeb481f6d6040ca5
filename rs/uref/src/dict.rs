use std::ops::Range;

use crate::{AttrType, DictPool, Error, Key, Rational, Result, Shorthand, SHORTHAND_BASE};

/// A typed key/value store packed into one contiguous buffer.
///
/// Records sit back to back, terminated by a single END byte, so a whole
/// dictionary can be copied, pooled, or transmitted as one block. Registered
/// attributes are stored under a one-byte shorthand code; everything else
/// carries its name inline:
///
/// ```text
/// long form            type | size_hi | size_lo | name NUL | value
/// shorthand, variable  code | size_hi | size_lo | value
/// shorthand, fixed     code | value
/// ```
///
/// Sizes fit in 16 bits and iteration follows insertion order. Those are
/// invariants, not error conditions: violating them is a bug in the caller
/// and asserts.
pub struct Dict {
	pool: DictPool,
	buf: Vec<u8>,
}

// One parsed record. The value range excludes the header and, for the long
// form, the inline name.
struct Record<'a> {
	offset: usize,
	key: Key<'a>,
	value: Range<usize>,
}

impl<'a> Record<'a> {
	fn end(&self) -> usize {
		self.value.end
	}
}

impl Dict {
	pub(crate) fn from_parts(pool: DictPool, buf: Vec<u8>) -> Self {
		debug_assert_eq!(buf.as_slice(), &[0]);
		Self { pool, buf }
	}

	/// Used length of the backing buffer, terminator included.
	pub fn size(&self) -> usize {
		self.buf.len()
	}

	/// The pool this dictionary returns to.
	pub fn pool(&self) -> &DictPool {
		&self.pool
	}

	/// Copy this dictionary into a fresh one from the same pool.
	pub fn dup(&self) -> Result<Self> {
		let mut copy = self.pool.alloc(self.buf.len())?;
		copy.buf.clear();
		copy.buf.extend_from_slice(&self.buf);
		Ok(copy)
	}

	/// Fetch the value bytes of an attribute.
	///
	/// STRING values are returned up to and including their first NUL, so a
	/// value shrunk in place reads back at its shrunk size.
	pub fn get(&self, key: Key) -> Result<&[u8]> {
		let record = self.find_record(key)?.ok_or(Error::NotFound)?;
		let mut value = &self.buf[record.value];
		if key.base() == AttrType::String {
			if let Some(nul) = value.iter().position(|&b| b == 0) {
				value = &value[..nul + 1];
			}
		}
		Ok(value)
	}

	/// Insert or overwrite an attribute, copying `value` into the buffer.
	///
	/// A record with an identical storage footprint is rewritten in place and
	/// a shorter STRING shrinks in place with a zeroed tail, both preserving
	/// the record's position. Anything else is deleted and re-appended.
	/// Capacity is ensured before any mutation, so a failed grow leaves the
	/// dictionary untouched.
	pub fn set(&mut self, key: Key, value: &[u8]) -> Result<()> {
		let base = key.base();
		assert_ne!(base, AttrType::End, "cannot store the terminator type");
		if let Some(size) = base.fixed_size() {
			assert_eq!(value.len(), size, "fixed-size value length mismatch");
		}
		let record_len = match key {
			Key::Short(short) => match short.base().fixed_size() {
				Some(size) => 1 + size,
				None => {
					assert!(value.len() <= u16::MAX as usize, "attribute size exceeds 16 bits");
					3 + value.len()
				}
			},
			Key::Named { name, .. } => {
				assert!(!name.contains('\0'), "attribute names cannot contain NUL");
				assert!(name.len() + 1 + value.len() <= u16::MAX as usize, "attribute size exceeds 16 bits");
				3 + name.len() + 1 + value.len()
			}
		};

		let existing = self.find_record(key)?.map(|record| record.value);
		if let Some(slot) = existing.clone() {
			if slot.len() == value.len() {
				self.buf[slot.start..slot.start + value.len()].copy_from_slice(value);
				return Ok(());
			}
			if base == AttrType::String && slot.len() > value.len() {
				self.buf[slot.start..slot.start + value.len()].copy_from_slice(value);
				self.buf[slot.start + value.len()..slot.end].fill(0);
				return Ok(());
			}
		}

		// Grow before touching anything: a failed reservation must leave the
		// dictionary in its prior state.
		if self.buf.len() + record_len > self.buf.capacity() {
			self.buf
				.try_reserve(record_len + self.pool.extra_size())
				.map_err(|_| Error::Alloc)?;
		}

		if existing.is_some() {
			self.delete(key);
		}

		// Append over the terminator and re-seed it.
		let terminator = self.buf.pop();
		debug_assert_eq!(terminator, Some(0));
		match key {
			Key::Short(short) => {
				self.buf.push(u8::from(short));
				if short.base().fixed_size().is_none() {
					self.buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
				}
			}
			Key::Named { name, ty } => {
				self.buf.push(u8::from(ty));
				let size = (name.len() + 1 + value.len()) as u16;
				self.buf.extend_from_slice(&size.to_be_bytes());
				self.buf.extend_from_slice(name.as_bytes());
				self.buf.push(0);
			}
		}
		self.buf.extend_from_slice(value);
		self.buf.push(0);
		Ok(())
	}

	/// Remove an attribute, shifting the buffer tail down over it.
	pub fn delete(&mut self, key: Key) -> bool {
		let range = match self.find_record(key) {
			Ok(Some(record)) => record.offset..record.end(),
			_ => return false,
		};
		self.buf.drain(range);
		true
	}

	/// Visit every attribute in insertion order, as (key, stored bytes).
	pub fn iter(&self) -> Iter<'_> {
		Iter { dict: self, offset: 0 }
	}

	/// The wire cursor behind the `Iterate` command: pass the previously
	/// returned key to step to the next record, `None` to start; `None`
	/// comes back once the records are exhausted.
	pub fn next_key(&self, prev: Option<Key>) -> Result<Option<Key<'_>>> {
		let offset = match prev {
			None => 0,
			Some(key) => self.find_record(key)?.ok_or(Error::NotFound)?.end(),
		};
		Ok(self.record_at(offset)?.map(|record| record.key))
	}

	fn find_record(&self, key: Key) -> Result<Option<Record<'_>>> {
		let mut offset = 0;
		while let Some(record) = self.record_at(offset)? {
			if record.key == key {
				return Ok(Some(record));
			}
			offset = record.end();
		}
		Ok(None)
	}

	// Decode the record starting at `offset`, or None at the terminator.
	fn record_at(&self, offset: usize) -> Result<Option<Record<'_>>> {
		let code = self.buf[offset];
		if code == u8::from(AttrType::End) {
			assert_eq!(offset + 1, self.buf.len(), "terminator inside the used prefix");
			return Ok(None);
		}

		if code > SHORTHAND_BASE {
			let short = Shorthand::from_code(code)?;
			let value = match short.base().fixed_size() {
				Some(size) => offset + 1..offset + 1 + size,
				None => offset + 3..offset + 3 + self.stored_size(offset),
			};
			assert!(value.end < self.buf.len(), "record runs past the terminator");
			return Ok(Some(Record {
				offset,
				key: Key::Short(short),
				value,
			}));
		}

		let ty = AttrType::try_from(code).map_err(|_| Error::Malformed)?;
		let name_start = offset + 3;
		let end = name_start + self.stored_size(offset);
		assert!(end < self.buf.len(), "record runs past the terminator");
		let nul = self.buf[name_start..end]
			.iter()
			.position(|&b| b == 0)
			.ok_or(Error::Malformed)?;
		let name = std::str::from_utf8(&self.buf[name_start..name_start + nul]).map_err(|_| Error::Malformed)?;
		Ok(Some(Record {
			offset,
			key: Key::Named { name, ty },
			value: name_start + nul + 1..end,
		}))
	}

	fn stored_size(&self, offset: usize) -> usize {
		(self.buf[offset + 1] as usize) << 8 | self.buf[offset + 2] as usize
	}
}

impl Drop for Dict {
	fn drop(&mut self) {
		self.pool.recycle(std::mem::take(&mut self.buf));
	}
}

impl std::fmt::Debug for Dict {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut map = f.debug_map();
		for (key, value) in self.iter() {
			map.entry(&key.name(), &format_args!("{:02x?}", value));
		}
		map.finish()
	}
}

/// Insertion-order iterator over a dictionary's records.
pub struct Iter<'a> {
	dict: &'a Dict,
	offset: usize,
}

impl<'a> Iterator for Iter<'a> {
	type Item = (Key<'a>, &'a [u8]);

	fn next(&mut self) -> Option<Self::Item> {
		let record = self.dict.record_at(self.offset).ok()??;
		self.offset = record.end();
		Some((record.key, &self.dict.buf[record.value]))
	}
}

// Typed accessors over the raw byte interface. Each setter copies its value
// in the base type's wire encoding; each getter decodes it back.
impl Dict {
	/// Store a presence flag.
	pub fn set_void(&mut self, key: Key) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::Void);
		self.set(key, &[])
	}

	/// Succeeds when the flag is present.
	pub fn get_void(&self, key: Key) -> Result<()> {
		self.get(key).map(|_| ())
	}

	pub fn set_bool(&mut self, key: Key, value: bool) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::Bool);
		self.set(key, &[value as u8])
	}

	pub fn get_bool(&self, key: Key) -> Result<bool> {
		Ok(self.get(key)?[0] != 0)
	}

	pub fn set_small_unsigned(&mut self, key: Key, value: u8) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::SmallUnsigned);
		self.set(key, &[value])
	}

	pub fn get_small_unsigned(&self, key: Key) -> Result<u8> {
		Ok(self.get(key)?[0])
	}

	pub fn set_small_int(&mut self, key: Key, value: i8) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::SmallInt);
		self.set(key, &[value as u8])
	}

	pub fn get_small_int(&self, key: Key) -> Result<i8> {
		Ok(self.get(key)?[0] as i8)
	}

	pub fn set_unsigned(&mut self, key: Key, value: u64) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::Unsigned);
		self.set(key, &value.to_be_bytes())
	}

	pub fn get_unsigned(&self, key: Key) -> Result<u64> {
		let bytes: [u8; 8] = self.get(key)?.try_into().map_err(|_| Error::Malformed)?;
		Ok(u64::from_be_bytes(bytes))
	}

	pub fn set_int(&mut self, key: Key, value: i64) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::Int);
		self.set(key, &value.to_be_bytes())
	}

	pub fn get_int(&self, key: Key) -> Result<i64> {
		let bytes: [u8; 8] = self.get(key)?.try_into().map_err(|_| Error::Malformed)?;
		Ok(i64::from_be_bytes(bytes))
	}

	pub fn set_float(&mut self, key: Key, value: f64) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::Float);
		self.set(key, &value.to_be_bytes())
	}

	pub fn get_float(&self, key: Key) -> Result<f64> {
		let bytes: [u8; 8] = self.get(key)?.try_into().map_err(|_| Error::Malformed)?;
		Ok(f64::from_be_bytes(bytes))
	}

	pub fn set_rational(&mut self, key: Key, value: Rational) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::Rational);
		self.set(key, &value.to_bytes())
	}

	pub fn get_rational(&self, key: Key) -> Result<Rational> {
		let value = self.get(key)?;
		if value.len() != 16 {
			return Err(Error::Malformed);
		}
		Ok(Rational::from_bytes(value))
	}

	/// Store a string together with its terminating NUL.
	pub fn set_string(&mut self, key: Key, value: &str) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::String);
		assert!(!value.contains('\0'), "strings cannot contain NUL");
		let mut bytes = Vec::with_capacity(value.len() + 1);
		bytes.extend_from_slice(value.as_bytes());
		bytes.push(0);
		self.set(key, &bytes)
	}

	pub fn get_string(&self, key: Key) -> Result<&str> {
		let value = self.get(key)?;
		let value = value.strip_suffix(&[0]).ok_or(Error::Malformed)?;
		std::str::from_utf8(value).map_err(|_| Error::Malformed)
	}

	pub fn set_opaque(&mut self, key: Key, value: &[u8]) -> Result<()> {
		debug_assert_eq!(key.base(), AttrType::Opaque);
		self.set(key, value)
	}

	pub fn get_opaque(&self, key: Key) -> Result<&[u8]> {
		self.get(key)
	}
}

/// A dictionary command: the typed replacement for a variadic control call.
#[derive(Debug)]
pub enum Request<'a> {
	Dup,
	Iterate { prev: Option<Key<'a>> },
	Get { key: Key<'a> },
	Set { key: Key<'a>, value: &'a [u8] },
	Delete { key: Key<'a> },
	Name { code: u8 },
}

/// The answer to a [Request].
#[derive(Debug)]
pub enum Reply<'d> {
	Dup(Dict),
	Iterate(Option<Key<'d>>),
	Value(&'d [u8]),
	Set,
	Delete(bool),
	Name { name: &'static str, base: AttrType },
}

impl Dict {
	/// Dispatch a command against this dictionary.
	pub fn control<'d>(&'d mut self, request: Request<'_>) -> Result<Reply<'d>> {
		match request {
			Request::Dup => Ok(Reply::Dup(self.dup()?)),
			Request::Iterate { prev } => Ok(Reply::Iterate(self.next_key(prev)?)),
			Request::Get { key } => Ok(Reply::Value(self.get(key)?)),
			Request::Set { key, value } => {
				self.set(key, value)?;
				Ok(Reply::Set)
			}
			Request::Delete { key } => Ok(Reply::Delete(self.delete(key))),
			Request::Name { code } => {
				let short = Shorthand::from_code(code)?;
				Ok(Reply::Name {
					name: short.name(),
					base: short.base(),
				})
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dict() -> Dict {
		DictPool::new(0).alloc(0).unwrap()
	}

	fn key(name: &str, ty: AttrType) -> Key<'_> {
		Key::new(name, ty)
	}

	#[test]
	fn test_shorthand_set_get_delete() {
		let mut dict = dict();
		let pts = key("k.pts", AttrType::Unsigned);

		dict.set_unsigned(pts, 9000).unwrap();
		assert_eq!(dict.get(pts).unwrap(), 9000u64.to_be_bytes());
		assert_eq!(dict.get_unsigned(pts).unwrap(), 9000);
		// code + 8 value bytes + terminator
		assert_eq!(dict.size(), 10);

		assert!(dict.delete(pts));
		assert_eq!(dict.get(pts), Err(Error::NotFound));
		assert_eq!(dict.size(), 1);
		assert!(!dict.delete(pts));
	}

	#[test]
	fn test_long_form_set_get() {
		let mut dict = dict();
		let custom = key("x.custom", AttrType::Unsigned);
		assert!(matches!(custom, Key::Named { .. }));

		dict.set_unsigned(custom, 42).unwrap();
		assert_eq!(dict.get_unsigned(custom).unwrap(), 42);
		// header + "x.custom\0" + 8 value bytes + terminator
		assert_eq!(dict.size(), 3 + 9 + 8 + 1);
	}

	#[test]
	fn test_string_shrinks_in_place() {
		let mut dict = dict();
		let def = key("f.def", AttrType::String);

		dict.set_string(def, "block").unwrap();
		let size = dict.size();
		assert_eq!(dict.get(def).unwrap(), b"block\0");

		dict.set_string(def, "blo").unwrap();
		// The record keeps its footprint, the value reads back shorter and
		// the freed tail is zeroed.
		assert_eq!(dict.size(), size);
		assert_eq!(dict.get(def).unwrap(), b"blo\0");
		assert_eq!(dict.get_string(def).unwrap(), "blo");
		let (_, stored) = dict.iter().next().unwrap();
		assert_eq!(stored, b"blo\0\0\0");
	}

	#[test]
	fn test_string_regrow_after_shrink() {
		let mut dict = dict();
		let def = key("f.def", AttrType::String);

		dict.set_string(def, "block").unwrap();
		dict.set_string(def, "blo").unwrap();
		// Identical footprint again: rewritten in place.
		let size = dict.size();
		dict.set_string(def, "block").unwrap();
		assert_eq!(dict.size(), size);
		assert_eq!(dict.get_string(def).unwrap(), "block");
	}

	#[test]
	fn test_overwrite_fixed_in_place() {
		let mut dict = dict();
		let pts = key("k.pts", AttrType::Unsigned);
		dict.set_unsigned(pts, 1).unwrap();
		let size = dict.size();
		dict.set_unsigned(pts, 2).unwrap();
		assert_eq!(dict.size(), size);
		assert_eq!(dict.get_unsigned(pts).unwrap(), 2);
	}

	#[test]
	fn test_iterates_in_insertion_order() {
		let mut dict = dict();
		dict.set_unsigned(key("p.hsize", AttrType::Unsigned), 1920).unwrap();
		dict.set_void(key("f.disc", AttrType::Void)).unwrap();
		dict.set_string(key("x.name", AttrType::String), "value").unwrap();

		let names: Vec<_> = dict.iter().map(|(key, _)| key.name().to_string()).collect();
		assert_eq!(names, ["p.hsize", "f.disc", "x.name"]);
	}

	#[test]
	fn test_cursor_walks_and_terminates() {
		let mut dict = dict();
		dict.set_unsigned(key("p.hsize", AttrType::Unsigned), 1920).unwrap();
		dict.set_unsigned(key("p.vsize", AttrType::Unsigned), 1080).unwrap();

		let first = dict.next_key(None).unwrap().unwrap();
		assert_eq!(first.name(), "p.hsize");
		let second = dict.next_key(Some(first)).unwrap().unwrap();
		assert_eq!(second.name(), "p.vsize");
		assert_eq!(dict.next_key(Some(second)).unwrap(), None);
	}

	#[test]
	fn test_delete_shifts_tail() {
		let mut dict = dict();
		dict.set_unsigned(key("p.hsize", AttrType::Unsigned), 1920).unwrap();
		dict.set_unsigned(key("p.vsize", AttrType::Unsigned), 1080).unwrap();
		dict.set_void(key("f.random", AttrType::Void)).unwrap();

		assert!(dict.delete(key("p.vsize", AttrType::Unsigned)));

		let names: Vec<_> = dict.iter().map(|(key, _)| key.name().to_string()).collect();
		assert_eq!(names, ["p.hsize", "f.random"]);
		assert_eq!(dict.get_unsigned(key("p.hsize", AttrType::Unsigned)).unwrap(), 1920);
		assert_eq!(dict.get_void(key("f.random", AttrType::Void)), Ok(()));
	}

	#[test]
	fn test_dup_preserves_order_and_values() {
		let mut dict = dict();
		dict.set_unsigned(key("p.hsize", AttrType::Unsigned), 1920).unwrap();
		dict.set_unsigned(key("p.vsize", AttrType::Unsigned), 1080).unwrap();
		dict.set_rational(key("p.aspect", AttrType::Rational), Rational::new(16, 9))
			.unwrap();

		let copy = dict.dup().unwrap();
		assert_eq!(copy.size(), dict.size());
		let original: Vec<_> = dict.iter().map(|(key, value)| (key.name().to_string(), value.to_vec())).collect();
		let duplicated: Vec<_> = copy.iter().map(|(key, value)| (key.name().to_string(), value.to_vec())).collect();
		assert_eq!(original, duplicated);
		assert_eq!(
			copy.get_rational(key("p.aspect", AttrType::Rational)).unwrap(),
			Rational::new(16, 9)
		);
	}

	#[test]
	fn test_growth_keeps_headroom() {
		let pool = DictPool::with_sizes(0, 4, 16);
		let mut dict = pool.alloc(0).unwrap();
		let value = [0xabu8; 64];
		dict.set_opaque(key("x.blob", AttrType::Opaque), &value).unwrap();
		assert_eq!(dict.get_opaque(key("x.blob", AttrType::Opaque)).unwrap(), value);
		// Growth reserved the record plus the configured headroom.
		assert!(dict.buf.capacity() >= dict.buf.len() + 16);
	}

	#[test]
	fn test_typed_roundtrips() {
		let mut dict = dict();
		dict.set_bool(key("x.bool", AttrType::Bool), true).unwrap();
		dict.set_small_unsigned(key("x.su", AttrType::SmallUnsigned), 0xfe).unwrap();
		dict.set_small_int(key("x.si", AttrType::SmallInt), -3).unwrap();
		dict.set_int(key("x.int", AttrType::Int), -1_000_000).unwrap();
		dict.set_float(key("x.float", AttrType::Float), 0.5).unwrap();

		assert!(dict.get_bool(key("x.bool", AttrType::Bool)).unwrap());
		assert_eq!(dict.get_small_unsigned(key("x.su", AttrType::SmallUnsigned)).unwrap(), 0xfe);
		assert_eq!(dict.get_small_int(key("x.si", AttrType::SmallInt)).unwrap(), -3);
		assert_eq!(dict.get_int(key("x.int", AttrType::Int)).unwrap(), -1_000_000);
		assert_eq!(dict.get_float(key("x.float", AttrType::Float)).unwrap(), 0.5);
	}

	#[test]
	fn test_control_dispatch() {
		let mut dict = dict();
		let pts = key("k.pts", AttrType::Unsigned);

		assert!(matches!(
			dict.control(Request::Set {
				key: pts,
				value: &9000u64.to_be_bytes()
			}),
			Ok(Reply::Set)
		));
		match dict.control(Request::Get { key: pts }) {
			Ok(Reply::Value(value)) => assert_eq!(value, 9000u64.to_be_bytes()),
			other => panic!("unexpected reply: {:?}", other),
		}
		match dict.control(Request::Name {
			code: u8::from(Shorthand::ClockPts),
		}) {
			Ok(Reply::Name { name, base }) => {
				assert_eq!(name, "k.pts");
				assert_eq!(base, AttrType::Unsigned);
			}
			other => panic!("unexpected reply: {:?}", other),
		}
		assert!(matches!(
			dict.control(Request::Name { code: 0x02 }),
			Err(Error::UnknownShorthand(0x02))
		));
		assert!(matches!(dict.control(Request::Delete { key: pts }), Ok(Reply::Delete(true))));
		assert!(matches!(dict.control(Request::Get { key: pts }), Err(Error::NotFound)));
	}
}

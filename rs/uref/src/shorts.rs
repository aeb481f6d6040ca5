use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{AttrType, Error, Result, SHORTHAND_BASE};

/// Well-known attributes, identified on the wire by a one-byte code.
///
/// The code assignments and their order are part of the wire contract: every
/// serializer and deserializer must agree on the same mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Shorthand {
	FlowDiscontinuity = 0x11,
	FlowRandom = 0x12,
	FlowError = 0x13,
	FlowDef = 0x14,
	FlowRawDef = 0x15,
	FlowProgram = 0x16,
	FlowLang = 0x17,
	ClockSystime = 0x18,
	ClockSystimeRap = 0x19,
	ClockPts = 0x1a,
	ClockPtsOrig = 0x1b,
	ClockPtsSys = 0x1c,
	ClockDts = 0x1d,
	ClockDtsOrig = 0x1e,
	ClockDtsSys = 0x1f,
	ClockVbvDelay = 0x20,
	ClockDuration = 0x21,
	BlockStart = 0x22,
	BlockEnd = 0x23,
	PicNum = 0x24,
	PicHSize = 0x25,
	PicVSize = 0x26,
	PicHSizeVisible = 0x27,
	PicVSizeVisible = 0x28,
	PicHPosition = 0x29,
	PicVPosition = 0x2a,
	PicAspect = 0x2b,
	PicProgressive = 0x2c,
	PicTopField = 0x2d,
	PicBottomField = 0x2e,
	PicTopFieldFirst = 0x2f,
}

// Registry entries in code order: `SHORTHAND_BASE + 1 + i` names entry `i`.
const TABLE: &[(&str, AttrType)] = &[
	("f.disc", AttrType::Void),
	("f.random", AttrType::Void),
	("f.error", AttrType::Void),
	("f.def", AttrType::String),
	("f.rawdef", AttrType::String),
	("f.program", AttrType::String),
	("f.lang", AttrType::String),
	("k.systime", AttrType::Unsigned),
	("k.systime.rap", AttrType::Unsigned),
	("k.pts", AttrType::Unsigned),
	("k.pts.orig", AttrType::Unsigned),
	("k.pts.sys", AttrType::Unsigned),
	("k.dts", AttrType::Unsigned),
	("k.dts.orig", AttrType::Unsigned),
	("k.dts.sys", AttrType::Unsigned),
	("k.vbvdelay", AttrType::Unsigned),
	("k.duration", AttrType::Unsigned),
	("b.start", AttrType::Void),
	("b.end", AttrType::Void),
	("p.num", AttrType::Unsigned),
	("p.hsize", AttrType::Unsigned),
	("p.vsize", AttrType::Unsigned),
	("p.hsizevis", AttrType::Unsigned),
	("p.vsizevis", AttrType::Unsigned),
	("p.hposition", AttrType::Unsigned),
	("p.vposition", AttrType::Unsigned),
	("p.aspect", AttrType::Rational),
	("p.progressive", AttrType::Void),
	("p.tf", AttrType::Void),
	("p.bf", AttrType::Void),
	("p.tff", AttrType::Void),
];

impl Shorthand {
	/// Decode a wire code, rejecting anything outside the registry.
	pub fn from_code(code: u8) -> Result<Self> {
		if code <= SHORTHAND_BASE {
			return Err(Error::UnknownShorthand(code));
		}
		Self::try_from(code).map_err(|_| Error::UnknownShorthand(code))
	}

	/// The code for a well-known (name, type) pair, if one is registered.
	pub fn lookup(name: &str, ty: AttrType) -> Option<Self> {
		let index = TABLE.iter().position(|&(n, t)| n == name && t == ty)?;
		Self::try_from(SHORTHAND_BASE + 1 + index as u8).ok()
	}

	/// The attribute name this code stands for.
	pub fn name(self) -> &'static str {
		TABLE[self.index()].0
	}

	/// The base type of the attribute value.
	pub fn base(self) -> AttrType {
		TABLE[self.index()].1
	}

	fn index(self) -> usize {
		(u8::from(self) - SHORTHAND_BASE - 1) as usize
	}
}

/// Addresses one attribute: a registered shorthand, or an explicit
/// (name, type) pair stored in long form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
	Short(Shorthand),
	Named { name: &'a str, ty: AttrType },
}

impl<'a> Key<'a> {
	/// Address an attribute by name, resolving to the shorthand encoding
	/// whenever the pair is registered.
	pub fn new(name: &'a str, ty: AttrType) -> Self {
		match Shorthand::lookup(name, ty) {
			Some(short) => Self::Short(short),
			None => Self::Named { name, ty },
		}
	}

	pub fn name(&self) -> &'a str {
		match self {
			Self::Short(short) => short.name(),
			Self::Named { name, .. } => name,
		}
	}

	/// The base type of the value bytes.
	pub fn base(&self) -> AttrType {
		match self {
			Self::Short(short) => short.base(),
			Self::Named { ty, .. } => *ty,
		}
	}
}

impl From<Shorthand> for Key<'static> {
	fn from(short: Shorthand) -> Self {
		Self::Short(short)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registry_covers_every_code() {
		for (index, &(name, ty)) in TABLE.iter().enumerate() {
			let code = SHORTHAND_BASE + 1 + index as u8;
			let short = Shorthand::from_code(code).unwrap();
			assert_eq!(short.name(), name);
			assert_eq!(short.base(), ty);
			assert_eq!(Shorthand::lookup(name, ty), Some(short));
		}
	}

	#[test]
	fn test_out_of_range_codes_rejected() {
		assert_eq!(Shorthand::from_code(0), Err(Error::UnknownShorthand(0)));
		assert_eq!(
			Shorthand::from_code(SHORTHAND_BASE),
			Err(Error::UnknownShorthand(SHORTHAND_BASE))
		);
		let past = SHORTHAND_BASE + 1 + TABLE.len() as u8;
		assert_eq!(Shorthand::from_code(past), Err(Error::UnknownShorthand(past)));
	}

	#[test]
	fn test_key_resolves_shorthand() {
		assert_eq!(
			Key::new("k.pts", AttrType::Unsigned),
			Key::Short(Shorthand::ClockPts)
		);
		// Same name under a different type is not the registered attribute.
		assert_eq!(
			Key::new("k.pts", AttrType::String),
			Key::Named {
				name: "k.pts",
				ty: AttrType::String
			}
		);
		assert_eq!(Key::new("k.pts", AttrType::Unsigned).name(), "k.pts");
		assert_eq!(Key::new("k.pts", AttrType::Unsigned).base(), AttrType::Unsigned);
	}

	#[test]
	fn test_wire_codes_are_stable() {
		// Spot checks pinning the wire contract.
		assert_eq!(u8::from(Shorthand::FlowDiscontinuity), 0x11);
		assert_eq!(u8::from(Shorthand::ClockPts), 0x1a);
		assert_eq!(u8::from(Shorthand::PicTopFieldFirst), 0x2f);
		assert_eq!(TABLE.len(), 31);
	}
}

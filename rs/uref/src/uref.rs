use buf_list::BufList;

use crate::{Dict, Rational, Result, Shorthand};

/// A frame reference: an attribute dictionary paired with an opaque payload.
///
/// The payload is a list of ref-counted chunks, so slicing or duplicating a
/// carrier never copies media bytes. Carriers without a payload describe
/// flows rather than data.
pub struct Uref {
	pub attrs: Dict,
	pub payload: Option<BufList>,
}

impl Uref {
	pub fn new(attrs: Dict) -> Self {
		Self { attrs, payload: None }
	}

	pub fn with_payload(attrs: Dict, payload: BufList) -> Self {
		Self {
			attrs,
			payload: Some(payload),
		}
	}

	/// Copy the attributes and share the payload chunks.
	pub fn dup(&self) -> Result<Self> {
		let payload = self.payload.as_ref().map(|chunks| {
			let mut copy = BufList::new();
			for chunk in chunks {
				copy.push_chunk(chunk.clone());
			}
			copy
		});
		Ok(Self {
			attrs: self.attrs.dup()?,
			payload,
		})
	}
}

// Clock accessors: timestamps in CLOCK_FREQ ticks, each in three variants
// (as coded, stream clock, system clock).
impl Uref {
	pub fn pts(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockPts.into()).ok()
	}

	pub fn set_pts(&mut self, pts: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockPts.into(), pts)
	}

	pub fn pts_orig(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockPtsOrig.into()).ok()
	}

	pub fn set_pts_orig(&mut self, pts: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockPtsOrig.into(), pts)
	}

	pub fn pts_sys(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockPtsSys.into()).ok()
	}

	pub fn set_pts_sys(&mut self, pts: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockPtsSys.into(), pts)
	}

	pub fn dts(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockDts.into()).ok()
	}

	pub fn set_dts(&mut self, dts: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockDts.into(), dts)
	}

	pub fn dts_orig(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockDtsOrig.into()).ok()
	}

	pub fn set_dts_orig(&mut self, dts: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockDtsOrig.into(), dts)
	}

	pub fn dts_sys(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockDtsSys.into()).ok()
	}

	pub fn set_dts_sys(&mut self, dts: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockDtsSys.into(), dts)
	}

	/// Arrival time of the first byte, in system clock ticks.
	pub fn systime(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockSystime.into()).ok()
	}

	pub fn set_systime(&mut self, systime: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockSystime.into(), systime)
	}

	/// Arrival time of the last random access point.
	pub fn systime_rap(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockSystimeRap.into()).ok()
	}

	pub fn set_systime_rap(&mut self, systime: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockSystimeRap.into(), systime)
	}

	pub fn duration(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockDuration.into()).ok()
	}

	pub fn set_duration(&mut self, duration: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockDuration.into(), duration)
	}

	pub fn vbv_delay(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::ClockVbvDelay.into()).ok()
	}

	pub fn set_vbv_delay(&mut self, delay: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::ClockVbvDelay.into(), delay)
	}

	/// Remove every timestamp attribute.
	pub fn clear_dates(&mut self) {
		for short in [
			Shorthand::ClockPts,
			Shorthand::ClockPtsOrig,
			Shorthand::ClockPtsSys,
			Shorthand::ClockDts,
			Shorthand::ClockDtsOrig,
			Shorthand::ClockDtsSys,
		] {
			self.attrs.delete(short.into());
		}
	}
}

// Flow accessors.
impl Uref {
	/// The flow definition string, when this carrier describes a flow.
	pub fn flow_def(&self) -> Option<&str> {
		self.attrs.get_string(Shorthand::FlowDef.into()).ok()
	}

	pub fn set_flow_def(&mut self, def: &str) -> Result<()> {
		self.attrs.set_string(Shorthand::FlowDef.into(), def)
	}

	/// Set when this buffer does not follow the previous one seamlessly.
	pub fn is_discontinuity(&self) -> bool {
		self.attrs.get_void(Shorthand::FlowDiscontinuity.into()).is_ok()
	}

	pub fn set_discontinuity(&mut self) -> Result<()> {
		self.attrs.set_void(Shorthand::FlowDiscontinuity.into())
	}

	pub fn clear_discontinuity(&mut self) {
		self.attrs.delete(Shorthand::FlowDiscontinuity.into());
	}

	/// Set on frames decoding can start from.
	pub fn is_random(&self) -> bool {
		self.attrs.get_void(Shorthand::FlowRandom.into()).is_ok()
	}

	pub fn set_random(&mut self) -> Result<()> {
		self.attrs.set_void(Shorthand::FlowRandom.into())
	}

	/// Set on frames known to carry damaged bytes.
	pub fn is_error(&self) -> bool {
		self.attrs.get_void(Shorthand::FlowError.into()).is_ok()
	}

	pub fn set_error(&mut self) -> Result<()> {
		self.attrs.set_void(Shorthand::FlowError.into())
	}
}

// Picture accessors, used on frames and on video flow definitions.
impl Uref {
	pub fn pic_num(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::PicNum.into()).ok()
	}

	pub fn set_pic_num(&mut self, num: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::PicNum.into(), num)
	}

	pub fn hsize(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::PicHSize.into()).ok()
	}

	pub fn set_hsize(&mut self, hsize: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::PicHSize.into(), hsize)
	}

	pub fn vsize(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::PicVSize.into()).ok()
	}

	pub fn set_vsize(&mut self, vsize: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::PicVSize.into(), vsize)
	}

	pub fn hsize_visible(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::PicHSizeVisible.into()).ok()
	}

	pub fn set_hsize_visible(&mut self, hsize: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::PicHSizeVisible.into(), hsize)
	}

	pub fn vsize_visible(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::PicVSizeVisible.into()).ok()
	}

	pub fn set_vsize_visible(&mut self, vsize: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::PicVSizeVisible.into(), vsize)
	}

	pub fn hposition(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::PicHPosition.into()).ok()
	}

	pub fn set_hposition(&mut self, position: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::PicHPosition.into(), position)
	}

	pub fn vposition(&self) -> Option<u64> {
		self.attrs.get_unsigned(Shorthand::PicVPosition.into()).ok()
	}

	pub fn set_vposition(&mut self, position: u64) -> Result<()> {
		self.attrs.set_unsigned(Shorthand::PicVPosition.into(), position)
	}

	/// Pixel aspect ratio.
	pub fn aspect(&self) -> Option<Rational> {
		self.attrs.get_rational(Shorthand::PicAspect.into()).ok()
	}

	pub fn set_aspect(&mut self, aspect: Rational) -> Result<()> {
		self.attrs.set_rational(Shorthand::PicAspect.into(), aspect)
	}

	pub fn is_progressive(&self) -> bool {
		self.attrs.get_void(Shorthand::PicProgressive.into()).is_ok()
	}

	pub fn set_progressive(&mut self) -> Result<()> {
		self.attrs.set_void(Shorthand::PicProgressive.into())
	}

	pub fn has_top_field(&self) -> bool {
		self.attrs.get_void(Shorthand::PicTopField.into()).is_ok()
	}

	pub fn set_top_field(&mut self) -> Result<()> {
		self.attrs.set_void(Shorthand::PicTopField.into())
	}

	pub fn has_bottom_field(&self) -> bool {
		self.attrs.get_void(Shorthand::PicBottomField.into()).is_ok()
	}

	pub fn set_bottom_field(&mut self) -> Result<()> {
		self.attrs.set_void(Shorthand::PicBottomField.into())
	}

	pub fn is_top_field_first(&self) -> bool {
		self.attrs.get_void(Shorthand::PicTopFieldFirst.into()).is_ok()
	}

	pub fn set_top_field_first(&mut self) -> Result<()> {
		self.attrs.set_void(Shorthand::PicTopFieldFirst.into())
	}
}

impl std::fmt::Debug for Uref {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Uref")
			.field("attrs", &self.attrs)
			.field(
				"payload",
				&self.payload.as_ref().map(|chunks| chunks.num_bytes()),
			)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use bytes::Bytes;

	use super::*;
	use crate::DictPool;

	fn uref() -> Uref {
		Uref::new(DictPool::new(0).alloc(0).unwrap())
	}

	#[test]
	fn test_clock_roundtrip() {
		let mut uref = uref();
		assert_eq!(uref.pts(), None);
		uref.set_pts(90_000).unwrap();
		uref.set_dts(45_000).unwrap();
		uref.set_duration(1_080_000).unwrap();
		assert_eq!(uref.pts(), Some(90_000));
		assert_eq!(uref.dts(), Some(45_000));
		assert_eq!(uref.duration(), Some(1_080_000));

		uref.clear_dates();
		assert_eq!(uref.pts(), None);
		assert_eq!(uref.dts(), None);
		// Durations are not dates.
		assert_eq!(uref.duration(), Some(1_080_000));
	}

	#[test]
	fn test_flags() {
		let mut uref = uref();
		assert!(!uref.is_discontinuity());
		uref.set_discontinuity().unwrap();
		uref.set_random().unwrap();
		assert!(uref.is_discontinuity());
		assert!(uref.is_random());
		assert!(!uref.is_error());
		uref.clear_discontinuity();
		assert!(!uref.is_discontinuity());
	}

	#[test]
	fn test_flow_def() {
		let mut uref = uref();
		uref.set_flow_def("block.mpeg2video.").unwrap();
		assert_eq!(uref.flow_def(), Some("block.mpeg2video."));
	}

	#[test]
	fn test_dup_shares_payload_chunks() {
		let mut payload = BufList::new();
		payload.push_chunk(Bytes::from_static(b"frame"));
		let mut uref = Uref::with_payload(DictPool::new(0).alloc(0).unwrap(), payload);
		uref.set_pts(42).unwrap();

		let copy = uref.dup().unwrap();
		assert_eq!(copy.pts(), Some(42));
		assert_eq!(copy.payload.as_ref().unwrap().num_bytes(), 5);

		// Diverging the copy leaves the original alone.
		let mut copy = copy;
		copy.set_pts(43).unwrap();
		assert_eq!(uref.pts(), Some(42));
	}
}

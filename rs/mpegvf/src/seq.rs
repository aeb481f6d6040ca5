use num_enum::TryFromPrimitive;
use uref::Rational;

use crate::{startcode, BitReader, Error, Result};

/// Sequence header size without quantizer matrices, start code included.
pub const SEQ_HEADER_SIZE: usize = 12;
/// Each loaded quantizer matrix extends the header by this much.
pub const QUANT_MATRIX_SIZE: usize = 64;
/// Sequence extension size, start code included.
pub const SEQX_SIZE: usize = 10;
/// Sequence display extension size without colour description.
pub const SEQDX_SIZE: usize = 9;
/// The colour description adds three bytes.
pub const SEQDX_COLOR_SIZE: usize = 3;
/// Group of pictures header size.
pub const GOP_SIZE: usize = 8;

// The 16-entry frame rate table; a zero numerator marks a reserved code.
// Entries 9..=13 are out-of-spec legacy rates recognized for robustness.
const FRAME_RATES: [Rational; 16] = [
	Rational::new(0, 0),
	Rational::new(24000, 1001),
	Rational::new(24, 1),
	Rational::new(25, 1),
	Rational::new(30000, 1001),
	Rational::new(30, 1),
	Rational::new(50, 1),
	Rational::new(60000, 1001),
	Rational::new(60, 1),
	Rational::new(15000, 1001),
	Rational::new(5000, 1001),
	Rational::new(10000, 1001),
	Rational::new(12000, 1001),
	Rational::new(15000, 1001),
	Rational::new(0, 0),
	Rational::new(0, 0),
];

/// Look up a frame rate code, rejecting reserved entries.
pub fn frame_rate(code: u8) -> Result<Rational> {
	let rate = FRAME_RATES[code as usize & 0xf];
	if rate.num == 0 {
		return Err(Error::InvalidFrameRate(code));
	}
	Ok(rate)
}

/// Chroma subsampling, driving the plane schema of the output flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ChromaFormat {
	C420 = 1,
	C422 = 2,
	C444 = 3,
}

impl ChromaFormat {
	/// The flow definition suffix announcing this format.
	pub fn flow_suffix(self) -> &'static str {
		match self {
			Self::C420 => "pic.planar8_420.",
			Self::C422 => "pic.planar8_422.",
			Self::C444 => "pic.planar8_444.",
		}
	}

	/// Chroma plane subsampling, as (hsub, vsub).
	pub fn subsampling(self) -> (u8, u8) {
		match self {
			Self::C420 => (2, 2),
			Self::C422 => (2, 1),
			Self::C444 => (1, 1),
		}
	}
}

/// The fixed fields of a sequence header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeader {
	pub horizontal_size: u32,
	pub vertical_size: u32,
	pub aspect_code: u8,
	pub frame_rate_code: u8,
	pub bit_rate_value: u32,
	pub vbv_buffer_size_value: u32,
	/// Header size in bytes, quantizer matrices included.
	pub size: usize,
}

impl SequenceHeader {
	/// Parse a header starting at its start code. `data` may extend past the
	/// header; the matrix presence bits decide its actual size.
	pub fn parse(data: &[u8]) -> Result<Self> {
		if data.len() < SEQ_HEADER_SIZE {
			return Err(Error::Short);
		}
		debug_assert_eq!(data[..3], startcode::PREFIX);
		debug_assert_eq!(data[3], startcode::SEQUENCE);

		let mut bits = BitReader::new(&data[4..]);
		let horizontal_size = bits.u32(12)?;
		let vertical_size = bits.u32(12)?;
		let aspect_code = bits.u32(4)? as u8;
		let frame_rate_code = bits.u32(4)? as u8;
		let bit_rate_value = bits.u32(18)?;
		bits.skip(1)?; // marker
		let vbv_buffer_size_value = bits.u32(10)?;
		bits.skip(1)?; // constrained_parameters_flag

		let mut size = SEQ_HEADER_SIZE;
		if bits.flag()? {
			size += QUANT_MATRIX_SIZE;
			bits.skip(QUANT_MATRIX_SIZE * 8)?;
		}
		if bits.flag()? {
			size += QUANT_MATRIX_SIZE;
		}

		Ok(Self {
			horizontal_size,
			vertical_size,
			aspect_code,
			frame_rate_code,
			bit_rate_value,
			vbv_buffer_size_value,
			size,
		})
	}
}

/// The sequence extension distinguishing MPEG-2 from MPEG-1 streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceExtension {
	pub profile_and_level: u8,
	pub progressive: bool,
	pub chroma_format: u8,
	pub horizontal_size_ext: u8,
	pub vertical_size_ext: u8,
	pub bit_rate_ext: u16,
	pub vbv_buffer_size_ext: u8,
	pub low_delay: bool,
	pub frame_rate_ext_n: u8,
	pub frame_rate_ext_d: u8,
}

impl SequenceExtension {
	pub fn parse(data: &[u8]) -> Result<Self> {
		if data.len() < SEQX_SIZE {
			return Err(Error::Short);
		}
		let mut bits = BitReader::new(&data[4..]);
		let id = bits.u32(4)? as u8;
		if id != startcode::EXT_SEQUENCE {
			return Err(Error::UnexpectedExtension(id));
		}
		let profile_and_level = bits.u32(8)? as u8;
		let progressive = bits.flag()?;
		let chroma_format = bits.u32(2)? as u8;
		let horizontal_size_ext = bits.u32(2)? as u8;
		let vertical_size_ext = bits.u32(2)? as u8;
		let bit_rate_ext = bits.u32(12)? as u16;
		bits.skip(1)?; // marker
		let vbv_buffer_size_ext = bits.u32(8)? as u8;
		let low_delay = bits.flag()?;
		let frame_rate_ext_n = bits.u32(2)? as u8;
		let frame_rate_ext_d = bits.u32(5)? as u8;
		Ok(Self {
			profile_and_level,
			progressive,
			chroma_format,
			horizontal_size_ext,
			vertical_size_ext,
			bit_rate_ext,
			vbv_buffer_size_ext,
			low_delay,
			frame_rate_ext_n,
			frame_rate_ext_d,
		})
	}
}

/// The optional sequence display extension carrying visible sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDisplay {
	pub video_format: u8,
	pub display_horizontal: u32,
	pub display_vertical: u32,
	/// Extension size in bytes, colour description included.
	pub size: usize,
}

impl SequenceDisplay {
	pub fn parse(data: &[u8]) -> Result<Self> {
		if data.len() < SEQDX_SIZE {
			return Err(Error::Short);
		}
		let mut bits = BitReader::new(&data[4..]);
		let id = bits.u32(4)? as u8;
		if id != startcode::EXT_SEQUENCE_DISPLAY {
			return Err(Error::UnexpectedExtension(id));
		}
		let video_format = bits.u32(3)? as u8;
		let mut size = SEQDX_SIZE;
		if bits.flag()? {
			// colour_primaries, transfer_characteristics, matrix_coefficients
			if data.len() < SEQDX_SIZE + SEQDX_COLOR_SIZE {
				return Err(Error::Short);
			}
			size += SEQDX_COLOR_SIZE;
			bits.skip(24)?;
		}
		let display_horizontal = bits.u32(14)?;
		bits.skip(1)?; // marker
		let display_vertical = bits.u32(14)?;
		Ok(Self {
			video_format,
			display_horizontal,
			display_vertical,
			size,
		})
	}
}

/// The group-of-pictures bits the framer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GopHeader {
	pub closed_gop: bool,
	pub broken_link: bool,
}

impl GopHeader {
	pub fn parse(data: &[u8]) -> Result<Self> {
		if data.len() < GOP_SIZE {
			return Err(Error::Short);
		}
		let mut bits = BitReader::new(&data[4..]);
		bits.skip(25)?; // time code
		let closed_gop = bits.flag()?;
		let broken_link = bits.flag()?;
		Ok(Self { closed_gop, broken_link })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	// 1920x1080, 16:9, 25 fps, bit rate 3750 * 400, vbv 112, no matrices.
	const SEQ: [u8; 12] = [
		0x00, 0x00, 0x01, 0xb3, 0x78, 0x04, 0x38, 0x33, 0x03, 0xa9, 0xa3, 0x80,
	];

	// Main@Main, progressive, 4:2:0, no size/rate extensions.
	const SEQX: [u8; 10] = [0x00, 0x00, 0x01, 0xb5, 0x14, 0x8a, 0x00, 0x01, 0x00, 0x00];

	#[test]
	fn test_sequence_header() {
		let seq = SequenceHeader::parse(&SEQ).unwrap();
		assert_eq!(seq.horizontal_size, 1920);
		assert_eq!(seq.vertical_size, 1080);
		assert_eq!(seq.aspect_code, 3);
		assert_eq!(seq.frame_rate_code, 3);
		assert_eq!(seq.bit_rate_value, 3750);
		assert_eq!(seq.vbv_buffer_size_value, 112);
		assert_eq!(seq.size, SEQ_HEADER_SIZE);
	}

	#[test]
	fn test_sequence_header_with_matrices() {
		let mut data = SEQ.to_vec();
		// Flip load_intra_quantiser_matrix and append the matrix plus the
		// trailing non-intra flag bit (clear).
		data[11] |= 0x02;
		data.extend_from_slice(&[0x10; QUANT_MATRIX_SIZE]);
		data.push(0x00);
		let seq = SequenceHeader::parse(&data).unwrap();
		assert_eq!(seq.size, SEQ_HEADER_SIZE + QUANT_MATRIX_SIZE);
	}

	#[test]
	fn test_sequence_header_short() {
		assert_eq!(SequenceHeader::parse(&SEQ[..8]), Err(Error::Short));
	}

	#[test]
	fn test_sequence_extension() {
		let ext = SequenceExtension::parse(&SEQX).unwrap();
		assert_eq!(ext.profile_and_level, 0x48);
		assert!(ext.progressive);
		assert_eq!(ext.chroma_format, 1);
		assert_eq!(ext.horizontal_size_ext, 0);
		assert_eq!(ext.vertical_size_ext, 0);
		assert_eq!(ext.bit_rate_ext, 0);
		assert!(!ext.low_delay);
		assert_eq!(ext.frame_rate_ext_n, 0);
		assert_eq!(ext.frame_rate_ext_d, 0);
	}

	#[test]
	fn test_sequence_extension_wrong_id() {
		let mut data = SEQX;
		data[4] = 0x84; // picture coding extension id
		assert_eq!(SequenceExtension::parse(&data), Err(Error::UnexpectedExtension(8)));
	}

	#[test]
	fn test_sequence_display() {
		// No colour description, 1920x1080 visible.
		let data = [0x00, 0x00, 0x01, 0xb5, 0x22, 0x1e, 0x02, 0x21, 0xc0];
		let display = SequenceDisplay::parse(&data).unwrap();
		assert_eq!(display.video_format, 1);
		assert_eq!(display.display_horizontal, 1920);
		assert_eq!(display.display_vertical, 1080);
		assert_eq!(display.size, SEQDX_SIZE);
	}

	#[test]
	fn test_gop_header() {
		let data = [0x00, 0x00, 0x01, 0xb8, 0x00, 0x08, 0x00, 0x40];
		let gop = GopHeader::parse(&data).unwrap();
		assert!(gop.closed_gop);
		assert!(!gop.broken_link);
	}

	#[test]
	fn test_frame_rates() {
		assert_eq!(frame_rate(3).unwrap(), Rational::new(25, 1));
		assert_eq!(frame_rate(4).unwrap(), Rational::new(30000, 1001));
		assert_eq!(frame_rate(0), Err(Error::InvalidFrameRate(0)));
		assert_eq!(frame_rate(15), Err(Error::InvalidFrameRate(15)));
	}

	#[test]
	fn test_chroma_formats() {
		assert_eq!(ChromaFormat::try_from(1u8).unwrap(), ChromaFormat::C420);
		assert_eq!(ChromaFormat::C422.subsampling(), (2, 1));
		assert_eq!(ChromaFormat::C444.flow_suffix(), "pic.planar8_444.");
		assert!(ChromaFormat::try_from(0u8).is_err());
	}
}

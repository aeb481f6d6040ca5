use num_enum::TryFromPrimitive;

use crate::{startcode, BitReader, Error, Result};

/// Picture header size, start code included.
pub const PIC_HEADER_SIZE: usize = 8;
/// Picture coding extension size, start code included.
pub const PICX_SIZE: usize = 9;

/// Picture coding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum CodingType {
	I = 1,
	P = 2,
	B = 3,
}

/// How a coded picture maps onto fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum PictureStructure {
	TopField = 1,
	BottomField = 2,
	Frame = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureHeader {
	pub temporal_reference: u16,
	pub coding_type: CodingType,
	/// 90 kHz ticks; None when the stream signals all-ones.
	pub vbv_delay: Option<u16>,
}

impl PictureHeader {
	pub fn parse(data: &[u8]) -> Result<Self> {
		if data.len() < PIC_HEADER_SIZE {
			return Err(Error::Short);
		}
		debug_assert_eq!(data[..3], startcode::PREFIX);
		debug_assert_eq!(data[3], startcode::PICTURE);

		let mut bits = BitReader::new(&data[4..]);
		let temporal_reference = bits.u32(10)? as u16;
		let coding_type = CodingType::try_from(bits.u32(3)? as u8).map_err(|_| Error::InvalidPicture)?;
		let vbv_delay = match bits.u32(16)? as u16 {
			0xffff => None,
			delay => Some(delay),
		};
		Ok(Self {
			temporal_reference,
			coding_type,
			vbv_delay,
		})
	}
}

/// The picture coding extension fields relevant to frame annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureCodingExtension {
	pub intra_dc_precision: u8,
	pub structure: PictureStructure,
	pub top_field_first: bool,
	pub repeat_first_field: bool,
	pub progressive_frame: bool,
}

impl PictureCodingExtension {
	pub fn parse(data: &[u8]) -> Result<Self> {
		if data.len() < PICX_SIZE {
			return Err(Error::Short);
		}
		let mut bits = BitReader::new(&data[4..]);
		let id = bits.u32(4)? as u8;
		if id != startcode::EXT_PICTURE_CODING {
			return Err(Error::UnexpectedExtension(id));
		}
		bits.skip(16)?; // f_codes
		let intra_dc_precision = bits.u32(2)? as u8;
		let structure = PictureStructure::try_from(bits.u32(2)? as u8).map_err(|_| Error::InvalidPicture)?;
		let top_field_first = bits.flag()?;
		bits.skip(5)?; // frame_pred_frame_dct .. alternate_scan
		let repeat_first_field = bits.flag()?;
		bits.skip(1)?; // chroma_420_type
		let progressive_frame = bits.flag()?;
		Ok(Self {
			intra_dc_precision,
			structure,
			top_field_first,
			repeat_first_field,
			progressive_frame,
		})
	}
}

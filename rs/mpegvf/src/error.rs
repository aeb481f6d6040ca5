/// A list of possible errors raised while delimiting and annotating frames.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	/// A buffer or dictionary could not be grown.
	#[error("allocation failed")]
	Alloc,

	/// An attribute operation failed for a non-allocation reason.
	#[error("attribute error: {0}")]
	Attr(uref::Error),

	/// A header was cut short by the end of the frame.
	#[error("truncated header")]
	Short,

	#[error("malformed sequence header")]
	InvalidSequence,

	/// No sequence header has been seen, so no flow can be derived.
	#[error("missing sequence header")]
	MissingSequence,

	#[error("invalid aspect ratio code {0}")]
	InvalidAspect(u8),

	#[error("invalid frame rate code {0}")]
	InvalidFrameRate(u8),

	#[error("invalid level {0}")]
	InvalidLevel(u8),

	#[error("invalid chroma format {0}")]
	InvalidChroma(u8),

	/// An extension start code carries an unexpected identifier.
	#[error("unexpected extension {0}")]
	UnexpectedExtension(u8),

	#[error("malformed picture header")]
	InvalidPicture,
}

impl Error {
	/// Whether this is an allocation failure (frame dropped, sync kept)
	/// rather than a structural one (frame dropped, sync lost).
	pub fn is_alloc(&self) -> bool {
		matches!(self, Self::Alloc)
	}
}

impl From<uref::Error> for Error {
	fn from(err: uref::Error) -> Self {
		match err {
			uref::Error::Alloc => Self::Alloc,
			err => Self::Attr(err),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;

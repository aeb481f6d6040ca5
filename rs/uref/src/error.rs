/// A list of possible errors surfaced by dictionary and carrier operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	/// The backing buffer could not be grown.
	#[error("allocation failed")]
	Alloc,

	/// No attribute matches the requested (name, type).
	#[error("attribute not found")]
	NotFound,

	/// A type byte does not name a registered shorthand.
	#[error("unknown shorthand code {0:#04x}")]
	UnknownShorthand(u8),

	/// A stored value does not decode as its base type.
	#[error("malformed attribute value")]
	Malformed,
}

pub type Result<T> = std::result::Result<T, Error>;

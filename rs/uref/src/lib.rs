//! # uref: attribute dictionaries and frame carriers
//!
//! Building blocks for pipeline-style media frameworks:
//!
//! - **[Dict]**: a typed key/value dictionary packed into one contiguous
//!   buffer, so per-frame metadata can be copied, pooled, and transmitted as
//!   a single block. Well-known keys are stored as one-byte [Shorthand]
//!   codes; arbitrary keys carry their name inline.
//! - **[DictPool]**: a LIFO pool of dictionary buffers, keeping the
//!   allocator off the per-frame path.
//! - **[Uref]**: the carrier handed between pipeline stages, pairing a
//!   dictionary with a chunked, ref-counted payload, plus typed accessors
//!   for the clock, flow, and picture attributes everything else agrees on.
//!
//! The buffer layout and the shorthand code assignments are a wire format:
//! two ends that agree on the [Shorthand] registry can exchange dictionaries
//! byte for byte.

mod attr;
mod dict;
mod error;
mod pool;
mod shorts;
mod uref;

pub use attr::*;
pub use dict::*;
pub use error::*;
pub use pool::*;
pub use shorts::*;
pub use uref::*;

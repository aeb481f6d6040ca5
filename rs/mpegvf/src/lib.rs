//! # mpegvf: MPEG-2 video elementary stream framer
//!
//! Reassembles an arbitrarily fragmented MPEG-2 video byte stream into
//! fully delimited, annotated frames:
//!
//! - [Accumulator] collects input carriers into one logical byte stream
//!   with cross-buffer search and zero-copy extraction.
//! - [Mpeg2Framer] walks the start codes, delimits frames, parses sequence
//!   and picture headers, tracks timestamps and discontinuities, and hands
//!   completed frames to a [FrameSink] together with a derived flow
//!   definition whenever the sequence parameters change.
//!
//! The framer is a synchronous push pipe: feed it [uref::Uref] carriers and
//! it calls back into the sink from the same thread. Frames come out in
//! stream order and do not depend on how the input was split.

mod bits;
mod error;
mod framer;
mod pic;
mod seq;
mod stream;

pub mod startcode;

pub use bits::*;
pub use error::*;
pub use framer::*;
pub use pic::*;
pub use seq::*;
pub use stream::*;

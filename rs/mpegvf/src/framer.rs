use buf_list::BufList;
use bytes::Bytes;
use uref::{AttrType, DictPool, Key, Rational, Uref, CLOCK_FREQ};

use crate::{
	pic::{CodingType, PictureCodingExtension, PictureHeader, PictureStructure, PIC_HEADER_SIZE, PICX_SIZE},
	seq::{
		frame_rate, ChromaFormat, GopHeader, SequenceDisplay, SequenceExtension, SequenceHeader, GOP_SIZE,
		QUANT_MATRIX_SIZE, SEQDX_COLOR_SIZE, SEQDX_SIZE, SEQX_SIZE, SEQ_HEADER_SIZE,
	},
	startcode, Accumulator, Error, Result,
};

/// The flow definition prefix accepted on input.
const FLOW_DEF_INPUT: &str = "block.mpeg2video.";

/// Events a framer reports alongside its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
	/// The framer is constructed and accepting input.
	Ready,
	/// A sequence start code was found and framing begins.
	SyncAcquired,
	/// A structural error dropped the current frame; the next sequence
	/// header re-acquires.
	SyncLost,
	/// Sequence parameters changed and a new flow definition was derived.
	NewFlowDef,
	/// An allocation failed; the affected frame was dropped.
	AllocError,
	/// The input flow definition does not announce MPEG-2 video.
	FlowDefError,
	/// The framer is being torn down.
	Dead,
}

/// Downstream capability: receives flow definitions, frames, and events.
pub trait FrameSink {
	/// A refreshed output flow definition, sent before the frames it covers.
	fn flow_def(&mut self, flow: &Uref);

	/// A fully delimited, annotated frame.
	fn frame(&mut self, frame: Uref);

	/// Out-of-band condition reporting.
	fn event(&mut self, event: Event) {
		let _ = event;
	}
}

// Pending timestamps, captured from input carriers and spent on frames.
#[derive(Debug, Default, Clone, Copy)]
struct Dates {
	pts_orig: Option<u64>,
	pts: Option<u64>,
	pts_sys: Option<u64>,
	dts_orig: Option<u64>,
	dts: Option<u64>,
	dts_sys: Option<u64>,
}

impl Dates {
	// Overwrite each slot the carrier has a value for.
	fn refresh(&mut self, uref: &Uref) {
		if let Some(pts) = uref.pts_orig() {
			self.pts_orig = Some(pts);
		}
		if let Some(pts) = uref.pts() {
			self.pts = Some(pts);
		}
		if let Some(pts) = uref.pts_sys() {
			self.pts_sys = Some(pts);
		}
		if let Some(dts) = uref.dts_orig() {
			self.dts_orig = Some(dts);
		}
		if let Some(dts) = uref.dts() {
			self.dts = Some(dts);
		}
		if let Some(dts) = uref.dts_sys() {
			self.dts_sys = Some(dts);
		}
	}
}

/// Reassembles an MPEG-2 video elementary stream into delimited frames.
///
/// A push pipe: carriers go in through [Self::input], annotated frames and
/// flow definitions come out through the [FrameSink]. Input may be split at
/// arbitrary byte boundaries; the emitted frames do not depend on the
/// fragmentation.
pub struct Mpeg2Framer<S: FrameSink> {
	pool: DictPool,
	sink: S,

	/// The upstream flow definition, copied into derived output flows.
	flow_def_input: Option<Uref>,
	/// The derived output flow definition.
	flow_def: Option<Uref>,

	// Cached sequence blocks, compared by bytes to detect parameter changes.
	sequence_header: Option<Bytes>,
	sequence_ext: Option<Bytes>,
	sequence_display: Option<Bytes>,

	progressive_sequence: bool,
	fps: Rational,

	acquired: bool,
	insert_sequence: bool,
	got_discontinuity: bool,

	last_picture_number: u64,
	last_temporal_reference: i64,
	systime_rap: Option<u64>,

	stream: Accumulator,
	dates: Dates,

	// Assembly cursor for the frame being delimited.
	next_frame_size: usize,
	next_frame_sequence: bool,
	next_frame_offset: Option<usize>,
	next_frame_gop: Option<usize>,
	next_frame_slice: bool,
}

impl<S: FrameSink> Mpeg2Framer<S> {
	pub fn new(pool: DictPool, mut sink: S) -> Self {
		sink.event(Event::Ready);
		Self {
			pool,
			sink,
			flow_def_input: None,
			flow_def: None,
			sequence_header: None,
			sequence_ext: None,
			sequence_display: None,
			progressive_sequence: true,
			fps: Rational::new(25, 1),
			acquired: false,
			insert_sequence: false,
			got_discontinuity: false,
			last_picture_number: 0,
			last_temporal_reference: 0,
			systime_rap: None,
			stream: Accumulator::new(),
			dates: Dates::default(),
			next_frame_size: 0,
			next_frame_sequence: false,
			next_frame_offset: None,
			next_frame_gop: None,
			next_frame_slice: false,
		}
	}

	/// Whether cached sequence headers are prepended to I-frames.
	pub fn sequence_insertion(&self) -> bool {
		self.insert_sequence
	}

	/// Prepend the cached sequence headers to I-frames that lack one, making
	/// every I-frame a random access point. Off by default.
	pub fn set_sequence_insertion(&mut self, insert: bool) {
		self.insert_sequence = insert;
	}

	pub fn output(&self) -> &S {
		&self.sink
	}

	pub fn output_mut(&mut self) -> &mut S {
		&mut self.sink
	}

	/// Swap the downstream sink, returning the previous one.
	pub fn set_output(&mut self, sink: S) -> S {
		std::mem::replace(&mut self.sink, sink)
	}

	/// The current output flow definition, once one has been derived.
	pub fn flow_def(&self) -> Option<&Uref> {
		self.flow_def.as_ref()
	}

	/// Feed one carrier: either a flow definition or stream payload.
	pub fn input(&mut self, uref: Uref) {
		if uref.flow_def().is_some() {
			self.set_flow_def(uref);
			return;
		}

		if uref.payload.as_ref().map_or(true, |p| p.num_bytes() == 0) {
			// Nothing to frame.
			return;
		}

		if uref.is_discontinuity() {
			if !self.next_frame_slice {
				// Headers must not straddle a discontinuity: restart the
				// frame from scratch and let the next sequence re-acquire.
				tracing::debug!("discontinuity before any slice, dropping partial frame");
				self.stream.clear();
				self.reset_frame();
				self.dates = Dates::default();
				self.got_discontinuity = true;
				self.lose_sync();
			} else if let Some(head) = self.stream.head_mut() {
				// Mid-frame: the current frame is damaged goods.
				if head.set_error().is_err() {
					self.sink.event(Event::AllocError);
				}
			}
		}

		if self.stream.append(uref) {
			self.refresh_dates();
		}
		self.work();
	}

	/// Install the upstream flow definition, which must announce MPEG-2
	/// video. Anything else clears the flow state.
	pub fn set_flow_def(&mut self, flow: Uref) {
		match flow.flow_def() {
			Some(def) if def.starts_with(FLOW_DEF_INPUT) => {}
			def => {
				tracing::warn!(?def, "unexpected input flow definition");
				self.flow_def_input = None;
				self.sink.event(Event::FlowDefError);
				return;
			}
		}
		self.flow_def_input = Some(flow);

		// Re-derive the output against the new input attributes.
		if self.sequence_header.is_some() {
			if let Err(err) = self.rederive_flow_def() {
				tracing::warn!(%err, "cannot derive flow definition");
			}
		}
	}

	// Scan the accumulated stream, delimiting and emitting frames.
	fn work(&mut self) {
		loop {
			// Without sync everything up to the scan point is consumed, so
			// the cursor is only meaningful while acquired.
			let cursor = if self.acquired { self.next_frame_size } else { 0 };
			let Some(found) = self.stream.find(&startcode::PREFIX, cursor) else {
				return;
			};
			let Some(code) = self.stream.byte_at(found + 3) else {
				// The code byte is still in flight; rescan once it arrives.
				return;
			};

			if !self.acquired {
				self.handle_unacquired(found, code);
				continue;
			}

			if self.next_frame_offset.is_none() {
				// Inside the frame header, before its picture.
				match code {
					// A sequence header opening the frame; one found mid-frame
					// rides along without restarting anything.
					startcode::SEQUENCE if found == 0 && self.next_frame_size == 0 => {
						self.next_frame_sequence = true;
					}
					startcode::PICTURE => self.next_frame_offset = Some(found),
					startcode::GROUP => self.next_frame_gop = Some(found),
					_ => {}
				}
				self.next_frame_size = found + 4;
				continue;
			}

			// After the picture: extensions and slices extend the frame, any
			// higher-level unit closes it.
			match code {
				code if startcode::is_slice(code) => {
					self.next_frame_slice = true;
					self.next_frame_size = found + 4;
				}
				startcode::SEQUENCE_END => {
					// The end code goes out with the frame it terminates.
					self.next_frame_size = found + 4;
					self.emit();
				}
				startcode::SEQUENCE | startcode::GROUP | startcode::PICTURE => {
					self.next_frame_size = found;
					self.emit();
					if self.acquired {
						// Re-seed the next frame with the code just scanned.
						self.next_frame_size = 4;
						self.next_frame_sequence = code == startcode::SEQUENCE;
						self.next_frame_gop = (code == startcode::GROUP).then_some(0);
						self.next_frame_offset = (code == startcode::PICTURE).then_some(0);
					}
				}
				_ => {
					// Extensions and user data belong to the current frame.
					self.next_frame_size = found + 4;
				}
			}
		}
	}

	fn handle_unacquired(&mut self, found: usize, code: u8) {
		match code {
			startcode::SEQUENCE => {
				// Framing starts at the first sequence header.
				self.consume(found);
				self.next_frame_size = 4;
				self.next_frame_sequence = true;
				self.acquired = true;
				tracing::debug!("sync acquired");
				self.sink.event(Event::SyncAcquired);
			}
			startcode::PICTURE => {
				// A picture we cannot frame; its timestamps must not leak
				// onto a later frame.
				self.consume(found + 4);
				self.dates = Dates::default();
			}
			_ => {
				self.consume(found + 4);
			}
		}
	}

	// Close out the current frame: annotate and forward it, then drop its
	// bytes. Structural failures lose sync; the stream itself continues.
	fn emit(&mut self) {
		let size = self.next_frame_size;
		match self.output_frame() {
			Ok(()) => {}
			Err(err) if err.is_alloc() => {
				tracing::warn!(size, "allocation failed, dropping frame");
				self.sink.event(Event::AllocError);
			}
			Err(err) => {
				tracing::warn!(size, %err, "malformed frame, dropping and losing sync");
				self.lose_sync();
			}
		}
		self.consume(size);
		self.reset_frame();
	}

	fn output_frame(&mut self) -> Result<()> {
		let size = self.next_frame_size;

		if self.next_frame_sequence {
			self.handle_sequence()?;
		}
		if self.flow_def.is_none() {
			return Err(Error::MissingSequence);
		}

		let offset = self.next_frame_offset.expect("emitting a frame without a picture");

		let head = self.stream.head().expect("emitting from an empty stream");
		let mut frame = head.dup()?;
		frame.clear_dates();
		frame.clear_discontinuity();
		frame.payload = Some(self.stream.extract(0, size).expect("frame within the stream"));

		self.handle_picture(&mut frame, offset)?;

		if let Some(rap) = self.systime_rap {
			frame.set_systime_rap(rap)?;
		}

		self.sink.frame(frame);
		Ok(())
	}

	// Parse and cache the sequence blocks opening the current frame,
	// re-deriving the flow definition when their bytes changed.
	fn handle_sequence(&mut self) -> Result<()> {
		let frame_size = self.next_frame_size;

		// Probe generously: the matrix presence bits size the header.
		let probe_size = frame_size.min(SEQ_HEADER_SIZE + 2 * QUANT_MATRIX_SIZE + 1);
		let probe = self.stream.peek(0, probe_size).ok_or(Error::Short)?;
		let seq = SequenceHeader::parse(&probe)?;
		if seq.size > frame_size {
			return Err(Error::InvalidSequence);
		}
		let header = self.stream.peek(0, seq.size).ok_or(Error::Short)?;

		let mut ext = None;
		let mut ext_bytes = None;
		let mut display = None;
		let mut display_bytes = None;

		// The first start code after the header must be the sequence
		// extension if it is an extension at all.
		if let Some(found) = self.find_within(seq.size, frame_size) {
			if self.stream.byte_at(found + 3) == Some(startcode::EXTENSION) {
				let data = self.stream.peek(found, SEQX_SIZE.min(frame_size - found)).ok_or(Error::Short)?;
				let parsed = SequenceExtension::parse(&data)?;

				// A display extension may follow it.
				if let Some(next) = self.find_within(found + SEQX_SIZE, frame_size) {
					if self.stream.byte_at(next + 3) == Some(startcode::EXTENSION) {
						let size = (SEQDX_SIZE + SEQDX_COLOR_SIZE).min(frame_size - next);
						let data = self.stream.peek(next, size).ok_or(Error::Short)?;
						match SequenceDisplay::parse(&data) {
							Ok(parsed) => {
								display_bytes = Some(self.stream.peek(next, parsed.size).ok_or(Error::Short)?);
								display = Some(parsed);
							}
							// Some other extension; no display information.
							Err(Error::UnexpectedExtension(_)) => {}
							Err(err) => return Err(err),
						}
					}
				}

				ext_bytes = Some(data);
				ext = Some(parsed);
			}
		}

		// Identical bytes mean identical parameters: refresh the cached
		// blocks (letting the previous ones go) and keep the current flow.
		let same = self.sequence_header.as_ref() == Some(&header)
			&& self.sequence_ext == ext_bytes
			&& self.sequence_display == display_bytes;

		self.sequence_header = Some(header);
		self.sequence_ext = ext_bytes;
		self.sequence_display = display_bytes;

		if same && self.flow_def.is_some() {
			return Ok(());
		}
		self.derive_flow_def(&seq, ext.as_ref(), display.as_ref())
	}

	// Re-parse the cached blocks, e.g. after a new input flow definition.
	fn rederive_flow_def(&mut self) -> Result<()> {
		let Some(header) = self.sequence_header.clone() else {
			return Ok(());
		};
		let seq = SequenceHeader::parse(&header)?;
		let ext = match &self.sequence_ext {
			Some(data) => Some(SequenceExtension::parse(data)?),
			None => None,
		};
		let display = match &self.sequence_display {
			Some(data) => Some(SequenceDisplay::parse(data)?),
			None => None,
		};
		self.derive_flow_def(&seq, ext.as_ref(), display.as_ref())
	}

	// Build a fresh output flow definition from sequence parameters.
	fn derive_flow_def(
		&mut self,
		seq: &SequenceHeader,
		ext: Option<&SequenceExtension>,
		display: Option<&SequenceDisplay>,
	) -> Result<()> {
		let mut flow = match &self.flow_def_input {
			Some(input) => input.dup()?,
			None => Uref::new(self.pool.alloc(0)?),
		};
		flow.payload = None;

		let mut hsize = seq.horizontal_size as u64;
		let mut vsize = seq.vertical_size as u64;
		let mut bitrate = seq.bit_rate_value as u64;
		let mut vbv_buffer = seq.vbv_buffer_size_value as u64;
		let mut fps = frame_rate(seq.frame_rate_code)?;
		let mut chroma = ChromaFormat::C420;
		let mut progressive = true;

		if let Some(ext) = ext {
			hsize |= (ext.horizontal_size_ext as u64) << 12;
			vsize |= (ext.vertical_size_ext as u64) << 12;
			bitrate |= (ext.bit_rate_ext as u64) << 18;
			vbv_buffer |= (ext.vbv_buffer_size_ext as u64) << 10;
			fps = Rational::new(
				fps.num * (ext.frame_rate_ext_n as i64 + 1),
				fps.den * (ext.frame_rate_ext_d as u64 + 1),
			)
			.simplify();
			chroma = ChromaFormat::try_from(ext.chroma_format).map_err(|_| Error::InvalidChroma(ext.chroma_format))?;
			progressive = ext.progressive;
		}

		let aspect = match seq.aspect_code {
			1 => Rational::new(1, 1),
			2 => Rational::new(vsize as i64 * 4, hsize * 3),
			3 => Rational::new(vsize as i64 * 16, hsize * 9),
			4 => Rational::new(vsize as i64 * 221, hsize * 100),
			code => return Err(Error::InvalidAspect(code)),
		}
		.simplify();

		self.fps = fps;
		self.progressive_sequence = progressive;

		flow.set_flow_def(&format!("{}{}", FLOW_DEF_INPUT, chroma.flow_suffix()))?;
		flow.set_hsize(hsize)?;
		flow.set_vsize(vsize)?;
		flow.set_aspect(aspect)?;
		flow.attrs.set_rational(Key::new("fps", AttrType::Rational), fps)?;
		flow.attrs.set_unsigned(Key::new("octetrate", AttrType::Unsigned), bitrate * 400 / 8)?;
		flow.attrs
			.set_unsigned(Key::new("cpb_buffer", AttrType::Unsigned), vbv_buffer * 16 * 1024 / 8)?;

		if let Some(ext) = ext {
			flow.attrs
				.set_small_unsigned(Key::new("profilelevel", AttrType::SmallUnsigned), ext.profile_and_level)?;
			let level = ext.profile_and_level & 0xf;
			let max_bitrate: u64 = match level {
				10 => 4_000_000,  // low
				8 => 15_000_000,  // main
				6 => 60_000_000,  // high-1440
				4 => 80_000_000,  // high
				_ => return Err(Error::InvalidLevel(level)),
			};
			flow.attrs
				.set_unsigned(Key::new("max_octetrate", AttrType::Unsigned), max_bitrate / 8)?;
			if ext.low_delay {
				flow.attrs.set_void(Key::new("lowdelay", AttrType::Void))?;
			}
		}

		// Logical plane schema: full-size luma, two subsampled chroma planes.
		let (hsub, vsub) = chroma.subsampling();
		flow.attrs.set_small_unsigned(Key::new("macropixel", AttrType::SmallUnsigned), 1)?;
		flow.attrs.set_small_unsigned(Key::new("planes", AttrType::SmallUnsigned), 3)?;
		for (index, name, hs, vs) in [(0, "y8", 1, 1), (1, "u8", hsub, vsub), (2, "v8", hsub, vsub)] {
			flow.attrs
				.set_string(Key::new(&format!("chroma.{index}"), AttrType::String), name)?;
			flow.attrs
				.set_small_unsigned(Key::new(&format!("hsub.{index}"), AttrType::SmallUnsigned), hs)?;
			flow.attrs
				.set_small_unsigned(Key::new(&format!("vsub.{index}"), AttrType::SmallUnsigned), vs)?;
		}

		if progressive {
			flow.set_progressive()?;
		}
		if let Some(display) = display {
			flow.set_hsize_visible(display.display_horizontal as u64)?;
			flow.set_vsize_visible(display.display_vertical as u64)?;
		}

		tracing::debug!(hsize, vsize, %fps, "new flow definition");
		self.sink.event(Event::NewFlowDef);
		self.sink.flow_def(&flow);
		self.flow_def = Some(flow);
		Ok(())
	}

	// Annotate the frame from its picture header, the GOP bits ahead of it,
	// and the pending timestamps.
	fn handle_picture(&mut self, frame: &mut Uref, offset: usize) -> Result<()> {
		let frame_size = self.next_frame_size;

		if let Some(gop) = self.next_frame_gop {
			let data = self.stream.peek(gop, GOP_SIZE).ok_or(Error::Short)?;
			let gop = GopHeader::parse(&data)?;
			self.last_temporal_reference = -1;
			if gop.broken_link || (!gop.closed_gop && self.got_discontinuity) {
				frame.set_discontinuity()?;
			}
		} else if self.got_discontinuity {
			frame.set_discontinuity()?;
		}
		self.got_discontinuity = false;

		let data = self.stream.peek(offset, PIC_HEADER_SIZE).ok_or(Error::Short)?;
		let pic = PictureHeader::parse(&data)?;

		let reference = pic.temporal_reference as i64;
		let number = (self.last_picture_number as i64 + reference - self.last_temporal_reference) as u64;
		if reference > self.last_temporal_reference {
			self.last_temporal_reference = reference;
			self.last_picture_number = number;
		}
		frame.set_pic_num(number)?;
		frame
			.attrs
			.set_small_unsigned(Key::new("mpgv.type", AttrType::SmallUnsigned), pic.coding_type as u8)?;
		if let Some(delay) = pic.vbv_delay {
			// 90 kHz ticks rescaled to the pipeline clock.
			frame.set_vbv_delay(delay as u64 * CLOCK_FREQ / 90_000)?;
		}

		let mut duration = CLOCK_FREQ * self.fps.den / self.fps.num as u64;
		match self.picture_extension(offset, frame_size)? {
			Some(ext) => {
				if ext.intra_dc_precision != 0 {
					tracing::warn!(precision = ext.intra_dc_precision, "unexpected intra DC precision");
				}
				if self.progressive_sequence {
					if ext.repeat_first_field {
						duration *= 1 + ext.top_field_first as u64;
					}
				} else if ext.structure == PictureStructure::Frame {
					if ext.repeat_first_field {
						duration += duration / 2;
					}
				} else {
					duration /= 2;
				}
				match ext.structure {
					PictureStructure::TopField => frame.set_top_field()?,
					PictureStructure::BottomField => frame.set_bottom_field()?,
					PictureStructure::Frame => {
						frame.set_top_field()?;
						frame.set_bottom_field()?;
						if ext.top_field_first {
							frame.set_top_field_first()?;
						}
					}
				}
				if ext.progressive_frame {
					frame.set_progressive()?;
				}
			}
			None => {
				// No coding extension: a plain progressive frame picture.
				frame.set_top_field()?;
				frame.set_bottom_field()?;
				frame.set_progressive()?;
			}
		}
		frame.set_duration(duration)?;

		if pic.coding_type == CodingType::I {
			if self.next_frame_sequence {
				frame.set_random()?;
			} else if self.insert_sequence {
				self.prepend_sequence(frame)?;
				frame.set_random()?;
			}
			if frame.is_random() {
				if let Some(systime) = frame.systime() {
					self.systime_rap = Some(systime);
				}
			}
		}

		// Spend the pending presentation times on this frame; decode times
		// stay armed and step forward by one frame duration.
		if let Some(pts) = self.dates.pts_orig.take() {
			frame.set_pts_orig(pts)?;
		}
		if let Some(pts) = self.dates.pts.take() {
			frame.set_pts(pts)?;
		}
		if let Some(pts) = self.dates.pts_sys.take() {
			frame.set_pts_sys(pts)?;
		}
		if let Some(dts) = self.dates.dts_orig {
			frame.set_dts_orig(dts)?;
			self.dates.dts_orig = Some(dts + duration);
		}
		if let Some(dts) = self.dates.dts {
			frame.set_dts(dts)?;
			self.dates.dts = Some(dts + duration);
		}
		if let Some(dts) = self.dates.dts_sys {
			frame.set_dts_sys(dts)?;
			self.dates.dts_sys = Some(dts + duration);
		}

		Ok(())
	}

	// The first extension after the picture header must be the picture
	// coding extension, when one is present at all.
	fn picture_extension(&self, offset: usize, limit: usize) -> Result<Option<PictureCodingExtension>> {
		let Some(found) = self.find_within(offset + PIC_HEADER_SIZE, limit) else {
			return Ok(None);
		};
		if self.stream.byte_at(found + 3) != Some(startcode::EXTENSION) {
			return Ok(None);
		}
		let data = self.stream.peek(found, PICX_SIZE.min(limit - found)).ok_or(Error::Short)?;
		PictureCodingExtension::parse(&data).map(Some)
	}

	// Make an I-frame self-contained by prefixing the cached sequence blocks.
	fn prepend_sequence(&self, frame: &mut Uref) -> Result<()> {
		let header = self.sequence_header.clone().ok_or(Error::MissingSequence)?;
		let mut payload = BufList::new();
		payload.push_chunk(header);
		if let Some(ext) = &self.sequence_ext {
			payload.push_chunk(ext.clone());
		}
		if let Some(display) = &self.sequence_display {
			payload.push_chunk(display.clone());
		}
		if let Some(chunks) = &frame.payload {
			for chunk in chunks {
				payload.push_chunk(chunk.clone());
			}
		}
		frame.payload = Some(payload);
		Ok(())
	}

	// Find a start code prefix whose code byte still lies inside the frame.
	fn find_within(&self, from: usize, limit: usize) -> Option<usize> {
		let found = self.stream.find(&startcode::PREFIX, from)?;
		(found + 4 <= limit).then_some(found)
	}

	fn consume(&mut self, size: usize) {
		let dates = &mut self.dates;
		self.stream.consume(size, |head| dates.refresh(head));
	}

	fn refresh_dates(&mut self) {
		if let Some(head) = self.stream.head() {
			self.dates.refresh(head);
		}
	}

	fn reset_frame(&mut self) {
		self.next_frame_size = 0;
		self.next_frame_sequence = false;
		self.next_frame_offset = None;
		self.next_frame_gop = None;
		self.next_frame_slice = false;
	}

	fn lose_sync(&mut self) {
		if self.acquired {
			self.acquired = false;
			self.sink.event(Event::SyncLost);
		}
	}
}

impl<S: FrameSink> Drop for Mpeg2Framer<S> {
	fn drop(&mut self) {
		self.sink.event(Event::Dead);
	}
}

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Column sentinel meaning "through the end of the line".
///
/// Used when a range boundary gets clamped to a surviving line after its
/// original line was removed, since the mapper has no access to line lengths.
pub const MAX_COL: u32 = u32::MAX;

/// A range of source text. Lines and columns are 1-based, and the start never
/// comes after the end (line-major, then column order — `Location::new`
/// normalizes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
	pub line_start: u32,
	pub col_start: u32,
	pub line_end: u32,
	pub col_end: u32,
	pub meta: Option<LocationMeta>,
}

/// What happened to a location while it was mapped through a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationMeta {
	#[serde(skip_serializing_if = "is_false")]
	pub content_changed: bool,
	#[serde(skip_serializing_if = "is_false")]
	pub start_was_deleted: bool,
	#[serde(skip_serializing_if = "is_false")]
	pub end_was_deleted: bool,
	#[serde(skip_serializing_if = "is_false")]
	pub entirely_deleted: bool,
}

pub(crate) fn is_false(val: &bool) -> bool {
	!*val
}

impl LocationMeta {
	pub fn is_default(&self) -> bool {
		*self == Self::default()
	}
}

impl Location {
	/// Creates a location, swapping the endpoints if they arrive out of order.
	pub fn new(line_start: u32, col_start: u32, line_end: u32, col_end: u32) -> Self {
		let (start, end) = ((line_start, col_start), (line_end, col_end));
		let ((line_start, col_start), (line_end, col_end)) = if end < start { (end, start) } else { (start, end) };

		Self {
			line_start,
			col_start,
			line_end,
			col_end,
			meta: None,
		}
	}

	/// Returns a copy with the endpoints normalized (start <= end).
	pub fn normalized(&self) -> Self {
		let mut location = Self::new(self.line_start, self.col_start, self.line_end, self.col_end);
		location.meta = self.meta;
		location
	}

	/// The meta flags, defaulted when none were recorded.
	pub fn meta(&self) -> LocationMeta {
		self.meta.unwrap_or_default()
	}

	/// Attaches the meta flags, dropping them when all are unset.
	pub fn with_meta(mut self, meta: LocationMeta) -> Self {
		self.meta = (!meta.is_default()).then_some(meta);
		self
	}
}

// region:    --- Codec

// A location travels as the compact ordered array
// `[lineStart, colStart, lineEnd, colEnd, meta?]`, the trailing meta element
// present only when at least one flag is set.

impl Serialize for Location {
	fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
		let meta = self.meta.filter(|m| !m.is_default());
		let mut seq = serializer.serialize_seq(Some(if meta.is_some() { 5 } else { 4 }))?;
		seq.serialize_element(&self.line_start)?;
		seq.serialize_element(&self.col_start)?;
		seq.serialize_element(&self.line_end)?;
		seq.serialize_element(&self.col_end)?;
		if let Some(meta) = meta {
			seq.serialize_element(&meta)?;
		}
		seq.end()
	}
}

impl<'de> Deserialize<'de> for Location {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
		deserializer.deserialize_seq(LocationVisitor)
	}
}

struct LocationVisitor;

impl<'de> Visitor<'de> for LocationVisitor {
	type Value = Location;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str("a [lineStart, colStart, lineEnd, colEnd, meta?] array")
	}

	fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> core::result::Result<Location, A::Error> {
		let line_start = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(0, &self))?;
		let col_start = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(1, &self))?;
		let line_end = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(2, &self))?;
		let col_end = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(3, &self))?;
		let meta: Option<LocationMeta> = seq.next_element()?;

		Ok(Location {
			line_start,
			col_start,
			line_end,
			col_end,
			meta: meta.filter(|m| !m.is_default()),
		})
	}
}

// endregion: --- Codec

// region:    --- Tests


// endregion: --- Tests

//! Fixture helpers for tests, behind the `test-support` feature.

use crate::{FileDiff, Location, Result, UnifiedDiff};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

/// Shorthand location constructor.
pub fn loc(line_start: u32, col_start: u32, line_end: u32, col_end: u32) -> Location {
	Location::new(line_start, col_start, line_end, col_end)
}

/// `line 1\n..line n\n` fixture contents.
pub fn numbered_lines(lines: std::ops::RangeInclusive<u32>) -> String {
	lines.map(|i| format!("line {i}\n")).collect()
}

/// The unified diff between two fixture contents.
pub fn diff_between(path: &str, before: &str, after: &str) -> UnifiedDiff {
	UnifiedDiff::between(path, before, after)
}

/// Encodes a diff set the way a review store would compress it
/// (JSON -> zlib -> base64).
pub fn compress_diff_set(diffs: &[FileDiff]) -> Result<String> {
	let json = serde_json::to_string(diffs)?;
	let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
	encoder.write_all(json.as_bytes())?;
	Ok(BASE64.encode(encoder.finish()?))
}

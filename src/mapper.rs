use crate::{Location, MAX_COL, UnifiedDiff};
use diffy::Line;
use tracing::warn;

/// Maps a location expressed against a diff's "before" state onto the diff's
/// "after" state.
///
/// Pure and deterministic: the same inputs always produce the same output and
/// nothing is thrown. A malformed diff degrades to the original location with
/// `content_changed` set. The diff must target the same single file the
/// location belongs to; the mapper has no way to detect a mismatch.
pub fn map_location(location: &Location, diff: &UnifiedDiff) -> Location {
	let Some(patch) = diff.parse() else {
		warn!("keeping original location for unparseable diff");
		let mut meta = location.meta();
		meta.content_changed = true;
		return location.clone().with_meta(meta);
	};

	map_through_edits(location, &collect_edits(&patch))
}

// region:    --- Edits

/// One contiguous run of removed/added lines between context lines.
///
/// `del_start` is the 1-based first removed line in the "before" state; a pure
/// insertion has `del_len == 0` and `del_start` pointing at the first old line
/// *after* the insertion point.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
	del_start: u32,
	del_len: u32,
	add_len: u32,
}

impl Edit {
	fn del_end(&self) -> u32 {
		self.del_start + self.del_len.saturating_sub(1)
	}

	fn delta(&self) -> i64 {
		self.add_len as i64 - self.del_len as i64
	}
}

/// Lowers a patch's hunks into edits, in ascending `del_start` order.
fn collect_edits(patch: &diffy::Patch<'_, str>) -> Vec<Edit> {
	let mut edits = Vec::new();

	for hunk in patch.hunks() {
		let old_range = hunk.old_range();
		// `-l,0` means "after line l": the first old line past the insertion point.
		let first_old = if old_range.len() == 0 { old_range.start() + 1 } else { old_range.start() };
		let mut old_line = first_old as u32;
		let mut run: Option<Edit> = None;

		for line in hunk.lines() {
			match line {
				Line::Context(_) => {
					if let Some(edit) = run.take() {
						edits.push(edit);
					}
					old_line += 1;
				}
				Line::Delete(_) => {
					let edit = run.get_or_insert(Edit {
						del_start: old_line,
						del_len: 0,
						add_len: 0,
					});
					edit.del_len += 1;
					old_line += 1;
				}
				Line::Insert(_) => {
					let edit = run.get_or_insert(Edit {
						del_start: old_line,
						del_len: 0,
						add_len: 0,
					});
					edit.add_len += 1;
				}
			}
		}
		if let Some(edit) = run.take() {
			edits.push(edit);
		}
	}

	edits
}

// endregion: --- Edits

// region:    --- Mapping

fn map_through_edits(location: &Location, edits: &[Edit]) -> Location {
	let mut meta = location.meta();

	// Boundaries stay in "before" coordinates while scanning; each carries its
	// own running offset since edits inside the range move only the end.
	let mut line_start = location.line_start;
	let mut col_start = location.col_start;
	let mut line_end = location.line_end;
	let mut col_end = location.col_end;
	let mut off_start: i64 = 0;
	let mut off_end: i64 = 0;
	// Where the content stood, in "after" coordinates, if it all goes away.
	let mut deletion_point: Option<i64> = None;

	for edit in edits {
		if edit.del_len == 0 {
			// Pure insertion before old line `del_start`: shifts any boundary
			// at or after it. Insertion adjacent past the end moves nothing.
			if line_start >= edit.del_start {
				off_start += edit.add_len as i64;
			}
			if line_end >= edit.del_start {
				off_end += edit.add_len as i64;
			}
			continue;
		}

		let del_end = edit.del_end();

		if del_end < line_start {
			off_start += edit.delta();
			off_end += edit.delta();
			continue;
		}
		if edit.del_start > line_end {
			continue;
		}

		// The removal touches the range's interior.
		meta.content_changed = true;

		if line_start >= edit.del_start {
			// Start line removed: clamp forward to the first surviving line.
			meta.start_was_deleted = true;
			if deletion_point.is_none() {
				deletion_point = Some(edit.del_start as i64 + off_start);
			}
			line_start = del_end + 1;
			col_start = 1;
			off_start += edit.delta();
		}

		if line_end <= del_end {
			// End line removed: clamp back to the last surviving line.
			meta.end_was_deleted = true;
			line_end = edit.del_start.saturating_sub(1);
			col_end = MAX_COL;
		} else {
			off_end += edit.delta();
		}
	}

	let mapped_start = (line_start as i64 + off_start).max(1);
	let mapped_end = (line_end as i64 + off_end).max(1);

	if line_end < line_start || mapped_end < mapped_start {
		// Every line of the range is gone: collapse to a zero-width location
		// at the point where the content used to be.
		meta.entirely_deleted = true;
		let line = deletion_point.unwrap_or(mapped_start).max(1) as u32;
		return Location::new(line, 1, line, 1).with_meta(meta);
	}

	Location {
		line_start: mapped_start as u32,
		col_start,
		line_end: mapped_end as u32,
		col_end,
		meta: None,
	}
	.with_meta(meta)
}

// endregion: --- Mapping

// region:    --- Tests


// endregion: --- Tests

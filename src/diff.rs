use diffy::Patch;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// An immutable textual unified diff between two versions of one file.
///
/// The engine never computes diffs itself beyond delegating to `diffy`; a
/// `UnifiedDiff` is either produced externally (history provider, review
/// store) or built from two in-memory contents with [`UnifiedDiff::between`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnifiedDiff {
	text: String,
}

impl UnifiedDiff {
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into() }
	}

	/// Builds the unified diff between two versions of one file.
	///
	/// Contents are normalized first (CRLF/CR to LF, trailing newline ensured)
	/// so that line-ending drift never shows up as a content change.
	pub fn between(path: &str, before: &str, after: &str) -> Self {
		let before = normalize_contents(before);
		let after = normalize_contents(after);
		let patch = diffy::create_patch(&before, &after);

		Self {
			text: with_file_headers(&patch.to_string(), path),
		}
	}

	/// Parses the diff text. A malformed diff yields `None` (with a warning);
	/// callers degrade rather than fail.
	pub fn parse(&self) -> Option<Patch<'_, str>> {
		match Patch::from_str(&self.text) {
			Ok(patch) => Some(patch),
			Err(err) => {
				warn!(%err, "unparseable unified diff");
				None
			}
		}
	}

	/// True when the diff parses and carries at least one hunk.
	pub fn has_changes(&self) -> bool {
		self.parse().map(|p| !p.hunks().is_empty()).unwrap_or(false)
	}

	pub fn old_file_name(&self) -> Option<String> {
		self.header_name("--- ")
	}

	pub fn new_file_name(&self) -> Option<String> {
		self.header_name("+++ ")
	}

	pub fn as_str(&self) -> &str {
		&self.text
	}

	fn header_name(&self, prefix: &str) -> Option<String> {
		let name = self
			.text
			.lines()
			.take(4)
			.find_map(|line| line.strip_prefix(prefix))?
			.trim();
		let name = name.strip_prefix("a/").or_else(|| name.strip_prefix("b/")).unwrap_or(name);
		Some(name.to_string())
	}
}

/// Normalizes file contents for diffing: CRLF/CR become LF, and non-empty
/// contents always end with a newline.
pub fn normalize_contents(content: &str) -> String {
	let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
	if !normalized.is_empty() && !normalized.ends_with('\n') {
		normalized.push('\n');
	}
	normalized
}

/// One per-file entry of a review diff set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub old_file_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub new_file_name: Option<String>,
	pub diff: UnifiedDiff,
}

// region:    --- Support

/// Replaces diffy's placeholder `--- original` / `+++ modified` headers with
/// ones carrying the file path.
fn with_file_headers(patch_text: &str, path: &str) -> String {
	let mut out = format!("--- {path}\n+++ {path}\n");
	for line in patch_text.lines() {
		if line.starts_with("--- ") || line.starts_with("+++ ") {
			continue;
		}
		out.push_str(line);
		out.push('\n');
	}
	out
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests

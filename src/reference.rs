use crate::location::is_false;
use crate::{Location, RepoIdentifier, UnifiedDiff};
use serde::{Deserialize, Serialize};

/// One anchoring of a marker against a concrete state of the file: a commit
/// (`commit_hash` set) or live working-tree contents (`uncommitted` flag plus
/// the `base_commit`/`diff` pair needed to project the commit onto them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceLocation {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub commit_hash: Option<String>,
	pub location: Location,
	#[serde(default)]
	pub flags: ReferenceFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceFlags {
	#[serde(skip_serializing_if = "is_false")]
	pub canonical: bool,
	#[serde(skip_serializing_if = "is_false")]
	pub uncommitted: bool,
	#[serde(skip_serializing_if = "is_false")]
	pub backtracked: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub base_commit: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub diff: Option<UnifiedDiff>,
}

impl ReferenceLocation {
	/// A plain, non-authoritative reference at a commit.
	pub fn at_commit(commit_hash: impl Into<String>, location: Location) -> Self {
		Self {
			commit_hash: Some(commit_hash.into()),
			location,
			flags: ReferenceFlags::default(),
		}
	}

	/// The authoritative reference at a commit.
	pub fn canonical_at(commit_hash: impl Into<String>, location: Location) -> Self {
		Self {
			commit_hash: Some(commit_hash.into()),
			location,
			flags: ReferenceFlags {
				canonical: true,
				..Default::default()
			},
		}
	}

	/// The authoritative reference against live contents: no commit of its
	/// own, carrying the diff that projects `base_commit` onto the working
	/// copy.
	pub fn uncommitted_canonical(base_commit: impl Into<String>, diff: UnifiedDiff, location: Location) -> Self {
		Self {
			commit_hash: None,
			location,
			flags: ReferenceFlags {
				canonical: true,
				uncommitted: true,
				base_commit: Some(base_commit.into()),
				diff: Some(diff),
				..Default::default()
			},
		}
	}

	/// A reference computed for a historical/alternate revision.
	pub fn backtracked_at(commit_hash: impl Into<String>, location: Location) -> Self {
		Self {
			commit_hash: Some(commit_hash.into()),
			location,
			flags: ReferenceFlags {
				backtracked: true,
				..Default::default()
			},
		}
	}
}

/// The ordered reference locations owned by a marker. Append-only as a value:
/// re-resolving against a new revision adds an entry, existing ones are never
/// edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceLocationSet {
	references: Vec<ReferenceLocation>,
}

impl ReferenceLocationSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, reference: ReferenceLocation) {
		self.references.push(reference);
	}

	pub fn len(&self) -> usize {
		self.references.len()
	}

	pub fn is_empty(&self) -> bool {
		self.references.is_empty()
	}

	/// The single authoritative entry, when the set has one.
	pub fn canonical(&self) -> Option<&ReferenceLocation> {
		self.references.iter().find(|r| r.flags.canonical)
	}
}

impl From<Vec<ReferenceLocation>> for ReferenceLocationSet {
	fn from(references: Vec<ReferenceLocation>) -> Self {
		Self { references }
	}
}

// region:    --- Iterators

impl ReferenceLocationSet {
	pub fn iter(&self) -> std::slice::Iter<'_, ReferenceLocation> {
		self.references.iter()
	}
}

impl IntoIterator for ReferenceLocationSet {
	type Item = ReferenceLocation;
	type IntoIter = std::vec::IntoIter<Self::Item>;

	fn into_iter(self) -> Self::IntoIter {
		self.references.into_iter()
	}
}

impl<'a> IntoIterator for &'a ReferenceLocationSet {
	type Item = &'a ReferenceLocation;
	type IntoIter = std::slice::Iter<'a, ReferenceLocation>;

	fn into_iter(self) -> Self::IntoIter {
		self.references.iter()
	}
}

// endregion: --- Iterators

/// The full descriptor persisted for a new anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorDescriptor {
	pub code: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub commit_hash: Option<String>,
	pub reference_locations: ReferenceLocationSet,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub branch_when_created: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub remotes: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub remote_code_url: Option<String>,
	#[serde(flatten)]
	pub repo_identifier: RepoIdentifier,
}

// region:    --- Tests


// endregion: --- Tests

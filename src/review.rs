//! Anchors created from a selection inside an ephemeral review/diff view.
//!
//! Such selections arrive with a synthetic `review-diff://` source identifier
//! instead of a file URI. The anchor is computed against the review's cached
//! directional diffs rather than the working tree.

use crate::providers::bounded;
use crate::{
	AnchorCache, Error, FileDiff, Location, ReferenceLocation, ReferenceLocationSet, Result, ReviewStore,
	map_location,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::read::ZlibDecoder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const REVIEW_DIFF_SCHEME: &str = "review-diff://";

static RE_REVIEW_URI: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^review-diff://([^/]+)/([^/]+)/([^/]+)/([^/]+)/(.+)$").unwrap());

/// Identity of a selection made inside a review diff view, parsed from the
/// synthetic `review-diff://<review>/<checkpoint>/<repo>/<version>/<path>`
/// descriptor. A `-` checkpoint segment means "no checkpoint".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCheckpointContext {
	pub review_id: String,
	pub checkpoint: Option<u32>,
	pub repo_id: String,
	pub version: String,
	pub path: String,
}

impl ReviewCheckpointContext {
	/// True when the uri is a review-diff selection descriptor.
	pub fn matches(uri: &str) -> bool {
		uri.starts_with(REVIEW_DIFF_SCHEME)
	}

	pub fn parse(uri: &str) -> Result<Self> {
		let caps = RE_REVIEW_URI
			.captures(uri)
			.ok_or_else(|| Error::invalid_review_descriptor(uri))?;

		let checkpoint = match &caps[2] {
			"-" => None,
			value => Some(value.parse::<u32>().map_err(|_| Error::invalid_review_descriptor(uri))?),
		};

		Ok(Self {
			review_id: caps[1].to_string(),
			checkpoint,
			repo_id: caps[3].to_string(),
			version: caps[4].to_string(),
			path: caps[5].to_string(),
		})
	}

	pub fn to_uri(&self) -> String {
		let checkpoint = match self.checkpoint {
			Some(value) => value.to_string(),
			None => "-".to_string(),
		};
		format!(
			"{REVIEW_DIFF_SCHEME}{}/{checkpoint}/{}/{}/{}",
			self.review_id, self.repo_id, self.version, self.path
		)
	}
}

// region:    --- Checkpoint Diffs

/// A per-file diff set, as stored: inline entries or a compressed payload
/// (base64-wrapped zlib of the JSON entry list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiffSet {
	Plain(Vec<FileDiff>),
	Compressed(String),
}

impl DiffSet {
	/// Decodes the set. The decoded value is returned to the caller and never
	/// written back into the stored form.
	pub fn decode(&self) -> Result<Vec<FileDiff>> {
		match self {
			DiffSet::Plain(diffs) => Ok(diffs.clone()),
			DiffSet::Compressed(payload) => {
				let compressed = BASE64.decode(payload)?;
				let mut json = String::new();
				ZlibDecoder::new(compressed.as_slice()).read_to_string(&mut json)?;
				Ok(serde_json::from_str(&json)?)
			}
		}
	}
}

/// The three directional diff sets recorded for one review checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointDiffs {
	pub latest_commit_sha: String,
	pub right_base_sha: String,
	/// Latest commit -> right side (projects the commit onto review contents).
	pub latest_commit_to_right: DiffSet,
	/// Right side -> latest commit.
	pub right_to_latest_commit: DiffSet,
	/// Right side -> base commit (the reverse diff).
	pub right_reverse: DiffSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffCheckpoint {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub checkpoint: Option<u32>,
	pub diff: CheckpointDiffs,
}

/// A checkpoint's three diff sets, fully decoded.
#[derive(Debug)]
pub struct DecodedCheckpointDiffs {
	pub latest_commit_sha: String,
	pub right_base_sha: String,
	pub latest_commit_to_right: Vec<FileDiff>,
	pub right_to_latest_commit: Vec<FileDiff>,
	pub right_reverse: Vec<FileDiff>,
}

impl DecodedCheckpointDiffs {
	fn decode(diffs: &CheckpointDiffs) -> Result<Self> {
		Ok(Self {
			latest_commit_sha: diffs.latest_commit_sha.clone(),
			right_base_sha: diffs.right_base_sha.clone(),
			latest_commit_to_right: diffs.latest_commit_to_right.decode()?,
			right_to_latest_commit: diffs.right_to_latest_commit.decode()?,
			right_reverse: diffs.right_reverse.decode()?,
		})
	}
}

// endregion: --- Checkpoint Diffs

// region:    --- Build

/// Builds the reference set for a review-diff selection. Returns the set plus
/// the latest commit sha the file is anchored against.
pub(crate) async fn build_review_diff(
	reviews: &dyn ReviewStore,
	cache: &AnchorCache,
	call_timeout: Duration,
	context: &ReviewCheckpointContext,
	selection: &Location,
) -> Result<(ReferenceLocationSet, Option<String>)> {
	let decoded = checkpoint_diffs(reviews, cache, call_timeout, context).await?;

	let from_latest = entry_for_path(&decoded.latest_commit_to_right, &context.path);
	let to_latest = entry_for_path(&decoded.right_to_latest_commit, &context.path);
	let to_base = entry_for_path(&decoded.right_reverse, &context.path);

	// A set with no entry for the path (absent or renamed file) skips its
	// mapping step; the raw selection is the best remaining effort.
	let latest_location = match to_latest {
		Some(entry) => map_location(selection, &entry.diff),
		None => {
			warn!(path = %context.path, "no right-to-latest diff entry, keeping selection");
			selection.clone()
		}
	};
	let base_location = match to_base {
		Some(entry) => map_location(selection, &entry.diff),
		None => {
			warn!(path = %context.path, "no right-to-base diff entry, keeping selection");
			selection.clone()
		}
	};

	let mut references = ReferenceLocationSet::new();

	if let Some(entry) = from_latest {
		references.push(ReferenceLocation::uncommitted_canonical(
			&decoded.latest_commit_sha,
			entry.diff.clone(),
			selection.clone(),
		));
	}

	let latest_reference = if from_latest.is_none() {
		ReferenceLocation::canonical_at(&decoded.latest_commit_sha, latest_location)
	} else {
		ReferenceLocation::at_commit(&decoded.latest_commit_sha, latest_location)
	};
	references.push(latest_reference);
	references.push(ReferenceLocation::backtracked_at(&decoded.right_base_sha, base_location));

	debug!(count = references.len(), "review reference locations assembled");
	Ok((references, Some(decoded.latest_commit_sha.clone())))
}

// endregion: --- Build

// region:    --- Support

async fn checkpoint_diffs(
	reviews: &dyn ReviewStore,
	cache: &AnchorCache,
	call_timeout: Duration,
	context: &ReviewCheckpointContext,
) -> Result<Arc<DecodedCheckpointDiffs>> {
	let review = bounded("review lookup", call_timeout, reviews.review_by_id(&context.review_id))
		.await
		.and_then(|res| res)?;

	// Exact (repo, checkpoint) match when a checkpoint is given, else the most
	// recent changeset for the repo.
	let changeset = match context.checkpoint {
		Some(checkpoint) => review
			.changesets
			.iter()
			.find(|c| c.repo_id == context.repo_id && c.checkpoint == Some(checkpoint)),
		None => review.changesets.iter().rev().find(|c| c.repo_id == context.repo_id),
	}
	.ok_or_else(|| Error::changeset_not_found(&context.review_id, &context.repo_id))?;

	if let Some(decoded) = cache.checkpoint(&context.review_id, &context.repo_id, changeset.checkpoint) {
		return Ok(decoded);
	}

	let diffs = bounded(
		"review diffs lookup",
		call_timeout,
		reviews.diffs_for_review(&context.review_id, &context.repo_id),
	)
	.await
	.and_then(|res| res)?;

	let entry = diffs
		.iter()
		.find(|d| d.checkpoint == changeset.checkpoint)
		.ok_or_else(|| Error::checkpoint_diffs_not_found(&context.review_id, changeset.checkpoint))?;

	let decoded = Arc::new(DecodedCheckpointDiffs::decode(&entry.diff)?);
	cache.store_checkpoint(&context.review_id, &context.repo_id, changeset.checkpoint, Arc::clone(&decoded));
	Ok(decoded)
}

fn entry_for_path<'a>(diffs: &'a [FileDiff], path: &str) -> Option<&'a FileDiff> {
	diffs.iter().find(|d| d.new_file_name.as_deref() == Some(path))
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests

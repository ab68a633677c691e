//! Review-diff anchor scenarios: selections made inside an ephemeral diff
//! view anchor against the review's cached directional diffs.

mod test_support;

use anchorx::for_test::{compress_diff_set, diff_between, loc, numbered_lines};
use anchorx::{CheckpointDiffs, DiffCheckpoint, DiffSet, FileDiff, Review, ReviewChangeset, UnifiedDiff};
use assertables::assert_contains;
use test_support::*;

type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

const FILE: &str = "src/main.rs";

fn entry(diff: UnifiedDiff) -> FileDiff {
	FileDiff {
		old_file_name: Some(FILE.to_string()),
		new_file_name: Some(FILE.to_string()),
		diff,
	}
}

/// A review with one repo and two checkpoints. Checkpoint 1 carries:
/// - right side: lines 1..=8
/// - latest commit: right side plus two new leading lines
/// - base commit: right side minus its first line
/// The reverse diff set is stored compressed.
fn review_fixture() -> Result<MockReviews> {
	let right = numbered_lines(1..=8);
	let latest = format!("new a\nnew b\n{right}");
	let base = numbered_lines(2..=8);

	let checkpoint = |cp: Option<u32>, latest_sha: &str| -> Result<DiffCheckpoint> {
		Ok(DiffCheckpoint {
			checkpoint: cp,
			diff: CheckpointDiffs {
				latest_commit_sha: latest_sha.to_string(),
				right_base_sha: "base000".to_string(),
				latest_commit_to_right: DiffSet::Plain(vec![entry(diff_between(FILE, &latest, &right))]),
				right_to_latest_commit: DiffSet::Plain(vec![entry(diff_between(FILE, &right, &latest))]),
				right_reverse: DiffSet::Compressed(compress_diff_set(&[entry(diff_between(FILE, &right, &base))])?),
			},
		})
	};

	let mut reviews = MockReviews::default();
	reviews.reviews.insert(
		"rev-1".to_string(),
		Review {
			id: "rev-1".to_string(),
			changesets: vec![
				ReviewChangeset {
					repo_id: "repo-1".to_string(),
					checkpoint: Some(0),
				},
				ReviewChangeset {
					repo_id: "repo-1".to_string(),
					checkpoint: Some(1),
				},
			],
		},
	);
	reviews.diffs.insert(
		("rev-1".to_string(), "repo-1".to_string()),
		vec![checkpoint(Some(0), "older555")?, checkpoint(Some(1), "latest111")?],
	);
	Ok(reviews)
}

fn review_builder() -> Result<anchorx::AnchorBuilder> {
	Ok(builder_with(
		MockHistory::default(),
		MockDocuments::default(),
		MockStreams::default(),
		review_fixture()?,
	))
}

#[tokio::test]
async fn test_review_checkpoint_builds_three_references() -> Result<()> {
	// -- Setup & Fixtures
	let builder = review_builder()?;
	let uri = format!("review-diff://rev-1/1/repo-1/right/{FILE}");

	// -- Exec
	let descriptor = builder.create_anchor(&uri, "selected code", &loc(3, 1, 4, 9), None).await?;

	// -- Check
	assert_eq!(descriptor.commit_hash.as_deref(), Some("latest111"));
	let references: Vec<_> = descriptor.reference_locations.iter().collect();
	assert_eq!(references.len(), 3);

	// The latest commit diverges from the right side, so the selection itself
	// is the canonical, uncommitted anchor.
	let uncommitted = references[0];
	assert_eq!(uncommitted.commit_hash, None);
	assert!(uncommitted.flags.canonical);
	assert!(uncommitted.flags.uncommitted);
	assert_eq!(uncommitted.flags.base_commit.as_deref(), Some("latest111"));
	assert!(uncommitted.flags.diff.is_some());
	assert_eq!((uncommitted.location.line_start, uncommitted.location.line_end), (3, 4));

	// Latest commit adds two leading lines: the range shifts down.
	let latest = references[1];
	assert_eq!(latest.commit_hash.as_deref(), Some("latest111"));
	assert!(!latest.flags.canonical);
	assert!(!latest.flags.backtracked);
	assert_eq!((latest.location.line_start, latest.location.line_end), (5, 6));

	// Base commit dropped the first line: the range shifts up.
	let base = references[2];
	assert_eq!(base.commit_hash.as_deref(), Some("base000"));
	assert!(base.flags.backtracked);
	assert_eq!((base.location.line_start, base.location.line_end), (2, 3));

	Ok(())
}

#[tokio::test]
async fn test_review_without_checkpoint_picks_most_recent_changeset() -> Result<()> {
	// -- Setup & Fixtures: `-` checkpoint segment scans changesets in reverse
	let builder = review_builder()?;
	let uri = format!("review-diff://rev-1/-/repo-1/right/{FILE}");

	// -- Exec
	let descriptor = builder.create_anchor(&uri, "selected", &loc(3, 1, 3, 4), None).await?;

	// -- Check: checkpoint 1 is the most recent for repo-1
	assert_eq!(descriptor.commit_hash.as_deref(), Some("latest111"));

	Ok(())
}

#[tokio::test]
async fn test_review_missing_path_entries_degrade_to_selection() -> Result<()> {
	// -- Setup & Fixtures: the selected path appears in none of the diff sets
	let builder = review_builder()?;
	let uri = "review-diff://rev-1/1/repo-1/right/docs/RENAMED.md";

	// -- Exec
	let descriptor = builder.create_anchor(uri, "selected", &loc(7, 1, 8, 2), None).await?;

	// -- Check: no uncommitted reference, latest turns canonical, mappings skipped
	let references: Vec<_> = descriptor.reference_locations.iter().collect();
	assert_eq!(references.len(), 2);

	let latest = references[0];
	assert_eq!(latest.commit_hash.as_deref(), Some("latest111"));
	assert!(latest.flags.canonical);
	assert_eq!((latest.location.line_start, latest.location.line_end), (7, 8));

	let base = references[1];
	assert!(base.flags.backtracked);
	assert_eq!((base.location.line_start, base.location.line_end), (7, 8));

	Ok(())
}

#[tokio::test]
async fn test_review_unknown_review_is_fatal() -> Result<()> {
	// -- Setup & Fixtures
	let builder = review_builder()?;
	let uri = format!("review-diff://rev-missing/1/repo-1/right/{FILE}");

	// -- Exec
	let res = builder.create_anchor(&uri, "code", &loc(1, 1, 1, 2), None).await;

	// -- Check
	let err = res.err().ok_or("should fail")?;
	assert_contains!(err.to_string(), "not found");

	Ok(())
}

#[tokio::test]
async fn test_review_unknown_repo_changeset_is_fatal() -> Result<()> {
	// -- Setup & Fixtures
	let builder = review_builder()?;
	let uri = format!("review-diff://rev-1/1/repo-unknown/right/{FILE}");

	// -- Exec
	let res = builder.create_anchor(&uri, "code", &loc(1, 1, 1, 2), None).await;

	// -- Check
	let err = res.err().ok_or("should fail")?;
	assert_contains!(err.to_string(), "has no changeset");

	Ok(())
}

#[tokio::test]
async fn test_review_missing_checkpoint_diffs_is_fatal() -> Result<()> {
	// -- Setup & Fixtures: the changeset exists but its diffs were never stored
	let mut reviews = review_fixture()?;
	if let Some(checkpoints) = reviews.diffs.get_mut(&("rev-1".to_string(), "repo-1".to_string())) {
		checkpoints.retain(|c| c.checkpoint != Some(1));
	}
	let builder = builder_with(MockHistory::default(), MockDocuments::default(), MockStreams::default(), reviews);
	let uri = format!("review-diff://rev-1/1/repo-1/right/{FILE}");

	// -- Exec
	let res = builder.create_anchor(&uri, "code", &loc(1, 1, 1, 2), None).await;

	// -- Check
	let err = res.err().ok_or("should fail")?;
	assert_contains!(err.to_string(), "has no diffs");

	Ok(())
}

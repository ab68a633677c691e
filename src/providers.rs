//! Seams to the external collaborators: version-control history, live
//! documents, tracked-file streams, and the review store. The engine only
//! issues read queries through these traits; every implementation detail of
//! the underlying system stays behind them.

use crate::{Result, UnifiedDiff};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use simple_fs::SPath;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// A repository known to the history provider.
#[derive(Debug, Clone)]
pub struct RepoHandle {
	/// Backend identity, when the repository is registered there.
	pub id: Option<String>,
	/// Absolute filesystem path of the repository root.
	pub path: String,
}

/// A line-range blame query. Bounds are 0-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameQuery {
	/// Revision the line range is expressed against.
	pub rev: String,
	pub start_line: u32,
	pub end_line: u32,
}

#[derive(Debug, Clone)]
pub struct BlameRevision {
	pub sha: String,
}

/// A configured remote, by name and fetch URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteInfo {
	pub name: String,
	pub url: String,
}

/// A tracked-file stream registered with the backend.
#[derive(Debug, Clone)]
pub struct FileStream {
	pub id: String,
}

#[derive(Debug, Clone)]
pub struct Review {
	pub id: String,
	pub changesets: Vec<ReviewChangeset>,
}

/// One repository's contribution to a review, at an optional checkpoint.
#[derive(Debug, Clone)]
pub struct ReviewChangeset {
	pub repo_id: String,
	pub checkpoint: Option<u32>,
}

#[async_trait]
pub trait HistoryProvider: Send + Sync {
	/// The repository containing `path`, if any.
	async fn repo_for_path(&self, path: &str) -> Option<RepoHandle>;

	async fn head_revision(&self, repo_path: &str) -> Option<String>;

	async fn known_commit_hashes(&self, repo_path: &str) -> Vec<String>;

	/// Distinct revisions that last touched the queried line range.
	async fn blame_revisions(&self, path: &str, query: &BlameQuery) -> Result<Vec<BlameRevision>>;

	/// Head sha of every configured remote's default branch.
	async fn remote_default_branch_heads(&self, repo_path: &str) -> Result<Vec<String>>;

	/// Diff for one file between two commits. `Ok(None)` means the file is
	/// identical between them.
	async fn diff_between_commits(&self, from_sha: &str, to_sha: &str, path: &str) -> Result<Option<UnifiedDiff>>;

	/// File contents as committed at `sha`, when the file exists there.
	async fn committed_file_contents(&self, path: &str, sha: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait DocumentProvider: Send + Sync {
	/// Text of an open editor buffer for `uri`, when one exists.
	async fn open_buffer_text(&self, uri: &str) -> Option<String>;

	/// Fallback read from disk.
	async fn read_from_disk(&self, path: &str) -> Option<String>;
}

#[async_trait]
pub trait StreamRegistry: Send + Sync {
	async fn file_stream_by_path(&self, path: &str) -> Option<FileStream>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
	async fn review_by_id(&self, review_id: &str) -> Result<Review>;

	/// Diff checkpoints recorded for one repository of a review. Payloads may
	/// arrive compressed; decoding is the engine's job.
	async fn diffs_for_review(&self, review_id: &str, repo_id: &str) -> Result<Vec<crate::DiffCheckpoint>>;
}

/// `DocumentProvider` for hosts without an editor buffer layer: buffers are
/// never present and reads go straight to disk.
#[derive(Debug, Default)]
pub struct FsDocumentProvider;

#[async_trait]
impl DocumentProvider for FsDocumentProvider {
	async fn open_buffer_text(&self, _uri: &str) -> Option<String> {
		None
	}

	async fn read_from_disk(&self, path: &str) -> Option<String> {
		simple_fs::read_to_string(&SPath::new(path)).ok()
	}
}

// region:    --- Support

/// Runs one external call under the builder's bounded timeout. A timeout is
/// reported as an error so callers treat it exactly like a failed lookup.
pub(crate) async fn bounded<T>(
	what: &str,
	limit: Duration,
	fut: impl Future<Output = T> + Send,
) -> Result<T> {
	match tokio::time::timeout(limit, fut).await {
		Ok(value) => Ok(value),
		Err(_) => {
			warn!(what, ?limit, "external call timed out");
			Err(crate::Error::external_call_timeout(what, limit))
		}
	}
}

// endregion: --- Support

use anchorx::{
	AnchorBuilder, BlameQuery, BlameRevision, DiffCheckpoint, DocumentProvider, Error, FileStream, HistoryProvider,
	RepoHandle, Result, Review, ReviewStore, StreamRegistry, UnifiedDiff,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory history provider. `None` in `blame`/`remote_heads` simulates a
/// failing lookup; `failing_diff_targets` lists target shas whose diff lookup
/// errors out.
#[derive(Default)]
pub struct MockHistory {
	pub repos: Vec<RepoHandle>,
	pub head: Option<String>,
	pub known_hashes: Vec<String>,
	pub blame: Option<Vec<String>>,
	pub remote_heads: Option<Vec<String>>,
	pub diffs: HashMap<(String, String), UnifiedDiff>,
	pub failing_diff_targets: Vec<String>,
	pub committed: HashMap<String, String>,
}

#[async_trait]
impl HistoryProvider for MockHistory {
	async fn repo_for_path(&self, path: &str) -> Option<RepoHandle> {
		self.repos.iter().find(|repo| path.starts_with(&repo.path)).cloned()
	}

	async fn head_revision(&self, _repo_path: &str) -> Option<String> {
		self.head.clone()
	}

	async fn known_commit_hashes(&self, _repo_path: &str) -> Vec<String> {
		self.known_hashes.clone()
	}

	async fn blame_revisions(&self, _path: &str, _query: &BlameQuery) -> Result<Vec<BlameRevision>> {
		match &self.blame {
			Some(shas) => Ok(shas.iter().map(|sha| BlameRevision { sha: sha.clone() }).collect()),
			None => Err(Error::custom("blame unavailable")),
		}
	}

	async fn remote_default_branch_heads(&self, _repo_path: &str) -> Result<Vec<String>> {
		match &self.remote_heads {
			Some(heads) => Ok(heads.clone()),
			None => Err(Error::custom("no remote data")),
		}
	}

	async fn diff_between_commits(&self, from_sha: &str, to_sha: &str, _path: &str) -> Result<Option<UnifiedDiff>> {
		if self.failing_diff_targets.iter().any(|t| t == to_sha) {
			return Err(Error::custom(format!("cannot diff to {to_sha}")));
		}
		Ok(self.diffs.get(&(from_sha.to_string(), to_sha.to_string())).cloned())
	}

	async fn committed_file_contents(&self, _path: &str, sha: &str) -> Result<Option<String>> {
		Ok(self.committed.get(sha).cloned())
	}
}

#[derive(Default)]
pub struct MockDocuments {
	/// Open editor buffers, by uri.
	pub buffers: HashMap<String, String>,
	/// On-disk contents, by path.
	pub disk: HashMap<String, String>,
}

#[async_trait]
impl DocumentProvider for MockDocuments {
	async fn open_buffer_text(&self, uri: &str) -> Option<String> {
		self.buffers.get(uri).cloned()
	}

	async fn read_from_disk(&self, path: &str) -> Option<String> {
		self.disk.get(path).cloned()
	}
}

#[derive(Default)]
pub struct MockStreams {
	/// Tracked-file streams, by full path.
	pub streams: HashMap<String, String>,
}

#[async_trait]
impl StreamRegistry for MockStreams {
	async fn file_stream_by_path(&self, path: &str) -> Option<FileStream> {
		self.streams.get(path).map(|id| FileStream { id: id.clone() })
	}
}

#[derive(Default)]
pub struct MockReviews {
	pub reviews: HashMap<String, Review>,
	/// Diff checkpoints by `(review id, repo id)`.
	pub diffs: HashMap<(String, String), Vec<DiffCheckpoint>>,
}

#[async_trait]
impl ReviewStore for MockReviews {
	async fn review_by_id(&self, review_id: &str) -> Result<Review> {
		self.reviews
			.get(review_id)
			.cloned()
			.ok_or_else(|| Error::custom(format!("review {review_id} not found")))
	}

	async fn diffs_for_review(&self, review_id: &str, repo_id: &str) -> Result<Vec<DiffCheckpoint>> {
		Ok(self
			.diffs
			.get(&(review_id.to_string(), repo_id.to_string()))
			.cloned()
			.unwrap_or_default())
	}
}

pub fn builder_with(
	history: MockHistory,
	documents: MockDocuments,
	streams: MockStreams,
	reviews: MockReviews,
) -> AnchorBuilder {
	AnchorBuilder::new(Arc::new(history), Arc::new(documents), Arc::new(streams), Arc::new(reviews))
}

//! Anchor assembly: dispatches a selection to the working-tree or review-diff
//! variant, orchestrates the location mapping and revision backtracking, and
//! emits the full descriptor to persist.

use crate::providers::bounded;
use crate::review::build_review_diff;
use crate::{
	AnchorCache, AnchorDescriptor, DivergenceDiffs, DocumentProvider, Error, HistoryProvider, Location,
	ReferenceLocation, ReferenceLocationSet, RemoteInfo, Result, ReviewCheckpointContext, ReviewStore,
	StreamRegistry, UnifiedDiff, content_hash, first_remote_code_url, map_location, resolve_backtrack_revisions,
	resolve_repo_identifier, sorted_remote_urls,
};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Where a selection was made; decides which build variant runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionContext {
	WorkingTree,
	ReviewDiff(ReviewCheckpointContext),
}

impl SelectionContext {
	pub fn from_uri(uri: &str) -> Result<Self> {
		if ReviewCheckpointContext::matches(uri) {
			Ok(Self::ReviewDiff(ReviewCheckpointContext::parse(uri)?))
		} else {
			Ok(Self::WorkingTree)
		}
	}
}

/// Everything known about where the selected code came from, supplied by the
/// host editor alongside the selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionSource {
	/// Repo-relative path of the file.
	pub file: Option<String>,
	/// Absolute path of the enclosing repository.
	pub repo_path: String,
	/// The commit the file contents were last pinned at, when the file has one.
	pub revision: Option<String>,
	/// When set, `revision` is authoritative and backtracking is skipped.
	pub fixed_git_sha: bool,
	pub branch: Option<String>,
	pub remotes: Vec<RemoteInfo>,
}

/// Builds anchor descriptors. Holds the collaborator seams, the per-builder
/// memoization cache, and the bounded timeout applied to every external call.
///
/// Every build is a pure orchestration over freshly fetched inputs; builders
/// can be shared and called concurrently.
pub struct AnchorBuilder {
	history: Arc<dyn HistoryProvider>,
	documents: Arc<dyn DocumentProvider>,
	streams: Arc<dyn StreamRegistry>,
	reviews: Arc<dyn ReviewStore>,
	cache: AnchorCache,
	call_timeout: Duration,
}

impl AnchorBuilder {
	pub fn new(
		history: Arc<dyn HistoryProvider>,
		documents: Arc<dyn DocumentProvider>,
		streams: Arc<dyn StreamRegistry>,
		reviews: Arc<dyn ReviewStore>,
	) -> Self {
		Self {
			history,
			documents,
			streams,
			reviews,
			cache: AnchorCache::default(),
			call_timeout: DEFAULT_CALL_TIMEOUT,
		}
	}

	pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
		self.call_timeout = call_timeout;
		self
	}

	/// Builds the full descriptor for a new anchor over `range` in `file_uri`.
	///
	/// `range` endpoints are normalized; `code` is the selected text, carried
	/// through verbatim. Selections made inside a review diff view (a
	/// `review-diff://` uri) anchor against the review's cached diffs instead
	/// of the working tree.
	pub async fn create_anchor(
		&self,
		file_uri: &str,
		code: &str,
		range: &Location,
		source: Option<&SelectionSource>,
	) -> Result<AnchorDescriptor> {
		debug!(uri = %file_uri, "creating anchor descriptor");
		let location = range.normalized();

		let (reference_locations, commit_hash) = match SelectionContext::from_uri(file_uri)? {
			SelectionContext::ReviewDiff(context) => {
				build_review_diff(self.reviews.as_ref(), &self.cache, self.call_timeout, &context, &location).await?
			}
			SelectionContext::WorkingTree => self.build_working_tree(file_uri, &location, source).await?,
		};

		let remotes = source
			.map(|s| sorted_remote_urls(&s.remotes))
			.filter(|urls| !urls.is_empty());
		let remote_code_url = self.remote_code_url_for(remotes.as_deref(), commit_hash.as_deref(), source, &location);

		let repo_identifier = match source {
			Some(source) => {
				resolve_repo_identifier(
					self.history.as_ref(),
					self.streams.as_ref(),
					source.file.as_deref(),
					&source.repo_path,
				)
				.await
			}
			None => Default::default(),
		};

		debug!(count = reference_locations.len(), "anchor descriptor created");
		Ok(AnchorDescriptor {
			code: code.to_string(),
			commit_hash,
			reference_locations,
			branch_when_created: source.and_then(|s| s.branch.clone()),
			remotes,
			remote_code_url,
			repo_identifier,
		})
	}

	// region:    --- Working Tree

	/// The working-tree variant. Four mutually exclusive cases: no source, no
	/// revision, pinned revision, and the normal tracked-file path.
	async fn build_working_tree(
		&self,
		file_uri: &str,
		location: &Location,
		source: Option<&SelectionSource>,
	) -> Result<(ReferenceLocationSet, Option<String>)> {
		let Some(source) = source else {
			debug!("selection has no source context");
			return Ok((ReferenceLocationSet::new(), None));
		};

		let Some(revision) = source.revision.as_deref() else {
			return self.build_uncommitted_only(file_uri, location, source).await;
		};

		if source.fixed_git_sha {
			debug!(revision, "revision is pinned, skipping backtracking");
			let mut references = ReferenceLocationSet::new();
			references.push(ReferenceLocation::canonical_at(revision, location.clone()));
			return Ok((references, Some(revision.to_string())));
		}

		self.build_tracked(file_uri, location, source, revision).await
	}

	/// The file has no commits yet: anchor to live contents against HEAD.
	async fn build_uncommitted_only(
		&self,
		file_uri: &str,
		location: &Location,
		source: &SelectionSource,
	) -> Result<(ReferenceLocationSet, Option<String>)> {
		debug!("file has no commits, anchoring to live contents");

		let head = bounded("head revision", self.call_timeout, self.history.head_revision(&source.repo_path))
			.await
			.ok()
			.flatten()
			.ok_or_else(|| Error::head_revision_unavailable(&source.repo_path))?;

		let contents = self.file_contents(file_uri).await?;
		let diff = UnifiedDiff::between(&file_path_from_uri(file_uri), "", &contents);

		let mut references = ReferenceLocationSet::new();
		references.push(ReferenceLocation::uncommitted_canonical(&head, diff, location.clone()));
		Ok((references, Some(head)))
	}

	/// The normal case: map the selection onto the pinned commit, pick the
	/// canonical shape from the divergence, and backtrack concurrently.
	async fn build_tracked(
		&self,
		file_uri: &str,
		location: &Location,
		source: &SelectionSource,
		revision: &str,
	) -> Result<(ReferenceLocationSet, Option<String>)> {
		debug!(revision, "anchoring against pinned revision");

		let contents = self.file_contents(file_uri).await?;
		let path = file_path_from_uri(file_uri);

		let (divergence, location_at_commit) = self.locate_at_commit(&path, &contents, location, revision).await;

		let backtrack_shas = resolve_backtrack_revisions(
			self.history.as_ref(),
			&path,
			&source.repo_path,
			revision,
			&location_at_commit,
			self.call_timeout,
		)
		.await;
		debug!(count = backtrack_shas.len(), "backtracking location");

		let backtracked = join_all(
			backtrack_shas
				.iter()
				.map(|sha| self.backtrack_to(sha, revision, &path, &location_at_commit)),
		)
		.await;

		let canonical = if location_at_commit.meta().content_changed {
			// The working copy diverges inside the range: the live selection is
			// authoritative, with the diff that rebuilds it from the commit.
			ReferenceLocation::uncommitted_canonical(revision, divergence.committed_to_contents, location.clone())
		} else {
			ReferenceLocation::canonical_at(revision, location_at_commit.clone())
		};

		let mut references = ReferenceLocationSet::new();
		references.push(canonical);
		for reference in backtracked.into_iter().flatten() {
			references.push(reference);
		}

		debug!(count = references.len(), "reference locations assembled");
		Ok((references, Some(revision.to_string())))
	}

	/// Divergence diffs between live contents and the pinned commit (memoized
	/// by content hash), plus the selection mapped onto the commit.
	async fn locate_at_commit(
		&self,
		path: &str,
		contents: &str,
		location: &Location,
		revision: &str,
	) -> (DivergenceDiffs, Location) {
		let hash = content_hash(contents);

		let divergence = match self.cache.divergence(path, hash, revision) {
			Some(cached) => cached,
			None => {
				let committed = bounded(
					"committed contents",
					self.call_timeout,
					self.history.committed_file_contents(path, revision),
				)
				.await
				.and_then(|res| res)
				.ok()
				.flatten();

				let committed = match committed {
					Some(text) => text,
					None => {
						warn!(path, revision, "committed contents unavailable, assuming no divergence");
						contents.to_string()
					}
				};

				let divergence = DivergenceDiffs {
					contents_to_committed: UnifiedDiff::between(path, contents, &committed),
					committed_to_contents: UnifiedDiff::between(path, &committed, contents),
				};
				self.cache.store_divergence(path, hash, revision, divergence.clone());
				divergence
			}
		};

		let location_at_commit = map_location(location, &divergence.contents_to_committed);
		(divergence, location_at_commit)
	}

	/// Projects the commit-relative location onto one backtrack target. A
	/// failed diff lookup drops this target only; the other targets proceed.
	async fn backtrack_to(
		&self,
		sha: &str,
		revision: &str,
		path: &str,
		location_at_commit: &Location,
	) -> Option<ReferenceLocation> {
		let diff = match bounded(
			"diff between commits",
			self.call_timeout,
			self.history.diff_between_commits(revision, sha, path),
		)
		.await
		.and_then(|res| res)
		{
			Ok(diff) => diff,
			Err(err) => {
				warn!(sha, %err, "diff lookup failed, dropping backtrack target");
				return None;
			}
		};

		let location = match diff {
			Some(diff) => map_location(location_at_commit, &diff),
			// The file is identical between the two commits.
			None => location_at_commit.clone(),
		};

		debug!(sha, "location backtracked");
		Some(ReferenceLocation::backtracked_at(sha, location))
	}

	// endregion: --- Working Tree

	// region:    --- Support

	/// Live contents: the open editor buffer when there is one, else disk.
	/// Unreadable both ways is fatal.
	async fn file_contents(&self, file_uri: &str) -> Result<String> {
		if let Ok(Some(text)) = bounded("buffer read", self.call_timeout, self.documents.open_buffer_text(file_uri)).await {
			return Ok(text);
		}

		let path = file_path_from_uri(file_uri);
		bounded("disk read", self.call_timeout, self.documents.read_from_disk(&path))
			.await
			.ok()
			.flatten()
			.ok_or_else(|| Error::file_contents_unavailable(file_uri))
	}

	fn remote_code_url_for(
		&self,
		remotes: Option<&[String]>,
		commit_hash: Option<&str>,
		source: Option<&SelectionSource>,
		location: &Location,
	) -> Option<String> {
		let remotes = remotes?;
		let sha = commit_hash?;
		let file = source?.file.as_deref()?;

		let url = first_remote_code_url(remotes, sha, file, location.line_start, location.line_end);
		if let Some(url) = &url {
			debug!(%url, "remote code url resolved");
		}
		url
	}

	// endregion: --- Support
}

// region:    --- Support

/// The filesystem path behind a file uri. Non-file uris pass through as-is.
fn file_path_from_uri(uri: &str) -> String {
	uri.strip_prefix("file://").unwrap_or(uri).to_string()
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests

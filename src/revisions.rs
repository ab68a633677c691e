use crate::providers::bounded;
use crate::{BlameQuery, BlameRevision, HistoryProvider, Location};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

/// Enumerates the revisions an anchor should be backtracked to: the union of
/// the blame revisions over the anchored line range and the head of every
/// configured remote's default branch.
///
/// Both lookups run concurrently; either one failing (or timing out)
/// contributes nothing instead of failing the whole resolution. The result is
/// deduplicated in first-seen order and never contains `current_commit`.
pub async fn resolve_backtrack_revisions(
	history: &dyn HistoryProvider,
	file_path: &str,
	repo_path: &str,
	current_commit: &str,
	location: &Location,
	call_timeout: Duration,
) -> Vec<String> {
	let (blame, heads) = futures::join!(
		blame_shas(history, file_path, current_commit, location, call_timeout),
		remote_head_shas(history, repo_path, call_timeout),
	);

	let mut seen = HashSet::new();
	blame
		.into_iter()
		.chain(heads)
		.filter(|sha| sha != current_commit)
		.filter(|sha| seen.insert(sha.clone()))
		.collect()
}

// region:    --- Support

async fn blame_shas(
	history: &dyn HistoryProvider,
	file_path: &str,
	current_commit: &str,
	location: &Location,
	call_timeout: Duration,
) -> Vec<String> {
	// Blame takes 0-based inclusive bounds.
	let start_line = location.line_start.saturating_sub(1);
	let end_line = location.line_end.saturating_sub(1);
	let query = BlameQuery {
		rev: current_commit.to_string(),
		start_line,
		end_line,
	};

	if let Some(revisions) = run_blame(history, file_path, &query, call_timeout).await {
		return shas_of(revisions);
	}

	// Retry once with the end trimmed by one line; ranges ending on a final
	// line that no longer exists at `rev` fail the first query.
	if end_line > start_line {
		let trimmed = BlameQuery {
			end_line: end_line - 1,
			..query
		};
		if let Some(revisions) = run_blame(history, file_path, &trimmed, call_timeout).await {
			return shas_of(revisions);
		}
	}

	warn!(file_path, "blame lookup failed, no blame revisions contributed");
	Vec::new()
}

async fn run_blame(
	history: &dyn HistoryProvider,
	file_path: &str,
	query: &BlameQuery,
	call_timeout: Duration,
) -> Option<Vec<BlameRevision>> {
	bounded("blame lookup", call_timeout, history.blame_revisions(file_path, query))
		.await
		.and_then(|res| res)
		.ok()
}

fn shas_of(revisions: Vec<BlameRevision>) -> Vec<String> {
	revisions.into_iter().map(|revision| revision.sha).collect()
}

async fn remote_head_shas(history: &dyn HistoryProvider, repo_path: &str, call_timeout: Duration) -> Vec<String> {
	match bounded(
		"remote default branch heads",
		call_timeout,
		history.remote_default_branch_heads(repo_path),
	)
	.await
	.and_then(|res| res)
	{
		Ok(heads) => heads,
		Err(err) => {
			warn!(repo_path, %err, "remote head lookup failed, no remote heads contributed");
			Vec::new()
		}
	}
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests

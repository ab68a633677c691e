use crate::{HistoryProvider, StreamRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Best-effort association of a file with something the backend can match
/// against: a tracked-file stream, a registered repository, or — failing
/// both — the repository's known commit hashes, for the backend to resolve
/// later. Fields are mutually exclusive by priority except `file`, which
/// accompanies both fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepoIdentifier {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file_stream_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub repo_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub known_commit_hashes: Option<Vec<String>>,
}

/// Resolves the identifier for a file. Never fails: with no source file, or
/// nothing matching, the identifier simply stays empty.
pub async fn resolve_repo_identifier(
	history: &dyn HistoryProvider,
	streams: &dyn StreamRegistry,
	file: Option<&str>,
	repo_path: &str,
) -> RepoIdentifier {
	let Some(file) = file else {
		debug!("selection has no source file");
		return RepoIdentifier::default();
	};

	let full_path = Path::new(repo_path).join(file).to_string_lossy().into_owned();

	if let Some(stream) = streams.file_stream_by_path(&full_path).await {
		debug!(stream_id = %stream.id, "file resolved to a tracked stream");
		return RepoIdentifier {
			file_stream_id: Some(stream.id),
			..Default::default()
		};
	}

	let mut identifier = RepoIdentifier {
		file: Some(file.to_string()),
		..Default::default()
	};

	match history.repo_for_path(&full_path).await.and_then(|repo| repo.id) {
		Some(repo_id) => {
			debug!(%repo_id, "file resolved to a registered repository");
			identifier.repo_id = Some(repo_id);
		}
		None => {
			let hashes = history.known_commit_hashes(repo_path).await;
			debug!(count = hashes.len(), "falling back to known commit hashes");
			identifier.known_commit_hashes = Some(hashes);
		}
	}

	identifier
}

// region:    --- Tests


// endregion: --- Tests

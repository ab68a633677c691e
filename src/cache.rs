use crate::UnifiedDiff;
use crate::review::DecodedCheckpointDiffs;
use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::{Arc, Mutex};
use twox_hash::XxHash64;

/// Hashes file contents for memoization keys.
pub fn content_hash(content: &str) -> u64 {
	let mut hasher = XxHash64::with_seed(0);
	hasher.write(content.as_bytes());
	hasher.finish()
}

/// Divergence between a pinned commit and live contents, in both directions.
#[derive(Debug, Clone)]
pub struct DivergenceDiffs {
	/// Projects live contents onto the committed state.
	pub contents_to_committed: UnifiedDiff,
	/// Projects the committed state onto live contents.
	pub committed_to_contents: UnifiedDiff,
}

type DivergenceKey = (String, u64, String);
type CheckpointKey = (String, String, Option<u32>);

/// Explicit memoization for repeated builds.
///
/// Owned by the builder, never module-level: concurrent builds against
/// different builders cannot interfere. Divergence diffs key on
/// `(path, content hash, revision)`; decoded review checkpoint sets key on
/// `(review id, repo id, checkpoint)`. A poisoned lock degrades to a miss.
#[derive(Debug, Default)]
pub struct AnchorCache {
	divergence: Mutex<HashMap<DivergenceKey, DivergenceDiffs>>,
	checkpoints: Mutex<HashMap<CheckpointKey, Arc<DecodedCheckpointDiffs>>>,
}

impl AnchorCache {
	pub fn divergence(&self, path: &str, hash: u64, revision: &str) -> Option<DivergenceDiffs> {
		let map = self.divergence.lock().ok()?;
		map.get(&(path.to_string(), hash, revision.to_string())).cloned()
	}

	pub fn store_divergence(&self, path: &str, hash: u64, revision: &str, diffs: DivergenceDiffs) {
		if let Ok(mut map) = self.divergence.lock() {
			map.insert((path.to_string(), hash, revision.to_string()), diffs);
		}
	}

	pub fn checkpoint(
		&self,
		review_id: &str,
		repo_id: &str,
		checkpoint: Option<u32>,
	) -> Option<Arc<DecodedCheckpointDiffs>> {
		let map = self.checkpoints.lock().ok()?;
		map.get(&(review_id.to_string(), repo_id.to_string(), checkpoint)).cloned()
	}

	pub fn store_checkpoint(
		&self,
		review_id: &str,
		repo_id: &str,
		checkpoint: Option<u32>,
		decoded: Arc<DecodedCheckpointDiffs>,
	) {
		if let Ok(mut map) = self.checkpoints.lock() {
			map.insert((review_id.to_string(), repo_id.to_string(), checkpoint), decoded);
		}
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn test_cache_divergence_roundtrip() -> Result<()> {
		// -- Setup & Fixtures
		let cache = AnchorCache::default();
		let hash = content_hash("fn main() {}\n");
		let diffs = DivergenceDiffs {
			contents_to_committed: UnifiedDiff::between("main.rs", "a\n", "b\n"),
			committed_to_contents: UnifiedDiff::between("main.rs", "b\n", "a\n"),
		};

		// -- Exec
		assert!(cache.divergence("main.rs", hash, "abc").is_none());
		cache.store_divergence("main.rs", hash, "abc", diffs.clone());
		let hit = cache.divergence("main.rs", hash, "abc").ok_or("should hit")?;

		// -- Check
		assert_eq!(hit.contents_to_committed, diffs.contents_to_committed);
		assert!(cache.divergence("main.rs", hash, "other-rev").is_none());

		Ok(())
	}

	#[test]
	fn test_cache_content_hash_differs_on_change() -> Result<()> {
		// -- Check
		assert_eq!(content_hash("same"), content_hash("same"));
		assert_ne!(content_hash("same"), content_hash("changed"));

		Ok(())
	}
}

// endregion: --- Tests

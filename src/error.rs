use derive_more::{Display, From};
use std::time::Duration;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),

	#[display("cannot retrieve contents for '{uri}' from open buffers or disk")]
	FileContentsUnavailable { uri: String },

	#[display("cannot determine HEAD revision for repository '{repo_path}'")]
	HeadRevisionUnavailable { repo_path: String },

	#[display("review '{review_id}' has no changeset for repository '{repo_id}'")]
	ChangesetNotFound { review_id: String, repo_id: String },

	#[display("review '{review_id}' has no diffs for checkpoint {checkpoint:?}")]
	CheckpointDiffsNotFound {
		review_id: String,
		checkpoint: Option<u32>,
	},

	#[display("malformed review selection descriptor '{uri}'")]
	InvalidReviewDescriptor { uri: String },

	#[display("'{what}' did not complete within {limit:?}")]
	ExternalCallTimeout { what: String, limit: Duration },

	// -- Externals
	#[from]
	Io(std::io::Error),

	#[from]
	Json(serde_json::Error),

	#[from]
	Base64(base64::DecodeError),
}

// region:    --- Constructors

impl Error {
	pub fn custom(val: impl std::fmt::Display) -> Self {
		Self::Custom(val.to_string())
	}

	pub fn file_contents_unavailable(uri: impl Into<String>) -> Self {
		Self::FileContentsUnavailable { uri: uri.into() }
	}

	pub fn head_revision_unavailable(repo_path: impl Into<String>) -> Self {
		Self::HeadRevisionUnavailable {
			repo_path: repo_path.into(),
		}
	}

	pub fn changeset_not_found(review_id: impl Into<String>, repo_id: impl Into<String>) -> Self {
		Self::ChangesetNotFound {
			review_id: review_id.into(),
			repo_id: repo_id.into(),
		}
	}

	pub fn checkpoint_diffs_not_found(review_id: impl Into<String>, checkpoint: Option<u32>) -> Self {
		Self::CheckpointDiffsNotFound {
			review_id: review_id.into(),
			checkpoint,
		}
	}

	pub fn invalid_review_descriptor(uri: impl Into<String>) -> Self {
		Self::InvalidReviewDescriptor { uri: uri.into() }
	}

	pub fn external_call_timeout(what: impl Into<String>, limit: Duration) -> Self {
		Self::ExternalCallTimeout { what: what.into(), limit }
	}
}

// endregion: --- Constructors

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate

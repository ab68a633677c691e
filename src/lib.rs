// region:    --- Modules

mod builder;
mod cache;
mod diff;
mod error;
mod location;
mod mapper;
mod providers;
mod reference;
mod remote_url;
mod repo_ident;
mod review;
mod revisions;

pub use builder::*;
pub use cache::*;
pub use diff::*;
pub use error::*;
pub use location::*;
pub use mapper::*;
pub use providers::*;
pub use reference::*;
pub use remote_url::*;
pub use repo_ident::*;
pub use review::*;
pub use revisions::*;

#[cfg(feature = "test-support")]
pub mod for_test;

// endregion: --- Modules

//! Mock collaborators shared by the integration tests.
//! Note: Must be imported in each test file

#![allow(unused)] // For test support

// region:    --- Modules

mod mock_providers;

pub use mock_providers::*;

// endregion: --- Modules

//! This module provides reusable test utilities:
//! - Fakes for the database, disk and notification collaborators
//! - A mock Misskey API server
//! - Environment builders and fixed dates

// Each test binary uses a different subset of the fixtures
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fakes;
pub mod mock_misskey;
pub mod test_data;

// Re-export commonly used items
pub use fakes::{Channel, DbCall, FakeDatabase, FixedDisk, RecordingNotifier};
pub use mock_misskey::MockMisskeyServer;
pub use test_data::*;

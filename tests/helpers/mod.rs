//! Shared test infrastructure
//!
//! Each integration test binary pulls this in with `mod helpers;`, so not
//! every binary uses every helper.
#![allow(dead_code)]

pub mod database_helper;
pub mod test_data;

pub use database_helper::TestDatabase;
pub use test_data::TestApp;

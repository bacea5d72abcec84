//! tubefetch library
//!
//! Job orchestration around an external media downloader: submit a URL,
//! poll for completion, fetch the finished file.

pub mod core;
pub mod error;
pub mod server;
pub mod storage;
pub mod types;
pub mod utils;

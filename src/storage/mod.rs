//! Storage modules: config, download directory, job table

pub mod config;
pub mod downloads;
pub mod jobs;

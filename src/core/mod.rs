//! Core job orchestration: validation, collaborator adapter, lifecycle

pub mod extractor;
pub mod jobs;
pub mod validator;
pub mod ytdlp;

// Library interface for newswatch modules
// This allows tests and other binaries to import modules

pub mod cache;
pub mod llm;
pub mod translator;
pub mod news;
pub mod synthesis;
pub mod github;
pub mod pipeline;

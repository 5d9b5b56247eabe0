pub mod azuredevops;
pub mod config;
pub mod github;

pub use config::Config;
pub use github::{GitHubClient, GitHubError, StatusReporter};

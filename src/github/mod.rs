//! GitHub App integration for pipeline runs.
//!
//! This module provides:
//! - JWT generation for GitHub App authentication
//! - Installation resolution and installation token exchange
//! - Check run and commit status reporting for pipeline runs

pub mod cache;
pub mod client;
pub mod error;
pub mod installation;
pub mod jwt;
pub mod status;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use cache::CheckRunCache;
pub use client::{GitHubClient, DEFAULT_API_URL};
pub use error::GitHubError;
pub use installation::{
    enterprise_host_from_headers, InstallationApi, InstallationResolver, RepositorySpec,
    ResolvedInstallation,
};
pub use jwt::{sign_app_jwt, AppIdentity, SignedAppJwt};
pub use status::{
    CheckStatus, Conclusion, EventType, ReporterOptions, RunEvent, StatusApi, StatusOpts,
    StatusReporter, StatusSink,
};
pub use transport::{HttpTransport, ReqwestTransport};

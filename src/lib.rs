//! github2mr - clone manifests for every repository on a GitHub-compatible host
//!
//! Logs in to a GitHub-compatible API, enumerates every repository the
//! authenticated user can see (personal and organizational) and renders a
//! deterministic manifest for the `mr` repository-management tool.
//!
//! ## Pipeline
//!
//! [`Session`] → [`discovery`] fetchers → [`manifest::build_entries`] →
//! [`manifest::sort_entries`] → [`manifest::render_manifest`] → [`output`]
//!
//! ## Modules
//!
//! - [`config`]: Settings, scopes and credential resolution
//! - [`github`]: Authenticated session against the remote API
//! - [`discovery`]: Paged repository listing and the fetchers built on it
//! - [`manifest`]: Filtering, ordering and rendering
//! - [`output`]: Writing the rendered manifest

pub mod config;
pub mod discovery;
pub mod error;
pub mod github;
pub mod manifest;
pub mod output;

pub use config::{Config, Scope};
pub use discovery::{RepositoryRecord, RepositorySource};
pub use error::{Error, Result};
pub use github::Session;
pub use manifest::{ManifestSettings, OutputEntry};

/// Fetch, filter, sort and render the manifest for `config` using `source`.
///
/// Nothing is returned unless every fetch succeeded.
pub async fn build_manifest<S>(source: &S, config: &Config) -> Result<String>
where
    S: RepositorySource + ?Sized,
{
    let settings = config.manifest_settings()?;
    let repositories = discovery::discover_all(
        source,
        config.personal,
        config.organizations,
        config.max_parallel,
    )
    .await?;

    manifest::generate(&repositories, &settings)
}

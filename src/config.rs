//! YAML configuration, visibility scopes and credential lookup.

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

use crate::error::{Error, Result};
use crate::manifest::{ExclusionList, ManifestSettings};

/// The public GitHub API endpoint.
pub const DEFAULT_API: &str = "https://api.github.com/";

/// Number of repositories requested per page.
pub const DEFAULT_PAGE_SIZE: u8 = 50;

/// Number of organizations fetched at the same time.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Environment variable consulted when no token is given explicitly.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

const VALID_SCOPES: &str = "Valid settings are 'public', 'private', 'none', or 'all'";

/// Visibility selector applied to personal or organizational listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Public,
    Private,
    #[default]
    All,
    /// Disables the source entirely
    None,
}

impl Scope {
    /// The value sent to the host as the listing `type` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Public => "public",
            Scope::Private => "private",
            Scope::All => "all",
            Scope::None => "none",
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != Scope::None
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "public" => Ok(Scope::Public),
            "private" => Ok(Scope::Private),
            "all" => Ok(Scope::All),
            "none" => Ok(Scope::None),
            other => Err(Error::Config(format!(
                "invalid scope '{}'. {}",
                other, VALID_SCOPES
            ))),
        }
    }
}

/// Style of the `Authorization` header sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthHeader {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `Authorization: token <token>`, required by gitbucket
    Token,
}

/// Which clone URL each manifest entry uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Ssh,
    Http,
}

/// Run-wide settings, loaded from YAML and overridden from the command line
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// API end-point of the remote git host
    #[serde(default = "default_api")]
    pub api: String,

    #[serde(default)]
    pub auth_header: AuthHeader,

    /// Personal repositories to fetch
    #[serde(default)]
    pub personal: Scope,

    /// Organizational repositories to fetch
    #[serde(default)]
    pub organizations: Scope,

    /// Include archived repositories
    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub transport: Transport,

    /// Add an `ssh://` prefix to every clone URL
    #[serde(default)]
    pub ssh_scheme: bool,

    /// Comma-separated exclusion terms
    #[serde(default)]
    pub exclude: String,

    /// Local directory beneath which repositories are placed
    pub prefix: Option<String>,

    /// Output file; standard output when unset
    pub output: Option<PathBuf>,

    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    #[serde(default = "default_page_size")]
    pub page_size: u8,
}

fn default_api() -> String {
    DEFAULT_API.to_string()
}
fn default_max_parallel() -> usize {
    DEFAULT_MAX_PARALLEL
}
fn default_page_size() -> u8 {
    DEFAULT_PAGE_SIZE
}

fn expand(path: &str) -> Result<String> {
    shellexpand::full(path)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| Error::Config(format!("failed to expand path '{}': {}", path, e)))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: default_api(),
            auth_header: AuthHeader::default(),
            personal: Scope::default(),
            organizations: Scope::default(),
            archived: false,
            transport: Transport::default(),
            ssh_scheme: false,
            exclude: String::new(),
            prefix: None,
            output: None,
            max_parallel: default_max_parallel(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load the given file, else the default location if it exists, else defaults.
    ///
    /// Nothing is written to disk.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_config_path() {
            Some(default_path) if default_path.exists() => Self::load(&default_path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config: Config = serde_yaml::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse config file {}: {}", path.display(), e))
        })?;

        config.expand_paths()?;
        tracing::debug!("Loaded configuration from {}", path.display());

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("github2mr").join("config.yml"))
    }

    /// Expand environment variables and `~` in configured paths
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(prefix) = &mut self.prefix {
            let expanded = expand(prefix)?;
            *prefix = expanded;
        }

        // Paths that are not valid UTF-8 cannot carry variables; keep them as given.
        if let Some(output) = &mut self.output {
            if let Some(text) = output.to_str() {
                let expanded = PathBuf::from(expand(text)?);
                *output = expanded;
            }
        }
        Ok(())
    }

    /// Local prefix for manifest entries, derived from the API host when unset
    pub fn repository_prefix(&self) -> Result<String> {
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            return Ok(prefix.to_string());
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("failed to determine home directory".to_string()))?;
        default_prefix(&self.api, &home)
    }

    /// Settings for the filter and render stages of a run
    pub fn manifest_settings(&self) -> Result<ManifestSettings> {
        Ok(ManifestSettings {
            prefix: self.repository_prefix()?,
            transport: self.transport,
            ssh_scheme: self.ssh_scheme,
            include_archived: self.archived,
            exclusions: ExclusionList::parse(&self.exclude),
        })
    }

    /// Reject settings which would make the run misbehave
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".to_string()));
        }
        if self.max_parallel == 0 {
            return Err(Error::Config("max_parallel must be at least 1".to_string()));
        }
        self.repository_prefix()?;
        if !self.personal.is_enabled() && !self.organizations.is_enabled() {
            tracing::warn!("Both personal and organizational repositories are disabled");
        }
        Ok(())
    }
}

/// Build `<home>/Repos/<host>` from the API end-point.
///
/// The public API host `api.github.com` maps to `github.com`.
pub fn default_prefix(api: &str, home: &Path) -> Result<String> {
    let url = Url::parse(api)
        .map_err(|e| Error::Config(format!("invalid API URL '{}': {}", api, e)))?;

    let host = match url.host_str() {
        Some("api.github.com") => "github.com",
        Some(host) => host,
        None => return Err(Error::Config(format!("API URL '{}' has no host", api))),
    };

    Ok(format!("{}/Repos/{}", home.display(), host))
}

/// Pick the explicit token, else the environment variable.
pub fn resolve_token(explicit: Option<String>) -> Result<String> {
    token_from(explicit, std::env::var(TOKEN_ENV_VAR).ok())
}

fn token_from(explicit: Option<String>, env_value: Option<String>) -> Result<String> {
    explicit
        .filter(|token| !token.is_empty())
        .or_else(|| env_value.filter(|token| !token.is_empty()))
        .ok_or_else(|| Error::Config("Please specify your github token!".to_string()))
}

//! Common test utilities and helpers for github2mr tests
#![allow(dead_code)]

use async_trait::async_trait;
use github2mr::discovery::{OrganizationPage, Owner, RepositoryPage};
use github2mr::{Error, RepositoryRecord, RepositorySource, Result, Scope};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Isolated HOME / XDG config directory for running the binary
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub config_home: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join("home");
        let config_home = temp_dir.path().join("config");
        std::fs::create_dir_all(&home).expect("Failed to create home dir");
        std::fs::create_dir_all(&config_home).expect("Failed to create config dir");

        Self {
            temp_dir,
            home,
            config_home,
        }
    }

    /// The binary, with no token and no user configuration visible
    pub fn command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(env!("CARGO_BIN_EXE_github2mr"));
        command
            .env_remove("GITHUB_TOKEN")
            .env_remove("RUST_LOG")
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", &self.config_home);
        command
    }

    pub fn create_config(&self, content: &str) -> PathBuf {
        let config_path = self.temp_dir.path().join("config.yml");
        std::fs::write(&config_path, content).expect("Failed to write test config");
        config_path
    }
}

/// Mock repository data for testing
#[derive(Debug, Clone)]
pub struct MockRepository {
    pub full_name: String,
    pub archived: bool,
    pub host: String,
    pub ssh_url: Option<String>,
}

impl MockRepository {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            full_name: format!("{}/{}", owner, name),
            archived: false,
            host: "host".to_string(),
            ssh_url: None,
        }
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn on_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_ssh_url(mut self, url: &str) -> Self {
        self.ssh_url = Some(url.to_string());
        self
    }

    pub fn record(&self) -> RepositoryRecord {
        RepositoryRecord {
            full_name: self.full_name.clone(),
            archived: self.archived,
            ssh_clone_url: self
                .ssh_url
                .clone()
                .unwrap_or_else(|| format!("git@{}:{}.git", self.host, self.full_name)),
            http_clone_url: format!("https://{}/{}.git", self.host, self.full_name),
        }
    }
}

/// In-memory GitHub-compatible host serving fixed-size pages
pub struct MockHost {
    page_size: usize,
    personal: Vec<RepositoryRecord>,
    organizations: Vec<(String, Vec<RepositoryRecord>)>,
    failing_owner: Option<Owner>,
    pub requests: AtomicUsize,
}

impl MockHost {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            personal: Vec::new(),
            organizations: Vec::new(),
            failing_owner: None,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn with_personal(mut self, repos: &[MockRepository]) -> Self {
        self.personal = repos.iter().map(MockRepository::record).collect();
        self
    }

    pub fn with_organization(mut self, org: &str, repos: &[MockRepository]) -> Self {
        self.organizations.push((
            org.to_string(),
            repos.iter().map(MockRepository::record).collect(),
        ));
        self
    }

    pub fn failing_for(mut self, owner: Owner) -> Self {
        self.failing_owner = Some(owner);
        self
    }

    fn listing(&self, owner: &Owner) -> Vec<RepositoryRecord> {
        match owner {
            Owner::Personal => self.personal.clone(),
            Owner::Organization(org) => self
                .organizations
                .iter()
                .find(|(name, _)| name == org)
                .map(|(_, repos)| repos.clone())
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl RepositorySource for MockHost {
    type Cursor = usize;

    async fn organization_page(&self, _cursor: Option<usize>) -> Result<OrganizationPage<usize>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(OrganizationPage {
            organizations: self.organizations.iter().map(|(name, _)| name.clone()).collect(),
            next: None,
        })
    }

    async fn repository_page(
        &self,
        owner: &Owner,
        _scope: Scope,
        cursor: Option<usize>,
    ) -> Result<RepositoryPage<usize>> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.failing_owner.as_ref() == Some(owner) {
            return Err(Error::Fetch {
                what: owner.describe(),
                message: "403 Forbidden".to_string(),
                source: None,
            });
        }

        let repos = self.listing(owner);
        let start = cursor.unwrap_or(0);
        let end = (start + self.page_size).min(repos.len());
        let next = (end < repos.len()).then_some(end);

        Ok(RepositoryPage {
            repositories: repos[start.min(end)..end].to_vec(),
            next,
        })
    }
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}

//! Authenticated access to a GitHub-compatible REST API.

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use octocrab::{Octocrab, Page};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::{AuthHeader, Scope, DEFAULT_API, DEFAULT_PAGE_SIZE};
use crate::discovery::{OrganizationPage, Owner, RepositoryPage, RepositoryRecord, RepositorySource};
use crate::error::{Error, Result};

/// Authenticated client bound to a resolved API end-point
///
/// Built once per run by [`Session::login`] and handed by reference to the
/// fetchers; there is no process-wide client.
#[derive(Debug)]
pub struct Session {
    client: Octocrab,
    api: Url,
    page_size: u8,
}

/// Identity returned by `GET /user`
#[derive(Debug, Deserialize)]
struct Identity {
    #[serde(default)]
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

/// The subset of the repository payload the manifest needs.
///
/// Self-hosted hosts omit many fields octocrab's own model requires, so only
/// these are read.
#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    full_name: Option<String>,
    owner: Option<ApiOwner>,
    archived: Option<bool>,
    ssh_url: Option<String>,
    clone_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiOrganization {
    login: String,
}

impl From<ApiRepository> for RepositoryRecord {
    fn from(repo: ApiRepository) -> Self {
        let full_name = repo.full_name.unwrap_or_else(|| match &repo.owner {
            Some(owner) => format!("{}/{}", owner.login, repo.name),
            None => repo.name.clone(),
        });

        RepositoryRecord {
            full_name,
            archived: repo.archived.unwrap_or(false),
            ssh_clone_url: repo.ssh_url.unwrap_or_default(),
            http_clone_url: repo.clone_url.unwrap_or_default(),
        }
    }
}

/// Append the versioned `api/v3/` segment to self-hosted end-points.
///
/// The public GitHub end-point is used unchanged.
pub fn normalize_api_url(api: &str) -> Result<Url> {
    let mut resolved = api.to_string();

    if resolved != DEFAULT_API && !resolved.ends_with("/api/v3/") {
        if !resolved.ends_with('/') {
            resolved.push('/');
        }
        resolved.push_str("api/v3/");
    }

    Url::parse(&resolved)
        .map_err(|e| Error::Config(format!("invalid API URL '{}': {}", resolved, e)))
}

impl Session {
    /// Connect to `api` with `token` and confirm the credential by looking up
    /// the caller's own identity.
    pub async fn login(api: &str, token: &str, auth_header: AuthHeader) -> Result<Self> {
        let api = normalize_api_url(api)?;
        debug!("Using API end-point {}", api);

        // Routes are always absolute, so the client only needs the origin.
        let builder = Octocrab::builder()
            .base_uri(api.origin().ascii_serialization())
            .map_err(|e| Error::Config(format!("invalid API URL '{}': {}", api, e)))?;

        let builder = match auth_header {
            AuthHeader::Bearer => builder.personal_token(token.to_string()),
            AuthHeader::Token => builder.add_header(AUTHORIZATION, format!("token {}", token)),
        };

        let client = builder.build().map_err(|e| Error::Auth {
            message: "failed to create API client".to_string(),
            source: Some(e),
        })?;

        let route = endpoint(&api, "user")?;
        let identity: Identity =
            client
                .get(route.as_str(), None::<&()>)
                .await
                .map_err(|e| Error::Auth {
                    message: e.to_string(),
                    source: Some(e),
                })?;

        if identity.login.is_empty() {
            return Err(Error::Auth {
                message: "we failed to find our username, which suggests our login failed"
                    .to_string(),
                source: None,
            });
        }

        info!("Authenticated as: {}", identity.login);

        Ok(Self {
            client,
            api,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the number of repositories requested per page
    pub fn with_page_size(mut self, page_size: u8) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn first_page_url(&self, owner: &Owner, scope: Scope) -> Result<Url> {
        let path = match owner {
            Owner::Personal => "user/repos".to_string(),
            Owner::Organization(org) => format!("orgs/{}/repos", org),
        };

        let mut url = endpoint(&self.api, &path)?;
        url.query_pairs_mut()
            .append_pair("type", scope.as_str())
            .append_pair("per_page", &self.page_size.to_string());
        Ok(url)
    }

    async fn page<T>(&self, url: &str, what: &str) -> Result<Page<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.client
            .get(url, None::<&()>)
            .await
            .map_err(|e| Error::fetch(what, e))
    }
}

fn endpoint(api: &Url, path: &str) -> Result<Url> {
    api.join(path)
        .map_err(|e| Error::Config(format!("invalid API route '{}': {}", path, e)))
}

#[async_trait]
impl RepositorySource for Session {
    /// Absolute URL of the next page, as advertised by the host
    type Cursor = String;

    async fn organization_page(&self, cursor: Option<String>) -> Result<OrganizationPage<String>> {
        let url = match cursor {
            Some(url) => url,
            None => {
                let mut url = endpoint(&self.api, "user/orgs")?;
                url.query_pairs_mut()
                    .append_pair("per_page", &self.page_size.to_string());
                url.to_string()
            }
        };

        let page: Page<ApiOrganization> = self.page(&url, "organizations").await?;

        Ok(OrganizationPage {
            organizations: page.items.into_iter().map(|org| org.login).collect(),
            next: page.next.map(|uri| uri.to_string()),
        })
    }

    async fn repository_page(
        &self,
        owner: &Owner,
        scope: Scope,
        cursor: Option<String>,
    ) -> Result<RepositoryPage<String>> {
        let url = match cursor {
            Some(url) => url,
            None => self.first_page_url(owner, scope)?.to_string(),
        };

        let page: Page<ApiRepository> = self.page(&url, &owner.describe()).await?;

        Ok(RepositoryPage {
            repositories: page.items.into_iter().map(RepositoryRecord::from).collect(),
            next: page.next.map(|uri| uri.to_string()),
        })
    }
}

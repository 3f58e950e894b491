//! Repository discovery abstraction layer
//!
//! The host is reached through [`RepositorySource`], a capability that lists
//! repositories one page at a time given an opaque cursor. The fetchers in
//! this module turn that capability into complete personal and organizational
//! repository sets.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::config::Scope;
use crate::error::{Error, Result};

/// One discovered repository, read-only once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    /// `owner/name`
    pub full_name: String,
    pub archived: bool,
    pub ssh_clone_url: String,
    pub http_clone_url: String,
}

/// Whose repositories a listing refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    /// The authenticated identity
    Personal,
    /// An organization the identity belongs to
    Organization(String),
}

impl Owner {
    pub fn describe(&self) -> String {
        match self {
            Owner::Personal => "personal repositories".to_string(),
            Owner::Organization(org) => format!("repositories of organization {}", org),
        }
    }
}

/// A single page returned by the host
#[derive(Debug, Clone)]
pub struct RepositoryPage<C> {
    pub repositories: Vec<RepositoryRecord>,
    /// Cursor for the following page, `None` once the listing is exhausted
    pub next: Option<C>,
}

/// A single page of organization logins
#[derive(Debug, Clone)]
pub struct OrganizationPage<C> {
    pub organizations: Vec<String>,
    pub next: Option<C>,
}

/// Paged listing capability of a GitHub-compatible host
///
/// Passing `None` as the cursor requests the first page.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Opaque position within a listing
    type Cursor: Send + Sync;

    async fn organization_page(
        &self,
        cursor: Option<Self::Cursor>,
    ) -> Result<OrganizationPage<Self::Cursor>>;

    async fn repository_page(
        &self,
        owner: &Owner,
        scope: Scope,
        cursor: Option<Self::Cursor>,
    ) -> Result<RepositoryPage<Self::Cursor>>;
}

enum Paging<C> {
    Start,
    Next(C),
    Done,
}

impl<C> Paging<C> {
    fn after(next: Option<C>) -> Self {
        match next {
            Some(cursor) => Paging::Next(cursor),
            None => Paging::Done,
        }
    }
}

/// Lazily yield every repository of `owner` matching `scope`.
///
/// Each call starts again from the first page. Pages are requested until the
/// host stops returning a next-page cursor; the first failed page ends the
/// stream with that error.
pub fn repository_stream<'a, S>(
    source: &'a S,
    owner: Owner,
    scope: Scope,
) -> impl Stream<Item = Result<RepositoryRecord>> + Send + 'a
where
    S: RepositorySource + ?Sized,
{
    stream::try_unfold(Paging::Start, move |paging| {
        let owner = owner.clone();
        async move {
            let cursor = match paging {
                Paging::Start => None,
                Paging::Next(cursor) => Some(cursor),
                Paging::Done => return Ok(None),
            };

            let page = source.repository_page(&owner, scope, cursor).await?;
            debug!(
                "Fetched page of {} {}",
                page.repositories.len(),
                owner.describe()
            );

            Ok::<_, Error>(Some((
                stream::iter(page.repositories.into_iter().map(Ok::<_, Error>)),
                Paging::after(page.next),
            )))
        }
    })
    .try_flatten()
}

/// Lazily yield the login of every organization the identity belongs to.
pub fn organization_stream<'a, S>(source: &'a S) -> impl Stream<Item = Result<String>> + Send + 'a
where
    S: RepositorySource + ?Sized,
{
    stream::try_unfold(Paging::Start, move |paging| async move {
        let cursor = match paging {
            Paging::Start => None,
            Paging::Next(cursor) => Some(cursor),
            Paging::Done => return Ok(None),
        };

        let page = source.organization_page(cursor).await?;
        Ok::<_, Error>(Some((
            stream::iter(page.organizations.into_iter().map(Ok::<_, Error>)),
            Paging::after(page.next),
        )))
    })
    .try_flatten()
}

/// Fetch every personal repository matching `scope`, in host order.
pub async fn fetch_personal<S>(source: &S, scope: Scope) -> Result<Vec<RepositoryRecord>>
where
    S: RepositorySource + ?Sized,
{
    let repositories: Vec<RepositoryRecord> = repository_stream(source, Owner::Personal, scope)
        .try_collect()
        .await?;

    info!("Found {} personal repositories", repositories.len());
    Ok(repositories)
}

/// Fetch the repositories of every organization the identity belongs to.
///
/// Up to `max_parallel` organizations are fetched at once. Results keep the
/// organization enumeration order, then each organization's host order; the
/// first failure aborts the whole fetch.
pub async fn fetch_organizational<S>(
    source: &S,
    scope: Scope,
    max_parallel: usize,
) -> Result<Vec<RepositoryRecord>>
where
    S: RepositorySource + ?Sized,
{
    let organizations: Vec<String> = organization_stream(source).try_collect().await?;
    info!(
        "Found {} organizations: {:?}",
        organizations.len(),
        organizations
    );

    let per_org: Vec<Vec<RepositoryRecord>> = stream::iter(organizations)
        .map(|org| async move {
            let repositories: Vec<RepositoryRecord> =
                repository_stream(source, Owner::Organization(org.clone()), scope)
                    .try_collect()
                    .await?;
            info!(
                "Found {} repositories for organization: {}",
                repositories.len(),
                org
            );
            Ok::<_, Error>(repositories)
        })
        .buffered(max_parallel.max(1))
        .try_collect()
        .await?;

    Ok(per_org.into_iter().flatten().collect())
}

/// Personal repositories followed by organizational ones, skipping any source
/// whose scope is [`Scope::None`].
pub async fn discover_all<S>(
    source: &S,
    personal: Scope,
    organizations: Scope,
    max_parallel: usize,
) -> Result<Vec<RepositoryRecord>>
where
    S: RepositorySource + ?Sized,
{
    let mut all_repositories = Vec::new();

    if personal.is_enabled() {
        all_repositories.extend(fetch_personal(source, personal).await?);
    }

    if organizations.is_enabled() {
        all_repositories.extend(fetch_organizational(source, organizations, max_parallel).await?);
    }

    info!("Total repositories discovered: {}", all_repositories.len());
    Ok(all_repositories)
}

//! Turning discovered repositories into the rendered clone manifest.
//!
//! Records pass through [`build_entries`] (archive filter, clone-URL
//! selection, host quirk patch, exclusion filter), are ordered by
//! [`sort_entries`] and finally expanded by [`render_manifest`].

use handlebars::{no_escape, Handlebars};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::Transport;
use crate::discovery::RepositoryRecord;
use crate::error::Result;

/// Name printed in the manifest header
pub const TOOL_NAME: &str = "github2mr";

/// Malformed separator some self-hosted git services emit after a port.
const PORT_QUIRK: &str = ":4444:";
const PORT_QUIRK_FIXED: &str = ":4444/";

const MANIFEST_TEMPLATE: &str = "# Generated by {{tool}} - {{count}} repositories\
{{#each entries}}\n\n[{{prefix}}/{{name}}]\ncheckout = git clone {{source}}{{/each}}\n";

/// One block of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputEntry {
    /// Local directory beneath which the repository lives
    pub prefix: String,
    /// `owner/name`
    pub name: String,
    /// Normalized clone URL
    pub source: String,
}

/// Case-folded, trimmed exclusion terms. Empty terms are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    terms: Vec<String>,
}

impl ExclusionList {
    /// Parse a comma-separated list such as `"bar, baz"`.
    pub fn parse(list: &str) -> Self {
        let terms = list
            .split(',')
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether `clone_url` contains any term, ignoring case
    pub fn excludes(&self, clone_url: &str) -> bool {
        let clone_url = clone_url.to_lowercase();
        self.terms.iter().any(|term| clone_url.contains(term.as_str()))
    }
}

/// Run-wide settings applied to every repository
#[derive(Debug, Clone)]
pub struct ManifestSettings {
    pub prefix: String,
    pub transport: Transport,
    /// Prepend `ssh://` to the chosen clone URL
    pub ssh_scheme: bool,
    pub include_archived: bool,
    pub exclusions: ExclusionList,
}

/// Rewrite the `:4444:` separator quirk to `:4444/`.
pub fn patch_port_quirk(clone_url: &str) -> String {
    clone_url.replace(PORT_QUIRK, PORT_QUIRK_FIXED)
}

/// Pick the clone URL for `repo` and normalize it.
pub fn clone_url(repo: &RepositoryRecord, settings: &ManifestSettings) -> String {
    let chosen = match settings.transport {
        Transport::Http => &repo.http_clone_url,
        Transport::Ssh => &repo.ssh_clone_url,
    };

    let chosen = if settings.ssh_scheme {
        format!("ssh://{}", chosen)
    } else {
        chosen.clone()
    };

    patch_port_quirk(&chosen)
}

/// Apply the archive and exclusion filters and project each surviving
/// repository onto an [`OutputEntry`]. Input order is kept.
pub fn build_entries(repos: &[RepositoryRecord], settings: &ManifestSettings) -> Vec<OutputEntry> {
    repos
        .iter()
        .filter_map(|repo| {
            if repo.archived && !settings.include_archived {
                debug!("Skipping archived repository: {}", repo.full_name);
                return None;
            }

            let source = clone_url(repo, settings);
            if settings.exclusions.excludes(&source) {
                debug!("Excluding repository: {}", repo.full_name);
                return None;
            }

            Some(OutputEntry {
                prefix: settings.prefix.clone(),
                name: repo.full_name.clone(),
                source,
            })
        })
        .collect()
}

/// Order entries by name, ignoring case.
///
/// Entries whose names differ only in case keep their relative order.
pub fn sort_entries(entries: &mut [OutputEntry]) {
    entries.sort_by_cached_key(|entry| entry.name.to_lowercase());
}

/// Names present more than once in `entries`, in order of second appearance.
///
/// Duplicates are kept in the manifest; this only reports them.
pub fn duplicate_names(entries: &[OutputEntry]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for entry in entries {
        let name = entry.name.as_str();
        if !seen.insert(name) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

#[derive(Serialize)]
struct ManifestContext<'a> {
    tool: &'a str,
    count: usize,
    entries: &'a [OutputEntry],
}

/// Expand the manifest template over ordered `entries`.
pub fn render_manifest(entries: &[OutputEntry]) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(no_escape);
    handlebars.register_template_string("manifest", MANIFEST_TEMPLATE)?;

    let context = ManifestContext {
        tool: TOOL_NAME,
        count: entries.len(),
        entries,
    };

    Ok(handlebars.render("manifest", &context)?)
}

/// Filter, sort and render `repos` in one step.
pub fn generate(repos: &[RepositoryRecord], settings: &ManifestSettings) -> Result<String> {
    let mut entries = build_entries(repos, settings);
    sort_entries(&mut entries);

    for name in duplicate_names(&entries) {
        warn!("Repository listed more than once: {}", name);
    }

    debug!(
        "Rendering {} of {} repositories",
        entries.len(),
        repos.len()
    );
    render_manifest(&entries)
}

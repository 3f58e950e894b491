use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use github2mr::config::{resolve_token, AuthHeader, Transport};
use github2mr::{build_manifest, output, Config, Scope, Session};

#[derive(Parser)]
#[command(name = "github2mr")]
#[command(about = "Generate an mr configuration for every repository on a GitHub-compatible host")]
#[command(version)]
struct Cli {
    /// The API end-point to use for the remote git-host
    #[arg(long)]
    api: Option<String>,

    /// The API token used to authenticate to the remote API-host (defaults to $GITHUB_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Use an authorization-header including 'token' rather than 'bearer' (needed by gitbucket)
    #[arg(long)]
    auth_header_token: bool,

    /// Which personal repositories to fetch: public, private, none, or all
    #[arg(long)]
    personal: Option<Scope>,

    /// Which organizational repositories to fetch: public, private, none, or all
    #[arg(long)]
    organizations: Option<Scope>,

    /// Include archived repositories in the output
    #[arg(long)]
    archived: bool,

    /// Generate HTTP-based clones rather than SSH-based ones
    #[arg(long)]
    http: bool,

    /// Add 'ssh://'-prefix to the git clone command
    #[arg(long)]
    ssh: bool,

    /// Comma-separated list of repositories to exclude
    #[arg(long)]
    exclude: Option<String>,

    /// Write output to the named file, instead of printing to STDOUT
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The prefix beneath which to store the repositories upon the current system
    #[arg(long)]
    prefix: Option<String>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    debug!("Starting github2mr v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    config.validate()?;
    let token = resolve_token(cli.token.clone())?;

    let session = Session::login(&config.api, &token, config.auth_header)
        .await?
        .with_page_size(config.page_size);

    let manifest = build_manifest(&session, &config)
        .await
        .context("No manifest written")?;

    output::emit(&manifest, config.output.as_deref())?;
    info!("Done");

    Ok(())
}

/// Initialize logging on stderr; stdout may carry the manifest
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

/// Load the configuration file and apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;

    if let Some(api) = &cli.api {
        config.api = api.clone();
    }
    if cli.auth_header_token {
        config.auth_header = AuthHeader::Token;
    }
    if let Some(personal) = cli.personal {
        config.personal = personal;
    }
    if let Some(organizations) = cli.organizations {
        config.organizations = organizations;
    }
    if cli.archived {
        config.archived = true;
    }
    if cli.http {
        config.transport = Transport::Http;
    }
    if cli.ssh {
        config.ssh_scheme = true;
    }
    if let Some(exclude) = &cli.exclude {
        config.exclude = exclude.clone();
    }
    if let Some(output) = &cli.output {
        config.output = Some(output.clone());
    }
    if let Some(prefix) = &cli.prefix {
        config.prefix = Some(prefix.clone());
    }

    Ok(config)
}

//! Command-line interface for the places recommendation engine.
//!
//! Every subcommand opens the SQLite site database (default `places.db`),
//! runs one engine operation and prints its result to stdout as pretty JSON.
//! Arguments are layered by `ortho_config`: CLI flags override `PLACES_*`
//! environment variables, which override configuration files.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use places_core::{SiteId, SqliteSiteStore, UserId};
use serde::Serialize;

mod catalog;
mod error;
mod fs;
mod query;
mod review;

pub use error::CliError;

use catalog::{IngestArgs, RefreshArgs, ResetArgs, ShowArgs, SitesArgs};
use query::{NearestArgs, RelatedArgs, SimilarArgs};
use review::{LikeArgs, OpinionArgs, RateArgs, VisitArgs};

/// Database used when no `--database` is configured.
pub(crate) const DEFAULT_DATABASE: &str = "places.db";

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_SITE: &str = "site";
pub(crate) const ARG_USER: &str = "user";

/// Run the places CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout)
}

pub(crate) fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Ingest(args) => catalog::run_ingest(args, writer),
        Command::Refresh(args) => catalog::run_refresh(args, writer),
        Command::Reset(args) => catalog::run_reset(args, writer),
        Command::Show(args) => catalog::run_show(args, writer),
        Command::Sites(args) => catalog::run_sites(args, writer),
        Command::Nearest(args) => query::run_nearest(args, writer),
        Command::Similar(args) => query::run_similar(args, writer),
        Command::Related(args) => query::run_related(args, writer),
        Command::Visit(args) => review::run_visit(args, writer),
        Command::Like(args) => review::run_like(args, writer),
        Command::Rate(args) => review::run_rate(args, writer),
        Command::Opinion(args) => review::run_opinion(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "places",
    about = "Recommend nearby and similar places from a local site database",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Load sites from a JSON catalog.
    Ingest(IngestArgs),
    /// Recompute the neighbour cache of every site.
    Refresh(RefreshArgs),
    /// Delete reviews, or the whole catalog.
    Reset(ResetArgs),
    /// Print one site with its aggregates.
    Show(ShowArgs),
    /// List every site in catalog order.
    Sites(SitesArgs),
    /// Show the cached nearest sites for a site.
    Nearest(NearestArgs),
    /// Show the cached similar sites for a site.
    Similar(SimilarArgs),
    /// Show the best-rated sites sharing a category with a site.
    Related(RelatedArgs),
    /// Record that a user visited a site.
    Visit(VisitArgs),
    /// Toggle a user's like for a site.
    Like(LikeArgs),
    /// Set, change or clear a user's rating for a site.
    Rate(RateArgs),
    /// Store a user's written opinion of a site.
    Opinion(OpinionArgs),
}

/// Resolve the configured database path, falling back to [`DEFAULT_DATABASE`].
pub(crate) fn database_or_default(database: Option<Utf8PathBuf>) -> Utf8PathBuf {
    database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE))
}

/// Open the site database, creating its parent directory when missing.
pub(crate) fn open_store(path: &Utf8Path) -> Result<SqliteSiteStore, CliError> {
    fs::ensure_parent_dir(path).map_err(|source| CliError::CreateParent {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SqliteSiteStore::open(path.as_std_path())?)
}

pub(crate) fn require<T>(
    value: Option<T>,
    field: &'static str,
    env: &'static str,
) -> Result<T, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

pub(crate) fn parse_site_id(
    raw: Option<String>,
    field: &'static str,
    env: &'static str,
) -> Result<SiteId, CliError> {
    SiteId::new(require(raw, field, env)?).map_err(|source| CliError::InvalidId { field, source })
}

pub(crate) fn parse_user_id(
    raw: Option<String>,
    field: &'static str,
    env: &'static str,
) -> Result<UserId, CliError> {
    UserId::new(require(raw, field, env)?).map_err(|source| CliError::InvalidId { field, source })
}

/// Write `value` to `writer` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;

//! Catalog maintenance commands: `ingest`, `refresh` and `reset`.

use std::{collections::HashSet, io::BufReader, io::Write, time::SystemTime};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use places_core::{Site, SiteDraft, SiteStore};
use places_recommender::{RecommendationIndex, ReviewLedger};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_SITE, CliError, database_or_default, fs::open_utf8_file, open_store,
    parse_site_id, require, write_json,
};

pub(crate) const ARG_CATALOG: &str = "catalog";
pub(crate) const ARG_REVIEWS_ONLY: &str = "reviews-only";
pub(crate) const ENV_INGEST_CATALOG: &str = "PLACES_CMDS_INGEST_CATALOG";
pub(crate) const ENV_SHOW_SITE: &str = "PLACES_CMDS_SHOW_SITE";

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Validate every entry of a JSON catalog (an array of site \
                 documents) and upsert the sites into the database. The whole \
                 catalog is rejected when any entry is invalid. Visit, like \
                 and rating aggregates of sites already in the database are \
                 preserved.",
    about = "Load sites from a JSON catalog"
)]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct IngestArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Path to the JSON catalog.
    #[arg(long = ARG_CATALOG, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog: Option<Utf8PathBuf>,
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) catalog: Utf8PathBuf,
}

impl IngestArgs {
    fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            catalog: require(args.catalog, ARG_CATALOG, ENV_INGEST_CATALOG)?,
            database: database_or_default(args.database),
        })
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestConfig::try_from(merged)
}

/// Summary printed after a successful ingest.
#[derive(Debug, Serialize)]
struct IngestSummary {
    database: Utf8PathBuf,
    ingested: usize,
}

pub(crate) fn run_ingest(args: IngestArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let sites = load_catalog(&config.catalog, SystemTime::now())?;
    let store = open_store(&config.database)?;
    for site in sites.iter().cloned() {
        upsert_preserving_stats(&store, site)?;
    }
    info!("ingested {} sites into {}", sites.len(), config.database);
    write_json(
        writer,
        &IngestSummary {
            database: config.database,
            ingested: sites.len(),
        },
    )
}

/// Parse and validate every entry of the catalog at `path`.
pub(crate) fn load_catalog(path: &Utf8Path, now: SystemTime) -> Result<Vec<Site>, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenCatalog {
        path: path.to_path_buf(),
        source,
    })?;
    let drafts: Vec<SiteDraft> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            CliError::ParseCatalog {
                path: path.to_path_buf(),
                source,
            }
        })?;

    let mut seen = HashSet::with_capacity(drafts.len());
    drafts
        .into_iter()
        .enumerate()
        .map(|(position, draft)| {
            let site = draft
                .into_site(now)
                .map_err(|source| CliError::InvalidCatalogEntry {
                    path: path.to_path_buf(),
                    position,
                    source,
                })?;
            if !seen.insert(site.id.clone()) {
                return Err(CliError::DuplicateCatalogEntry {
                    path: path.to_path_buf(),
                    position,
                    site_id: site.id,
                });
            }
            Ok(site)
        })
        .collect()
}

fn upsert_preserving_stats(store: &impl SiteStore, mut site: Site) -> Result<(), CliError> {
    let existing = store.site(&site.id).map_err(|source| CliError::Store {
        operation: "look up existing site",
        source,
    })?;
    if let Some(previous) = existing {
        site.stats = previous.stats;
        site.created_at = previous.created_at;
    }
    store.put_site(&site).map_err(|source| CliError::Store {
        operation: "write site",
        source,
    })
}

/// CLI arguments for the `show` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Print one site with its visit, like and rating aggregates")]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct ShowArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the site to print.
    #[arg(long = ARG_SITE, value_name = "id")]
    #[serde(default)]
    pub(crate) site: Option<String>,
}

pub(crate) fn run_show(args: ShowArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let site_id = parse_site_id(merged.site, ARG_SITE, ENV_SHOW_SITE)?;
    let store = open_store(&database_or_default(merged.database))?;
    let site = store
        .site(&site_id)
        .map_err(|source| CliError::Store {
            operation: "look up site",
            source,
        })?
        .ok_or(CliError::SiteNotFound { site_id })?;
    write_json(writer, &site)
}

/// CLI arguments for the `sites` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "List every site in catalog order")]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct SitesArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

pub(crate) fn run_sites(args: SitesArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = open_store(&database_or_default(merged.database))?;
    let sites = store.sites().map_err(|source| CliError::Store {
        operation: "read catalog",
        source,
    })?;
    write_json(writer, &sites)
}

/// CLI arguments for the `refresh` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Recompute the three nearest and three similar sites of \
                 every site in the catalog. The pass scans the catalog once \
                 per site; sites that fail are reported and skipped.",
    about = "Recompute every neighbour cache"
)]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct RefreshArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

pub(crate) fn run_refresh(args: RefreshArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = open_store(&database_or_default(merged.database))?;
    let report = RecommendationIndex::new(&store).refresh_all()?;
    write_json(writer, &report)
}

/// CLI arguments for the `reset` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Delete every site with its reviews and neighbour caches. With \
                 --reviews-only, delete just the review records and zero the \
                 visit, like and rating aggregates they fed.",
    about = "Delete every review, or every site with its reviews and caches"
)]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct ResetArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Only delete review records and their aggregates, keeping sites and caches.
    #[arg(long = ARG_REVIEWS_ONLY)]
    #[serde(default)]
    pub(crate) reviews_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ResetScope {
    Reviews,
    Catalog,
}

#[derive(Debug, Serialize)]
struct ResetSummary {
    scope: ResetScope,
    removed: u64,
}

pub(crate) fn run_reset(args: ResetArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = open_store(&database_or_default(merged.database))?;
    let summary = if merged.reviews_only {
        ResetSummary {
            scope: ResetScope::Reviews,
            removed: ReviewLedger::new(&store).reset()?,
        }
    } else {
        ResetSummary {
            scope: ResetScope::Catalog,
            removed: store.clear_catalog().map_err(|source| CliError::Store {
                operation: "clear catalog",
                source,
            })?,
        }
    };
    info!("reset {:?}: removed {}", summary.scope, summary.removed);
    write_json(writer, &summary)
}

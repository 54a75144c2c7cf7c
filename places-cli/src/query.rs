//! Recommendation read commands: `nearest`, `similar` and `related`.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use places_core::{Categories, NEIGHBOR_LIMIT, Site, SiteId};
use places_recommender::{RELATED_LIMIT, RecommendationIndex};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_SITE, CliError, database_or_default, open_store, parse_site_id, write_json,
};

pub(crate) const ARG_LIMIT: &str = "limit";
pub(crate) const ENV_NEAREST_SITE: &str = "PLACES_CMDS_NEAREST_SITE";
pub(crate) const ENV_SIMILAR_SITE: &str = "PLACES_CMDS_SIMILAR_SITE";
pub(crate) const ENV_RELATED_SITE: &str = "PLACES_CMDS_RELATED_SITE";

/// Resolved configuration shared by the read commands.
///
/// `limit` caps the printed list. For `nearest` and `similar` it never
/// exceeds [`NEIGHBOR_LIMIT`], the size of the cached lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) site: SiteId,
    pub(crate) limit: usize,
}

fn cached_limit(limit: Option<usize>) -> usize {
    limit.map_or(NEIGHBOR_LIMIT, |requested| requested.min(NEIGHBOR_LIMIT))
}

/// CLI arguments for the `nearest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Print up to three cached nearest sites with their distance \
                 in kilometres, closest first. Prints an empty list when the \
                 site has no cache entry; run `refresh` first.",
    about = "Show the cached nearest sites"
)]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct NearestArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the reference site.
    #[arg(long = ARG_SITE, value_name = "id")]
    #[serde(default)]
    pub(crate) site: Option<String>,
    /// Maximum number of sites to print (default and maximum 3).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl TryFrom<NearestArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: NearestArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            site: parse_site_id(args.site, ARG_SITE, ENV_NEAREST_SITE)?,
            database: database_or_default(args.database),
            limit: cached_limit(args.limit),
        })
    }
}

pub(crate) fn run_nearest(args: NearestArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = QueryConfig::try_from(merged)?;
    let store = open_store(&config.database)?;
    let mut nearest = RecommendationIndex::new(&store).nearest_sites(&config.site)?;
    nearest.truncate(config.limit);
    write_json(writer, &nearest)
}

/// CLI arguments for the `similar` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Print up to three cached sites sharing a category with the \
                 reference site, in catalog order. Prints an empty list when \
                 the site has no cache entry; run `refresh` first.",
    about = "Show the cached similar sites"
)]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct SimilarArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the reference site.
    #[arg(long = ARG_SITE, value_name = "id")]
    #[serde(default)]
    pub(crate) site: Option<String>,
    /// Maximum number of sites to print (default and maximum 3).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl TryFrom<SimilarArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: SimilarArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            site: parse_site_id(args.site, ARG_SITE, ENV_SIMILAR_SITE)?,
            database: database_or_default(args.database),
            limit: cached_limit(args.limit),
        })
    }
}

pub(crate) fn run_similar(args: SimilarArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = QueryConfig::try_from(merged)?;
    let store = open_store(&config.database)?;
    let mut similar = RecommendationIndex::new(&store).similar_sites(&config.site)?;
    similar.truncate(config.limit);
    write_json(writer, &similar)
}

/// CLI arguments for the `related` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Print the best-rated sites sharing at least one category \
                 with the reference site, best first. Ratings are read live, \
                 not from the neighbour cache.",
    about = "Show the best-rated related sites"
)]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct RelatedArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the reference site.
    #[arg(long = ARG_SITE, value_name = "id")]
    #[serde(default)]
    pub(crate) site: Option<String>,
    /// Maximum number of sites to print (default 5).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl TryFrom<RelatedArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: RelatedArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            site: parse_site_id(args.site, ARG_SITE, ENV_RELATED_SITE)?,
            database: database_or_default(args.database),
            limit: args.limit.unwrap_or(RELATED_LIMIT),
        })
    }
}

/// One row of `related` output.
#[derive(Debug, Serialize)]
struct RelatedSite {
    id: SiteId,
    name: String,
    categories: Categories,
    rating_mean: f64,
    rating_count: u64,
}

impl From<Site> for RelatedSite {
    fn from(site: Site) -> Self {
        Self {
            id: site.id,
            name: site.name,
            categories: site.categories,
            rating_mean: site.stats.rating.mean,
            rating_count: site.stats.rating.count,
        }
    }
}

pub(crate) fn run_related(args: RelatedArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = QueryConfig::try_from(merged)?;
    let store = open_store(&config.database)?;
    let related: Vec<RelatedSite> = RecommendationIndex::new(&store)
        .top_rated_related(&config.site, config.limit)?
        .into_iter()
        .map(RelatedSite::from)
        .collect();
    write_json(writer, &related)
}

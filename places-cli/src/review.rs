//! Interaction commands: `visit`, `like`, `rate` and `opinion`.
//!
//! Each command prints the user's review record as written.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use places_core::{SiteId, SqliteSiteStore, UserId};
use places_recommender::ReviewLedger;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_SITE, ARG_USER, CliError, database_or_default, open_store, parse_site_id,
    parse_user_id, require, write_json,
};

pub(crate) const ARG_VALUE: &str = "value";
pub(crate) const ARG_TEXT: &str = "text";
pub(crate) const ENV_VISIT_USER: &str = "PLACES_CMDS_VISIT_USER";
pub(crate) const ENV_VISIT_SITE: &str = "PLACES_CMDS_VISIT_SITE";
pub(crate) const ENV_LIKE_USER: &str = "PLACES_CMDS_LIKE_USER";
pub(crate) const ENV_LIKE_SITE: &str = "PLACES_CMDS_LIKE_SITE";
pub(crate) const ENV_RATE_USER: &str = "PLACES_CMDS_RATE_USER";
pub(crate) const ENV_RATE_SITE: &str = "PLACES_CMDS_RATE_SITE";
pub(crate) const ENV_RATE_VALUE: &str = "PLACES_CMDS_RATE_VALUE";
pub(crate) const ENV_OPINION_USER: &str = "PLACES_CMDS_OPINION_USER";
pub(crate) const ENV_OPINION_SITE: &str = "PLACES_CMDS_OPINION_SITE";
pub(crate) const ENV_OPINION_TEXT: &str = "PLACES_CMDS_OPINION_TEXT";

/// Resolved (user, site) target of an interaction command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InteractionConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) user: UserId,
    pub(crate) site: SiteId,
}

impl InteractionConfig {
    fn resolve(
        database: Option<Utf8PathBuf>,
        user: Option<String>,
        user_env: &'static str,
        site: Option<String>,
        site_env: &'static str,
    ) -> Result<Self, CliError> {
        Ok(Self {
            user: parse_user_id(user, ARG_USER, user_env)?,
            site: parse_site_id(site, ARG_SITE, site_env)?,
            database: database_or_default(database),
        })
    }

    /// Open the database, run `action` against a ledger and print its result.
    fn apply<T, F>(&self, writer: &mut dyn Write, action: F) -> Result<(), CliError>
    where
        T: Serialize,
        F: FnOnce(&ReviewLedger<&SqliteSiteStore>, &UserId, &SiteId) -> Result<T, CliError>,
    {
        let store = open_store(&self.database)?;
        let ledger = ReviewLedger::new(&store);
        let record = action(&ledger, &self.user, &self.site)?;
        write_json(writer, &record)
    }
}

/// CLI arguments for the `visit` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Record that a user visited a site")]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct VisitArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the visiting user.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<String>,
    /// Identifier of the visited site.
    #[arg(long = ARG_SITE, value_name = "id")]
    #[serde(default)]
    pub(crate) site: Option<String>,
}

impl TryFrom<VisitArgs> for InteractionConfig {
    type Error = CliError;

    fn try_from(args: VisitArgs) -> Result<Self, Self::Error> {
        Self::resolve(
            args.database,
            args.user,
            ENV_VISIT_USER,
            args.site,
            ENV_VISIT_SITE,
        )
    }
}

pub(crate) fn run_visit(args: VisitArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    InteractionConfig::try_from(merged)?.apply(writer, |ledger, user, site| {
        Ok(ledger.register_visit(user, site)?)
    })
}

/// CLI arguments for the `like` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Flip the user's like for the site. Running the command \
                 twice restores the original like state and count.",
    about = "Toggle a user's like for a site"
)]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct LikeArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the user.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<String>,
    /// Identifier of the site.
    #[arg(long = ARG_SITE, value_name = "id")]
    #[serde(default)]
    pub(crate) site: Option<String>,
}

impl TryFrom<LikeArgs> for InteractionConfig {
    type Error = CliError;

    fn try_from(args: LikeArgs) -> Result<Self, Self::Error> {
        Self::resolve(
            args.database,
            args.user,
            ENV_LIKE_USER,
            args.site,
            ENV_LIKE_SITE,
        )
    }
}

pub(crate) fn run_like(args: LikeArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    InteractionConfig::try_from(merged)?.apply(writer, |ledger, user, site| {
        Ok(ledger.toggle_like(user, site)?)
    })
}

/// CLI arguments for the `rate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Set the user's rating for the site on a 0-10 scale. A new \
                 value replaces the previous one; the value 6 clears the \
                 rating.",
    about = "Set, change or clear a rating"
)]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct RateArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the user.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<String>,
    /// Identifier of the site.
    #[arg(long = ARG_SITE, value_name = "id")]
    #[serde(default)]
    pub(crate) site: Option<String>,
    /// Rating between 0 and 10; 6 clears the rating.
    #[arg(long = ARG_VALUE, value_name = "0-10")]
    #[serde(default)]
    pub(crate) value: Option<u8>,
}

pub(crate) fn run_rate(args: RateArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let value = require(merged.value, ARG_VALUE, ENV_RATE_VALUE)?;
    InteractionConfig::resolve(
        merged.database,
        merged.user,
        ENV_RATE_USER,
        merged.site,
        ENV_RATE_SITE,
    )?
    .apply(writer, |ledger, user, site| {
        Ok(ledger.set_or_update_rating(user, site, value)?)
    })
}

/// CLI arguments for the `opinion` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Store a user's written opinion of a site")]
#[ortho_config(prefix = "PLACES")]
pub(crate) struct OpinionArgs {
    /// Path to the SQLite site database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the user.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<String>,
    /// Identifier of the site.
    #[arg(long = ARG_SITE, value_name = "id")]
    #[serde(default)]
    pub(crate) site: Option<String>,
    /// Opinion text; replaces any previous opinion.
    #[arg(long = ARG_TEXT, value_name = "text")]
    #[serde(default)]
    pub(crate) text: Option<String>,
}

pub(crate) fn run_opinion(args: OpinionArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let text = require(merged.text, ARG_TEXT, ENV_OPINION_TEXT)?;
    InteractionConfig::resolve(
        merged.database,
        merged.user,
        ENV_OPINION_USER,
        merged.site,
        ENV_OPINION_SITE,
    )?
    .apply(writer, |ledger, user, site| {
        Ok(ledger.record_opinion(user, site, &text)?)
    })
}

//! SQLite-backed store for the site catalog, reviews and neighbour caches.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use geo::Coord;
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use thiserror::Error;

use crate::{
    Categories, NearSite, NeighborCache, Rating, RatingAggregate, ReviewKey, ReviewRecord, Site,
    SiteId, SiteStats,
};

use super::{ReviewUpdate, SiteStore, StoreError, select_top_rated};

/// Writers wait this long for a competing transaction before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS sites (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        details TEXT NOT NULL,
        categories TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        visit_count INTEGER NOT NULL DEFAULT 0,
        like_count INTEGER NOT NULL DEFAULT 0,
        rating_count INTEGER NOT NULL DEFAULT 0,
        rating_mean REAL NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        last_visit_at INTEGER
    );
    CREATE TABLE IF NOT EXISTS reviews (
        user_id TEXT NOT NULL,
        site_id TEXT NOT NULL,
        visited INTEGER NOT NULL,
        liked INTEGER NOT NULL,
        rating INTEGER NOT NULL,
        opinion TEXT NOT NULL,
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (user_id, site_id)
    );
    CREATE TABLE IF NOT EXISTS neighbor_cache (
        site_id TEXT PRIMARY KEY NOT NULL,
        nearest TEXT NOT NULL,
        similar TEXT NOT NULL
    );
";

const SITE_COLUMNS: &str = "id, name, details, categories, latitude, longitude, \
     visit_count, like_count, rating_count, rating_mean, created_at, last_visit_at";

/// Errors raised by [`SqliteSiteStore`].
#[derive(Debug, Error)]
pub enum SqliteSiteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the tables failed.
    #[error("failed to create schema: {0}")]
    CreateSchema(#[source] rusqlite::Error),
    /// Preparing or running a statement failed.
    #[error("failed to {operation}: {source}")]
    Query {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Encoding a document column as JSON failed.
    #[error("failed to encode {column} for {key}: {source}")]
    Encode {
        /// Column being written.
        column: &'static str,
        /// Key of the document being written.
        key: String,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A previous holder of the connection panicked.
    #[error("SQLite connection lock was poisoned")]
    Poisoned,
}

impl From<SqliteSiteStoreError> for StoreError {
    fn from(err: SqliteSiteStoreError) -> Self {
        Self::Backend(Box::new(err))
    }
}

fn query(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| SqliteSiteStoreError::Query { operation, source }.into()
}

fn corrupt(key: impl fmt::Display, reason: impl fmt::Display) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn to_millis(at: SystemTime) -> i64 {
    at.duration_since(UNIX_EPOCH)
        .map_or(0, |since| i64::try_from(since.as_millis()).unwrap_or(i64::MAX))
}

fn from_millis(millis: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(u64::try_from(millis).unwrap_or(0))
}

/// Columns of a `sites` row before validation.
struct SiteRow {
    id: String,
    name: String,
    details: String,
    categories: String,
    latitude: f64,
    longitude: f64,
    stats: StatsRow,
    created_at: i64,
}

/// Aggregate columns of a `sites` row.
struct StatsRow {
    visit_count: u64,
    like_count: u64,
    rating_count: u64,
    rating_mean: f64,
    last_visit_at: Option<i64>,
}

impl SiteRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            details: row.get(2)?,
            categories: row.get(3)?,
            latitude: row.get(4)?,
            longitude: row.get(5)?,
            stats: StatsRow {
                visit_count: row.get(6)?,
                like_count: row.get(7)?,
                rating_count: row.get(8)?,
                rating_mean: row.get(9)?,
                last_visit_at: row.get(11)?,
            },
            created_at: row.get(10)?,
        })
    }

    fn into_site(self) -> Result<Site, StoreError> {
        let id = SiteId::new(self.id.clone()).map_err(|err| corrupt(&self.id, err))?;
        let categories: Categories =
            serde_json::from_str(&self.categories).map_err(|err| corrupt(&id, err))?;
        Ok(Site {
            id,
            name: self.name,
            details: self.details,
            categories,
            location: Coord {
                x: self.longitude,
                y: self.latitude,
            },
            stats: self.stats.into_stats(),
            created_at: from_millis(self.created_at),
        })
    }
}

impl StatsRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            visit_count: row.get(0)?,
            like_count: row.get(1)?,
            rating_count: row.get(2)?,
            rating_mean: row.get(3)?,
            last_visit_at: row.get(4)?,
        })
    }

    fn into_stats(self) -> SiteStats {
        SiteStats {
            visit_count: self.visit_count,
            like_count: self.like_count,
            rating: RatingAggregate {
                count: self.rating_count,
                mean: self.rating_mean,
            },
            last_visit_at: self.last_visit_at.map(from_millis),
        }
    }
}

/// Columns of a `reviews` row before validation.
struct ReviewRow {
    visited: bool,
    liked: bool,
    rating: u8,
    opinion: String,
    updated_at: i64,
}

impl ReviewRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            visited: row.get(0)?,
            liked: row.get(1)?,
            rating: row.get(2)?,
            opinion: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_record(self, key: &ReviewKey) -> Result<ReviewRecord, StoreError> {
        let rating = Rating::new(self.rating).map_err(|err| corrupt(key, err))?;
        Ok(ReviewRecord {
            key: key.clone(),
            visited: self.visited,
            liked: self.liked,
            rating,
            opinion: self.opinion,
            updated_at: from_millis(self.updated_at),
        })
    }
}

/// Read-write store backed by a single SQLite connection.
///
/// Every review update runs in an `IMMEDIATE` transaction, so the write lock
/// is held from the initial read until commit. Concurrent writers from other
/// processes wait up to five seconds for the lock.
pub struct SqliteSiteStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteSiteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSiteStore").finish_non_exhaustive()
    }
}

impl SqliteSiteStore {
    /// Open (creating when missing) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteSiteStoreError> {
        let db_path = path.as_ref();
        let connection =
            Connection::open(db_path).map_err(|source| SqliteSiteStoreError::OpenDatabase {
                path: db_path.to_path_buf(),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteSiteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteSiteStoreError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, SqliteSiteStoreError> {
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| SqliteSiteStoreError::Query {
                operation: "set busy timeout",
                source,
            })?;
        connection
            .execute_batch(SCHEMA)
            .map_err(SqliteSiteStoreError::CreateSchema)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteSiteStoreError::Poisoned.into())
    }
}

impl SiteStore for SqliteSiteStore {
    fn put_site(&self, site: &Site) -> Result<(), StoreError> {
        let categories = serde_json::to_string(&site.categories).map_err(|source| {
            SqliteSiteStoreError::Encode {
                column: "categories",
                key: site.id.to_string(),
                source,
            }
        })?;
        let stats = &site.stats;
        self.lock()?
            .execute(
                "INSERT INTO sites (id, name, details, categories, latitude, longitude,
                     visit_count, like_count, rating_count, rating_mean, created_at, last_visit_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     details = excluded.details,
                     categories = excluded.categories,
                     latitude = excluded.latitude,
                     longitude = excluded.longitude,
                     visit_count = excluded.visit_count,
                     like_count = excluded.like_count,
                     rating_count = excluded.rating_count,
                     rating_mean = excluded.rating_mean,
                     created_at = excluded.created_at,
                     last_visit_at = excluded.last_visit_at",
                params![
                    site.id.as_str(),
                    site.name,
                    site.details,
                    categories,
                    site.latitude(),
                    site.longitude(),
                    stats.visit_count,
                    stats.like_count,
                    stats.rating.count,
                    stats.rating.mean,
                    to_millis(site.created_at),
                    stats.last_visit_at.map(to_millis),
                ],
            )
            .map_err(query("write site"))?;
        Ok(())
    }

    fn site(&self, id: &SiteId) -> Result<Option<Site>, StoreError> {
        let row = self
            .lock()?
            .query_row(
                &format!("SELECT {SITE_COLUMNS} FROM sites WHERE id = ?1"),
                [id.as_str()],
                SiteRow::read,
            )
            .optional()
            .map_err(query("read site"))?;
        row.map(SiteRow::into_site).transpose()
    }

    fn sites(&self) -> Result<Vec<Site>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(&format!("SELECT {SITE_COLUMNS} FROM sites ORDER BY rowid"))
            .map_err(query("prepare catalog scan"))?;
        let rows = statement
            .query_map([], SiteRow::read)
            .map_err(query("scan catalog"))?;
        rows.map(|raw| raw.map_err(query("read catalog row"))?.into_site())
            .collect()
    }

    fn top_rated(
        &self,
        categories: &Categories,
        exclude: &SiteId,
        limit: usize,
    ) -> Result<Vec<Site>, StoreError> {
        let sites = self.sites()?;
        Ok(select_top_rated(sites, categories, exclude, limit))
    }

    fn neighbors(&self, id: &SiteId) -> Result<Option<NeighborCache>, StoreError> {
        let row: Option<(String, String)> = self
            .lock()?
            .query_row(
                "SELECT nearest, similar FROM neighbor_cache WHERE site_id = ?1",
                [id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(query("read neighbour cache"))?;
        let Some((nearest_json, similar_json)) = row else {
            return Ok(None);
        };
        let nearest: Vec<NearSite> =
            serde_json::from_str(&nearest_json).map_err(|err| corrupt(id, err))?;
        let similar: Vec<SiteId> =
            serde_json::from_str(&similar_json).map_err(|err| corrupt(id, err))?;
        Ok(Some(NeighborCache {
            site_id: id.clone(),
            nearest,
            similar,
        }))
    }

    fn put_neighbors(&self, cache: &NeighborCache) -> Result<(), StoreError> {
        let encode = |column: &'static str, source| SqliteSiteStoreError::Encode {
            column,
            key: cache.site_id.to_string(),
            source,
        };
        let nearest =
            serde_json::to_string(&cache.nearest).map_err(|source| encode("nearest", source))?;
        let similar =
            serde_json::to_string(&cache.similar).map_err(|source| encode("similar", source))?;
        self.lock()?
            .execute(
                "INSERT INTO neighbor_cache (site_id, nearest, similar) VALUES (?1, ?2, ?3)
                 ON CONFLICT(site_id) DO UPDATE SET
                     nearest = excluded.nearest,
                     similar = excluded.similar",
                params![cache.site_id.as_str(), nearest, similar],
            )
            .map_err(query("write neighbour cache"))?;
        debug!("cached neighbours for site {}", cache.site_id);
        Ok(())
    }

    fn review(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>, StoreError> {
        let row = self
            .lock()?
            .query_row(
                "SELECT visited, liked, rating, opinion, updated_at FROM reviews
                 WHERE user_id = ?1 AND site_id = ?2",
                [key.user_id.as_str(), key.site_id.as_str()],
                ReviewRow::read,
            )
            .optional()
            .map_err(query("read review"))?;
        row.map(|found| found.into_record(key)).transpose()
    }

    fn update_review(
        &self,
        key: &ReviewKey,
        now: SystemTime,
        update: &mut ReviewUpdate<'_>,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query("begin review transaction"))?;

        let stats_row = transaction
            .query_row(
                "SELECT visit_count, like_count, rating_count, rating_mean, last_visit_at
                 FROM sites WHERE id = ?1",
                [key.site_id.as_str()],
                StatsRow::read,
            )
            .optional()
            .map_err(query("read site aggregates"))?;
        let Some(stats_row) = stats_row else {
            return Ok(None);
        };
        let mut stats = stats_row.into_stats();

        let existing = transaction
            .query_row(
                "SELECT visited, liked, rating, opinion, updated_at FROM reviews
                 WHERE user_id = ?1 AND site_id = ?2",
                [key.user_id.as_str(), key.site_id.as_str()],
                ReviewRow::read,
            )
            .optional()
            .map_err(query("read review"))?;
        let mut review = match existing {
            Some(row) => row.into_record(key)?,
            None => ReviewRecord::new(key.clone(), now),
        };

        update(&mut review, &mut stats);

        transaction
            .execute(
                "INSERT INTO reviews (user_id, site_id, visited, liked, rating, opinion, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id, site_id) DO UPDATE SET
                     visited = excluded.visited,
                     liked = excluded.liked,
                     rating = excluded.rating,
                     opinion = excluded.opinion,
                     updated_at = excluded.updated_at",
                params![
                    key.user_id.as_str(),
                    key.site_id.as_str(),
                    review.visited,
                    review.liked,
                    review.rating.value(),
                    review.opinion,
                    to_millis(review.updated_at),
                ],
            )
            .map_err(query("write review"))?;
        transaction
            .execute(
                "UPDATE sites SET visit_count = ?2, like_count = ?3, rating_count = ?4,
                     rating_mean = ?5, last_visit_at = ?6
                 WHERE id = ?1",
                params![
                    key.site_id.as_str(),
                    stats.visit_count,
                    stats.like_count,
                    stats.rating.count,
                    stats.rating.mean,
                    stats.last_visit_at.map(to_millis),
                ],
            )
            .map_err(query("write site aggregates"))?;
        transaction.commit().map_err(query("commit review"))?;
        Ok(Some(review))
    }

    fn clear_reviews(&self) -> Result<u64, StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection
            .transaction()
            .map_err(query("begin review reset"))?;
        let removed = transaction
            .execute("DELETE FROM reviews", [])
            .map_err(query("clear reviews"))?;
        transaction
            .execute(
                "UPDATE sites SET visit_count = 0, like_count = 0, \
                 rating_count = 0, rating_mean = 0",
                [],
            )
            .map_err(query("reset site aggregates"))?;
        transaction.commit().map_err(query("commit review reset"))?;
        Ok(removed as u64)
    }

    fn clear_catalog(&self) -> Result<u64, StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection
            .transaction()
            .map_err(query("begin catalog reset"))?;
        transaction
            .execute("DELETE FROM neighbor_cache", [])
            .map_err(query("clear neighbour caches"))?;
        transaction
            .execute("DELETE FROM reviews", [])
            .map_err(query("clear reviews"))?;
        let removed = transaction
            .execute("DELETE FROM sites", [])
            .map_err(query("clear sites"))?;
        transaction.commit().map_err(query("commit catalog reset"))?;
        Ok(removed as u64)
    }
}

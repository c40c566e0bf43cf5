use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::error::{AccountingError, Result};
use crate::filter::{substitute_params, FilterPredicate};
use crate::lookup::LookupCache;
use crate::schema::STATS_QUERY;
use crate::types::{Dimension, Endpoint, StatsResult};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct AccountingConfig {
    pub db_path: PathBuf,
    /// How long a blocking call waits on a locked database
    pub busy_timeout: Duration,
}

impl AccountingConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Read-only session over an A-REX accounting database.
pub struct AccountingDb {
    conn: Option<Connection>,
    cache: LookupCache,
    path: PathBuf,
}

impl AccountingDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(&AccountingConfig::new(path.as_ref()))
    }

    /// Opens an existing database. Nothing is created when the file is missing.
    pub fn open_with(config: &AccountingConfig) -> Result<Self> {
        let path = config.db_path.clone();
        if !path.exists() {
            error!(path = %path.display(), "Accounting database file does not exist");
            return Err(AccountingError::NotFound(path));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&path, flags)
            .and_then(|conn| {
                conn.busy_timeout(config.busy_timeout)?;
                Ok(conn)
            })
            .map_err(|e| {
                error!(error = %e, path = %path.display(), "Failed to initialize SQLite connection");
                AccountingError::Open {
                    path: path.clone(),
                    source: e,
                }
            })?;

        debug!(path = %path.display(), "Connection to accounting database has been established");

        Ok(Self {
            conn: Some(conn),
            cache: LookupCache::new(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Closes the connection. Closing twice is a no-op.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, path = %self.path.display(), "Failed to close accounting database cleanly");
            }
            self.cache = LookupCache::new();
            info!(path = %self.path.display(), "Accounting database closed");
        }
    }

    fn session(&mut self) -> Result<(&Connection, &mut LookupCache)> {
        match self.conn.as_ref() {
            Some(conn) => Ok((conn, &mut self.cache)),
            None => Err(AccountingError::Closed),
        }
    }

    // ==================== Lookup ====================

    pub fn names(&mut self, dimension: Dimension) -> Result<Vec<String>> {
        let (conn, cache) = self.session()?;
        Ok(cache.names(conn, dimension))
    }

    pub fn queues(&mut self) -> Result<Vec<String>> {
        self.names(Dimension::Queue)
    }

    pub fn users(&mut self) -> Result<Vec<String>> {
        self.names(Dimension::User)
    }

    pub fn vos(&mut self) -> Result<Vec<String>> {
        self.names(Dimension::Vo)
    }

    pub fn statuses(&mut self) -> Result<Vec<String>> {
        self.names(Dimension::Status)
    }

    pub fn endpoint_types(&mut self) -> Result<Vec<String>> {
        self.names(Dimension::EndpointType)
    }

    pub fn resolve(&mut self, dimension: Dimension, name: &str) -> Result<Vec<i64>> {
        let (conn, cache) = self.session()?;
        Ok(cache.resolve(conn, dimension, name))
    }

    pub fn name_of(&mut self, dimension: Dimension, id: i64) -> Result<Option<String>> {
        let (conn, cache) = self.session()?;
        Ok(cache.name_of(conn, dimension, id))
    }

    pub fn endpoint(&mut self, id: i64) -> Result<Option<Endpoint>> {
        let (conn, cache) = self.session()?;
        Ok(cache.endpoints(conn).and_then(|t| t.endpoint(id)).cloned())
    }

    pub fn endpoint_id(&mut self, interface: &str, url: &str) -> Result<Option<i64>> {
        let (conn, cache) = self.session()?;
        Ok(cache.endpoints(conn).and_then(|t| t.id(interface, url)))
    }

    /// Re-reads one normalization table, replacing the cached snapshot.
    pub fn refresh(&mut self, dimension: Dimension) -> Result<()> {
        let (conn, cache) = self.session()?;
        cache.refresh(conn, dimension);
        Ok(())
    }

    pub fn refresh_all(&mut self) -> Result<()> {
        let (conn, cache) = self.session()?;
        cache.refresh_all(conn);
        Ok(())
    }

    // ==================== Filters ====================

    /// Restricts `predicate` to records whose `dimension` is one of `names`.
    ///
    /// Unknown names are skipped; when none of them is known the predicate
    /// becomes unsatisfiable instead of silently dropping the filter.
    pub fn filter(
        &mut self,
        predicate: &mut FilterPredicate,
        dimension: Dimension,
        names: &[impl AsRef<str>],
    ) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let (conn, cache) = self.session()?;

        let mut ids: Vec<i64> = Vec::new();
        for name in names {
            for id in cache.resolve(conn, dimension, name.as_ref()) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        if ids.is_empty() {
            debug!(dimension = %dimension, "No requested names resolved, result is empty");
        }
        predicate.add_ids(dimension.column(), &ids);
        Ok(())
    }

    pub fn filter_queues(&mut self, predicate: &mut FilterPredicate, queues: &[impl AsRef<str>]) -> Result<()> {
        self.filter(predicate, Dimension::Queue, queues)
    }

    pub fn filter_users(&mut self, predicate: &mut FilterPredicate, users: &[impl AsRef<str>]) -> Result<()> {
        self.filter(predicate, Dimension::User, users)
    }

    pub fn filter_vos(&mut self, predicate: &mut FilterPredicate, vos: &[impl AsRef<str>]) -> Result<()> {
        self.filter(predicate, Dimension::Vo, vos)
    }

    pub fn filter_statuses(&mut self, predicate: &mut FilterPredicate, statuses: &[impl AsRef<str>]) -> Result<()> {
        self.filter(predicate, Dimension::Status, statuses)
    }

    /// One `EndpointID IN (...)` clause over every endpoint of the given types.
    pub fn filter_endpoint_types(
        &mut self,
        predicate: &mut FilterPredicate,
        types: &[impl AsRef<str>],
    ) -> Result<()> {
        self.filter(predicate, Dimension::EndpointType, types)
    }

    // ==================== Statistics ====================

    /// Aggregates the records matching `predicate`.
    ///
    /// An unsatisfiable predicate returns the empty result without querying.
    pub fn stats(&mut self, predicate: FilterPredicate) -> Result<StatsResult> {
        let (conn, _) = self.session()?;
        if !predicate.is_satisfiable() {
            debug!("Filters match no records, skipping statistics query");
            return Ok(StatsResult::default());
        }

        let sql = format!("{}{}", STATS_QUERY, predicate.sql());
        let params = predicate.params();

        let result = conn
            .prepare_cached(&sql)
            .and_then(|mut stmt| {
                stmt.query_row(params_from_iter(params.iter()), |row| {
                    Ok(StatsResult {
                        count: row.get(0)?,
                        walltime: row.get(1)?,
                        cpu_user_time: row.get(2)?,
                        cpu_kernel_time: row.get(3)?,
                        stage_in: row.get(4)?,
                        stage_out: row.get(5)?,
                        range_start: row.get(6)?,
                        range_end: row.get(7)?,
                    })
                })
            });

        match result {
            Ok(stats) => {
                debug!(count = stats.count, filters = params.len(), "Accounting statistics computed");
                Ok(stats)
            }
            Err(e) => {
                debug!(
                    sql = %substitute_params(&sql, &params),
                    error = %e,
                    "Failed to execute query"
                );
                error!("Failed to get accounting statistics. Something goes wrong during SQL query. Use DEBUG loglevel to troubleshoot.");
                Err(AccountingError::Query { sql, source: e })
            }
        }
    }
}

impl Drop for AccountingDb {
    fn drop(&mut self) {
        self.close();
    }
}

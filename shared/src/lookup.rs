use rusqlite::Connection;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error};

use crate::schema::ENDPOINTS_QUERY;
use crate::types::{Dimension, Endpoint};

/// Snapshot of one `(ID, Name)` normalization table.
#[derive(Clone, Debug, Default)]
pub struct IdNameTable {
    by_id: HashMap<i64, String>,
    by_name: BTreeMap<String, i64>,
}

impl IdNameTable {
    pub fn fetch(conn: &Connection, table: &str) -> rusqlite::Result<Self> {
        let mut stmt = conn.prepare_cached(&format!("SELECT ID, Name FROM {}", table))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

        let mut data = Self::default();
        for row in rows {
            let (id, name) = row?;
            data.by_id.insert(id, name.clone());
            data.by_name.insert(name, id);
        }
        Ok(data)
    }

    pub fn id(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Snapshot of the `Endpoints` table indexed by id, by `<interface>:<url>`
/// and by interface type.
#[derive(Clone, Debug, Default)]
pub struct EndpointTable {
    by_id: HashMap<i64, Endpoint>,
    by_name: HashMap<String, i64>,
    by_type: BTreeMap<String, Vec<i64>>,
}

impl EndpointTable {
    pub fn fetch(conn: &Connection) -> rusqlite::Result<Self> {
        let mut stmt = conn.prepare_cached(ENDPOINTS_QUERY)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Endpoint {
                    interface: row.get(1)?,
                    url: row.get(2)?,
                },
            ))
        })?;

        let mut data = Self::default();
        for row in rows {
            let (id, endpoint) = row?;
            data.by_name.insert(endpoint.key(), id);
            data.by_type
                .entry(endpoint.interface.clone())
                .or_default()
                .push(id);
            data.by_id.insert(id, endpoint);
        }
        Ok(data)
    }

    pub fn endpoint(&self, id: i64) -> Option<&Endpoint> {
        self.by_id.get(&id)
    }

    pub fn id(&self, interface: &str, url: &str) -> Option<i64> {
        self.by_name.get(&format!("{}:{}", interface, url)).copied()
    }

    pub fn ids_of_type(&self, interface: &str) -> Option<&[i64]> {
        self.by_type.get(interface).map(Vec::as_slice)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Per-connection memo of the normalization tables.
///
/// A table is scanned on first use and kept until [`LookupCache::refresh`]
/// replaces it. A failed scan leaves the dimension unfetched and empty, so
/// filters on it match nothing.
#[derive(Debug, Default)]
pub struct LookupCache {
    queues: Option<IdNameTable>,
    users: Option<IdNameTable>,
    vos: Option<IdNameTable>,
    statuses: Option<IdNameTable>,
    endpoints: Option<EndpointTable>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_name_slot(&mut self, dimension: Dimension) -> Option<&mut Option<IdNameTable>> {
        match dimension {
            Dimension::Queue => Some(&mut self.queues),
            Dimension::User => Some(&mut self.users),
            Dimension::Vo => Some(&mut self.vos),
            Dimension::Status => Some(&mut self.statuses),
            Dimension::EndpointType => None,
        }
    }

    pub fn is_fetched(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Queue => self.queues.is_some(),
            Dimension::User => self.users.is_some(),
            Dimension::Vo => self.vos.is_some(),
            Dimension::Status => self.statuses.is_some(),
            Dimension::EndpointType => self.endpoints.is_some(),
        }
    }

    /// Scans the dimension's table unless already cached, or always when
    /// `force` is set. The previous snapshot is dropped before a forced scan.
    pub fn fetch(&mut self, conn: &Connection, dimension: Dimension, force: bool) {
        if dimension == Dimension::EndpointType {
            if self.endpoints.is_some() && !force {
                return;
            }
            self.endpoints = match EndpointTable::fetch(conn) {
                Ok(table) => {
                    debug!(endpoints = table.len(), "Fetched endpoints table");
                    Some(table)
                }
                Err(e) => {
                    error!(error = %e, table = dimension.table(), "Failed to get table data from accounting database");
                    None
                }
            };
            return;
        }

        let Some(slot) = self.id_name_slot(dimension) else {
            return;
        };
        if slot.is_some() && !force {
            return;
        }
        *slot = match IdNameTable::fetch(conn, dimension.table()) {
            Ok(table) => {
                debug!(table = dimension.table(), rows = table.len(), "Fetched normalization table");
                Some(table)
            }
            Err(e) => {
                error!(error = %e, table = dimension.table(), "Failed to get table data from accounting database");
                None
            }
        };
    }

    pub fn refresh(&mut self, conn: &Connection, dimension: Dimension) {
        self.fetch(conn, dimension, true);
    }

    pub fn refresh_all(&mut self, conn: &Connection) {
        for dimension in Dimension::ALL {
            self.refresh(conn, dimension);
        }
    }

    /// Known names of a dimension, sorted. Interface types for endpoints.
    pub fn names(&mut self, conn: &Connection, dimension: Dimension) -> Vec<String> {
        self.fetch(conn, dimension, false);
        match dimension {
            Dimension::EndpointType => self
                .endpoints
                .as_ref()
                .map(|t| t.types().map(str::to_string).collect())
                .unwrap_or_default(),
            _ => self
                .id_name_table(dimension)
                .map(|t| t.names().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    /// Ids `name` stands for: at most one for id/name dimensions, the whole
    /// interface bucket for endpoint types. Unknown names are logged and
    /// resolve to nothing.
    pub fn resolve(&mut self, conn: &Connection, dimension: Dimension, name: &str) -> Vec<i64> {
        self.fetch(conn, dimension, false);
        let ids = match dimension {
            Dimension::EndpointType => self
                .endpoints
                .as_ref()
                .and_then(|t| t.ids_of_type(name))
                .map(<[i64]>::to_vec),
            _ => self
                .id_name_table(dimension)
                .and_then(|t| t.id(name))
                .map(|id| vec![id]),
        };
        match ids {
            Some(ids) => ids,
            None => {
                error!(name = %name, dimension = %dimension, "There are no records with this name in the database");
                Vec::new()
            }
        }
    }

    pub fn name_of(&mut self, conn: &Connection, dimension: Dimension, id: i64) -> Option<String> {
        self.fetch(conn, dimension, false);
        match dimension {
            Dimension::EndpointType => self
                .endpoints
                .as_ref()
                .and_then(|t| t.endpoint(id))
                .map(Endpoint::key),
            _ => self
                .id_name_table(dimension)
                .and_then(|t| t.name(id))
                .map(str::to_string),
        }
    }

    pub fn endpoints(&mut self, conn: &Connection) -> Option<&EndpointTable> {
        self.fetch(conn, Dimension::EndpointType, false);
        self.endpoints.as_ref()
    }

    fn id_name_table(&self, dimension: Dimension) -> Option<&IdNameTable> {
        match dimension {
            Dimension::Queue => self.queues.as_ref(),
            Dimension::User => self.users.as_ref(),
            Dimension::Vo => self.vos.as_ref(),
            Dimension::Status => self.statuses.as_ref(),
            Dimension::EndpointType => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ACCOUNTING_SCHEMA;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(ACCOUNTING_SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO Queues (ID, Name) VALUES (1, 'grid'), (2, 'short'), (3, 'long');
            INSERT INTO Status (ID, Name) VALUES (1, 'completed'), (2, 'failed');
            INSERT INTO Endpoints (ID, Interface, URL) VALUES
                (1, 'org.nordugrid.arcrest', 'https://ce1.example.org:443/arex'),
                (2, 'org.nordugrid.arcrest', 'https://ce2.example.org:443/arex'),
                (3, 'org.ogf.glue.emies.activitycreation', 'https://ce1.example.org:443/arex'),
                (4, 'org.nordugrid.arcrest', 'https://ce3.example.org:443/arex');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_names_match_table() {
        let conn = memory_db();
        let mut cache = LookupCache::new();

        assert_eq!(cache.names(&conn, Dimension::Queue), vec!["grid", "long", "short"]);
        assert_eq!(cache.names(&conn, Dimension::Status).len(), 2);
        assert!(cache.names(&conn, Dimension::User).is_empty());
        assert!(cache.is_fetched(Dimension::User));
    }

    #[test]
    fn test_endpoint_type_index() {
        let conn = memory_db();
        let mut cache = LookupCache::new();

        assert_eq!(
            cache.names(&conn, Dimension::EndpointType),
            vec!["org.nordugrid.arcrest", "org.ogf.glue.emies.activitycreation"]
        );
        assert_eq!(
            cache.resolve(&conn, Dimension::EndpointType, "org.nordugrid.arcrest"),
            vec![1, 2, 4]
        );

        let endpoints = cache.endpoints(&conn).unwrap();
        assert_eq!(
            endpoints.id("org.ogf.glue.emies.activitycreation", "https://ce1.example.org:443/arex"),
            Some(3)
        );
        assert_eq!(endpoints.endpoint(2).unwrap().url, "https://ce2.example.org:443/arex");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let conn = memory_db();
        let mut cache = LookupCache::new();

        assert_eq!(cache.resolve(&conn, Dimension::Queue, "short"), vec![2]);
        assert!(cache.resolve(&conn, Dimension::Queue, "nosuchqueue").is_empty());
        assert!(cache.resolve(&conn, Dimension::EndpointType, "org.example.none").is_empty());
    }

    #[test]
    fn test_name_of() {
        let conn = memory_db();
        let mut cache = LookupCache::new();

        assert_eq!(cache.name_of(&conn, Dimension::Status, 2).as_deref(), Some("failed"));
        assert_eq!(
            cache.name_of(&conn, Dimension::EndpointType, 3).as_deref(),
            Some("org.ogf.glue.emies.activitycreation:https://ce1.example.org:443/arex")
        );
        assert_eq!(cache.name_of(&conn, Dimension::Queue, 42), None);
    }

    #[test]
    fn test_cached_until_refresh() {
        let conn = memory_db();
        let mut cache = LookupCache::new();
        assert_eq!(cache.names(&conn, Dimension::Queue).len(), 3);

        conn.execute("INSERT INTO Queues (ID, Name) VALUES (4, 'test')", []).unwrap();
        assert_eq!(cache.names(&conn, Dimension::Queue).len(), 3);

        cache.refresh(&conn, Dimension::Queue);
        assert_eq!(cache.names(&conn, Dimension::Queue).len(), 4);
    }

    #[test]
    fn test_failed_scan_leaves_dimension_empty() {
        let conn = memory_db();
        conn.execute_batch("DROP TABLE WLCGVOs;").unwrap();
        let mut cache = LookupCache::new();

        assert!(cache.names(&conn, Dimension::Vo).is_empty());
        assert!(!cache.is_fetched(Dimension::Vo));
        assert!(cache.resolve(&conn, Dimension::Vo, "atlas").is_empty());
    }

    #[test]
    fn test_forced_refresh_replaces_snapshot() {
        let conn = memory_db();
        let mut cache = LookupCache::new();
        assert_eq!(cache.resolve(&conn, Dimension::Queue, "grid"), vec![1]);

        conn.execute_batch("DROP TABLE Queues;").unwrap();
        cache.refresh(&conn, Dimension::Queue);

        assert!(!cache.is_fetched(Dimension::Queue));
        assert!(cache.resolve(&conn, Dimension::Queue, "grid").is_empty());
    }
}
